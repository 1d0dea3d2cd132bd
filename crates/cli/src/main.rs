//! Shoplist CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the web server
//! - `status`: Show lists, item counts, and suggestions
//! - `config`: Print the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "shoplist",
    about = "Shoplist: PIN-protected shared shopping lists",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the database path
        #[arg(long)]
        db: Option<String>,
    },

    /// Show lists, item counts, and suggestions
    Status,

    /// Print the effective configuration (PIN redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port, db } => commands::serve::run(port, db).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Config => commands::config_cmd::show()?,
    }

    Ok(())
}
