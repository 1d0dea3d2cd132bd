//! `shoplist serve`: Start the web server.

use shoplist_config::AppConfig;

pub async fn run(
    port_override: Option<u16>,
    db_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(db) = db_override.filter(|p| !p.trim().is_empty()) {
        config.database.path = db;
    }

    println!("Shoplist");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Database:  {}", config.database.path);
    println!(
        "   PIN:       {}",
        if config.auth_enabled() { "required" } else { "disabled" }
    );

    shoplist_gateway::start(config).await?;

    Ok(())
}
