//! `shoplist config`: Show the effective configuration.

use shoplist_config::AppConfig;

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let config_path = AppConfig::config_dir().join("config.toml");

    if config_path.exists() {
        println!("# {}", config_path.display());
    } else {
        println!("# {} (not found, defaults shown)", config_path.display());
    }
    println!("{}", config.redacted_toml());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = shoplist_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }
}
