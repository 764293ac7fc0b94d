//! `mindloop config`: print configuration.

use mindloop_config::AppConfig;

pub fn run(effective: bool) -> Result<(), Box<dyn std::error::Error>> {
    if effective {
        let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
        println!("# {}", AppConfig::config_dir().join("config.toml").display());
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        print!("{}", AppConfig::default_toml());
    }
    Ok(())
}
