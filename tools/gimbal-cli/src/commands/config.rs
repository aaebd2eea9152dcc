//! Create, show, and validate the configuration file.

use std::path::PathBuf;

use gimbal_common::config::config_file_path;
use gimbal_control_model::AppConfig;

pub fn init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file_path);
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save_to(&path)?;
    println!("Wrote default config to: {}", path.display());
    Ok(())
}

pub fn show(config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

pub fn validate(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file_path);
    println!("Validating config at: {}", path.display());

    match AppConfig::load_from(&path) {
        Ok(config) => {
            println!(
                "  Frame: {}x{}",
                config.tracking.geometry.width, config.tracking.geometry.height
            );
            println!(
                "  Cadence: {}ms, settle {}ms",
                config.tracking.cadence_ms, config.tracking.settle_ms
            );
            println!("\nConfig is valid.");
            Ok(())
        }
        Err(e) => anyhow::bail!("Config is invalid: {e}"),
    }
}
