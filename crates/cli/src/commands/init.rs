//! `datagate init` — Write a default config file.

use datagate_config::AppConfig;
use std::path::Path;

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists, refusing to overwrite", path.display()).into());
    }

    std::fs::write(path, AppConfig::default_toml())?;
    println!("Wrote {}", path.display());
    println!("Set DATAGATE_SECRET_KEY before starting the gateway.");

    Ok(())
}
