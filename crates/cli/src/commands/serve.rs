//! `datagate serve` — Start the HTTP gateway server.

use datagate_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load_with_env(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("DataGate gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Warehouse:  {}", config.warehouse.api_url);
    println!("   Provider:   {}", config.provider.api_url);
    println!("   Model:      {}", config.provider.model);

    datagate_gateway::start(config).await?;

    Ok(())
}
