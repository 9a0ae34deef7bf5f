//! `datagate doctor` — Diagnose configuration and collaborator health.

use datagate_config::AppConfig;
use datagate_core::warehouse::Warehouse;
use datagate_core::Provider;
use datagate_providers::OpenAiCompatProvider;
use datagate_warehouse::HttpWarehouse;
use std::path::Path;
use std::time::Duration;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("DataGate Doctor — diagnostics");
    println!("=============================\n");

    let mut issues = 0;

    if !config_path.exists() {
        println!("  [warn] no config file at {} — using defaults; run `datagate init`", config_path.display());
    }

    let config = match AppConfig::load_with_env(config_path) {
        Ok(config) => {
            println!("  [ok]   config valid");
            config
        }
        Err(e) => {
            println!("  [fail] config invalid: {e}");
            println!("\n  1 issue found.");
            return Ok(());
        }
    };

    if config.auth.secret_key.is_some() {
        println!("  [ok]   signing secret configured");
    } else {
        println!("  [warn] no signing secret — set DATAGATE_SECRET_KEY");
        issues += 1;
    }

    if config.policy.allowed_tables.is_empty() {
        println!("  [warn] policy.allowed_tables is empty — all tables are queryable");
    } else {
        println!(
            "  [ok]   table allow-list active ({} tables)",
            config.policy.allowed_tables.len()
        );
    }

    let provider = OpenAiCompatProvider::new(
        "openai_compat",
        &config.provider.api_url,
        config.provider.api_key.as_deref().unwrap_or_default(),
        Duration::from_secs(5),
    );
    match provider.health_check().await {
        Ok(true) => println!("  [ok]   LLM provider reachable at {}", config.provider.api_url),
        _ => {
            println!("  [warn] LLM provider unreachable at {}", config.provider.api_url);
            issues += 1;
        }
    }

    let warehouse = HttpWarehouse::new(
        &config.warehouse.api_url,
        config.warehouse.token.as_deref().unwrap_or_default(),
        &config.warehouse.database,
        &config.warehouse.schema,
        Duration::from_secs(5),
    );
    match warehouse.list_tables().await {
        Ok(tables) => println!(
            "  [ok]   warehouse reachable ({} tables visible)",
            tables.len()
        ),
        Err(e) => {
            println!("  [warn] warehouse unreachable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
