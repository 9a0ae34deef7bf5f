//! `datagate token` — Mint a signed bearer token.

use chrono::Utc;
use datagate_config::AppConfig;
use datagate_policy::TokenVerifier;
use std::path::Path;

pub fn run(
    config_path: &Path,
    subject: &str,
    ttl_minutes: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let Some(secret) = config.auth.secret_key.as_deref() else {
        return Err("auth.secret_key is not configured (set DATAGATE_SECRET_KEY)".into());
    };

    let ttl = ttl_minutes.unwrap_or(config.auth.token_ttl_minutes);
    if ttl <= 0 {
        return Err("token TTL must be positive".into());
    }

    let token = TokenVerifier::new(secret).mint(subject, ttl, Utc::now());

    println!("{token}");
    eprintln!("Token for '{subject}', valid {ttl} minutes.");

    Ok(())
}
