//! Configuration loading, validation, and management for DataGate.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides for secrets and endpoints. Validates all settings at startup;
//! the resulting snapshot is immutable for the process lifetime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `datagate.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Token verification and rate limiting
    #[serde(default)]
    pub auth: AuthConfig,

    /// Static access policy for the warehouse
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Agent loop bounds and retry behavior
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM provider endpoint
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Warehouse endpoint
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("gateway", &self.gateway)
            .field("auth", &self.auth)
            .field("policy", &self.policy)
            .field("agent", &self.agent)
            .field("provider", &self.provider)
            .field("warehouse", &self.warehouse)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Overall per-request deadline in seconds (LLM turns + warehouse calls)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrently retained sessions before oldest are evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_request_timeout() -> u64 {
    120
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            request_timeout_secs: default_request_timeout(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for token signing/verification.
    /// Env override: `DATAGATE_SECRET_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Token lifetime in minutes (for minted tokens)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,

    /// Requests admitted per identity per window
    #[serde(default = "default_rate_quota")]
    pub rate_limit_requests: u32,

    /// Rate window length in seconds
    #[serde(default = "default_rate_window")]
    pub rate_limit_window_secs: u64,
}

fn default_token_ttl() -> i64 {
    30
}
fn default_rate_quota() -> u32 {
    100
}
fn default_rate_window() -> u64 {
    3_600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            token_ttl_minutes: default_token_ttl(),
            rate_limit_requests: default_rate_quota(),
            rate_limit_window_secs: default_rate_window(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &redact(&self.secret_key))
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Tables the agent may query. Empty = all tables permitted
    /// (explicit wildcard, not an oversight).
    #[serde(default)]
    pub allowed_tables: Vec<String>,

    /// Hard cap on rows returned to the agent per query
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,

    /// Statement keywords that reject a query outright
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,
}

fn default_max_rows() -> u32 {
    10_000
}

fn default_blocked_keywords() -> Vec<String> {
    [
        "DROP", "DELETE", "UPDATE", "INSERT", "CREATE", "ALTER", "TRUNCATE", "MERGE", "GRANT",
        "REVOKE",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_tables: vec![],
            max_rows: default_max_rows(),
            blocked_keywords: default_blocked_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model↔tool round-trips per exchange
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Conversation memory cap in turns; oldest turns dropped first
    #[serde(default = "default_memory_cap")]
    pub memory_turn_cap: usize,

    /// Provider transport retries per turn
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Initial retry backoff in milliseconds (doubles per attempt)
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_max_turns() -> u32 {
    8
}
fn default_memory_cap() -> usize {
    20
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_backoff() -> u64 {
    500
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            memory_turn_cap: default_memory_cap(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider flavor: "openai_compat", "vllm", or "ollama"
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// OpenAI-compatible base URL (e.g. a vLLM deployment)
    #[serde(default = "default_provider_url")]
    pub api_url: String,

    /// API key. Env override: `DATAGATE_PROVIDER_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call HTTP timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_kind() -> String {
    "openai_compat".into()
}
fn default_provider_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_model() -> String {
    "meta-llama/Llama-3.1-8B-Instruct".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    1_024
}
fn default_provider_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_url: default_provider_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// SQL-over-HTTP endpoint base URL
    #[serde(default = "default_warehouse_url")]
    pub api_url: String,

    /// Access token for the warehouse service.
    /// Env override: `DATAGATE_WAREHOUSE_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Target database
    #[serde(default)]
    pub database: String,

    /// Target schema
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Per-statement timeout in seconds
    #[serde(default = "default_warehouse_timeout")]
    pub timeout_secs: u64,
}

fn default_warehouse_url() -> String {
    "http://localhost:9000".into()
}
fn default_schema() -> String {
    "PUBLIC".into()
}
fn default_warehouse_timeout() -> u64 {
    300
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            api_url: default_warehouse_url(),
            token: None,
            database: String::new(),
            schema: default_schema(),
            timeout_secs: default_warehouse_timeout(),
        }
    }
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("api_url", &self.api_url)
            .field("token", &redact(&self.token))
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (`datagate.toml` in the
    /// working directory), then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(Path::new("datagate.toml"))
    }

    /// Load from a specific path and apply environment overrides.
    ///
    /// Recognized variables (highest priority):
    /// - `DATAGATE_SECRET_KEY`
    /// - `DATAGATE_PROVIDER_API_KEY`
    /// - `DATAGATE_PROVIDER_URL`
    /// - `DATAGATE_WAREHOUSE_TOKEN`
    /// - `DATAGATE_WAREHOUSE_URL`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(secret) = std::env::var("DATAGATE_SECRET_KEY") {
            config.auth.secret_key = Some(secret);
        }
        if let Ok(key) = std::env::var("DATAGATE_PROVIDER_API_KEY") {
            config.provider.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("DATAGATE_PROVIDER_URL") {
            config.provider.api_url = url;
        }
        if let Ok(token) = std::env::var("DATAGATE_WAREHOUSE_TOKEN") {
            config.warehouse.token = Some(token);
        }
        if let Ok(url) = std::env::var("DATAGATE_WAREHOUSE_URL") {
            config.warehouse.api_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.max_rows == 0 {
            return Err(ConfigError::ValidationError(
                "policy.max_rows must be at least 1".into(),
            ));
        }

        if self.auth.rate_limit_requests == 0 {
            return Err(ConfigError::ValidationError(
                "auth.rate_limit_requests must be at least 1".into(),
            ));
        }

        if self.auth.rate_limit_window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "auth.rate_limit_window_secs must be at least 1".into(),
            ));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be at least 1".into(),
            ));
        }

        if self.agent.memory_turn_cap == 0 {
            return Err(ConfigError::ValidationError(
                "agent.memory_turn_cap must be at least 1".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(
            self.provider.kind.as_str(),
            "openai_compat" | "vllm" | "ollama"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "provider.kind '{}' is not recognized (expected openai_compat, vllm, or ollama)",
                self.provider.kind
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `datagate init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
