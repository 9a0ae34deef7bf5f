//! Error types for the DataGate domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each stage of the
//! request pipeline has its own error variant, and every hard failure maps
//! to a stable kind string the HTTP layer can translate into a status code
//! without inspecting the message.

use thiserror::Error;

/// The top-level error type for all gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Credential gate ---
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(#[from] RateLimitError),

    // --- Policy enforcement ---
    #[error("Policy violation: {0}")]
    Policy(#[from] PolicyViolation),

    // --- Warehouse ---
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    // --- Agent loop ---
    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    // --- Configuration ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable kind, consumed by the HTTP layer for status
    /// mapping. Never includes request-specific detail.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Auth(_) => "auth_error",
            Error::RateLimit(_) => "rate_limit_error",
            Error::Policy(_) => "policy_violation",
            Error::Execution(_) => "execution_error",
            Error::Orchestration(_) => "orchestration_error",
            Error::Config { .. } => "config_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

// --- Stage errors ---

/// Token verification failures. Always terminal, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("signature verification failed")]
    BadSignature,
}

/// Quota enforcement failure. Terminal for the current request; the caller
/// is expected to back off.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("quota of {quota} requests per {window_secs}s exhausted, retry after {retry_after_secs}s")]
    QuotaExceeded {
        quota: u32,
        window_secs: u64,
        retry_after_secs: u64,
    },
}

/// Access policy rejections. Never retried, never silently downgraded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("statement contains forbidden keyword '{0}'")]
    ForbiddenKeyword(String),

    #[error("access to table '{0}' is not allowed")]
    TableNotAllowed(String),

    #[error("multi-statement SQL is not allowed")]
    MultiStatement,

    #[error("statement contains forbidden sequence '{0}'")]
    ForbiddenSequence(String),
}

/// Warehouse-side failures. Not retried automatically; surfaced to the
/// agent as a failed tool result so the model may self-correct.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("warehouse transport failed: {0}")]
    Transport(String),

    #[error("statement failed: {0}")]
    Statement(String),

    #[error("warehouse call timed out after {0}s")]
    Timeout(u64),
}

/// Agent loop failures: the LLM collaborator is unreachable after bounded
/// retries, or its response cannot be acted on.
#[derive(Debug, Clone, Error)]
pub enum OrchestrationError {
    #[error("LLM provider failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("model requested unknown tool '{0}'")]
    UnknownTool(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("exchange timed out after {0}s")]
    Timeout(u64),
}

/// LLM provider transport errors, distinguished from content-level refusals
/// which arrive as ordinary responses.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}
