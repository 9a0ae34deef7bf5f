//! Access policy and request gating for DataGate.
//!
//! Provides:
//! - **AccessPolicy**: the immutable allow-list / row-limit / keyword-denylist
//!   snapshot shared by all requests
//! - **TokenVerifier**: HMAC-SHA256 signed bearer tokens
//! - **RateGate**: per-identity fixed-window quota enforcement
//! - **CredentialGate**: token verification + rate limiting composed
//! - **Audit logging**: structured security event logging

pub mod access;
pub mod audit;
pub mod gate;
pub mod rate;
pub mod token;

pub use access::AccessPolicy;
pub use audit::{AuditEntry, AuditEvent, AuditLog, AuditOutcome, AuditSink, TracingSink};
pub use gate::CredentialGate;
pub use rate::RateGate;
pub use token::TokenVerifier;
