//! Principal — the identity resolved from a verified bearer token.
//!
//! Every gated operation has exactly one resolved `Principal`, or is
//! rejected before any policy logic runs. Principals live for a single
//! request and are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Subject identifier (who this token was issued to).
    pub subject: String,

    /// When the token was issued.
    pub issued_at: DateTime<Utc>,

    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    /// Whether the principal's token has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The JSON claims embedded in a signed token payload.
///
/// Timestamps are unix seconds, matching common bearer-token conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    /// Convert claims into a resolved principal.
    pub fn into_principal(self) -> Option<Principal> {
        let issued_at = DateTime::from_timestamp(self.iat, 0)?;
        let expires_at = DateTime::from_timestamp(self.exp, 0)?;
        Some(Principal {
            subject: self.sub,
            issued_at,
            expires_at,
        })
    }
}
