//! CredentialGate — token verification composed with rate limiting.
//!
//! The single entry point every request must pass before any policy or
//! query logic runs. Auth failures and quota rejections are terminal for
//! the current request; there are no retries at this layer.

use crate::rate::RateGate;
use crate::token::TokenVerifier;
use chrono::Utc;
use datagate_core::error::AuthError;
use datagate_core::{Error, Principal};
use std::time::Duration;
use tracing::warn;

/// Authenticates a bearer token and enforces the per-identity quota.
pub struct CredentialGate {
    verifier: TokenVerifier,
    rate: RateGate,
}

impl CredentialGate {
    pub fn new(secret: impl AsRef<[u8]>, quota: u32, window: Duration) -> Self {
        Self {
            verifier: TokenVerifier::new(secret),
            rate: RateGate::new(quota, window),
        }
    }

    /// Verify the token, then charge the identity's rate window.
    ///
    /// The window is only charged after successful verification, so
    /// anonymous garbage cannot exhaust a real identity's quota.
    pub fn admit(&self, token: Option<&str>) -> Result<Principal, Error> {
        let token = token.ok_or(AuthError::Missing)?;

        let principal = self.verifier.verify(token, Utc::now()).inspect_err(|e| {
            warn!(error = %e, "Token verification failed");
        })?;

        self.rate.admit(&principal.subject).inspect_err(|e| {
            warn!(subject = %principal.subject, error = %e, "Request rejected by rate gate");
        })?;

        Ok(principal)
    }

    /// Access the underlying verifier (for token minting in the CLI).
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagate_core::error::RateLimitError;

    fn gate(quota: u32) -> CredentialGate {
        CredentialGate::new("test-secret", quota, Duration::from_secs(60))
    }

    #[test]
    fn missing_token_is_auth_error() {
        let err = gate(5).admit(None).unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::Missing)));
    }

    #[test]
    fn bad_token_is_auth_error() {
        let err = gate(5).admit(Some("garbage")).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn valid_token_admits_until_quota() {
        let gate = gate(2);
        let token = gate.verifier().mint("analyst", 30, Utc::now());

        assert!(gate.admit(Some(&token)).is_ok());
        assert!(gate.admit(Some(&token)).is_ok());

        let err = gate.admit(Some(&token)).unwrap_err();
        assert!(matches!(
            err,
            Error::RateLimit(RateLimitError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn rejected_tokens_do_not_charge_quota() {
        let gate = gate(1);
        for _ in 0..5 {
            assert!(gate.admit(Some("junk")).is_err());
        }
        let token = gate.verifier().mint("analyst", 30, Utc::now());
        assert!(gate.admit(Some(&token)).is_ok());
    }

    #[test]
    fn admitted_principal_carries_subject() {
        let gate = gate(5);
        let token = gate.verifier().mint("analyst", 30, Utc::now());
        let principal = gate.admit(Some(&token)).unwrap();
        assert_eq!(principal.subject, "analyst");
    }
}
