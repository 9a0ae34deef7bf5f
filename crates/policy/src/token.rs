//! TokenVerifier — HMAC-SHA256 signed bearer tokens.
//!
//! Token format: `base64url(payload).base64url(signature)` where payload is
//! the JSON claims `{sub, iat, exp}` and the signature is HMAC-SHA256 over
//! the raw payload bytes with the configured secret key. Verification is
//! constant-time via the `hmac` crate's `verify_slice`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use datagate_core::error::AuthError;
use datagate_core::principal::{Principal, TokenClaims};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies (and mints) signed bearer tokens.
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Mint a signed token for `subject`, valid for `ttl_minutes` from `now`.
    ///
    /// Used by the CLI `token` command; the gateway itself only verifies.
    pub fn mint(&self, subject: &str, ttl_minutes: i64, now: DateTime<Utc>) -> String {
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + TimeDelta::minutes(ttl_minutes)).timestamp(),
        };
        // Claims are plain data; serialization cannot fail.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let signature = self.sign(&payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Verify a token at `now` and resolve it to a principal.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| AuthError::Malformed("expected two segments".into()))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::Malformed("invalid payload encoding".into()))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed("invalid signature encoding".into()))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthError::BadSignature)?;
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|e| AuthError::Malformed(format!("invalid claims: {e}")))?;
        let principal = claims
            .into_principal()
            .ok_or_else(|| AuthError::Malformed("timestamp out of range".into()))?;

        if principal.is_expired(now) {
            return Err(AuthError::Expired);
        }

        Ok(principal)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_then_verify_round_trip() {
        let verifier = TokenVerifier::new("test-secret");
        let now = Utc::now();
        let token = verifier.mint("analyst", 30, now);

        let principal = verifier.verify(&token, now).unwrap();
        assert_eq!(principal.subject, "analyst");
        assert!(!principal.is_expired(now));
    }

    #[test]
    fn expired_token_rejected() {
        let verifier = TokenVerifier::new("test-secret");
        let issued = Utc::now() - TimeDelta::hours(2);
        let token = verifier.mint("analyst", 30, issued);

        let err = verifier.verify(&token, Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn wrong_secret_rejected() {
        let minter = TokenVerifier::new("secret-a");
        let verifier = TokenVerifier::new("secret-b");
        let token = minter.mint("analyst", 30, Utc::now());

        let err = verifier.verify(&token, Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::BadSignature);
    }

    #[test]
    fn tampered_payload_rejected() {
        let verifier = TokenVerifier::new("test-secret");
        let token = verifier.mint("analyst", 30, Utc::now());

        // Swap the payload for one claiming a different subject
        let forged_claims = serde_json::json!({
            "sub": "admin",
            "iat": Utc::now().timestamp(),
            "exp": (Utc::now() + TimeDelta::hours(1)).timestamp(),
        });
        let forged_payload = URL_SAFE_NO_PAD.encode(forged_claims.to_string());
        let signature = token.split_once('.').unwrap().1;
        let forged = format!("{forged_payload}.{signature}");

        let err = verifier.verify(&forged, Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::BadSignature);
    }

    #[test]
    fn garbage_token_is_malformed() {
        let verifier = TokenVerifier::new("test-secret");
        assert!(matches!(
            verifier.verify("not-a-token", Utc::now()),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            verifier.verify("!!!.???", Utc::now()),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn debug_never_prints_secret() {
        let verifier = TokenVerifier::new("super-secret-key");
        let debug = format!("{verifier:?}");
        assert!(!debug.contains("super-secret-key"));
    }
}
