//! JWT Token Handler
//! Mission: Issue and verify signed session tokens

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// JWT handler for token operations.
///
/// Tokens are HS256-signed and carry `sub`, `iat`, and `exp` claims. The
/// expiry is fixed at issuance and never extended.
pub struct JwtHandler {
    secret: String,
    ttl_minutes: i64,
}

impl JwtHandler {
    /// Create a new handler with the shared signing secret and default
    /// token lifetime in minutes.
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl_minutes,
        }
    }

    /// Issue a token for a subject using the configured lifetime.
    ///
    /// Returns the compact token string and seconds until expiry. Has no
    /// side effects: nothing is persisted at issuance.
    pub fn issue_token(&self, subject: &Uuid) -> Result<(String, u64)> {
        self.issue_token_with_ttl(subject, self.ttl_minutes)
    }

    /// Issue a token with an explicit lifetime override.
    pub fn issue_token_with_ttl(&self, subject: &Uuid, ttl_minutes: i64) -> Result<(String, u64)> {
        let now = Utc::now();
        let expiry = now
            .checked_add_signed(chrono::Duration::minutes(ttl_minutes))
            .context("Invalid expiry timestamp")?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        debug!(
            subject = %subject,
            ttl_minutes,
            "Issuing session token"
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")?;

        let expires_in = (ttl_minutes * 60).max(0) as u64;
        Ok((token, expires_in))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// Expiry is enforced explicitly with zero leeway; the library default
    /// of 60 seconds of grace would let a just-expired token through.
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid or expired token")?;

        Ok(decoded.claims)
    }

    /// Best-effort read of a token's `exp` claim, ignoring signature and
    /// expiry failures. Used only for revocation-registry bookkeeping so
    /// swept entries line up with the token's natural lifetime.
    pub fn peek_expiry(&self, token: &str) -> Option<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims.exp)
        .ok()
    }

    /// Default lifetime in minutes, as configured.
    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> JwtHandler {
        JwtHandler::new("test-secret-key-12345".to_string(), 30)
    }

    #[test]
    fn test_issue_and_decode_roundtrip() {
        let handler = handler();
        let subject = Uuid::new_v4();

        let (token, expires_in) = handler.issue_token(&subject).unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, 30 * 60);

        let claims = handler.decode_token(&token).unwrap();
        assert_eq!(claims.sub, subject.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let handler = handler();
        assert!(handler.decode_token("not.a.token").is_err());
        assert!(handler.decode_token("").is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let issuer = JwtHandler::new("secret-one".to_string(), 30);
        let verifier = JwtHandler::new("secret-two".to_string(), 30);
        let subject = Uuid::new_v4();

        let (token, _) = issuer.issue_token(&subject).unwrap();
        assert!(verifier.decode_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let handler = handler();
        let subject = Uuid::new_v4();

        // Expiry five minutes in the past
        let (token, expires_in) = handler.issue_token_with_ttl(&subject, -5).unwrap();
        assert_eq!(expires_in, 0);
        assert!(handler.decode_token(&token).is_err());
    }

    #[test]
    fn test_peek_expiry_ignores_expiry_and_signature() {
        let handler = handler();
        let subject = Uuid::new_v4();

        let (token, _) = handler.issue_token_with_ttl(&subject, -5).unwrap();
        let exp = handler.peek_expiry(&token).expect("exp should be readable");
        assert!(exp < Utc::now().timestamp());

        // Tokens signed under another secret are still readable
        let other = JwtHandler::new("another-secret".to_string(), 30);
        assert!(other.peek_expiry(&token).is_some());

        // Structurally broken tokens are not
        assert!(handler.peek_expiry("junk").is_none());
    }
}
