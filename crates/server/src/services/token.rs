//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user id as subject, valid for a fixed
//! TTL (30 days by default). There is no refresh or rotation mechanism;
//! verification is stateless.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orchard_core::UserId;

/// Errors from token verification or issuance.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's expiry is in the past.
    #[error("token expired")]
    Expired,
    /// The token failed signature or structural validation.
    #[error("invalid token")]
    Invalid,
}

/// Claims carried in an issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service signing with `secret`, issuing tokens valid
    /// for `ttl_days`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_days: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue a token bound to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] if the claims cannot be encoded.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify a token and recover the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] for a token past its expiry and
    /// [`TokenError::Invalid`] for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        data.claims
            .sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("kY7#mQ2$vX9@nL4!pR8&wZ3*uB6^eD1%")
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let tokens = TokenService::new(&secret(), 30);
        let token = tokens.issue(UserId::new(42)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let tokens = TokenService::new(&secret(), 30);
        assert!(matches!(
            tokens.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let tokens = TokenService::new(&secret(), 30);
        let other = TokenService::new(&SecretString::from("qT5&jH8!cF2@bN6#xM1$wK9*eS4^rV7%"), 30);

        let token = tokens.issue(UserId::new(1)).unwrap();
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_verify_rejects_expired() {
        // Issued with a TTL far enough in the past to clear validation leeway.
        let tokens = TokenService::new(&secret(), -2);
        let token = tokens.issue(UserId::new(1)).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }
}
