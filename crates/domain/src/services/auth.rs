//! Issues HMAC-signed JWTs for the single configured credential pair.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AuthConfig;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

pub struct TokenIssuer {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.signing_key());
        let decoding_key = DecodingKey::from_secret(config.signing_key());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Literal comparison against the configured pair; on a match a token for
    /// `username` is issued.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if username != self.config.username() || password != self.config.password() {
            warn!(username, "rejected login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issue(username)?;
        info!(username, expires_at = issued.expires_at, "issued token");
        Ok(issued)
    }

    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    pub fn issue_at(&self, subject: &str, issued_at: i64) -> Result<IssuedToken, AuthError> {
        let ttl = i64::try_from(self.config.token_ttl().as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl),
        };
        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// Decodes and validates signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(SIGNING_ALGORITHM);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(AuthConfig::new(
            "admin",
            "password",
            "verySecretKey",
            Duration::from_secs(3600),
        ))
    }

    #[test]
    fn valid_credentials_yield_a_verifiable_token() {
        let issuer = issuer();
        let issued = issuer.authenticate("admin", "password").unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(issued.expires_at - issued.issued_at, 3600);

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.iat, issued.issued_at);
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let err = issuer().authenticate("admin", "wrong").unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[test]
    fn comparison_is_exact() {
        let issuer = issuer();
        assert!(issuer.authenticate("Admin", "password").is_err());
        assert!(issuer.authenticate("admin ", "password").is_err());
        assert!(issuer.authenticate("", "").is_err());
    }

    #[test]
    fn header_uses_hs512() {
        let issued = issuer().issue("admin").unwrap();
        let header = jsonwebtoken::decode_header(&issued.token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn tokens_signed_with_another_key_fail_verification() {
        let other = TokenIssuer::new(AuthConfig::new(
            "admin",
            "password",
            "anotherKey",
            Duration::from_secs(3600),
        ));
        let issued = other.issue("admin").unwrap();
        assert!(matches!(
            issuer().verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_tokens_fail_verification() {
        let issuer = issuer();
        let issued = issuer
            .issue_at("admin", Utc::now().timestamp() - 2 * 3600)
            .unwrap();
        assert!(issuer.verify(&issued.token).is_err());
    }
}
