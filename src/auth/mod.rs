pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Login name of the account.
    pub sub: String,
    pub account_id: Uuid,
    pub roles: Vec<String>,
    pub kind: TokenKind,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid {0} token lifetime")]
    InvalidLifetime(&'static str),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Expected {expected:?} token, got {found:?}")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// Signing and verification keys plus token lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        if security.jwt_secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let access_ttl = Duration::try_minutes(security.access_token_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(JwtError::InvalidLifetime("access"))?;
        let refresh_ttl = Duration::try_hours(security.refresh_token_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(JwtError::InvalidLifetime("refresh"))?;
        let secret = security.jwt_secret.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: security.jwt_issuer.clone(),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn issue(&self, account: &str, account_id: Uuid, roles: &[String], kind: TokenKind) -> Result<String, JwtError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: account.to_string(),
            account_id,
            roles: roles.to_vec(),
            kind,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn issue_pair(&self, account: &str, account_id: Uuid, roles: &[String]) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.issue(account, account_id, roles, TokenKind::Access)?,
            refresh_token: self.issue(account, account_id, roles, TokenKind::Refresh)?,
            token_type: "Bearer",
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Decode `token` and require it to be of `expected` kind.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?
            .claims;
        if claims.kind != expected {
            return Err(JwtError::WrongKind { expected, found: claims.kind });
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&SecurityConfig {
            cors_origins: vec![],
            jwt_secret: "unit-test-secret".to_string(),
            jwt_issuer: "upms-test".to_string(),
            access_token_minutes: 15,
            refresh_token_hours: 24,
            bcrypt_cost: 4,
        })
        .unwrap()
    }

    #[test]
    fn pair_round_trips_with_kind() {
        let keys = keys();
        let id = Uuid::new_v4();
        let pair = keys.issue_pair("alice", id, &["admin".to_string()]).unwrap();
        assert_eq!(pair.expires_in, 15 * 60);

        let access = keys.validate(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.account_id, id);
        assert_eq!(access.roles, vec!["admin"]);

        let err = keys.validate(&pair.refresh_token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, JwtError::WrongKind { found: TokenKind::Refresh, .. }));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = keys().issue("alice", Uuid::new_v4(), &[], TokenKind::Access).unwrap();
        let other = JwtKeys::from_config(&SecurityConfig {
            cors_origins: vec![],
            jwt_secret: "different".to_string(),
            jwt_issuer: "upms-test".to_string(),
            access_token_minutes: 15,
            refresh_token_hours: 24,
            bcrypt_cost: 4,
        })
        .unwrap();
        assert!(matches!(other.validate(&token, TokenKind::Access), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        let security = SecurityConfig {
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_issuer: "upms".to_string(),
            access_token_minutes: 15,
            refresh_token_hours: 24,
            bcrypt_cost: 4,
        };
        assert!(matches!(JwtKeys::from_config(&security), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn out_of_range_lifetimes_are_refused() {
        let mut security = SecurityConfig {
            cors_origins: vec![],
            jwt_secret: "unit-test-secret".to_string(),
            jwt_issuer: "upms".to_string(),
            access_token_minutes: i64::MAX,
            refresh_token_hours: 24,
            bcrypt_cost: 4,
        };
        assert!(matches!(JwtKeys::from_config(&security), Err(JwtError::InvalidLifetime("access"))));

        security.access_token_minutes = 15;
        security.refresh_token_hours = i64::MAX / 2;
        assert!(matches!(JwtKeys::from_config(&security), Err(JwtError::InvalidLifetime("refresh"))));

        security.refresh_token_hours = 0;
        assert!(matches!(JwtKeys::from_config(&security), Err(JwtError::InvalidLifetime("refresh"))));
    }
}
