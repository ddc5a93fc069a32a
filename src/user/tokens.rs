//! Signed access/refresh token pairs.
//!
//! Both tokens are HS256 JWTs signed with the same secret. The access token
//! carries the caller identity and role, the refresh token only the user id,
//! and each carries a `typ` tag so one can never be used in place of the other.

use super::user_models::{User, UserRole};
use crate::config::AuthSettings;
use crate::sqlite_persistence::now_unix;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenKind,
}

trait TypedClaims {
    fn kind(&self) -> TokenKind;
}

impl TypedClaims for AccessClaims {
    fn kind(&self) -> TokenKind {
        self.typ
    }
}

impl TypedClaims for RefreshClaims {
    fn kind(&self) -> TokenKind {
        self.typ
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("wrong token type, expected {0:?}")]
    WrongKind(TokenKind),
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenManager {
    pub fn new(settings: &AuthSettings) -> Self {
        let secret = settings.jwt_secret.as_bytes();
        TokenManager {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs: settings.access_token_ttl_secs,
            refresh_ttl_secs: settings.refresh_token_ttl_secs,
        }
    }

    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        self.issue_token_pair_at(user, now_unix())
    }

    pub fn issue_token_pair_at(&self, user: &User, now: i64) -> Result<TokenPair, TokenError> {
        let access = AccessClaims {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.access_ttl_secs,
            typ: TokenKind::Access,
        };
        let refresh = RefreshClaims {
            user_id: user.id,
            iat: now,
            exp: now + self.refresh_ttl_secs,
            typ: TokenKind::Refresh,
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            expires_in: self.access_ttl_secs,
            refresh_expires_in: self.refresh_ttl_secs,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token, TokenKind::Refresh)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    fn verify<T>(&self, token: &str, expected: TokenKind) -> Result<T, TokenError>
    where
        T: DeserializeOwned + TypedClaims,
    {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<T>(token, &self.decoding_key, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err),
            }
        })?;

        if data.claims.kind() != expected {
            return Err(TokenError::WrongKind(expected));
        }
        Ok(data.claims)
    }
}
