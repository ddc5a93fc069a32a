use super::state::ServerState;
use crate::error::ServiceError;
use crate::user::{AccessClaims, UserRole};

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

/// Caller identity, taken from a verified access token.
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: AccessClaims,
}

impl Session {
    pub fn user_id(&self) -> i64 {
        self.claims.user_id
    }

    pub fn role(&self) -> UserRole {
        self.claims.role
    }
}

pub const COOKIE_ACCESS_TOKEN_KEY: &str = "access_token";
pub const HEADER_ACCESS_TOKEN_KEY: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

fn extract_access_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_ACCESS_TOKEN_KEY)
        .map(Cookie::value)
        .map(|s| s.to_string())
}

fn extract_access_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_ACCESS_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .map(|value| match value.strip_prefix(BEARER_PREFIX) {
            Some(token) => token.trim().to_string(),
            None => value.trim().to_string(),
        })
        .filter(|token| !token.is_empty())
}

/// The `Authorization` header wins over the cookie.
fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Session, ServiceError> {
    let token = match extract_access_token_from_headers(parts)
        .or_else(|| extract_access_token_from_cookies(parts))
    {
        None => {
            debug!("No token in headers nor cookies.");
            return Err(ServiceError::unauthorized());
        }
        Some(x) => x,
    };

    let claims = ctx.user_manager.authenticate(&token).inspect_err(|err| {
        debug!("Rejected access token: {}", err);
    })?;
    Ok(Session { claims })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
    }
}
