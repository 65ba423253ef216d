//! Session lookup against the external auth provider.
//!
//! Sessions are issued elsewhere. This service only turns a presented token
//! into a [`Session`] and decides which routes demand one.

use crate::models::session::Session;
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Route prefix whose every path requires a session.
pub const PROTECTED_PREFIX: &str = "/api/upload";

/// Page that requires a session.
pub const PROTECTED_PAGE: &str = "/uploads";

/// Cookie names the auth provider sets, secure variant first.
pub const SESSION_COOKIES: [&str; 2] = [
    "__Secure-next-auth.session-token",
    "next-auth.session-token",
];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Whether requests to `path` must carry a valid session.
///
/// Covers `/api/upload`, everything beneath it, and `/uploads`.
pub fn requires_session(path: &str) -> bool {
    let under_prefix = path
        .strip_prefix(PROTECTED_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    under_prefix || path == PROTECTED_PAGE
}

/// Pull the session token from `Authorization: Bearer` or the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    let cookies: Vec<(&str, &str)> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .collect();

    SESSION_COOKIES.iter().find_map(|name| {
        cookies
            .iter()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.to_string())
    })
}

/// Resolves presented tokens into sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `None` when the token is missing, expired, or forged.
    async fn resolve(&self, token: &str) -> Option<Session>;
}

/// Claims carried by the provider's HS256 session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub exp: i64,
}

/// Verifies HS256 tokens signed with the provider's shared secret.
pub struct JwtSessionProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn decode(&self, token: &str) -> Result<Session, SessionError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)?;
        Ok(Session {
            name: data.claims.name,
            email: data.claims.email,
            image: data.claims.picture,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn resolve(&self, token: &str) -> Option<Session> {
        match self.decode(token) {
            Ok(session) => Some(session),
            Err(err) => {
                debug!(error = %err, "rejecting session token");
                None
            }
        }
    }
}

/// Used when no provider secret is configured: every request is anonymous.
pub struct AnonymousOnly;

#[async_trait]
impl SessionProvider for AnonymousOnly {
    async fn resolve(&self, _token: &str) -> Option<Session> {
        None
    }
}
