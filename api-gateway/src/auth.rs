//! Caller identity
//!
//! Login and session issuance belong to the authentication system. The ledger
//! API only consumes its result: the `session` cookie carries the user id,
//! and an [`IdentityResolver`] turns the request headers into a
//! [`CallerIdentity`] or rejects the request with 401.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use common::db::DbPool;
use common::error::{Error, Result};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Name of the cookie holding the session's user id
pub const SESSION_COOKIE: &str = "session";

/// Resolved caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallerIdentity {
    pub id: Uuid,
    pub username: String,
}

/// Maps request credentials to a caller identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` when the request carries no valid credentials
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>>;
}

/// Value of a named cookie across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

fn session_user_id(headers: &HeaderMap) -> Option<Uuid> {
    let value = cookie_value(headers, SESSION_COOKIE)?;
    match Uuid::parse_str(value) {
        Ok(id) => Some(id),
        Err(_) => {
            debug!("Ignoring malformed session cookie");
            None
        }
    }
}

/// Resolves the session cookie against the `users` table
pub struct PgSessionResolver {
    pool: DbPool,
}

impl PgSessionResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PgSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>> {
        let Some(user_id) = session_user_id(headers) else {
            return Ok(None);
        };

        let row: Option<(Uuid, String)> = sqlx::query_as("SELECT id, username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, username)| CallerIdentity { id, username }))
    }
}

/// Trusts the session cookie as-is. For the in-memory store and local
/// development, where there is no users table to check against.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedSessionResolver;

#[async_trait]
impl IdentityResolver for TrustedSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>> {
        Ok(session_user_id(headers).map(|id| CallerIdentity {
            id,
            username: id.to_string(),
        }))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> std::result::Result<Self, Self::Rejection> {
        state.identity.resolve(&parts.headers).await?
            .ok_or_else(|| ApiError::Common(Error::Unauthorized("Authentication required".to_string())))
    }
}
