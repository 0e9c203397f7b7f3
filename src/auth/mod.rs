//! Request authentication.
//!
//! A caller is identified by the identity provider's session cookie or, for
//! cross-origin requests that cannot carry it, by the same JWT sent as a bearer
//! token. Both go through one [`TokenVerifier`].

pub mod jwks;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StorefrontError;
use crate::state::AppState;

pub use jwks::JwksVerifier;

/// Cookie set by the identity provider's front-end SDK.
pub const SESSION_COOKIE: &str = "__session";

/// Claims read from a session JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity-provider user id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    /// Session id
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
}

impl From<AuthError> for StorefrontError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken => StorefrontError::Unauthorized("Invalid or expired token".into()),
            AuthError::KeysUnavailable(reason) => StorefrontError::Internal(reason),
        }
    }
}

#[axum::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Session,
    Bearer,
}

/// Authenticated caller, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub via: CredentialSource,
}

impl AuthUser {
    fn from_claims(claims: SessionClaims, via: CredentialSource) -> Self {
        Self { user_id: claims.sub, email: claims.email, via }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| StorefrontError::Unauthorized("Authentication required".into()))
    }
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller from the session cookie, then from the bearer token.
///
/// A session cookie that fails verification does not end the attempt: the
/// bearer header is still tried, and only when neither verifies is the
/// request rejected.
pub async fn authenticate(verifier: &dyn TokenVerifier, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    if let Some(token) = session_token(headers) {
        match verifier.verify(token).await {
            Ok(claims) => return Ok(AuthUser::from_claims(claims, CredentialSource::Session)),
            Err(AuthError::InvalidToken) => {}
            Err(e) => return Err(e),
        }
    }
    let token = bearer_token(headers).ok_or(AuthError::InvalidToken)?;
    let claims = verifier.verify(token).await?;
    Ok(AuthUser::from_claims(claims, CredentialSource::Bearer))
}

/// Rejects requests without a valid session cookie or bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StorefrontError> {
    let headers = request.headers();
    if session_token(headers).is_none() && bearer_token(headers).is_none() {
        return Err(StorefrontError::Unauthorized("Authentication required".into()));
    }
    let user = authenticate(state.verifier.as_ref(), headers).await.map_err(|e| {
        match &e {
            AuthError::InvalidToken => tracing::debug!("token rejected"),
            AuthError::KeysUnavailable(reason) => tracing::error!(%reason, "token verification unavailable"),
        }
        StorefrontError::from(e)
    })?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Lets through only callers whose email belongs to an active admin employee.
/// Must run after [`require_auth`].
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StorefrontError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| StorefrontError::Unauthorized("Authentication required".into()))?;
    let email = user.email.as_deref().ok_or_else(|| StorefrontError::Forbidden("Admin access required".into()))?;
    let employee = state
        .store
        .employee_by_email(email)
        .await?
        .filter(|e| e.is_admin())
        .ok_or_else(|| {
            tracing::info!(user_id = %user.user_id, "admin route refused");
            StorefrontError::Forbidden("Admin access required".into())
        })?;
    request.extensions_mut().insert(employee);
    Ok(next.run(request).await)
}
