//! Session JWT verification against the identity provider's JWKS.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use tokio::sync::OnceCell;

use super::{AuthError, SessionClaims, TokenVerifier};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Verifies RS256 session tokens. The key set is fetched on first use and kept
/// for the life of the process; a failed fetch is retried on the next request.
pub struct JwksVerifier {
    jwks_url: String,
    http: reqwest::Client,
    keys: OnceCell<JwkSet>,
}

impl JwksVerifier {
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { jwks_url: jwks_url.into(), http, keys: OnceCell::new() })
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    async fn keys(&self) -> Result<&JwkSet, AuthError> {
        self.keys
            .get_or_try_init(|| async {
                let set = self
                    .http
                    .get(&self.jwks_url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?
                    .json::<JwkSet>()
                    .await
                    .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;
                tracing::info!(url = %self.jwks_url, keys = set.keys.len(), "JWKS loaded");
                Ok::<_, AuthError>(set)
            })
            .await
    }
}

#[axum::async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or(AuthError::InvalidToken)?;
        let keys = self.keys().await?;
        let jwk = keys.find(&kid).ok_or_else(|| {
            tracing::debug!(%kid, "no signing key for kid");
            AuthError::InvalidToken
        })?;
        let key = DecodingKey::from_jwk(jwk).map_err(|_| AuthError::InvalidToken)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {e}");
            AuthError::InvalidToken
        })?;
        Ok(data.claims)
    }
}

/// Derives the JWKS endpoint from a publishable key.
///
/// The key is `pk_test_` or `pk_live_` followed by the base64 of the instance
/// host terminated by `$`.
pub fn jwks_url_from_publishable_key(key: &str) -> Option<String> {
    let encoded = key.strip_prefix("pk_test_").or_else(|| key.strip_prefix("pk_live_"))?;
    let bytes = STANDARD_NO_PAD.decode(encoded.trim().trim_end_matches('=')).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let host = decoded.trim_end_matches('$');
    if host.is_empty() || host.contains(['/', ' ', '$']) {
        return None;
    }
    Some(format!("https://{host}/.well-known/jwks.json"))
}

pub fn resolve_jwks_url(publishable_key: Option<&str>, fallback: Option<&str>) -> Option<String> {
    publishable_key
        .and_then(jwks_url_from_publishable_key)
        .or_else(|| fallback.map(str::to_string))
}
