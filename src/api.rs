//! Endpoint contracts for the stream and token routes.
//!
//! Framework-independent: each handler returns a status code and JSON body
//! that an HTTP layer can send as-is.
//!
//! - `GET /resource/{id}/stream?token=...`
//! - `GET /resource/{id}/token` (`Authorization: Bearer ...` required)

use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::adapters::IdentityProvider;
use crate::core::{StreamError, StreamPolicy};
use crate::domain::{PlayableUrl, PlaybackToken};

/// Status code plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, &format!("failed to encode response: {}", e)),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<StreamError> for ApiResponse {
    fn from(err: StreamError) -> Self {
        let status = err.status_code();
        let message = match &err {
            StreamError::InternalInconsistency(_) => "invalid external id".to_string(),
            StreamError::Lookup(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        if status >= 500 {
            error!(error = %err, "Stream request failed");
        }
        Self::error(status, &message)
    }
}

/// Body of a successful stream response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamBody {
    pub url: String,
    pub watch_url: Option<String>,
    pub stream_type: &'static str,
}

impl From<&PlayableUrl> for StreamBody {
    fn from(playable: &PlayableUrl) -> Self {
        Self {
            url: playable.playback_url().to_string(),
            watch_url: playable.watch_url().map(str::to_string),
            stream_type: playable.stream_type(),
        }
    }
}

/// Body of a successful token response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBody {
    pub token: String,
    pub exp: u64,
    pub resource_id: String,
}

impl From<PlaybackToken> for TokenBody {
    fn from(token: PlaybackToken) -> Self {
        Self {
            token: token.token,
            exp: token.expires_at,
            resource_id: token.resource_id,
        }
    }
}

/// `GET /resource/{id}/stream?token=...`
///
/// A missing token query value is treated as an empty token.
pub async fn stream_endpoint(
    policy: &StreamPolicy,
    resource_id: &str,
    token: Option<&str>,
) -> ApiResponse {
    match policy
        .authorize_and_resolve(resource_id, token.unwrap_or_default())
        .await
    {
        Ok(playable) => ApiResponse::ok(StreamBody::from(&playable)),
        Err(err) => err.into(),
    }
}

/// `GET /resource/{id}/token`
///
/// `authorization` is the raw `Authorization` header value, if present.
pub async fn token_endpoint(
    policy: &StreamPolicy,
    identity: &dyn IdentityProvider,
    resource_id: &str,
    authorization: Option<&str>,
) -> ApiResponse {
    let caller = match authorization.and_then(bearer_credential) {
        Some(credential) => identity.verify_bearer(credential).await,
        None => None,
    };
    let Some(caller) = caller else {
        return ApiResponse::error(401, "missing or invalid credentials");
    };

    match policy.mint_default(resource_id, &caller).await {
        Ok(token) => ApiResponse::ok(TokenBody::from(token)),
        Err(err) => err.into(),
    }
}

/// Extract the credential from an `Authorization: Bearer ...` header value
pub fn bearer_credential(header: &str) -> Option<&str> {
    let (scheme, credential) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}
