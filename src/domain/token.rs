//! Capability token values.
//!
//! A token authorizes access to exactly one resource until a fixed expiry.
//! It carries no caller identity.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A freshly issued playback token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackToken {
    /// Opaque URL-safe token string
    pub token: String,

    /// Resource the token is bound to
    pub resource_id: String,

    /// Absolute expiry (Unix seconds)
    pub expires_at: u64,
}

impl PlaybackToken {
    /// Expiry as a UTC timestamp, for display
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.expires_at)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Signed claims carried inside a token.
///
/// Field names are kept short since they travel in every stream URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Bound resource id
    #[serde(rename = "rid")]
    pub resource_id: String,

    /// Absolute expiry (Unix seconds)
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// Resource id exactly as issued
    pub resource_id: String,

    /// Absolute expiry (Unix seconds)
    pub expires_at: u64,
}

impl From<TokenClaims> for VerifiedToken {
    fn from(claims: TokenClaims) -> Self {
        Self {
            resource_id: claims.resource_id,
            expires_at: claims.expires_at,
        }
    }
}
