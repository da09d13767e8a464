//! Playable stream outcomes.

use serde::{Deserialize, Serialize};

/// A sanitized, playable reference for a resource.
///
/// Exactly one payload shape per stream type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stream_type", rename_all = "snake_case")]
pub enum PlayableUrl {
    /// Media URL served as-is
    Direct { url: String },

    /// Third-party embed plus a human-viewable fallback
    Embed { embed_url: String, watch_url: String },
}

impl PlayableUrl {
    /// Stream type label ("direct" or "embed")
    pub fn stream_type(&self) -> &'static str {
        match self {
            PlayableUrl::Direct { .. } => "direct",
            PlayableUrl::Embed { .. } => "embed",
        }
    }

    /// URL the client should load for playback
    pub fn playback_url(&self) -> &str {
        match self {
            PlayableUrl::Direct { url } => url,
            PlayableUrl::Embed { embed_url, .. } => embed_url,
        }
    }

    /// Fallback URL for opening outside the app (embeds only)
    pub fn watch_url(&self) -> Option<&str> {
        match self {
            PlayableUrl::Direct { .. } => None,
            PlayableUrl::Embed { watch_url, .. } => Some(watch_url),
        }
    }
}
