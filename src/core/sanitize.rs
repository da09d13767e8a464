//! URL and identifier sanitization for playable streams.
//!
//! Only `http`/`https` URLs with a host are ever handed back, and external
//! identifiers must match the platform's id charset before they are
//! interpolated into embed URLs.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Embed URL prefix for external platform ids
pub const EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Human-viewable URL prefix for external platform ids
pub const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

static EXTERNAL_ID_RE: OnceLock<Regex> = OnceLock::new();

fn external_id_re() -> &'static Regex {
    EXTERNAL_ID_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]{6,}$").expect("invalid regex")
    })
}

/// Return the trimmed URL if it is an absolute http(s) URL with a host
pub fn safe_http_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // The parser strips tabs and newlines silently; the stored string must
    // be exactly what it validated
    if trimmed.chars().any(|c| c.is_control()) {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    // `http:host` parses leniently; require an explicit authority
    if !trimmed[parsed.scheme().len()..].starts_with("://") {
        return None;
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Some(trimmed.to_string()),
        _ => None,
    }
}

/// Return the trimmed id if it matches `[A-Za-z0-9_-]{6,}`
pub fn validate_external_id(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if external_id_re().is_match(trimmed) {
        Some(trimmed)
    } else {
        None
    }
}

/// Embeddable URL for an already validated id
pub fn embed_url(external_id: &str) -> String {
    format!("{}{}", EMBED_BASE, external_id)
}

/// Human-viewable URL for an already validated id
pub fn watch_url(external_id: &str) -> String {
    format!("{}{}", WATCH_BASE, external_id)
}
