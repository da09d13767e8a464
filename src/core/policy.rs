//! Stream resolution policy.
//!
//! Turns a capability token plus a resource id into a playable URL:
//! verify the token, check it is bound to the requested resource, load the
//! resource, then pick a sanitized direct URL or fall back to an embed.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{CallerIdentity, ResourceLookup};
use crate::domain::{PlayableUrl, PlaybackToken, ResourceRecord};

use super::engine::TokenEngine;
use super::error::StreamError;
use super::sanitize::{embed_url, safe_http_url, validate_external_id, watch_url};

/// Authorizes stream requests and mints tokens for authenticated callers
#[derive(Clone)]
pub struct StreamPolicy {
    engine: TokenEngine,
    lookup: Arc<dyn ResourceLookup>,
}

impl StreamPolicy {
    /// Create a policy over a token engine and resource lookup
    pub fn new(engine: TokenEngine, lookup: Arc<dyn ResourceLookup>) -> Self {
        Self { engine, lookup }
    }

    /// Token engine in use
    pub fn engine(&self) -> &TokenEngine {
        &self.engine
    }

    /// Verify `token` for `resource_id` and resolve a playable URL
    #[instrument(skip(self, token), fields(lookup = self.lookup.name()))]
    pub async fn authorize_and_resolve(
        &self,
        resource_id: &str,
        token: &str,
    ) -> Result<PlayableUrl, StreamError> {
        let bound = self.engine.verify(token).ok_or(StreamError::Unauthorized)?;

        if bound != resource_id {
            warn!(token_resource = %bound, "Token bound to a different resource");
            return Err(StreamError::Forbidden);
        }

        let record = self.load_active(resource_id).await?;
        let playable = resolve(&record)?;

        debug!(stream_type = playable.stream_type(), "Resolved stream");
        Ok(playable)
    }

    /// Mint a token for a caller whose credential was already verified.
    ///
    /// The caller is not recorded: tokens are anonymous capabilities.
    #[instrument(skip(self, _caller), fields(lookup = self.lookup.name()))]
    pub async fn mint_for_authenticated_caller(
        &self,
        resource_id: &str,
        _caller: &CallerIdentity,
        ttl_seconds: u64,
    ) -> Result<PlaybackToken, StreamError> {
        self.load_active(resource_id).await?;

        let token = self.engine.issue(resource_id, ttl_seconds)?;
        info!(expires_at = token.expires_at, "Minted playback token");
        Ok(token)
    }

    /// Mint with the signing context's default TTL
    pub async fn mint_default(
        &self,
        resource_id: &str,
        caller: &CallerIdentity,
    ) -> Result<PlaybackToken, StreamError> {
        let ttl = self.engine.context().default_ttl_seconds();
        self.mint_for_authenticated_caller(resource_id, caller, ttl)
            .await
    }

    /// Fetch a resource, treating inactive as missing
    async fn load_active(&self, resource_id: &str) -> Result<ResourceRecord, StreamError> {
        let record = self
            .lookup
            .get(resource_id)
            .await
            .map_err(StreamError::Lookup)?;

        match record {
            Some(record) if record.is_active => Ok(record),
            _ => Err(StreamError::NotFound),
        }
    }
}

/// Pick the playable URL for a resource.
///
/// A valid direct URL wins. An unusable direct URL is ignored rather than
/// failing the request; an invalid external id is a data integrity error.
pub fn resolve(record: &ResourceRecord) -> Result<PlayableUrl, StreamError> {
    if let Some(raw) = record.direct_url.as_deref() {
        match safe_http_url(raw) {
            Some(url) => return Ok(PlayableUrl::Direct { url }),
            None => warn!(resource_id = %record.id, "Ignoring unsafe direct URL"),
        }
    }

    let raw_id = record.external_id.as_deref().unwrap_or_default();
    let external_id = validate_external_id(raw_id).ok_or_else(|| {
        StreamError::InternalInconsistency(format!(
            "resource '{}' has an invalid external id",
            record.id
        ))
    })?;

    Ok(PlayableUrl::Embed {
        embed_url: embed_url(external_id),
        watch_url: watch_url(external_id),
    })
}
