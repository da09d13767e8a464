//! Capability token engine.
//!
//! Tokens have the shape `base64url(claims_json) "." base64url(hmac)`, where
//! the MAC covers the encoded claims segment exactly as transmitted. Both
//! segments use the unpadded URL-safe alphabet, so a token can be placed in
//! a query string without further encoding.
//!
//! Verification is a pure function of the token, the clock and the signing
//! context. There is no revocation store; tokens die by expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::Mac;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{PlaybackToken, TokenClaims, VerifiedToken};

use super::clock::{Clock, SystemClock};
use super::error::StreamError;
use super::signing::SigningContext;

/// Tokens longer than this are rejected before any decoding
pub const MAX_TOKEN_LEN: usize = 4096;

/// Why a token failed verification.
///
/// Every reason maps to the same outward "unauthorized" result; the
/// distinction exists for logs and counters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("token is empty")]
    Empty,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not verify")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// Verification outcome counters
#[derive(Debug, Default)]
pub struct VerificationStats {
    verified: AtomicU64,
    empty: AtomicU64,
    malformed: AtomicU64,
    bad_signature: AtomicU64,
    expired: AtomicU64,
}

/// Point-in-time copy of [`VerificationStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub verified: u64,
    pub empty: u64,
    pub malformed: u64,
    pub bad_signature: u64,
    pub expired: u64,
}

impl StatsSnapshot {
    /// Total rejected verifications
    pub fn rejected(&self) -> u64 {
        self.empty + self.malformed + self.bad_signature + self.expired
    }
}

impl VerificationStats {
    fn record(&self, outcome: &Result<VerifiedToken, Rejection>) {
        let counter = match outcome {
            Ok(_) => &self.verified,
            Err(Rejection::Empty) => &self.empty,
            Err(Rejection::Malformed) => &self.malformed,
            Err(Rejection::BadSignature) => &self.bad_signature,
            Err(Rejection::Expired) => &self.expired,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            verified: self.verified.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            bad_signature: self.bad_signature.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

/// Issues and verifies single-resource, time-bounded tokens
#[derive(Debug, Clone)]
pub struct TokenEngine {
    context: Arc<SigningContext>,
    clock: Arc<dyn Clock>,
    stats: Arc<VerificationStats>,
}

impl TokenEngine {
    /// Create an engine that reads the system clock
    pub fn new(context: Arc<SigningContext>) -> Self {
        Self::with_clock(context, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit clock
    pub fn with_clock(context: Arc<SigningContext>, clock: Arc<dyn Clock>) -> Self {
        Self {
            context,
            clock,
            stats: Arc::new(VerificationStats::default()),
        }
    }

    /// Signing context in use
    pub fn context(&self) -> &SigningContext {
        &self.context
    }

    /// Verification counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Issue a token bound to `resource_id`, valid for `ttl_seconds`
    #[instrument(skip(self), level = "debug")]
    pub fn issue(
        &self,
        resource_id: &str,
        ttl_seconds: u64,
    ) -> Result<PlaybackToken, StreamError> {
        if resource_id.is_empty() {
            return Err(StreamError::InvalidArgument(
                "resource_id must not be empty".to_string(),
            ));
        }
        if ttl_seconds == 0 {
            return Err(StreamError::InvalidArgument(
                "ttl_seconds must be > 0".to_string(),
            ));
        }

        let expires_at = self
            .clock
            .now_secs()
            .checked_add(ttl_seconds)
            .ok_or_else(|| {
                StreamError::InvalidArgument("ttl_seconds is too large".to_string())
            })?;

        let claims = TokenClaims {
            resource_id: resource_id.to_string(),
            expires_at,
        };
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| StreamError::InvalidArgument(format!("Failed to encode claims: {}", e)))?;
        let payload_segment = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.context.mac();
        mac.update(payload_segment.as_bytes());
        let signature_segment = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        debug!(expires_at, "Issued playback token");

        Ok(PlaybackToken {
            token: format!("{}.{}", payload_segment, signature_segment),
            resource_id: claims.resource_id,
            expires_at,
        })
    }

    /// Issue a token with the context's default TTL
    pub fn issue_default(&self, resource_id: &str) -> Result<PlaybackToken, StreamError> {
        self.issue(resource_id, self.context.default_ttl_seconds())
    }

    /// Verify a token, returning the bound resource id when valid
    pub fn verify(&self, token: &str) -> Option<String> {
        self.inspect(token).ok().map(|verified| verified.resource_id)
    }

    /// Verify a token, exposing why it was rejected
    pub fn inspect(&self, token: &str) -> Result<VerifiedToken, Rejection> {
        let outcome = self.check(token);
        self.stats.record(&outcome);

        match &outcome {
            Ok(verified) => debug!(resource_id = %verified.resource_id, "Token verified"),
            Err(reason) => debug!(%reason, "Token rejected"),
        }

        outcome
    }

    fn check(&self, token: &str) -> Result<VerifiedToken, Rejection> {
        if token.is_empty() {
            return Err(Rejection::Empty);
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(Rejection::Malformed);
        }

        let (payload_segment, signature_segment) =
            token.split_once('.').ok_or(Rejection::Malformed)?;
        if signature_segment.contains('.') {
            return Err(Rejection::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_segment)
            .map_err(|_| Rejection::Malformed)?;

        // Authenticate before parsing anything from the payload
        let mut mac = self.context.mac();
        mac.update(payload_segment.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Rejection::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|_| Rejection::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| Rejection::Malformed)?;
        if claims.resource_id.is_empty() {
            return Err(Rejection::Malformed);
        }

        if self.clock.now_secs() > claims.expires_at {
            return Err(Rejection::Expired);
        }

        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn engine_at(now: u64) -> (TokenEngine, ManualClock) {
        let clock = ManualClock::new(now);
        let context = Arc::new(SigningContext::with_secret("test-secret").unwrap());
        (TokenEngine::with_clock(context, Arc::new(clock.clone())), clock)
    }

    /// Sign arbitrary payload bytes the way `issue` does
    fn sign_raw(engine: &TokenEngine, payload: &[u8]) -> String {
        let segment = URL_SAFE_NO_PAD.encode(payload);
        let mut mac = engine.context.mac();
        mac.update(segment.as_bytes());
        format!(
            "{}.{}",
            segment,
            URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        )
    }

    #[test]
    fn test_issue_computes_expiry() {
        let (engine, _) = engine_at(1_000);
        let token = engine.issue("vid123", 900).unwrap();

        assert_eq!(token.resource_id, "vid123");
        assert_eq!(token.expires_at, 1_900);
    }

    #[test]
    fn test_issue_rejects_bad_arguments() {
        let (engine, _) = engine_at(1_000);

        assert!(matches!(
            engine.issue("", 900),
            Err(StreamError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.issue("vid", 0),
            Err(StreamError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.issue("vid", u64::MAX),
            Err(StreamError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_token_is_url_safe() {
        let (engine, _) = engine_at(1_000);
        let token = engine.issue("vid/with spaces?&=", 60).unwrap();

        assert!(token
            .token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let (engine, clock) = engine_at(1_000);
        let token = engine.issue("vid", 10).unwrap();

        clock.set(1_010);
        assert_eq!(engine.verify(&token.token).as_deref(), Some("vid"));

        clock.set(1_011);
        assert_eq!(engine.inspect(&token.token), Err(Rejection::Expired));
    }

    #[test]
    fn test_rejection_reasons() {
        let (engine, _) = engine_at(1_000);
        let token = engine.issue("vid", 60).unwrap().token;

        assert_eq!(engine.inspect(""), Err(Rejection::Empty));
        assert_eq!(engine.inspect("no-dot"), Err(Rejection::Malformed));
        assert_eq!(engine.inspect("a.b.c"), Err(Rejection::Malformed));
        assert_eq!(engine.inspect("abc.!!!"), Err(Rejection::Malformed));

        let truncated = &token[..token.len() - 4];
        assert!(engine.inspect(truncated).is_err());

        let (payload, _) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", payload, URL_SAFE_NO_PAD.encode([0u8; 32]));
        assert_eq!(engine.inspect(&forged), Err(Rejection::BadSignature));

        let oversized = "a".repeat(MAX_TOKEN_LEN + 1);
        assert_eq!(engine.inspect(&oversized), Err(Rejection::Malformed));
    }

    #[test]
    fn test_signed_but_wrong_shape_is_malformed() {
        let (engine, _) = engine_at(1_000);

        let missing_rid = sign_raw(&engine, br#"{"exp":2000}"#);
        assert_eq!(engine.inspect(&missing_rid), Err(Rejection::Malformed));

        let string_exp = sign_raw(&engine, br#"{"rid":"vid","exp":"2000"}"#);
        assert_eq!(engine.inspect(&string_exp), Err(Rejection::Malformed));

        let empty_rid = sign_raw(&engine, br#"{"rid":"","exp":2000}"#);
        assert_eq!(engine.inspect(&empty_rid), Err(Rejection::Malformed));

        let not_json = sign_raw(&engine, b"hello");
        assert_eq!(engine.inspect(&not_json), Err(Rejection::Malformed));

        let valid = sign_raw(&engine, br#"{"rid":"vid","exp":2000}"#);
        assert_eq!(engine.verify(&valid).as_deref(), Some("vid"));
    }

    #[test]
    fn test_stats_count_each_reason() {
        let (engine, clock) = engine_at(1_000);
        let token = engine.issue("vid", 5).unwrap().token;

        engine.verify(&token);
        engine.verify("");
        engine.verify("garbage");
        clock.advance(10);
        engine.verify(&token);

        let stats = engine.stats();
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.bad_signature, 0);
        assert_eq!(stats.rejected(), 3);
    }

    #[test]
    fn test_resource_id_returned_verbatim() {
        let (engine, _) = engine_at(1_000);
        let token = engine.issue("  Vid-ÄÖ  ", 60).unwrap();
        assert_eq!(engine.verify(&token.token).as_deref(), Some("  Vid-ÄÖ  "));
    }
}
