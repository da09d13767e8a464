//! Signing context shared by token issuance and verification.
//!
//! Built once at startup from configuration and never mutated afterwards.
//! The signing key is derived from both the secret and the salt, so a token
//! minted under one salt never verifies under another.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::error::StreamError;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Default salt (purpose namespace) for playback tokens
pub const DEFAULT_SALT: &str = "playback";

/// Default token lifetime: 15 minutes
pub const DEFAULT_TTL_SECONDS: u64 = 900;

/// Domain separator mixed into key derivation
const KEY_DERIVATION_LABEL: &[u8] = b"playgate.token-key";

/// Immutable key, salt and TTL configuration
#[derive(Clone)]
pub struct SigningContext {
    /// MAC keyed with the derived signing key
    keyed_mac: HmacSha256,

    /// Purpose salt
    salt: String,

    /// TTL used when callers do not pick one
    default_ttl_seconds: u64,

    /// Non-secret key identifier (hex)
    fingerprint: String,
}

impl SigningContext {
    /// Create a signing context.
    ///
    /// Refuses an empty secret or a zero default TTL.
    pub fn new(
        secret_key: impl AsRef<[u8]>,
        salt: impl Into<String>,
        default_ttl_seconds: u64,
    ) -> Result<Self, StreamError> {
        let secret_key = secret_key.as_ref();
        if secret_key.is_empty() {
            return Err(StreamError::InvalidArgument(
                "secret_key must not be empty".to_string(),
            ));
        }
        if default_ttl_seconds == 0 {
            return Err(StreamError::InvalidArgument(
                "default TTL must be > 0".to_string(),
            ));
        }

        let salt = salt.into();
        let derived = derive_key(secret_key, &salt)?;

        let digest = Sha256::digest(derived);
        let fingerprint = hex::encode(&digest[..8]);

        let keyed_mac = HmacSha256::new_from_slice(&derived)
            .map_err(|e| StreamError::InvalidArgument(format!("Invalid signing key: {}", e)))?;

        Ok(Self {
            keyed_mac,
            salt,
            default_ttl_seconds,
            fingerprint,
        })
    }

    /// Create a context with the default salt and TTL
    pub fn with_secret(secret_key: impl AsRef<[u8]>) -> Result<Self, StreamError> {
        Self::new(secret_key, DEFAULT_SALT, DEFAULT_TTL_SECONDS)
    }

    /// Purpose salt
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Default token lifetime in seconds
    pub fn default_ttl_seconds(&self) -> u64 {
        self.default_ttl_seconds
    }

    /// Short hex identifier of the derived key, safe to log
    pub fn key_fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Fresh MAC instance keyed with the derived signing key
    pub(crate) fn mac(&self) -> HmacSha256 {
        self.keyed_mac.clone()
    }
}

impl fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningContext")
            .field("salt", &self.salt)
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .field("key_fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// HMAC(secret, label || salt)
fn derive_key(secret_key: &[u8], salt: &str) -> Result<[u8; 32], StreamError> {
    let mut mac = HmacSha256::new_from_slice(secret_key)
        .map_err(|e| StreamError::InvalidArgument(format!("Invalid secret key: {}", e)))?;
    mac.update(KEY_DERIVATION_LABEL);
    mac.update(salt.as_bytes());
    let tag = mac.finalize().into_bytes();

    let mut derived = [0u8; 32];
    derived.copy_from_slice(&tag);
    Ok(derived)
}
