//! Identity provider interface.
//!
//! Long-lived credentials are issued and verified outside this crate. The
//! policy requires a [`CallerIdentity`] before minting, which marks that
//! some trusted path vouched for the caller.

use std::collections::HashMap;

use async_trait::async_trait;

/// A caller whose long-lived credential has been verified.
///
/// This is an assertion by whoever constructs it, not a cryptographic
/// proof: anything holding a `CallerIdentity` can mint tokens. Construct
/// one only inside an [`IdentityProvider`] implementation or an
/// operator-only path such as the local CLI, never from request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    subject: String,
}

impl CallerIdentity {
    /// Wrap a subject id that has already been verified.
    ///
    /// Callers must have authenticated the subject themselves.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Subject id from the identity provider
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Verifies bearer credentials
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer credential to a caller, `None` if it is not valid
    async fn verify_bearer(&self, credential: &str) -> Option<CallerIdentity>;
}

/// Fixed credential → subject table
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    credentials: HashMap<String, String>,
}

impl StaticIdentityProvider {
    /// Create an empty provider (rejects everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential for a subject
    pub fn with_credential(
        mut self,
        credential: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        self.credentials.insert(credential.into(), subject.into());
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify_bearer(&self, credential: &str) -> Option<CallerIdentity> {
        if credential.is_empty() {
            return None;
        }
        self.credentials
            .get(credential)
            .map(|subject| CallerIdentity::new(subject.clone()))
    }
}
