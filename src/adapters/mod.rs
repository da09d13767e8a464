//! Adapter interfaces for external systems.
//!
//! The policy depends on two collaborators it does not own: a resource
//! catalog and an identity provider. Both are traits so deployments can
//! plug in their own database or auth service.

pub mod catalog;
pub mod identity;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ResourceRecord;

pub use catalog::{CatalogDocument, InMemoryLookup, JsonCatalog};
pub use identity::{CallerIdentity, IdentityProvider, StaticIdentityProvider};

/// Read-only resource catalog
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// Human-readable lookup name
    fn name(&self) -> &str;

    /// Fetch a resource by id. `Ok(None)` when it does not exist.
    async fn get(&self, resource_id: &str) -> Result<Option<ResourceRecord>>;
}
