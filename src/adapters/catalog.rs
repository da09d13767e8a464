//! Catalog-backed resource lookups.
//!
//! `JsonCatalog` reads a JSON document of resources from disk once and
//! serves lookups from memory; `InMemoryLookup` is built directly from
//! records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::ResourceLookup;
use crate::domain::ResourceRecord;

/// On-disk catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Catalog format version
    pub version: u32,

    /// All known resources
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            version: 1,
            resources: Vec::new(),
        }
    }

    /// Add or replace a resource by id. Returns `true` if the id was new.
    pub fn add(&mut self, record: ResourceRecord) -> bool {
        if let Some(existing) = self.resources.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
            false
        } else {
            self.resources.push(record);
            true
        }
    }
}

/// Lookup over records held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLookup {
    records: HashMap<String, ResourceRecord>,
}

impl InMemoryLookup {
    /// Create an empty lookup
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record (builder style)
    pub fn with(mut self, record: ResourceRecord) -> Self {
        self.insert(record);
        self
    }

    /// Add or replace a record
    pub fn insert(&mut self, record: ResourceRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the lookup holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ResourceRecord> for InMemoryLookup {
    fn from_iter<I: IntoIterator<Item = ResourceRecord>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for record in iter {
            lookup.insert(record);
        }
        lookup
    }
}

#[async_trait]
impl ResourceLookup for InMemoryLookup {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, resource_id: &str) -> Result<Option<ResourceRecord>> {
        Ok(self.records.get(resource_id).cloned())
    }
}

/// Lookup loaded from a JSON catalog file
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
    records: InMemoryLookup,
}

impl JsonCatalog {
    /// Load the catalog at `path`. A missing file yields an empty catalog.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = Self::load_document(&path).await?;

        debug!(path = %path.display(), resources = document.resources.len(), "Loaded catalog");

        Ok(Self {
            path,
            records: document.resources.into_iter().collect(),
        })
    }

    /// Read the raw document at `path`, empty if the file does not exist
    pub async fn load_document(path: impl AsRef<Path>) -> Result<CatalogDocument> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(CatalogDocument::new());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))
    }

    /// Insert or update one record in the file at `path`.
    ///
    /// Returns `true` if the record was inserted, `false` if it replaced an
    /// existing record with the same id.
    pub async fn upsert(path: impl AsRef<Path>, record: ResourceRecord) -> Result<bool> {
        let path = path.as_ref();
        let mut document = Self::load_document(path).await?;
        let id = record.id.clone();
        let inserted = document.add(record);
        Self::save(path, &document).await?;

        debug!(path = %path.display(), resource_id = %id, inserted, "Catalog updated");
        Ok(inserted)
    }

    /// Write a catalog document to `path`
    pub async fn save(path: impl AsRef<Path>, document: &CatalogDocument) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(document)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write catalog: {}", path.display()))?;

        Ok(())
    }

    /// Source file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of resources loaded
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no resources were loaded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ResourceLookup for JsonCatalog {
    fn name(&self) -> &str {
        "json"
    }

    async fn get(&self, resource_id: &str) -> Result<Option<ResourceRecord>> {
        self.records.get(resource_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let lookup = InMemoryLookup::new()
            .with(ResourceRecord::new("vid1").with_external_id("abcdef"))
            .with(ResourceRecord::new("vid2").inactive());

        assert_eq!(lookup.len(), 2);
        assert!(lookup.get("vid1").await.unwrap().is_some());
        assert!(!lookup.get("vid2").await.unwrap().unwrap().is_active);
        assert!(lookup.get("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_document_add_replaces_by_id() {
        let mut document = CatalogDocument::new();
        assert!(document.add(ResourceRecord::new("vid1").with_title("Old")));
        assert!(!document.add(ResourceRecord::new("vid1").with_title("New")));

        assert_eq!(document.resources.len(), 1);
        assert_eq!(document.resources[0].title, "New");
    }

    #[tokio::test]
    async fn test_json_catalog_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("catalog.json");

        let mut document = CatalogDocument::new();
        document.add(
            ResourceRecord::new("vid1").with_direct_url("https://cdn.example.com/a.mp4"),
        );
        JsonCatalog::save(&path, &document).await.unwrap();

        let catalog = JsonCatalog::load(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.path(), path.as_path());

        let record = catalog.get("vid1").await.unwrap().unwrap();
        assert_eq!(
            record.direct_url.as_deref(),
            Some("https://cdn.example.com/a.mp4")
        );
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("catalog.json");

        let record = ResourceRecord::new("vid1").with_title("Old");
        assert!(JsonCatalog::upsert(&path, record).await.unwrap());

        assert!(JsonCatalog::upsert(&path, ResourceRecord::new("vid2")).await.unwrap());

        let record = ResourceRecord::new("vid1")
            .with_title("New")
            .with_external_id("abcdef")
            .inactive();
        let inserted = JsonCatalog::upsert(&path, record).await.unwrap();
        assert!(!inserted);

        let document = JsonCatalog::load_document(&path).await.unwrap();
        assert_eq!(document.resources.len(), 2);
        assert_eq!(document.resources[0].id, "vid1");
        assert_eq!(document.resources[0].title, "New");
        assert!(!document.resources[0].is_active);

        let catalog = JsonCatalog::load(&path).await.unwrap();
        let record = catalog.get("vid1").await.unwrap().unwrap();
        assert_eq!(record.external_id.as_deref(), Some("abcdef"));
    }

    #[tokio::test]
    async fn test_upsert_refuses_to_overwrite_corrupt_catalog() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(JsonCatalog::upsert(&path, ResourceRecord::new("vid1")).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_json_catalog_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = JsonCatalog::load(temp.path().join("absent.json"))
            .await
            .unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_json_catalog_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(JsonCatalog::load(&path).await.is_err());
    }
}
