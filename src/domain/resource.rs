//! Resource records as exposed by the catalog.

use serde::{Deserialize, Serialize};

/// A media resource, read-only from the policy's point of view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource identifier
    pub id: String,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Inactive resources are treated as missing
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Direct media URL (e.g. an MP4), preferred when valid
    #[serde(default)]
    pub direct_url: Option<String>,

    /// Third-party platform identifier used for embeds
    #[serde(default)]
    pub external_id: Option<String>,
}

fn default_active() -> bool {
    true
}

impl ResourceRecord {
    /// Create an active resource with no playable source
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            is_active: true,
            direct_url: None,
            external_id: None,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the direct media URL
    pub fn with_direct_url(mut self, url: impl Into<String>) -> Self {
        self.direct_url = Some(url.into());
        self
    }

    /// Set the external platform identifier
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Mark the resource inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}
