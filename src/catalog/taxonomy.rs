//! Category themes and event descriptors.
//!
//! The taxonomy is maintained by hand in `categories-events.json` and merged
//! into the API document on every publish.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Display colors for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(rename = "maincolor")]
    pub main_color: String,

    #[serde(rename = "secondarycolor")]
    pub secondary_color: String,

    #[serde(rename = "lightcolor")]
    pub light_color: String,
}

/// An event that codelabs can be grouped under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub name: String,
    pub logo: String,
    pub description: String,
}

/// Category and event data published next to the codelabs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Category name to theme
    #[serde(default)]
    pub categories: BTreeMap<String, Theme>,

    /// Event name to descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, EventInfo>>,
}

impl Taxonomy {
    /// Load the taxonomy file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read taxonomy file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse taxonomy file: {}", path.display()))
    }

    /// Get the theme for a category
    pub fn theme(&self, category: &str) -> Option<&Theme> {
        self.categories.get(category)
    }
}
