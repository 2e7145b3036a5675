//! Codelab metadata record.
//!
//! Every codelab directory carries a `codelab.json` written by the export
//! tool. Only the fields published in the API document are modeled here;
//! anything else in the file is ignored. `source` and `url` are required;
//! the remaining fields fall back to empty values when absent or `null`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the metadata file inside each codelab directory
pub const METADATA_FILENAME: &str = "codelab.json";

/// Metadata for a single codelab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelab {
    /// Source document identifier (unique within a catalog)
    pub source: String,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// Short description shown on the index page
    #[serde(default)]
    pub summary: String,

    /// Ordered category list (first entry drives the theme)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: Vec<String>,

    /// Difficulty level
    #[serde(default)]
    pub difficulty: i64,

    /// Estimated duration in minutes
    #[serde(default)]
    pub duration: i64,

    /// Free-form tags
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    /// Last update timestamp, as written by the export tool
    #[serde(default)]
    pub updated: String,

    /// Published URL (also the codelab directory name)
    pub url: String,
}

impl Codelab {
    /// Path of the metadata file for a codelab directory
    pub fn metadata_path(dir: &Path) -> PathBuf {
        dir.join(METADATA_FILENAME)
    }

    /// Directory name this codelab is published under.
    ///
    /// The URL may be written as `name`, `/name/` or `name/`.
    pub fn dir_name(&self) -> &str {
        self.url.trim_matches('/')
    }
}

/// The export tool writes `null` for lists it has nothing to put in
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
