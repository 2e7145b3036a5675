//! API document generation.
//!
//! The API document is the single JSON file the web frontend reads: every
//! codelab plus the category themes and events. It is rebuilt from scratch on
//! each publish and swapped into place atomically, so readers never observe a
//! half-written file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use super::codelab::Codelab;
use super::taxonomy::{EventInfo, Taxonomy, Theme};

/// Errors while publishing the API document
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize API document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write API document {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The published catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    pub codelabs: Vec<Codelab>,
    pub categories: BTreeMap<String, Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, EventInfo>>,
}

impl ApiDocument {
    /// Build a document; codelabs are ordered by source identifier
    pub fn new(mut codelabs: Vec<Codelab>, taxonomy: &Taxonomy) -> Self {
        codelabs.sort_by(|a, b| a.source.cmp(&b.source));

        Self {
            codelabs,
            categories: taxonomy.categories.clone(),
            events: taxonomy.events.clone(),
        }
    }

    /// Serialize with two-space indentation
    pub fn to_json(&self) -> Result<String, PublishError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a previously published document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Replace the document at `path`.
    ///
    /// The content goes to a temporary file next to `path` first and is then
    /// renamed over it.
    pub fn write(&self, path: &Path) -> Result<(), PublishError> {
        let json = self.to_json()?;
        let write_error = |source| PublishError::Write {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_error)?;

        let mut file = NamedTempFile::new_in(parent).map_err(write_error)?;
        file.write_all(json.as_bytes()).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;

        // Temp files are created 0600; the document is served publicly
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(write_error)?;
        }

        file.persist(path).map_err(|e| write_error(e.error))?;

        info!(
            "Published {} codelab(s) to {}",
            self.codelabs.len(),
            path.display()
        );
        Ok(())
    }
}

/// Build the document from a scan and write it to `path`
pub fn publish_api(
    codelabs: Vec<Codelab>,
    taxonomy: &Taxonomy,
    path: &Path,
) -> Result<ApiDocument, PublishError> {
    let document = ApiDocument::new(codelabs, taxonomy);
    document.write(path)?;
    Ok(document)
}
