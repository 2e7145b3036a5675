//! Adapter interfaces for external tools.
//!
//! Codelab content is produced by an export tool (claat) that converts
//! source documents into codelab directories. The catalog only reads what
//! the exporter leaves on disk.

pub mod claat;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the claat adapter
pub use claat::ClaatAdapter;

/// Trait for codelab export tools
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Human-readable exporter name
    fn name(&self) -> &str;

    /// Import new codelabs from source document IDs into `content_dir`
    async fn export(&self, doc_ids: &[String], ga: &str, content_dir: &Path) -> Result<()>;

    /// Refresh every codelab already present in `content_dir`
    async fn update(&self, ga: &str, content_dir: &Path) -> Result<()>;
}
