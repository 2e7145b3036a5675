//! codelabs - Codelab catalog manager
//!
//! Keeps the published API document in sync with the codelab directories on
//! disk. Codelabs are imported and refreshed by the claat export tool; this
//! crate scans what claat leaves behind and publishes the result.
//!
//! # Architecture
//!
//! The system is built around a full rescan:
//! - Every content directory is scanned concurrently, one task per entry
//! - Broken codelabs are collected, never hiding the rest of the catalog
//! - The API document is rebuilt from scratch and swapped in atomically
//!
//! # Modules
//!
//! - `adapters`: External tool integrations (claat)
//! - `catalog`: Scanner, taxonomy and API document
//! - `config`: Site root discovery and path resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Import a codelab and republish
//! codelabs add 1AbCdEfGh
//!
//! # Republish after editing content by hand
//! codelabs generate
//!
//! # Remove by directory name or source ID
//! codelabs rm create-snap
//! ```

pub mod adapters;
pub mod catalog;
pub mod cli;
pub mod config;

// Re-export main types at crate root for convenience
pub use adapters::{ClaatAdapter, Exporter};
pub use catalog::{
    publish_api, scan_codelabs, ApiDocument, Codelab, EntryFailure, IncompleteScan, PublishError,
    Scan, ScanError, ScanOptions, Taxonomy,
};
pub use config::SiteConfig;
