//! Codelab catalog: scanning content directories and publishing the API.
//!
//! # Storage Layout
//!
//! ```text
//! <site root>/
//! ├── categories-events.json    # Category themes and events
//! ├── api/
//! │   └── codelabs.json         # Published API document
//! └── src/codelabs/
//!     └── <codelab>/            # One directory per codelab
//!         ├── codelab.json      # Metadata written by claat
//!         └── index.html
//! ```

pub mod api;
pub mod codelab;
pub mod scanner;
pub mod taxonomy;

pub use api::{publish_api, ApiDocument, PublishError};
pub use codelab::{Codelab, METADATA_FILENAME};
pub use scanner::{scan_codelabs, EntryFailure, IncompleteScan, Scan, ScanError, ScanOptions};
pub use taxonomy::{EventInfo, Taxonomy, Theme};
