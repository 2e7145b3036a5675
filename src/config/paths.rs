//! Canonical site layout and tool defaults.
//!
//! Single source of truth - import this instead of hardcoding paths.
//! Relative paths are resolved against the site root.
//!
//! ## Site Layout
//!
//! | Location | Owner | Purpose |
//! |----------|-------|---------|
//! | `tools/` | codelabs | Config file, claat binary |
//! | `src/codelabs/` | claat | One directory per codelab |
//! | `api/codelabs.json` | codelabs | Published API document |
//! | `categories-events.json` | maintainers | Category themes, events |
//! | `bower.json` | frontend | Marks the site root |

// ============================================================================
// Site layout
// ============================================================================

/// Tools directory (holds the config file and the claat binary)
pub const TOOLS_DIR: &str = "tools";

/// Codelab content directory
pub const CONTENT_DIR: &str = "src/codelabs";

/// Published API document
pub const API_PATH: &str = "api/codelabs.json";

/// Category and event taxonomy
pub const TAXONOMY_FILE: &str = "categories-events.json";

/// File that only exists at the site root
pub const ROOT_MARKER: &str = "bower.json";

/// Optional config file
pub const CONFIG_FILE: &str = "tools/codelabs.yaml";

// ============================================================================
// claat defaults
// ============================================================================

/// claat binary name, stored in the tools directory
pub const CLAAT_BINARY: &str = "claat-linux-amd64";

/// Download location (fork carrying the difficulty tag)
pub const CLAAT_URL: &str = "https://people.canonical.com/~didrocks/claat-linux-amd64";

/// HTML template used on export
pub const CLAAT_TEMPLATE: &str = "ubuntu-template.html";

/// Asset prefix, relative to a codelab directory
pub const CLAAT_PREFIX: &str = "../../..";

/// Google Analytics account embedded in exported codelabs
pub const DEFAULT_GA: &str = "UA-1018242-64";

// ============================================================================
// Tests
// ============================================================================
