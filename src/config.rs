//! Configuration for the codelabs site.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags and environment variables (CODELABS_SITE_ROOT,
//!    CODELABS_CONTENT_DIR, CODELABS_API_PATH, CODELABS_TAXONOMY, CODELABS_GA)
//! 2. Config file (tools/codelabs.yaml under the site root)
//! 3. Defaults (see [`paths`])
//!
//! Site root discovery:
//! - Searches the current directory, then the executable's directory, and
//!   their parents for a directory holding tools/, src/codelabs/ and bower.json
//! - Paths in the config file are relative to the site root
//!
//! The resolved [`SiteConfig`] is passed explicitly to every component; there
//! is no process-wide configuration.

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::ScanOptions;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub claat: Option<ClaatConfig>,
    #[serde(default)]
    pub scan: Option<ScanConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Codelab content directory
    pub content: Option<String>,
    /// API document output path
    pub api: Option<String>,
    /// Taxonomy file
    pub taxonomy: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaatConfig {
    pub binary: Option<String>,
    pub url: Option<String>,
    pub template: Option<String>,
    pub prefix: Option<String>,
    pub ga: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanConfig {
    pub entry_timeout_seconds: Option<u64>,
}

/// Path overrides taken from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub content: Option<PathBuf>,
    pub api: Option<PathBuf>,
    pub taxonomy: Option<PathBuf>,
}

impl EnvOverrides {
    /// Read CODELABS_CONTENT_DIR, CODELABS_API_PATH and CODELABS_TAXONOMY
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var_os(name).map(PathBuf::from);

        Self {
            content: var("CODELABS_CONTENT_DIR"),
            api: var("CODELABS_API_PATH"),
            taxonomy: var("CODELABS_TAXONOMY"),
        }
    }
}

/// Settings for driving the claat export tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaatSettings {
    /// Where the binary lives (downloaded on first use)
    pub binary: PathBuf,
    /// Download URL
    pub url: String,
    /// HTML template for exports
    pub template: String,
    /// Asset prefix passed to claat
    pub prefix: String,
    /// Google Analytics account
    pub ga: String,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site root
    pub root: PathBuf,
    /// Directory holding one subdirectory per codelab
    pub content_dir: PathBuf,
    /// Where the API document is published
    pub api_path: PathBuf,
    /// Category and event taxonomy file
    pub taxonomy_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// claat settings
    pub claat: ClaatSettings,
    /// Scanner settings
    pub scan: ScanOptions,
}

impl SiteConfig {
    /// Load configuration for a site root, reading its config file if present
    pub fn load(root: &Path, overrides: &EnvOverrides) -> Result<Self> {
        let config_path = root.join(paths::CONFIG_FILE);

        let (file, config_file) = if config_path.exists() {
            (load_config_file(&config_path)?, Some(config_path))
        } else {
            (ConfigFile::default(), None)
        };

        let mut config = Self::resolve(root, file, overrides);
        config.config_file = config_file;
        Ok(config)
    }

    /// Discover the site root and load its configuration
    pub fn discover(overrides: &EnvOverrides) -> Result<Self> {
        let root = discover_site_root()?;
        Self::load(&root, overrides)
    }

    /// Combine config file values, overrides and defaults
    pub fn resolve(root: &Path, file: ConfigFile, overrides: &EnvOverrides) -> Self {
        let path_or = |overridden: &Option<PathBuf>, configured: Option<&String>, default: &str| {
            if let Some(path) = overridden {
                path.clone()
            } else {
                resolve_path(root, configured.map(String::as_str).unwrap_or(default))
            }
        };

        let content_dir = path_or(
            &overrides.content,
            file.paths.content.as_ref(),
            paths::CONTENT_DIR,
        );
        let api_path = path_or(&overrides.api, file.paths.api.as_ref(), paths::API_PATH);
        let taxonomy_path = path_or(
            &overrides.taxonomy,
            file.paths.taxonomy.as_ref(),
            paths::TAXONOMY_FILE,
        );

        let claat = file.claat.unwrap_or_default();
        let default_binary = format!("{}/{}", paths::TOOLS_DIR, paths::CLAAT_BINARY);
        let claat = ClaatSettings {
            binary: resolve_path(root, claat.binary.as_deref().unwrap_or(default_binary.as_str())),
            url: claat.url.unwrap_or_else(|| paths::CLAAT_URL.to_string()),
            template: claat
                .template
                .unwrap_or_else(|| paths::CLAAT_TEMPLATE.to_string()),
            prefix: claat.prefix.unwrap_or_else(|| paths::CLAAT_PREFIX.to_string()),
            ga: claat.ga.unwrap_or_else(|| paths::DEFAULT_GA.to_string()),
        };

        let scan = ScanOptions {
            entry_timeout: file
                .scan
                .and_then(|s| s.entry_timeout_seconds)
                .map(Duration::from_secs),
        };

        Self {
            root: root.to_path_buf(),
            content_dir,
            api_path,
            taxonomy_path,
            config_file: None,
            claat,
            scan,
        }
    }
}

/// Check whether a directory looks like the site root
fn is_site_root(dir: &Path) -> bool {
    dir.join(paths::TOOLS_DIR).is_dir()
        && dir.join(paths::CONTENT_DIR).is_dir()
        && dir.join(paths::ROOT_MARKER).exists()
}

/// Find the site root by searching `start` and its parents
pub fn find_site_root(start: &Path) -> Option<PathBuf> {
    start.ancestors().find(|dir| is_site_root(dir)).map(Path::to_path_buf)
}

/// Find the site root from the current directory or the executable's directory
pub fn discover_site_root() -> Result<PathBuf> {
    let mut starts = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        starts.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        starts.push(exe_dir);
    }

    starts
        .iter()
        .find_map(|start| find_site_root(start))
        .context("Couldn't find the codelabs site root (a directory with tools/, src/codelabs/ and bower.json)")
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the site root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
