//! Command-line interface for codelabs.
//!
//! Provides commands for importing, refreshing and removing codelabs, and
//! for regenerating the API document. Every mutating command regenerates the
//! API afterwards, even when the mutation failed, so the published catalog
//! always matches what is on disk.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::fs;
use tracing::{error, info, warn};

use crate::adapters::{ClaatAdapter, Exporter};
use crate::catalog::{publish_api, scan_codelabs, ApiDocument, Scan, ScanError, Taxonomy};
use crate::config::{EnvOverrides, SiteConfig};

/// codelabs - Manage the codelab catalog and its API document
#[derive(Parser, Debug)]
#[command(name = "codelabs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Site root (discovered from the current directory when omitted)
    #[arg(long, global = true, env = "CODELABS_SITE_ROOT")]
    pub root: Option<PathBuf>,

    /// Publish the codelabs that loaded even if some failed
    #[arg(long, global = true)]
    pub allow_partial: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import codelabs from source document IDs
    Add {
        /// Source document IDs (without the docs.google.com/... part)
        #[arg(required = true)]
        doc_ids: Vec<String>,

        /// Google Analytics account
        #[arg(long, env = "CODELABS_GA")]
        ga: Option<String>,
    },

    /// Refresh every existing codelab from its source document
    Update {
        /// Google Analytics account
        #[arg(long, env = "CODELABS_GA")]
        ga: Option<String>,
    },

    /// Remove codelabs by directory name or source ID
    #[command(alias = "rm")]
    Remove {
        /// Directory names or source IDs
        #[arg(required = true)]
        targets: Vec<String>,
    },

    /// Rescan the content directory and publish the API document
    Generate,

    /// List codelabs found in the content directory
    List,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let overrides = EnvOverrides::from_env();
        let config = match &self.root {
            Some(root) => SiteConfig::load(root, &overrides)?,
            None => SiteConfig::discover(&overrides)?,
        };
        let allow_partial = self.allow_partial;

        match self.command {
            Commands::Add { doc_ids, ga } => {
                let taxonomy = Taxonomy::load(&config.taxonomy_path).await?;
                let ga = ga.unwrap_or_else(|| config.claat.ga.clone());
                let added = add_codelabs(&config, &unique(&doc_ids), &ga).await;
                finish_mutation(&config, &taxonomy, allow_partial, added).await
            }
            Commands::Update { ga } => {
                let taxonomy = Taxonomy::load(&config.taxonomy_path).await?;
                let ga = ga.unwrap_or_else(|| config.claat.ga.clone());
                let updated = update_codelabs(&config, &ga).await;
                finish_mutation(&config, &taxonomy, allow_partial, updated).await
            }
            Commands::Remove { targets } => {
                let taxonomy = Taxonomy::load(&config.taxonomy_path).await?;
                let removed = remove_command(&config, &unique(&targets)).await;
                finish_mutation(&config, &taxonomy, allow_partial, removed).await
            }
            Commands::Generate => {
                let taxonomy = Taxonomy::load(&config.taxonomy_path).await?;
                regenerate(&config, &taxonomy, allow_partial).await.map(|_| ())
            }
            Commands::List => list_codelabs(&config).await,
            Commands::Config => {
                show_config(&config);
                Ok(())
            }
        }
    }
}

/// De-duplicate arguments, keeping the first occurrence of each
pub fn unique(args: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(args.len());
    args.iter()
        .filter(|arg| seen.insert(arg.as_str()))
        .cloned()
        .collect()
}

/// Regenerate the API, then report the mutation's own outcome
async fn finish_mutation(
    config: &SiteConfig,
    taxonomy: &Taxonomy,
    allow_partial: bool,
    mutation: Result<()>,
) -> Result<()> {
    let published = regenerate(config, taxonomy, allow_partial).await;

    match (mutation, published) {
        (Err(e), Err(publish_err)) => {
            error!("{:#}", publish_err);
            Err(e)
        }
        (Err(e), Ok(_)) => Err(e),
        (Ok(()), published) => published.map(|_| ()),
    }
}

/// Rescan the content directory and publish the API document.
///
/// An incomplete scan blocks publishing unless `allow_partial` is set, in
/// which case the codelabs that did load are published.
pub async fn regenerate(
    config: &SiteConfig,
    taxonomy: &Taxonomy,
    allow_partial: bool,
) -> Result<ApiDocument> {
    let codelabs = match scan_codelabs(&config.content_dir, &config.scan).await {
        Ok(scan) => scan.codelabs,
        Err(ScanError::Incomplete(incomplete)) if allow_partial => {
            warn!(
                "Publishing {} codelab(s) without the {} that failed to load",
                incomplete.partial.len(),
                incomplete.failures.len()
            );
            incomplete.partial.codelabs
        }
        Err(e) => return Err(e).context("Couldn't introspect existing codelabs"),
    };

    publish_api(codelabs, taxonomy, &config.api_path).context("Couldn't save the codelabs API file")
}

async fn add_codelabs(config: &SiteConfig, doc_ids: &[String], ga: &str) -> Result<()> {
    let claat = ClaatAdapter::new(&config.claat);
    claat
        .ensure_binary()
        .await
        .context("Couldn't get the claat tool")?;

    info!("Importing {}", doc_ids.join(", "));
    claat
        .export(doc_ids, ga, &config.content_dir)
        .await
        .context("Couldn't add new codelab")
}

async fn update_codelabs(config: &SiteConfig, ga: &str) -> Result<()> {
    let claat = ClaatAdapter::new(&config.claat);
    claat
        .ensure_binary()
        .await
        .context("Couldn't get the claat tool")?;

    claat
        .update(ga, &config.content_dir)
        .await
        .context("Couldn't refresh codelabs")
}

async fn remove_command(config: &SiteConfig, targets: &[String]) -> Result<()> {
    // A broken codelab elsewhere shouldn't prevent removing this one
    let index = match scan_codelabs(&config.content_dir, &config.scan).await {
        Ok(scan) => scan.index,
        Err(ScanError::Incomplete(incomplete)) => {
            warn!("Resolving source IDs against a partial catalog");
            incomplete.partial.index
        }
        Err(e) => return Err(e).context("Couldn't introspect existing codelabs"),
    };

    let failed = remove_codelabs(&config.content_dir, &index, targets).await;
    if !failed.is_empty() {
        anyhow::bail!(
            "{} codelab(s) couldn't be removed: {}",
            failed.len(),
            failed.join(", ")
        );
    }

    Ok(())
}

/// Remove codelab directories named by directory or by source ID.
///
/// Each target is first tried as a directory under `content_dir`, then
/// looked up in `index`. Returns the targets that couldn't be removed.
pub async fn remove_codelabs(
    content_dir: &Path,
    index: &BTreeMap<String, String>,
    targets: &[String],
) -> Vec<String> {
    let mut failed = Vec::new();

    for target in targets {
        match remove_target(content_dir, index, target).await {
            Ok(path) => info!("Removed {}", path.display()),
            Err(e) => {
                warn!("Couldn't find or remove {}: {:#}", target, e);
                failed.push(target.clone());
            }
        }
    }

    failed
}

async fn remove_target(
    content_dir: &Path,
    index: &BTreeMap<String, String>,
    target: &str,
) -> Result<PathBuf> {
    let by_dir = content_dir.join(target);
    let dir = if is_plain_name(target) && fs::metadata(&by_dir).await.is_ok() {
        by_dir
    } else if let Some(url) = index.get(target) {
        let name = url.trim_matches('/');
        if !is_plain_name(name) {
            anyhow::bail!("Codelab URL {} doesn't name a directory", url);
        }
        content_dir.join(name)
    } else {
        anyhow::bail!("No codelab directory or source ID named {}", target);
    };

    fs::remove_dir_all(&dir)
        .await
        .with_context(|| format!("Found, but couldn't remove {}", dir.display()))?;

    Ok(dir)
}

/// A single normal path component (no separators, no `..`)
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// List codelabs in the content directory
async fn list_codelabs(config: &SiteConfig) -> Result<()> {
    let (scan, failures) = match scan_codelabs(&config.content_dir, &config.scan).await {
        Ok(scan) => (scan, Vec::new()),
        Err(ScanError::Incomplete(incomplete)) => (incomplete.partial, incomplete.failures),
        Err(e) => return Err(e).context("Couldn't introspect existing codelabs"),
    };

    print_catalog(&scan);

    if !failures.is_empty() {
        println!("\nFailed to load {} codelab(s):", failures.len());
        for failure in &failures {
            println!("  {}", failure);
        }
    }

    Ok(())
}

fn print_catalog(scan: &Scan) {
    if scan.is_empty() {
        println!("No codelabs found. Use 'codelabs add <doc-id>' to import one.");
        return;
    }

    println!("{:<30} {:<20} {:<40}", "URL", "CATEGORY", "TITLE");
    println!("{}", "-".repeat(90));

    for codelab in scan.sorted() {
        println!(
            "{:<30} {:<20} {:<40}",
            codelab.dir_name(),
            codelab.category.first().map(String::as_str).unwrap_or("-"),
            truncate(&codelab.title, 40)
        );
    }

    println!("\nTotal: {} codelabs", scan.len());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// Show the resolved configuration (for debugging)
fn show_config(config: &SiteConfig) {
    println!("Codelabs configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Site root: {}", config.root.display());
    println!("  Content:   {}", config.content_dir.display());
    println!("  API:       {}", config.api_path.display());
    println!("  Taxonomy:  {}", config.taxonomy_path.display());
    println!();
    println!("claat:");
    println!("  Binary:    {}", config.claat.binary.display());
    println!("  URL:       {}", config.claat.url);
    println!("  Template:  {}", config.claat.template);
    println!("  Prefix:    {}", config.claat.prefix);
    println!("  GA:        {}", config.claat.ga);
    println!();
    println!("Scan:");
    match config.scan.entry_timeout {
        Some(timeout) => println!("  Entry timeout: {}s", timeout.as_secs()),
        None => println!("  Entry timeout: (none)"),
    }
}
