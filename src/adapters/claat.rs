//! claat adapter for codelab export.
//!
//! Runs the claat binary as a subprocess with inherited stdio so its progress
//! output reaches the user directly. The binary is downloaded into the tools
//! directory on first use and reused afterwards.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use super::Exporter;
use crate::config::ClaatSettings;

/// claat adapter using subprocess mode
#[derive(Debug, Clone)]
pub struct ClaatAdapter {
    /// Path to the claat binary
    binary_path: PathBuf,

    /// Where to fetch the binary from when missing
    download_url: String,

    /// HTML template used on export
    template: String,

    /// Asset prefix passed on export and update
    prefix: String,
}

impl ClaatAdapter {
    /// Create an adapter from resolved settings
    pub fn new(settings: &ClaatSettings) -> Self {
        Self {
            binary_path: settings.binary.clone(),
            download_url: settings.url.clone(),
            template: settings.template.clone(),
            prefix: settings.prefix.clone(),
        }
    }

    /// Download the binary unless it is already present, then mark it executable
    pub async fn ensure_binary(&self) -> Result<()> {
        if !self.binary_path.exists() {
            info!("Downloading claat tool from {}", self.download_url);

            let bytes = reqwest::get(&self.download_url)
                .await
                .with_context(|| format!("Couldn't download {}", self.download_url))?
                .error_for_status()
                .with_context(|| format!("Couldn't download {}", self.download_url))?
                .bytes()
                .await
                .with_context(|| format!("Couldn't read download from {}", self.download_url))?;

            if let Some(parent) = self.binary_path.parent() {
                fs::create_dir_all(parent).await?;
            }

            // Never leave a truncated binary at the final path
            let partial = self.binary_path.with_extension("download");
            fs::write(&partial, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", partial.display()))?;
            fs::rename(&partial, &self.binary_path)
                .await
                .with_context(|| format!("Failed to install {}", self.binary_path.display()))?;

            debug!(
                "Saved claat ({} bytes) to {}",
                bytes.len(),
                self.binary_path.display()
            );
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.binary_path, std::fs::Permissions::from_mode(0o755))
                .await
                .with_context(|| {
                    format!("Failed to make {} executable", self.binary_path.display())
                })?;
        }

        Ok(())
    }

    /// Arguments for `claat export`
    pub fn export_args(&self, doc_ids: &[String], ga: &str, content_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "export".into(),
            "-ga".into(),
            ga.into(),
            "-f".into(),
            self.template.as_str().into(),
            "-o".into(),
            content_dir.into(),
            "--prefix".into(),
            self.prefix.as_str().into(),
        ];
        args.extend(doc_ids.iter().map(OsString::from));
        args
    }

    /// Arguments for `claat update`
    pub fn update_args(&self, ga: &str, content_dir: &Path) -> Vec<OsString> {
        vec![
            "update".into(),
            "-ga".into(),
            ga.into(),
            "--prefix".into(),
            self.prefix.as_str().into(),
            content_dir.into(),
        ]
    }

    async fn run(&self, action: &str, args: Vec<OsString>) -> Result<()> {
        debug!("Running {} {:?}", self.binary_path.display(), args);

        let status = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| {
                format!(
                    "Failed to spawn claat {} ({})",
                    action,
                    self.binary_path.display()
                )
            })?;

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            anyhow::bail!("claat {} failed with exit code {}", action, exit_code);
        }

        Ok(())
    }
}

#[async_trait]
impl Exporter for ClaatAdapter {
    fn name(&self) -> &str {
        "claat"
    }

    async fn export(&self, doc_ids: &[String], ga: &str, content_dir: &Path) -> Result<()> {
        if doc_ids.is_empty() {
            anyhow::bail!("Need at least one codelab to import");
        }
        self.run("export", self.export_args(doc_ids, ga, content_dir))
            .await
    }

    async fn update(&self, ga: &str, content_dir: &Path) -> Result<()> {
        self.run("update", self.update_args(ga, content_dir)).await
    }
}
