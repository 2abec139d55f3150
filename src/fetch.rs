//! Rendering engine executable resolution.
//!
//! An explicitly configured executable wins. Otherwise a pinned Chromium
//! revision is downloaded into a directory and its executable is used.

use crate::error::{ConvertError, ConvertResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions, Revision};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which Chromium revision to download, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchSpec {
    pub revision: String,
    /// Download directory. Falls back to [`default_download_dir`] when
    /// missing or not a directory.
    #[serde(default, alias = "path")]
    pub download_dir: Option<PathBuf>,
}

/// Downloads an engine revision and reports its executable path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevisionFetcher: Send + Sync {
    async fn fetch(&self, revision: u32, download_dir: &Path) -> Result<PathBuf>;
}

/// Fetches Chromium snapshots with chromiumoxide's browser fetcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumFetcher;

#[async_trait]
impl RevisionFetcher for ChromiumFetcher {
    async fn fetch(&self, revision: u32, download_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(download_dir)
            .await
            .with_context(|| format!("Failed to create {}", download_dir.display()))?;

        let options = BrowserFetcherOptions::builder()
            .with_path(download_dir)
            .with_revision(Revision::from(revision))
            .build()
            .context("Invalid fetcher options")?;

        info!(revision, dir = %download_dir.display(), "Downloading Chromium");
        let installed = BrowserFetcher::new(options)
            .fetch()
            .await
            .with_context(|| format!("Failed to download Chromium revision {}", revision))?;
        Ok(installed.executable_path)
    }
}

/// Where revisions are downloaded when no usable directory is configured.
pub fn default_download_dir() -> PathBuf {
    std::env::temp_dir().join("svg2png").join("renderer")
}

/// Produces a runnable engine executable.
///
/// # Errors
///
/// `ExecutableResolution` when `preferred` is not an existing file and there
/// is no fetch spec, when the revision is not numeric, or when the download
/// fails.
pub async fn resolve_executable(
    preferred: Option<&Path>,
    fetch: Option<&FetchSpec>,
    fetcher: &dyn RevisionFetcher,
) -> ConvertResult<PathBuf> {
    if let Some(path) = preferred.filter(|p| !p.as_os_str().is_empty()) {
        if path.is_file() {
            info!(executable = %path.display(), "Using configured engine executable");
            return Ok(path.to_path_buf());
        }
        warn!(executable = %path.display(), "Configured engine executable does not exist");
    }

    let Some(spec) = fetch.filter(|s| !s.revision.trim().is_empty()) else {
        return Err(ConvertError::executable_resolution(match preferred {
            Some(path) if !path.as_os_str().is_empty() => format!(
                "'{}' is not an executable file and no revision to download was given",
                path.display()
            ),
            _ => "neither an executable path nor a revision to download was given".to_string(),
        }));
    };

    let revision: u32 = spec.revision.trim().parse().map_err(|_| {
        ConvertError::executable_resolution(format!(
            "revision '{}' is not a Chromium snapshot number",
            spec.revision
        ))
    })?;

    let download_dir = usable_download_dir(spec.download_dir.as_deref());
    let executable = fetcher
        .fetch(revision, &download_dir)
        .await
        .map_err(|e| ConvertError::executable_resolution(format!("{:#}", e)))?;

    info!(executable = %executable.display(), revision, "Using downloaded engine executable");
    Ok(executable)
}

fn usable_download_dir(requested: Option<&Path>) -> PathBuf {
    match requested {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        Some(dir) => {
            warn!(
                dir = %dir.display(),
                "Download directory is not a directory, using default location"
            );
            default_download_dir()
        }
        None => default_download_dir(),
    }
}
