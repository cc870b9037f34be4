//! Working directory layout for a run.
//!
//! Every run owns three directories under a base path (download, render,
//! final). They are wiped and recreated empty before the first candidate
//! is processed.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::config::FoldersConfig;

/// Errors that can occur while preparing the working directories.
#[derive(Debug, Error)]
pub enum FolderError {
    /// Failed to remove a stale directory.
    #[error("Failed to remove directory: {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("Failed to create directory: {path}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The three stage directories of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub base: PathBuf,
    pub download: PathBuf,
    pub render: PathBuf,
    pub final_output: PathBuf,
}

impl FolderLayout {
    /// Stage directories in creation order.
    pub fn stage_dirs(&self) -> [&Path; 3] {
        [&self.download, &self.render, &self.final_output]
    }
}

/// Creates the directory layout used by a run.
#[derive(Debug, Clone)]
pub struct FolderManager {
    layout: FolderLayout,
}

impl FolderManager {
    pub fn new(config: &FoldersConfig) -> Self {
        let base = config.base.clone();
        Self {
            layout: FolderLayout {
                download: base.join(&config.download),
                render: base.join(&config.render),
                final_output: base.join(&config.final_output),
                base,
            },
        }
    }

    /// Creates a manager with the default directory names under `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self::new(&FoldersConfig {
            base: base.into(),
            ..Default::default()
        })
    }

    pub fn layout(&self) -> &FolderLayout {
        &self.layout
    }

    /// Wipes and recreates every stage directory.
    ///
    /// The base directory is created if missing but never wiped, so files
    /// that live next to the stage directories survive.
    pub async fn prepare(&self) -> Result<FolderLayout, FolderError> {
        fs::create_dir_all(&self.layout.base)
            .await
            .map_err(|e| FolderError::CreateFailed {
                path: self.layout.base.clone(),
                source: e,
            })?;

        for dir in self.layout.stage_dirs() {
            recreate_dir(dir).await?;
        }

        debug!(base = %self.layout.base.display(), "Working directories prepared");
        Ok(self.layout.clone())
    }
}

async fn recreate_dir(path: &Path) -> Result<(), FolderError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed stale directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(FolderError::RemoveFailed {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    fs::create_dir_all(path)
        .await
        .map_err(|e| FolderError::CreateFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
