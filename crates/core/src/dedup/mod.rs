//! Record of source URLs that were already published.
//!
//! The record is a flat text file of URLs each followed by a comma. It is
//! only ever appended to, once per successful publish.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const DELIMITER: char = ',';

/// Errors that can occur while reading or appending the record.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Failed to read dedup record {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to dedup record {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URL would corrupt the delimited file format.
    #[error("URL contains the record delimiter: {0}")]
    InvalidEntry(String),
}

/// Append-only set of published URLs backed by a delimited file.
#[derive(Debug)]
pub struct DedupRecord {
    path: PathBuf,
    entries: HashSet<String>,
}

impl DedupRecord {
    /// Opens the record, creating an empty file on first use.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DedupError> {
        let path = path.as_ref().to_path_buf();

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| DedupError::WriteFailed {
                            path: path.clone(),
                            source: e,
                        })?;
                }
                fs::write(&path, b"")
                    .await
                    .map_err(|e| DedupError::WriteFailed {
                        path: path.clone(),
                        source: e,
                    })?;
                debug!(path = %path.display(), "Created dedup record");
                String::new()
            }
            Err(e) => {
                return Err(DedupError::ReadFailed {
                    path: path.clone(),
                    source: e,
                })
            }
        };

        let entries = parse_entries(&contents);
        debug!(path = %path.display(), entries = entries.len(), "Loaded dedup record");

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `url` to the file and the in-memory set.
    ///
    /// Appending a URL that is already recorded is a no-op.
    pub async fn append(&mut self, url: &str) -> Result<(), DedupError> {
        if url.contains(DELIMITER) {
            return Err(DedupError::InvalidEntry(url.to_string()));
        }
        if self.entries.contains(url) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| DedupError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })?;

        file.write_all(format!("{}{}", url, DELIMITER).as_bytes())
            .await
            .map_err(|e| DedupError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })?;
        file.flush().await.map_err(|e| DedupError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })?;

        self.entries.insert(url.to_string());
        Ok(())
    }
}

fn parse_entries(contents: &str) -> HashSet<String> {
    contents
        .split(DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
