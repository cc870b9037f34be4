//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::downloader::{DownloadError, DownloadedMedia, Downloader};
use crate::source::Candidate;

/// Mock implementation of the Downloader trait.
///
/// Writes a small placeholder file named after the last URL segment and
/// records every candidate it was asked for.
#[derive(Debug, Default)]
pub struct MockDownloader {
    downloads: Arc<RwLock<Vec<String>>>,
    failures: Arc<RwLock<HashMap<String, DownloadError>>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the download of `url` fail once with `error`.
    pub async fn fail_url(&self, url: &str, error: DownloadError) {
        self.failures.write().await.insert(url.to_string(), error);
    }

    /// URLs downloaded so far, in order.
    pub async fn recorded_downloads(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }
}

/// File name the mock writes for `url`.
pub fn mock_file_name(url: &str) -> String {
    let id = url.trim_end_matches('/').rsplit('/').next().unwrap_or("clip");
    format!("{}.mp4", id)
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        candidate: &Candidate,
        target_dir: &Path,
    ) -> Result<DownloadedMedia, DownloadError> {
        self.downloads.write().await.push(candidate.url.clone());

        if let Some(error) = self.failures.write().await.remove(&candidate.url) {
            return Err(error);
        }

        let path = target_dir.join(mock_file_name(&candidate.url));
        tokio::fs::write(&path, format!("video bytes of {}", candidate.url)).await?;

        Ok(DownloadedMedia {
            path,
            duration_secs: None,
        })
    }
}
