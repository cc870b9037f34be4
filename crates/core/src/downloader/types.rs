//! Types for the downloader module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::source::Candidate;

/// Errors that can occur while downloading media.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Unsupported media URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Failed to parse media manifest: {0}")]
    ManifestParse(String),

    /// Expected admission rejection, not a fault.
    #[error("Clip is {duration_secs:.1}s, longer than the {max_secs:.0}s limit")]
    TooLong { duration_secs: f64, max_secs: f64 },

    #[error("No video track found")]
    NoMedia,

    #[error("FFmpeg not found at: {path}")]
    FfmpegNotFound { path: PathBuf },

    #[error("Muxing failed: {reason}")]
    MuxFailed { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Returns true for the duration admission rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(self, DownloadError::TooLong { .. })
    }
}

/// A downloaded media file.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedMedia {
    /// Path of the written file inside the target directory.
    pub path: PathBuf,
    /// Duration advertised by the source, when it reported one.
    pub duration_secs: Option<f64>,
}

/// Downloads a candidate's media.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader.
    fn name(&self) -> &str;

    /// Writes the candidate's media into `target_dir`.
    ///
    /// On failure no partial files are left behind.
    async fn download(
        &self,
        candidate: &Candidate,
        target_dir: &Path,
    ) -> Result<DownloadedMedia, DownloadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_long_is_rejection() {
        let err = DownloadError::TooLong {
            duration_secs: 75.5,
            max_secs: 60.0,
        };
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "Clip is 75.5s, longer than the 60s limit");
        assert!(!DownloadError::NoMedia.is_rejection());
    }
}
