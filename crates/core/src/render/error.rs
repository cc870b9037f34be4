//! Error types for the render module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing or rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output could not be written because of file permissions.
    ///
    /// Usually recoverable by retrying with another output path.
    #[error("Permission denied: {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input has no video stream with known dimensions.
    #[error("No video stream in {path}")]
    NoVideoStream { path: PathBuf },

    /// Render process failed.
    #[error("Render failed: {reason}")]
    RenderFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Render timed out.
    #[error("Render timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// I/O error during rendering.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },
}

impl RenderError {
    /// Creates a new render failed error with stderr output.
    pub fn render_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::RenderFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Maps an I/O error on `path`, keeping permission problems distinct.
    pub fn from_io(path: impl Into<PathBuf>, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.into(),
                source: e,
            },
            std::io::ErrorKind::NotFound => Self::InputNotFound { path: path.into() },
            _ => Self::Io(e),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_keeps_permission_distinct() {
        let err = RenderError::from_io(
            "/out.mp4",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_permission_denied());

        let err = RenderError::from_io(
            "/out.mp4",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(!err.is_permission_denied());
        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RenderError::Timeout { timeout_secs: 900 };
        assert_eq!(err.to_string(), "Render timed out after 900 seconds");
    }
}
