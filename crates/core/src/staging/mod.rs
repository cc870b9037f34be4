//! Verified file copies between pipeline directories.
//!
//! The probed download is staged into the render directory under a fixed
//! working name, and the render output is staged into the final directory.
//! Both copies hash the bytes written and re-hash the destination.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

const BUFFER_SIZE: usize = 64 * 1024;

/// Errors that can occur while staging a file.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Failed to calculate checksum for {path}")]
    ChecksumFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    fn copy_failed(source: &Path, destination: &Path, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            error,
        }
    }
}

/// A file copied into place.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Hex SHA-256 of the staged bytes.
    pub checksum: String,
}

/// Copies `source` to `destination`, replacing any existing file.
pub async fn stage_file(source: &Path, destination: &Path) -> Result<StagedFile, StagingError> {
    let (size_bytes, checksum) = copy_with_checksum(source, destination).await?;

    let actual = checksum_file(destination).await?;
    if actual != checksum {
        let _ = tokio::fs::remove_file(destination).await;
        return Err(StagingError::ChecksumMismatch {
            path: destination.to_path_buf(),
            expected: checksum,
            actual,
        });
    }

    debug!(
        source = %source.display(),
        destination = %destination.display(),
        size_bytes,
        "Staged file"
    );

    Ok(StagedFile {
        path: destination.to_path_buf(),
        size_bytes,
        checksum,
    })
}

async fn copy_with_checksum(
    source: &Path,
    destination: &Path,
) -> Result<(u64, String), StagingError> {
    let source_file = File::open(source).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StagingError::SourceNotFound {
                path: source.to_path_buf(),
            }
        } else {
            StagingError::copy_failed(source, destination, e)
        }
    })?;

    let dest_file = File::create(destination)
        .await
        .map_err(|e| StagingError::copy_failed(source, destination, e))?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, source_file);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, dest_file);
    let mut hasher = Sha256::new();
    let mut total_bytes = 0u64;
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| StagingError::copy_failed(source, destination, e))?;
        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
        writer
            .write_all(&buffer[..bytes_read])
            .await
            .map_err(|e| StagingError::copy_failed(source, destination, e))?;
        total_bytes += bytes_read as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| StagingError::copy_failed(source, destination, e))?;

    Ok((total_bytes, format!("{:x}", hasher.finalize())))
}

/// Hex SHA-256 of a file's contents.
pub async fn checksum_file(path: &Path) -> Result<String, StagingError> {
    let file = File::open(path)
        .await
        .map_err(|e| StagingError::ChecksumFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut hasher = Sha256::new();

    loop {
        let bytes_read =
            reader
                .read(&mut buffer)
                .await
                .map_err(|e| StagingError::ChecksumFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stage_file_copies_bytes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("abc123.mp4");
        let destination = temp.path().join("render_input.mp4");
        std::fs::write(&source, b"not really a video").unwrap();

        let staged = stage_file(&source, &destination).await.unwrap();

        assert_eq!(staged.path, destination);
        assert_eq!(staged.size_bytes, 18);
        assert_eq!(std::fs::read(&destination).unwrap(), b"not really a video");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_stage_file_checksum() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.mp4");
        let destination = temp.path().join("out.mp4");
        std::fs::write(&source, b"hello").unwrap();

        let staged = stage_file(&source, &destination).await.unwrap();
        assert_eq!(
            staged.checksum,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[tokio::test]
    async fn test_stage_file_overwrites() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.mp4");
        let destination = temp.path().join("FINAL_VIDEO.mp4");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(&destination, b"old and longer").unwrap();

        stage_file(&source, &destination).await.unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_stage_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = stage_file(&temp.path().join("missing.mp4"), &temp.path().join("out.mp4")).await;
        assert!(matches!(result, Err(StagingError::SourceNotFound { .. })));
    }
}
