//! Mock publisher for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::publish::{PublishError, PublishReceipt, Publisher, UploadMetadata};

/// A recorded publish attempt for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub path: PathBuf,
    pub metadata: UploadMetadata,
    /// Bytes of the file at the time of the call.
    pub bytes: Vec<u8>,
}

/// Mock implementation of the Publisher trait.
///
/// Queued errors are returned first, one per call; after that every call
/// succeeds with ids `video-1`, `video-2`, ...
#[derive(Debug, Default)]
pub struct MockPublisher {
    publishes: Arc<RwLock<Vec<RecordedPublish>>>,
    errors: Arc<RwLock<VecDeque<PublishError>>>,
    next_id: Arc<RwLock<u32>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an error for an upcoming call.
    pub async fn push_error(&self, error: PublishError) {
        self.errors.write().await.push_back(error);
    }

    /// All publish attempts, including failed ones.
    pub async fn recorded_publishes(&self) -> Vec<RecordedPublish> {
        self.publishes.read().await.clone()
    }

    pub async fn publish_count(&self) -> usize {
        self.publishes.read().await.len()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
    ) -> Result<PublishReceipt, PublishError> {
        let bytes = tokio::fs::read(path).await?;
        self.publishes.write().await.push(RecordedPublish {
            path: path.to_path_buf(),
            metadata: metadata.clone(),
            bytes,
        });

        if let Some(error) = self.errors.write().await.pop_front() {
            return Err(error);
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        Ok(PublishReceipt {
            video_id: format!("video-{}", *next_id),
        })
    }
}
