//! Pacer that records pauses instead of sleeping.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::pipeline::{Pacer, PauseReason};

#[derive(Debug, Default, Clone)]
pub struct RecordingPacer {
    pauses: Arc<RwLock<Vec<(PauseReason, Duration)>>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded_pauses(&self) -> Vec<(PauseReason, Duration)> {
        self.pauses.read().await.clone()
    }

    /// Number of pauses taken for `reason`.
    pub async fn count(&self, reason: PauseReason) -> usize {
        self.pauses
            .read()
            .await
            .iter()
            .filter(|(r, _)| *r == reason)
            .count()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, reason: PauseReason, duration: Duration) {
        self.pauses.write().await.push((reason, duration));
    }
}
