//! Pauses between pipeline steps.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics;

/// Why the pipeline is pausing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Throttle between two candidates.
    InterItem,
    /// The publishing service refused to work for now.
    ApiCooldown,
    /// The per-run upload cap has been reached.
    QuotaCooldown,
}

impl PauseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseReason::InterItem => "inter_item",
            PauseReason::ApiCooldown => "api_cooldown",
            PauseReason::QuotaCooldown => "quota_cooldown",
        }
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Waits between steps.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, reason: PauseReason, duration: Duration);
}

/// Pacer that sleeps on the tokio timer.
#[derive(Debug, Default, Clone)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, reason: PauseReason, duration: Duration) {
        metrics::PAUSES_TOTAL
            .with_label_values(&[reason.as_str()])
            .inc();

        if duration.is_zero() {
            return;
        }
        if reason != PauseReason::InterItem {
            info!(%reason, secs = duration.as_secs(), "Cooling down");
        }
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_reason_labels() {
        assert_eq!(PauseReason::ApiCooldown.to_string(), "api_cooldown");
        assert_eq!(
            serde_json::to_string(&PauseReason::QuotaCooldown).unwrap(),
            "\"quota_cooldown\""
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pacer_sleeps() {
        let start = tokio::time::Instant::now();
        TokioPacer
            .pause(PauseReason::InterItem, Duration::from_secs(10))
            .await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
