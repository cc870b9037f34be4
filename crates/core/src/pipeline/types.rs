//! Types for the pipeline runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::folders::FolderError;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Working directories could not be prepared.
    #[error("folder error: {0}")]
    Folders(#[from] FolderError),
}

/// Last stage a candidate reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStage {
    Fetched,
    Downloaded,
    DurationChecked,
    Rendered,
    Staged,
    Published,
    Recorded,
}

impl CandidateStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStage::Fetched => "fetched",
            CandidateStage::Downloaded => "downloaded",
            CandidateStage::DurationChecked => "duration_checked",
            CandidateStage::Rendered => "rendered",
            CandidateStage::Staged => "staged",
            CandidateStage::Published => "published",
            CandidateStage::Recorded => "recorded",
        }
    }
}

/// Why a candidate was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    DownloadFailed(String),
    /// Clip is too long for a Short.
    TooLong { duration_secs: f64 },
    MissingDownload,
    /// The probe reported no duration, so the length gate cannot be applied.
    UnknownDuration,
    ProbeFailed(String),
    StagingFailed(String),
    RenderFailed(String),
    /// The per-run cap was already reached.
    QuotaReached,
    PublishFailed { kind: String, message: String },
}

/// Final state of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CandidateOutcome {
    Published {
        video_id: String,
        /// False if the URL could not be appended to the dedup record.
        recorded: bool,
    },
    Skipped {
        stage: CandidateStage,
        reason: SkipReason,
    },
}

impl CandidateOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, CandidateOutcome::Published { .. })
    }

    /// Last stage reached.
    pub fn stage(&self) -> CandidateStage {
        match self {
            CandidateOutcome::Published { recorded: true, .. } => CandidateStage::Recorded,
            CandidateOutcome::Published { recorded: false, .. } => CandidateStage::Published,
            CandidateOutcome::Skipped { stage, .. } => *stage,
        }
    }
}

/// Outcome of one candidate, for the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub url: String,
    pub title: String,
    pub outcome: CandidateOutcome,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub candidates: Vec<CandidateReport>,
    /// Successful publishes in this run.
    pub quota_used: u32,
    pub quota_cap: u32,
}

impl RunReport {
    pub fn published_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.outcome.is_published())
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.candidates.len() - self.published_count()
    }
}

/// Mutable state of a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    quota_used: u32,
    quota_cap: u32,
}

impl RunContext {
    pub fn new(quota_cap: u32) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            quota_used: 0,
            quota_cap,
        }
    }

    pub fn quota_used(&self) -> u32 {
        self.quota_used
    }

    pub fn quota_cap(&self) -> u32 {
        self.quota_cap
    }

    /// Returns true while another publish is allowed.
    pub fn can_publish(&self) -> bool {
        self.quota_used < self.quota_cap
    }

    pub fn record_publish(&mut self) {
        self.quota_used += 1;
    }

    pub fn into_report(self, candidates: Vec<CandidateReport>) -> RunReport {
        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            candidates,
            quota_used: self.quota_used,
            quota_cap: self.quota_cap,
        }
    }
}
