//! Pipeline runner.
//!
//! One run takes each candidate through a fixed sequence of stages:
//! - **Download** into the download directory (too-long clips are rejected early)
//! - **Duration check** on the probed file
//! - **Render** from the render directory to a fixed output name
//! - **Publish** the final copy, then record its URL in the dedup record
//!
//! Candidates are processed strictly one at a time. A failing candidate is
//! skipped, never fatal; only directory preparation and an unreadable dedup
//! record abort a run.

mod pacer;
mod runner;
mod types;

pub use pacer::{Pacer, PauseReason, TokioPacer};
pub use runner::PipelineRunner;
pub use types::{
    CandidateOutcome, CandidateReport, CandidateStage, PipelineError, RunContext, RunReport,
    SkipReason,
};
