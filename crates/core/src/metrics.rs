//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Source fetching (posts seen, candidates accepted)
//! - Pipeline (candidate outcomes, renders, publishes, cooldowns)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Source Metrics
// =============================================================================

/// Posts returned by the listing endpoint.
pub static POSTS_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shortsmith_posts_fetched_total",
        "Total posts returned by the content source",
    )
    .unwrap()
});

/// Posts that survived filtering.
pub static CANDIDATES_ACCEPTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shortsmith_candidates_accepted_total",
        "Total posts accepted as candidates after filtering",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Candidates finished, by outcome and the last stage reached.
pub static CANDIDATE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shortsmith_candidate_outcomes_total",
            "Total candidates processed by outcome",
        ),
        &["outcome", "stage"], // outcome: "published", "skipped"
    )
    .unwrap()
});

/// Render duration in seconds.
pub static RENDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("shortsmith_render_duration_seconds", "Duration of renders")
            .buckets(vec![0.1, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["mode"], // "pass_through", "composite"
    )
    .unwrap()
});

/// Publish attempts by result.
pub static PUBLISHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shortsmith_publishes_total", "Total publish attempts"),
        &["result"], // "success", "quota_exceeded", "authentication", "rejected", "transient", "io"
    )
    .unwrap()
});

/// Pauses taken by the pipeline.
pub static PAUSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shortsmith_pauses_total", "Total pipeline pauses by reason"),
        &["reason"], // "inter_item", "api_cooldown", "quota_cooldown"
    )
    .unwrap()
});

/// Successful publishes in the current run.
pub static QUOTA_USED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shortsmith_quota_used",
        "Successful publishes counted against the cap in the current run",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Source
        Box::new(POSTS_FETCHED.clone()),
        Box::new(CANDIDATES_ACCEPTED.clone()),
        // Pipeline
        Box::new(CANDIDATE_OUTCOMES.clone()),
        Box::new(RENDER_DURATION.clone()),
        Box::new(PUBLISHES_TOTAL.clone()),
        Box::new(PAUSES_TOTAL.clone()),
        Box::new(QUOTA_USED.clone()),
    ]
}
