//! Pipeline runner implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::dedup::DedupRecord;
use crate::downloader::{DownloadError, Downloader};
use crate::folders::{FolderLayout, FolderManager};
use crate::metrics;
use crate::publish::{Publisher, UploadMetadata};
use crate::render::{RenderError, RenderJob, Renderer};
use crate::source::{Candidate, ContentSource, SourceFetcher};
use crate::staging::stage_file;

use super::pacer::{Pacer, PauseReason};
use super::types::{
    CandidateOutcome, CandidateReport, CandidateStage, PipelineError, RunContext, RunReport,
    SkipReason,
};

/// Drives one run: prepare folders, fetch candidates, process them in order.
pub struct PipelineRunner {
    config: Config,
    folders: FolderManager,
    fetcher: SourceFetcher,
    downloader: Arc<dyn Downloader>,
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn Publisher>,
    pacer: Arc<dyn Pacer>,
}

impl PipelineRunner {
    /// Create a new runner.
    pub fn new(
        config: Config,
        source: Arc<dyn ContentSource>,
        downloader: Arc<dyn Downloader>,
        renderer: Arc<dyn Renderer>,
        publisher: Arc<dyn Publisher>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        let folders = FolderManager::new(&config.folders);
        let fetcher = SourceFetcher::from_config(source, &config.reddit);

        Self {
            config,
            folders,
            fetcher,
            downloader,
            renderer,
            publisher,
            pacer,
        }
    }

    /// Runs the pipeline once over the current candidates.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut ctx = RunContext::new(self.config.pipeline.daily_upload_cap);
        info!(run_id = %ctx.run_id, "Starting run");

        let layout = self.folders.prepare().await?;
        let mut dedup = match DedupRecord::open(&self.config.database.path).await {
            Ok(dedup) => dedup,
            Err(e) => {
                error!("Failed to read dedup record, no candidates this run: {}", e);
                return Ok(ctx.into_report(Vec::new()));
            }
        };

        let candidates = self.fetcher.fetch_candidates(&dedup).await;
        if candidates.is_empty() {
            info!("No candidates found, nothing to do");
            return Ok(ctx.into_report(Vec::new()));
        }

        let total = candidates.len();
        let inter_item = Duration::from_secs(self.config.pipeline.inter_item_delay_secs);
        let mut reports = Vec::with_capacity(total);

        for (index, candidate) in candidates.into_iter().enumerate() {
            info!(
                index = index + 1,
                total,
                title = %candidate.title,
                author = %candidate.author,
                "Processing candidate"
            );

            let outcome = self
                .process_candidate(&candidate, &layout, &mut ctx, &mut dedup)
                .await;

            metrics::CANDIDATE_OUTCOMES
                .with_label_values(&[
                    if outcome.is_published() {
                        "published"
                    } else {
                        "skipped"
                    },
                    outcome.stage().as_str(),
                ])
                .inc();

            reports.push(CandidateReport {
                url: candidate.url,
                title: candidate.title,
                outcome,
            });

            self.pacer.pause(PauseReason::InterItem, inter_item).await;
        }

        metrics::QUOTA_USED.set(ctx.quota_used() as i64);
        let report = ctx.into_report(reports);
        info!(
            run_id = %report.run_id,
            published = report.published_count(),
            skipped = report.skipped_count(),
            quota_used = report.quota_used,
            "Run finished"
        );
        Ok(report)
    }

    async fn process_candidate(
        &self,
        candidate: &Candidate,
        layout: &FolderLayout,
        ctx: &mut RunContext,
        dedup: &mut DedupRecord,
    ) -> CandidateOutcome {
        // Download
        let media = match self.downloader.download(candidate, &layout.download).await {
            Ok(media) => media,
            Err(DownloadError::TooLong {
                duration_secs,
                max_secs,
            }) => {
                info!(
                    url = %candidate.url,
                    duration_secs,
                    max_secs,
                    "Clip too long for a Short, skipping"
                );
                return skipped(
                    CandidateStage::Fetched,
                    SkipReason::TooLong { duration_secs },
                );
            }
            Err(e) => {
                warn!(url = %candidate.url, "Failed to download clip: {}", e);
                return skipped(
                    CandidateStage::Fetched,
                    SkipReason::DownloadFailed(e.to_string()),
                );
            }
        };

        if !tokio::fs::try_exists(&media.path).await.unwrap_or(false) {
            warn!(path = %media.path.display(), "Downloaded file is missing");
            return skipped(CandidateStage::Downloaded, SkipReason::MissingDownload);
        }

        // Duration gate
        let info = match self.renderer.probe(&media.path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(path = %media.path.display(), "Failed to probe clip: {}", e);
                return skipped(
                    CandidateStage::Downloaded,
                    SkipReason::ProbeFailed(e.to_string()),
                );
            }
        };

        let Some(duration_secs) = info.duration_secs else {
            warn!(path = %media.path.display(), "Clip duration unknown, skipping");
            return skipped(CandidateStage::Downloaded, SkipReason::UnknownDuration);
        };

        let max_duration = self.config.video.max_duration_secs;
        if duration_secs >= max_duration {
            info!(
                duration_secs,
                max_duration, "Clip too long for a Short, skipping"
            );
            return skipped(
                CandidateStage::Downloaded,
                SkipReason::TooLong { duration_secs },
            );
        }

        // Render
        let pipeline = &self.config.pipeline;
        let render_input = layout.render.join(&pipeline.render_input_name);
        if let Err(e) = stage_file(&media.path, &render_input).await {
            warn!("Failed to stage clip for rendering: {}", e);
            return skipped(
                CandidateStage::DurationChecked,
                SkipReason::StagingFailed(e.to_string()),
            );
        }

        let job = RenderJob {
            source: render_input,
            destination: layout.render.join(&pipeline.render_output_name),
            target: self.config.video.dimensions,
        };
        let rendered = match self.renderer.render(job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log_render_error(&e);
                return skipped(
                    CandidateStage::DurationChecked,
                    SkipReason::RenderFailed(e.to_string()),
                );
            }
        };

        let final_path = layout.final_output.join(&pipeline.final_output_name);
        if let Err(e) = stage_file(&rendered.output_path, &final_path).await {
            warn!("Failed to stage rendered clip: {}", e);
            return skipped(
                CandidateStage::Rendered,
                SkipReason::StagingFailed(e.to_string()),
            );
        }

        // Publish
        if !ctx.can_publish() {
            info!(
                quota_used = ctx.quota_used(),
                cap = ctx.quota_cap(),
                "Upload cap reached, cooling down"
            );
            self.pacer
                .pause(
                    PauseReason::QuotaCooldown,
                    Duration::from_secs(pipeline.quota_cooldown_secs),
                )
                .await;
            return skipped(CandidateStage::Staged, SkipReason::QuotaReached);
        }

        self.publish(candidate, &final_path, ctx, dedup).await
    }

    async fn publish(
        &self,
        candidate: &Candidate,
        path: &Path,
        ctx: &mut RunContext,
        dedup: &mut DedupRecord,
    ) -> CandidateOutcome {
        let metadata = UploadMetadata::for_candidate(candidate, &self.config.youtube);

        match self.publisher.publish(path, &metadata).await {
            Ok(receipt) => {
                metrics::PUBLISHES_TOTAL
                    .with_label_values(&["success"])
                    .inc();
                ctx.record_publish();
                info!(
                    video_id = %receipt.video_id,
                    quota_used = ctx.quota_used(),
                    "Published clip"
                );

                let recorded = match dedup.append(&candidate.url).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(url = %candidate.url, "Failed to record published URL: {}", e);
                        false
                    }
                };

                CandidateOutcome::Published {
                    video_id: receipt.video_id,
                    recorded,
                }
            }
            Err(e) => {
                metrics::PUBLISHES_TOTAL
                    .with_label_values(&[e.label()])
                    .inc();

                if e.is_service_level() {
                    warn!(kind = e.label(), "Publishing unavailable: {}", e);
                    self.pacer
                        .pause(
                            PauseReason::ApiCooldown,
                            Duration::from_secs(self.config.pipeline.api_cooldown_secs),
                        )
                        .await;
                } else {
                    warn!(kind = e.label(), "Upload refused, skipping clip: {}", e);
                }

                skipped(
                    CandidateStage::Staged,
                    SkipReason::PublishFailed {
                        kind: e.label().to_string(),
                        message: e.to_string(),
                    },
                )
            }
        }
    }
}

fn skipped(stage: CandidateStage, reason: SkipReason) -> CandidateOutcome {
    CandidateOutcome::Skipped { stage, reason }
}

fn log_render_error(e: &RenderError) {
    if e.is_permission_denied() {
        error!("Rendering failed, output not writable: {}", e);
    } else {
        warn!("Rendering failed: {}", e);
    }
}
