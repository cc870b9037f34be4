mod metrics;
mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use shortsmith_core::{
    load_config, validate_config, CandidateOutcome, FfmpegRenderer, PipelineRunner,
    RedditSource, RedditVideoDownloader, Renderer, RunReport, SanitizedConfig, TokioPacer,
    YouTubePublisher,
};

use prompt::{ask_start_mode, StartMode, StdinAuthorizationPrompt};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let log_filter = init_logging();

    if let Err(e) = run(log_filter).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

fn log_filter(debug: bool) -> EnvFilter {
    let default_filter = if debug {
        "debug,hyper=info,hyper_util=info,reqwest=info"
    } else {
        "info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}

fn logging_subscriber(
    filter: EnvFilter,
) -> (impl tracing::Subscriber + Send + Sync + 'static, LogFilterHandle) {
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    (subscriber, handle)
}

/// Installs the subscriber at the normal level; the debug level is applied
/// through the returned handle once the start mode and config are known.
fn init_logging() -> LogFilterHandle {
    let (subscriber, handle) = logging_subscriber(log_filter(false));
    subscriber.init();
    handle
}

async fn run(log_filter_handle: LogFilterHandle) -> Result<()> {
    let mode = ask_start_mode().await?;

    // Determine config path
    let config_path = std::env::var("SHORTSMITH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let loaded = load_config(&config_path);
    let debug_mode =
        mode == StartMode::Debug || loaded.as_ref().map(|c| c.debug).unwrap_or(false);
    if debug_mode {
        if let Err(e) = log_filter_handle.reload(log_filter(true)) {
            warn!("Failed to switch to debug logging: {}", e);
        }
    }

    info!(version = VERSION, debug = debug_mode, "Starting shortsmith");
    info!("Loading configuration from {:?}", config_path);
    let mut config =
        loaded.with_context(|| format!("Failed to load config from {:?}", config_path))?;
    config.debug = debug_mode;

    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        config = %serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default(),
        "Configuration loaded"
    );

    let source = Arc::new(
        RedditSource::new(config.reddit.clone()).context("Failed to create Reddit client")?,
    );
    let downloader = Arc::new(
        RedditVideoDownloader::new(&config.video, &config.reddit.user_agent)
            .context("Failed to create downloader")?,
    );

    let renderer = Arc::new(FfmpegRenderer::new(config.video.clone()));
    renderer
        .validate()
        .await
        .context("FFmpeg and FFprobe must be installed")?;
    match config.video.dimensions {
        Some(target) => info!(%target, blur = config.video.blur, "Rendering to target size"),
        None => info!("No target size configured, clips are uploaded as downloaded"),
    }

    let publisher = Arc::new(
        YouTubePublisher::new(config.youtube.clone(), Arc::new(StdinAuthorizationPrompt))
            .context("Failed to create YouTube client")?,
    );

    let runner = PipelineRunner::new(
        config,
        source,
        downloader,
        renderer,
        publisher,
        Arc::new(TokioPacer),
    );

    let report = runner.run().await.context("Run aborted")?;
    log_report(&report);
    debug!(metrics = %metrics::encode_metrics(), "Final metrics");

    Ok(())
}

fn log_report(report: &RunReport) {
    for candidate in &report.candidates {
        match &candidate.outcome {
            CandidateOutcome::Published { video_id, recorded } => {
                info!(title = %candidate.title, %video_id, recorded, "Published");
                if !recorded {
                    warn!(url = %candidate.url, "URL missing from the dedup record, it may be published again");
                }
            }
            CandidateOutcome::Skipped { stage, reason } => {
                info!(
                    title = %candidate.title,
                    stage = stage.as_str(),
                    reason = ?reason,
                    "Skipped"
                );
            }
        }
    }

    info!(
        candidates = report.candidates.len(),
        published = report.published_count(),
        quota_used = report.quota_used,
        quota_cap = report.quota_cap,
        "All candidates processed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_debug_level_can_be_enabled_after_install() {
        let (subscriber, handle) = logging_subscriber(EnvFilter::new("info"));

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(Level::INFO));
            assert!(!tracing::enabled!(Level::DEBUG));

            handle.reload(EnvFilter::new("debug")).unwrap();

            assert!(tracing::enabled!(Level::DEBUG));
        });
    }
}
