pub mod config;
pub mod dedup;
pub mod downloader;
pub mod folders;
pub mod metrics;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod source;
pub mod staging;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, Resolution,
    SanitizedConfig,
};
pub use dedup::{DedupError, DedupRecord};
pub use downloader::{DownloadError, DownloadedMedia, Downloader, RedditVideoDownloader};
pub use folders::{FolderError, FolderLayout, FolderManager};
pub use pipeline::{
    CandidateOutcome, CandidateReport, CandidateStage, Pacer, PauseReason, PipelineError,
    PipelineRunner, RunContext, RunReport, SkipReason, TokioPacer,
};
pub use publish::{
    AuthorizationPrompt, PublishError, PublishReceipt, Publisher, UploadMetadata,
    YouTubePublisher,
};
pub use render::{FfmpegRenderer, MediaInfo, RenderError, RenderJob, RenderPlan, Renderer};
pub use source::{Candidate, ContentSource, RedditSource, SourceError, SourceFetcher};
pub use staging::{stage_file, StagedFile, StagingError};
