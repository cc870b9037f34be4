//! Trait definitions for the render module.

use async_trait::async_trait;
use std::path::Path;

use super::error::RenderError;
use super::types::{MediaInfo, RenderJob, RenderOutcome};

/// A renderer that fits clips to a target frame.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, RenderError>;

    /// Renders `job.source` into `job.destination`.
    async fn render(&self, job: RenderJob) -> Result<RenderOutcome, RenderError>;

    /// Validates that the renderer is properly configured and ready.
    async fn validate(&self) -> Result<(), RenderError>;
}
