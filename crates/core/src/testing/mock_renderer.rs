//! Mock renderer for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Resolution;
use crate::render::{
    plan_render, MediaInfo, RenderError, RenderJob, RenderOutcome, RenderPlan, Renderer,
};

/// Mock implementation of the Renderer trait.
///
/// Probing reports the duration configured for the file name (or the
/// default) and a fixed frame size. Rendering copies the input for a
/// pass-through plan and writes a placeholder for a composite plan.
#[derive(Debug)]
pub struct MockRenderer {
    jobs: Arc<RwLock<Vec<(RenderJob, RenderPlan)>>>,
    durations: Arc<RwLock<HashMap<String, Option<f64>>>>,
    default_duration: Arc<RwLock<f64>>,
    source_resolution: Arc<RwLock<Resolution>>,
    next_error: Arc<RwLock<Option<RenderError>>>,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            durations: Arc::new(RwLock::new(HashMap::new())),
            default_duration: Arc::new(RwLock::new(30.0)),
            source_resolution: Arc::new(RwLock::new(Resolution::new(720, 1280))),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets the probed duration for files named `file_name`.
    pub async fn set_duration(&self, file_name: &str, secs: f64) {
        self.durations
            .write()
            .await
            .insert(file_name.to_string(), Some(secs));
    }

    /// Makes files named `file_name` probe without a duration.
    pub async fn set_unknown_duration(&self, file_name: &str) {
        self.durations
            .write()
            .await
            .insert(file_name.to_string(), None);
    }

    pub async fn set_default_duration(&self, secs: f64) {
        *self.default_duration.write().await = secs;
    }

    /// Frame size reported for every probed file.
    pub async fn set_source_resolution(&self, resolution: Resolution) {
        *self.source_resolution.write().await = resolution;
    }

    /// Makes the next render fail.
    pub async fn fail_next_render(&self, error: RenderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Render jobs received, with the plan chosen for each.
    pub async fn recorded_jobs(&self) -> Vec<(RenderJob, RenderPlan)> {
        self.jobs.read().await.clone()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, RenderError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| RenderError::InputNotFound {
                path: path.to_path_buf(),
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let duration_secs = match self.durations.read().await.get(&file_name) {
            Some(secs) => *secs,
            None => Some(*self.default_duration.read().await),
        };
        let resolution = *self.source_resolution.read().await;

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            duration_secs,
            format: "mov".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(resolution.width),
            video_height: Some(resolution.height),
            video_fps: Some(30.0),
            audio_codec: Some("aac".to_string()),
        })
    }

    async fn render(&self, job: RenderJob) -> Result<RenderOutcome, RenderError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let source = *self.source_resolution.read().await;
        let plan = plan_render(source, job.target, 0.05);

        let output_size_bytes = match plan {
            RenderPlan::PassThrough(_) => tokio::fs::copy(&job.source, &job.destination).await?,
            RenderPlan::Composite { target } => {
                let body = format!("composite {}", target);
                tokio::fs::write(&job.destination, &body).await?;
                body.len() as u64
            }
        };

        self.jobs.write().await.push((job.clone(), plan));

        Ok(RenderOutcome {
            output_path: job.destination,
            plan,
            output_size_bytes,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), RenderError> {
        Ok(())
    }
}
