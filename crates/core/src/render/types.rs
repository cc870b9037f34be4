//! Types for the render module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Resolution;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Container duration, `None` when ffprobe does not report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Container format (first name reported by ffprobe).
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_fps: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
}

impl MediaInfo {
    /// Frame size of the first video stream, if known.
    pub fn resolution(&self) -> Option<Resolution> {
        match (self.video_width, self.video_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(Resolution::new(w, h)),
            _ => None,
        }
    }
}

/// A single render request.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Target frame size, `None` for pass-through mode.
    pub target: Option<Resolution>,
}

/// Why a clip was copied instead of re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum PassThroughReason {
    /// No target resolution configured.
    NoTarget,
    /// Source ratio is within tolerance of the target ratio.
    RatioCompatible { exact: f64, theoretical: f64 },
}

/// How a clip will be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RenderPlan {
    /// Byte copy, no re-encode.
    PassThrough(PassThroughReason),
    /// Foreground over darkened background at exactly `target`.
    Composite { target: Resolution },
}

impl RenderPlan {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, RenderPlan::PassThrough(_))
    }
}

/// Decides between pass-through and compositing.
///
/// The ratios are compatible when the source ratio lies strictly inside
/// `theoretical * (1 - tolerance) .. theoretical * (1 + tolerance)`.
pub fn plan_render(source: Resolution, target: Option<Resolution>, tolerance: f64) -> RenderPlan {
    let Some(target) = target else {
        return RenderPlan::PassThrough(PassThroughReason::NoTarget);
    };

    let exact = source.aspect_ratio();
    let theoretical = target.aspect_ratio();

    if theoretical * (1.0 - tolerance) < exact && exact < theoretical * (1.0 + tolerance) {
        RenderPlan::PassThrough(PassThroughReason::RatioCompatible { exact, theoretical })
    } else {
        RenderPlan::Composite { target }
    }
}

/// Result of a successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    pub plan: RenderPlan,
    pub output_size_bytes: u64,
    /// Time spent rendering in milliseconds.
    pub duration_ms: u64,
}
