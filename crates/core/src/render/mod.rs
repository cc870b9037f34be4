//! Render stage: fits downloaded clips to the target frame.
//!
//! A clip whose aspect ratio is already close to the target is copied
//! byte for byte. Any other clip is composited centered over a darkened
//! (optionally blurred) copy of itself scaled to fill the frame.
//!
//! # Example
//!
//! ```ignore
//! use shortsmith_core::render::{FfmpegRenderer, Renderer, RenderJob};
//!
//! let renderer = FfmpegRenderer::new(video_config);
//! renderer.validate().await?;
//!
//! let info = renderer.probe(Path::new("render_input.mp4")).await?;
//! println!("Duration: {:?} seconds", info.duration_secs);
//!
//! let outcome = renderer
//!     .render(RenderJob {
//!         source: PathBuf::from("render_input.mp4"),
//!         destination: PathBuf::from("render_output.mp4"),
//!         target: Some(Resolution::new(1080, 1920)),
//!     })
//!     .await?;
//! ```

mod error;
mod ffmpeg;
mod traits;
mod types;

pub use error::RenderError;
pub use ffmpeg::FfmpegRenderer;
pub use traits::Renderer;
pub use types::{plan_render, MediaInfo, PassThroughReason, RenderJob, RenderOutcome, RenderPlan};
