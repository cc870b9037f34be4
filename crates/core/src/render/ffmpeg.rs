//! FFmpeg-based renderer implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use crate::config::{Resolution, VideoConfig};
use crate::metrics;

use super::error::RenderError;
use super::traits::Renderer;
use super::types::{plan_render, MediaInfo, PassThroughReason, RenderJob, RenderOutcome, RenderPlan};

/// FFmpeg-based renderer implementation.
pub struct FfmpegRenderer {
    config: VideoConfig,
}

impl FfmpegRenderer {
    /// Creates a new FFmpeg renderer with the given configuration.
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Creates a renderer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(VideoConfig::default())
    }

    /// Builds the filter graph that composites the clip over its own
    /// darkened background.
    fn build_filter_graph(&self, target: Resolution) -> String {
        let brightness = self.config.background_brightness;
        let mut background = format!(
            "[0:v]scale={w}:{h},setsar=1,colorchannelmixer=rr={b}:gg={b}:bb={b}",
            w = target.width,
            h = target.height,
            b = brightness
        );
        if self.config.blur {
            background.push_str(&format!(",gblur=sigma={}", self.config.blur_sigma));
        }
        background.push_str("[bg]");

        let foreground = format!("[0:v]scale={}:-2,setsar=1[fg]", target.width);

        format!(
            "{};{};[bg][fg]overlay=(W-w)/2:(H-h)/2,format=yuv420p[v]",
            background, foreground
        )
    }

    /// Builds ffmpeg arguments for a composite render.
    fn build_composite_args(&self, input: &Path, output: &Path, target: Resolution) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            self.build_filter_graph(target),
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-crf".to_string(),
            "20".to_string(),
            // AAC is the audio codec MP4 players and YouTube expect
            "-c:a".to_string(),
            "aac".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ];

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.push(output.to_string_lossy().to_string());
        args
    }

    fn binary(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Ffmpeg => self.config.ffmpeg_path.as_path(),
            Tool::Ffprobe => self.config.ffprobe_path.as_path(),
        }
    }

    /// Maps a spawn failure, naming the binary when it is missing.
    fn spawn_error(&self, tool: Tool, e: std::io::Error) -> RenderError {
        if e.kind() != std::io::ErrorKind::NotFound {
            return RenderError::Io(e);
        }
        let path = self.binary(tool).to_path_buf();
        match tool {
            Tool::Ffmpeg => RenderError::FfmpegNotFound { path },
            Tool::Ffprobe => RenderError::FfprobeNotFound { path },
        }
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, RenderError> {
        let report: FfprobeReport =
            serde_json::from_str(output).map_err(|e| RenderError::ParseError {
                reason: format!("Invalid ffprobe JSON: {}", e),
            })?;
        Ok(report.into_media_info(path))
    }

    /// Copies the source unchanged.
    async fn copy_through(job: &RenderJob) -> Result<u64, RenderError> {
        tokio::fs::copy(&job.source, &job.destination)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RenderError::InputNotFound {
                    path: job.source.clone(),
                },
                _ => RenderError::from_io(&job.destination, e),
            })
    }

    /// Runs ffmpeg for a composite render, logging progress.
    async fn run_composite(
        &self,
        job: &RenderJob,
        target: Resolution,
        duration_secs: f64,
    ) -> Result<u64, RenderError> {
        let args = self.build_composite_args(&job.source, &job.destination, target);
        debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(Tool::Ffmpeg, e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::render_failed("ffmpeg stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_progress_log = Instant::now();
            let progress_interval = Duration::from_secs(2);
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") || line.contains("denied") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                let current_time = time_regex
                    .as_ref()
                    .and_then(|re| re.captures(&line))
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                    .map(|us| us / 1_000_000.0);

                if let Some(current) = current_time {
                    if last_progress_log.elapsed() >= progress_interval && duration_secs > 0.0 {
                        let percent = (current / duration_secs * 100.0).min(100.0);
                        debug!(percent = format!("{:.0}", percent), "Rendering");
                        last_progress_log = Instant::now();
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    if error_output.contains("Permission denied") {
                        return Err(RenderError::PermissionDenied {
                            path: job.destination.clone(),
                            source: std::io::Error::new(
                                std::io::ErrorKind::PermissionDenied,
                                error_output,
                            ),
                        });
                    }
                    return Err(RenderError::render_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(RenderError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(RenderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let output_meta = tokio::fs::metadata(&job.destination)
            .await
            .map_err(|_| RenderError::render_failed("Output file not created", None))?;

        Ok(output_meta.len())
    }
}

#[derive(Debug, Clone, Copy)]
enum Tool {
    Ffmpeg,
    Ffprobe,
}

/// Subset of `ffprobe -show_format -show_streams` output.
#[derive(Deserialize)]
struct FfprobeReport {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    format_name: String,
    // ffprobe reports numbers as strings
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

impl FfprobeReport {
    fn first_stream(&self, kind: &str) -> Option<&FfprobeStream> {
        self.streams.iter().find(|s| s.codec_type == kind)
    }

    fn into_media_info(self, path: &Path) -> MediaInfo {
        let video = self.first_stream("video");
        let audio = self.first_stream("audio");

        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: parse_number(self.format.size.as_deref()).unwrap_or(0),
            duration_secs: parse_number(self.format.duration.as_deref()),
            format: self
                .format
                .format_name
                .split(',')
                .next()
                .unwrap_or("unknown")
                .to_string(),
            video_codec: video.and_then(|v| v.codec_name.clone()),
            video_width: video.and_then(|v| v.width),
            video_height: video.and_then(|v| v.height),
            video_fps: video
                .and_then(|v| v.r_frame_rate.as_deref())
                .and_then(parse_frame_rate),
            audio_codec: audio.and_then(|a| a.codec_name.clone()),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value?.trim().parse().ok()
}

/// Parses a frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse::<f32>().ok(),
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, RenderError> {
        if !path.exists() {
            return Err(RenderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| self.spawn_error(Tool::Ffprobe, e))?;

        if !output.status.success() {
            return Err(RenderError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn render(&self, job: RenderJob) -> Result<RenderOutcome, RenderError> {
        let start = Instant::now();

        let (plan, duration_secs) = match job.target {
            None => (RenderPlan::PassThrough(PassThroughReason::NoTarget), 0.0),
            Some(_) => {
                let info = self.probe(&job.source).await?;
                let source = info.resolution().ok_or_else(|| RenderError::NoVideoStream {
                    path: job.source.clone(),
                })?;
                (
                    plan_render(source, job.target, self.config.ratio_tolerance),
                    info.duration_secs.unwrap_or(0.0),
                )
            }
        };

        let output_size_bytes = match plan {
            RenderPlan::PassThrough(reason) => {
                debug!(?reason, "Clip already fits, copying without re-encode");
                Self::copy_through(&job).await?
            }
            RenderPlan::Composite { target } => {
                debug!(%target, blur = self.config.blur, "Compositing clip over background");
                self.run_composite(&job, target, duration_secs).await?
            }
        };

        let elapsed = start.elapsed();
        metrics::RENDER_DURATION
            .with_label_values(&[if plan.is_pass_through() { "pass_through" } else { "composite" }])
            .observe(elapsed.as_secs_f64());
        info!(output = %job.destination.display(), "Rendered clip");

        Ok(RenderOutcome {
            output_path: job.destination,
            plan,
            output_size_bytes,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), RenderError> {
        for tool in [Tool::Ffmpeg, Tool::Ffprobe] {
            let output = Command::new(self.binary(tool))
                .arg("-version")
                .output()
                .await
                .map_err(|e| self.spawn_error(tool, e))?;
            debug!(
                binary = %self.binary(tool).display(),
                ok = output.status.success(),
                "Checked render binary"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn renderer(blur: bool) -> FfmpegRenderer {
        FfmpegRenderer::new(VideoConfig {
            blur,
            ..Default::default()
        })
    }

    #[test]
    fn test_build_composite_args() {
        let args = renderer(false).build_composite_args(
            Path::new("/in.mp4"),
            Path::new("/out.mp4"),
            Resolution::new(1080, 1920),
        );

        assert!(args.contains(&"-filter_complex".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"aac".to_string()));
        assert!(args.contains(&"0:a?".to_string()));
        assert_eq!(args.last().unwrap(), "/out.mp4");

        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("[0:v]scale=1080:1920,"));
        assert!(graph.contains("colorchannelmixer=rr=0.1:gg=0.1:bb=0.1"));
        assert!(graph.contains("[0:v]scale=1080:-2"));
        assert!(graph.contains("overlay=(W-w)/2:(H-h)/2"));
        assert!(!graph.contains("gblur"));
    }

    #[test]
    fn test_filter_graph_with_blur() {
        let graph = renderer(true).build_filter_graph(Resolution::new(1080, 1920));
        assert!(graph.contains("gblur=sigma=25"));
        // Blur applies to the background only
        let bg_end = graph.find("[bg]").unwrap();
        assert!(graph.find("gblur").unwrap() < bg_end);
    }

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "format": {
                "filename": "clip.mp4",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "29.97",
                "size": "4500000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 720,
                    "height": 1280,
                    "r_frame_rate": "30000/1001"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac"
                }
            ]
        }"#;

        let info = FfmpegRenderer::parse_probe_output(Path::new("clip.mp4"), json).unwrap();
        assert_eq!(info.format, "mov");
        assert!((info.duration_secs.unwrap() - 29.97).abs() < 0.001);
        assert_eq!(info.size_bytes, 4_500_000);
        assert_eq!(info.resolution(), Some(Resolution::new(720, 1280)));
        assert!((info.video_fps.unwrap() - 29.97).abs() < 0.01);
        assert_eq!(info.audio_codec.as_deref(), Some("aac"));
    }

    #[test]
    fn test_parse_probe_output_invalid() {
        let result = FfmpegRenderer::parse_probe_output(Path::new("x.mp4"), "not json");
        assert!(matches!(result, Err(RenderError::ParseError { .. })));
    }

    #[test]
    fn test_parse_probe_output_without_duration() {
        let json = r#"{
            "format": {"format_name": "mov,mp4"},
            "streams": [{"codec_type": "video", "width": 720, "height": 1280}]
        }"#;

        let info = FfmpegRenderer::parse_probe_output(Path::new("clip.mp4"), json).unwrap();
        assert_eq!(info.duration_secs, None);
        assert_eq!(info.size_bytes, 0);
        assert_eq!(info.resolution(), Some(Resolution::new(720, 1280)));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("30/0"), None);
    }

    #[tokio::test]
    async fn test_render_without_target_copies_bytes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("render_input.mp4");
        let destination = temp.path().join("render_output.mp4");
        let bytes: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&source, &bytes).unwrap();

        let outcome = FfmpegRenderer::with_defaults()
            .render(RenderJob {
                source,
                destination: destination.clone(),
                target: None,
            })
            .await
            .unwrap();

        assert_eq!(
            outcome.plan,
            RenderPlan::PassThrough(PassThroughReason::NoTarget)
        );
        assert_eq!(outcome.output_size_bytes, bytes.len() as u64);
        assert_eq!(std::fs::read(&destination).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_render_missing_input() {
        let temp = TempDir::new().unwrap();
        let result = FfmpegRenderer::with_defaults()
            .render(RenderJob {
                source: temp.path().join("missing.mp4"),
                destination: temp.path().join("out.mp4"),
                target: None,
            })
            .await;
        assert!(matches!(result, Err(RenderError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = FfmpegRenderer::with_defaults()
            .probe(&PathBuf::from("/nonexistent/clip.mp4"))
            .await;
        assert!(matches!(result, Err(RenderError::InputNotFound { .. })));
    }
}
