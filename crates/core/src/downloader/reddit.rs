//! Downloader for clips hosted on Reddit's video CDN.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::VideoConfig;
use crate::source::Candidate;

use super::{DashManifest, DownloadError, DownloadedMedia, Downloader};

/// Downloads DASH clips and muxes their audio and video tracks.
pub struct RedditVideoDownloader {
    client: Client,
    ffmpeg_path: PathBuf,
    max_duration_secs: f64,
}

impl RedditVideoDownloader {
    /// Create a new downloader.
    pub fn new(config: &VideoConfig, user_agent: &str) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        Ok(Self {
            client,
            ffmpeg_path: config.ffmpeg_path.clone(),
            max_duration_secs: config.max_duration_secs,
        })
    }

    /// Fetches the clip's playlist.
    async fn fetch_manifest(&self, clip_url: &str) -> Result<DashManifest, DownloadError> {
        let url = format!("{}/DASHPlaylist.mpd", clip_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::Http {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?;
        DashManifest::parse(&body)
    }

    /// Streams `url` into `path`.
    async fn fetch_track(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, bytes = written, "Track downloaded");
        Ok(written)
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(build_mux_args(video, audio, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DownloadError::FfmpegNotFound {
                        path: self.ffmpeg_path.clone(),
                    }
                } else {
                    DownloadError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(DownloadError::MuxFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Runs the download, recording every file it creates in `created`.
    async fn download_into(
        &self,
        clip_url: &str,
        post_id: &str,
        target_dir: &Path,
        created: &mut Vec<PathBuf>,
    ) -> Result<DownloadedMedia, DownloadError> {
        let manifest = self.fetch_manifest(clip_url).await?;

        if let Some(duration_secs) = manifest.duration_secs {
            check_duration(duration_secs, self.max_duration_secs)?;
        }

        let video_track = manifest.video.as_deref().ok_or(DownloadError::NoMedia)?;
        let output = target_dir.join(format!("{}.mp4", post_id));

        let video_path = target_dir.join(format!("{}_video.mp4", post_id));
        created.push(video_path.clone());
        self.fetch_track(&track_url(clip_url, video_track), &video_path)
            .await?;

        let audio_path = match manifest.audio.as_deref() {
            Some(track) => {
                let path = target_dir.join(format!("{}_audio.mp4", post_id));
                created.push(path.clone());
                match self.fetch_track(&track_url(clip_url, track), &path).await {
                    Ok(_) => Some(path),
                    Err(DownloadError::Http { status, .. }) => {
                        warn!(status, "Audio track unavailable, keeping video only");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        created.push(output.clone());
        match audio_path {
            Some(audio_path) => {
                self.mux(&video_path, &audio_path, &output).await?;
                tokio::fs::remove_file(&video_path).await?;
                tokio::fs::remove_file(&audio_path).await?;
            }
            None => tokio::fs::rename(&video_path, &output).await?,
        }

        Ok(DownloadedMedia {
            path: output,
            duration_secs: manifest.duration_secs,
        })
    }
}

#[async_trait]
impl Downloader for RedditVideoDownloader {
    fn name(&self) -> &str {
        "reddit-video"
    }

    async fn download(
        &self,
        candidate: &Candidate,
        target_dir: &Path,
    ) -> Result<DownloadedMedia, DownloadError> {
        let clip_url = candidate.url.trim_end_matches('/');
        let post_id = post_id(clip_url)?;

        let mut created = Vec::new();
        match self
            .download_into(clip_url, post_id, target_dir, &mut created)
            .await
        {
            Ok(media) => {
                info!(path = %media.path.display(), "Downloaded clip");
                Ok(media)
            }
            Err(e) => {
                for path in created {
                    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                        let _ = tokio::fs::remove_file(&path).await;
                    }
                }
                Err(e)
            }
        }
    }
}

/// Rejects clips longer than `max_secs`.
fn check_duration(duration_secs: f64, max_secs: f64) -> Result<(), DownloadError> {
    if duration_secs > max_secs {
        return Err(DownloadError::TooLong {
            duration_secs,
            max_secs,
        });
    }
    Ok(())
}

/// Last path segment of a clip URL.
fn post_id(clip_url: &str) -> Result<&str, DownloadError> {
    let (scheme, rest) = clip_url
        .split_once("://")
        .ok_or_else(|| DownloadError::InvalidUrl(clip_url.to_string()))?;
    if scheme != "https" && scheme != "http" {
        return Err(DownloadError::InvalidUrl(clip_url.to_string()));
    }

    match rest.rsplit_once('/') {
        Some((_, id)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) => Ok(id),
        _ => Err(DownloadError::InvalidUrl(clip_url.to_string())),
    }
}

fn track_url(clip_url: &str, track: &str) -> String {
    if track.starts_with("http://") || track.starts_with("https://") {
        track.to_string()
    } else {
        format!("{}/{}", clip_url, track)
    }
}

fn build_mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-i".to_string(),
        audio.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        output.to_string_lossy().to_string(),
    ]
}
