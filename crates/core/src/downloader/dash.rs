//! Minimal DASH manifest reader for hosted clips.

use regex_lite::Regex;

use super::DownloadError;

/// Tracks and duration extracted from a DASH playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct DashManifest {
    pub duration_secs: Option<f64>,
    /// Highest quality video track, relative to the clip URL.
    pub video: Option<String>,
    /// Highest quality audio track, relative to the clip URL.
    pub audio: Option<String>,
}

impl DashManifest {
    /// Parses a playlist document.
    pub fn parse(xml: &str) -> Result<Self, DownloadError> {
        if !xml.contains("<MPD") {
            return Err(DownloadError::ManifestParse(
                "document has no MPD element".to_string(),
            ));
        }

        let duration_re = Regex::new(r#"mediaPresentationDuration="([^"]+)""#)
            .map_err(|e| DownloadError::ManifestParse(e.to_string()))?;
        let base_url_re = Regex::new(r"<BaseURL>\s*([^<\s]+)\s*</BaseURL>")
            .map_err(|e| DownloadError::ManifestParse(e.to_string()))?;
        let quality_re =
            Regex::new(r"(\d+)").map_err(|e| DownloadError::ManifestParse(e.to_string()))?;

        let duration_secs = match duration_re.captures(xml).and_then(|c| c.get(1)) {
            Some(m) => Some(parse_iso8601_duration(m.as_str()).ok_or_else(|| {
                DownloadError::ManifestParse(format!("invalid duration: {}", m.as_str()))
            })?),
            None => None,
        };

        let quality = |track: &str| -> u32 {
            quality_re
                .captures_iter(track)
                .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
                .last()
                .unwrap_or(0)
        };

        let mut video: Option<(u32, String)> = None;
        let mut audio: Option<(u32, String)> = None;

        for caps in base_url_re.captures_iter(xml) {
            let Some(track) = caps.get(1).map(|m| m.as_str().to_string()) else {
                continue;
            };
            let slot = if track.to_ascii_lowercase().contains("audio") {
                &mut audio
            } else {
                &mut video
            };
            let q = quality(&track);
            if slot.as_ref().map_or(true, |(best, _)| q > *best) {
                *slot = Some((q, track));
            }
        }

        Ok(Self {
            duration_secs,
            video: video.map(|(_, t)| t),
            audio: audio.map(|(_, t)| t),
        })
    }
}

/// Parses an ISO-8601 duration such as `PT1M2.5S` into seconds.
pub fn parse_iso8601_duration(value: &str) -> Option<f64> {
    let re = Regex::new(
        r"^P(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .ok()?;
    let caps = re.captures(value.trim())?;

    if caps.iter().skip(1).all(|c| c.is_none()) {
        return None;
    }

    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    Some(part(1) * 86_400.0 + part(2) * 3_600.0 + part(3) * 60.0 + part(4))
}
