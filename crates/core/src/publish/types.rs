//! Types for the publish module.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Privacy, YouTubeConfig};
use crate::source::Candidate;

/// Longest title the service accepts, in characters.
const MAX_TITLE_CHARS: usize = 100;

/// Title used when a post title has nothing usable left.
const FALLBACK_TITLE: &str = "Reddit clip";

/// Error reasons the service uses for quota and rate limits.
const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "uploadLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
];

/// Why a publish attempt failed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Daily quota or rate limit reached.
    #[error("Quota exceeded: {reason}")]
    QuotaExceeded { reason: String },

    /// Credentials missing, expired or refused.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The service refused this particular upload (bad metadata, bad file).
    #[error("Upload rejected (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// Network failure or server-side error.
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PublishError::QuotaExceeded { .. } => "quota_exceeded",
            PublishError::Authentication(_) => "authentication",
            PublishError::Rejected { .. } => "rejected",
            PublishError::Transient(_) => "transient",
            PublishError::Io(_) => "io",
        }
    }

    /// Returns true if the service itself is unusable for now.
    ///
    /// A failure that only concerns one upload returns false.
    pub fn is_service_level(&self) -> bool {
        matches!(
            self,
            PublishError::QuotaExceeded { .. }
                | PublishError::Authentication(_)
                | PublishError::Transient(_)
        )
    }
}

/// Maps an unsuccessful HTTP response to a [`PublishError`].
pub fn classify_response(status: u16, body: &str) -> PublishError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        message: String,
        #[serde(default)]
        errors: Vec<ErrorItem>,
    }

    #[derive(Deserialize)]
    struct ErrorItem {
        #[serde(default)]
        reason: String,
    }

    let (message, reasons) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => (
            parsed.error.message,
            parsed
                .error
                .errors
                .into_iter()
                .map(|e| e.reason)
                .collect::<Vec<_>>(),
        ),
        Err(_) => (body.chars().take(200).collect(), Vec::new()),
    };

    if let Some(reason) = reasons.iter().find(|r| QUOTA_REASONS.contains(&r.as_str())) {
        return PublishError::QuotaExceeded {
            reason: reason.clone(),
        };
    }

    let reason = if message.is_empty() {
        reasons.join(", ")
    } else {
        message
    };

    match status {
        401 => PublishError::Authentication(reason),
        429 => PublishError::QuotaExceeded { reason },
        400..=499 => PublishError::Rejected { status, reason },
        _ => PublishError::Transient(format!("HTTP {}: {}", status, reason)),
    }
}

/// Metadata sent along with an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: u32,
    pub privacy: Privacy,
}

impl UploadMetadata {
    /// Builds metadata for a candidate with the configured defaults.
    pub fn for_candidate(candidate: &Candidate, config: &YouTubeConfig) -> Self {
        Self {
            title: sanitize_title(&candidate.title),
            description: config.description.clone(),
            tags: config.tags.clone(),
            category: config.category,
            privacy: config.privacy,
        }
    }
}

/// Applies the service's title rules: no angle brackets, at most 100 characters.
fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    cleaned.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string()
}

/// Identifier of a published video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub video_id: String,
}

/// Uploads a rendered clip.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the name of this publisher.
    fn name(&self) -> &str;

    async fn publish(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
    ) -> Result<PublishReceipt, PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str) -> Candidate {
        Candidate {
            url: "https://v.redd.it/abc".to_string(),
            title: title.to_string(),
            author: "someone".to_string(),
        }
    }

    #[test]
    fn test_classify_quota_reasons() {
        let body = r#"{"error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota.", "errors": [{"domain": "youtube.quota", "reason": "quotaExceeded"}]}}"#;
        assert!(matches!(
            classify_response(403, body),
            PublishError::QuotaExceeded { reason } if reason == "quotaExceeded"
        ));

        let body = r#"{"error": {"code": 400, "message": "limit", "errors": [{"reason": "uploadLimitExceeded"}]}}"#;
        assert!(matches!(
            classify_response(400, body),
            PublishError::QuotaExceeded { .. }
        ));
    }

    #[test]
    fn test_classify_status_codes() {
        let body = r#"{"error": {"code": 400, "message": "Invalid title", "errors": [{"reason": "invalidTitle"}]}}"#;
        assert!(matches!(
            classify_response(400, body),
            PublishError::Rejected { status: 400, reason } if reason == "Invalid title"
        ));
        assert!(matches!(
            classify_response(401, "{}"),
            PublishError::Authentication(_)
        ));
        assert!(matches!(
            classify_response(503, "Service Unavailable"),
            PublishError::Transient(_)
        ));
    }

    #[test]
    fn test_service_level_errors() {
        assert!(PublishError::QuotaExceeded {
            reason: String::new()
        }
        .is_service_level());
        assert!(PublishError::Transient(String::new()).is_service_level());
        assert!(!PublishError::Rejected {
            status: 400,
            reason: String::new()
        }
        .is_service_level());
    }

    #[test]
    fn test_metadata_for_candidate() {
        let config = YouTubeConfig {
            tags: vec!["funny".to_string()],
            ..Default::default()
        };
        let metadata = UploadMetadata::for_candidate(&candidate("Cat  vs <b>cucumber</b>"), &config);

        assert_eq!(metadata.title, "Cat vs bcucumber/b");
        assert_eq!(metadata.tags, vec!["funny"]);
        assert_eq!(metadata.category, 23);
        assert_eq!(metadata.privacy, Privacy::Public);
        assert!(metadata.description.starts_with("#shorts"));
    }

    #[test]
    fn test_metadata_title_limits() {
        let config = YouTubeConfig::default();

        let long = "a".repeat(150);
        let metadata = UploadMetadata::for_candidate(&candidate(&long), &config);
        assert_eq!(metadata.title.chars().count(), 100);

        let metadata = UploadMetadata::for_candidate(&candidate("<>  "), &config);
        assert_eq!(metadata.title, "Reddit clip");
    }
}
