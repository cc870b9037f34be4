//! Types for the content source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Author name used when a post has no (or a deleted) author.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Errors that can occur while talking to a content source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// One discovered content item, ready for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Source URL (unique key).
    pub url: String,
    pub title: String,
    /// Author name, `"Unknown"` when the post has none.
    pub author: String,
}

/// A post as returned by a listing, before filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcePost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Pinned by the moderators.
    #[serde(default)]
    pub stickied: bool,
    /// Flagged not safe for work.
    #[serde(default)]
    pub over_18: bool,
}

/// Request for one page of a ranked listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    /// Source identifier (e.g. "funny" or "funny+cars").
    pub source_id: String,
    /// Time window of the ranking (e.g. "week").
    pub time_window: String,
    /// Maximum posts in this page.
    pub limit: u32,
    /// Cursor returned by the previous page.
    pub after: Option<String>,
}

/// One page of a ranked listing.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub posts: Vec<SourcePost>,
    /// Cursor for the next page, `None` when the listing is exhausted.
    pub after: Option<String>,
}

/// Trait for content source implementations.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Returns the name of this source.
    fn name(&self) -> &str;

    /// Authenticate against the service. Must be called before `fetch_page`.
    async fn authenticate(&self) -> Result<(), SourceError>;

    /// Fetch one page of top-ranked posts.
    async fn fetch_page(&self, request: &ListingRequest) -> Result<ListingPage, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_post_defaults() {
        let post: SourcePost = serde_json::from_str(r#"{"title": "Hello"}"#).unwrap();
        assert_eq!(post.title, "Hello");
        assert!(post.url.is_none());
        assert!(post.author.is_none());
        assert!(!post.stickied);
        assert!(!post.over_18);
    }

    #[test]
    fn test_error_display() {
        let err = SourceError::AuthenticationFailed("invalid_grant".to_string());
        assert_eq!(err.to_string(), "Authentication failed: invalid_grant");
    }
}
