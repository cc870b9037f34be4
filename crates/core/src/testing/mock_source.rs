//! Mock content source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{ContentSource, ListingPage, ListingRequest, SourceError, SourcePost};

/// Mock implementation of the ContentSource trait.
///
/// Serves the configured pages in order; once they run out, every
/// further request gets an empty page.
#[derive(Debug, Default)]
pub struct MockSource {
    pages: Arc<RwLock<Vec<ListingPage>>>,
    requests: Arc<RwLock<Vec<ListingRequest>>>,
    fail_auth: Arc<RwLock<bool>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page; `after` is the cursor returned with it.
    pub async fn push_page(&self, posts: Vec<SourcePost>, after: Option<&str>) {
        self.pages.write().await.push(ListingPage {
            posts,
            after: after.map(str::to_string),
        });
    }

    /// Makes authentication fail.
    pub async fn set_fail_auth(&self, fail: bool) {
        *self.fail_auth.write().await = fail;
    }

    /// Get all listing requests received.
    pub async fn recorded_requests(&self) -> Vec<ListingRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ContentSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn authenticate(&self) -> Result<(), SourceError> {
        if *self.fail_auth.read().await {
            return Err(SourceError::AuthenticationFailed(
                "invalid_grant".to_string(),
            ));
        }
        Ok(())
    }

    async fn fetch_page(&self, request: &ListingRequest) -> Result<ListingPage, SourceError> {
        let index = {
            let mut requests = self.requests.write().await;
            requests.push(request.clone());
            requests.len() - 1
        };

        Ok(self
            .pages
            .read()
            .await
            .get(index)
            .cloned()
            .unwrap_or_default())
    }
}
