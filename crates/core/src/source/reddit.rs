//! Reddit listing source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RedditConfig;

use super::{ContentSource, ListingPage, ListingRequest, SourceError, SourcePost};

/// Reddit source using the OAuth2 password grant (script apps).
pub struct RedditSource {
    client: Client,
    config: RedditConfig,
    /// Bearer token (cleared on auth failure).
    token: RwLock<Option<String>>,
}

impl RedditSource {
    /// Create a new Reddit source.
    pub fn new(config: RedditConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(None),
        })
    }

    fn token_url(&self) -> String {
        format!(
            "{}/api/v1/access_token",
            self.config.auth_url.trim_end_matches('/')
        )
    }

    /// Build the listing URL for a page request.
    fn build_listing_url(&self, request: &ListingRequest) -> String {
        let mut url = format!(
            "{}/r/{}/top?t={}&limit={}&raw_json=1",
            self.config.api_url.trim_end_matches('/'),
            request.source_id,
            urlencoding::encode(&request.time_window),
            request.limit
        );

        if let Some(after) = &request.after {
            url.push_str(&format!("&after={}", urlencoding::encode(after)));
        }

        url
    }

    /// Login and store the bearer token.
    async fn login(&self) -> Result<(), SourceError> {
        let params = [
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::AuthenticationFailed(
                "Invalid client credentials".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(SourceError::ApiError(format!("HTTP {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ApiError(format!("Failed to parse token response: {}", e)))?;

        match (body.access_token, body.error) {
            (Some(token), _) => {
                debug!("Reddit login successful");
                *self.token.write().await = Some(token);
                Ok(())
            }
            (None, Some(error)) => Err(SourceError::AuthenticationFailed(error)),
            (None, None) => Err(SourceError::AuthenticationFailed(
                "No access token in response".to_string(),
            )),
        }
    }

    async fn bearer(&self) -> Result<String, SourceError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(SourceError::NotAuthenticated)
    }

    async fn get_listing(&self, url: &str) -> Result<reqwest::Response, SourceError> {
        let token = self.bearer().await?;
        self.client
            .get(url)
            .header(header::AUTHORIZATION, format!("bearer {}", token))
            .send()
            .await
            .map_err(map_transport_error)
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn authenticate(&self) -> Result<(), SourceError> {
        self.login().await
    }

    async fn fetch_page(&self, request: &ListingRequest) -> Result<ListingPage, SourceError> {
        let url = self.build_listing_url(request);
        debug!(source = %request.source_id, after = ?request.after, "Fetching Reddit listing");

        let mut response = self.get_listing(&url).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Token expired, retry after login
            warn!("Reddit token rejected, re-authenticating");
            *self.token.write().await = None;
            self.login().await?;
            response = self.get_listing(&url).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let listing: RedditListing = response
            .json()
            .await
            .map_err(|e| SourceError::ApiError(format!("Failed to parse listing: {}", e)))?;

        Ok(listing.into_page())
    }
}

fn map_transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::ConnectionFailed(e.to_string())
    } else {
        SourceError::ApiError(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    url: Option<String>,
    #[serde(default)]
    title: String,
    author: Option<String>,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    over_18: bool,
}

impl RedditListing {
    fn into_page(self) -> ListingPage {
        ListingPage {
            after: self.data.after.filter(|a| !a.is_empty()),
            posts: self
                .data
                .children
                .into_iter()
                .map(|child| {
                    let post = child.data;
                    SourcePost {
                        url: post.url,
                        title: post.title,
                        // Deleted accounts are reported as "[deleted]"
                        author: post.author.filter(|a| a != "[deleted]"),
                        stickied: post.stickied,
                        over_18: post.over_18,
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RedditConfig {
        toml::from_str(
            r#"
subreddit = "funny"
client_id = "id"
client_secret = "secret"
username = "user"
password = "pass"
user_agent = "shortsmith-test"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_listing_url() {
        let source = RedditSource::new(test_config()).unwrap();
        let url = source.build_listing_url(&ListingRequest {
            source_id: "funny+cars".to_string(),
            time_window: "week".to_string(),
            limit: 99,
            after: None,
        });
        assert_eq!(
            url,
            "https://oauth.reddit.com/r/funny+cars/top?t=week&limit=99&raw_json=1"
        );
    }

    #[test]
    fn test_build_listing_url_with_cursor() {
        let source = RedditSource::new(test_config()).unwrap();
        let url = source.build_listing_url(&ListingRequest {
            source_id: "funny".to_string(),
            time_window: "week".to_string(),
            limit: 25,
            after: Some("t3_abc".to_string()),
        });
        assert!(url.ends_with("&after=t3_abc"));
    }

    #[test]
    fn test_parse_listing() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_next",
                "children": [
                    {"kind": "t3", "data": {
                        "url": "https://v.redd.it/abc123",
                        "title": "Cat falls off table",
                        "author": "someone",
                        "stickied": false,
                        "over_18": false
                    }},
                    {"kind": "t3", "data": {
                        "url": "https://i.redd.it/pic.jpg",
                        "title": "Deleted author",
                        "author": "[deleted]",
                        "stickied": true,
                        "over_18": false
                    }}
                ]
            }
        }"#;

        let listing: RedditListing = serde_json::from_str(json).unwrap();
        let page = listing.into_page();

        assert_eq!(page.after.as_deref(), Some("t3_next"));
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].author.as_deref(), Some("someone"));
        assert!(page.posts[1].author.is_none());
        assert!(page.posts[1].stickied);
    }

    #[test]
    fn test_parse_listing_end() {
        let json = r#"{"data": {"after": null, "children": []}}"#;
        let listing: RedditListing = serde_json::from_str(json).unwrap();
        let page = listing.into_page();
        assert!(page.after.is_none());
        assert!(page.posts.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_without_login_fails() {
        let source = RedditSource::new(test_config()).unwrap();
        let result = source
            .fetch_page(&ListingRequest {
                source_id: "funny".to_string(),
                time_window: "week".to_string(),
                limit: 10,
                after: None,
            })
            .await;
        assert!(matches!(result, Err(SourceError::NotAuthenticated)));
    }
}
