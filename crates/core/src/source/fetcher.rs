//! Candidate discovery: pagination, filtering and deduplication.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RedditConfig;
use crate::dedup::DedupRecord;
use crate::metrics;

use super::{Candidate, ContentSource, ListingRequest, SourcePost, UNKNOWN_AUTHOR};

/// Largest page the listing endpoint serves.
const MAX_PAGE_SIZE: u32 = 100;

/// Rules that decide whether a post may become a candidate.
#[derive(Debug, Clone)]
pub struct FilterRules {
    /// Only URLs starting with this prefix are accepted.
    pub allowed_url_prefix: String,
}

/// Drops pinned, not-safe, already published and wrong-host posts.
///
/// Source ranking order is preserved. A URL that appears twice in the
/// listing is only kept the first time.
pub fn filter_posts<F>(posts: Vec<SourcePost>, rules: &FilterRules, is_published: F) -> Vec<Candidate>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();

    posts
        .into_iter()
        .filter_map(|post| {
            let url = post.url?;
            if post.stickied
                || post.over_18
                || !url.starts_with(&rules.allowed_url_prefix)
                || is_published(&url)
                || !seen.insert(url.clone())
            {
                return None;
            }
            Some(Candidate {
                url,
                title: post.title,
                author: post
                    .author
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            })
        })
        .collect()
}

/// Fetches ranked posts from a content source and turns them into candidates.
pub struct SourceFetcher {
    source: Arc<dyn ContentSource>,
    source_id: String,
    time_window: String,
    limit: u32,
    rules: FilterRules,
}

impl SourceFetcher {
    pub fn new(
        source: Arc<dyn ContentSource>,
        source_id: impl Into<String>,
        time_window: impl Into<String>,
        limit: u32,
        rules: FilterRules,
    ) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            time_window: time_window.into(),
            limit,
            rules,
        }
    }

    /// Creates a fetcher using the listing settings of the Reddit config.
    pub fn from_config(source: Arc<dyn ContentSource>, config: &RedditConfig) -> Self {
        Self::new(
            source,
            config.subreddit.clone(),
            config.time_filter.clone(),
            config.listing_limit,
            FilterRules {
                allowed_url_prefix: config.allowed_url_prefix.clone(),
            },
        )
    }

    /// Fetches and filters candidates.
    ///
    /// Never fails: authentication or listing errors are logged and yield
    /// an empty (or partial, for a mid-listing failure) sequence.
    pub async fn fetch_candidates(&self, dedup: &DedupRecord) -> Vec<Candidate> {
        if let Err(e) = self.source.authenticate().await {
            error!(source = self.source.name(), "Logging in failed: {}", e);
            return Vec::new();
        }

        let posts = self.collect_posts().await;
        let fetched = posts.len();
        let candidates = filter_posts(posts, &self.rules, |url| dedup.contains(url));

        metrics::POSTS_FETCHED.inc_by(fetched as u64);
        metrics::CANDIDATES_ACCEPTED.inc_by(candidates.len() as u64);
        info!(
            source = %self.source_id,
            fetched,
            candidates = candidates.len(),
            "Fetched candidates"
        );

        candidates
    }

    /// Walks the listing cursor until `limit` posts or the end of results.
    async fn collect_posts(&self) -> Vec<SourcePost> {
        let mut posts = Vec::new();
        let mut after = None;

        while (posts.len() as u32) < self.limit {
            let remaining = self.limit - posts.len() as u32;
            let request = ListingRequest {
                source_id: self.source_id.clone(),
                time_window: self.time_window.clone(),
                limit: remaining.min(MAX_PAGE_SIZE),
                after: after.take(),
            };

            let page = match self.source.fetch_page(&request).await {
                Ok(page) => page,
                Err(e) => {
                    error!(source = self.source.name(), "Failed to get posts: {}", e);
                    break;
                }
            };

            debug!(posts = page.posts.len(), next = ?page.after, "Listing page received");
            if page.posts.is_empty() {
                break;
            }

            posts.extend(page.posts);
            match page.after {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        posts.truncate(self.limit as usize);
        posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(url: &str) -> SourcePost {
        SourcePost {
            url: Some(url.to_string()),
            title: format!("Title of {}", url),
            author: Some("author".to_string()),
            stickied: false,
            over_18: false,
        }
    }

    fn rules() -> FilterRules {
        FilterRules {
            allowed_url_prefix: "https://v.redd.it".to_string(),
        }
    }

    #[test]
    fn test_filter_keeps_eligible_posts_in_order() {
        let posts = vec![post("https://v.redd.it/b"), post("https://v.redd.it/a")];
        let candidates = filter_posts(posts, &rules(), |_| false);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url, "https://v.redd.it/b");
        assert_eq!(candidates[1].url, "https://v.redd.it/a");
    }

    #[test]
    fn test_filter_drops_stickied_and_over_18() {
        let mut pinned = post("https://v.redd.it/pinned");
        pinned.stickied = true;
        let mut nsfw = post("https://v.redd.it/nsfw");
        nsfw.over_18 = true;

        let candidates = filter_posts(
            vec![pinned, nsfw, post("https://v.redd.it/ok")],
            &rules(),
            |_| false,
        );

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://v.redd.it/ok");
    }

    #[test]
    fn test_filter_drops_wrong_host_and_missing_url() {
        let mut no_url = post("");
        no_url.url = None;

        let candidates = filter_posts(
            vec![
                post("https://i.redd.it/image.jpg"),
                post("https://youtube.com/watch?v=x"),
                no_url,
            ],
            &rules(),
            |_| false,
        );

        assert!(candidates.is_empty());
    }

    #[test]
    fn test_filter_drops_published_urls() {
        let candidates = filter_posts(
            vec![post("https://v.redd.it/old"), post("https://v.redd.it/new")],
            &rules(),
            |url| url == "https://v.redd.it/old",
        );

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://v.redd.it/new");
    }

    #[test]
    fn test_filter_drops_repeated_urls() {
        let candidates = filter_posts(
            vec![post("https://v.redd.it/a"), post("https://v.redd.it/a")],
            &rules(),
            |_| false,
        );
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_filter_tags_missing_author_unknown() {
        let mut anonymous = post("https://v.redd.it/anon");
        anonymous.author = None;

        let candidates = filter_posts(vec![anonymous], &rules(), |_| false);
        assert_eq!(candidates[0].author, "Unknown");
    }
}
