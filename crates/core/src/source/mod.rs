//! Content source abstraction.
//!
//! This module provides a `ContentSource` trait for reading ranked post
//! listings and a `SourceFetcher` that paginates, filters and deduplicates
//! them into pipeline candidates.

mod fetcher;
mod reddit;
mod types;

pub use fetcher::{filter_posts, FilterRules, SourceFetcher};
pub use reddit::RedditSource;
pub use types::*;
