//! Content downloader.
//!
//! Fetches a candidate's media into a target directory and returns the
//! concrete path of the written file. Clips longer than the configured
//! maximum are rejected before any media bytes are transferred.

mod dash;
mod reddit;
mod types;

pub use dash::{parse_iso8601_duration, DashManifest};
pub use reddit::RedditVideoDownloader;
pub use types::{DownloadError, DownloadedMedia, Downloader};
