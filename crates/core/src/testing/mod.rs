//! Testing utilities and mock implementations for pipeline tests.
//!
//! This module provides mock implementations of every external seam
//! (content source, downloader, renderer, publisher, pacer), so a full
//! run can be exercised without network access, ffmpeg or real sleeps.
//!
//! # Example
//!
//! ```rust,ignore
//! use shortsmith_core::testing::{fixtures, MockPublisher, MockSource};
//!
//! let source = MockSource::new();
//! source.push_page(vec![fixtures::post("https://v.redd.it/abc")], None).await;
//!
//! let publisher = MockPublisher::new();
//! publisher.push_error(PublishError::Transient("503".into())).await;
//! ```

mod mock_downloader;
mod mock_publisher;
mod mock_renderer;
mod mock_source;
mod recording_pacer;

pub use mock_downloader::{mock_file_name, MockDownloader};
pub use mock_publisher::{MockPublisher, RecordedPublish};
pub use mock_renderer::MockRenderer;
pub use mock_source::MockSource;
pub use recording_pacer::RecordingPacer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::{load_config_from_str, Config};
    use crate::source::{Candidate, SourcePost};

    /// Create an eligible post for `url`.
    pub fn post(url: &str) -> SourcePost {
        SourcePost {
            url: Some(url.to_string()),
            title: format!("Clip {}", url.rsplit('/').next().unwrap_or(url)),
            author: Some("redditor".to_string()),
            stickied: false,
            over_18: false,
        }
    }

    /// Create a candidate for `url`.
    pub fn candidate(url: &str, title: &str) -> Candidate {
        Candidate {
            url: url.to_string(),
            title: title.to_string(),
            author: "redditor".to_string(),
        }
    }

    /// Create a config whose folders and dedup record live under `root`.
    pub fn config(root: &Path) -> Config {
        let mut config = load_config_from_str(
            r#"
[reddit]
subreddit = "funny"
client_id = "id"
client_secret = "secret"
username = "user"
password = "pass"
user_agent = "shortsmith-test"

[video]
dimensions = [1080, 1920]
"#,
        )
        .expect("fixture config is valid");

        config.folders.base = root.join("output");
        config.database.path = root.join("database.txt");
        config
    }
}
