//! Publishing rendered clips.
//!
//! The [`Publisher`] trait hides the video service. Failures carry a
//! [`PublishError`] so the pipeline can tell an exhausted quota apart from
//! a rejected upload or a passing outage.

mod credentials;
mod types;
mod youtube;

pub use credentials::{
    authorization_url, load_credentials, save_credentials, AuthorizationPrompt, ClientSecrets,
    StoredCredentials, TokenResponse,
};
pub use types::{classify_response, PublishError, PublishReceipt, Publisher, UploadMetadata};
pub use youtube::YouTubePublisher;
