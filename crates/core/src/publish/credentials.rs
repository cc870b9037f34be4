//! OAuth client secrets and stored upload credentials.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::PublishError;

/// Scope needed to upload videos.
pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Redirect used when the secrets file lists none.
const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens expiring within this window are refreshed early.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth client registration, as downloaded from the API console.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ClientSecrets {
    /// Parses a secrets document (`installed` or `web` application).
    pub fn from_json(json: &str) -> Result<Self, PublishError> {
        #[derive(Deserialize)]
        struct SecretsFile {
            installed: Option<ClientSecrets>,
            web: Option<ClientSecrets>,
        }

        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| PublishError::Authentication(format!("Invalid client secrets: {}", e)))?;

        file.installed.or(file.web).ok_or_else(|| {
            PublishError::Authentication(
                "Client secrets contain no installed or web application".to_string(),
            )
        })
    }

    /// Reads a secrets file.
    pub async fn load(path: &Path) -> Result<Self, PublishError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            PublishError::Authentication(format!(
                "Cannot read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

/// Builds the consent page URL the user has to visit on first run.
pub fn authorization_url(secrets: &ClientSecrets) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        secrets.auth_uri,
        urlencoding::encode(&secrets.client_id),
        urlencoding::encode(secrets.redirect_uri()),
        urlencoding::encode(UPLOAD_SCOPE)
    )
}

/// Tokens persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    /// Builds credentials from a token endpoint response.
    ///
    /// Refresh responses usually omit the refresh token, so the previous
    /// one is kept.
    pub fn from_token_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response
                .expires_in
                .map(|secs| now + Duration::seconds(secs)),
        }
    }

    /// Returns true if the access token should no longer be used.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now,
            None => false,
        }
    }
}

/// Response of the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Reads stored credentials; a missing or unreadable file yields `None`.
pub async fn load_credentials(path: &Path) -> Option<StoredCredentials> {
    let json = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&json) {
        Ok(credentials) => Some(credentials),
        Err(e) => {
            warn!(path = %path.display(), "Ignoring invalid stored credentials: {}", e);
            None
        }
    }
}

/// Writes credentials, creating parent directories as needed.
pub async fn save_credentials(
    path: &Path,
    credentials: &StoredCredentials,
) -> Result<(), PublishError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(credentials)
        .map_err(|e| PublishError::Authentication(format!("Cannot encode credentials: {}", e)))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Interactive consent step, needed when no usable credentials exist.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Shows `url` to the user and returns the authorization code they paste back.
    async fn authorization_code(&self, url: &str) -> Result<String, PublishError>;
}
