//! YouTube Data API publisher.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::YouTubeConfig;

use super::credentials::{
    authorization_url, load_credentials, save_credentials, AuthorizationPrompt, ClientSecrets,
    StoredCredentials, TokenResponse,
};
use super::{classify_response, PublishError, PublishReceipt, Publisher, UploadMetadata};

/// Publishes clips through the resumable upload endpoint.
pub struct YouTubePublisher {
    client: Client,
    config: YouTubeConfig,
    prompt: Arc<dyn AuthorizationPrompt>,
    /// Credentials in use (cleared when the service refuses them).
    credentials: RwLock<Option<StoredCredentials>>,
}

impl YouTubePublisher {
    /// Create a new publisher.
    pub fn new(
        config: YouTubeConfig,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PublishError::Transient(e.to_string()))?;

        Ok(Self {
            client,
            config,
            prompt,
            credentials: RwLock::new(None),
        })
    }

    fn upload_endpoint(&self) -> String {
        format!(
            "{}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status",
            self.config.upload_url.trim_end_matches('/')
        )
    }

    /// Returns a usable access token, refreshing or authorizing as needed.
    async fn access_token(&self) -> Result<String, PublishError> {
        let now = Utc::now();

        if let Some(credentials) = self.credentials.read().await.as_ref() {
            if !credentials.is_expired(now) {
                return Ok(credentials.access_token.clone());
            }
        }

        let stored = match self.credentials.read().await.clone() {
            Some(credentials) => Some(credentials),
            None => load_credentials(&self.config.credentials_file).await,
        };

        if let Some(credentials) = stored {
            if !credentials.is_expired(now) {
                let token = credentials.access_token.clone();
                *self.credentials.write().await = Some(credentials);
                return Ok(token);
            }

            if let Some(refresh_token) = credentials.refresh_token.clone() {
                let secrets = ClientSecrets::load(&self.config.client_secrets_file).await?;
                match self.refresh(&secrets, &refresh_token).await {
                    Ok(refreshed) => return self.store(refreshed).await,
                    Err(e) => warn!("Refreshing upload credentials failed: {}", e),
                }
            }
        }

        self.authorize_interactively().await
    }

    async fn refresh(
        &self,
        secrets: &ClientSecrets,
        refresh_token: &str,
    ) -> Result<StoredCredentials, PublishError> {
        debug!("Refreshing upload credentials");
        let params = [
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.token_request(&secrets.token_uri, &params).await?;
        Ok(StoredCredentials::from_token_response(
            response,
            Some(refresh_token.to_string()),
            Utc::now(),
        ))
    }

    async fn authorize_interactively(&self) -> Result<String, PublishError> {
        let secrets = ClientSecrets::load(&self.config.client_secrets_file).await?;
        let code = self
            .prompt
            .authorization_code(&authorization_url(&secrets))
            .await?;

        let code = code.trim();
        if code.is_empty() {
            return Err(PublishError::Authentication(
                "No authorization code entered".to_string(),
            ));
        }

        let params = [
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", secrets.redirect_uri()),
            ("grant_type", "authorization_code"),
        ];
        let response = self.token_request(&secrets.token_uri, &params).await?;
        info!("Upload authorization granted");
        self.store(StoredCredentials::from_token_response(response, None, Utc::now()))
            .await
    }

    async fn token_request(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse, PublishError> {
        let response = self
            .client
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Authentication(format!(
                "Token endpoint returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PublishError::Authentication(format!("Invalid token response: {}", e)))
    }

    async fn store(&self, credentials: StoredCredentials) -> Result<String, PublishError> {
        save_credentials(&self.config.credentials_file, &credentials).await?;
        let token = credentials.access_token.clone();
        *self.credentials.write().await = Some(credentials);
        Ok(token)
    }

    /// Opens a resumable session and returns its upload URL.
    async fn start_session(
        &self,
        token: &str,
        metadata: &UploadMetadata,
        size: u64,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(self.upload_endpoint())
            .bearer_auth(token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&upload_body(metadata))
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = self.check(response).await?;
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                PublishError::Transient("Upload session has no Location header".to_string())
            })
    }

    /// Turns an unsuccessful response into an error.
    async fn check(&self, response: Response) -> Result<Response, PublishError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_response(status.as_u16(), &body);
        if matches!(error, PublishError::Authentication(_)) {
            // Force a refresh on the next attempt
            *self.credentials.write().await = None;
        }
        Err(error)
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn publish(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
    ) -> Result<PublishReceipt, PublishError> {
        let bytes = tokio::fs::read(path).await?;
        let token = self.access_token().await?;

        let session_url = self
            .start_session(&token, metadata, bytes.len() as u64)
            .await?;
        debug!(size = bytes.len(), "Upload session opened");

        let response = self
            .client
            .put(&session_url)
            .bearer_auth(&token)
            .header(header::CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = self.check(response).await?;
        let video: UploadedVideo = response
            .json()
            .await
            .map_err(|e| PublishError::Transient(format!("Invalid upload response: {}", e)))?;

        info!(video_id = %video.id, title = %metadata.title, "Video uploaded");
        Ok(PublishReceipt { video_id: video.id })
    }
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

fn upload_body(metadata: &UploadMetadata) -> serde_json::Value {
    json!({
        "snippet": {
            "title": metadata.title,
            "description": metadata.description,
            "tags": metadata.tags,
            "categoryId": metadata.category.to_string(),
        },
        "status": {
            "privacyStatus": metadata.privacy.as_str(),
            "selfDeclaredMadeForKids": false,
        }
    })
}

fn map_transport_error(e: reqwest::Error) -> PublishError {
    PublishError::Transient(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Privacy;
    use tempfile::TempDir;

    struct RefusingPrompt;

    #[async_trait]
    impl AuthorizationPrompt for RefusingPrompt {
        async fn authorization_code(&self, _url: &str) -> Result<String, PublishError> {
            Ok(String::new())
        }
    }

    fn metadata() -> UploadMetadata {
        UploadMetadata {
            title: "Cat falls off table".to_string(),
            description: "#shorts".to_string(),
            tags: vec!["cat".to_string()],
            category: 23,
            privacy: Privacy::Unlisted,
        }
    }

    fn publisher(temp: &TempDir) -> YouTubePublisher {
        let config = YouTubeConfig {
            client_secrets_file: temp.path().join("client_secrets.json"),
            credentials_file: temp.path().join("upload-oauth2.json"),
            ..Default::default()
        };
        YouTubePublisher::new(config, Arc::new(RefusingPrompt)).unwrap()
    }

    #[test]
    fn test_upload_body() {
        let body = upload_body(&metadata());
        assert_eq!(body["snippet"]["title"], "Cat falls off table");
        assert_eq!(body["snippet"]["categoryId"], "23");
        assert_eq!(body["snippet"]["tags"][0], "cat");
        assert_eq!(body["status"]["privacyStatus"], "unlisted");
    }

    #[test]
    fn test_upload_endpoint() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            publisher(&temp).upload_endpoint(),
            "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status"
        );
    }

    #[tokio::test]
    async fn test_publish_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = publisher(&temp)
            .publish(&temp.path().join("FINAL_VIDEO.mp4"), &metadata())
            .await;
        assert!(matches!(result, Err(PublishError::Io(_))));
    }

    #[tokio::test]
    async fn test_publish_without_client_secrets() {
        let temp = TempDir::new().unwrap();
        let clip = temp.path().join("FINAL_VIDEO.mp4");
        std::fs::write(&clip, b"clip").unwrap();

        let result = publisher(&temp).publish(&clip, &metadata()).await;
        assert!(matches!(result, Err(PublishError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_publish_with_empty_authorization_code() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("client_secrets.json"),
            r#"{"installed": {"client_id": "id", "client_secret": "secret"}}"#,
        )
        .unwrap();
        let clip = temp.path().join("FINAL_VIDEO.mp4");
        std::fs::write(&clip, b"clip").unwrap();

        let result = publisher(&temp).publish(&clip, &metadata()).await;
        assert!(
            matches!(result, Err(PublishError::Authentication(ref msg)) if msg.contains("No authorization code"))
        );
    }
}
