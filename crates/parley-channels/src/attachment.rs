use crate::http::{client, ensure_success};
use async_trait::async_trait;
use parley_core::{ClientConfig, Credential, ParleyError, ParleyResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

/// Out-of-band storage for attachment bytes.
#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    /// Store `content` and return a locator that file messages can point at.
    async fn upload(&self, content: Vec<u8>, filename: &str, media_type: &str)
        -> ParleyResult<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Multipart upload to the attachment endpoint.
pub struct HttpAttachmentUploader {
    http: reqwest::Client,
    upload_url: String,
    credential: Credential,
}

impl HttpAttachmentUploader {
    pub fn new(upload_url: impl Into<String>, credential: Credential, http: reqwest::Client) -> Self {
        Self {
            http,
            upload_url: upload_url.into(),
            credential,
        }
    }

    pub fn from_config(config: &ClientConfig, credential: Credential) -> ParleyResult<Self> {
        Ok(Self::new(
            config.api_url(&config.endpoints.upload),
            credential,
            client(config.request_timeout())?,
        ))
    }
}

#[async_trait]
impl AttachmentUploader for HttpAttachmentUploader {
    async fn upload(
        &self,
        content: Vec<u8>,
        filename: &str,
        media_type: &str,
    ) -> ParleyResult<String> {
        if filename.trim().is_empty() {
            return Err(ParleyError::Upload("attachment has no filename".into()));
        }
        let size = content.len();
        let part = Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(media_type)
            .map_err(|e| ParleyError::Upload(format!("invalid media type '{media_type}': {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.upload_url)
            .bearer_auth(self.credential.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ParleyError::Upload(format!("upload request failed: {e}")))?;

        let body: UploadResponse = ensure_success(response, ParleyError::Upload)
            .await?
            .json()
            .await
            .map_err(|e| ParleyError::Upload(format!("upload reply unreadable: {e}")))?;

        if body.url.trim().is_empty() {
            return Err(ParleyError::Upload("upload returned an empty locator".into()));
        }
        info!(filename = %filename, bytes = size, locator = %body.url, "Attachment uploaded");
        Ok(body.url)
    }
}
