use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;

use super::UploadProvider;
use crate::{
    capture::ScreenshotArtifact,
    config::UploadConfig,
    error::{Result, TrackerError},
};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "upload";

use crate::{log_debug, log_warn};

/// Uploads to an imgbb-compatible endpoint: `POST {endpoint}?key={api_key}`
/// with a form field `image` holding the base64 PNG, answering
/// `{"data": {"url": ...}}`.
pub struct ImageHostUploader {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct HostResponse {
    data: Option<HostedImage>,
}

#[derive(Deserialize)]
struct HostedImage {
    url: Option<String>,
}

impl ImageHostUploader {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.endpoint.clone(), config.api_key.clone())
    }

    async fn send(&self, artifact: &ScreenshotArtifact) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TrackerError::Upload("no upload API key configured".into()))?;

        let bytes = tokio::fs::read(artifact.path())
            .await
            .map_err(|err| TrackerError::Upload(format!("failed to read capture: {err}")))?;
        let encoded = STANDARD.encode(&bytes);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .form(&[("image", encoded.as_str()), ("name", artifact.file_name().as_str())])
            .send()
            .await
            .map_err(|err| TrackerError::Upload(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Upload(format!("host returned {status}: {body}")));
        }

        let parsed: HostResponse = response
            .json()
            .await
            .map_err(|err| TrackerError::Upload(format!("unexpected host response: {err}")))?;

        parsed
            .data
            .and_then(|data| data.url)
            .ok_or_else(|| TrackerError::Upload("host response has no image url".into()))
    }
}

#[async_trait]
impl UploadProvider for ImageHostUploader {
    async fn upload(&self, artifact: ScreenshotArtifact) -> Result<String> {
        log_debug!("Uploading {} ({} bytes)", artifact.file_name(), artifact_size(&artifact));
        let result = self.send(&artifact).await;
        if let Err(err) = &result {
            log_warn!("Upload of {} failed: {}", artifact.file_name(), err);
        }
        // Dropping the artifact here deletes the local file.
        drop(artifact);
        result
    }
}

fn artifact_size(artifact: &ScreenshotArtifact) -> u64 {
    std::fs::metadata(artifact.path())
        .map(|meta| meta.len())
        .unwrap_or(0)
}
