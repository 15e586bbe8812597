use async_trait::async_trait;
use relaycord_core::error::MediaError;
use relaycord_core::media::AttachmentFetcher;
use std::time::Duration;
use tracing::debug;

/// Downloads attachments over plain HTTP(S).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AttachmentFetcher for HttpFetcher {
    async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Transport(format!(
                "download failed with status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;
        debug!(url, size = bytes.len(), "Downloaded attachment");
        Ok(bytes.to_vec())
    }
}
