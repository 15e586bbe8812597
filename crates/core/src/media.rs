//! Attachment acquisition traits: raw download and image normalization.

use async_trait::async_trait;
use crate::error::MediaError;

/// Downloads attachment bytes from a URL.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, MediaError>;
}

/// Re-encodes an image so its longest side is at most `max_dimension` pixels.
pub trait ImageNormalizer: Send + Sync {
    /// Media type of the bytes returned by `normalize`.
    fn media_type(&self) -> &str;

    fn normalize(&self, data: &[u8], max_dimension: u32) -> std::result::Result<Vec<u8>, MediaError>;
}
