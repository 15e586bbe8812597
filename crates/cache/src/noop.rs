//! No-op cache — every lookup misses, every save is discarded.

use async_trait::async_trait;
use relaycord_core::cache::Cache;
use relaycord_core::channel::ChatMessage;

pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    fn name(&self) -> &str {
        "none"
    }

    async fn get_attachment(&self, _attachment_id: &str) -> Option<Vec<u8>> {
        None
    }

    async fn save_attachment(&self, _attachment_id: &str, _data: &[u8]) {}

    async fn get_message(&self, _channel_id: &str, _message_id: &str) -> Option<ChatMessage> {
        None
    }

    async fn save_message(&self, _channel_id: &str, _message_id: &str, _message: &ChatMessage) {}
}
