//! In-memory cache — the default backend; contents live as long as the
//! process.

use async_trait::async_trait;
use relaycord_core::cache::Cache;
use relaycord_core::channel::ChatMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stores messages keyed by `(channel_id, message_id)` and attachment bytes
/// keyed by attachment ID.
pub struct InMemoryCache {
    messages: Arc<RwLock<HashMap<(String, String), ChatMessage>>>,
    attachments: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(HashMap::new())),
            attachments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of cached messages and attachments.
    pub async fn len(&self) -> (usize, usize) {
        (
            self.messages.read().await.len(),
            self.attachments.read().await.len(),
        )
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_attachment(&self, attachment_id: &str) -> Option<Vec<u8>> {
        self.attachments.read().await.get(attachment_id).cloned()
    }

    async fn save_attachment(&self, attachment_id: &str, data: &[u8]) {
        self.attachments
            .write()
            .await
            .insert(attachment_id.to_string(), data.to_vec());
    }

    async fn get_message(&self, channel_id: &str, message_id: &str) -> Option<ChatMessage> {
        self.messages
            .read()
            .await
            .get(&(channel_id.to_string(), message_id.to_string()))
            .cloned()
    }

    async fn save_message(&self, channel_id: &str, message_id: &str, message: &ChatMessage) {
        self.messages.write().await.insert(
            (channel_id.to_string(), message_id.to_string()),
            message.clone(),
        );
    }
}
