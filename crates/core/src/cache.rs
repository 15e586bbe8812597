//! Cache trait — best-effort storage for resolved messages and attachment
//! bytes.
//!
//! Lookups return `None` on a miss; saves never fail from the caller's point
//! of view. Backends log their own storage problems.

use async_trait::async_trait;
use crate::channel::ChatMessage;

#[async_trait]
pub trait Cache: Send + Sync {
    /// Backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    async fn get_attachment(&self, attachment_id: &str) -> Option<Vec<u8>>;

    async fn save_attachment(&self, attachment_id: &str, data: &[u8]);

    async fn get_message(&self, channel_id: &str, message_id: &str) -> Option<ChatMessage>;

    async fn save_message(&self, channel_id: &str, message_id: &str, message: &ChatMessage);
}
