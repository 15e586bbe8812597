//! File-based cache — one file per entry.
//!
//! Layout under the cache directory:
//! - `messages/<channel>_<message>.json` — JSON-encoded `ChatMessage`
//! - `attachments/<id>.bin` — raw (or normalized) attachment bytes
//!
//! Read or decode failures are logged and reported as misses; write failures
//! are logged and otherwise ignored.

use async_trait::async_trait;
use relaycord_core::cache::Cache;
use relaycord_core::channel::ChatMessage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(path = %root.display(), "File cache opened");
        Self { root }
    }

    fn message_path(&self, channel_id: &str, message_id: &str) -> PathBuf {
        self.root.join("messages").join(format!(
            "{}_{}.json",
            sanitize(channel_id),
            sanitize(message_id)
        ))
    }

    fn attachment_path(&self, attachment_id: &str) -> PathBuf {
        self.root
            .join("attachments")
            .join(format!("{}.bin", sanitize(attachment_id)))
    }
}

/// Keep IDs safe to use as file names.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

async fn read_file(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) => Some(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read cache entry");
            None
        }
    }
}

async fn write_file(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!(path = %parent.display(), error = %e, "Failed to create cache directory");
            return;
        }
    }
    if let Err(e) = tokio::fs::write(path, data).await {
        warn!(path = %path.display(), error = %e, "Failed to write cache entry");
    }
}

#[async_trait]
impl Cache for FileCache {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_attachment(&self, attachment_id: &str) -> Option<Vec<u8>> {
        read_file(&self.attachment_path(attachment_id)).await
    }

    async fn save_attachment(&self, attachment_id: &str, data: &[u8]) {
        write_file(&self.attachment_path(attachment_id), data).await;
    }

    async fn get_message(&self, channel_id: &str, message_id: &str) -> Option<ChatMessage> {
        let path = self.message_path(channel_id, message_id);
        let data = read_file(&path).await?;
        match serde_json::from_slice(&data) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted cached message");
                None
            }
        }
    }

    async fn save_message(&self, channel_id: &str, message_id: &str, message: &ChatMessage) {
        match serde_json::to_vec(message) {
            Ok(data) => write_file(&self.message_path(channel_id, message_id), &data).await,
            Err(e) => warn!(error = %e, "Failed to serialize message for cache"),
        }
    }
}
