//! Content classification — turns a chat message into a `StructuredMessage`.
//!
//! The message text (with mentions resolved) becomes the first block. Each
//! attachment is then classified by its declared media type:
//!
//! - **Images** are downloaded, shrunk and re-encoded, and sent as image
//!   blocks.
//! - **Everything else** is decoded as (lossy) UTF-8 and sent as a text
//!   block headed by the filename and media type.
//!
//! Attachments over their size limit, or whose download or re-encoding
//! fails, are left out. Classification itself never fails.

use relaycord_config::LimitsConfig;
use relaycord_core::cache::Cache;
use relaycord_core::channel::{Attachment, ChatMessage};
use relaycord_core::media::{AttachmentFetcher, ImageNormalizer};
use relaycord_core::message::{ContentBlock, Role, StructuredMessage};
use std::sync::Arc;
use tracing::{debug, warn};

const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

pub struct ContentClassifier {
    bot_user_id: String,
    limits: LimitsConfig,
    cache: Arc<dyn Cache>,
    fetcher: Arc<dyn AttachmentFetcher>,
    normalizer: Arc<dyn ImageNormalizer>,
}

impl ContentClassifier {
    pub fn new(
        bot_user_id: impl Into<String>,
        limits: LimitsConfig,
        cache: Arc<dyn Cache>,
        fetcher: Arc<dyn AttachmentFetcher>,
        normalizer: Arc<dyn ImageNormalizer>,
    ) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            limits,
            cache,
            fetcher,
            normalizer,
        }
    }

    /// `Assistant` for the bot's own messages, `User` for everyone else.
    pub fn role_of(&self, message: &ChatMessage) -> Role {
        if message.author.id == self.bot_user_id {
            Role::Assistant
        } else {
            Role::User
        }
    }

    pub async fn classify(&self, message: &ChatMessage) -> StructuredMessage {
        let mut content = Vec::with_capacity(message.attachments.len() + 1);

        let text = message.content_with_mentions_replaced();
        if !text.is_empty() {
            content.push(ContentBlock::Text(text));
        }

        for attachment in &message.attachments {
            let block = if attachment.is_image() {
                self.image_block(attachment).await
            } else {
                self.file_block(attachment).await
            };
            content.extend(block);
        }

        StructuredMessage::new(self.role_of(message), content)
    }

    async fn image_block(&self, attachment: &Attachment) -> Option<ContentBlock> {
        if attachment.size > self.limits.max_image_size {
            debug!(
                attachment_id = %attachment.id,
                size = attachment.size,
                limit = self.limits.max_image_size,
                "Skipping oversized image"
            );
            return None;
        }

        // Cached bytes still go through the normalizer so a lowered
        // dimension bound applies to images stored under the old one.
        let data = match self.cache.get_attachment(&attachment.id).await {
            Some(cached) => self.normalize(attachment, cached).await?,
            None => {
                let raw = self.download(attachment).await?;
                let normalized = self.normalize(attachment, raw).await?;
                self.cache.save_attachment(&attachment.id, &normalized).await;
                normalized
            }
        };

        Some(ContentBlock::Image {
            data,
            media_type: self.normalizer.media_type().to_string(),
        })
    }

    async fn file_block(&self, attachment: &Attachment) -> Option<ContentBlock> {
        if attachment.size > self.limits.max_attachment_size {
            debug!(
                attachment_id = %attachment.id,
                size = attachment.size,
                limit = self.limits.max_attachment_size,
                "Skipping oversized attachment"
            );
            return None;
        }

        let data = match self.cache.get_attachment(&attachment.id).await {
            Some(cached) => cached,
            None => {
                let raw = self.download(attachment).await?;
                self.cache.save_attachment(&attachment.id, &raw).await;
                raw
            }
        };

        let content_type = attachment
            .content_type
            .as_deref()
            .unwrap_or(UNKNOWN_CONTENT_TYPE);
        Some(ContentBlock::Text(format!(
            "{} ({}):\n\n{}",
            attachment.filename,
            content_type,
            String::from_utf8_lossy(&data)
        )))
    }

    async fn download(&self, attachment: &Attachment) -> Option<Vec<u8>> {
        match self.fetcher.download(&attachment.url).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(attachment_id = %attachment.id, error = %e, "Attachment download failed, skipping");
                None
            }
        }
    }

    async fn normalize(&self, attachment: &Attachment, raw: Vec<u8>) -> Option<Vec<u8>> {
        let normalizer = Arc::clone(&self.normalizer);
        let max_dimension = self.limits.image_max_dimension;
        let result =
            tokio::task::spawn_blocking(move || normalizer.normalize(&raw, max_dimension)).await;

        match result {
            Ok(Ok(data)) => Some(data),
            Ok(Err(e)) => {
                warn!(attachment_id = %attachment.id, error = %e, "Image re-encoding failed, skipping");
                None
            }
            Err(e) => {
                warn!(attachment_id = %attachment.id, error = %e, "Image re-encoding task failed, skipping");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn classifier(cache: Arc<RecordingCache>, fetcher: Arc<ScriptedFetcher>) -> ContentClassifier {
        let limits = LimitsConfig {
            max_attachment_size: 100,
            max_image_size: 1000,
            ..LimitsConfig::default()
        };
        ContentClassifier::new(BOT_ID, limits, cache, fetcher, Arc::new(TaggingNormalizer))
    }

    #[tokio::test]
    async fn text_comes_first_with_mentions_resolved() {
        let mut msg = message("1", "<@bot> summarize");
        msg.mentions = vec![author(BOT_ID, "relay")];
        let image = attachment("img", "image/png", 10);
        msg.attachments = vec![image.clone()];

        let fetcher = Arc::new(ScriptedFetcher::new().with_file(&image, b"png"));
        let result = classifier(Arc::new(RecordingCache::new()), fetcher)
            .classify(&msg)
            .await;

        assert_eq!(result.role, Role::User);
        assert_eq!(
            result.content,
            vec![
                ContentBlock::text("@relay summarize"),
                ContentBlock::Image {
                    data: b"jpeg:png".to_vec(),
                    media_type: "image/jpeg".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn bot_messages_are_assistant_role() {
        let mut msg = message("1", "earlier answer");
        msg.author = author(BOT_ID, "relay");
        let result = classifier(Arc::new(RecordingCache::new()), Arc::new(ScriptedFetcher::new()))
            .classify(&msg)
            .await;
        assert_eq!(result.role, Role::Assistant);
    }

    #[tokio::test]
    async fn empty_text_produces_no_block() {
        let result = classifier(Arc::new(RecordingCache::new()), Arc::new(ScriptedFetcher::new()))
            .classify(&message("1", ""))
            .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn generic_attachment_becomes_headed_text() {
        let mut msg = message("1", "");
        let file = attachment("log", "text/plain", 20);
        msg.attachments = vec![file.clone()];

        let cache = Arc::new(RecordingCache::new());
        let fetcher = Arc::new(ScriptedFetcher::new().with_file(&file, b"line one\xff"));
        let result = classifier(cache.clone(), fetcher).classify(&msg).await;

        assert_eq!(
            result.content,
            vec![ContentBlock::text("log.dat (text/plain):\n\nline one\u{fffd}")]
        );
        // Raw bytes go to the cache for generic files.
        assert_eq!(cache.attachment("log").unwrap(), b"line one\xff");
    }

    #[tokio::test]
    async fn oversized_attachments_are_skipped_without_download() {
        let mut msg = message("1", "see files");
        let big_file = attachment("big", "text/plain", 101);
        let big_image = attachment("huge", "image/png", 1001);
        msg.attachments = vec![big_file.clone(), big_image.clone()];

        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_file(&big_file, b"x")
                .with_file(&big_image, b"y"),
        );
        let result = classifier(Arc::new(RecordingCache::new()), fetcher.clone())
            .classify(&msg)
            .await;

        assert_eq!(result.content, vec![ContentBlock::text("see files")]);
        assert_eq!(fetcher.download_count(), 0);
    }

    #[tokio::test]
    async fn size_limit_is_inclusive() {
        let mut msg = message("1", "");
        let file = attachment("edge", "text/csv", 100);
        msg.attachments = vec![file.clone()];

        let fetcher = Arc::new(ScriptedFetcher::new().with_file(&file, b"a,b"));
        let result = classifier(Arc::new(RecordingCache::new()), fetcher)
            .classify(&msg)
            .await;
        assert_eq!(result.content.len(), 1);
    }

    #[tokio::test]
    async fn cache_hit_is_normalized_without_download_or_write_back() {
        let mut msg = message("1", "");
        let image = attachment("img", "image/webp", 10);
        msg.attachments = vec![image];

        let cache = Arc::new(RecordingCache::new().with_attachment("img", b"already-jpeg"));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let result = classifier(cache.clone(), fetcher.clone()).classify(&msg).await;

        assert_eq!(
            result.content,
            vec![ContentBlock::Image {
                data: b"jpeg:already-jpeg".to_vec(),
                media_type: "image/jpeg".into(),
            }]
        );
        assert_eq!(fetcher.download_count(), 0);
        assert_eq!(cache.attachment_save_count(), 0);
    }

    #[tokio::test]
    async fn undecodable_cached_image_is_skipped() {
        let mut msg = message("1", "");
        msg.attachments = vec![attachment("img", "image/png", 10)];

        let cache = Arc::new(RecordingCache::new().with_attachment("img", b"bad cache entry"));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let result = classifier(cache.clone(), fetcher.clone()).classify(&msg).await;

        assert!(result.content.is_empty());
        assert_eq!(fetcher.download_count(), 0);
        assert_eq!(cache.attachment_save_count(), 0);
    }

    #[tokio::test]
    async fn cache_miss_stores_normalized_image_once() {
        let mut msg = message("1", "");
        let image = attachment("img", "image/png", 10);
        msg.attachments = vec![image.clone()];

        let cache = Arc::new(RecordingCache::new());
        let fetcher = Arc::new(ScriptedFetcher::new().with_file(&image, b"raw"));
        let classifier = classifier(cache.clone(), fetcher.clone());

        classifier.classify(&msg).await;
        let second = classifier.classify(&msg).await;

        assert_eq!(cache.attachment("img").unwrap(), b"jpeg:raw");
        assert_eq!(
            second.content,
            vec![ContentBlock::Image {
                data: b"jpeg:jpeg:raw".to_vec(),
                media_type: "image/jpeg".into(),
            }]
        );
        assert_eq!(cache.attachment_save_count(), 1);
        assert_eq!(fetcher.download_count(), 1);
    }

    #[tokio::test]
    async fn failed_attachments_are_skipped_individually() {
        let mut msg = message("1", "");
        let missing = attachment("missing", "text/plain", 5);
        let corrupt = attachment("corrupt", "image/png", 5);
        let good = attachment("good", "text/plain", 5);
        msg.attachments = vec![missing, corrupt.clone(), good.clone()];

        let cache = Arc::new(RecordingCache::new());
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_file(&corrupt, b"bad bytes")
                .with_file(&good, b"ok"),
        );
        let result = classifier(cache.clone(), fetcher).classify(&msg).await;

        assert_eq!(
            result.content,
            vec![ContentBlock::text("good.dat (text/plain):\n\nok")]
        );
        assert!(cache.attachment("corrupt").is_none());
    }

    #[tokio::test]
    async fn missing_content_type_is_a_generic_file() {
        let mut msg = message("1", "");
        let mut file = attachment("blob", "text/plain", 5);
        file.content_type = None;
        msg.attachments = vec![file.clone()];

        let fetcher = Arc::new(ScriptedFetcher::new().with_file(&file, b"data"));
        let result = classifier(Arc::new(RecordingCache::new()), fetcher)
            .classify(&msg)
            .await;
        assert_eq!(
            result.content,
            vec![ContentBlock::text(
                "blob.dat (application/octet-stream):\n\ndata"
            )]
        );
    }
}
