//! Reply-chain context assembly.
//!
//! Walks backwards from a message along its reply references, classifying
//! each ancestor, until the chain ends, the depth cap is hit, or the next
//! ancestor would push the accumulated weight to the budget. The result is
//! oldest-first.

use crate::classifier::ContentClassifier;
use relaycord_core::cache::Cache;
use relaycord_core::channel::{ChannelClient, ChatMessage, MessageRef};
use relaycord_core::error::ChannelError;
use relaycord_core::message::History;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ContextAssembler {
    client: Arc<dyn ChannelClient>,
    cache: Arc<dyn Cache>,
    classifier: Arc<ContentClassifier>,
    max_context_size: usize,
    max_chain_depth: usize,
}

impl ContextAssembler {
    pub fn new(
        client: Arc<dyn ChannelClient>,
        cache: Arc<dyn Cache>,
        classifier: Arc<ContentClassifier>,
        max_context_size: usize,
        max_chain_depth: usize,
    ) -> Self {
        Self {
            client,
            cache,
            classifier,
            max_context_size,
            max_chain_depth,
        }
    }

    /// Build the history preceding `start`.
    ///
    /// Any fetch failure aborts the whole assembly; nothing partial is
    /// returned.
    pub async fn assemble(&self, start: &ChatMessage) -> Result<History, ChannelError> {
        // Collected newest-first, reversed before returning.
        let mut history = History::new();
        let mut total = 0usize;
        let mut next = start.reply_to.clone();
        let mut depth = 0usize;

        while let Some(reference) = next.take() {
            if depth >= self.max_chain_depth {
                info!(
                    message_id = %start.id,
                    depth,
                    "Reply chain depth limit reached, truncating history"
                );
                break;
            }
            depth += 1;

            let ancestor = self.resolve(&reference).await?;
            let structured = self.classifier.classify(&ancestor).await;

            total += structured.weight();
            if total >= self.max_context_size {
                debug!(
                    message_id = %ancestor.id,
                    total,
                    budget = self.max_context_size,
                    "Context budget reached"
                );
                break;
            }

            history.push(structured);
            next = ancestor.reply_to;
        }

        history.reverse();
        debug!(
            message_id = %start.id,
            messages = history.len(),
            weight = history.iter().map(|m| m.weight()).sum::<usize>(),
            "Assembled reply-chain history"
        );
        Ok(history)
    }

    /// Cache first, then the platform; fetched messages are written back.
    async fn resolve(&self, reference: &MessageRef) -> Result<ChatMessage, ChannelError> {
        if let Some(cached) = self
            .cache
            .get_message(&reference.channel_id, &reference.message_id)
            .await
        {
            return Ok(cached);
        }

        let message = self
            .client
            .fetch_message(&reference.channel_id, &reference.message_id)
            .await
            .map_err(|e| {
                warn!(reference = %reference, error = %e, "Failed to fetch reply-chain message");
                e
            })?;

        self.cache
            .save_message(&reference.channel_id, &reference.message_id, &message)
            .await;
        Ok(message)
    }
}
