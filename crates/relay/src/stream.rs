//! Stream relay — turns a completion stream into a live-updating reply.
//!
//! Every chunk appends to the accumulated text. When no edit is in flight,
//! a snapshot of the text is handed to a dispatch task that creates the
//! reply (first time) or edits it; while an edit is in flight, further
//! updates are dropped. Once the stream closes and every dispatch task has
//! finished, one last create-or-edit writes the complete text.

use relaycord_core::channel::{ChannelClient, ChatMessage, ReplyHandle};
use relaycord_core::error::ChannelError;
use relaycord_core::provider::CompletionStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// What a relay run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    /// The reply, if anything was displayed
    pub reply: Option<ReplyHandle>,
    /// The complete response text
    pub text: String,
    /// Chunks received from the stream
    pub chunks: usize,
    /// Intermediate updates handed to a dispatch task
    pub dispatched: usize,
    /// Intermediate updates dropped because an edit was in flight
    pub coalesced: usize,
    /// In-band stream errors that were logged and skipped
    pub stream_errors: usize,
}

pub struct StreamRelayCoordinator {
    client: Arc<dyn ChannelClient>,
}

impl StreamRelayCoordinator {
    pub fn new(client: Arc<dyn ChannelClient>) -> Self {
        Self { client }
    }

    /// Consume `stream` and mirror it into a reply to `original`.
    ///
    /// Intermediate failures are logged; only a failed final flush is
    /// returned as an error.
    pub async fn relay(
        &self,
        mut stream: CompletionStream,
        original: &ChatMessage,
    ) -> Result<RelayOutcome, ChannelError> {
        let original = Arc::new(original.clone());
        let editing = Arc::new(AtomicBool::new(false));
        let reply: Arc<Mutex<Option<ReplyHandle>>> = Arc::new(Mutex::new(None));
        let mut tasks = JoinSet::new();
        let mut text = String::new();
        let mut outcome = RelayOutcome::default();

        while let Some(item) = stream.recv().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(message_id = %original.id, error = %e, "Completion stream error");
                    outcome.stream_errors += 1;
                    continue;
                }
            };
            outcome.chunks += 1;
            text.push_str(&chunk.delta);

            if text.is_empty() {
                continue;
            }

            if editing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                outcome.coalesced += 1;
                continue;
            }

            outcome.dispatched += 1;
            tasks.spawn(dispatch(
                Arc::clone(&self.client),
                Arc::clone(&original),
                Arc::clone(&reply),
                Arc::clone(&editing),
                text.clone(),
            ));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(message_id = %original.id, error = %e, "Reply update task failed");
            }
        }

        if text.is_empty() {
            info!(message_id = %original.id, "Completion was empty, nothing to send");
            return Ok(outcome);
        }

        // All dispatch tasks have finished; the gate no longer applies.
        let mut slot = reply.lock().await;
        let handle = upsert(self.client.as_ref(), &original, slot.as_ref(), &text)
            .await
            .map_err(|e| {
                warn!(message_id = %original.id, error = %e, "Final reply update failed");
                e
            })?;
        *slot = Some(handle.clone());

        info!(
            message_id = %original.id,
            reply_id = %handle.message_id,
            chars = text.chars().count(),
            chunks = outcome.chunks,
            dispatched = outcome.dispatched,
            coalesced = outcome.coalesced,
            "Reply complete"
        );
        outcome.reply = Some(handle);
        outcome.text = text;
        Ok(outcome)
    }
}

/// Push one intermediate snapshot, then release the gate.
async fn dispatch(
    client: Arc<dyn ChannelClient>,
    original: Arc<ChatMessage>,
    reply: Arc<Mutex<Option<ReplyHandle>>>,
    editing: Arc<AtomicBool>,
    snapshot: String,
) {
    {
        let mut slot = reply.lock().await;
        match upsert(client.as_ref(), &original, slot.as_ref(), &snapshot).await {
            Ok(handle) => *slot = Some(handle),
            Err(e) => {
                warn!(message_id = %original.id, error = %e, "Intermediate reply update failed")
            }
        }
    }
    editing.store(false, Ordering::Release);
}

async fn upsert(
    client: &dyn ChannelClient,
    original: &ChatMessage,
    existing: Option<&ReplyHandle>,
    text: &str,
) -> Result<ReplyHandle, ChannelError> {
    match existing {
        Some(handle) => client.edit_reply(handle, text).await,
        None => client.create_reply(original, text).await,
    }
}
