//! Provider trait — the abstraction over the completion backend.
//!
//! A provider receives the current message plus its history and yields a
//! stream of text deltas. End of stream is signalled by closing the channel;
//! there is no separate "done" value.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::StructuredMessage;

/// A single chunk of streamed output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// Partial text (may be empty)
    #[serde(default)]
    pub delta: String,
}

impl CompletionChunk {
    pub fn new(delta: impl Into<String>) -> Self {
        Self { delta: delta.into() }
    }
}

/// Receiving half of a completion stream.
pub type CompletionStream =
    tokio::sync::mpsc::Receiver<std::result::Result<CompletionChunk, ProviderError>>;

/// The core provider trait.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Start a streamed completion for `current`, preceded by `history`
    /// (oldest first).
    ///
    /// The producer runs in its own task. Errors after the stream has started
    /// are delivered in-band; the receiver closes when the producer is done.
    async fn stream_completion(
        &self,
        current: &StructuredMessage,
        history: &[StructuredMessage],
    ) -> std::result::Result<CompletionStream, ProviderError>;
}
