//! Scripted collaborators shared by the relay tests.

use async_trait::async_trait;
use relaycord_core::cache::Cache;
use relaycord_core::channel::{Attachment, Author, ChannelClient, ChatMessage, MessageRef, ReplyHandle};
use relaycord_core::error::{ChannelError, MediaError, ProviderError};
use relaycord_core::media::{AttachmentFetcher, ImageNormalizer};
use relaycord_core::message::StructuredMessage;
use relaycord_core::provider::{CompletionChunk, CompletionProvider, CompletionStream};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const BOT_ID: &str = "bot";
pub const CHANNEL: &str = "chan";

pub fn author(id: &str, name: &str) -> Author {
    Author {
        id: id.into(),
        username: name.into(),
        bot: false,
    }
}

/// A guild message from `alice` in the test channel.
pub fn message(id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        id: id.into(),
        channel_id: CHANNEL.into(),
        guild_id: Some("guild".into()),
        author: author("alice", "alice"),
        content: content.into(),
        mentions: vec![],
        attachments: vec![],
        reply_to: None,
    }
}

/// A message replying to `parent_id` in the test channel.
pub fn reply(id: &str, content: &str, parent_id: &str) -> ChatMessage {
    let mut msg = message(id, content);
    msg.reply_to = Some(MessageRef::new(CHANNEL, parent_id));
    msg
}

pub fn attachment(id: &str, content_type: &str, size: u64) -> Attachment {
    Attachment {
        id: id.into(),
        filename: format!("{id}.dat"),
        content_type: Some(content_type.into()),
        size,
        url: format!("https://cdn.test/{id}"),
    }
}

/// An outbound call observed by `ScriptedChannel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyCall {
    Create(String),
    Edit(String, String),
}

impl ReplyCall {
    pub fn text(&self) -> &str {
        match self {
            Self::Create(text) | Self::Edit(_, text) => text,
        }
    }
}

/// Chat platform double: serves fetches from a fixed map and records every
/// reply, edit and typing call.
#[derive(Default)]
pub struct ScriptedChannel {
    messages: Mutex<HashMap<(String, String), ChatMessage>>,
    pub fetches: Mutex<Vec<MessageRef>>,
    pub calls: Mutex<Vec<ReplyCall>>,
    pub typing: AtomicUsize,
    next_reply: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    reply_delay: Option<Duration>,
    fail_first_replies: usize,
    fail_all_replies: bool,
    fail_typing: bool,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(self, message: ChatMessage) -> Self {
        self.messages.lock().unwrap().insert(
            (message.channel_id.clone(), message.id.clone()),
            message.clone(),
        );
        self
    }

    /// Every create/edit sleeps this long before answering.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    pub fn failing_first_replies(mut self, count: usize) -> Self {
        self.fail_first_replies = count;
        self
    }

    pub fn failing_replies(mut self) -> Self {
        self.fail_all_replies = true;
        self
    }

    pub fn failing_typing(mut self) -> Self {
        self.fail_typing = true;
        self
    }

    pub fn calls(&self) -> Vec<ReplyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    async fn record(&self, call: ReplyCall) -> Result<(), ChannelError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.reply_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };
        if self.fail_all_replies || index <= self.fail_first_replies {
            return Err(ChannelError::Rejected {
                status_code: 500,
                message: "scripted failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelClient for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<ChatMessage, ChannelError> {
        self.fetches
            .lock()
            .unwrap()
            .push(MessageRef::new(channel_id, message_id));
        self.messages
            .lock()
            .unwrap()
            .get(&(channel_id.to_string(), message_id.to_string()))
            .cloned()
            .ok_or_else(|| ChannelError::NotFound {
                channel_id: channel_id.into(),
                message_id: message_id.into(),
            })
    }

    async fn create_reply(
        &self,
        original: &ChatMessage,
        text: &str,
    ) -> Result<ReplyHandle, ChannelError> {
        self.record(ReplyCall::Create(text.into())).await?;
        let n = self.next_reply.fetch_add(1, Ordering::SeqCst);
        Ok(ReplyHandle {
            channel_id: original.channel_id.clone(),
            message_id: format!("reply-{n}"),
        })
    }

    async fn edit_reply(&self, handle: &ReplyHandle, text: &str) -> Result<ReplyHandle, ChannelError> {
        self.record(ReplyCall::Edit(handle.message_id.clone(), text.into()))
            .await?;
        Ok(handle.clone())
    }

    async fn send_typing(&self, _channel_id: &str) -> Result<(), ChannelError> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        if self.fail_typing {
            return Err(ChannelError::Transport("scripted typing failure".into()));
        }
        Ok(())
    }
}

/// Cache double that records writes.
#[derive(Default)]
pub struct RecordingCache {
    messages: Mutex<HashMap<(String, String), ChatMessage>>,
    attachments: Mutex<HashMap<String, Vec<u8>>>,
    pub message_saves: AtomicUsize,
    pub attachment_saves: AtomicUsize,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachment(self, id: &str, data: &[u8]) -> Self {
        self.attachments
            .lock()
            .unwrap()
            .insert(id.into(), data.to_vec());
        self
    }

    pub fn with_message(self, message: ChatMessage) -> Self {
        self.messages
            .lock()
            .unwrap()
            .insert((message.channel_id.clone(), message.id.clone()), message);
        self
    }

    pub fn attachment(&self, id: &str) -> Option<Vec<u8>> {
        self.attachments.lock().unwrap().get(id).cloned()
    }

    pub fn has_message(&self, channel_id: &str, message_id: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .contains_key(&(channel_id.to_string(), message_id.to_string()))
    }

    pub fn attachment_save_count(&self) -> usize {
        self.attachment_saves.load(Ordering::SeqCst)
    }

    pub fn message_save_count(&self) -> usize {
        self.message_saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for RecordingCache {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get_attachment(&self, attachment_id: &str) -> Option<Vec<u8>> {
        self.attachment(attachment_id)
    }

    async fn save_attachment(&self, attachment_id: &str, data: &[u8]) {
        self.attachment_saves.fetch_add(1, Ordering::SeqCst);
        self.attachments
            .lock()
            .unwrap()
            .insert(attachment_id.into(), data.to_vec());
    }

    async fn get_message(&self, channel_id: &str, message_id: &str) -> Option<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .get(&(channel_id.to_string(), message_id.to_string()))
            .cloned()
    }

    async fn save_message(&self, channel_id: &str, message_id: &str, message: &ChatMessage) {
        self.message_saves.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .unwrap()
            .insert((channel_id.into(), message_id.into()), message.clone());
    }
}

/// Serves attachment bytes by URL; unknown URLs fail with a transport error.
#[derive(Default)]
pub struct ScriptedFetcher {
    files: HashMap<String, Vec<u8>>,
    pub downloads: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, attachment: &Attachment, data: &[u8]) -> Self {
        self.files.insert(attachment.url.clone(), data.to_vec());
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttachmentFetcher for ScriptedFetcher {
    async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| MediaError::Transport(format!("no such file: {url}")))
    }
}

/// Prefixes the input with `jpeg:`; input starting with `bad` fails.
pub struct TaggingNormalizer;

impl ImageNormalizer for TaggingNormalizer {
    fn media_type(&self) -> &str {
        "image/jpeg"
    }

    fn normalize(&self, data: &[u8], _max_dimension: u32) -> Result<Vec<u8>, MediaError> {
        if data.starts_with(b"bad") {
            return Err(MediaError::Encoding("scripted decode failure".into()));
        }
        Ok([b"jpeg:".as_slice(), data].concat())
    }
}

/// Provider double that replays a fixed list of stream items.
pub struct ScriptedProvider {
    items: Vec<Result<CompletionChunk, ProviderError>>,
    delay: Option<Duration>,
    fail_open: bool,
    pub requests: Mutex<Vec<(StructuredMessage, Vec<StructuredMessage>)>>,
}

impl ScriptedProvider {
    pub fn new(items: Vec<Result<CompletionChunk, ProviderError>>) -> Self {
        Self {
            items,
            delay: None,
            fail_open: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn deltas(deltas: &[&str]) -> Self {
        Self::new(deltas.iter().map(|d| Ok(CompletionChunk::new(*d))).collect())
    }

    /// Sleep before each item is sent.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing() -> Self {
        let mut provider = Self::new(vec![]);
        provider.fail_open = true;
        provider
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Open a stream directly, without going through the trait.
    pub fn stream(&self) -> CompletionStream {
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let items = self.items.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            for item in items {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_completion(
        &self,
        current: &StructuredMessage,
        history: &[StructuredMessage],
    ) -> Result<CompletionStream, ProviderError> {
        self.requests
            .lock()
            .unwrap()
            .push((current.clone(), history.to_vec()));
        if self.fail_open {
            return Err(ProviderError::AuthenticationFailed("scripted".into()));
        }
        Ok(self.stream())
    }
}
