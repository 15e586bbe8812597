//! Channel trait — the abstraction over the chat platform.
//!
//! A `ChannelClient` fetches prior messages, posts and edits the streamed
//! reply, and sends the typing indicator. The relay core only ever talks to
//! the platform through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;

/// A message author (or mentioned user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Platform-specific user ID
    pub id: String,

    /// Username used when rendering mentions
    pub username: String,

    /// Whether the account is a bot
    #[serde(default)]
    pub bot: bool,
}

/// Pointer to another message: the backward link of a reply chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

impl MessageRef {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.message_id)
    }
}

/// A file attached to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Platform attachment ID (the cache key for its bytes)
    pub id: String,

    pub filename: String,

    /// Declared MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Declared size in bytes
    pub size: u64,

    /// Download URL
    pub url: String,
}

impl Attachment {
    /// Whether the declared media type is an image.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// A message as seen on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,

    pub channel_id: String,

    /// Guild (server) ID; `None` for direct messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    pub author: Author,

    /// Raw text content, mentions still encoded as `<@id>`
    #[serde(default)]
    pub content: String,

    /// Users mentioned in the content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Author>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// The message this one replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageRef>,
}

impl ChatMessage {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }

    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|m| m.id == user_id)
    }

    /// Content with `<@id>` / `<@!id>` mention tokens rewritten to `@username`.
    pub fn content_with_mentions_replaced(&self) -> String {
        let mut content = self.content.clone();
        for user in &self.mentions {
            let replacement = format!("@{}", user.username);
            content = content
                .replace(&format!("<@{}>", user.id), &replacement)
                .replace(&format!("<@!{}>", user.id), &replacement);
        }
        content
    }
}

/// The outbound reply being streamed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyHandle {
    pub channel_id: String,
    pub message_id: String,
}

/// The core channel client trait.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Human-readable platform name (e.g., "discord").
    fn name(&self) -> &str;

    /// Fetch a single message by channel and message ID.
    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> std::result::Result<ChatMessage, ChannelError>;

    /// Post a reply to `original` and return a handle to it.
    async fn create_reply(
        &self,
        original: &ChatMessage,
        text: &str,
    ) -> std::result::Result<ReplyHandle, ChannelError>;

    /// Replace the content of an existing reply.
    async fn edit_reply(
        &self,
        handle: &ReplyHandle,
        text: &str,
    ) -> std::result::Result<ReplyHandle, ChannelError>;

    /// Send a typing indicator to a channel.
    async fn send_typing(&self, channel_id: &str) -> std::result::Result<(), ChannelError>;
}
