//! Discord channel client.
//!
//! Implements `ChannelClient` over the Discord REST API (v10): fetching
//! messages, posting and editing replies, and the typing indicator. The
//! gateway (websocket) side is not handled here.

use async_trait::async_trait;
use relaycord_core::channel::{Attachment, Author, ChannelClient, ChatMessage, MessageRef, ReplyHandle};
use relaycord_core::error::ChannelError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_API_URL: &str = "https://discord.com/api/v10";

/// Discord message type for inline replies.
const MESSAGE_TYPE_REPLY: u8 = 19;

/// Discord REST client.
pub struct DiscordClient {
    base_url: String,
    bot_token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

impl DiscordClient {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: DEFAULT_API_URL.into(),
            bot_token: bot_token.into(),
            client,
        })
    }

    /// Use a different API root (e.g., for a proxy or tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The bot's own user.
    pub async fn current_user(&self) -> Result<Author, ChannelError> {
        let url = format!("{}/users/@me", self.base_url);
        let response = self.send(self.client.get(&url)).await?;
        let user: DiscordUser = decode(response).await?;
        Ok(user.into())
    }

    /// Fetch a message together with the guild of its channel.
    ///
    /// REST message objects omit `guild_id`; the inbound path needs it to
    /// tell guild messages from direct messages.
    pub async fn fetch_inbound(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<ChatMessage, ChannelError> {
        let mut message = self.fetch_message(channel_id, message_id).await?;
        if message.guild_id.is_none() {
            let url = format!("{}/channels/{}", self.base_url, channel_id);
            let response = self.send(self.client.get(&url)).await?;
            let channel: DiscordChannel = decode(response).await?;
            message.guild_id = channel.guild_id;
        }
        Ok(message)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ChannelError> {
        let response = request
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Discord API error");
        Err(ChannelError::Rejected {
            status_code: status.as_u16(),
            message: body,
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ChannelError> {
    response
        .json()
        .await
        .map_err(|e| ChannelError::InvalidPayload(e.to_string()))
}

#[async_trait]
impl ChannelClient for DiscordClient {
    fn name(&self) -> &str {
        "discord"
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<ChatMessage, ChannelError> {
        let url = format!("{}/channels/{}/messages/{}", self.base_url, channel_id, message_id);
        debug!(channel_id, message_id, "Fetching Discord message");

        let response = match self.send(self.client.get(&url)).await {
            Ok(response) => response,
            Err(ChannelError::Rejected { status_code: 404, .. }) => {
                return Err(ChannelError::NotFound {
                    channel_id: channel_id.into(),
                    message_id: message_id.into(),
                });
            }
            Err(e) => return Err(e),
        };

        let message: DiscordMessage = decode(response).await?;
        Ok(message.into())
    }

    async fn create_reply(
        &self,
        original: &ChatMessage,
        text: &str,
    ) -> Result<ReplyHandle, ChannelError> {
        let url = format!("{}/channels/{}/messages", self.base_url, original.channel_id);
        let body = serde_json::json!({
            "content": text,
            "message_reference": {
                "message_id": original.id,
                "channel_id": original.channel_id,
                "fail_if_not_exists": false,
            },
        });

        let response = self.send(self.client.post(&url).json(&body)).await?;
        let sent: DiscordMessage = decode(response).await?;
        Ok(ReplyHandle {
            channel_id: sent.channel_id,
            message_id: sent.id,
        })
    }

    async fn edit_reply(&self, handle: &ReplyHandle, text: &str) -> Result<ReplyHandle, ChannelError> {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.base_url, handle.channel_id, handle.message_id
        );
        let body = serde_json::json!({ "content": text });

        let response = self.send(self.client.patch(&url).json(&body)).await?;
        let edited: DiscordMessage = decode(response).await?;
        Ok(ReplyHandle {
            channel_id: edited.channel_id,
            message_id: edited.id,
        })
    }

    async fn send_typing(&self, channel_id: &str) -> Result<(), ChannelError> {
        let url = format!("{}/channels/{}/typing", self.base_url, channel_id);
        self.send(self.client.post(&url)).await?;
        Ok(())
    }
}

// --- Discord API types ---

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    bot: bool,
}

impl From<DiscordUser> for Author {
    fn from(user: DiscordUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bot: user.bot,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DiscordAttachment {
    id: String,
    filename: String,
    #[serde(default)]
    content_type: Option<String>,
    size: u64,
    url: String,
}

#[derive(Debug, Deserialize)]
struct DiscordMessageReference {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordChannel {
    #[serde(default)]
    guild_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordMessage {
    id: String,
    channel_id: String,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(rename = "type", default)]
    kind: u8,
    author: DiscordUser,
    #[serde(default)]
    content: String,
    #[serde(default)]
    mentions: Vec<DiscordUser>,
    #[serde(default)]
    attachments: Vec<DiscordAttachment>,
    #[serde(default)]
    message_reference: Option<DiscordMessageReference>,
}

impl From<DiscordMessage> for ChatMessage {
    fn from(msg: DiscordMessage) -> Self {
        // Only inline replies form a reply chain; crossposts and pins also
        // carry a message_reference.
        let reply_to = match (msg.kind, msg.message_reference) {
            (MESSAGE_TYPE_REPLY, Some(reference)) => reference.message_id.map(|message_id| {
                MessageRef::new(
                    reference.channel_id.unwrap_or_else(|| msg.channel_id.clone()),
                    message_id,
                )
            }),
            _ => None,
        };

        Self {
            id: msg.id,
            channel_id: msg.channel_id,
            guild_id: msg.guild_id,
            author: msg.author.into(),
            content: msg.content,
            mentions: msg.mentions.into_iter().map(Author::from).collect(),
            attachments: msg
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    id: a.id,
                    filename: a.filename,
                    content_type: a.content_type,
                    size: a.size,
                    url: a.url,
                })
                .collect(),
            reply_to,
        }
    }
}
