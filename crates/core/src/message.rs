//! Structured message types sent to the completion provider.
//!
//! A chat message is classified into a `StructuredMessage`: a role plus an
//! ordered list of content blocks (text first, then attachments in their
//! original order).

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The bot itself
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single piece of message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
    Image { data: Vec<u8>, media_type: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Contribution of this block to the context budget.
    ///
    /// Text counts characters; images count the length of their base64
    /// encoding, which is what the provider actually receives.
    pub fn weight(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Image { data, .. } => data.len().div_ceil(3) * 4,
        }
    }
}

/// A role plus ordered content blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl StructuredMessage {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// Create a user message with a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant message with a single text block.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Sum of the weights of all content blocks.
    pub fn weight(&self) -> usize {
        self.content.iter().map(ContentBlock::weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Ordered conversation context, oldest message first.
pub type History = Vec<StructuredMessage>;
