//! # Relaycord Core
//!
//! Domain types, traits, and error definitions for the Relaycord streaming
//! chat relay. This crate has **no transport dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (chat platform, completion provider, cache, attachment
//! download, image re-encoding) is a trait here. Implementations live in their
//! respective crates, which keeps the relay logic testable with mocks.

pub mod cache;
pub mod channel;
pub mod error;
pub mod media;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use cache::Cache;
pub use channel::{Attachment, Author, ChannelClient, ChatMessage, MessageRef, ReplyHandle};
pub use error::{ChannelError, Error, MediaError, ProviderError, Result};
pub use media::{AttachmentFetcher, ImageNormalizer};
pub use message::{ContentBlock, History, Role, StructuredMessage};
pub use provider::{CompletionChunk, CompletionProvider, CompletionStream};
