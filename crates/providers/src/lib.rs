//! Completion provider implementations for Relaycord.
//!
//! All providers implement the `relaycord_core::CompletionProvider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
