//! Chat platform clients for Relaycord.
//!
//! Each client implements `relaycord_core::ChannelClient`.
//!
//! Available clients:
//! - **Discord** — Discord REST API v10

pub mod discord;

pub use discord::DiscordClient;
