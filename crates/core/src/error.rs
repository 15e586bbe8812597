//! Error types for the Relaycord domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Relaycord operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Media errors ---
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("Message {message_id} not found in channel {channel_id}")]
    NotFound {
        channel_id: String,
        message_id: String,
    },

    #[error("Channel transport failed: {0}")]
    Transport(String),

    #[error("Request rejected by platform: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Invalid platform payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Download failed: {0}")]
    Transport(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),
}
