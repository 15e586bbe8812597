//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly with streaming enabled.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Text and base64 `image` content blocks
//! - Streaming via SSE `content_block_delta` events

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::StreamExt;
use relaycord_core::error::ProviderError;
use relaycord_core::message::{ContentBlock, StructuredMessage};
use relaycord_core::provider::{CompletionChunk, CompletionProvider, CompletionStream};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    system_prompt: Option<String>,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
            client: build_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|s| !s.trim().is_empty());
        self
    }

    /// Replace the HTTP client with one using `timeout` for the whole request,
    /// streamed body included.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Convert history plus the current message to API messages.
    ///
    /// Messages without content are dropped; the API rejects empty content.
    fn to_api_messages(
        current: &StructuredMessage,
        history: &[StructuredMessage],
    ) -> Vec<AnthropicMessage> {
        history
            .iter()
            .chain(std::iter::once(current))
            .filter(|msg| !msg.is_empty())
            .map(|msg| AnthropicMessage {
                role: msg.role.as_str(),
                content: msg.content.iter().map(ApiContentBlock::from).collect(),
            })
            .collect()
    }

    fn request_body(&self, messages: Vec<AnthropicMessage>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "stream": true,
        });

        if let Some(ref sys) = self.system_prompt {
            body["system"] = serde_json::json!(sys);
        }

        body
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream_completion(
        &self,
        current: &StructuredMessage,
        history: &[StructuredMessage],
    ) -> Result<CompletionStream, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let messages = Self::to_api_messages(current, history);
        if messages.is_empty() {
            return Err(ProviderError::ApiError {
                status_code: 400,
                message: "Nothing to send: every message is empty".into(),
            });
        }
        let body = self.request_body(messages);

        debug!(
            provider = "anthropic",
            model = %self.model,
            history_len = history.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.extend_from_slice(&bytes);

                for line in drain_lines(&mut buffer) {
                    let Some(data) = line.strip_prefix("data:") else {
                        // `event:` lines and SSE comments carry nothing the
                        // `data:` payload doesn't repeat.
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() {
                        continue;
                    }

                    let event: serde_json::Value = match serde_json::from_str(data) {
                        Ok(v) => v,
                        Err(e) => {
                            trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
                            continue;
                        }
                    };

                    match interpret_event(&event) {
                        StreamEvent::Delta(text) => {
                            if tx.send(Ok(CompletionChunk::new(text))).await.is_err() {
                                return;
                            }
                        }
                        StreamEvent::Error(message) => {
                            let _ = tx
                                .send(Err(ProviderError::StreamInterrupted(message)))
                                .await;
                            return;
                        }
                        StreamEvent::Stop => return,
                        StreamEvent::Other => {}
                    }
                }
            }

            debug!("Anthropic stream ended without message_stop");
        });

        Ok(rx)
    }
}

/// Take every complete line out of `buffer`, leaving any trailing partial
/// line in place. Lines are decoded only once their terminator arrived, so a
/// multibyte character split across network chunks stays intact.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=line_end).collect();
        let line = String::from_utf8_lossy(&raw[..line_end]);
        let line = line.trim_end_matches('\r');
        if !line.is_empty() && !line.starts_with(':') {
            lines.push(line.to_string());
        }
    }
    lines
}

#[derive(Debug, PartialEq)]
enum StreamEvent {
    Delta(String),
    Error(String),
    Stop,
    Other,
}

fn interpret_event(event: &serde_json::Value) -> StreamEvent {
    match event["type"].as_str().unwrap_or("") {
        "content_block_delta" => {
            let delta = &event["delta"];
            match (delta["type"].as_str(), delta["text"].as_str()) {
                (Some("text_delta"), Some(text)) => StreamEvent::Delta(text.to_string()),
                _ => StreamEvent::Other,
            }
        }
        "error" => {
            let kind = event["error"]["type"].as_str().unwrap_or("error");
            let message = event["error"]["message"].as_str().unwrap_or("unknown error");
            StreamEvent::Error(format!("{kind}: {message}"))
        }
        "message_stop" => StreamEvent::Stop,
        _ => StreamEvent::Other,
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

impl From<&ContentBlock> for ApiContentBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text(text) => Self::Text { text: text.clone() },
            ContentBlock::Image { data, media_type } => Self::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: media_type.clone(),
                    data: STANDARD.encode(data),
                },
            },
        }
    }
}
