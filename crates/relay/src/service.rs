//! The relay service — one inbound message in, one streamed reply out.

use crate::classifier::ContentClassifier;
use crate::context::ContextAssembler;
use crate::presence::PresenceKeeper;
use crate::stream::{RelayOutcome, StreamRelayCoordinator};
use relaycord_config::AppConfig;
use relaycord_core::cache::Cache;
use relaycord_core::channel::{ChannelClient, ChatMessage};
use relaycord_core::error::Result;
use relaycord_core::media::{AttachmentFetcher, ImageNormalizer};
use relaycord_core::provider::CompletionProvider;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// External collaborators the service is wired to.
pub struct Collaborators {
    pub client: Arc<dyn ChannelClient>,
    pub provider: Arc<dyn CompletionProvider>,
    pub cache: Arc<dyn Cache>,
    pub fetcher: Arc<dyn AttachmentFetcher>,
    pub normalizer: Arc<dyn ImageNormalizer>,
}

pub struct RelayService {
    bot_user_id: String,
    dm_allowlist: HashSet<String>,
    presence_interval: Duration,
    client: Arc<dyn ChannelClient>,
    provider: Arc<dyn CompletionProvider>,
    classifier: Arc<ContentClassifier>,
    assembler: ContextAssembler,
    coordinator: StreamRelayCoordinator,
}

impl RelayService {
    pub fn new(config: &AppConfig, bot_user_id: impl Into<String>, deps: Collaborators) -> Self {
        let bot_user_id = bot_user_id.into();
        let classifier = Arc::new(ContentClassifier::new(
            bot_user_id.clone(),
            config.limits.clone(),
            Arc::clone(&deps.cache),
            deps.fetcher,
            deps.normalizer,
        ));
        let assembler = ContextAssembler::new(
            Arc::clone(&deps.client),
            deps.cache,
            Arc::clone(&classifier),
            config.limits.max_context_size,
            config.limits.max_chain_depth,
        );

        Self {
            bot_user_id,
            dm_allowlist: config.dm_allowlist.iter().cloned().collect(),
            presence_interval: config.presence.interval(),
            coordinator: StreamRelayCoordinator::new(Arc::clone(&deps.client)),
            client: deps.client,
            provider: deps.provider,
            classifier,
            assembler,
        }
    }

    /// Whether the bot should answer `message`.
    ///
    /// Bots (including this one) are never answered. In a guild the bot must
    /// be mentioned; in a direct message the author must be allow-listed.
    pub fn should_respond(&self, message: &ChatMessage) -> bool {
        if message.author.bot || message.author.id == self.bot_user_id {
            return false;
        }
        if message.is_direct() {
            self.dm_allowlist.contains(&message.author.id)
        } else {
            message.mentions_user(&self.bot_user_id)
        }
    }

    /// Answer `message` with a streamed reply.
    ///
    /// Returns `Ok(None)` when the message is not for the bot.
    pub async fn handle_message(&self, message: &ChatMessage) -> Result<Option<RelayOutcome>> {
        if !self.should_respond(message) {
            debug!(message_id = %message.id, author = %message.author.id, "Ignoring message");
            return Ok(None);
        }

        info!(
            message_id = %message.id,
            channel_id = %message.channel_id,
            author = %message.author.username,
            attachments = message.attachments.len(),
            "Relaying message"
        );

        let presence = PresenceKeeper::start(
            Arc::clone(&self.client),
            message.channel_id.clone(),
            self.presence_interval,
        );
        let result = self.respond(message).await;
        presence.stop().await;

        if let Err(e) = &result {
            warn!(message_id = %message.id, error = %e, "Relay failed");
        }
        result.map(Some)
    }

    async fn respond(&self, message: &ChatMessage) -> Result<RelayOutcome> {
        let current = self.classifier.classify(message).await;
        let history = self.assembler.assemble(message).await?;
        debug!(
            message_id = %message.id,
            history = history.len(),
            provider = self.provider.name(),
            "Opening completion stream"
        );

        let stream = self.provider.stream_completion(&current, &history).await?;
        Ok(self.coordinator.relay(stream, message).await?)
    }
}
