//! `relaycord reply` — Answer one Discord message.

use relaycord_cache::{FileCache, InMemoryCache, NoopCache};
use relaycord_channels::DiscordClient;
use relaycord_config::AppConfig;
use relaycord_core::cache::Cache;
use relaycord_media::{HttpFetcher, JpegNormalizer};
use relaycord_providers::AnthropicProvider;
use relaycord_relay::{Collaborators, RelayService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub async fn run(
    config: Option<PathBuf>,
    channel_id: String,
    message_id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config.as_deref())?;

    let token = config
        .discord
        .bot_token
        .clone()
        .ok_or("No Discord bot token configured. Set discord.bot_token or DISCORD_TOKEN.")?;
    let api_key = config
        .anthropic
        .api_key
        .clone()
        .ok_or("No Anthropic API key configured. Set anthropic.api_key or ANTHROPIC_API_KEY.")?;

    let mut discord = DiscordClient::new(token, config.http.request_timeout())?;
    if let Some(url) = &config.discord.api_url {
        discord = discord.with_base_url(url);
    }
    let discord = Arc::new(discord);

    let bot_user_id = match &config.discord.user_id {
        Some(id) => id.clone(),
        None => {
            let me = discord.current_user().await?;
            debug!(user_id = %me.id, username = %me.username, "Resolved bot identity");
            me.id
        }
    };

    let mut provider = AnthropicProvider::new(api_key)?
        .with_model(&config.anthropic.model)
        .with_max_tokens(config.anthropic.max_tokens)
        .with_system_prompt(config.anthropic.system_prompt.clone())
        .with_timeout(config.http.completion_timeout())?;
    if let Some(url) = &config.anthropic.api_url {
        provider = provider.with_base_url(url);
    }

    let service = RelayService::new(
        &config,
        bot_user_id,
        Collaborators {
            client: discord.clone(),
            provider: Arc::new(provider),
            cache: build_cache(&config),
            fetcher: Arc::new(HttpFetcher::new(config.http.request_timeout())?),
            normalizer: Arc::new(JpegNormalizer::new()),
        },
    );

    let message = discord.fetch_inbound(&channel_id, &message_id).await?;
    match service.handle_message(&message).await? {
        Some(outcome) => {
            info!(
                chunks = outcome.chunks,
                dispatched = outcome.dispatched,
                "Relay finished"
            );
            match outcome.reply {
                Some(reply) => println!(
                    "✅ Replied in {} ({} chars, message {})",
                    reply.channel_id,
                    outcome.text.chars().count(),
                    reply.message_id
                ),
                None => println!("⚠️  The model returned an empty response; nothing was posted."),
            }
        }
        None => println!("Message {message_id} is not addressed to the bot; nothing to do."),
    }

    Ok(())
}

/// Build the cache backend selected in the config.
fn build_cache(config: &AppConfig) -> Arc<dyn Cache> {
    match config.cache.backend.as_str() {
        "file" => Arc::new(FileCache::new(config.cache_dir())),
        "none" => Arc::new(NoopCache),
        _ => Arc::new(InMemoryCache::new()),
    }
}
