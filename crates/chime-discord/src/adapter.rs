use std::sync::Arc;
use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::model::id::GuildId;
use serenity::Client;
use songbird::serenity::SerenityInit;
use songbird::Songbird;
use tokio::sync::watch;
use tracing::{error, info, warn};

use chime_core::config::DiscordConfig;

use crate::context::DiscordAppContext;
use crate::error::DiscordError;
use crate::handler::DiscordHandler;

/// Discord channel adapter.
///
/// Wraps a serenity `Client` and drives the event loop until shutdown is
/// signalled. Reconnects automatically whenever the gateway drops.
pub struct DiscordAdapter<C: DiscordAppContext + 'static> {
    ctx: Arc<C>,
    config: DiscordConfig,
    songbird: Arc<Songbird>,
}

impl<C: DiscordAppContext + 'static> DiscordAdapter<C> {
    /// `songbird` must be the same manager the voice transport was built on.
    pub fn new(config: &DiscordConfig, ctx: Arc<C>, songbird: Arc<Songbird>) -> Result<Self, DiscordError> {
        if config.bot_token.trim().is_empty() {
            return Err(DiscordError::NoToken);
        }
        Ok(Self {
            ctx,
            config: config.clone(),
            songbird,
        })
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Returns once `shutdown` flips to `true`, after every shard has been
    /// shut down.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

        loop {
            let mut client = loop {
                match self.build_client(intents).await {
                    Ok(c) => break c,
                    Err(e) => {
                        error!(code = e.code(), "Discord: connect failed ({e}), retrying in 30s");
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_secs(30)) => {}
                            _ = shutdown_requested(&mut shutdown) => return,
                        }
                    }
                }
            };

            info!("Discord: gateway connecting");
            let shard_manager = Arc::clone(&client.shard_manager);
            tokio::select! {
                result = client.start() => match result {
                    Err(e) => {
                        let e = DiscordError::from(e);
                        warn!(code = e.code(), "Discord: gateway error ({e}), reconnecting in 5s");
                    }
                    Ok(()) => info!("Discord: gateway stopped, reconnecting in 5s"),
                },
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Discord: shutting down shards");
                    shard_manager.shutdown_all().await;
                    return;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                _ = shutdown_requested(&mut shutdown) => return,
            }
        }
    }

    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, DiscordError> {
        let handler = DiscordHandler {
            ctx: Arc::clone(&self.ctx),
            main_guild: self.config.guild_id.filter(|&id| id != 0).map(GuildId::new),
        };

        let client = Client::builder(&self.config.bot_token, intents)
            .event_handler(handler)
            .register_songbird_with(Arc::clone(&self.songbird))
            .await?;
        Ok(client)
    }
}

/// Resolves once the shutdown flag is set or its sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
