use std::sync::Arc;

use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::{Context, EventHandler};
use tracing::info;

use crate::context::DiscordAppContext;

/// Serenity event handler wired to the reminder core.
pub struct DiscordHandler<C: DiscordAppContext + 'static> {
    pub ctx: Arc<C>,
    /// Guild that gets the commands registered directly (visible at once).
    pub main_guild: Option<GuildId>,
}

#[async_trait]
impl<C: DiscordAppContext + 'static> EventHandler for DiscordHandler<C> {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            name = %ready.user.name,
            guilds = ready.guilds.len(),
            "Discord bot connected"
        );

        if let Some(gid) = self.main_guild {
            crate::commands::register_commands(&ctx, Some(gid)).await;
        }
        crate::commands::register_commands(&ctx, None).await;

        // Reminders need a live gateway for voice; start ticking only now.
        self.ctx.scheduler().start();
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            crate::commands::handle_interaction(&self.ctx, &ctx, &command).await;
        }
    }
}
