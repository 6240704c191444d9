/// Failures of the Discord front end.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("no bot token configured (set discord.bot_token or DISCORD_TOKEN)")]
    NoToken,

    #[error("Discord client error: {0}")]
    Client(#[from] serenity::Error),
}

impl DiscordError {
    /// Short error code string used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            DiscordError::NoToken => "NO_TOKEN",
            DiscordError::Client(_) => "CLIENT_ERROR",
        }
    }
}
