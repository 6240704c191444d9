use std::path::Path;

use async_trait::async_trait;
use chime_core::{ChannelId, GuildId};

use crate::{
    error::VoiceError,
    types::{ConnectOptions, PlaybackOptions},
};

/// Interface to the voice library that actually streams audio.
///
/// Every guild has at most one connection, so all operations are keyed by
/// guild. Implementations must be `Send + Sync` so one transport can be shared
/// by the scheduler loop and every command handler.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Join `channel` in `guild`, replacing any existing connection there.
    async fn connect(
        &self,
        guild: GuildId,
        channel: ChannelId,
        options: &ConnectOptions,
    ) -> Result<(), VoiceError>;

    /// Whether the guild currently has a live voice connection.
    async fn is_connected(&self, guild: GuildId) -> bool;

    /// Whether a submitted source is still producing audio.
    async fn is_playing(&self, guild: GuildId) -> bool;

    /// Submit `artifact` for playback and return a handle to the source.
    ///
    /// Callers guarantee that nothing else is playing in the guild.
    async fn play(
        &self,
        guild: GuildId,
        artifact: &Path,
        options: &PlaybackOptions,
    ) -> Result<Box<dyn PlaybackSource>, VoiceError>;

    /// Stop whatever is playing. No-op when idle.
    async fn stop(&self, guild: GuildId);

    /// Leave the voice channel. Succeeds when already disconnected.
    async fn disconnect(&self, guild: GuildId) -> Result<(), VoiceError>;
}

/// A submitted audio source.
///
/// `release` is always called exactly once when a playback ends, whether it
/// finished, timed out or was preempted. Sources that hold no resources keep
/// the default no-op.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn release(&mut self) {}
}
