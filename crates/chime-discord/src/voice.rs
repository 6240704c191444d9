//! [`VoiceTransport`] backed by songbird.
//!
//! songbird mixes every source into 48 kHz stereo Opus and decodes wav and
//! mp3 through symphonia, so artifacts are handed over as plain files.

use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chime_core::{ChannelId, GuildId};
use chime_voice::{ConnectOptions, PlaybackOptions, PlaybackSource, VoiceError, VoiceTransport};
use dashmap::DashMap;
use songbird::error::JoinError;
use songbird::input::File as FileInput;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::Songbird;
use tracing::{debug, info, warn};

pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    /// Most recently submitted track per guild.
    tracks: DashMap<GuildId, TrackHandle>,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            tracks: DashMap::new(),
        }
    }

    fn call(&self, guild: GuildId) -> Option<Arc<tokio::sync::Mutex<songbird::Call>>> {
        self.manager.get(guild_key(guild).ok()?)
    }
}

fn guild_key(guild: GuildId) -> Result<songbird::id::GuildId, VoiceError> {
    NonZeroU64::new(guild.get())
        .map(songbird::id::GuildId::from)
        .ok_or_else(|| VoiceError::ConnectionFailed(format!("invalid guild id {guild}")))
}

fn channel_key(channel: ChannelId) -> Result<songbird::id::ChannelId, VoiceError> {
    NonZeroU64::new(channel.get())
        .map(songbird::id::ChannelId::from)
        .ok_or_else(|| VoiceError::ConnectionFailed(format!("invalid channel id {channel}")))
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(
        &self,
        guild: GuildId,
        channel: ChannelId,
        options: &ConnectOptions,
    ) -> Result<(), VoiceError> {
        let gid = guild_key(guild)?;
        let cid = channel_key(channel)?;
        debug!(guild = %guild, channel = %channel, reconnect = options.reconnect, "joining voice channel");

        let failure = match tokio::time::timeout(options.timeout, self.manager.join(gid, cid)).await {
            Ok(Ok(_call)) => {
                info!(guild = %guild, channel = %channel, "joined voice channel");
                return Ok(());
            }
            Ok(Err(e)) => VoiceError::ConnectionFailed(e.to_string()),
            Err(_) => VoiceError::Timeout {
                ms: options.timeout.as_millis() as u64,
            },
        };

        // A failed join can leave a half-initialised call behind.
        if let Err(e) = self.manager.remove(gid).await {
            debug!(guild = %guild, error = %e, "no call to clean up after failed join");
        }
        Err(failure)
    }

    async fn is_connected(&self, guild: GuildId) -> bool {
        match self.call(guild) {
            Some(call) => call.lock().await.current_connection().is_some(),
            None => false,
        }
    }

    async fn is_playing(&self, guild: GuildId) -> bool {
        let Some(handle) = self.tracks.get(&guild).map(|h| h.value().clone()) else {
            return false;
        };
        match handle.get_info().await {
            Ok(state) => matches!(state.playing, PlayMode::Play),
            Err(_) => false,
        }
    }

    async fn play(
        &self,
        guild: GuildId,
        artifact: &Path,
        options: &PlaybackOptions,
    ) -> Result<Box<dyn PlaybackSource>, VoiceError> {
        let call = self.call(guild).ok_or(VoiceError::NotConnected { guild })?;
        if !tokio::fs::try_exists(artifact).await.unwrap_or(false) {
            return Err(VoiceError::PlaybackFailed(format!(
                "artifact {} does not exist",
                artifact.display()
            )));
        }

        debug!(
            guild = %guild,
            artifact = %artifact.display(),
            sample_rate = options.sample_rate,
            channels = options.channels,
            "submitting track"
        );
        let input = FileInput::new(artifact.to_path_buf());
        let handle = call.lock().await.play_input(input.into());
        self.tracks.insert(guild, handle.clone());
        Ok(Box::new(SongbirdSource { handle }))
    }

    async fn stop(&self, guild: GuildId) {
        if let Some(call) = self.call(guild) {
            call.lock().await.stop();
        }
        self.tracks.remove(&guild);
    }

    async fn disconnect(&self, guild: GuildId) -> Result<(), VoiceError> {
        self.tracks.remove(&guild);
        match self.manager.remove(guild_key(guild)?).await {
            Ok(()) => {
                info!(guild = %guild, "left voice channel");
                Ok(())
            }
            Err(JoinError::NoCall) => Ok(()),
            Err(e) => {
                warn!(guild = %guild, error = %e, "failed to leave voice channel");
                Err(VoiceError::ConnectionFailed(e.to_string()))
            }
        }
    }
}

struct SongbirdSource {
    handle: TrackHandle,
}

#[async_trait]
impl PlaybackSource for SongbirdSource {
    async fn release(&mut self) {
        if let Err(e) = self.handle.stop() {
            debug!(error = %e, "track already ended");
        }
    }
}
