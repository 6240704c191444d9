use chime_core::GuildId;
use thiserror::Error;

/// Errors that can occur while managing a voice session.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// A single connect attempt failed at the transport level.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Every connect attempt for a guild failed.
    #[error("Could not connect to voice in guild {guild} after {attempts} attempts")]
    ConnectionExhausted { guild: GuildId, attempts: u32 },

    /// The session is not connected to a voice channel.
    #[error("Not connected to voice in guild {guild}")]
    NotConnected { guild: GuildId },

    /// The transport refused to start a playback.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// An operation exceeded its allowed time budget.
    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },
}
