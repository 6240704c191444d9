use std::path::PathBuf;

use chime_core::{GuildId, InvalidInterval, OwnerId};
use chime_tts::TtsError;
use chime_voice::VoiceError;
use thiserror::Error;

/// Errors surfaced by reminder setup and delivery.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    #[error("Owner is not in a voice channel")]
    NotInVoiceChannel,

    #[error("Could not connect to voice in guild {guild} after {attempts} attempts")]
    ConnectionExhausted { guild: GuildId, attempts: u32 },

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Transcoding failed: {0}")]
    TranscodeFailed(String),

    /// The validation playback at setup did not play.
    #[error("Playback test failed: {0}")]
    PlaybackTestFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Playback hit the hard ceiling and was force-stopped.
    #[error("Playback timed out after {timeout_secs}s")]
    DeliveryTimeout { timeout_secs: u64 },

    #[error("No active reminder for {owner}")]
    NotFound { owner: OwnerId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReminderError {
    /// Short error code string used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            ReminderError::InvalidInterval(_) => "INVALID_INTERVAL",
            ReminderError::NotInVoiceChannel => "NOT_IN_VOICE_CHANNEL",
            ReminderError::ConnectionExhausted { .. } => "CONNECTION_EXHAUSTED",
            ReminderError::SynthesisFailed(_) => "SYNTHESIS_FAILED",
            ReminderError::TranscodeFailed(_) => "TRANSCODE_FAILED",
            ReminderError::PlaybackTestFailed(_) => "PLAYBACK_TEST_FAILED",
            ReminderError::PlaybackFailed(_) => "PLAYBACK_FAILED",
            ReminderError::ArtifactMissing(_) => "ARTIFACT_MISSING",
            ReminderError::DeliveryTimeout { .. } => "DELIVERY_TIMEOUT",
            ReminderError::NotFound { .. } => "NOT_FOUND",
            ReminderError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<VoiceError> for ReminderError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::ConnectionExhausted { guild, attempts } => {
                ReminderError::ConnectionExhausted { guild, attempts }
            }
            other => ReminderError::PlaybackFailed(other.to_string()),
        }
    }
}

impl From<TtsError> for ReminderError {
    fn from(e: TtsError) -> Self {
        match e {
            TtsError::SynthesisFailed(msg) => ReminderError::SynthesisFailed(msg),
            TtsError::TranscodeFailed(msg) => ReminderError::TranscodeFailed(msg),
            TtsError::Io(e) => ReminderError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReminderError>;
