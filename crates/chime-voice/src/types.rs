use std::fmt;
use std::time::Duration;

/// Lifecycle of a guild's voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live connection (initial state, or after a disconnect / failed connect).
    Disconnected,
    /// A connect attempt is in progress.
    Connecting,
    /// Connected and not playing anything.
    IdleConnected,
    /// Connected with one source submitted.
    Playing,
}

impl SessionState {
    pub fn is_connected(self) -> bool {
        matches!(self, SessionState::IdleConnected | SessionState::Playing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::IdleConnected => "idle",
            SessionState::Playing => "playing",
        };
        write!(f, "{s}")
    }
}

/// Parameters for one transport-level connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub timeout: Duration,
    /// Let the transport re-establish a dropped connection on its own.
    pub reconnect: bool,
}

/// Fixed decode configuration for every submitted artifact.
///
/// Synthesized artifacts are not guaranteed to match the voice transport's
/// native format, so every source is resampled to 48 kHz stereo with any
/// non-audio streams dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub sample_rate: u32,
    pub channels: u16,
    pub strip_video: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            strip_video: true,
        }
    }
}

impl PlaybackOptions {
    /// The same settings expressed as ffmpeg output arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if self.strip_video {
            args.push("-vn".to_string());
        }
        args.extend([
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-ac".to_string(),
            self.channels.to_string(),
        ]);
        args
    }
}

/// Result of one playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The source finished on its own (or was preempted by a newer playback).
    Completed,
    /// The hard ceiling was reached and the source was force-stopped.
    TimedOut,
    /// Nothing was played.
    Failed(String),
}
