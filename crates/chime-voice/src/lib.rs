//! `chime-voice`: one streaming-audio session per guild.
//!
//! - [`SessionManager`] owns the lazy connect / reconnect / disconnect
//!   lifecycle and hands out [`Session`]s.
//! - [`PlaybackEngine`] plays one artifact at a time on a session, waiting
//!   for natural completion or a hard timeout.
//! - [`VoiceTransport`] is the seam to the actual voice library.

pub mod error;
pub mod manager;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod playback;
pub mod transport;
pub mod types;

pub use error::VoiceError;
pub use manager::{ConnectPolicy, Session, SessionManager};
pub use playback::{PlaybackEngine, PlaybackPolicy};
pub use transport::{PlaybackSource, VoiceTransport};
pub use types::{ConnectOptions, PlaybackOptions, PlaybackOutcome, SessionState};
