//! `chime-tts`: turns reminder text into a playable audio artifact.

pub mod error;
pub mod ffmpeg;
pub mod google;
pub mod provider;

pub use error::TtsError;
pub use ffmpeg::{probe_ffmpeg, transcode_to_wav};
pub use google::GoogleTtsProvider;
pub use provider::ArtifactProvider;
