use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtsError {
    /// The speech service could not produce audio for the text.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// ffmpeg did not produce a wav and the mp3 fallback is disabled.
    #[error("Transcoding failed: {0}")]
    TranscodeFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TtsError {
    pub fn code(&self) -> &'static str {
        match self {
            TtsError::SynthesisFailed(_) => "SYNTHESIS_FAILED",
            TtsError::TranscodeFailed(_) => "TRANSCODE_FAILED",
            TtsError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
