//! Speech via the Google Translate TTS endpoint.
//!
//! The endpoint accepts at most ~100 characters per request, so longer text
//! is split on word boundaries and the returned mp3 frames are concatenated
//! into one file. The mp3 is then transcoded to wav; when that fails the mp3
//! itself is kept (if allowed) and reported with its real format.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chime_core::config::TtsConfig;
use chime_core::{Artifact, ArtifactFormat, OwnerId};
use tracing::{debug, info, warn};

use crate::error::{Result, TtsError};
use crate::ffmpeg::transcode_to_wav;
use crate::provider::ArtifactProvider;

pub const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Maximum characters per TTS request.
const CHUNK_MAX: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) chime";

pub struct GoogleTtsProvider {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    artifact_dir: PathBuf,
    ffmpeg_path: String,
    transcode: bool,
    mp3_fallback: bool,
}

impl GoogleTtsProvider {
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TtsError::SynthesisFailed(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: config.language.clone(),
            artifact_dir: config.artifact_dir.clone(),
            ffmpeg_path: config.ffmpeg_path.clone(),
            transcode: config.transcode,
            mp3_fallback: config.mp3_fallback,
        })
    }

    /// Point the provider at a different TTS endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request(&self, chunk: &str, idx: usize, total: usize) -> reqwest::RequestBuilder {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        self.client.get(&self.endpoint).query(&[
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("tl", self.language.as_str()),
            ("q", chunk),
            ("idx", idx.as_str()),
            ("total", total.as_str()),
            ("textlen", textlen.as_str()),
        ])
    }

    async fn fetch_mp3(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = split_chunks(text);
        if chunks.is_empty() {
            return Err(TtsError::SynthesisFailed("nothing to say".to_string()));
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let resp = self
                .request(chunk, idx, chunks.len())
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| TtsError::SynthesisFailed(e.to_string()))?;
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| TtsError::SynthesisFailed(e.to_string()))?;
            debug!(chunk = idx, bytes = bytes.len(), "received speech chunk");
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(TtsError::SynthesisFailed("empty audio response".to_string()));
        }
        Ok(audio)
    }

    /// Turn the freshly written mp3 into the final artifact.
    async fn finalize(&self, mp3: Artifact, owner: OwnerId) -> Result<Artifact> {
        if !self.transcode {
            return Ok(mp3);
        }

        let wav = Artifact::for_owner(&self.artifact_dir, owner, ArtifactFormat::Wav);
        match transcode_to_wav(&self.ffmpeg_path, &mp3.path, &wav.path).await {
            Ok(()) => {
                if let Err(e) = tokio::fs::remove_file(&mp3.path).await {
                    warn!(path = %mp3.path.display(), error = %e, "failed to remove intermediate mp3");
                }
                Ok(wav)
            }
            Err(e) if self.mp3_fallback => {
                warn!(owner = %owner, error = %e, "transcode failed, keeping mp3 artifact");
                Ok(mp3)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&mp3.path).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ArtifactProvider for GoogleTtsProvider {
    async fn synthesize(&self, text: &str, owner: OwnerId) -> Result<Artifact> {
        let audio = self.fetch_mp3(text).await?;

        tokio::fs::create_dir_all(&self.artifact_dir).await?;
        let mp3 = Artifact::for_owner(&self.artifact_dir, owner, ArtifactFormat::Mp3);
        tokio::fs::write(&mp3.path, &audio).await?;

        let artifact = self.finalize(mp3, owner).await?;
        info!(owner = %owner, path = %artifact.path.display(), format = %artifact.format, "artifact synthesized");
        Ok(artifact)
    }
}

/// Split `text` into chunks of at most [`CHUNK_MAX`] characters, preferring
/// whitespace boundaries so words are not cut in half.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text.trim();

    while remaining.chars().count() > CHUNK_MAX {
        let limit = remaining
            .char_indices()
            .nth(CHUNK_MAX)
            .map_or(remaining.len(), |(i, _)| i);
        let window = &remaining[..limit];
        let split_at = window
            .rfind(char::is_whitespace)
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(window[..split_at].trim_end().to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn provider(dir: &Path, transcode: bool, mp3_fallback: bool) -> GoogleTtsProvider {
        let config = TtsConfig {
            artifact_dir: dir.to_path_buf(),
            ffmpeg_path: "chime-test-no-such-ffmpeg".to_string(),
            transcode,
            mp3_fallback,
            ..TtsConfig::default()
        };
        GoogleTtsProvider::new(&config).unwrap()
    }

    fn write_mp3(dir: &Path, owner: OwnerId) -> Artifact {
        let mp3 = Artifact::for_owner(dir, owner, ArtifactFormat::Mp3);
        std::fs::write(&mp3.path, b"ID3 fake").unwrap();
        mp3
    }

    #[test]
    fn short_text_is_single_chunk() {
        assert_eq!(split_chunks("  drink water "), vec!["drink water"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_chunks("   ").is_empty());
    }

    #[test]
    fn long_text_splits_on_word_boundary() {
        let text = "word ".repeat(50);
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 3);
        for c in &chunks {
            assert!(c.chars().count() <= CHUNK_MAX, "chunk too large: {}", c.len());
            assert!(c.split(' ').all(|w| w == "word"));
        }
    }

    #[test]
    fn unbroken_text_still_splits_on_char_boundary() {
        let text = "é".repeat(250);
        let chunks = split_chunks(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn request_carries_language_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider(dir.path(), true, true);
        let req = p.request("drink water", 0, 1).build().unwrap();

        assert_eq!(req.url().host_str(), Some("translate.google.com"));
        let query: Vec<(String, String)> = req.url().query_pairs().into_owned().collect();
        assert!(query.contains(&("tl".into(), "en".into())));
        assert!(query.contains(&("q".into(), "drink water".into())));
        assert!(query.contains(&("client".into(), "tw-ob".into())));
        assert!(query.contains(&("textlen".into(), "11".into())));
    }

    #[test]
    fn endpoint_can_be_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider(dir.path(), true, true).with_endpoint("http://127.0.0.1:9/tts");
        let req = p.request("hi", 0, 1).build().unwrap();
        assert_eq!(req.url().path(), "/tts");
        assert_eq!(req.url().port(), Some(9));
    }

    #[tokio::test]
    async fn failed_transcode_falls_back_to_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider(dir.path(), true, true);
        let mp3 = write_mp3(dir.path(), OwnerId(7));

        let artifact = p.finalize(mp3.clone(), OwnerId(7)).await.unwrap();

        assert_eq!(artifact, mp3);
        assert_eq!(artifact.format, ArtifactFormat::Mp3);
        assert!(artifact.path.exists());
    }

    #[tokio::test]
    async fn failed_transcode_without_fallback_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider(dir.path(), true, false);
        let mp3 = write_mp3(dir.path(), OwnerId(7));

        let err = p.finalize(mp3.clone(), OwnerId(7)).await.unwrap_err();

        assert!(matches!(err, TtsError::TranscodeFailed(_)));
        assert!(!mp3.path.exists());
    }

    #[tokio::test]
    async fn transcode_disabled_keeps_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider(dir.path(), false, false);
        let mp3 = write_mp3(dir.path(), OwnerId(9));

        let artifact = p.finalize(mp3.clone(), OwnerId(9)).await.unwrap();
        assert_eq!(artifact.format, ArtifactFormat::Mp3);
    }
}
