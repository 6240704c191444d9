use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICK_SECS: u64 = 60;
pub const DEFAULT_RETENTION_HOURS: u64 = 24;

/// Top-level config (chime.toml + CHIME_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub janitor: JanitorConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Falls back to the `DISCORD_TOKEN` env var when empty.
    #[serde(default)]
    pub bot_token: String,
    /// Main guild; slash commands are registered there instantly in addition
    /// to the global registration. Falls back to `MAIN_GUILD_ID`.
    #[serde(default)]
    pub guild_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between registry scans.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: DEFAULT_TICK_SECS,
        }
    }
}

impl SchedulerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }
}

/// Voice session and playback tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub connect_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Pause after a connect before trusting the reported connection state.
    pub settle_ms: u64,
    pub connect_timeout_secs: u64,
    /// Hard ceiling on one playback before it is force-stopped.
    pub playback_timeout_secs: u64,
    /// Pause after stopping an in-flight playback before starting the next.
    pub preempt_settle_ms: u64,
    pub poll_interval_ms: u64,
    /// How long a validation playback may take to report "playing".
    pub start_grace_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 3,
            retry_backoff_ms: 2_000,
            settle_ms: 1_000,
            connect_timeout_secs: 60,
            playback_timeout_secs: 30,
            preempt_settle_ms: 500,
            poll_interval_ms: 500,
            start_grace_ms: 500,
        }
    }
}

impl VoiceConfig {
    pub fn playback_timeout(&self) -> Duration {
        Duration::from_secs(self.playback_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Speech language code passed to the synthesizer.
    pub language: String,
    /// Directory artifacts are written to and swept from.
    pub artifact_dir: PathBuf,
    pub ffmpeg_path: String,
    /// Transcode synthesizer mp3 output to 48 kHz stereo wav.
    pub transcode: bool,
    /// Keep the mp3 when transcoding fails instead of failing synthesis.
    pub mp3_fallback: bool,
    pub request_timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            artifact_dir: PathBuf::from("."),
            ffmpeg_path: "ffmpeg".to_string(),
            transcode: true,
            mp3_fallback: true,
            request_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Startup sweep removes artifacts older than this.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

impl JanitorConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }
}

fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}
fn default_retention_hours() -> u64 {
    DEFAULT_RETENTION_HOURS
}

impl ChimeConfig {
    /// Load config from a TOML file with CHIME_* env var overrides.
    ///
    /// Nested keys use a double underscore: `CHIME_VOICE__SETTLE_MS=1500`.
    /// Checks the explicit path first, then ~/.chime/chime.toml.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let mut config: ChimeConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CHIME_").split("__"))
            .extract()
            .map_err(|e| crate::error::ChimeError::Config(e.to_string()))?;

        config.apply_legacy_env();
        Ok(config)
    }

    /// Parse config from TOML text without touching the environment.
    pub fn from_toml_str(toml: &str) -> crate::error::Result<Self> {
        Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| crate::error::ChimeError::Config(e.to_string()))
    }

    /// `DISCORD_TOKEN` / `MAIN_GUILD_ID` from a `.env`-style deployment.
    pub fn apply_legacy_env(&mut self) {
        if self.discord.bot_token.is_empty() {
            if let Ok(token) = std::env::var("DISCORD_TOKEN") {
                self.discord.bot_token = token;
            }
        }
        if self.discord.guild_id.is_none() {
            match std::env::var("MAIN_GUILD_ID").map(|v| v.trim().parse::<u64>()) {
                Ok(Ok(id)) => self.discord.guild_id = Some(id),
                Ok(Err(e)) => tracing::warn!(error = %e, "MAIN_GUILD_ID is not a valid guild id"),
                Err(_) => {}
            }
        }
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.chime/chime.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let config = ChimeConfig::default();
        assert_eq!(config.scheduler.tick(), Duration::from_secs(60));
        assert_eq!(config.voice.connect_attempts, 3);
        assert_eq!(config.voice.retry_backoff_ms, 2_000);
        assert_eq!(config.voice.settle_ms, 1_000);
        assert_eq!(config.voice.playback_timeout(), Duration::from_secs(30));
        assert_eq!(config.janitor.retention(), Duration::from_secs(24 * 3600));
        assert!(config.tts.transcode);
        assert!(config.tts.mp3_fallback);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ChimeConfig::from_toml_str(
            r#"
            [discord]
            bot_token = "abc"
            guild_id = 1234

            [voice]
            playback_timeout_secs = 10

            [tts]
            artifact_dir = "/var/lib/chime"
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.bot_token, "abc");
        assert_eq!(config.discord.guild_id, Some(1234));
        assert_eq!(config.voice.playback_timeout_secs, 10);
        assert_eq!(config.voice.connect_attempts, 3);
        assert_eq!(config.tts.artifact_dir, PathBuf::from("/var/lib/chime"));
        assert_eq!(config.tts.language, "en");
        assert_eq!(config.scheduler.tick_secs, 60);
    }

    #[test]
    fn zero_tick_is_clamped() {
        let config = ChimeConfig::from_toml_str("[scheduler]\ntick_secs = 0\n").unwrap();
        assert_eq!(config.scheduler.tick(), Duration::from_secs(1));
    }
}
