//! Shared fixtures for the scheduler's unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chime_core::{Artifact, ArtifactFormat, ChannelId, DeliveryTarget, GuildId, Interval, OwnerId, Reminder};
use chime_tts::{ArtifactProvider, TtsError};
use chime_voice::mock::MockTransport;
use chime_voice::{ConnectPolicy, PlaybackEngine, PlaybackPolicy, SessionManager};
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::{
    delivery::Deliverer, engine::SchedulerEngine, registry::ReminderRegistry,
    service::ReminderService,
};

pub const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(30);
pub const GUILD: GuildId = GuildId(100);
pub const CHANNEL: ChannelId = ChannelId(200);

/// Writes the message text into `reminder_<owner>.wav`.
pub struct MockProvider {
    dir: PathBuf,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockProvider {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtifactProvider for MockProvider {
    async fn synthesize(&self, text: &str, owner: OwnerId) -> Result<Artifact, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TtsError::SynthesisFailed("speech service unavailable".into()));
        }
        let artifact = Artifact::for_owner(&self.dir, owner, ArtifactFormat::Wav);
        tokio::fs::write(&artifact.path, text).await?;
        Ok(artifact)
    }
}

pub struct Harness {
    /// Keeps the artifact directory alive for the test.
    _dir: TempDir,
    pub transport: Arc<MockTransport>,
    pub provider: Arc<MockProvider>,
    pub registry: Arc<ReminderRegistry>,
    pub service: ReminderService,
    pub deliverer: Arc<Deliverer>,
    pub engine: SchedulerEngine,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        let provider = Arc::new(MockProvider::new(dir.path()));
        let registry = Arc::new(ReminderRegistry::new());
        let sessions = Arc::new(SessionManager::new(transport.clone(), ConnectPolicy::default()));
        let playback = Arc::new(PlaybackEngine::new(transport.clone(), PlaybackPolicy::default()));

        let service = ReminderService::new(
            registry.clone(),
            sessions.clone(),
            playback.clone(),
            provider.clone(),
            PLAYBACK_TIMEOUT,
        );
        let deliverer = Arc::new(Deliverer::new(
            registry.clone(),
            sessions,
            playback,
            provider.clone(),
            PLAYBACK_TIMEOUT,
        ));
        let engine = SchedulerEngine::new(registry.clone(), deliverer.clone(), Duration::from_secs(60));

        Self {
            _dir: dir,
            transport,
            provider,
            registry,
            service,
            deliverer,
            engine,
        }
    }

    /// Store a reminder for `owner` that falls due exactly at `due`, with its
    /// artifact already on disk.
    pub async fn seed(&self, owner: u64, guild: GuildId, interval: &str, due: DateTime<Utc>) -> Reminder {
        let owner = OwnerId(owner);
        let interval_value = Interval::parse(interval).unwrap();
        let artifact = self.provider.synthesize("stand up", owner).await.unwrap();
        let reminder = Reminder::new(
            owner,
            DeliveryTarget {
                guild,
                channel: CHANNEL,
            },
            "stand up",
            interval,
            interval_value,
            artifact,
            due - chrono::Duration::seconds(interval_value.as_secs() as i64),
        );
        self.registry.upsert(reminder.clone());
        reminder
    }
}
