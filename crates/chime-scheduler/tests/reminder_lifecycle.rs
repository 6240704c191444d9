//! End-to-end reminder lifecycle against the in-memory voice transport.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chime_core::{Artifact, ArtifactFormat, ChannelId, GuildId, OwnerId};
use chime_scheduler::{
    sweep_stale_artifacts, Deliverer, ReminderError, ReminderRegistry, ReminderService,
    SchedulerEngine,
};
use chime_tts::{ArtifactProvider, TtsError};
use chime_voice::mock::MockTransport;
use chime_voice::{ConnectPolicy, PlaybackEngine, PlaybackPolicy, SessionManager};

struct FileProvider {
    dir: PathBuf,
}

#[async_trait]
impl ArtifactProvider for FileProvider {
    async fn synthesize(&self, text: &str, owner: OwnerId) -> Result<Artifact, TtsError> {
        let artifact = Artifact::for_owner(&self.dir, owner, ArtifactFormat::Mp3);
        tokio::fs::write(&artifact.path, text).await?;
        Ok(artifact)
    }
}

#[tokio::test(start_paused = true)]
async fn remind_deliver_cancel_and_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(MockTransport::new());
    let provider = Arc::new(FileProvider {
        dir: dir.path().to_path_buf(),
    });
    let registry = Arc::new(ReminderRegistry::new());
    let sessions = Arc::new(SessionManager::new(transport.clone(), ConnectPolicy::default()));
    let playback = Arc::new(PlaybackEngine::new(transport.clone(), PlaybackPolicy::default()));
    let timeout = Duration::from_secs(30);

    let service = ReminderService::new(
        registry.clone(),
        sessions.clone(),
        playback.clone(),
        provider.clone(),
        timeout,
    );
    let deliverer = Arc::new(Deliverer::new(
        registry.clone(),
        sessions.clone(),
        playback,
        provider,
        timeout,
    ));
    let engine = SchedulerEngine::new(registry.clone(), deliverer, Duration::from_secs(60));

    let owner = OwnerId(11);
    let guild = GuildId(5);
    service
        .set_reminder(owner, guild, Some(ChannelId(6)), "30 min", "drink water")
        .await
        .unwrap();
    let stored = registry.get(owner).unwrap();
    assert_eq!(stored.artifact.format, ArtifactFormat::Mp3);

    // Bot gets kicked and the artifact vanishes before the reminder is due.
    transport.drop_connection(guild);
    std::fs::remove_file(&stored.artifact.path).unwrap();

    let tick_at = stored.next_due + chrono::Duration::seconds(5);
    let report = engine.tick(tick_at).await;
    assert_eq!(report.delivered, 1);
    assert_eq!(transport.connect_calls(), 2);
    assert_eq!(transport.play_calls(), 2);
    assert_eq!(
        std::fs::read_to_string(&stored.artifact.path).unwrap(),
        "drink water"
    );
    assert_eq!(
        registry.get(owner).unwrap().next_due,
        tick_at + chrono::Duration::minutes(30)
    );

    service.cancel_reminder(owner).await.unwrap();
    assert!(matches!(
        service.cancel_reminder(owner).await,
        Err(ReminderError::NotFound { .. })
    ));

    // Shutdown path: disconnect everything, then sweep unconditionally.
    sessions.disconnect_all().await;
    assert!(transport.connected_channel(guild).is_none());
    std::fs::write(dir.path().join("reminder_99.wav"), b"orphan").unwrap();
    let sweep = sweep_stale_artifacts(dir.path(), Duration::ZERO).await;
    assert_eq!(sweep.removed, 1);
}
