use std::sync::Arc;
use std::time::Duration;

use chime_core::ChimeConfig;
use chime_discord::DiscordAppContext;
use chime_scheduler::{
    sweep_stale_artifacts, Deliverer, ReminderRegistry, ReminderService, SchedulerEngine,
    SweepReport,
};
use chime_tts::ArtifactProvider;
use chime_voice::{ConnectPolicy, PlaybackEngine, PlaybackPolicy, SessionManager, VoiceTransport};
use tracing::info;

/// Central shared state, handed as `Arc<AppState>` to the Discord handler.
pub struct AppState {
    pub config: ChimeConfig,
    pub registry: Arc<ReminderRegistry>,
    pub sessions: Arc<SessionManager>,
    pub reminders: ReminderService,
    pub scheduler: SchedulerEngine,
}

impl AppState {
    pub fn new(
        config: ChimeConfig,
        transport: Arc<dyn VoiceTransport>,
        provider: Arc<dyn ArtifactProvider>,
    ) -> Self {
        let registry = Arc::new(ReminderRegistry::new());
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&transport),
            ConnectPolicy::from(&config.voice),
        ));
        let playback = Arc::new(PlaybackEngine::new(
            transport,
            PlaybackPolicy::from(&config.voice),
        ));
        let timeout = config.voice.playback_timeout();

        let reminders = ReminderService::new(
            Arc::clone(&registry),
            Arc::clone(&sessions),
            Arc::clone(&playback),
            Arc::clone(&provider),
            timeout,
        );
        let deliverer = Arc::new(Deliverer::new(
            Arc::clone(&registry),
            Arc::clone(&sessions),
            playback,
            provider,
            timeout,
        ));
        let scheduler = SchedulerEngine::new(Arc::clone(&registry), deliverer, config.scheduler.tick());

        Self {
            config,
            registry,
            sessions,
            reminders,
            scheduler,
        }
    }

    /// Stop ticking, leave every voice channel, forget all reminders and
    /// remove every artifact on disk.
    pub async fn shutdown(&self) -> SweepReport {
        self.scheduler.stop().await;
        self.sessions.disconnect_all().await;

        let dropped = self.registry.drain().len();
        let report = sweep_stale_artifacts(&self.config.tts.artifact_dir, Duration::ZERO).await;
        info!(
            reminders = dropped,
            removed = report.removed,
            failed = report.failed,
            "shutdown cleanup complete"
        );
        report
    }
}

impl DiscordAppContext for AppState {
    fn reminders(&self) -> &ReminderService {
        &self.reminders
    }

    fn scheduler(&self) -> &SchedulerEngine {
        &self.scheduler
    }
}
