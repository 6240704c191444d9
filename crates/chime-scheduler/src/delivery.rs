//! Delivery of one due reminder: artifact check, connect, play, reschedule.

use std::sync::Arc;
use std::time::Duration;

use chime_core::{Artifact, Reminder};
use chime_tts::ArtifactProvider;
use chime_voice::{PlaybackEngine, PlaybackOutcome, SessionManager};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    error::{ReminderError, Result},
    janitor::remove_artifact,
    registry::ReminderRegistry,
    types::DeliveryOutcome,
};

pub struct Deliverer {
    registry: Arc<ReminderRegistry>,
    sessions: Arc<SessionManager>,
    playback: Arc<PlaybackEngine>,
    provider: Arc<dyn ArtifactProvider>,
    playback_timeout: Duration,
}

impl Deliverer {
    pub fn new(
        registry: Arc<ReminderRegistry>,
        sessions: Arc<SessionManager>,
        playback: Arc<PlaybackEngine>,
        provider: Arc<dyn ArtifactProvider>,
        playback_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            sessions,
            playback,
            provider,
            playback_timeout,
        }
    }

    /// Speak `reminder` into its channel and move it to `now + interval`.
    ///
    /// On any error next-due is left as it was, so the entry is retried on
    /// the next tick. A playback that hits the ceiling is force-stopped and
    /// still rescheduled.
    pub async fn deliver(&self, reminder: &Reminder, now: DateTime<Utc>) -> Result<DeliveryOutcome> {
        let owner = reminder.owner;
        if !self.registry.is_current(owner, reminder.id) {
            return Err(ReminderError::NotFound { owner });
        }

        let artifact = self.ensure_artifact(reminder).await?;

        let target = reminder.target;
        let session = self
            .sessions
            .ensure_connected(target.guild, target.channel)
            .await?;

        let outcome = match self
            .playback
            .play(&session, &artifact.path, self.playback_timeout)
            .await
        {
            PlaybackOutcome::Completed => DeliveryOutcome::Delivered,
            PlaybackOutcome::TimedOut => {
                let e = ReminderError::DeliveryTimeout {
                    timeout_secs: self.playback_timeout.as_secs(),
                };
                warn!(owner = %owner, guild = %target.guild, code = e.code(), error = %e, "reminder playback cut short");
                DeliveryOutcome::TimedOut
            }
            PlaybackOutcome::Failed(reason) => return Err(ReminderError::PlaybackFailed(reason)),
        };

        let next_due = reminder
            .interval
            .next_after(now)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if self.registry.reschedule(owner, reminder.id, next_due) {
            info!(owner = %owner, guild = %target.guild, %next_due, "reminder delivered");
        } else {
            debug!(owner = %owner, "reminder replaced or cancelled during delivery");
        }
        Ok(outcome)
    }

    /// The reminder's artifact, regenerated once from its message if the
    /// file has gone missing.
    async fn ensure_artifact(&self, reminder: &Reminder) -> Result<Artifact> {
        let path = &reminder.artifact.path;
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(reminder.artifact.clone());
        }

        let owner = reminder.owner;
        let missing = ReminderError::ArtifactMissing(path.clone());
        warn!(owner = %owner, code = missing.code(), error = %missing, "regenerating reminder audio");

        let artifact = self.provider.synthesize(&reminder.message, owner).await?;
        if !self.registry.set_artifact(owner, reminder.id, artifact.clone()) {
            // The successor shares the file name; removing our output makes it
            // regenerate its own message.
            remove_artifact(&artifact.path).await;
            return Err(ReminderError::NotFound { owner });
        }
        Ok(artifact)
    }
}
