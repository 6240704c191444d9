//! Entry points used by the command surface.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chime_core::{
    Artifact, ChannelId, DeliveryTarget, GuildId, Interval, OwnerId, Reminder, ReminderSummary,
};
use chime_tts::ArtifactProvider;
use chime_voice::{PlaybackEngine, PlaybackOutcome, SessionManager};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    error::{ReminderError, Result},
    janitor::remove_artifact,
    registry::ReminderRegistry,
};

pub struct ReminderService {
    registry: Arc<ReminderRegistry>,
    sessions: Arc<SessionManager>,
    playback: Arc<PlaybackEngine>,
    provider: Arc<dyn ArtifactProvider>,
    validation_timeout: Duration,
}

impl ReminderService {
    pub fn new(
        registry: Arc<ReminderRegistry>,
        sessions: Arc<SessionManager>,
        playback: Arc<PlaybackEngine>,
        provider: Arc<dyn ArtifactProvider>,
        validation_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            sessions,
            playback,
            provider,
            validation_timeout,
        }
    }

    /// Create or replace `owner`'s reminder.
    ///
    /// The message is synthesized and played once in `channel` before the
    /// reminder is stored; if that test playback fails nothing is stored and
    /// any existing reminder stays in place. `channel` is `None` when the
    /// owner is not in a voice channel.
    pub async fn set_reminder(
        &self,
        owner: OwnerId,
        guild: GuildId,
        channel: Option<ChannelId>,
        interval_text: &str,
        message: &str,
    ) -> Result<ReminderSummary> {
        let interval = Interval::parse(interval_text)?;
        let channel = channel.ok_or(ReminderError::NotInVoiceChannel)?;

        let session = self.sessions.ensure_connected(guild, channel).await?;
        let artifact = self.provider.synthesize(message, owner).await?;

        match self
            .playback
            .verify(&session, &artifact.path, self.validation_timeout)
            .await
        {
            PlaybackOutcome::Completed => {}
            PlaybackOutcome::TimedOut => {
                warn!(owner = %owner, guild = %guild, "test playback hit the ceiling, accepting reminder");
            }
            PlaybackOutcome::Failed(reason) => {
                // The file may have overwritten a live reminder's artifact;
                // removing it makes that reminder regenerate its own message.
                remove_artifact(&artifact.path).await;
                return Err(ReminderError::PlaybackTestFailed(reason));
            }
        }

        let reminder = Reminder::new(
            owner,
            DeliveryTarget { guild, channel },
            message,
            interval_text.trim(),
            interval,
            artifact,
            Utc::now(),
        );
        let summary = reminder.summary();
        let new_path = reminder.artifact.path.clone();

        if let Some(previous) = self.registry.upsert(reminder) {
            release_artifact(&previous.artifact, Some(&new_path)).await;
            info!(owner = %owner, "replaced existing reminder");
        }
        info!(owner = %owner, guild = %guild, channel = %channel, interval_secs = interval.as_secs(), "reminder set");
        Ok(summary)
    }

    /// Cancel `owner`'s reminder and delete its artifact.
    pub async fn cancel_reminder(&self, owner: OwnerId) -> Result<Reminder> {
        let removed = self.registry.remove(owner)?;
        release_artifact(&removed.artifact, None).await;
        info!(owner = %owner, "reminder cancelled");
        Ok(removed)
    }

    pub fn list_reminder(&self, owner: OwnerId) -> Result<ReminderSummary> {
        self.registry.get(owner).map(|r| r.summary())
    }
}

/// Delete a retired artifact unless the live reminder now uses the same file.
async fn release_artifact(artifact: &Artifact, keep: Option<&Path>) {
    if keep != Some(artifact.path.as_path()) {
        remove_artifact(&artifact.path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, CHANNEL, GUILD};
    use chime_voice::mock::ConnectBehavior;

    const OWNER: OwnerId = OwnerId(42);

    #[tokio::test(start_paused = true)]
    async fn remind_in_voice_channel_validates_and_stores() {
        let h = Harness::new();
        let before = Utc::now();

        let summary = h
            .service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "30 min", "drink water")
            .await
            .unwrap();
        let after = Utc::now();

        assert_eq!(summary.message, "drink water");
        assert_eq!(summary.interval_text, "30 min");
        assert_eq!(summary.interval.as_secs(), 1800);
        let half_hour = chrono::Duration::seconds(1800);
        assert!(summary.next_due >= before + half_hour && summary.next_due <= after + half_hour);

        assert_eq!(h.transport.connected_channel(GUILD), Some(CHANNEL));
        assert_eq!(h.transport.play_calls(), 1);
        let stored = h.registry.get(OWNER).unwrap();
        assert_eq!(stored.target.channel, CHANNEL);
        assert!(stored.artifact.path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_interval_is_rejected_before_any_work() {
        let h = Harness::new();

        for text in ["bad input", "100000000000 hours"] {
            let err = h
                .service
                .set_reminder(OWNER, GUILD, Some(CHANNEL), text, "x")
                .await
                .unwrap_err();
            assert!(matches!(err, ReminderError::InvalidInterval(_)), "{text}");
        }

        assert!(h.registry.is_empty());
        assert_eq!(h.transport.connect_calls(), 0);
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn owner_outside_voice_is_rejected() {
        let h = Harness::new();

        let err = h
            .service
            .set_reminder(OWNER, GUILD, None, "1 hour", "x")
            .await
            .unwrap_err();

        assert!(matches!(err, ReminderError::NotInVoiceChannel));
        assert!(h.registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn connection_exhaustion_stores_nothing() {
        let h = Harness::new();
        h.transport.script_connects([ConnectBehavior::Fail; 3]);

        let err = h
            .service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "5 min", "x")
            .await
            .unwrap_err();

        assert!(matches!(err, ReminderError::ConnectionExhausted { attempts: 3, .. }));
        assert_eq!(h.provider.calls(), 0);
        assert!(h.registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_test_playback_keeps_previous_reminder() {
        let h = Harness::new();
        h.service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "5 min", "first")
            .await
            .unwrap();
        let first = h.registry.get(OWNER).unwrap();

        h.transport.set_track_duration(std::time::Duration::ZERO);
        let err = h
            .service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "1 hour", "second")
            .await
            .unwrap_err();

        assert!(matches!(err, ReminderError::PlaybackTestFailed(_)));
        assert_eq!(err.code(), "PLAYBACK_TEST_FAILED");
        let live = h.registry.get(OWNER).unwrap();
        assert_eq!(live.id, first.id);
        assert_eq!(live.message, "first");
        // The overwritten file is gone so delivery regenerates "first".
        assert!(!live.artifact.path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn second_reminder_replaces_the_first() {
        let h = Harness::new();
        h.service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "5 min", "first")
            .await
            .unwrap();
        h.service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "2 hours", "second")
            .await
            .unwrap();

        assert_eq!(h.registry.len(), 1);
        let live = h.registry.get(OWNER).unwrap();
        assert_eq!(live.message, "second");
        assert_eq!(live.interval.as_secs(), 7200);
        assert_eq!(std::fs::read_to_string(&live.artifact.path).unwrap(), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_without_reminder_is_not_found() {
        let h = Harness::new();
        h.service
            .set_reminder(OwnerId(1), GUILD, Some(CHANNEL), "5 min", "other")
            .await
            .unwrap();

        let err = h.service.cancel_reminder(OWNER).await.unwrap_err();

        assert!(matches!(err, ReminderError::NotFound { owner } if owner == OWNER));
        assert_eq!(h.registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_removes_entry_and_artifact() {
        let h = Harness::new();
        h.service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "5 min", "bye")
            .await
            .unwrap();
        let path = h.registry.get(OWNER).unwrap().artifact.path;

        let removed = h.service.cancel_reminder(OWNER).await.unwrap();

        assert_eq!(removed.message, "bye");
        assert!(h.registry.is_empty());
        assert!(!path.exists());
        assert!(matches!(h.service.list_reminder(OWNER), Err(ReminderError::NotFound { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn list_returns_summary() {
        let h = Harness::new();
        h.service
            .set_reminder(OWNER, GUILD, Some(CHANNEL), "1 Hour", "stretch")
            .await
            .unwrap();

        let summary = h.service.list_reminder(OWNER).unwrap();

        assert_eq!(summary.message, "stretch");
        assert_eq!(summary.interval_text, "1 Hour");
        assert_eq!(summary.describe_next(summary.next_due - chrono::Duration::minutes(59)), "Next reminder in 59 minutes");
    }
}
