use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chime_core::config::VoiceConfig;
use chime_core::GuildId;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::{
    manager::Session,
    transport::VoiceTransport,
    types::{PlaybackOptions, PlaybackOutcome, SessionState},
};

/// Timing for submitting and supervising one playback.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackPolicy {
    pub poll_interval: Duration,
    /// Pause after stopping an in-flight source before submitting a new one.
    pub preempt_settle: Duration,
    /// Validation playbacks must report "playing" within this window.
    pub start_grace: Duration,
    pub options: PlaybackOptions,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

impl From<&VoiceConfig> for PlaybackPolicy {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            preempt_settle: Duration::from_millis(config.preempt_settle_ms),
            start_grace: Duration::from_millis(config.start_grace_ms),
            options: PlaybackOptions::default(),
        }
    }
}

/// Plays one artifact at a time on a session.
///
/// Only the flow holding a session's playback gate may submit a source, so a
/// session never has two sources in flight. A flow that finds the session
/// playing stops the current source first (preemption) instead of queueing
/// behind it. The engine never touches the artifact file.
pub struct PlaybackEngine {
    transport: Arc<dyn VoiceTransport>,
    policy: PlaybackPolicy,
}

impl PlaybackEngine {
    pub fn new(transport: Arc<dyn VoiceTransport>, policy: PlaybackPolicy) -> Self {
        Self { transport, policy }
    }

    /// Play `artifact` and wait for it to finish, force-stopping after `timeout`.
    pub async fn play(&self, session: &Session, artifact: &Path, timeout: Duration) -> PlaybackOutcome {
        self.run(session, artifact, timeout, false).await
    }

    /// Like [`play`](Self::play), but fails unless the source is audibly
    /// playing shortly after submission. Used to validate a new reminder.
    pub async fn verify(&self, session: &Session, artifact: &Path, timeout: Duration) -> PlaybackOutcome {
        self.run(session, artifact, timeout, true).await
    }

    async fn run(
        &self,
        session: &Session,
        artifact: &Path,
        timeout: Duration,
        require_start: bool,
    ) -> PlaybackOutcome {
        let guild = session.guild();

        if !session.state().is_connected() {
            return PlaybackOutcome::Failed(format!("guild {guild} has no voice connection"));
        }

        self.preempt(guild).await;
        let _gate = session.playback_gate.lock().await;
        // Another flow may have started between the preempt and the gate.
        self.preempt(guild).await;

        if !self.transport.is_connected(guild).await {
            session.set_state(SessionState::Disconnected);
            return PlaybackOutcome::Failed(format!("guild {guild} lost its voice connection"));
        }

        session.set_state(SessionState::Playing);
        debug!(guild = %guild, artifact = %artifact.display(), "submitting audio source");

        let mut source = match self.transport.play(guild, artifact, &self.policy.options).await {
            Ok(source) => source,
            Err(e) => {
                warn!(guild = %guild, error = %e, "audio source rejected");
                self.settle_state(session).await;
                return PlaybackOutcome::Failed(e.to_string());
            }
        };

        let outcome = self.wait_for_completion(guild, timeout, require_start).await;

        source.release().await;
        self.settle_state(session).await;

        match &outcome {
            PlaybackOutcome::Completed => info!(guild = %guild, "audio playback completed"),
            PlaybackOutcome::TimedOut => warn!(guild = %guild, timeout_secs = timeout.as_secs(), "audio playback timed out, stopped"),
            PlaybackOutcome::Failed(reason) => warn!(guild = %guild, %reason, "audio playback failed"),
        }
        outcome
    }

    /// Stop an in-flight source and give the transport time to wind down.
    async fn preempt(&self, guild: GuildId) {
        if self.transport.is_playing(guild).await {
            info!(guild = %guild, "stopping current playback before starting a new one");
            self.transport.stop(guild).await;
            sleep(self.policy.preempt_settle).await;
        }
    }

    async fn wait_for_completion(
        &self,
        guild: GuildId,
        timeout: Duration,
        require_start: bool,
    ) -> PlaybackOutcome {
        let started = Instant::now();

        if require_start {
            sleep(self.policy.start_grace.min(timeout)).await;
            if !self.transport.is_playing(guild).await {
                return PlaybackOutcome::Failed("audio failed to start playing".to_string());
            }
        }

        loop {
            if !self.transport.is_playing(guild).await {
                return PlaybackOutcome::Completed;
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                self.transport.stop(guild).await;
                return PlaybackOutcome::TimedOut;
            }
            sleep(self.policy.poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Leave the session idle, or disconnected if the transport lost it.
    async fn settle_state(&self, session: &Session) {
        let state = if self.transport.is_connected(session.guild()).await {
            SessionState::IdleConnected
        } else {
            SessionState::Disconnected
        };
        session.set_state(state);
    }
}
