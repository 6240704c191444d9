use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chime_core::config::VoiceConfig;
use chime_core::{ChannelId, GuildId};
use dashmap::DashMap;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    error::VoiceError,
    transport::VoiceTransport,
    types::{ConnectOptions, SessionState},
};

/// Retry and settle timing for establishing a session.
#[derive(Debug, Clone, Copy)]
pub struct ConnectPolicy {
    pub attempts: u32,
    /// Pause between failed attempts.
    pub backoff: Duration,
    /// Pause after a transport-level success before re-checking the connection.
    pub settle: Duration,
    pub connect_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

impl From<&VoiceConfig> for ConnectPolicy {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            attempts: config.connect_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
            settle: Duration::from_millis(config.settle_ms),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

/// The voice session of one guild.
///
/// Owned by the [`SessionManager`]; the playback engine borrows it for one
/// playback at a time through the playback gate.
#[derive(Debug)]
pub struct Session {
    guild: GuildId,
    inner: Mutex<SessionInner>,
    /// Serializes connect attempts for this guild.
    connect_gate: tokio::sync::Mutex<()>,
    /// Held for the whole of one playback.
    pub(crate) playback_gate: tokio::sync::Mutex<()>,
}

#[derive(Debug)]
struct SessionInner {
    channel: ChannelId,
    state: SessionState,
}

impl Session {
    fn new(guild: GuildId, channel: ChannelId) -> Self {
        Self {
            guild,
            inner: Mutex::new(SessionInner {
                channel,
                state: SessionState::Disconnected,
            }),
            connect_gate: tokio::sync::Mutex::new(()),
            playback_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn channel(&self) -> ChannelId {
        self.lock().channel
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        let mut inner = self.lock();
        if inner.state != state {
            debug!(guild = %self.guild, from = %inner.state, to = %state, "session state");
            inner.state = state;
        }
    }

    fn set_channel(&self, channel: ChannelId) {
        self.lock().channel = channel;
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns one lazily-established voice session per guild.
///
/// Sessions are created on first use and reconnected whenever they are
/// found stale. Connects for the same guild are serialized; different guilds
/// connect independently.
pub struct SessionManager {
    transport: Arc<dyn VoiceTransport>,
    sessions: DashMap<GuildId, Arc<Session>>,
    policy: ConnectPolicy,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn VoiceTransport>, policy: ConnectPolicy) -> Self {
        Self {
            transport,
            sessions: DashMap::new(),
            policy,
        }
    }

    /// Return the guild's session if it exists.
    pub fn get(&self, guild: GuildId) -> Option<Arc<Session>> {
        self.sessions.get(&guild).map(|s| Arc::clone(s.value()))
    }

    /// Return a connected session for `guild` in `channel`.
    ///
    /// A healthy session in the right channel is reused as-is. Anything else
    /// is torn down and reconnected with up to `policy.attempts` tries.
    pub async fn ensure_connected(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Arc<Session>, VoiceError> {
        let session = Arc::clone(
            self.sessions
                .entry(guild)
                .or_insert_with(|| Arc::new(Session::new(guild, channel)))
                .value(),
        );

        let connecting = session.connect_gate.lock().await;

        if self.is_healthy(&session, channel).await {
            drop(connecting);
            return Ok(session);
        }

        if session.state() != SessionState::Disconnected {
            info!(guild = %guild, from = %session.channel(), to = %channel, "voice session is stale, reconnecting");
            // A playback in flight finishes or times out before its connection goes.
            let playing = session.playback_gate.lock().await;
            self.teardown(&session).await;
            drop(playing);
        }
        session.set_channel(channel);

        let connected = self.connect_with_retry(&session).await;
        drop(connecting);
        connected.map(|()| session)
    }

    /// Leave the voice channel. Safe to call on a disconnected session.
    pub async fn disconnect(&self, session: &Session) -> Result<(), VoiceError> {
        if session.state() == SessionState::Disconnected {
            return Ok(());
        }
        let result = self.transport.disconnect(session.guild()).await;
        session.set_state(SessionState::Disconnected);
        match &result {
            Ok(()) => info!(guild = %session.guild(), "voice session disconnected"),
            Err(e) => warn!(guild = %session.guild(), error = %e, "error while disconnecting voice session"),
        }
        result
    }

    /// Disconnect every session. Errors are logged and do not stop the rest.
    pub async fn disconnect_all(&self) {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for session in sessions {
            let _ = self.disconnect(&session).await;
        }
    }

    async fn is_healthy(&self, session: &Session, channel: ChannelId) -> bool {
        session.state().is_connected()
            && session.channel() == channel
            && self.transport.is_connected(session.guild()).await
    }

    /// Drop whatever connection the transport still holds for this guild.
    async fn teardown(&self, session: &Session) {
        if let Err(e) = self.transport.disconnect(session.guild()).await {
            warn!(guild = %session.guild(), error = %e, "failed to drop stale voice connection");
        }
        session.set_state(SessionState::Disconnected);
    }

    async fn connect_with_retry(&self, session: &Session) -> Result<(), VoiceError> {
        let guild = session.guild();
        let channel = session.channel();
        let options = ConnectOptions {
            timeout: self.policy.connect_timeout,
            reconnect: true,
        };

        for attempt in 1..=self.policy.attempts {
            session.set_state(SessionState::Connecting);

            match self.transport.connect(guild, channel, &options).await {
                Ok(()) => {
                    // Transports may report success and drop the connection a
                    // moment later; only trust it after the settle delay.
                    sleep(self.policy.settle).await;
                    if self.transport.is_connected(guild).await {
                        session.set_state(SessionState::IdleConnected);
                        info!(guild = %guild, channel = %channel, attempt, "voice session connected");
                        return Ok(());
                    }
                    warn!(guild = %guild, attempt, "voice connect reported success but session is not connected");
                    self.teardown(session).await;
                }
                Err(e) => {
                    warn!(
                        guild = %guild,
                        attempt,
                        max = self.policy.attempts,
                        error = %e,
                        "voice connect attempt failed"
                    );
                    session.set_state(SessionState::Disconnected);
                }
            }

            if attempt < self.policy.attempts {
                sleep(self.policy.backoff).await;
            }
        }

        warn!(guild = %guild, attempts = self.policy.attempts, "giving up on voice connection");
        Err(VoiceError::ConnectionExhausted {
            guild,
            attempts: self.policy.attempts,
        })
    }
}
