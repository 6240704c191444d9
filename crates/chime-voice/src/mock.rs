//! Scriptable in-memory [`VoiceTransport`] for tests.
//!
//! Tracks play for a fixed virtual duration measured on tokio's clock, so
//! tests run under `start_paused = true` finish instantly.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chime_core::{ChannelId, GuildId};
use tokio::time::Instant;

use crate::{
    error::VoiceError,
    transport::{PlaybackSource, VoiceTransport},
    types::{ConnectOptions, PlaybackOptions},
};

/// Outcome of the next scripted connect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    Fail,
    /// Report success but leave the guild disconnected.
    SucceedThenDrop,
}

#[derive(Default)]
struct MockState {
    connect_script: VecDeque<ConnectBehavior>,
    connected: HashMap<GuildId, ChannelId>,
    tracks: HashMap<GuildId, Track>,
    played: Vec<PathBuf>,
    connect_calls: usize,
    disconnect_calls: usize,
    stop_calls: usize,
    overlapping_plays: usize,
}

struct Track {
    started: Instant,
    duration: Duration,
    stopped: bool,
}

impl Track {
    fn is_active(&self) -> bool {
        !self.stopped && self.started.elapsed() < self.duration
    }
}

pub struct MockTransport {
    state: Mutex<MockState>,
    track_duration: Mutex<Duration>,
    fail_plays: Mutex<bool>,
    released: Arc<AtomicUsize>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            track_duration: Mutex::new(Duration::from_secs(3)),
            fail_plays: Mutex::new(false),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue outcomes for upcoming connect calls; unscripted calls succeed.
    pub fn script_connects(&self, behaviors: impl IntoIterator<Item = ConnectBehavior>) {
        self.lock().connect_script.extend(behaviors);
    }

    /// Virtual length of every subsequently played track. Zero means the
    /// track never reports playing.
    pub fn set_track_duration(&self, duration: Duration) {
        *self.track_duration.lock().unwrap_or_else(PoisonError::into_inner) = duration;
    }

    pub fn set_fail_plays(&self, fail: bool) {
        *self.fail_plays.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Simulate the remote side dropping the connection.
    pub fn drop_connection(&self, guild: GuildId) {
        let mut state = self.lock();
        state.connected.remove(&guild);
        state.tracks.remove(&guild);
    }

    pub fn connected_channel(&self, guild: GuildId) -> Option<ChannelId> {
        self.lock().connected.get(&guild).copied()
    }

    pub fn connect_calls(&self) -> usize {
        self.lock().connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.lock().disconnect_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.lock().stop_calls
    }

    pub fn play_calls(&self) -> usize {
        self.lock().played.len()
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.lock().played.clone()
    }

    /// Plays submitted while another track in the same guild was still active.
    pub fn overlapping_plays(&self) -> usize {
        self.lock().overlapping_plays
    }

    /// Sources whose `release` has run.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MockSource {
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl PlaybackSource for MockSource {
    async fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoiceTransport for MockTransport {
    async fn connect(
        &self,
        guild: GuildId,
        channel: ChannelId,
        _options: &ConnectOptions,
    ) -> Result<(), VoiceError> {
        let mut state = self.lock();
        state.connect_calls += 1;
        let behavior = state
            .connect_script
            .pop_front()
            .unwrap_or(ConnectBehavior::Succeed);
        match behavior {
            ConnectBehavior::Succeed => {
                state.connected.insert(guild, channel);
                Ok(())
            }
            ConnectBehavior::SucceedThenDrop => {
                state.connected.remove(&guild);
                Ok(())
            }
            ConnectBehavior::Fail => Err(VoiceError::ConnectionFailed("scripted failure".into())),
        }
    }

    async fn is_connected(&self, guild: GuildId) -> bool {
        self.lock().connected.contains_key(&guild)
    }

    async fn is_playing(&self, guild: GuildId) -> bool {
        self.lock().tracks.get(&guild).is_some_and(Track::is_active)
    }

    async fn play(
        &self,
        guild: GuildId,
        artifact: &Path,
        _options: &PlaybackOptions,
    ) -> Result<Box<dyn PlaybackSource>, VoiceError> {
        if *self.fail_plays.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(VoiceError::PlaybackFailed("scripted failure".into()));
        }
        let duration = *self.track_duration.lock().unwrap_or_else(PoisonError::into_inner);

        let mut state = self.lock();
        if !state.connected.contains_key(&guild) {
            return Err(VoiceError::NotConnected { guild });
        }
        if state.tracks.get(&guild).is_some_and(Track::is_active) {
            state.overlapping_plays += 1;
        }
        state.played.push(artifact.to_path_buf());
        state.tracks.insert(
            guild,
            Track {
                started: Instant::now(),
                duration,
                stopped: false,
            },
        );
        Ok(Box::new(MockSource {
            released: Arc::clone(&self.released),
        }))
    }

    async fn stop(&self, guild: GuildId) {
        let mut state = self.lock();
        state.stop_calls += 1;
        if let Some(track) = state.tracks.get_mut(&guild) {
            track.stopped = true;
        }
    }

    async fn disconnect(&self, guild: GuildId) -> Result<(), VoiceError> {
        let mut state = self.lock();
        state.disconnect_calls += 1;
        state.connected.remove(&guild);
        state.tracks.remove(&guild);
        Ok(())
    }
}
