use std::fmt;

/// Lifecycle of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Stopped => "stopped",
            SchedulerState::Running => "running",
        };
        write!(f, "{s}")
    }
}

/// How a successful delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Played to the end.
    Delivered,
    /// Force-stopped at the playback ceiling; still rescheduled.
    TimedOut,
}

/// Per-tick accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entries in the due snapshot.
    pub due: usize,
    pub delivered: usize,
    pub timed_out: usize,
    /// Not attempted this tick: superseded, or the artifact could not be
    /// regenerated. Next-due is unchanged.
    pub skipped: usize,
    /// Connection or playback failed. Next-due is unchanged.
    pub failed: usize,
}

impl TickReport {
    pub fn rescheduled(&self) -> usize {
        self.delivered + self.timed_out
    }
}
