use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    delivery::Deliverer,
    error::ReminderError,
    registry::ReminderRegistry,
    types::{DeliveryOutcome, SchedulerState, TickReport},
};

struct TickLoop {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Periodic driver that delivers due reminders one after another.
///
/// Starts in [`SchedulerState::Stopped`]. [`start`](Self::start) spawns the
/// tick loop; [`stop`](Self::stop) lets an in-flight tick finish and then
/// ends the loop.
pub struct SchedulerEngine {
    registry: Arc<ReminderRegistry>,
    deliverer: Arc<Deliverer>,
    period: Duration,
    running: Mutex<Option<TickLoop>>,
}

impl SchedulerEngine {
    pub fn new(registry: Arc<ReminderRegistry>, deliverer: Arc<Deliverer>, period: Duration) -> Self {
        Self {
            registry,
            deliverer,
            period: period.max(Duration::from_secs(1)),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.lock().as_ref() {
            Some(_) => SchedulerState::Running,
            None => SchedulerState::Stopped,
        }
    }

    /// Spawn the tick loop. No-op while already running.
    pub fn start(&self) {
        let mut running = self.lock();
        if running.is_some() {
            debug!("scheduler already running");
            return;
        }

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run(
            Arc::clone(&self.registry),
            Arc::clone(&self.deliverer),
            self.period,
            rx,
        ));
        *running = Some(TickLoop { shutdown, task });
        info!(period_secs = self.period.as_secs(), "reminder scheduler started");
    }

    /// Signal the loop and wait for it to exit. No-op while stopped.
    pub async fn stop(&self) {
        let Some(tick_loop) = self.lock().take() else {
            return;
        };
        let _ = tick_loop.shutdown.send(true);
        if let Err(e) = tick_loop.task.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
        info!("reminder scheduler stopped");
    }

    /// Run one tick at `now` outside the loop.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        tick(&self.registry, &self.deliverer, now).await
    }

    fn lock(&self) -> MutexGuard<'_, Option<TickLoop>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run(
    registry: Arc<ReminderRegistry>,
    deliverer: Arc<Deliverer>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick(&registry, &deliverer, Utc::now()).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Deliver every entry due at `now`, sequentially. One entry's failure never
/// stops the rest.
async fn tick(registry: &ReminderRegistry, deliverer: &Deliverer, now: DateTime<Utc>) -> TickReport {
    let due = registry.due_snapshot(now);
    let mut report = TickReport {
        due: due.len(),
        ..TickReport::default()
    };
    if due.is_empty() {
        return report;
    }
    debug!(due = due.len(), "delivering due reminders");

    for reminder in &due {
        let owner = reminder.owner;
        match deliverer.deliver(reminder, now).await {
            Ok(DeliveryOutcome::Delivered) => report.delivered += 1,
            Ok(DeliveryOutcome::TimedOut) => report.timed_out += 1,
            Err(ReminderError::NotFound { .. }) => {
                debug!(owner = %owner, "reminder superseded before delivery");
                report.skipped += 1;
            }
            Err(
                e @ (ReminderError::SynthesisFailed(_)
                | ReminderError::TranscodeFailed(_)
                | ReminderError::Io(_)),
            ) => {
                warn!(owner = %owner, code = e.code(), error = %e, "reminder skipped, audio unavailable");
                report.skipped += 1;
            }
            Err(e) => {
                warn!(owner = %owner, code = e.code(), error = %e, "reminder delivery failed");
                report.failed += 1;
            }
        }
    }

    info!(
        due = report.due,
        delivered = report.delivered,
        timed_out = report.timed_out,
        skipped = report.skipped,
        failed = report.failed,
        "scheduler tick complete"
    );
    report
}
