//! `chime-scheduler`: the reminder core.
//!
//! [`ReminderRegistry`] holds at most one live [`Reminder`](chime_core::Reminder)
//! per owner. [`SchedulerEngine`] ticks on a fixed period and hands every due
//! entry to the [`Deliverer`], which makes sure the artifact exists, connects
//! the guild's voice session and plays it. [`ReminderService`] is what the
//! command surface calls to create, cancel and inspect reminders. The
//! [`janitor`] sweeps leftover artifact files at startup and shutdown.

pub mod delivery;
pub mod engine;
pub mod error;
pub mod janitor;
pub mod registry;
pub mod service;
pub mod types;

#[cfg(test)]
mod test_support;

pub use delivery::Deliverer;
pub use engine::SchedulerEngine;
pub use error::{ReminderError, Result};
pub use janitor::{remove_artifact, sweep_stale_artifacts, SweepReport};
pub use registry::ReminderRegistry;
pub use service::ReminderService;
pub use types::{DeliveryOutcome, SchedulerState, TickReport};
