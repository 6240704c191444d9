//! What the Discord front end needs from the application.

use chime_scheduler::{ReminderService, SchedulerEngine};

/// Implemented by the binary's shared state. Command handlers and the
/// `ready` hook reach the reminder core only through this trait.
pub trait DiscordAppContext: Send + Sync {
    fn reminders(&self) -> &ReminderService;
    fn scheduler(&self) -> &SchedulerEngine;
}
