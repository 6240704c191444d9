//! In-memory store of active reminders, one per owner.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chime_core::{Artifact, OwnerId, Reminder};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ReminderError, Result};

/// Authoritative map of live reminders.
///
/// Every operation takes the same lock and returns clones, so callers never
/// observe a partially written entry. Mutations issued on behalf of a
/// delivery carry the reminder's generation id and are dropped if the entry
/// was replaced or cancelled in the meantime.
#[derive(Default)]
pub struct ReminderRegistry {
    entries: Mutex<HashMap<OwnerId, Reminder>>,
}

impl ReminderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `reminder`, returning the entry it replaced.
    ///
    /// The replaced entry's artifact file is left on disk for the caller.
    pub fn upsert(&self, reminder: Reminder) -> Option<Reminder> {
        self.lock().insert(reminder.owner, reminder)
    }

    pub fn remove(&self, owner: OwnerId) -> Result<Reminder> {
        self.lock()
            .remove(&owner)
            .ok_or(ReminderError::NotFound { owner })
    }

    pub fn get(&self, owner: OwnerId) -> Result<Reminder> {
        self.lock()
            .get(&owner)
            .cloned()
            .ok_or(ReminderError::NotFound { owner })
    }

    /// Whether `owner`'s live reminder is still generation `id`.
    pub fn is_current(&self, owner: OwnerId, id: Uuid) -> bool {
        self.lock().get(&owner).is_some_and(|r| r.id == id)
    }

    /// Clones of every entry due at `now`, earliest first.
    pub fn due_snapshot(&self, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut due: Vec<Reminder> = self
            .lock()
            .values()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|r| (r.next_due, r.owner));
        due
    }

    /// Move generation `id` of `owner`'s reminder to `next_due`.
    /// Returns false when that generation is no longer live.
    pub fn reschedule(&self, owner: OwnerId, id: Uuid, next_due: DateTime<Utc>) -> bool {
        self.with_current(owner, id, |r| r.next_due = next_due)
    }

    /// Point generation `id` of `owner`'s reminder at a regenerated artifact.
    /// Returns false when that generation is no longer live.
    pub fn set_artifact(&self, owner: OwnerId, id: Uuid, artifact: Artifact) -> bool {
        self.with_current(owner, id, |r| r.artifact = artifact)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every entry, returning them.
    pub fn drain(&self) -> Vec<Reminder> {
        self.lock().drain().map(|(_, r)| r).collect()
    }

    fn with_current(&self, owner: OwnerId, id: Uuid, f: impl FnOnce(&mut Reminder)) -> bool {
        match self.lock().get_mut(&owner) {
            Some(r) if r.id == id => {
                f(r);
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OwnerId, Reminder>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
