//! Reminder record, shared between the registry, the scheduler and the
//! command surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::interval::Interval;
use crate::types::{ChannelId, GuildId, OwnerId};

/// Voice channel a reminder is spoken into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub guild: GuildId,
    pub channel: ChannelId,
}

/// One active recurring reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// Generation id. A replaced reminder keeps its owner but gets a new id,
    /// so stale deliveries cannot write into the successor.
    pub id: Uuid,
    pub owner: OwnerId,
    pub target: DeliveryTarget,
    /// Spoken text. Never changes for the lifetime of the reminder.
    pub message: String,
    /// Interval exactly as the user typed it, for display.
    pub interval_text: String,
    pub interval: Interval,
    pub created_at: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    /// Cached synthesized audio; regenerated when the file goes missing.
    pub artifact: Artifact,
}

impl Reminder {
    /// Build a reminder first due one interval after `now`. An interval that
    /// runs past the last representable timestamp is due at that timestamp.
    pub fn new(
        owner: OwnerId,
        target: DeliveryTarget,
        message: impl Into<String>,
        interval_text: impl Into<String>,
        interval: Interval,
        artifact: Artifact,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            target,
            message: message.into(),
            interval_text: interval_text.into(),
            interval,
            created_at: now,
            next_due: interval.next_after(now).unwrap_or(DateTime::<Utc>::MAX_UTC),
            artifact,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due <= now
    }

    pub fn summary(&self) -> ReminderSummary {
        ReminderSummary {
            message: self.message.clone(),
            interval_text: self.interval_text.clone(),
            interval: self.interval,
            next_due: self.next_due,
        }
    }
}

/// Read-only view handed back to the command surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSummary {
    pub message: String,
    pub interval_text: String,
    pub interval: Interval,
    pub next_due: DateTime<Utc>,
}

impl ReminderSummary {
    /// "Next reminder in N minutes" or "Next reminder due now".
    pub fn describe_next(&self, now: DateTime<Utc>) -> String {
        let remaining = self.next_due - now;
        if remaining > chrono::Duration::zero() {
            format!("Next reminder in {} minutes", remaining.num_minutes())
        } else {
            "Next reminder due now".to_string()
        }
    }
}
