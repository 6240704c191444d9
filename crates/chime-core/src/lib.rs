//! `chime-core` holds the types shared by every chime crate: identifiers, the
//! interval grammar, artifact naming, the reminder record and configuration.

pub mod artifact;
pub mod config;
pub mod error;
pub mod interval;
pub mod reminder;
pub mod types;

pub use artifact::{Artifact, ArtifactFormat};
pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
pub use interval::{Interval, InvalidInterval};
pub use reminder::{DeliveryTarget, Reminder, ReminderSummary};
pub use types::{ChannelId, GuildId, OwnerId};
