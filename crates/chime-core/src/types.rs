use serde::{Deserialize, Serialize};
use std::fmt;

/// Discord user that owns a reminder. At most one reminder exists per owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// Grouping that contains voice channels (a Discord guild).
///
/// Exactly one voice session exists per guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuildId(pub u64);

/// Voice channel inside a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

macro_rules! id_impls {
    ($($ty:ident),*) => {$(
        impl $ty {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $ty {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    )*};
}

id_impls!(OwnerId, GuildId, ChannelId);
