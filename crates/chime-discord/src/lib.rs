//! `chime-discord`: serenity front end and songbird voice transport.

pub mod adapter;
pub mod commands;
pub mod context;
pub mod error;
pub mod handler;
pub mod voice;

pub use adapter::DiscordAdapter;
pub use context::DiscordAppContext;
pub use error::DiscordError;
pub use voice::SongbirdTransport;
