//! Discord slash commands: `/remind`, `/stop_reminder`, `/list_reminders`.
//!
//! Registration happens in `ready()`. Interactions are dispatched from
//! `interaction_create` in the event handler.

use std::sync::Arc;

use chime_core::{ChannelId, GuildId, OwnerId, ReminderSummary};
use chime_scheduler::ReminderError;
use chrono::{DateTime, Utc};
use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::model::application::{CommandInteraction, CommandOptionType};
use serenity::model::id::{GuildId as SerenityGuildId, UserId};
use serenity::prelude::Context;
use tracing::{info, warn};

use crate::context::DiscordAppContext;

const NO_REMINDER: &str = "You don't have any active reminders.";

/// Register the reminder commands, per guild when `guild_id` is set and
/// globally otherwise. Call from `ready()`.
pub async fn register_commands(ctx: &Context, guild_id: Option<SerenityGuildId>) {
    let commands = vec![
        CreateCommand::new("remind")
            .description("Set up a recurring TTS reminder")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "interval",
                    "How often, e.g. '30 min' or '1 hour'",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "message", "What to say")
                    .required(true),
            ),
        CreateCommand::new("stop_reminder").description("Stop your active reminder"),
        CreateCommand::new("list_reminders").description("List your active reminders"),
    ];

    match guild_id {
        Some(gid) => match gid.set_commands(&ctx.http, commands).await {
            Ok(cmds) => info!(guild = %gid, count = cmds.len(), "registered guild slash commands"),
            Err(e) => warn!(guild = %gid, error = %e, "failed to register guild commands"),
        },
        None => {
            match serenity::model::application::Command::set_global_commands(&ctx.http, commands)
                .await
            {
                Ok(cmds) => info!(count = cmds.len(), "registered global slash commands"),
                Err(e) => warn!(error = %e, "failed to register global slash commands"),
            }
        }
    }
}

/// Dispatch a slash command interaction to the appropriate handler.
pub async fn handle_interaction<C: DiscordAppContext + 'static>(
    app: &Arc<C>,
    ctx: &Context,
    command: &CommandInteraction,
) {
    let result = match command.data.name.as_str() {
        "remind" => handle_remind(app, ctx, command).await,
        "stop_reminder" => handle_stop(app, ctx, command).await,
        "list_reminders" => handle_list(app, ctx, command).await,
        _ => {
            respond_ephemeral(ctx, command, "Unknown command.").await;
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(command = %command.data.name, error = %e, "slash command error");
    }
}

/// `/remind interval:String message:String`
async fn handle_remind<C: DiscordAppContext + 'static>(
    app: &Arc<C>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    // Connecting and the test playback take seconds; defer first.
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let interval = string_option(command, "interval");
    let message = string_option(command, "message");
    let owner = OwnerId(command.user.id.get());
    info!(owner = %owner, user = %command.user.name, %interval, "remind command");

    let reply = match command.guild_id {
        None => "Reminders only work inside a server.".to_string(),
        Some(gid) => {
            let channel = voice_channel_of(ctx, gid, command.user.id);
            let result = app
                .reminders()
                .set_reminder(owner, GuildId(gid.get()), channel, interval, message)
                .await;
            if let Err(e) = &result {
                warn!(owner = %owner, code = e.code(), error = %e, "reminder setup failed");
            }
            remind_reply(&result)
        }
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(reply))
        .await?;
    Ok(())
}

/// `/stop_reminder`
async fn handle_stop<C: DiscordAppContext + 'static>(
    app: &Arc<C>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let owner = OwnerId(command.user.id.get());
    let reply = match app.reminders().cancel_reminder(owner).await {
        Ok(removed) => format!("Stopped your reminder: '{}'", removed.message),
        Err(ReminderError::NotFound { .. }) => NO_REMINDER.to_string(),
        Err(e) => format!("Error stopping reminder: {e}"),
    };
    respond_ephemeral(ctx, command, &reply).await;
    Ok(())
}

/// `/list_reminders`
async fn handle_list<C: DiscordAppContext + 'static>(
    app: &Arc<C>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let owner = OwnerId(command.user.id.get());
    let reply = match app.reminders().list_reminder(owner) {
        Ok(summary) => list_reply(&summary, Utc::now()),
        Err(_) => NO_REMINDER.to_string(),
    };
    respond_ephemeral(ctx, command, &reply).await;
    Ok(())
}

fn string_option<'a>(command: &'a CommandInteraction, name: &str) -> &'a str {
    command
        .data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_str())
        .unwrap_or("")
}

/// The voice channel `user` currently sits in, from the gateway cache.
fn voice_channel_of(ctx: &Context, guild: SerenityGuildId, user: UserId) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild)?;
    guild
        .voice_states
        .get(&user)
        .and_then(|vs| vs.channel_id)
        .map(|c| ChannelId(c.get()))
}

fn remind_reply(result: &Result<ReminderSummary, ReminderError>) -> String {
    match result {
        Ok(summary) => format!(
            "Reminder set! I'll say '{}' every '{}'",
            summary.message, summary.interval_text
        ),
        Err(ReminderError::InvalidInterval(_)) => {
            "Invalid format! Use something like '30 min' or '1 hour'".to_string()
        }
        Err(ReminderError::NotInVoiceChannel) => {
            "You need to be in a voice channel for reminders.".to_string()
        }
        Err(ReminderError::PlaybackTestFailed(_)) => "Audio Playback test failed".to_string(),
        Err(e) => format!("Error setting up reminder: {e}"),
    }
}

fn list_reply(summary: &ReminderSummary, now: DateTime<Utc>) -> String {
    format!(
        "**Active Reminder:**\nMessage: '{}'\nInterval: {}\n{}",
        summary.message,
        summary.interval_text,
        summary.describe_next(now)
    )
}

/// Send an ephemeral response to a slash command (only visible to the invoker).
async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let _ = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_core::{Interval, InvalidInterval};

    fn summary(next_due: DateTime<Utc>) -> ReminderSummary {
        ReminderSummary {
            message: "drink water".into(),
            interval_text: "30 min".into(),
            interval: Interval::parse("30 min").unwrap(),
            next_due,
        }
    }

    #[test]
    fn remind_replies_match_each_outcome() {
        let now = Utc::now();
        assert_eq!(
            remind_reply(&Ok(summary(now))),
            "Reminder set! I'll say 'drink water' every '30 min'"
        );
        assert_eq!(
            remind_reply(&Err(ReminderError::InvalidInterval(InvalidInterval("x".into())))),
            "Invalid format! Use something like '30 min' or '1 hour'"
        );
        assert_eq!(
            remind_reply(&Err(ReminderError::NotInVoiceChannel)),
            "You need to be in a voice channel for reminders."
        );
        assert_eq!(
            remind_reply(&Err(ReminderError::PlaybackTestFailed("silent".into()))),
            "Audio Playback test failed"
        );
        assert!(remind_reply(&Err(ReminderError::SynthesisFailed("503".into())))
            .starts_with("Error setting up reminder: "));
    }

    #[test]
    fn list_reply_shows_remaining_minutes() {
        let now = Utc::now();
        let text = list_reply(&summary(now + chrono::Duration::seconds(25 * 60 + 30)), now);
        assert_eq!(
            text,
            "**Active Reminder:**\nMessage: 'drink water'\nInterval: 30 min\nNext reminder in 25 minutes"
        );
        assert!(list_reply(&summary(now), now).ends_with("Next reminder due now"));
    }
}
