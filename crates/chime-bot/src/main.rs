use std::sync::Arc;

use clap::Parser;
use songbird::Songbird;
use tokio::sync::watch;
use tracing::{info, warn};

mod app;

const DEFAULT_LOG_FILTER: &str =
    "chime_bot=info,chime_scheduler=info,chime_voice=info,chime_tts=info,chime_discord=info";

#[derive(Parser, Debug)]
#[command(name = "chime-bot", about = "Recurring spoken reminders in Discord voice channels")]
struct Args {
    /// Path to chime.toml
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let args = Args::parse();

    // load config: --config > CHIME_CONFIG env > ~/.chime/chime.toml
    let config_path = args.config.or_else(|| std::env::var("CHIME_CONFIG").ok());
    let config = chime_core::ChimeConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        let mut config = chime_core::ChimeConfig::default();
        config.apply_legacy_env();
        config
    });

    match chime_tts::probe_ffmpeg(&config.tts.ffmpeg_path).await {
        Some(version) => info!(%version, "ffmpeg available"),
        None => warn!(
            path = %config.tts.ffmpeg_path,
            "ffmpeg not found, reminders will be kept as mp3"
        ),
    }

    // clear artifacts left over from a previous run before taking commands
    let swept =
        chime_scheduler::sweep_stale_artifacts(&config.tts.artifact_dir, config.janitor.retention())
            .await;
    info!(removed = swept.removed, failed = swept.failed, "startup artifact sweep");

    let songbird = Songbird::serenity();
    let transport = Arc::new(chime_discord::SongbirdTransport::new(Arc::clone(&songbird)));
    let provider = Arc::new(chime_tts::GoogleTtsProvider::new(&config.tts)?);
    let state = Arc::new(app::AppState::new(config, transport, provider));

    let adapter =
        chime_discord::DiscordAdapter::new(&state.config.discord, Arc::clone(&state), songbird)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let discord = tokio::spawn(adapter.run(shutdown_rx));
    info!("chime bot started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    // scheduler, voice and artifacts first, then the gateway
    state.shutdown().await;
    let _ = shutdown_tx.send(true);
    if let Err(e) = discord.await {
        warn!(error = %e, "Discord task ended abnormally");
    }
    info!("chime bot stopped");
    Ok(())
}
