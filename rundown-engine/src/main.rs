//! Rundown engine command-line driver
//!
//! Seeds the engine from a JSON rundown file, optionally enters roll mode, runs
//! the clock task and logs playback until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rundown_common::config::EngineConfig;
use rundown_common::events::{OffsetMode, RundownEvent, TimerSnapshot};
use rundown_common::human_time::{format_millis, format_offset};
use rundown_common::CustomFieldSchema;
use rundown_engine::{seed, spawn_clock_task, RundownEngine};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timer ticks between periodic status lines
const STATUS_EVERY_TICKS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "rundown-engine")]
#[command(about = "Rundown timing and playback engine")]
#[command(version)]
struct Args {
    /// Configuration file (overrides RUNDOWN_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of entry drafts in playback order
    #[arg(short, long)]
    rundown: Option<PathBuf>,

    /// Start in roll mode with the show epoch at process start
    #[arg(long)]
    roll: bool,

    /// Measure offset against the wall clock instead of the running show
    #[arg(long)]
    absolute_offset: bool,

    /// Custom field key accepted in the rundown file (repeatable)
    #[arg(long = "field")]
    fields: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rundown_engine=info,rundown_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting rundown engine v{}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    if args.absolute_offset {
        config.offset_mode = OffsetMode::Absolute;
    }
    let engine = Arc::new(RundownEngine::with_system_clock(config));

    if let Some(path) = &args.rundown {
        let schema = CustomFieldSchema::new(args.fields.iter().cloned());
        let drafts = seed::read_drafts(path, &schema)
            .with_context(|| format!("Failed to read rundown {}", path.display()))?;
        engine
            .load_drafts(drafts)
            .await
            .context("Failed to load rundown")?;

        let rundown = engine.get_normalised().await;
        info!(
            "Rundown ready: {} entries, {} total",
            rundown.len(),
            format_millis(rundown.total_duration)
        );
    } else {
        warn!("No rundown file given, starting empty");
    }

    if args.roll {
        engine
            .roll(None)
            .await
            .context("Failed to enter roll mode")?;
    }

    let logger = tokio::spawn(log_events(engine.subscribe()));
    let clock = spawn_clock_task(Arc::clone(&engine));

    shutdown_signal().await;

    clock.shutdown().await;
    logger.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Log transitions as they happen and a status line once in a while
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<RundownEvent>) {
    let mut ticks: u64 = 0;
    loop {
        match rx.recv().await {
            Ok(RundownEvent::TimerTick(snapshot)) => {
                ticks += 1;
                if ticks % STATUS_EVERY_TICKS == 0 {
                    log_status(&snapshot);
                }
            }
            Ok(RundownEvent::DelayApplied {
                delay_id, clamped, ..
            }) if !clamped.is_empty() => {
                warn!("Delay {} clamped {} entries", delay_id, clamped.len());
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event logger lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_status(snapshot: &TimerSnapshot) {
    let Some(entry) = &snapshot.active_entry else {
        return;
    };
    if !snapshot.timer.playback.is_running() {
        return;
    }
    info!(
        "[{}] {} {} remaining, {}{}",
        snapshot.timer.playback,
        entry.title,
        format_millis(snapshot.timer.current.unwrap_or_default()),
        format_offset(snapshot.offset.offset),
        if snapshot.on_air { ", on air" } else { "" }
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
