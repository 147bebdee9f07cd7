//! Race Replay - Main Entry Point
//!
//! Desktop viewer that replays a recorded motorsport session with a synchronized
//! track map, leaderboard and telemetry chart.

use anyhow::Context;
use race_replay::{config, AppState, ReplayApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Console plus a daily rolling file in the app data directory
    let file_appender = config::log_dir()
        .map(|dir| tracing_appender::rolling::daily(dir, "race-replay.log"));
    let (file_writer, _guard) = match file_appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,race_replay=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
        }))
        .init();

    tracing::info!("Starting Race Replay");

    let app_state = AppState::load_or_default();
    tracing::debug!(
        "Sessions directory: {}",
        app_state.config.data.sessions_dir.display()
    );

    let [width, height] = app_state.config.ui.window_size;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Race Replay"),
        ..Default::default()
    };

    eframe::run_native(
        "Race Replay",
        native_options,
        Box::new(|cc| Ok(Box::new(ReplayApp::new(cc, app_state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("Failed to run the viewer")?;

    tracing::info!("Shutting down...");
    Ok(())
}
