#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use squarewars_core::game::{Config, DEFAULT_GRID_SIZE, DEFAULT_TARGET_SCORE};
use squarewars_shell::render::Palette;
use std::{io, path::PathBuf};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Play SquareWars in the terminal
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Play on a grid with the given number of points per side
    #[arg(long, name = "N", default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: u16,

    /// Give the opponent a last chance once a player reaches the given score
    #[arg(long, name = "SCORE", default_value_t = DEFAULT_TARGET_SCORE)]
    target_score: u32,

    /// Open the given database file
    #[arg(long, name = "FILE")]
    db_file: Option<PathBuf>,

    /// Print without colors
    #[arg(long)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let config = Config::new(args.grid_size, args.target_score).context("invalid game options")?;

    if let Some(path) = &args.db_file {
        tracing::info!("opening database at {}", path.display());
    } else {
        tracing::info!("opening in-memory database");
    }

    let palette = if args.no_color {
        Palette::Plain
    } else {
        Palette::Ansi
    };

    let shutdown_signal = shutdown_signal().context("failed to listen for shutdown signals")?;

    squarewars_shell::run(config, args.db_file, palette, shutdown_signal).await
}

#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    })
}

#[cfg(windows)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
    })
}
