//! Kinxplore booking board for the terminal.
//!
//! Shows bookings in pending, confirmed and completed columns and applies
//! staff commands read from stdin. Configuration comes from the environment
//! (see [`config::Config`]).

mod commands;
mod config;
mod render;
mod telemetry;

use anyhow::Context;
use commands::{Command, HELP};
use config::Config;
use kinxplore_bookings::board::{BoardStore, BoardView, board_for, spawn_bridge};
use kinxplore_bookings::store::{BookingEnvironment, BookingStore};
use kinxplore_core::environment::SystemClock;
use kinxplore_supabase::{PostgrestBookingBackend, RealtimeChangeFeed};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env().context("Failed to load configuration")?;

    telemetry::init_tracing(&config.log_filter);
    if let Some(port) = config.metrics_port {
        telemetry::install_metrics(port).context("Failed to start metrics exporter")?;
    }
    info!(?config, "Starting Kinxplore booking board");

    let supabase = config.supabase();
    let backend = Arc::new(
        PostgrestBookingBackend::new(supabase.clone()).context("Failed to build HTTP client")?,
    );

    let capability = backend
        .probe_capability(&config.actor)
        .await
        .context("Failed to check staff role")?;
    if !capability.is_granted() {
        warn!(actor = %config.actor, "Actor is not an admin, the board stays empty");
    }
    let (capability_tx, capability_rx) = watch::channel(capability);

    let environment =
        BookingEnvironment::new(Arc::new(SystemClock), backend).with_actor(config.actor.clone());
    let store = BookingStore::new(environment, config.store());
    let board = board_for(&store);
    let bridge = spawn_bridge(store.clone(), board.clone());
    let guard = store.attach(capability_rx, Arc::new(RealtimeChangeFeed::new(supabase)));
    let renderer = spawn_renderer(board.clone());

    println!("{HELP}");
    run_commands(&store, &board).await?;

    info!("Shutting down");
    drop(guard);
    drop(capability_tx);
    renderer.abort();
    if let Err(error) = board.shutdown(config.response_timeout).await {
        warn!(%error, "Board did not shut down cleanly");
    }
    if let Err(error) = store.shutdown(config.response_timeout).await {
        warn!(%error, "Booking store did not shut down cleanly");
    }
    bridge.abort();
    Ok(())
}

/// Redraw the board after every change
fn spawn_renderer(board: BoardStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut revisions = board.subscribe_state();
        loop {
            let _ = revisions.borrow_and_update();
            let view = board.state(BoardView::of).await;
            println!("\n{}", render::board(&view));
            if revisions.changed().await.is_err() {
                return;
            }
        }
    })
}

/// Read commands until `quit`, end of input or Ctrl-C
async fn run_commands(store: &BookingStore, board: &BoardStore) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(commands::ParseError::Empty) => continue,
            Err(error) => {
                println!("{error}\n{HELP}");
                continue;
            },
        };

        match command {
            Command::Quit => return Ok(()),
            Command::Help => println!("{HELP}"),
            Command::Refresh => refresh(store).await,
            Command::Stats => match store.load_statistics().await {
                Ok(statistics) => println!("{}", render::statistics_report(&statistics)),
                Err(error) => println!("!! {error}"),
            },
            command => {
                if let Some(action) = command.into_action() {
                    board.send(action).await.context("Board stopped")?;
                }
            },
        }
    }
}

async fn refresh(store: &BookingStore) {
    if let Err(error) = store.load().await {
        println!("!! {error}");
        return;
    }
    if let Err(error) = store.load_statistics().await {
        println!("!! {error}");
    }
}
