//! Engine process entry point
//!
//! Boot order: restore the book from the configured snapshot (absence is
//! a fresh book, corruption is fatal), start the single-writer engine
//! task and the periodic snapshot tick, then serve the three WebSocket
//! feeds. Ctrl-C snapshots the book and exits 0; an engine invariant
//! violation exits non-zero.

mod config;
mod handlers;
mod models;
mod state;

use anyhow::Context;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;

use matching_engine::{Engine, EngineChannels, EngineCommand, OrderBook};
use persistence::SnapshotLoader;
use types::fee::FeeSchedule;
use types::instrument::Instrument;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    info!(
        snapshot_path = %config.snapshot_path.display(),
        intake_capacity = config.intake_capacity,
        "Starting matching engine gateway"
    );

    let instrument = Instrument::btc_usd();
    let fees = FeeSchedule::standard();

    // Restore the book if a snapshot exists. Corruption is fatal here:
    // better to refuse to start than to trade on a wrong book.
    let loader = SnapshotLoader::new(&config.snapshot_path);
    let (engine, channels) = match loader.load().context("restoring book snapshot")? {
        Some(snapshot) => {
            info!(
                bid_levels = snapshot.bids.len(),
                ask_levels = snapshot.asks.len(),
                "Restored book from snapshot"
            );
            let next_order_id = snapshot.max_order_id() + 1;
            let clock_floor_ns = snapshot.next_timestamp_ns;
            let book = OrderBook::restore(instrument, fees, &snapshot);
            Engine::resume(
                book,
                &config.snapshot_path,
                config.intake_capacity,
                next_order_id,
                clock_floor_ns,
            )
        }
        None => {
            info!("No snapshot found; starting with an empty book");
            Engine::new(
                OrderBook::new(instrument, fees),
                &config.snapshot_path,
                config.intake_capacity,
            )
        }
    };

    let mut engine_handle = tokio::spawn(engine.run());
    spawn_snapshot_tick(channels.intake.clone(), config.snapshot_interval);
    spawn_health_watch(channels.health.clone());

    let app_state = AppState::new(channels.clone());
    serve_feed("order submission", config.orders_addr, handlers_orders(app_state.clone())).await?;
    serve_feed("market data", config.market_data_addr, handlers_market(app_state.clone())).await?;
    serve_feed("trade feed", config.trades_addr, handlers_trades(app_state)).await?;

    tokio::select! {
        result = &mut engine_handle => {
            result.context("engine task panicked")??;
            anyhow::bail!("engine stopped unexpectedly");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for interrupt")?;
            info!("Interrupt received; snapshotting and shutting down");
            shutdown(&channels, engine_handle).await?;
        }
    }

    Ok(())
}

fn handlers_orders(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::orders::ws_handler))
        .with_state(state)
}

fn handlers_market(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::market_data::ws_handler))
        .with_state(state)
}

fn handlers_trades(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::trades::ws_handler))
        .with_state(state)
}

/// Bind a feed and serve it on its own task.
async fn serve_feed(name: &'static str, addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {name} feed on {addr}"))?;
    info!(%addr, feed = name, "Feed listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(feed = name, error = %e, "Feed server stopped");
        }
    });
    Ok(())
}

/// Periodic SNAPSHOT commands through the same intake queue as everything
/// else, preserving ordering with in-flight submissions.
fn spawn_snapshot_tick(intake: mpsc::Sender<EngineCommand>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // immediate first tick; the boot state needs no snapshot
        loop {
            ticker.tick().await;
            if intake.send(EngineCommand::Snapshot).await.is_err() {
                break;
            }
        }
    });
}

/// Log snapshot-health transitions so persistence failures are visible
/// even though the engine keeps running through them.
fn spawn_health_watch(mut health: tokio::sync::watch::Receiver<matching_engine::EngineHealth>) {
    tokio::spawn(async move {
        while health.changed().await.is_ok() {
            let state = health.borrow_and_update().clone();
            if state.last_snapshot_ok {
                tracing::debug!("Snapshot persisted");
            } else {
                tracing::warn!(
                    consecutive_failures = state.consecutive_snapshot_failures,
                    "Snapshot persistence failing; book state is not being saved"
                );
            }
        }
    });
}

async fn shutdown(
    channels: &EngineChannels,
    engine_handle: tokio::task::JoinHandle<Result<(), matching_engine::EngineError>>,
) -> anyhow::Result<()> {
    channels
        .intake
        .send(EngineCommand::Shutdown)
        .await
        .context("engine already stopped")?;
    engine_handle
        .await
        .context("engine task panicked")?
        .context("engine failed during shutdown")?;
    info!("Clean shutdown complete");
    Ok(())
}
