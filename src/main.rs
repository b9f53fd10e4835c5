mod common;
mod config;
mod room;
mod server;
mod storage;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::Mutex;

use room::{PresenceSweeper, RoomState, SystemClock};
use server::AppState;
use storage::{RelayDatabase, SharedStore};

#[derive(Parser)]
#[command(
    name = "chat-relay",
    version,
    about = "Group chat relay with heartbeat-based presence"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);

    let store: SharedStore = match RelayDatabase::with_path(&app_config.database_path) {
        Ok(db) => Arc::new(Mutex::new(db)),
        Err(err) => {
            log::error!(
                "Failed to open database {}: {err}",
                app_config.database_path
            );
            return Err(err.into());
        }
    };

    let room = RoomState::new(Arc::new(SystemClock));
    seed_room(&room, &store).await;

    let sweeper = PresenceSweeper::new(
        room.clone(),
        Some(store.clone()),
        app_config.sweep_interval(),
        app_config.liveness_timeout_ms(),
    );
    sweeper.spawn();

    let state = AppState {
        room,
        store: Some(store),
    };
    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr).await?;
    log::info!("Relay listening on {}", app_config.bind_addr);

    let server = async { axum::serve(listener, server::app(state)).await };
    tokio::select! {
        result = server => {
            if let Err(err) = result {
                log::error!("Server terminated unexpectedly: {err}");
            }
        }
        _ = signal::ctrl_c() => {
            log::info!("Received shutdown signal, stopping relay...");
        }
    }

    Ok(())
}

/// Load persisted participants and messages into the live room.
async fn seed_room(room: &RoomState, store: &SharedStore) {
    let loaded = {
        let db = store.lock().await;
        db.load_participants()
            .and_then(|participants| db.load_messages().map(|messages| (participants, messages)))
    };

    match loaded {
        Ok((participants, messages)) => {
            if participants.is_empty() && messages.is_empty() {
                return;
            }
            log::info!(
                "Restoring {} participant(s) and {} message(s)",
                participants.len(),
                messages.len()
            );
            room.restore(participants, messages).await;
        }
        Err(err) => {
            log::warn!("Failed to load persisted state, starting empty: {err}");
        }
    }
}
