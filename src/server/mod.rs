pub mod handlers;

use axum::Router;
use axum::routing::{get, post};

use crate::room::RoomState;
use crate::storage::SharedStore;

/// Shared handler context: the live room plus the optional durability
/// mirror.
#[derive(Clone)]
pub struct AppState {
    pub room: RoomState,
    pub store: Option<SharedStore>,
}

/// Build the relay's route table.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::healthcheck))
        .route(
            "/participants",
            get(handlers::list_participants).post(handlers::register_participant),
        )
        .route(
            "/messages",
            get(handlers::read_messages).post(handlers::post_message),
        )
        .route("/status", post(handlers::heartbeat))
        .with_state(state)
}
