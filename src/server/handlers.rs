use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::common::RelayError;

use super::AppState;

/// Requesting identity travels in the `user` header, as the polling clients
/// have always sent it.
const USER_HEADER: &str = "user";

#[derive(Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
pub struct PostMessageBody {
    #[serde(default)]
    to: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    kind: String,
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    limit: Option<String>,
}

pub async fn healthcheck() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn register_participant(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Response {
    let (participant, notice) = match state.room.register(&body.name).await {
        Ok(result) => result,
        Err(err) => return reject(&err, StatusCode::UNPROCESSABLE_ENTITY),
    };

    if let Some(store) = &state.store {
        let db = store.lock().await;
        if let Err(err) = db
            .insert_participant(&participant)
            .and_then(|()| db.insert_message(&notice))
        {
            log::error!("Failed to persist registration of {}: {err}", participant.name);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    log::info!("Participant {} joined", participant.name);
    StatusCode::CREATED.into_response()
}

pub async fn list_participants(State(state): State<AppState>) -> Response {
    Json(state.room.list_active().await).into_response()
}

pub async fn heartbeat(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(user) = user_header(&headers) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let participant = match state.room.heartbeat(&user).await {
        Ok(participant) => participant,
        Err(err) => return reject(&err, StatusCode::NOT_FOUND),
    };

    if let Some(store) = &state.store {
        if let Err(err) = store.lock().await.touch_participant(&participant) {
            log::error!("Failed to persist heartbeat for {}: {err}", participant.name);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    StatusCode::OK.into_response()
}

pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PostMessageBody>,
) -> Response {
    let user = user_header(&headers).unwrap_or_default();

    let message = match state
        .room
        .post_message(&user, &body.to, &body.text, &body.kind)
        .await
    {
        Ok(message) => message,
        Err(err) => return reject(&err, StatusCode::UNPROCESSABLE_ENTITY),
    };

    if let Some(store) = &state.store {
        if let Err(err) = store.lock().await.insert_message(&message) {
            log::error!("Failed to persist message from {}: {err}", message.from);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    StatusCode::CREATED.into_response()
}

pub async fn read_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
    headers: HeaderMap,
) -> Response {
    // An absent header is an anonymous viewer: direct traffic stays hidden
    // because its endpoints are never empty.
    let viewer = user_header(&headers).unwrap_or_default();
    let limit = parse_limit(query.limit.as_deref());
    Json(state.room.read_messages(&viewer, limit).await).into_response()
}

fn user_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `limit=0`, a missing limit and an unparseable limit all mean "no
/// truncation" rather than an error.
fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
        .filter(|n| *n > 0)
}

fn reject(err: &RelayError, unknown_participant: StatusCode) -> Response {
    let status = match err {
        RelayError::InvalidName | RelayError::ValidationFailed(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RelayError::DuplicateName(_) => StatusCode::CONFLICT,
        // The wire contract answers 404 for an unknown heartbeat but 422
        // for an unknown message sender; callers pick the code.
        RelayError::UnknownParticipant(_) => unknown_participant,
        RelayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}
