use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use seatlock_core::{HolderId, SeatId, SeatView, Snapshot};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeatResponse {
    pub seat: SeatView,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: SeatId,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/seats", get(list_seats))
        .route("/api/seats/stream", get(stream_seats))
        .route("/api/seats/{id}/lock", post(lock_seat))
        .route("/api/seats/{id}/confirm", post(confirm_seat))
        .route("/api/seats/{id}/unlock", post(unlock_seat))
}

/// GET /api/seats
async fn list_seats(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.registry.snapshot())
}

/// POST /api/seats/{id}/lock
async fn lock_seat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<HolderRequest>, JsonRejection>,
) -> Result<Json<SeatResponse>, AppError> {
    let (seat, holder) = parse_request(&state, &id, body)?;
    let seat = state.registry.lock(seat, &holder)?;
    Ok(Json(SeatResponse { seat }))
}

/// POST /api/seats/{id}/confirm
async fn confirm_seat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<HolderRequest>, JsonRejection>,
) -> Result<Json<SeatResponse>, AppError> {
    let (seat, holder) = parse_request(&state, &id, body)?;
    let seat = state.registry.confirm(seat, &holder)?;
    Ok(Json(SeatResponse { seat }))
}

/// POST /api/seats/{id}/unlock
async fn unlock_seat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<HolderRequest>, JsonRejection>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let (seat, holder) = parse_request(&state, &id, body)?;
    state.registry.unlock(seat, &holder)?;
    Ok(Json(ReleaseResponse { released: seat }))
}

/// GET /api/seats/stream
/// Server-sent seat change events.
async fn stream_seats(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = BroadcastStream::new(state.registry.subscribe()).filter_map(|msg| match msg {
        Ok(event) => Some(Event::default().event("seat").json_data(&event)),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Seat event subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Seat ids are validated against the pool before the holder, so an unknown
/// seat is a 404 even when the body is also bad.
fn parse_request(
    state: &AppState,
    id: &str,
    body: Result<Json<HolderRequest>, JsonRejection>,
) -> Result<(SeatId, HolderId), AppError> {
    let seat: SeatId = id.parse()?;
    state.registry.get(seat)?;
    let Json(req) = body.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let user_id = req
        .user_id
        .ok_or_else(|| AppError::ValidationError("userId is required".to_string()))?;
    let holder = HolderId::new(user_id)?;
    Ok((seat, holder))
}
