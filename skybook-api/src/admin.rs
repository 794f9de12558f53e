use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use skybook_core::booking::{Booking, CancellationDecision};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Identity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveCancellationRequest {
    pub decision: CancellationDecision,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/cancellations", get(list_pending_cancellations))
        .route("/v1/admin/cancellations/{id}", post(resolve_cancellation))
}

/// GET /v1/admin/cancellations
/// Bookings waiting for a staff decision
async fn list_pending_cancellations(
    State(state): State<AppState>,
    Identity(auth): Identity,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.service.list_pending_cancellations(&auth).await?))
}

/// POST /v1/admin/cancellations/{id}
async fn resolve_cancellation(
    State(state): State<AppState>,
    Identity(auth): Identity,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<ResolveCancellationRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .service
        .resolve_cancellation(&auth, booking_id, body.decision)
        .await?;
    Ok(Json(booking))
}
