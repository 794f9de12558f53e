use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use skybook_core::booking::{Booking, BookingRequest, ContactInfo};
use skybook_core::payment::{CardDetails, PaymentReceipt, PaymentRequest};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Identity;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub booking_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseLeg {
    pub booking_id: Uuid,
    pub amount_nuc: i64,
}

#[derive(Debug, Deserialize)]
pub struct PurchasePaymentRequest {
    pub legs: Vec<PurchaseLeg>,
    pub card: CardDetails,
    pub method: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/payment", post(record_payment))
        .route("/v1/bookings/{id}/cancellation", post(request_cancellation))
        .route("/v1/purchases/payment", post(record_purchase_payments))
        .route("/v1/account/contact", get(contact_info))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
/// Reserve seats on every leg and create one CONFIRMED booking per leg
async fn create_booking(
    State(state): State<AppState>,
    Identity(auth): Identity,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let booking_ids = state.service.create_booking(&auth, request).await?;
    Ok((StatusCode::CREATED, Json(CreateBookingResponse { booking_ids })))
}

/// GET /v1/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Identity(auth): Identity,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.service.list_bookings(&auth).await?))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Identity(auth): Identity,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.service.get_booking(&auth, booking_id).await?))
}

/// POST /v1/bookings/{id}/payment
/// Record (or overwrite) the payment of a booking
async fn record_payment(
    State(state): State<AppState>,
    Identity(auth): Identity,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<PaymentReceipt>, AppError> {
    let receipt = state.service.record_payment(&auth, booking_id, request).await?;
    Ok(Json(receipt))
}

/// POST /v1/bookings/{id}/cancellation
/// Owner asks for a cancellation; staff resolves it later
async fn request_cancellation(
    State(state): State<AppState>,
    Identity(auth): Identity,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.service.request_cancellation(&auth, booking_id).await?))
}

/// POST /v1/purchases/payment
/// Pay every leg of a multi-leg purchase with the same card
async fn record_purchase_payments(
    State(state): State<AppState>,
    Identity(auth): Identity,
    Json(request): Json<PurchasePaymentRequest>,
) -> Result<Json<Vec<PaymentReceipt>>, AppError> {
    if request.legs.is_empty() {
        return Err(AppError::BadRequest("legs must not be empty".to_string()));
    }

    let legs: Vec<(Uuid, i64)> = request
        .legs
        .iter()
        .map(|leg| (leg.booking_id, leg.amount_nuc))
        .collect();

    let receipts = state
        .service
        .record_purchase_payments(&auth, &legs, &request.card, &request.method)
        .await?;
    Ok(Json(receipts))
}

/// GET /v1/account/contact
async fn contact_info(
    State(state): State<AppState>,
    Identity(auth): Identity,
) -> Result<Json<ContactInfo>, AppError> {
    state
        .service
        .contact_info(&auth)
        .await?
        .map(Json)
        .ok_or_else(|| skybook_core::CoreError::NotFound("contact info".to_string()).into())
}
