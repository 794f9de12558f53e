use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skybook_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Core(err) => core_response(err),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn core_response(err: CoreError) -> (StatusCode, serde_json::Value) {
    let status = match &err {
        CoreError::Validation { .. } | CoreError::VoucherInvalid(_) => StatusCode::BAD_REQUEST,
        CoreError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::OutOfInventory { .. } | CoreError::InvalidStateTransition { .. } => {
            StatusCode::CONFLICT
        }
        CoreError::IncompletePurchase { .. } => StatusCode::PAYMENT_REQUIRED,
        CoreError::InternalError(msg) => {
            tracing::error!("Internal Server Error: {}", msg);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error" }),
            );
        }
    };

    let body = match &err {
        CoreError::Validation { field, .. } => json!({ "error": err.to_string(), "field": field }),
        CoreError::IncompletePurchase { paid, failed_booking, .. } => json!({
            "error": err.to_string(),
            "paid": paid,
            "failed_booking": failed_booking,
        }),
        _ => json!({ "error": err.to_string() }),
    };

    (status, body)
}
