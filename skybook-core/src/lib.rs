pub mod booking;
pub mod identity;
pub mod inventory;
pub mod payment;
pub mod repository;
pub mod voucher;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed on {field}: {rule}")]
    Validation { field: String, rule: String },

    #[error("Out of inventory for {fare_class}: requested {requested}, available {available}")]
    OutOfInventory {
        fare_class: String,
        requested: u32,
        available: u32,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Caller is not authenticated")]
    NotAuthenticated,

    #[error("Voucher invalid: {0}")]
    VoucherInvalid(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Purchase incomplete: paid {paid:?}, booking {failed_booking} failed: {reason}")]
    IncompletePurchase {
        paid: Vec<Uuid>,
        failed_booking: Uuid,
        reason: String,
    },

    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, rule: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            rule: rule.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
