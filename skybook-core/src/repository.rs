use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, ContactInfo};
use crate::inventory::FlightRoute;
use crate::payment::{Card, Payment};
use crate::voucher::Voucher;
use crate::CoreResult;

/// Repository trait for booking persistence
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Store freshly reserved bookings together with the account's contact details.
    /// All or nothing.
    async fn commit_purchase(
        &self,
        account_id: Uuid,
        bookings: &[Booking],
        contact: &ContactInfo,
    ) -> CoreResult<()>;

    async fn get(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    async fn list_by_account(&self, account_id: Uuid) -> CoreResult<Vec<Booking>>;

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>>;

    /// Compare-and-set on the status. Returns the updated booking, or `None` when the
    /// stored status was no longer `expected`.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> CoreResult<Option<Booking>>;
}

/// Repository trait for payment records
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert, or overwrite the existing payment of the same booking keeping its id.
    async fn upsert_payment(&self, payment: Payment) -> CoreResult<Payment>;

    async fn get_by_booking(&self, booking_id: Uuid) -> CoreResult<Option<Payment>>;

    async fn transaction_exists(&self, transaction_id: &str) -> CoreResult<bool>;
}

/// Repository trait for stored cards (one per account)
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Insert, or overwrite the account's existing card keeping its id.
    async fn upsert_card(&self, card: Card) -> CoreResult<Card>;

    async fn get_by_owner(&self, account_id: Uuid) -> CoreResult<Option<Card>>;
}

/// Repository trait for voucher stock
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// Validate and consume one unit in a single step. Unknown, expired or exhausted
    /// codes yield `CoreError::VoucherInvalid` and nothing changes.
    async fn redeem(&self, code: &str, today: NaiveDate) -> CoreResult<Voucher>;

    async fn get(&self, code: &str) -> CoreResult<Option<Voucher>>;
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn contact(&self, account_id: Uuid) -> CoreResult<Option<ContactInfo>>;
}

/// Read access to the flight catalogue owned by the surrounding application.
#[async_trait]
pub trait FlightCatalog: Send + Sync {
    /// Fails with `CoreError::NotFound` for unknown flights.
    async fn route(&self, flight_id: Uuid) -> CoreResult<FlightRoute>;
}
