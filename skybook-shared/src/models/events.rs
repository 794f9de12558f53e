use uuid::Uuid;

/// Lifecycle notifications published on the in-process broadcast channel.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    BookingConfirmed {
        booking_id: Uuid,
        account_id: Uuid,
        flight_id: Uuid,
        fare_class: String,
        seat_quantity: u32,
        timestamp: i64,
    },
    CancellationRequested {
        booking_id: Uuid,
        account_id: Uuid,
        timestamp: i64,
    },
    CancellationResolved {
        booking_id: Uuid,
        resolved_by: Uuid,
        status: String,
        seats_released: u32,
        timestamp: i64,
    },
    PaymentRecorded {
        booking_id: Uuid,
        payment_id: Uuid,
        transaction_id: String,
        amount_nuc: i64,
        timestamp: i64,
    },
}

impl BookingEvent {
    pub fn booking_id(&self) -> Uuid {
        match self {
            BookingEvent::BookingConfirmed { booking_id, .. }
            | BookingEvent::CancellationRequested { booking_id, .. }
            | BookingEvent::CancellationResolved { booking_id, .. }
            | BookingEvent::PaymentRecorded { booking_id, .. } => *booking_id,
        }
    }
}
