use serde::{Deserialize, Serialize};

/// Tunable limits applied by the booking and payment flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingPolicy {
    /// Upper bound on seats (and passengers) in one booking request.
    pub max_seats_per_booking: u32,

    /// How many years ahead a card expiry year may lie.
    pub card_expiry_window_years: i32,

    /// Attempts at drawing an unused transaction id before giving up.
    pub transaction_id_attempts: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_seats_per_booking: 9,
            card_expiry_window_years: 10,
            transaction_id_attempts: 5,
        }
    }
}
