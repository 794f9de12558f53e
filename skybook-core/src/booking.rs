use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::inventory::{FareClassRef, Reservation};
use crate::CoreError;

/// Booking status in the cancellation-approval lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    PendingCancellation,
    Canceled,
    DeniedCancellation,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::PendingCancellation => "PENDING_CANCELLATION",
            BookingStatus::Canceled => "CANCELED",
            BookingStatus::DeniedCancellation => "DENIED_CANCELLATION",
        }
    }

    /// Canceled and DeniedCancellation accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Canceled | BookingStatus::DeniedCancellation)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "PENDING_CANCELLATION" => Ok(BookingStatus::PendingCancellation),
            "CANCELED" => Ok(BookingStatus::Canceled),
            "DENIED_CANCELLATION" => Ok(BookingStatus::DeniedCancellation),
            other => Err(CoreError::InternalError(format!(
                "unknown booking status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            other => Err(CoreError::validation("gender", format!("unknown gender '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TravelDocument {
    pub passport_number: String,
    pub nationality: String,
    pub expiry_date: NaiveDate,
}

/// One traveller on the manifest. Each passenger occupies one seat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: NaiveDate,
    pub document: Option<TravelDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactInfo {
    pub phone_number: String,
    pub email: String,
}

/// Input of the multi-leg coordinator: one leg for one-way, two for a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub legs: Vec<FareClassRef>,
    pub seat_quantity: u32,
    pub passengers: Vec<Passenger>,
    pub contact: ContactInfo,
}

/// A traveller's claim on seats of one fare class. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub account_id: Uuid,
    pub fare: FareClassRef,
    pub seat_quantity: u32,
    pub reservation_id: Uuid,
    pub status: BookingStatus,
    pub passengers: Vec<Passenger>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(account_id: Uuid, reservation: &Reservation, passengers: Vec<Passenger>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            fare: reservation.fare.clone(),
            seat_quantity: reservation.quantity,
            reservation_id: reservation.id,
            status: BookingStatus::Confirmed,
            passengers,
            created_at: now,
            updated_at: now,
        }
    }

    /// The ledger handle this booking holds.
    pub fn reservation(&self) -> Reservation {
        Reservation {
            id: self.reservation_id,
            fare: self.fare.clone(),
            quantity: self.seat_quantity,
        }
    }

    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.account_id == account_id
    }

    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

/// Staff resolution of a pending cancellation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationDecision {
    Approve,
    Reject,
}

impl CancellationDecision {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            CancellationDecision::Approve => BookingStatus::Canceled,
            CancellationDecision::Reject => BookingStatus::DeniedCancellation,
        }
    }
}
