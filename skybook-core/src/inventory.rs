use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Key of a seat pool: one fare class on one flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FareClassRef {
    pub flight_id: Uuid,
    pub fare_class: String,
}

impl FareClassRef {
    pub fn new(flight_id: Uuid, fare_class: impl Into<String>) -> Self {
        Self {
            flight_id,
            fare_class: fare_class.into(),
        }
    }
}

impl fmt::Display for FareClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.flight_id, self.fare_class)
    }
}

/// Snapshot of a seat pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareClassInventory {
    pub fare: FareClassRef,
    pub price_nuc: i64,
    pub available_seats: u32,
}

/// Handle proving that `quantity` seats were taken out of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub fare: FareClassRef,
    pub quantity: u32,
}

impl Reservation {
    pub fn new(fare: FareClassRef, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            fare,
            quantity,
        }
    }
}

/// Departure and arrival countries of a flight, enough to decide document requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRoute {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_country: String,
    pub arrival_country: String,
}

impl FlightRoute {
    pub fn is_domestic(&self) -> bool {
        self.departure_country.eq_ignore_ascii_case(&self.arrival_country)
    }

    pub fn is_international(&self) -> bool {
        !self.is_domestic()
    }
}

/// Bounded seat counts per fare class.
///
/// `reserve` is a single check-and-decrement: either the whole quantity is taken or the
/// pool is left untouched. Callers must release a reservation at most once.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    async fn fare_class(&self, fare: &FareClassRef) -> CoreResult<FareClassInventory>;

    async fn reserve(&self, fare: &FareClassRef, quantity: u32) -> CoreResult<Reservation>;

    async fn release(&self, reservation: &Reservation) -> CoreResult<()>;

    /// Reserve several pools as one unit.
    ///
    /// The default reserves in order and hands back earlier reservations when a later one
    /// fails. Backends that can lock every pool at once should override it.
    async fn reserve_all(&self, requests: &[(FareClassRef, u32)]) -> CoreResult<Vec<Reservation>> {
        let mut held: Vec<Reservation> = Vec::with_capacity(requests.len());

        for (fare, quantity) in requests {
            match self.reserve(fare, *quantity).await {
                Ok(reservation) => held.push(reservation),
                Err(err) => {
                    for reservation in held.iter().rev() {
                        if let Err(release_err) = self.release(reservation).await {
                            tracing::error!(
                                "Failed to hand back {} seats on {} after {}: {}",
                                reservation.quantity,
                                reservation.fare,
                                err,
                                release_err
                            );
                            return Err(CoreError::InternalError(format!(
                                "compensation failed for reservation {}",
                                reservation.id
                            )));
                        }
                    }
                    return Err(err);
                }
            }
        }

        Ok(held)
    }
}
