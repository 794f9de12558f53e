use chrono::Utc;
use skybook_core::booking::{Booking, BookingRequest};
use skybook_core::identity::AuthContext;
use skybook_core::inventory::{FareClassRef, Reservation, SeatLedger};
use skybook_core::repository::{BookingRepository, FlightCatalog};
use skybook_core::{CoreError, CoreResult};
use skybook_shared::models::BookingEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use uuid::Uuid;

use crate::policy::BookingPolicy;
use crate::validation;

/// Books one-way and round trips as a single unit: either every leg is reserved and
/// persisted, or nothing is.
pub struct BookingCoordinator {
    ledger: Arc<dyn SeatLedger>,
    bookings: Arc<dyn BookingRepository>,
    catalog: Arc<dyn FlightCatalog>,
    policy: BookingPolicy,
    events: broadcast::Sender<BookingEvent>,
}

impl BookingCoordinator {
    pub fn new(
        ledger: Arc<dyn SeatLedger>,
        bookings: Arc<dyn BookingRepository>,
        catalog: Arc<dyn FlightCatalog>,
        policy: BookingPolicy,
        events: broadcast::Sender<BookingEvent>,
    ) -> Self {
        Self {
            ledger,
            bookings,
            catalog,
            policy,
            events,
        }
    }

    /// Returns the new booking ids in leg order.
    pub async fn create_booking(
        &self,
        auth: &AuthContext,
        request: BookingRequest,
    ) -> CoreResult<Vec<Uuid>> {
        // 1. Identify the caller
        let caller = auth.caller()?;

        // 2. Shape of the itinerary
        validation::validate_itinerary(&request, &self.policy)?;

        // 3. Travel documents are needed as soon as one leg crosses a border
        let mut international = false;
        for leg in &request.legs {
            let route = self.catalog.route(leg.flight_id).await?;
            international |= route.is_international();
        }

        // 4. Manifest and contact details
        let today = Utc::now().date_naive();
        validation::validate_manifest(&request.passengers, international, today)?;
        validation::validate_contact(&request.contact)?;

        // 5. Reserve every leg as one unit
        let demand: Vec<(FareClassRef, u32)> = request
            .legs
            .iter()
            .map(|leg| (leg.clone(), request.seat_quantity))
            .collect();
        let reservations = self.ledger.reserve_all(&demand).await?;

        // 6. Persist bookings and contact, handing seats back on failure
        let bookings: Vec<Booking> = reservations
            .iter()
            .map(|r| Booking::new(caller.account_id, r, request.passengers.clone()))
            .collect();

        if let Err(err) = self
            .bookings
            .commit_purchase(caller.account_id, &bookings, &request.contact)
            .await
        {
            error!(
                "Persisting bookings for account {} failed, releasing seats: {}",
                caller.account_id, err
            );
            return Err(self.compensate(&reservations, err).await);
        }

        // 7. Notify
        let now = Utc::now().timestamp();
        for booking in &bookings {
            let _ = self.events.send(BookingEvent::BookingConfirmed {
                booking_id: booking.id,
                account_id: booking.account_id,
                flight_id: booking.fare.flight_id,
                fare_class: booking.fare.fare_class.clone(),
                seat_quantity: booking.seat_quantity,
                timestamp: now,
            });
        }

        let ids: Vec<Uuid> = bookings.iter().map(|b| b.id).collect();
        info!(
            "Account {} booked {} seat(s) on {} leg(s): {:?}",
            caller.account_id,
            request.seat_quantity,
            ids.len(),
            ids
        );

        Ok(ids)
    }

    async fn compensate(&self, reservations: &[Reservation], cause: CoreError) -> CoreError {
        let mut leaked = 0;
        for reservation in reservations {
            if let Err(err) = self.ledger.release(reservation).await {
                error!(
                    "Could not release {} seats on {}: {}",
                    reservation.quantity, reservation.fare, err
                );
                leaked += 1;
            }
        }

        if leaked == 0 {
            cause
        } else {
            CoreError::InternalError(format!(
                "{}; {} reservation(s) could not be released",
                cause, leaked
            ))
        }
    }
}
