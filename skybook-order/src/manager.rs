use chrono::Utc;
use skybook_core::booking::{Booking, BookingStatus, CancellationDecision};
use skybook_core::identity::AuthContext;
use skybook_core::inventory::SeatLedger;
use skybook_core::repository::BookingRepository;
use skybook_core::{CoreError, CoreResult};
use skybook_shared::models::BookingEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Drives bookings through the cancellation-approval lifecycle.
///
/// Every transition is a compare-and-set on the stored status, so two racing resolutions
/// of the same booking can never both succeed and seats are handed back at most once.
pub struct BookingStateMachine {
    bookings: Arc<dyn BookingRepository>,
    ledger: Arc<dyn SeatLedger>,
    events: broadcast::Sender<BookingEvent>,
}

impl BookingStateMachine {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        ledger: Arc<dyn SeatLedger>,
        events: broadcast::Sender<BookingEvent>,
    ) -> Self {
        Self {
            bookings,
            ledger,
            events,
        }
    }

    /// Transition: Confirmed → PendingCancellation (owner only)
    pub async fn request_cancellation(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
    ) -> CoreResult<Booking> {
        let caller = auth.caller()?;
        let booking = self.load(booking_id).await?;

        if !booking.is_owned_by(caller.account_id) {
            warn!(
                "Account {} attempted to cancel booking {} it does not own",
                caller.account_id, booking_id
            );
            return Err(CoreError::PermissionDenied(format!(
                "booking {} belongs to another account",
                booking_id
            )));
        }

        let updated = self
            .transition(&booking, BookingStatus::Confirmed, BookingStatus::PendingCancellation)
            .await?;

        info!("Cancellation requested for booking {}", booking_id);
        let _ = self.events.send(BookingEvent::CancellationRequested {
            booking_id,
            account_id: caller.account_id,
            timestamp: Utc::now().timestamp(),
        });

        Ok(updated)
    }

    /// Transition: PendingCancellation → Canceled | DeniedCancellation (staff only)
    ///
    /// Approval hands the booking's seats back to the ledger.
    pub async fn resolve_cancellation(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
        decision: CancellationDecision,
    ) -> CoreResult<Booking> {
        let staff = auth.require_staff("resolving a cancellation")?;
        let booking = self.load(booking_id).await?;

        let updated = self
            .transition(&booking, BookingStatus::PendingCancellation, decision.target_status())
            .await?;

        let mut seats_released = 0;
        if decision == CancellationDecision::Approve {
            if let Err(err) = self.ledger.release(&updated.reservation()).await {
                error!(
                    "Booking {} is canceled but releasing {} seats on {} failed: {}",
                    booking_id, updated.seat_quantity, updated.fare, err
                );
                return Err(err);
            }
            seats_released = updated.seat_quantity;
        }

        info!(
            "Cancellation of booking {} resolved by {}: {}",
            booking_id, staff.account_id, updated.status
        );
        let _ = self.events.send(BookingEvent::CancellationResolved {
            booking_id,
            resolved_by: staff.account_id,
            status: updated.status.to_string(),
            seats_released,
            timestamp: Utc::now().timestamp(),
        });

        Ok(updated)
    }

    pub async fn list_pending_cancellations(&self, auth: &AuthContext) -> CoreResult<Vec<Booking>> {
        auth.require_staff("listing pending cancellations")?;
        self.bookings
            .list_by_status(BookingStatus::PendingCancellation)
            .await
    }

    pub async fn list_bookings(&self, auth: &AuthContext) -> CoreResult<Vec<Booking>> {
        let caller = auth.caller()?;
        self.bookings.list_by_account(caller.account_id).await
    }

    /// Owners see their own bookings; staff see any.
    pub async fn get_booking(&self, auth: &AuthContext, booking_id: Uuid) -> CoreResult<Booking> {
        let caller = auth.caller()?;
        let booking = self.load(booking_id).await?;
        if !caller.is_staff() && !booking.is_owned_by(caller.account_id) {
            return Err(CoreError::PermissionDenied(format!(
                "booking {} belongs to another account",
                booking_id
            )));
        }
        Ok(booking)
    }

    async fn load(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))
    }

    async fn transition(
        &self,
        booking: &Booking,
        from: BookingStatus,
        to: BookingStatus,
    ) -> CoreResult<Booking> {
        if booking.status != from {
            return Err(CoreError::InvalidStateTransition {
                from: booking.status.to_string(),
                to: to.to_string(),
            });
        }

        match self.bookings.update_status_if(booking.id, from, to).await? {
            Some(updated) => Ok(updated),
            None => {
                // Lost the race against a concurrent transition.
                let current = self.load(booking.id).await?;
                Err(CoreError::InvalidStateTransition {
                    from: current.status.to_string(),
                    to: to.to_string(),
                })
            }
        }
    }
}
