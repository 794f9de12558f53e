use chrono::Utc;
use skybook_catalog::{InMemoryFlightCatalog, InMemorySeatLedger, InMemoryVoucherBook, VoucherEngine};
use skybook_core::booking::{Booking, BookingRequest, CancellationDecision, ContactInfo};
use skybook_core::identity::AuthContext;
use skybook_core::inventory::SeatLedger;
use skybook_core::payment::{CardDetails, PaymentReceipt, PaymentRequest};
use skybook_core::repository::{
    AccountDirectory, BookingRepository, CardRepository, FlightCatalog, PaymentRepository,
    VoucherRepository,
};
use skybook_core::CoreResult;
use skybook_shared::models::BookingEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::coordinator::BookingCoordinator;
use crate::manager::BookingStateMachine;
use crate::orchestrator::PaymentRecorder;
use crate::policy::BookingPolicy;
use crate::store::InMemoryOrderStore;

/// Storage and catalogue collaborators the engine runs against.
#[derive(Clone)]
pub struct Backends {
    pub ledger: Arc<dyn SeatLedger>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub cards: Arc<dyn CardRepository>,
    pub vouchers: Arc<dyn VoucherRepository>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub catalog: Arc<dyn FlightCatalog>,
}

/// Concrete handles of an in-memory deployment, for seeding and inspection.
#[derive(Clone)]
pub struct InMemoryBackends {
    pub ledger: Arc<InMemorySeatLedger>,
    pub store: Arc<InMemoryOrderStore>,
    pub vouchers: Arc<InMemoryVoucherBook>,
    pub catalog: Arc<InMemoryFlightCatalog>,
}

impl InMemoryBackends {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(InMemorySeatLedger::new()),
            store: Arc::new(InMemoryOrderStore::new()),
            vouchers: Arc::new(InMemoryVoucherBook::new()),
            catalog: Arc::new(InMemoryFlightCatalog::new()),
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            ledger: self.ledger.clone(),
            bookings: self.store.clone(),
            payments: self.store.clone(),
            cards: self.store.clone(),
            vouchers: self.vouchers.clone(),
            accounts: self.store.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl Default for InMemoryBackends {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point for every booking operation.
pub struct BookingService {
    coordinator: BookingCoordinator,
    state_machine: BookingStateMachine,
    payments: PaymentRecorder,
    vouchers: VoucherEngine,
    accounts: Arc<dyn AccountDirectory>,
}

impl BookingService {
    pub fn new(
        backends: Backends,
        policy: BookingPolicy,
        events: broadcast::Sender<BookingEvent>,
    ) -> Self {
        let vouchers = VoucherEngine::new(backends.vouchers.clone());

        Self {
            coordinator: BookingCoordinator::new(
                backends.ledger.clone(),
                backends.bookings.clone(),
                backends.catalog.clone(),
                policy.clone(),
                events.clone(),
            ),
            state_machine: BookingStateMachine::new(
                backends.bookings.clone(),
                backends.ledger.clone(),
                events.clone(),
            ),
            payments: PaymentRecorder::new(
                backends.bookings,
                backends.payments,
                backends.cards,
                vouchers.clone(),
                policy,
                events,
            ),
            vouchers,
            accounts: backends.accounts,
        }
    }

    pub async fn create_booking(
        &self,
        auth: &AuthContext,
        request: BookingRequest,
    ) -> CoreResult<Vec<Uuid>> {
        self.coordinator.create_booking(auth, request).await
    }

    pub async fn record_payment(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
        request: PaymentRequest,
    ) -> CoreResult<PaymentReceipt> {
        self.payments.record_payment(auth, booking_id, request).await
    }

    pub async fn record_purchase_payments(
        &self,
        auth: &AuthContext,
        legs: &[(Uuid, i64)],
        card: &CardDetails,
        method: &str,
    ) -> CoreResult<Vec<PaymentReceipt>> {
        self.payments
            .record_purchase_payments(auth, legs, card, method)
            .await
    }

    pub async fn request_cancellation(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
    ) -> CoreResult<Booking> {
        self.state_machine.request_cancellation(auth, booking_id).await
    }

    pub async fn resolve_cancellation(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
        decision: CancellationDecision,
    ) -> CoreResult<Booking> {
        self.state_machine
            .resolve_cancellation(auth, booking_id, decision)
            .await
    }

    pub async fn list_pending_cancellations(&self, auth: &AuthContext) -> CoreResult<Vec<Booking>> {
        self.state_machine.list_pending_cancellations(auth).await
    }

    pub async fn list_bookings(&self, auth: &AuthContext) -> CoreResult<Vec<Booking>> {
        self.state_machine.list_bookings(auth).await
    }

    pub async fn get_booking(&self, auth: &AuthContext, booking_id: Uuid) -> CoreResult<Booking> {
        self.state_machine.get_booking(auth, booking_id).await
    }

    /// Consumes one unit of the voucher.
    pub async fn price_with_voucher(
        &self,
        auth: &AuthContext,
        base_nuc: i64,
        code: &str,
    ) -> CoreResult<i64> {
        auth.caller()?;
        self.vouchers
            .price_with_voucher(base_nuc, code, Utc::now().date_naive())
            .await
    }

    pub async fn contact_info(&self, auth: &AuthContext) -> CoreResult<Option<ContactInfo>> {
        let caller = auth.caller()?;
        self.accounts.contact(caller.account_id).await
    }
}
