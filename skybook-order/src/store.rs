use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use skybook_core::booking::{Booking, BookingStatus, ContactInfo};
use skybook_core::payment::{Card, Payment};
use skybook_core::repository::{AccountDirectory, BookingRepository, CardRepository, PaymentRepository};
use skybook_core::{CoreError, CoreResult};
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory bookings, payments, cards and account contacts.
///
/// Each map is guarded separately; operations that touch two maps take the locks in
/// declaration order.
pub struct InMemoryOrderStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
    contacts: RwLock<HashMap<Uuid, ContactInfo>>,
    payments: RwLock<HashMap<Uuid, Payment>>,
    cards: RwLock<HashMap<Uuid, Card>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            bookings: RwLock::new(HashMap::new()),
            contacts: RwLock::new(HashMap::new()),
            payments: RwLock::new(HashMap::new()),
            cards: RwLock::new(HashMap::new()),
        }
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.read().len()
    }

    fn sorted(mut bookings: Vec<Booking>) -> Vec<Booking> {
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        bookings
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryOrderStore {
    async fn commit_purchase(
        &self,
        account_id: Uuid,
        bookings: &[Booking],
        contact: &ContactInfo,
    ) -> CoreResult<()> {
        let mut stored = self.bookings.write();
        let mut contacts = self.contacts.write();

        if let Some(duplicate) = bookings.iter().find(|b| stored.contains_key(&b.id)) {
            return Err(CoreError::InternalError(format!(
                "booking {} already exists",
                duplicate.id
            )));
        }

        for booking in bookings {
            stored.insert(booking.id, booking.clone());
        }
        contacts.insert(account_id, contact.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.bookings.read().get(&id).cloned())
    }

    async fn list_by_account(&self, account_id: Uuid) -> CoreResult<Vec<Booking>> {
        let bookings = self
            .bookings
            .read()
            .values()
            .filter(|b| b.account_id == account_id)
            .cloned()
            .collect();
        Ok(Self::sorted(bookings))
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        let bookings = self
            .bookings
            .read()
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect();
        Ok(Self::sorted(bookings))
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let mut bookings = self.bookings.write();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", id)))?;

        if booking.status != expected {
            return Ok(None);
        }

        booking.update_status(next);
        Ok(Some(booking.clone()))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryOrderStore {
    async fn upsert_payment(&self, mut payment: Payment) -> CoreResult<Payment> {
        let mut payments = self.payments.write();

        let clash = payments
            .values()
            .any(|p| p.transaction_id == payment.transaction_id && p.booking_id != payment.booking_id);
        if clash {
            return Err(CoreError::InternalError(format!(
                "transaction id {} already recorded",
                payment.transaction_id
            )));
        }

        if let Some(existing) = payments.get(&payment.booking_id) {
            payment.id = existing.id;
            payment.created_at = existing.created_at;
            payment.updated_at = Utc::now();
        }

        payments.insert(payment.booking_id, payment.clone());
        Ok(payment)
    }

    async fn get_by_booking(&self, booking_id: Uuid) -> CoreResult<Option<Payment>> {
        Ok(self.payments.read().get(&booking_id).cloned())
    }

    async fn transaction_exists(&self, transaction_id: &str) -> CoreResult<bool> {
        Ok(self
            .payments
            .read()
            .values()
            .any(|p| p.transaction_id == transaction_id))
    }
}

#[async_trait]
impl CardRepository for InMemoryOrderStore {
    async fn upsert_card(&self, mut card: Card) -> CoreResult<Card> {
        let mut cards = self.cards.write();
        if let Some(existing) = cards.get(&card.owner_account_id) {
            card.id = existing.id;
        }
        cards.insert(card.owner_account_id, card.clone());
        Ok(card)
    }

    async fn get_by_owner(&self, account_id: Uuid) -> CoreResult<Option<Card>> {
        Ok(self.cards.read().get(&account_id).cloned())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryOrderStore {
    async fn contact(&self, account_id: Uuid) -> CoreResult<Option<ContactInfo>> {
        Ok(self.contacts.read().get(&account_id).cloned())
    }
}
