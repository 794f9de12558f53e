mod common;

use async_trait::async_trait;
use common::*;
use skybook_core::booking::{Booking, BookingStatus, ContactInfo};
use skybook_core::repository::BookingRepository;
use skybook_core::{CoreError, CoreResult};
use skybook_order::{BookingPolicy, BookingService, InMemoryOrderStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Delegates reads to the in-memory store but refuses every purchase commit.
struct UnwritableBookings {
    inner: Arc<InMemoryOrderStore>,
}

#[async_trait]
impl BookingRepository for UnwritableBookings {
    async fn commit_purchase(
        &self,
        _account_id: Uuid,
        _bookings: &[Booking],
        _contact: &ContactInfo,
    ) -> CoreResult<()> {
        Err(CoreError::InternalError("disk full".to_string()))
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        self.inner.get(id).await
    }

    async fn list_by_account(&self, account_id: Uuid) -> CoreResult<Vec<Booking>> {
        self.inner.list_by_account(account_id).await
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        self.inner.list_by_status(status).await
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        self.inner.update_status_if(id, expected, next).await
    }
}

#[tokio::test]
async fn test_failed_commit_hands_every_leg_back() {
    let h = harness();
    let outbound = h.domestic(4);
    let inbound = h.domestic(3);

    let mut backends = h.backends.backends();
    backends.bookings = Arc::new(UnwritableBookings {
        inner: h.backends.store.clone(),
    });
    let (tx, mut rx) = broadcast::channel(16);
    let service = BookingService::new(backends, BookingPolicy::default(), tx);

    let owner = member();
    let err = service
        .create_booking(&owner, request(vec![outbound.clone(), inbound.clone()], 2))
        .await
        .unwrap_err();

    // The storage error comes through untouched
    match err {
        CoreError::InternalError(msg) => assert_eq!(msg, "disk full"),
        other => panic!("expected the commit error, got {:?}", other),
    }

    assert_eq!(h.available(&outbound).await, 4);
    assert_eq!(h.available(&inbound).await, 3);
    assert_eq!(h.backends.store.booking_count(), 0);
    assert!(service.list_bookings(&owner).await.unwrap().is_empty());
    assert!(rx.try_recv().is_err());
}
