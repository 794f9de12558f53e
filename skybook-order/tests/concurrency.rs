mod common;

use common::*;
use skybook_core::booking::{BookingStatus, CancellationDecision};
use skybook_core::CoreError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_goes_to_exactly_one_booker() {
    let h = harness();
    let fare = h.domestic(1);

    let a = {
        let service = h.service.clone();
        let fare = fare.clone();
        tokio::spawn(async move { service.create_booking(&member(), request(vec![fare], 1)).await })
    };
    let b = {
        let service = h.service.clone();
        let fare = fare.clone();
        tokio::spawn(async move { service.create_booking(&member(), request(vec![fare], 1)).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let confirmed = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(CoreError::OutOfInventory { .. })))
        .count();

    assert_eq!(confirmed, 1);
    assert_eq!(sold_out, 1);
    assert_eq!(h.available(&fare).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_bookers_never_oversell() {
    let h = harness();
    let fare = h.domestic(7);

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let service = h.service.clone();
            let fare = fare.clone();
            tokio::spawn(async move { service.create_booking(&member(), request(vec![fare], 1)).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 7);
    assert_eq!(h.available(&fare).await, 0);
    assert_eq!(h.backends.store.booking_count(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_approvals_release_once() {
    let h = harness();
    let fare = h.domestic(5);
    let owner = member();

    let ids = h.service.create_booking(&owner, request(vec![fare.clone()], 3)).await.unwrap();
    h.service.request_cancellation(&owner, ids[0]).await.unwrap();
    assert_eq!(h.available(&fare).await, 2);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = h.service.clone();
            let id = ids[0];
            tokio::spawn(async move {
                service
                    .resolve_cancellation(&staff(), id, CancellationDecision::Approve)
                    .await
            })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(booking) => {
                assert_eq!(booking.status, BookingStatus::Canceled);
                approved += 1;
            }
            Err(err) => assert!(matches!(err, CoreError::InvalidStateTransition { .. })),
        }
    }

    assert_eq!(approved, 1);
    assert_eq!(h.available(&fare).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crossing_round_trips_do_not_deadlock() {
    let h = harness();
    let x = h.domestic(50);
    let y = h.domestic(50);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = h.service.clone();
            let legs = if i % 2 == 0 {
                vec![x.clone(), y.clone()]
            } else {
                vec![y.clone(), x.clone()]
            };
            tokio::spawn(async move { service.create_booking(&member(), request(legs, 2)).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(h.available(&x).await, 10);
    assert_eq!(h.available(&y).await, 10);
}
