use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use skybook_core::inventory::{FareClassInventory, FareClassRef, Reservation, SeatLedger};
use skybook_core::{CoreError, CoreResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Seat pool of one fare class.
#[derive(Debug)]
struct SeatPool {
    price_nuc: i64,
    capacity: u32,
    available_seats: u32,
}

impl SeatPool {
    fn assert_invariants(&self) {
        debug_assert!(
            self.available_seats <= self.capacity,
            "Invariant violated: {} seats available in a pool of {}",
            self.available_seats,
            self.capacity
        );
    }

    fn take(&mut self, quantity: u32) {
        self.available_seats -= quantity;
        self.assert_invariants();
    }

    fn give_back(&mut self, quantity: u32) {
        self.available_seats = self.available_seats.saturating_add(quantity);
        self.assert_invariants();
    }
}

/// In-memory seat ledger.
///
/// Each fare class sits behind its own mutex so reservations on different fare classes
/// never contend. Multi-pool reservations lock pools in key order.
pub struct InMemorySeatLedger {
    pools: RwLock<HashMap<FareClassRef, Arc<Mutex<SeatPool>>>>,
}

impl InMemorySeatLedger {
    pub fn new() -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Publish a fare class with a pool of `seats` seats.
    ///
    /// Re-publishing resizes the existing pool in place: seats held by outstanding
    /// reservations stay held, and the pool never shrinks below them.
    pub fn publish(&self, fare: FareClassRef, price_nuc: i64, seats: u32) {
        let mut pools = self.pools.write();
        if let Some(pool) = pools.get(&fare) {
            let mut guard = pool.lock();
            let outstanding = guard.capacity - guard.available_seats;
            if seats < outstanding {
                warn!(
                    "Re-publishing {} with {} seats while {} are reserved; keeping {}",
                    fare, seats, outstanding, outstanding
                );
            }
            guard.price_nuc = price_nuc;
            guard.capacity = seats.max(outstanding);
            guard.available_seats = guard.capacity - outstanding;
            guard.assert_invariants();
            return;
        }

        pools.insert(
            fare,
            Arc::new(Mutex::new(SeatPool {
                price_nuc,
                capacity: seats,
                available_seats: seats,
            })),
        );
    }

    fn pool(&self, fare: &FareClassRef) -> CoreResult<Arc<Mutex<SeatPool>>> {
        self.pools
            .read()
            .get(fare)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("fare class {}", fare)))
    }

    fn reserve_locked(&self, requests: &[(FareClassRef, u32)]) -> CoreResult<Vec<Reservation>> {
        // Merge duplicate keys so the check sees the total demand per pool.
        let mut demand: BTreeMap<&FareClassRef, u32> = BTreeMap::new();
        for (fare, quantity) in requests {
            *demand.entry(fare).or_insert(0) += *quantity;
        }

        let pools = demand
            .iter()
            .map(|(fare, quantity)| -> CoreResult<_> { Ok((*fare, *quantity, self.pool(fare)?)) })
            .collect::<CoreResult<Vec<_>>>()?;

        let mut guards: Vec<_> = pools.iter().map(|(_, _, pool)| pool.lock()).collect();

        for ((fare, quantity, _), guard) in pools.iter().zip(guards.iter()) {
            if guard.available_seats < *quantity {
                return Err(CoreError::OutOfInventory {
                    fare_class: fare.to_string(),
                    requested: *quantity,
                    available: guard.available_seats,
                });
            }
        }

        for ((_, quantity, _), guard) in pools.iter().zip(guards.iter_mut()) {
            guard.take(*quantity);
        }

        Ok(requests
            .iter()
            .map(|(fare, quantity)| Reservation::new(fare.clone(), *quantity))
            .collect())
    }
}

impl Default for InMemorySeatLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeatLedger for InMemorySeatLedger {
    async fn fare_class(&self, fare: &FareClassRef) -> CoreResult<FareClassInventory> {
        let pool = self.pool(fare)?;
        let guard = pool.lock();
        Ok(FareClassInventory {
            fare: fare.clone(),
            price_nuc: guard.price_nuc,
            available_seats: guard.available_seats,
        })
    }

    async fn reserve(&self, fare: &FareClassRef, quantity: u32) -> CoreResult<Reservation> {
        if quantity == 0 {
            return Err(CoreError::validation("seat_quantity", "must be at least 1"));
        }

        let pool = self.pool(fare)?;
        let mut guard = pool.lock();

        if guard.available_seats < quantity {
            warn!(
                "Reservation refused on {}: requested {}, available {}",
                fare, quantity, guard.available_seats
            );
            return Err(CoreError::OutOfInventory {
                fare_class: fare.to_string(),
                requested: quantity,
                available: guard.available_seats,
            });
        }

        guard.take(quantity);
        debug!("Reserved {} seats on {} ({} left)", quantity, fare, guard.available_seats);

        Ok(Reservation::new(fare.clone(), quantity))
    }

    async fn release(&self, reservation: &Reservation) -> CoreResult<()> {
        let pool = self.pool(&reservation.fare)?;
        let mut guard = pool.lock();
        guard.give_back(reservation.quantity);
        debug!(
            "Released {} seats on {} ({} left)",
            reservation.quantity, reservation.fare, guard.available_seats
        );
        Ok(())
    }

    async fn reserve_all(&self, requests: &[(FareClassRef, u32)]) -> CoreResult<Vec<Reservation>> {
        if requests.iter().any(|(_, quantity)| *quantity == 0) {
            return Err(CoreError::validation("seat_quantity", "must be at least 1"));
        }
        self.reserve_locked(requests)
    }
}
