use async_trait::async_trait;
use skybook_core::inventory::{FareClassInventory, FareClassRef, Reservation, SeatLedger};
use skybook_core::{CoreError, CoreResult};
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::{db_error, seats_param, seats_value};

/// Seat ledger on the `fare_classes` table.
///
/// Single reservations are one guarded `UPDATE`; multi-leg reservations lock the rows
/// with `SELECT ... FOR UPDATE` in key order inside one transaction.
pub struct StoreSeatLedger {
    pool: PgPool,
}

impl StoreSeatLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn out_of_inventory(fare: &FareClassRef, requested: u32, available: i32) -> CoreError {
        CoreError::OutOfInventory {
            fare_class: fare.to_string(),
            requested,
            available: seats_value(available),
        }
    }

    fn not_found(fare: &FareClassRef) -> CoreError {
        CoreError::NotFound(format!("fare class {}", fare))
    }
}

#[derive(sqlx::FromRow)]
struct FareClassRow {
    price_nuc: i64,
    available_seats: i32,
}

#[async_trait]
impl SeatLedger for StoreSeatLedger {
    async fn fare_class(&self, fare: &FareClassRef) -> CoreResult<FareClassInventory> {
        let row = sqlx::query_as::<_, FareClassRow>(
            "SELECT price_nuc, available_seats FROM fare_classes WHERE flight_id = $1 AND fare_class = $2",
        )
        .bind(fare.flight_id)
        .bind(&fare.fare_class)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| Self::not_found(fare))?;

        Ok(FareClassInventory {
            fare: fare.clone(),
            price_nuc: row.price_nuc,
            available_seats: seats_value(row.available_seats),
        })
    }

    async fn reserve(&self, fare: &FareClassRef, quantity: u32) -> CoreResult<Reservation> {
        if quantity == 0 {
            return Err(CoreError::validation("seat_quantity", "must be at least 1"));
        }
        let qty = seats_param(quantity)?;

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE fare_classes
            SET available_seats = available_seats - $3
            WHERE flight_id = $1 AND fare_class = $2 AND available_seats >= $3
            RETURNING available_seats
            "#,
        )
        .bind(fare.flight_id)
        .bind(&fare.fare_class)
        .bind(qty)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match remaining {
            Some(left) => {
                debug!("Reserved {} seats on {} ({} left)", quantity, fare, left);
                Ok(Reservation::new(fare.clone(), quantity))
            }
            None => {
                // Either the fare class is unknown or the guard refused the decrement.
                let current = self.fare_class(fare).await?;
                warn!(
                    "Reservation refused on {}: requested {}, available {}",
                    fare, quantity, current.available_seats
                );
                Err(CoreError::OutOfInventory {
                    fare_class: fare.to_string(),
                    requested: quantity,
                    available: current.available_seats,
                })
            }
        }
    }

    async fn release(&self, reservation: &Reservation) -> CoreResult<()> {
        let qty = seats_param(reservation.quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE fare_classes
            SET available_seats = available_seats + $3
            WHERE flight_id = $1 AND fare_class = $2
            "#,
        )
        .bind(reservation.fare.flight_id)
        .bind(&reservation.fare.fare_class)
        .bind(qty)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(&reservation.fare));
        }

        debug!("Released {} seats on {}", reservation.quantity, reservation.fare);
        Ok(())
    }

    async fn reserve_all(&self, requests: &[(FareClassRef, u32)]) -> CoreResult<Vec<Reservation>> {
        let mut demand: BTreeMap<&FareClassRef, u32> = BTreeMap::new();
        for (fare, quantity) in requests {
            if *quantity == 0 {
                return Err(CoreError::validation("seat_quantity", "must be at least 1"));
            }
            *demand.entry(fare).or_insert(0) += *quantity;
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Lock every row in key order and check availability
        for (fare, quantity) in &demand {
            let available: Option<i32> = sqlx::query_scalar(
                "SELECT available_seats FROM fare_classes WHERE flight_id = $1 AND fare_class = $2 FOR UPDATE",
            )
            .bind(fare.flight_id)
            .bind(&fare.fare_class)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

            let available = available.ok_or_else(|| Self::not_found(fare))?;
            if i64::from(available) < i64::from(*quantity) {
                // Dropping the transaction rolls it back.
                return Err(Self::out_of_inventory(fare, *quantity, available));
            }
        }

        // 2. Decrement under the locks
        for (fare, quantity) in &demand {
            sqlx::query(
                "UPDATE fare_classes SET available_seats = available_seats - $3 WHERE flight_id = $1 AND fare_class = $2",
            )
            .bind(fare.flight_id)
            .bind(&fare.fare_class)
            .bind(seats_param(*quantity)?)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        Ok(requests
            .iter()
            .map(|(fare, quantity)| Reservation {
                id: Uuid::new_v4(),
                fare: fare.clone(),
                quantity: *quantity,
            })
            .collect())
    }
}
