use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skybook_core::booking::{Booking, BookingStatus, ContactInfo, Gender, Passenger, TravelDocument};
use skybook_core::inventory::FareClassRef;
use skybook_core::repository::BookingRepository;
use skybook_core::{CoreError, CoreResult};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::{db_error, seats_param, seats_value};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str =
    "id, account_id, flight_id, fare_class, seat_quantity, reservation_id, status, created_at, updated_at";

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    account_id: Uuid,
    flight_id: Uuid,
    fare_class: String,
    seat_quantity: i32,
    reservation_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    booking_id: Uuid,
    first_name: String,
    last_name: String,
    gender: Option<String>,
    date_of_birth: NaiveDate,
    passport_number: Option<String>,
    nationality: Option<String>,
    passport_expiry: Option<NaiveDate>,
}

impl PassengerRow {
    fn into_passenger(self) -> CoreResult<Passenger> {
        let gender = self
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|e| CoreError::InternalError(e.to_string()))?;

        let document = match (self.passport_number, self.nationality, self.passport_expiry) {
            (Some(passport_number), Some(nationality), Some(expiry_date)) => Some(TravelDocument {
                passport_number,
                nationality,
                expiry_date,
            }),
            _ => None,
        };

        Ok(Passenger {
            first_name: self.first_name,
            last_name: self.last_name,
            gender,
            date_of_birth: self.date_of_birth,
            document,
        })
    }
}

fn into_booking(row: BookingRow, passengers: Vec<Passenger>) -> CoreResult<Booking> {
    Ok(Booking {
        id: row.id,
        account_id: row.account_id,
        fare: FareClassRef::new(row.flight_id, row.fare_class),
        seat_quantity: seats_value(row.seat_quantity),
        reservation_id: row.reservation_id,
        status: row.status.parse()?,
        passengers,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl StoreBookingRepository {
    /// Attach manifests to booking rows.
    async fn hydrate(&self, rows: Vec<BookingRow>) -> CoreResult<Vec<Booking>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let passenger_rows = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT booking_id, first_name, last_name, gender, date_of_birth,
                   passport_number, nationality, passport_expiry
            FROM passengers
            WHERE booking_id = ANY($1)
            ORDER BY booking_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut manifests: HashMap<Uuid, Vec<Passenger>> = HashMap::new();
        for row in passenger_rows {
            let booking_id = row.booking_id;
            manifests
                .entry(booking_id)
                .or_default()
                .push(row.into_passenger()?);
        }

        rows.into_iter()
            .map(|row| {
                let passengers = manifests.remove(&row.id).unwrap_or_default();
                into_booking(row, passengers)
            })
            .collect()
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn commit_purchase(
        &self,
        account_id: Uuid,
        bookings: &[Booking],
        contact: &ContactInfo,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, phone_number)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email, phone_number = EXCLUDED.phone_number, updated_at = NOW()
            "#,
        )
        .bind(account_id)
        .bind(contact.email.trim())
        .bind(contact.phone_number.trim())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for booking in bookings {
            sqlx::query(
                r#"
                INSERT INTO bookings (id, account_id, flight_id, fare_class, seat_quantity, reservation_id, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(booking.id)
            .bind(booking.account_id)
            .bind(booking.fare.flight_id)
            .bind(&booking.fare.fare_class)
            .bind(seats_param(booking.seat_quantity)?)
            .bind(booking.reservation_id)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            for (position, passenger) in booking.passengers.iter().enumerate() {
                let document = passenger.document.as_ref();
                sqlx::query(
                    r#"
                    INSERT INTO passengers (id, booking_id, position, first_name, last_name, gender,
                                            date_of_birth, passport_number, nationality, passport_expiry)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(booking.id)
                .bind(position as i32)
                .bind(passenger.first_name.trim())
                .bind(passenger.last_name.trim())
                .bind(passenger.gender.map(|g| g.as_str()))
                .bind(passenger.date_of_birth)
                .bind(document.map(|d| d.passport_number.trim().to_string()))
                .bind(document.map(|d| d.nationality.trim().to_string()))
                .bind(document.map(|d| d.expiry_date))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_by_account(&self, account_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE account_id = $1 ORDER BY created_at, id",
            BOOKING_COLUMNS
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        self.hydrate(rows).await
    }

    async fn list_by_status(&self, status: BookingStatus) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE status = $1 ORDER BY created_at, id",
            BOOKING_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        self.hydrate(rows).await
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(db_error)?;
                if exists {
                    Ok(None)
                } else {
                    Err(CoreError::NotFound(format!("booking {}", id)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passenger_row_without_full_document() {
        let row = PassengerRow {
            booking_id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            gender: Some("FEMALE".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            passport_number: Some("X123456".to_string()),
            nationality: None,
            passport_expiry: None,
        };
        let passenger = row.into_passenger().unwrap();
        assert_eq!(passenger.gender, Some(Gender::Female));
        assert!(passenger.document.is_none());
    }

    #[test]
    fn test_unknown_status_is_an_internal_error() {
        let row = BookingRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            flight_id: Uuid::new_v4(),
            fare_class: "ECONOMY".to_string(),
            seat_quantity: 2,
            reservation_id: Uuid::new_v4(),
            status: "PAID".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(into_booking(row, vec![]), Err(CoreError::InternalError(_))));
    }
}
