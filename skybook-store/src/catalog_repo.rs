use async_trait::async_trait;
use skybook_core::booking::ContactInfo;
use skybook_core::inventory::FlightRoute;
use skybook_core::repository::{AccountDirectory, FlightCatalog};
use skybook_core::{CoreError, CoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

/// Read side of the flight catalogue maintained by the surrounding application.
pub struct StoreFlightCatalog {
    pool: PgPool,
}

impl StoreFlightCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    flight_id: Uuid,
    flight_number: String,
    departure_airport: String,
    arrival_airport: String,
    departure_country: String,
    arrival_country: String,
}

#[async_trait]
impl FlightCatalog for StoreFlightCatalog {
    async fn route(&self, flight_id: Uuid) -> CoreResult<FlightRoute> {
        let row = sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT f.id AS flight_id, f.flight_number, f.departure_airport, f.arrival_airport,
                   dep.country AS departure_country, arr.country AS arrival_country
            FROM flights f
            JOIN airports dep ON dep.code = f.departure_airport
            JOIN airports arr ON arr.code = f.arrival_airport
            WHERE f.id = $1
            "#,
        )
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))?;

        Ok(FlightRoute {
            flight_id: row.flight_id,
            flight_number: row.flight_number,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            departure_country: row.departure_country,
            arrival_country: row.arrival_country,
        })
    }
}

pub struct StoreAccountDirectory {
    pool: PgPool,
}

impl StoreAccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    email: Option<String>,
    phone_number: Option<String>,
}

#[async_trait]
impl AccountDirectory for StoreAccountDirectory {
    async fn contact(&self, account_id: Uuid) -> CoreResult<Option<ContactInfo>> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT email, phone_number FROM accounts WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.and_then(|r| match (r.email, r.phone_number) {
            (Some(email), Some(phone_number)) => Some(ContactInfo { phone_number, email }),
            _ => None,
        }))
    }
}
