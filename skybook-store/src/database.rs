use skybook_core::CoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Storage failures surface as `InternalError`; the details only go to the log.
pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    error!("Database error: {}", err);
    CoreError::InternalError("storage failure".to_string())
}

/// Seat counts are `INTEGER` columns.
pub(crate) fn seats_param(quantity: u32) -> Result<i32, CoreError> {
    i32::try_from(quantity)
        .map_err(|_| CoreError::validation("seat_quantity", "is out of range"))
}

pub(crate) fn seats_value(column: i32) -> u32 {
    u32::try_from(column).unwrap_or(0)
}
