use anyhow::Context;
use skybook_api::{
    app, spawn_event_logger,
    state::{AppState, AuthConfig},
};
use skybook_order::{Backends, BookingPolicy, BookingService};
use skybook_store::{
    app_config::Config, DbClient, StoreAccountDirectory, StoreBookingRepository,
    StoreFlightCatalog, StorePaymentRepository, StoreSeatLedger, StoreVoucherRepository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skybook_api=debug,skybook_order=info,skybook_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting SkyBook API on port {}", config.server.port);

    // Postgres Connection
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;
    let pool = db.pool.clone();

    let payments = Arc::new(StorePaymentRepository::new(pool.clone()));
    let backends = Backends {
        ledger: Arc::new(StoreSeatLedger::new(pool.clone())),
        bookings: Arc::new(StoreBookingRepository::new(pool.clone())),
        payments: payments.clone(),
        cards: payments,
        vouchers: Arc::new(StoreVoucherRepository::new(pool.clone())),
        accounts: Arc::new(StoreAccountDirectory::new(pool.clone())),
        catalog: Arc::new(StoreFlightCatalog::new(pool)),
    };

    let rules = &config.business_rules;
    let policy = BookingPolicy {
        max_seats_per_booking: rules.max_seats_per_booking,
        card_expiry_window_years: rules.card_expiry_window_years,
        transaction_id_attempts: rules.transaction_id_attempts,
    };

    // Booking Event Channel
    let (events, events_rx) = tokio::sync::broadcast::channel(100);
    spawn_event_logger(events_rx);

    let app_state = AppState {
        service: Arc::new(BookingService::new(backends, policy, events.clone())),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        events,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
