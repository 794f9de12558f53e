use skybook_order::BookingService;
use skybook_shared::models::BookingEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BookingService>,
    pub auth: AuthConfig,
    pub events: broadcast::Sender<BookingEvent>,
}
