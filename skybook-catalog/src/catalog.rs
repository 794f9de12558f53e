use async_trait::async_trait;
use parking_lot::RwLock;
use skybook_core::inventory::FlightRoute;
use skybook_core::repository::FlightCatalog;
use skybook_core::{CoreError, CoreResult};
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory flight catalogue
pub struct InMemoryFlightCatalog {
    routes: RwLock<HashMap<Uuid, FlightRoute>>,
}

impl InMemoryFlightCatalog {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_route(&self, route: FlightRoute) {
        self.routes.write().insert(route.flight_id, route);
    }
}

impl Default for InMemoryFlightCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightCatalog for InMemoryFlightCatalog {
    async fn route(&self, flight_id: Uuid) -> CoreResult<FlightRoute> {
        self.routes
            .read()
            .get(&flight_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_id)))
    }
}
