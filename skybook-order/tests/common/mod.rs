#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Utc};
use skybook_core::booking::{BookingRequest, ContactInfo, Passenger, TravelDocument};
use skybook_core::identity::{AuthContext, Caller};
use skybook_core::inventory::{FareClassRef, FlightRoute};
use skybook_core::payment::{CardDetails, PaymentRequest};
use skybook_order::{BookingPolicy, BookingService, InMemoryBackends};
use skybook_shared::models::BookingEvent;
use skybook_shared::pii::Masked;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub struct Harness {
    pub service: Arc<BookingService>,
    pub backends: InMemoryBackends,
    pub events: broadcast::Receiver<BookingEvent>,
}

pub fn harness() -> Harness {
    let backends = InMemoryBackends::new();
    let (tx, rx) = broadcast::channel(256);
    let service = BookingService::new(backends.backends(), BookingPolicy::default(), tx);
    Harness {
        service: Arc::new(service),
        backends,
        events: rx,
    }
}

impl Harness {
    /// Publish a flight between two countries with one fare class.
    pub fn flight(&self, from_country: &str, to_country: &str, fare_class: &str, seats: u32) -> FareClassRef {
        let flight_id = Uuid::new_v4();
        self.backends.catalog.add_route(FlightRoute {
            flight_id,
            flight_number: "SB100".to_string(),
            departure_airport: "AAA".to_string(),
            arrival_airport: "BBB".to_string(),
            departure_country: from_country.to_string(),
            arrival_country: to_country.to_string(),
        });
        let fare = FareClassRef::new(flight_id, fare_class);
        self.backends.ledger.publish(fare.clone(), 1_000_000, seats);
        fare
    }

    pub fn domestic(&self, seats: u32) -> FareClassRef {
        self.flight("Kenya", "Kenya", "ECONOMY", seats)
    }

    pub async fn available(&self, fare: &FareClassRef) -> u32 {
        use skybook_core::inventory::SeatLedger;
        self.backends.ledger.fare_class(fare).await.unwrap().available_seats
    }
}

pub fn member() -> AuthContext {
    Caller::member(Uuid::new_v4()).into()
}

pub fn staff() -> AuthContext {
    Caller::staff(Uuid::new_v4()).into()
}

pub fn passenger(with_passport: bool) -> Passenger {
    Passenger {
        first_name: "Wanjiru".to_string(),
        last_name: "Kamau".to_string(),
        gender: None,
        date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 12).unwrap(),
        document: with_passport.then(|| TravelDocument {
            passport_number: "AK1234567".to_string(),
            nationality: "Kenyan".to_string(),
            expiry_date: Utc::now().date_naive() + chrono::Duration::days(3650),
        }),
    }
}

pub fn contact() -> ContactInfo {
    ContactInfo {
        phone_number: "+254700000001".to_string(),
        email: "traveller@example.com".to_string(),
    }
}

pub fn request(legs: Vec<FareClassRef>, seats: u32) -> BookingRequest {
    BookingRequest {
        legs,
        seat_quantity: seats,
        passengers: (0..seats).map(|_| passenger(false)).collect(),
        contact: contact(),
    }
}

pub fn card() -> CardDetails {
    CardDetails {
        number: Masked("5500000000000004".to_string()),
        holder_name: Masked("Wanjiru Kamau".to_string()),
        expiry_month: 6,
        expiry_year: Utc::now().year() + 2,
        card_type: "MasterCard".to_string(),
        billing_address: "Moi Avenue 1, Nairobi".to_string(),
    }
}

pub fn payment(amount_nuc: i64, voucher_code: Option<&str>) -> PaymentRequest {
    PaymentRequest {
        card: card(),
        amount_nuc,
        method: "CREDIT_CARD".to_string(),
        voucher_code: voucher_code.map(str::to_string),
    }
}
