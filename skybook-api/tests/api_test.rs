use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Datelike, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use skybook_api::{
    app,
    middleware::Claims,
    state::{AppState, AuthConfig},
};
use skybook_core::inventory::{FareClassRef, FlightRoute, SeatLedger};
use skybook_order::{BookingPolicy, BookingService, InMemoryBackends};
use skybook_shared::models::BookingEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    backends: InMemoryBackends,
    events: broadcast::Receiver<BookingEvent>,
}

fn test_app() -> TestApp {
    let backends = InMemoryBackends::new();
    let (tx, rx) = broadcast::channel(64);
    let service = BookingService::new(backends.backends(), BookingPolicy::default(), tx.clone());
    let state = AppState {
        service: Arc::new(service),
        auth: AuthConfig { secret: SECRET.to_string() },
        events: tx,
    };
    TestApp { router: app(state), backends, events: rx }
}

impl TestApp {
    fn publish(&self, seats: u32) -> FareClassRef {
        let flight_id = Uuid::new_v4();
        self.backends.catalog.add_route(FlightRoute {
            flight_id,
            flight_number: "SB204".to_string(),
            departure_airport: "NBO".to_string(),
            arrival_airport: "MBA".to_string(),
            departure_country: "Kenya".to_string(),
            arrival_country: "Kenya".to_string(),
        });
        let fare = FareClassRef::new(flight_id, "ECONOMY");
        self.backends.ledger.publish(fare.clone(), 1_000_000, seats);
        fare
    }

    async fn available(&self, fare: &FareClassRef) -> u32 {
        self.backends.ledger.fare_class(fare).await.unwrap().available_seats
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

fn token(account_id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: account_id.to_string(),
        role: role.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn booking_body(fare: &FareClassRef, seats: u32) -> Value {
    let passengers: Vec<Value> = (0..seats)
        .map(|i| {
            json!({
                "first_name": "Amani",
                "last_name": format!("Otieno-{}", ["a", "b", "c"][i as usize % 3]),
                "date_of_birth": "1990-02-14",
            })
        })
        .collect();

    json!({
        "legs": [{ "flight_id": fare.flight_id, "fare_class": fare.fare_class }],
        "seat_quantity": seats,
        "passengers": passengers,
        "contact": { "phone_number": "+254711000222", "email": "amani@example.com" },
    })
}

fn payment_body(amount_nuc: i64) -> Value {
    json!({
        "card": {
            "number": "4111111111111111",
            "holder_name": "Amani Otieno",
            "expiry_month": 9,
            "expiry_year": Utc::now().year() + 3,
            "card_type": "Visa",
            "billing_address": "Kenyatta Avenue 5, Nairobi",
        },
        "amount_nuc": amount_nuc,
        "method": "CREDIT_CARD",
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_booking_lifecycle_over_http() {
    let mut app = test_app();
    let fare = app.publish(5);
    let member = token(Uuid::new_v4(), "MEMBER");
    let staff = token(Uuid::new_v4(), "STAFF");

    // 1. Book two seats
    let (status, body) = app
        .call("POST", "/v1/bookings", Some(&member), Some(booking_body(&fare, 2)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let booking_id = body["booking_ids"][0].as_str().unwrap().to_string();
    assert_eq!(app.available(&fare).await, 3);

    let (status, body) = app.call("GET", "/v1/bookings", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "CONFIRMED");

    // 2. Pay
    let (status, body) = app
        .call(
            "POST",
            &format!("/v1/bookings/{}/payment", booking_id),
            Some(&member),
            Some(payment_body(2_000_000)),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["transaction_id"].as_str().unwrap().starts_with("TXN-"));
    assert_eq!(body["card_number_masked"], "**** **** **** 1111");

    // 3. Request cancellation
    let (status, body) = app
        .call("POST", &format!("/v1/bookings/{}/cancellation", booking_id), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING_CANCELLATION");
    assert_eq!(app.available(&fare).await, 3);

    // 4. Members cannot see the staff queue
    let (status, _) = app.call("GET", "/v1/admin/cancellations", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call("GET", "/v1/admin/cancellations", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // 5. Approve, seats come back once
    let uri = format!("/v1/admin/cancellations/{}", booking_id);
    let (status, body) = app
        .call("POST", &uri, Some(&staff), Some(json!({ "decision": "APPROVE" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELED");
    assert_eq!(app.available(&fare).await, 5);

    let (status, _) = app
        .call("POST", &uri, Some(&staff), Some(json!({ "decision": "APPROVE" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.available(&fare).await, 5);

    let mut kinds = Vec::new();
    while let Ok(event) = app.events.try_recv() {
        kinds.push(serde_json::to_value(&event).unwrap()["type"].clone());
    }
    assert!(kinds.contains(&json!("BOOKING_CONFIRMED")), "{kinds:?}");
}

#[tokio::test]
async fn test_authentication_failures() {
    let app = test_app();
    let fare = app.publish(5);

    let (status, _) = app
        .call("POST", "/v1/bookings", None, Some(booking_body(&fare, 1)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("GET", "/v1/bookings", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "STAFF".to_string(),
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"other-secret")).unwrap()
    };
    let (status, _) = app.call("GET", "/v1/admin/cancellations", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.available(&fare).await, 5);
}

#[tokio::test]
async fn test_rejections_map_to_client_errors() {
    let app = test_app();
    let fare = app.publish(1);
    let member = token(Uuid::new_v4(), "MEMBER");

    let (status, body) = app
        .call("POST", "/v1/bookings", Some(&member), Some(booking_body(&fare, 2)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let mut bad = booking_body(&fare, 1);
    bad["contact"]["email"] = json!("not-an-email");
    let (status, body) = app.call("POST", "/v1/bookings", Some(&member), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    let (status, _) = app
        .call(
            "POST",
            &format!("/v1/bookings/{}/cancellation", Uuid::new_v4()),
            Some(&member),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.available(&fare).await, 1);
}

#[tokio::test]
async fn test_contact_info_follows_latest_booking() {
    let app = test_app();
    let fare = app.publish(3);
    let member = token(Uuid::new_v4(), "MEMBER");

    let (status, _) = app.call("GET", "/v1/account/contact", Some(&member), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("POST", "/v1/bookings", Some(&member), Some(booking_body(&fare, 1)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.call("GET", "/v1/account/contact", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "amani@example.com");
}
