pub mod coordinator;
pub mod manager;
pub mod orchestrator;
pub mod policy;
pub mod service;
pub mod store;
pub mod validation;

pub use coordinator::BookingCoordinator;
pub use manager::BookingStateMachine;
pub use orchestrator::PaymentRecorder;
pub use policy::BookingPolicy;
pub use service::{Backends, BookingService, InMemoryBackends};
pub use store::InMemoryOrderStore;
