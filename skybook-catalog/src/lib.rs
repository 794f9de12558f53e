pub mod catalog;
pub mod inventory;
pub mod voucher;

pub use catalog::InMemoryFlightCatalog;
pub use inventory::InMemorySeatLedger;
pub use voucher::{InMemoryVoucherBook, VoucherEngine};
