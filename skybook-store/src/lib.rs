pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod inventory_repo;
pub mod payment_repo;
pub mod voucher_repo;

pub use booking_repo::StoreBookingRepository;
pub use catalog_repo::{StoreAccountDirectory, StoreFlightCatalog};
pub use database::DbClient;
pub use inventory_repo::StoreSeatLedger;
pub use payment_repo::StorePaymentRepository;
pub use voucher_repo::StoreVoucherRepository;
