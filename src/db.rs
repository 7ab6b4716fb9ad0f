pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod purchasing_repo;
pub use purchasing_repo::PurchasingRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod idempotency_repo;
pub use idempotency_repo::{IdempotencyStore, PgIdempotencyStore, StoredResponse};
pub mod rate_limit_repo;
pub use rate_limit_repo::RateCounterRepository;
