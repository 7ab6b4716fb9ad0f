pub mod auth;
pub mod idempotency_service;
pub mod sales_service;
pub mod purchasing_service;
pub mod tenancy_service;
