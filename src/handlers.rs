pub mod auth;
pub mod dashboard;
pub mod tenancy;
pub mod sales;
pub mod invoices;
pub mod purchase_orders;
pub mod payments;
