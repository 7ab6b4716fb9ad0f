// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::middleware::gatekeeper::gatekeeper;

/// Monta o router completo com o gatekeeper aplicado a TODA rota.
/// (Separado do main para os testes de integração dirigirem o pipeline.)
pub fn app(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/signup", post(handlers::auth::signup))
        .route("/logout", post(handlers::auth::logout));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .route("/api/feed", get(handlers::dashboard::get_feed))
        .route("/api/tenant/status", get(handlers::tenancy::tenant_status))
        .route(
            "/api/admin/tenants/{tenant_id}/status",
            patch(handlers::tenancy::admin_update_tenant_status),
        )
        .route("/api/sales/quick", post(handlers::sales::quick_sale))
        // O cliente antigo usa POST; o novo usa PATCH. Os dois liquidam.
        .route(
            "/api/invoices/{invoice_id}/mark-paid",
            patch(handlers::invoices::mark_paid).post(handlers::invoices::mark_paid),
        )
        .route("/api/purchase-orders", post(handlers::purchase_orders::create))
        .route(
            "/api/purchase-orders/{purchase_order_id}/mark-paid",
            patch(handlers::purchase_orders::mark_paid),
        )
        .route("/api/payments/mpesa/request", post(handlers::payments::request_payment))
        .route("/api/payments/mpesa/webhook", post(handlers::payments::mpesa_webhook))
        .route("/api/billing/webhook", post(handlers::payments::billing_webhook))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        // O pipeline de admissão envolve tudo que foi registrado acima.
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), gatekeeper))
        .with_state(app_state)
}
