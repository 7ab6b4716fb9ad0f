// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Sales ---
        handlers::sales::quick_sale,

        // --- Invoices ---
        handlers::invoices::mark_paid,

        // --- Purchase Orders ---
        handlers::purchase_orders::create,
        handlers::purchase_orders::mark_paid,

        // --- Payments ---
        handlers::payments::request_payment,
    ),
    components(
        schemas(
            handlers::sales::QuickSalePayload,
            handlers::invoices::MarkInvoicePaidPayload,
            handlers::purchase_orders::CreatePurchaseOrderPayload,
            handlers::purchase_orders::PurchaseOrderLineInput,
            handlers::purchase_orders::MarkPurchaseOrderPaidPayload,
            handlers::payments::PaymentRequestPayload,
            handlers::tenancy::UpdateTenantStatusPayload,
            models::finance::PaymentMethod,
            models::finance::PaymentStatus,
            models::finance::InvoiceStatus,
            models::purchasing::PurchaseOrder,
            models::purchasing::PurchaseOrderStatus,
            models::tenancy::TenantStatus,
        )
    ),
    tags(
        (name = "Sales", description = "Vendas de balcão"),
        (name = "Invoices", description = "Faturas e liquidação"),
        (name = "PurchaseOrders", description = "Ordens de compra e recebimento"),
        (name = "Payments", description = "Solicitações e webhooks de pagamento"),
    )
)]
pub struct ApiDoc;
