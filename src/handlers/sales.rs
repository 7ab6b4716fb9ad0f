// src/handlers/sales.rs

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::TenantContext,
    models::finance::PaymentMethod,
    services::idempotency_service::{header_key, replay_response},
};

const SCOPE_QUICK_SALE: &str = "sales:quick";

fn default_quantity() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuickSalePayload {
    #[schema(example = "Sugar 2kg")]
    pub item: String,

    #[serde(default = "default_quantity")]
    #[schema(example = "2.0")]
    pub quantity: Decimal,

    #[schema(example = "250.00")]
    pub amount: Decimal,

    #[serde(default)]
    pub method: Option<PaymentMethod>,

    pub note: Option<String>,
}

// POST /api/sales/quick
#[utoipa::path(
    post,
    path = "/api/sales/quick",
    tag = "Sales",
    request_body = QuickSalePayload,
    responses(
        (status = 200, description = "Venda registrada (ou replay idempotente)"),
        (status = 400, description = "Valor ou item inválido")
    ),
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Chave de deduplicação do cliente")
    )
)]
pub async fn quick_sale(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    headers: HeaderMap,
    Json(payload): Json<QuickSalePayload>,
) -> Result<Response, AppError> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("Amount must be greater than 0.".to_string()));
    }
    let item = payload.item.trim();
    if item.is_empty() {
        return Err(AppError::BadRequest("Item is required.".to_string()));
    }

    // Dedup: o cliente mobile reenvia após timeout; a chave garante
    // no máximo uma venda gravada.
    let key = header_key(&headers);
    if let Some(hit) = app_state
        .idempotency
        .lookup(Some(tenant_id), SCOPE_QUICK_SALE, key.as_deref())
        .await?
    {
        return Ok(replay_response(hit));
    }

    let method = payload.method.unwrap_or(PaymentMethod::Cash);
    let body = app_state
        .sales_service
        .quick_sale(
            tenant_id,
            item,
            payload.quantity,
            payload.amount,
            method,
            payload.note.as_deref().map(str::trim),
        )
        .await?;

    if let Some(winner) = app_state
        .idempotency
        .store(Some(tenant_id), SCOPE_QUICK_SALE, key.as_deref(), 200, &body)
        .await
    {
        // Perdeu a corrida contra uma duplicata concorrente: espelha o vencedor.
        return Ok(replay_response(winner));
    }

    Ok((StatusCode::OK, Json(body)).into_response())
}
