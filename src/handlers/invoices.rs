// src/handlers/invoices.rs

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::TenantContext,
    models::finance::PaymentMethod,
    services::idempotency_service::{header_key, replay_response},
};

const SCOPE_MARK_PAID: &str = "invoices:mark-paid";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkInvoicePaidPayload {
    #[schema(example = "1000.00")]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub method: Option<PaymentMethod>,
}

// PATCH (ou POST) /api/invoices/{id}/mark-paid
#[utoipa::path(
    patch,
    path = "/api/invoices/{invoice_id}/mark-paid",
    tag = "Invoices",
    request_body = MarkInvoicePaidPayload,
    responses(
        (status = 200, description = "Fatura liquidada (ou replay idempotente)"),
        (status = 404, description = "Fatura não encontrada")
    ),
    params(
        ("invoice_id" = Uuid, Path, description = "ID da fatura"),
        ("Idempotency-Key" = Option<String>, Header, description = "Chave de deduplicação do cliente")
    )
)]
pub async fn mark_paid(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(invoice_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MarkInvoicePaidPayload>,
) -> Result<Response, AppError> {
    let method = payload.method.unwrap_or(PaymentMethod::Cash);

    // Sem chave do cliente, deriva uma determinística dos campos da
    // requisição: o mesmo mark-paid repetido não liquida duas vezes.
    let key = header_key(&headers).unwrap_or_else(|| {
        format!(
            "invoice:{}:{}:{}",
            invoice_id,
            payload
                .amount
                .map(|a| a.to_string())
                .unwrap_or_else(|| "full".to_string()),
            method.as_str()
        )
    });

    if let Some(hit) = app_state
        .idempotency
        .lookup(Some(tenant_id), SCOPE_MARK_PAID, Some(&key))
        .await?
    {
        return Ok(replay_response(hit));
    }

    let body = app_state
        .sales_service
        .mark_invoice_paid(tenant_id, invoice_id, payload.amount, method)
        .await?;

    if let Some(winner) = app_state
        .idempotency
        .store(Some(tenant_id), SCOPE_MARK_PAID, Some(&key), 200, &body)
        .await
    {
        return Ok(replay_response(winner));
    }

    Ok((StatusCode::OK, Json(body)).into_response())
}
