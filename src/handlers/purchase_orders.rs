// src/handlers/purchase_orders.rs

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::TenantContext,
    services::{
        idempotency_service::{header_key, replay_response},
        purchasing_service::PurchaseOrderLinePayload,
    },
};

const SCOPE_CREATE: &str = "purchase-orders:create";
const SCOPE_MARK_PAID: &str = "purchase-orders:mark-paid";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLineInput {
    pub item_id: Option<Uuid>,
    #[schema(example = "12.0")]
    pub quantity: Decimal,
    #[schema(example = "80.00")]
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderPayload {
    pub supplier_id: Option<Uuid>,
    pub lines: Vec<PurchaseOrderLineInput>,
    pub need_by: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

// POST /api/purchase-orders
#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    tag = "PurchaseOrders",
    request_body = CreatePurchaseOrderPayload,
    responses(
        (status = 201, description = "Ordem de compra criada (ou replay idempotente)")
    ),
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Chave de deduplicação do cliente")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    headers: HeaderMap,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<Response, AppError> {
    let key = header_key(&headers);
    if let Some(hit) = app_state
        .idempotency
        .lookup(Some(tenant_id), SCOPE_CREATE, key.as_deref())
        .await?
    {
        return Ok(replay_response(hit));
    }

    let lines = payload
        .lines
        .into_iter()
        .map(|l| PurchaseOrderLinePayload {
            item_id: l.item_id,
            quantity: l.quantity,
            unit_cost: l.unit_cost,
        })
        .collect();

    let po = app_state
        .purchasing_service
        .create_purchase_order(tenant_id, payload.supplier_id, lines, payload.need_by, payload.due_date)
        .await?;

    let body = serde_json::to_value(&po)
        .map_err(|e| anyhow::anyhow!("Falha ao serializar ordem de compra: {}", e))?;

    if let Some(winner) = app_state
        .idempotency
        .store(Some(tenant_id), SCOPE_CREATE, key.as_deref(), 201, &body)
        .await
    {
        return Ok(replay_response(winner));
    }

    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkPurchaseOrderPaidPayload {
    #[schema(example = "400.00")]
    pub amount: Option<Decimal>,
}

// PATCH /api/purchase-orders/{id}/mark-paid
//
// O ponto mais sujeito a bug de duplicação do sistema: o incremento de
// estoque por linha precisa acontecer UMA vez. Dupla guarda: dedup por
// chave aqui, e checagem "já recebida" dentro da transação do service.
#[utoipa::path(
    patch,
    path = "/api/purchase-orders/{purchase_order_id}/mark-paid",
    tag = "PurchaseOrders",
    request_body = MarkPurchaseOrderPaidPayload,
    responses(
        (status = 200, description = "Pagamento registrado (ou replay idempotente)"),
        (status = 404, description = "Ordem não encontrada")
    ),
    params(
        ("purchase_order_id" = Uuid, Path, description = "ID da ordem de compra"),
        ("Idempotency-Key" = Option<String>, Header, description = "Chave de deduplicação do cliente")
    )
)]
pub async fn mark_paid(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    Path(purchase_order_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MarkPurchaseOrderPaidPayload>,
) -> Result<Response, AppError> {
    let key = header_key(&headers).unwrap_or_else(|| {
        format!(
            "po:{}:{}",
            purchase_order_id,
            payload
                .amount
                .map(|a| a.to_string())
                .unwrap_or_else(|| "full".to_string())
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
        .purchasing_service
        .mark_paid(tenant_id, purchase_order_id, payload.amount)
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
