// src/handlers/payments.rs

use axum::{
    extract::State,
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
    services::idempotency_service::{header_key, replay_response},
};

const SCOPE_REQUEST: &str = "payments:request";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestPayload {
    pub invoice_id: Option<Uuid>,
    #[schema(example = "500.00")]
    pub amount: Option<Decimal>,
    pub phone: Option<String>,
}

// POST /api/payments/mpesa/request
#[utoipa::path(
    post,
    path = "/api/payments/mpesa/request",
    tag = "Payments",
    request_body = PaymentRequestPayload,
    responses(
        (status = 200, description = "Solicitação registrada (ou replay idempotente)"),
        (status = 400, description = "Fatura ou valor ausente")
    ),
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Chave de deduplicação do cliente")
    )
)]
pub async fn request_payment(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
    headers: HeaderMap,
    Json(payload): Json<PaymentRequestPayload>,
) -> Result<Response, AppError> {
    let (Some(invoice_id), Some(amount)) = (payload.invoice_id, payload.amount) else {
        return Err(AppError::BadRequest("Missing invoice or amount.".to_string()));
    };

    let key = header_key(&headers)
        .unwrap_or_else(|| format!("req:{}:{}", invoice_id, amount));

    if let Some(hit) = app_state
        .idempotency
        .lookup(Some(tenant_id), SCOPE_REQUEST, Some(&key))
        .await?
    {
        return Ok(replay_response(hit));
    }

    let body = app_state
        .sales_service
        .request_payment(tenant_id, invoice_id, amount, payload.phone.as_deref())
        .await?;

    if let Some(winner) = app_state
        .idempotency
        .store(Some(tenant_id), SCOPE_REQUEST, Some(&key), 200, &body)
        .await
    {
        return Ok(replay_response(winner));
    }

    Ok((StatusCode::OK, Json(body)).into_response())
}

// Webhooks: chamadas de máquina, fora do fluxo de cookie/CSRF (classe
// Exempt no gatekeeper). O tenant vem no corpo, não na sessão.

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MpesaWebhookPayload {
    pub tenant_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub receipt: Option<String>,
    pub amount: Option<Decimal>,
}

// POST /api/payments/mpesa/webhook
pub async fn mpesa_webhook(
    State(app_state): State<AppState>,
    Json(payload): Json<MpesaWebhookPayload>,
) -> Result<Response, AppError> {
    let (Some(tenant_id), Some(payment_id), Some(invoice_id), Some(_amount)) = (
        payload.tenant_id,
        payload.payment_id,
        payload.invoice_id,
        payload.amount,
    ) else {
        return Err(AppError::MissingFields("tenantId, paymentId, invoiceId, amount".to_string()));
    };

    let body = app_state
        .sales_service
        .confirm_webhook_payment(tenant_id, payment_id, invoice_id, payload.receipt.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(body)).into_response())
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingWebhookPayload {
    pub tenant_id: Option<Uuid>,
    pub plan: Option<String>,
    pub status: Option<String>,
}

// POST /api/billing/webhook
// Autentica pela assinatura compartilhada, nunca por cookie.
pub async fn billing_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BillingWebhookPayload>,
) -> Result<Response, AppError> {
    let signature = headers
        .get("x-billing-signature")
        .and_then(|v| v.to_str().ok());

    let authorized = matches!(
        (signature, app_state.billing_webhook_secret.as_deref()),
        (Some(sig), Some(secret)) if sig == secret
    );
    if !authorized {
        return Err(AppError::InvalidWebhookSignature);
    }

    let (Some(tenant_id), Some(plan)) = (payload.tenant_id, payload.plan.as_deref()) else {
        return Err(AppError::MissingFields("tenantId, plan".to_string()));
    };

    app_state
        .tenancy_service
        .apply_billing_update(tenant_id, plan, payload.status.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response())
}
