// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::RequestContext,
    models::tenancy::{TenantStatus, TenantStatusResponse},
};

// GET /api/tenant/status
// Consultado em loop pelo watcher do cliente; nunca devolve erro.
pub async fn tenant_status(
    State(app_state): State<AppState>,
    ctx: RequestContext,
) -> Json<TenantStatusResponse> {
    let status = app_state.tenancy_service.current_status(ctx.tenant_id).await;
    Json(TenantStatusResponse { status })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTenantStatusPayload {
    #[schema(example = "SUSPENDED")]
    pub status: String,
}

// PATCH /api/admin/tenants/{id}/status
// Só chega aqui quem passou o gate de rota admin (papel ADMIN).
pub async fn admin_update_tenant_status(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<UpdateTenantStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let status = TenantStatus::parse(&payload.status);

    let tenant = app_state
        .tenancy_service
        .admin_update_status(tenant_id, status)
        .await?;

    Ok(Json(serde_json::json!({ "tenant": tenant })))
}
