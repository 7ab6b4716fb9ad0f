// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::TenantContext,
    models::finance::FeedEvent,
};

// GET /api/feed
// Os últimos acontecimentos do tenant, no formato que a home consome.
pub async fn get_feed(
    State(app_state): State<AppState>,
    TenantContext(tenant_id): TenantContext,
) -> Result<Json<Vec<FeedEvent>>, AppError> {
    let events = app_state.activity_repo.list_recent(tenant_id, 10).await?;

    let feed = events
        .into_iter()
        .map(|event| FeedEvent {
            id: event.id,
            r#type: event.event_type,
            text: event.message,
            ts: event.created_at,
        })
        .collect();

    Ok(Json(feed))
}
