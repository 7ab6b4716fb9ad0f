// src/db/activity_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::finance::ActivityEvent};

// O feed de atividades da home: cada mutação financeira deixa um rastro
// legível (PAYMENT, PO, STOCK).
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        event_type: &str,
        message: &str,
        ref_type: &str,
        ref_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO activity_events (tenant_id, type, message, ref_type, ref_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tenant_id)
        .bind(event_type)
        .bind(message)
        .bind(ref_type)
        .bind(ref_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_recent(
        &self,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityEvent>, AppError> {
        let events = sqlx::query_as::<_, ActivityEvent>(
            r#"
            SELECT id, tenant_id, type, message, ref_type, ref_id, created_at
            FROM activity_events
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
