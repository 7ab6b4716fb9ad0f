// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Tenant, TenantStatus},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        status: TenantStatus,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, status)
            VALUES ($1, $2)
            RETURNING id, name, status, plan, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    pub async fn get_status(&self, tenant_id: Uuid) -> Result<Option<TenantStatus>, AppError> {
        let status = sqlx::query_scalar::<_, TenantStatus>(
            "SELECT status FROM tenants WHERE id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        status: TenantStatus,
    ) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, status, plan, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    /// Atualização vinda do webhook de billing (plano + status do plano).
    pub async fn update_plan(&self, tenant_id: Uuid, plan: &str) -> Result<(), AppError> {
        let updated = sqlx::query("UPDATE tenants SET plan = $2, updated_at = now() WHERE id = $1")
            .bind(tenant_id)
            .bind(plan)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Tenant {}", tenant_id)));
        }
        Ok(())
    }
}
