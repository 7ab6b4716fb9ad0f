// src/db/idempotency_repo.rs

use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::common::error::AppError;

// Resposta gravada de uma mutação já executada: no replay ela volta
// byte a byte, e a lógica de negócio é pulada por inteiro.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status: u16,
    pub body: Value,
}

// ---
// Contrato do store de idempotência
// ---
// A primitiva de escrita é OBRIGATORIAMENTE "insere se ausente" atômica
// no storage (nunca check-then-write): duas duplicatas concorrentes podem
// ambas errar o lookup, mas só a primeira escrita vence.
#[async_trait::async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn find(
        &self,
        tenant_id: Option<Uuid>,
        scope: &str,
        key: &str,
    ) -> Result<Option<StoredResponse>, AppError>;

    /// Retorna `true` se esta chamada inseriu o registro; `false` se outro
    /// escritor chegou antes (primeiro escritor vence).
    async fn insert_if_absent(
        &self,
        tenant_id: Option<Uuid>,
        scope: &str,
        key: &str,
        status: u16,
        body: &Value,
    ) -> Result<bool, AppError>;
}

// Retenção decidida: registros com mais de 48h são descartados
// (poda oportunista a cada inserção).
const RETENTION_HOURS: i32 = 48;

pub struct PgIdempotencyStore {
    pool: PgPool,
}

impl PgIdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn find(
        &self,
        tenant_id: Option<Uuid>,
        scope: &str,
        key: &str,
    ) -> Result<Option<StoredResponse>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT status, response
            FROM idempotency_keys
            WHERE tenant_id IS NOT DISTINCT FROM $1 AND scope = $2 AND key = $3
            "#,
        )
        .bind(tenant_id)
        .bind(scope)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| StoredResponse {
            status: r.get::<i32, _>("status") as u16,
            body: r.get::<Value, _>("response"),
        }))
    }

    async fn insert_if_absent(
        &self,
        tenant_id: Option<Uuid>,
        scope: &str,
        key: &str,
        status: u16,
        body: &Value,
    ) -> Result<bool, AppError> {
        // Poda da retenção junto com a escrita.
        sqlx::query("DELETE FROM idempotency_keys WHERE created_at < now() - make_interval(hours => $1)")
            .bind(RETENTION_HOURS)
            .execute(&self.pool)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (tenant_id, scope, key, status, response)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(scope)
        .bind(key)
        .bind(status as i32)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(inserted.rows_affected() == 1)
    }
}
