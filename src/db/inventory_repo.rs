// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entrada de estoque pelo recebimento de uma linha de ordem de compra.
    /// Chamado exatamente uma vez por ordem, na transição para RECEIVED.
    pub async fn increment_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE items
            SET stock_quantity = stock_quantity + $3, updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(item_id)
        .bind(tenant_id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(())
    }
}
