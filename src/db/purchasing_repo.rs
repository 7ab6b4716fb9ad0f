// src/db/purchasing_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::purchasing::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus},
};

// Projeção usada pelo recebimento: só o necessário para estoque e feed.
#[derive(Debug, sqlx::FromRow)]
pub struct PurchaseOrderLineDetail {
    pub item_id: Option<Uuid>,
    pub quantity: Decimal,
    pub item_name: Option<String>,
}

#[derive(Clone)]
pub struct PurchasingRepository {
    pool: PgPool,
}

impl PurchasingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_purchase_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        supplier_id: Option<Uuid>,
        total: Decimal,
        need_by: Option<DateTime<Utc>>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (tenant_id, supplier_id, status, total, paid_amount, need_by, due_date)
            VALUES ($1, $2, 'ORDERED', $3, 0, $4, $5)
            RETURNING
                id, tenant_id, supplier_id, status, total, paid_amount,
                need_by, due_date, paid_at, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(supplier_id)
        .bind(total)
        .bind(need_by)
        .bind(due_date)
        .fetch_one(executor)
        .await?;

        Ok(po)
    }

    pub async fn add_line<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
        item_id: Option<Uuid>,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> Result<PurchaseOrderLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, PurchaseOrderLine>(
            r#"
            INSERT INTO purchase_order_lines (tenant_id, purchase_order_id, item_id, quantity, unit_cost)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tenant_id, purchase_order_id, item_id, quantity, unit_cost
            "#,
        )
        .bind(tenant_id)
        .bind(purchase_order_id)
        .bind(item_id)
        .bind(quantity)
        .bind(unit_cost)
        .fetch_one(executor)
        .await?;

        Ok(line)
    }

    /// Busca com lock de linha: o mark-paid lê, reconcilia e grava dentro
    /// da mesma transação, fechando a janela entre duplicatas concorrentes.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
    ) -> Result<Option<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, tenant_id, supplier_id, status, total, paid_amount,
                   need_by, due_date, paid_at, created_at, updated_at
            FROM purchase_orders
            WHERE id = $1 AND tenant_id = $2
            FOR UPDATE
            "#,
        )
        .bind(purchase_order_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(po)
    }

    /// Linhas com o nome do item, para o incremento de estoque e o resumo
    /// do evento de atividade.
    pub async fn list_lines_detailed<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderLineDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, PurchaseOrderLineDetail>(
            r#"
            SELECT l.item_id, l.quantity, i.name AS item_name
            FROM purchase_order_lines l
            LEFT JOIN items i ON i.id = l.item_id
            WHERE l.purchase_order_id = $1 AND l.tenant_id = $2
            "#,
        )
        .bind(purchase_order_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn get_supplier_name<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM suppliers WHERE id = $1 AND tenant_id = $2",
        )
        .bind(supplier_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(name)
    }

    /// Grava o resultado da reconciliação. `paid_at` só é passado na
    /// primeira transição para RECEIVED; depois disso nunca é sobrescrito.
    pub async fn apply_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
        new_paid: Decimal,
        status: PurchaseOrderStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET paid_amount = $3,
                status = $4,
                paid_at = COALESCE(paid_at, $5),
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(purchase_order_id)
        .bind(tenant_id)
        .bind(new_paid)
        .bind(status)
        .bind(paid_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
