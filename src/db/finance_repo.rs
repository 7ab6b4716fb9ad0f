// src/db/finance_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{Invoice, Payment, PaymentMethod, PaymentStatus},
};

#[derive(Clone)]
pub struct FinanceRepository {
    pool: PgPool,
}

impl FinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PAGAMENTOS (balcão, fatura, solicitação M-Pesa)
    // =========================================================================

    pub async fn create_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Option<Uuid>,
        source: Option<&str>,
        method: PaymentMethod,
        status: PaymentStatus,
        amount: Decimal,
        mpesa_receipt: Option<&str>,
        requested_at: Option<DateTime<Utc>>,
        confirmed_at: Option<DateTime<Utc>>,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                tenant_id, invoice_id, source, method, status,
                amount, mpesa_receipt, requested_at, confirmed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, tenant_id, invoice_id, source, method, status,
                amount, mpesa_receipt, requested_at, confirmed_at, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(invoice_id)
        .bind(source)
        .bind(method)
        .bind(status)
        .bind(amount)
        .bind(mpesa_receipt)
        .bind(requested_at)
        .bind(confirmed_at)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    /// Confirmação vinda do webhook do provedor.
    pub async fn confirm_payment<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
        mpesa_receipt: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'CONFIRMED', mpesa_receipt = $2, confirmed_at = now()
            WHERE id = $1
            "#,
        )
        .bind(payment_id)
        .bind(mpesa_receipt)
        .execute(executor)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Payment {}", payment_id)));
        }
        Ok(())
    }

    // =========================================================================
    //  FATURAS
    // =========================================================================

    pub async fn get_invoice<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, tenant_id, customer_id, status, total, due_date, created_at, updated_at
            FROM invoices
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(invoice_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(invoice)
    }

    pub async fn mark_invoice_paid<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE invoices SET status = 'PAID', updated_at = now() WHERE id = $1 AND tenant_id = $2",
        )
        .bind(invoice_id)
        .bind(tenant_id)
        .execute(executor)
        .await?;

        Ok(())
    }
}
