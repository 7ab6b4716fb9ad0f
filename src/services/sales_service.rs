// src/services/sales_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityRepository, FinanceRepository},
    models::finance::{PaymentMethod, PaymentStatus},
};

#[derive(Clone)]
pub struct SalesService {
    finance_repo: FinanceRepository,
    activity_repo: ActivityRepository,
    pool: PgPool,
}

impl SalesService {
    pub fn new(
        finance_repo: FinanceRepository,
        activity_repo: ActivityRepository,
        pool: PgPool,
    ) -> Self {
        Self { finance_repo, activity_repo, pool }
    }

    /// Venda de balcão: pagamento CONFIRMED sem fatura + evento no feed.
    pub async fn quick_sale(
        &self,
        tenant_id: Uuid,
        item: &str,
        quantity: Decimal,
        amount: Decimal,
        method: PaymentMethod,
        note: Option<&str>,
    ) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;

        let payment = self.finance_repo
            .create_payment(
                &mut *tx,
                tenant_id,
                None,
                Some("COUNTER"),
                method,
                PaymentStatus::Confirmed,
                amount,
                note.filter(|n| !n.is_empty()),
                None,
                Some(Utc::now()),
            )
            .await?;

        let qty_text = if quantity > Decimal::ZERO {
            format!(" x{}", quantity)
        } else {
            String::new()
        };
        let message = format!(
            "Counter sale: {}{} • KES {} via {}.",
            item, qty_text, amount, method_label(method)
        );
        self.activity_repo
            .record(&mut *tx, tenant_id, "PAYMENT", &message, "payment", payment.id)
            .await?;

        tx.commit().await?;

        Ok(json!({ "paymentId": payment.id, "message": "Sale recorded." }))
    }

    /// Liquida uma fatura: pagamento CONFIRMED, status PAID e feed, tudo
    /// na mesma transação.
    pub async fn mark_invoice_paid(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount: Option<Decimal>,
        method: PaymentMethod,
    ) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;

        let invoice = self.finance_repo
            .get_invoice(&mut *tx, tenant_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Invoice".to_string()))?;

        let amount = amount.unwrap_or(invoice.total);

        self.finance_repo
            .create_payment(
                &mut *tx,
                tenant_id,
                Some(invoice_id),
                None,
                method,
                PaymentStatus::Confirmed,
                amount,
                None,
                None,
                Some(Utc::now()),
            )
            .await?;

        self.finance_repo
            .mark_invoice_paid(&mut *tx, tenant_id, invoice_id)
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                tenant_id,
                "PAYMENT",
                "Payment received. All settled.",
                "invoice",
                invoice_id,
            )
            .await?;

        tx.commit().await?;

        Ok(json!({ "message": "Invoice marked as paid." }))
    }

    /// Solicitação de pagamento (STK push): registra PENDING e aguarda o
    /// webhook do provedor confirmar.
    pub async fn request_payment(
        &self,
        tenant_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
        phone: Option<&str>,
    ) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;

        let payment = self.finance_repo
            .create_payment(
                &mut *tx,
                tenant_id,
                Some(invoice_id),
                None,
                PaymentMethod::MpesaTill,
                PaymentStatus::Pending,
                amount,
                phone,
                Some(Utc::now()),
                None,
            )
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                tenant_id,
                "PAYMENT",
                "Payment request sent via M-Pesa.",
                "payment",
                payment.id,
            )
            .await?;

        tx.commit().await?;

        Ok(json!({ "paymentId": payment.id, "message": "Payment request sent." }))
    }

    /// Confirmação vinda do webhook do provedor: pagamento confirmado,
    /// fatura liquidada e feed, numa transação.
    pub async fn confirm_webhook_payment(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        invoice_id: Uuid,
        receipt: Option<&str>,
    ) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;

        self.finance_repo
            .confirm_payment(&mut *tx, payment_id, receipt)
            .await?;

        self.finance_repo
            .mark_invoice_paid(&mut *tx, tenant_id, invoice_id)
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                tenant_id,
                "PAYMENT",
                "Payment received. All settled.",
                "payment",
                payment_id,
            )
            .await?;

        tx.commit().await?;

        Ok(json!({ "message": "Payment recorded." }))
    }
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "CASH",
        PaymentMethod::MpesaTill => "M-Pesa TILL",
        PaymentMethod::MpesaPaybill => "M-Pesa PAYBILL",
        PaymentMethod::MpesaPochi => "M-Pesa POCHI",
    }
}
