// src/services/purchasing_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ActivityRepository, InventoryRepository, PurchasingRepository},
    models::purchasing::{PurchaseOrder, PurchaseOrderStatus},
};

/// A aritmética pura do recebimento: transforma um valor recebido no novo
/// total pago e no novo status do ciclo de vida da ordem.
///
/// `incoming = None` significa "marcar como recebida sem informar valor":
/// o status vai direto a RECEIVED mesmo com saldo em aberto.
/// O carimbo de `paid_at` só sai `true` na PRIMEIRA vez que o pago alcança
/// o total: a data de recebimento é âncora da comparação cedo/tarde contra
/// `need_by`/`due_date` e não pode ser sobrescrita.
pub fn reconcile(
    current_paid: Decimal,
    total: Decimal,
    incoming: Option<Decimal>,
) -> (Decimal, PurchaseOrderStatus, bool) {
    let incoming_amount = incoming.unwrap_or(Decimal::ZERO);

    // paid_amount é monotônico não-decrescente e limitado ao total.
    let new_paid = (current_paid + incoming_amount).min(total).max(current_paid);

    let settled = new_paid >= total && total > Decimal::ZERO;
    let status = if settled {
        PurchaseOrderStatus::Received
    } else if incoming.is_some() {
        PurchaseOrderStatus::Partial
    } else {
        PurchaseOrderStatus::Received
    };

    let stamp_paid_at = settled && current_paid < total;

    (new_paid, status, stamp_paid_at)
}

pub struct PurchaseOrderLinePayload {
    pub item_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

#[derive(Clone)]
pub struct PurchasingService {
    repo: PurchasingRepository,
    inventory_repo: InventoryRepository,
    activity_repo: ActivityRepository,
    pool: PgPool,
}

impl PurchasingService {
    pub fn new(
        repo: PurchasingRepository,
        inventory_repo: InventoryRepository,
        activity_repo: ActivityRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, inventory_repo, activity_repo, pool }
    }

    pub async fn create_purchase_order(
        &self,
        tenant_id: Uuid,
        supplier_id: Option<Uuid>,
        lines: Vec<PurchaseOrderLinePayload>,
        need_by: Option<DateTime<Utc>>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<PurchaseOrder, AppError> {
        if lines.is_empty() {
            return Err(AppError::MissingFields("lines".to_string()));
        }

        let total: Decimal = lines.iter().map(|l| l.quantity * l.unit_cost).sum();

        let mut tx = self.pool.begin().await?;

        let po = self.repo
            .create_purchase_order(&mut *tx, tenant_id, supplier_id, total, need_by, due_date)
            .await?;

        for line in &lines {
            self.repo
                .add_line(&mut *tx, tenant_id, po.id, line.item_id, line.quantity, line.unit_cost)
                .await?;
        }

        self.activity_repo
            .record(
                &mut *tx,
                tenant_id,
                "PO",
                &format!("Purchase order placed. Total KES {}.", total),
                "purchaseOrder",
                po.id,
            )
            .await?;

        tx.commit().await?;
        Ok(po)
    }

    /// Registra um pagamento (parcial ou total) na ordem de compra.
    ///
    /// Tudo acontece numa transação com a linha da ordem travada:
    /// reconciliação, carimbo único de paid_at, incremento de estoque por
    /// linha EXATAMENTE uma vez (na transição para RECEIVED, nunca repetido
    /// em parciais seguintes) e o evento do feed.
    pub async fn mark_paid(
        &self,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
        amount: Option<Decimal>,
    ) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;

        let po = self.repo
            .get_for_update(&mut *tx, tenant_id, purchase_order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("PO".to_string()))?;

        let (new_paid, status, stamp_paid_at) = reconcile(po.paid_amount, po.total, amount);

        let now = Utc::now();
        self.repo
            .apply_payment(
                &mut *tx,
                tenant_id,
                purchase_order_id,
                new_paid,
                status,
                stamp_paid_at.then_some(now),
            )
            .await?;

        let lines = self.repo
            .list_lines_detailed(&mut *tx, tenant_id, purchase_order_id)
            .await?;

        // Guarda "já recebida": o estoque só entra na transição de status.
        let newly_received =
            status == PurchaseOrderStatus::Received && po.status != PurchaseOrderStatus::Received;
        if newly_received {
            for line in &lines {
                if let Some(item_id) = line.item_id {
                    self.inventory_repo
                        .increment_stock(&mut *tx, tenant_id, item_id, line.quantity)
                        .await?;
                }
            }
        }

        let message = self
            .receipt_message(&mut tx, tenant_id, &po, &lines, new_paid, now)
            .await;
        self.activity_repo
            .record(&mut *tx, tenant_id, "PO", &message, "purchaseOrder", purchase_order_id)
            .await?;

        tx.commit().await?;

        Ok(json!({ "message": "Purchase order marked paid." }))
    }

    // Monta a linha do feed: resumo da primeira linha, fornecedor,
    // pago-de-total e entrega cedo/tarde contra need_by (ou due_date).
    async fn receipt_message(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tenant_id: Uuid,
        po: &PurchaseOrder,
        lines: &[crate::db::purchasing_repo::PurchaseOrderLineDetail],
        new_paid: Decimal,
        now: DateTime<Utc>,
    ) -> String {
        let line_summary = lines
            .first()
            .map(|line| {
                format!(
                    "{} × {}",
                    line.quantity,
                    line.item_name.as_deref().unwrap_or("item")
                )
            })
            .unwrap_or_else(|| "order".to_string());

        let supplier_name = match po.supplier_id {
            Some(supplier_id) => self.repo
                .get_supplier_name(&mut **tx, tenant_id, supplier_id)
                .await
                .ok()
                .flatten(),
            None => None,
        };
        let supplier_text = supplier_name
            .map(|name| format!(" from {}", name))
            .unwrap_or_default();

        let expected_text = match po.need_by.or(po.due_date) {
            Some(expected) => {
                let date = expected.format("%Y-%m-%d");
                if now <= expected {
                    format!(" Delivered early (before {}).", date)
                } else {
                    format!(" Delivered late (after {}).", date)
                }
            }
            None => String::new(),
        };

        format!(
            "Order {}{} received on {}. Paid KES {} of {}.{}",
            line_summary,
            supplier_text,
            now.format("%Y-%m-%d"),
            new_paid,
            po.total,
            expected_text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn partial_payment_accumulates_without_settling() {
        let (paid, status, stamp) = reconcile(dec(0), dec(1000), Some(dec(400)));
        assert_eq!(paid, dec(400));
        assert_eq!(status, PurchaseOrderStatus::Partial);
        assert!(!stamp);
    }

    #[test]
    fn final_installment_settles_and_stamps_once() {
        let (paid, status, stamp) = reconcile(dec(400), dec(1000), Some(dec(600)));
        assert_eq!(paid, dec(1000));
        assert_eq!(status, PurchaseOrderStatus::Received);
        assert!(stamp);
    }

    #[test]
    fn settled_order_never_exceeds_total_nor_restamps() {
        let (paid, status, stamp) = reconcile(dec(1000), dec(1000), Some(dec(50)));
        assert_eq!(paid, dec(1000));
        assert_eq!(status, PurchaseOrderStatus::Received);
        assert!(!stamp);
    }

    #[test]
    fn overpayment_clamps_to_total() {
        let (paid, status, stamp) = reconcile(dec(0), dec(1000), Some(dec(1500)));
        assert_eq!(paid, dec(1000));
        assert_eq!(status, PurchaseOrderStatus::Received);
        assert!(stamp);
    }

    #[test]
    fn mark_paid_without_amount_receives_with_open_balance() {
        // Sem valor informado a ordem é dada como recebida, mas o carimbo
        // de paid_at só sai quando o pago de fato alcança o total.
        let (paid, status, stamp) = reconcile(dec(400), dec(1000), None);
        assert_eq!(paid, dec(400));
        assert_eq!(status, PurchaseOrderStatus::Received);
        assert!(!stamp);
    }

    #[test]
    fn zero_total_order_never_stamps() {
        let (paid, status, stamp) = reconcile(dec(0), dec(0), Some(dec(0)));
        assert_eq!(paid, dec(0));
        assert_eq!(status, PurchaseOrderStatus::Partial);
        assert!(!stamp);
    }

    #[test]
    fn paid_amount_is_monotonic() {
        // Valor negativo não regride o acumulado.
        let (paid, _, _) = reconcile(dec(400), dec(1000), Some(dec(-100)));
        assert_eq!(paid, dec(400));
    }
}
