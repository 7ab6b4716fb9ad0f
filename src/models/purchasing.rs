// src/models/purchasing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ORDERED só existe na criação, antes de qualquer pagamento.
// PARTIAL enquanto 0 < paid_amount < total.
// RECEIVED quando paid_amount == total (e total > 0), ou num mark-paid sem valor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Ordered,
    Partial,
    Received,
}

// Invariantes: 0 <= paid_amount <= total; paid_at é gravado uma única vez,
// na primeira transição para RECEIVED (âncora de data de recebimento).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub status: PurchaseOrderStatus,
    #[schema(example = "1000.00")]
    pub total: Decimal,
    #[schema(example = "400.00")]
    pub paid_amount: Decimal,
    pub need_by: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub purchase_order_id: Uuid,
    pub item_id: Option<Uuid>,
    #[schema(example = "12.0")]
    pub quantity: Decimal,
    #[schema(example = "80.00")]
    pub unit_cost: Decimal,
}
