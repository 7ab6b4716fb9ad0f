// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// O item vendável. O estoque aqui só é tocado pelo recebimento de ordens
// de compra (incremento por linha, exatamente uma vez por ordem).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub name: String,
    #[schema(example = "40.0")]
    pub stock_quantity: Decimal,
    #[schema(example = "10.0")]
    pub low_stock_threshold: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
