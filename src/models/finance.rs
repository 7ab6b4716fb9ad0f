// src/models/finance.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    MpesaTill,
    MpesaPaybill,
    MpesaPochi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::MpesaTill => "MPESA_TILL",
            PaymentMethod::MpesaPaybill => "MPESA_PAYBILL",
            PaymentMethod::MpesaPochi => "MPESA_POCHI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
}

// --- Structs ---

// Um recebimento: venda de balcão (sem fatura) ou pagamento de fatura
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub source: Option<String>,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[schema(example = "150.50")]
    pub amount: Decimal,
    pub mpesa_receipt: Option<String>,
    pub requested_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub status: InvoiceStatus,
    #[schema(example = "1000.00")]
    pub total: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Evento do feed de atividades da home (PAYMENT, PO, STOCK)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    pub ref_type: Option<String>,
    pub ref_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// O formato que o feed da home consome.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedEvent {
    pub id: Uuid,
    pub r#type: String,
    pub text: String,
    pub ts: DateTime<Utc>,
}
