// src/models/tenancy.rs

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. TenantStatus (O ciclo de vida da conta)
// ---
// UNKNOWN é o valor seguro quando o status não pode ser determinado:
// não é confiado como ACTIVE nem bloqueado como SUSPENDED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tenant_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Pending,
    Suspended,
    Unknown,
}

impl TenantStatus {
    /// Interpreta o valor textual vindo do cookie de sessão.
    /// Qualquer coisa fora dos três estados persistidos vira Unknown.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "ACTIVE" => TenantStatus::Active,
            "PENDING" => TenantStatus::Pending,
            "SUSPENDED" => TenantStatus::Suspended,
            _ => TenantStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "ACTIVE",
            TenantStatus::Pending => "PENDING",
            TenantStatus::Suspended => "SUSPENDED",
            TenantStatus::Unknown => "UNKNOWN",
        }
    }
}

// ---
// 2. Tenant (O "Estabelecimento")
// ---
// A conta principal (a loja). Todos os dados de negócio são isolados por ela.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub status: TenantStatus,
    pub plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resposta do endpoint de status consultado pelo watcher do cliente
#[derive(Debug, Serialize, ToSchema)]
pub struct TenantStatusResponse {
    pub status: TenantStatus,
}
