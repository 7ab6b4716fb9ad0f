// src/services/tenancy_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::tenancy::{Tenant, TenantStatus},
};

#[derive(Clone)]
pub struct TenancyService {
    repo: TenantRepository,
}

impl TenancyService {
    pub fn new(repo: TenantRepository) -> Self {
        Self { repo }
    }

    /// Status consultado pelo watcher do cliente. NUNCA devolve erro:
    /// tenant ausente ou lookup falho viram UNKNOWN e o cliente segue
    /// sondando, em vez de derrubar a navegação por um soluço do banco.
    pub async fn current_status(&self, tenant_id: Option<Uuid>) -> TenantStatus {
        let Some(tenant_id) = tenant_id else {
            return TenantStatus::Unknown;
        };

        match self.repo.get_status(tenant_id).await {
            Ok(Some(status)) => status,
            Ok(None) => TenantStatus::Unknown,
            Err(e) => {
                tracing::warn!("Lookup de status do tenant {} falhou: {}", tenant_id, e);
                TenantStatus::Unknown
            }
        }
    }

    /// Mudança de status pelo console admin. Só os três estados
    /// persistidos são aceitos; UNKNOWN não é gravável.
    pub async fn admin_update_status(
        &self,
        tenant_id: Uuid,
        status: TenantStatus,
    ) -> Result<Tenant, AppError> {
        if status == TenantStatus::Unknown {
            return Err(AppError::BadRequest("Invalid status.".to_string()));
        }

        self.repo
            .update_status(tenant_id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Tenant {}", tenant_id)))
    }

    /// Atualização de plano vinda do webhook de billing.
    pub async fn apply_billing_update(
        &self,
        tenant_id: Uuid,
        plan: &str,
        plan_status: Option<&str>,
    ) -> Result<(), AppError> {
        let plan_value = match plan_status {
            Some(status) => format!("{}:{}", plan, status),
            None => plan.to_string(),
        };
        self.repo.update_plan(tenant_id, &plan_value).await
    }
}
