// src/services/auth.rs

use bcrypt::{hash, verify};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    middleware::lifecycle::{HOME_ROUTE, PENDING_ROUTE},
    models::{
        auth::{Role, Session},
        tenancy::TenantStatus,
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { user_repo, tenant_repo, pool }
    }

    /// Verifica credenciais e monta a sessão que vira cookie, junto com o
    /// destino pós-login adequado ao papel e ao status do tenant.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Session, String), AppError> {
        let user = self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let stored_hash = user.password_hash.clone();
        let is_bcrypt = stored_hash.starts_with("$2a$") || stored_hash.starts_with("$2b$");

        let is_password_valid = if is_bcrypt {
            let password_clone = password.to_owned();
            let hash_clone = stored_hash.clone();
            // Verificação bcrypt num thread separado para não travar o runtime
            tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
                ?
        } else {
            // Registro legado em texto puro: compara direto e, se bater,
            // faz upgrade para bcrypt na mesma passada.
            let matches = stored_hash == password;
            if matches {
                let password_clone = password.to_owned();
                let upgraded = tokio::task::spawn_blocking(move || {
                    hash(&password_clone, bcrypt::DEFAULT_COST)
                })
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
                ?;
                self.user_repo.update_password_hash(user.id, &upgraded).await?;
            }
            matches
        };

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Status do tenant entra na sessão; falha de lookup vira UNKNOWN,
        // nunca um erro de login.
        let tenant_status = match user.tenant_id {
            Some(tenant_id) => match self.tenant_repo.get_status(tenant_id).await {
                Ok(Some(status)) => status,
                Ok(None) => TenantStatus::Unknown,
                Err(e) => {
                    tracing::warn!("Lookup de status do tenant falhou no login: {}", e);
                    TenantStatus::Unknown
                }
            },
            None => TenantStatus::Unknown,
        };

        let session = Session {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            tenant_status,
        };

        let target = if user.role == Role::Admin {
            "/admin".to_string()
        } else if tenant_status == TenantStatus::Active {
            HOME_ROUTE.to_string()
        } else {
            PENDING_ROUTE.to_string()
        };

        Ok((session, target))
    }

    /// Cadastro: cria o tenant (PENDING, aguardando aprovação) e o usuário
    /// OWNER na mesma transação.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        shop_name: &str,
    ) -> Result<(Session, String), AppError> {
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
        ?;

        let mut tx = self.pool.begin().await?;

        let tenant = self.tenant_repo
            .create_tenant(&mut *tx, shop_name, TenantStatus::Pending)
            .await?;

        let user = self.user_repo
            .create_user(&mut *tx, tenant.id, email, &hashed_password, Role::Owner)
            .await?;

        tx.commit().await?;

        let session = Session {
            user_id: user.id,
            tenant_id: Some(tenant.id),
            role: Role::Owner,
            tenant_status: TenantStatus::Pending,
        };

        Ok((session, PENDING_ROUTE.to_string()))
    }
}
