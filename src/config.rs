// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::{
        ActivityRepository, FinanceRepository, InventoryRepository, PgIdempotencyStore,
        PurchasingRepository, RateCounterRepository, TenantRepository, UserRepository,
    },
    middleware::rate_limit::{
        RateLimitConfig, RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS,
    },
    models::auth::Role,
    services::{
        auth::AuthService, idempotency_service::IdempotencyCoordinator,
        purchasing_service::PurchasingService, sales_service::SalesService,
        tenancy_service::TenancyService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub default_tenant_id: Option<Uuid>,
    pub default_role: Option<Role>,
    pub billing_webhook_secret: Option<String>,
    pub rate_limiter: Arc<RateLimiter>,
    pub idempotency: IdempotencyCoordinator,
    pub activity_repo: ActivityRepository,
    pub auth_service: AuthService,
    pub sales_service: SalesService,
    pub purchasing_service: PurchasingService,
    pub tenancy_service: TenancyService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let rate_config = RateLimitConfig {
            window: Duration::from_secs(env_parse("RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW_SECS)),
            max_requests: env_parse("RATE_LIMIT_MAX_REQUESTS", DEFAULT_MAX_REQUESTS),
        };

        Ok(Self::with_pool(db_pool, rate_config))
    }

    /// Monta o gráfico de dependências a partir de uma pool pronta.
    /// (Os testes de integração passam uma pool lazy e config próprio.)
    pub fn with_pool(db_pool: PgPool, rate_config: RateLimitConfig) -> Self {
        // Fallbacks de desenvolvimento/local; em produção ficam vazios.
        let default_tenant_id = env::var("DEFAULT_TENANT_ID")
            .ok()
            .and_then(|v| Uuid::parse_str(&v).ok());
        let default_role = env::var("DEFAULT_ROLE").ok().and_then(|v| Role::parse(&v));
        let billing_webhook_secret = env::var("BILLING_WEBHOOK_SECRET").ok();

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let finance_repo = FinanceRepository::new(db_pool.clone());
        let purchasing_repo = PurchasingRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new(db_pool.clone());

        // O limiter consulta o contador compartilhado primeiro; a janela
        // local embutida é o fallback quando o store está fora do ar.
        let rate_limiter = Arc::new(RateLimiter::new(
            rate_config,
            Some(Arc::new(RateCounterRepository::new(db_pool.clone()))),
        ));

        let idempotency =
            IdempotencyCoordinator::new(Arc::new(PgIdempotencyStore::new(db_pool.clone())));

        let auth_service =
            AuthService::new(user_repo, tenant_repo.clone(), db_pool.clone());
        let sales_service =
            SalesService::new(finance_repo, activity_repo.clone(), db_pool.clone());
        let purchasing_service = PurchasingService::new(
            purchasing_repo,
            inventory_repo,
            activity_repo.clone(),
            db_pool.clone(),
        );
        let tenancy_service = TenancyService::new(tenant_repo);

        Self {
            db_pool,
            default_tenant_id,
            default_role,
            billing_webhook_secret,
            rate_limiter,
            idempotency,
            activity_repo,
            auth_service,
            sales_service,
            purchasing_service,
            tenancy_service,
        }
    }
}

fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
