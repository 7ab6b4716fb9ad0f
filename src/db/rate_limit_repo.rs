// src/db/rate_limit_repo.rs

use std::time::Duration;

use sqlx::PgPool;

use crate::{common::error::AppError, middleware::rate_limit::WindowCounter};

// A estratégia distribuída do rate limiter: um contador compartilhado no
// banco, consistente entre instâncias. O incremento e a expiração da
// janela acontecem num ÚNICO comando atômico (o UPSERT abaixo), nunca num
// par read-modify-write que subcontaria sob concorrência.
pub struct RateCounterRepository {
    pool: PgPool,
}

impl RateCounterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WindowCounter for RateCounterRepository {
    async fn increment(&self, key: &str, window: Duration) -> Result<u32, AppError> {
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO rate_counters (key, count, window_ends_at)
            VALUES ($1, 1, now() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE SET
                count = CASE
                    WHEN rate_counters.window_ends_at <= now() THEN 1
                    ELSE rate_counters.count + 1
                END,
                window_ends_at = CASE
                    WHEN rate_counters.window_ends_at <= now() THEN now() + make_interval(secs => $2)
                    ELSE rate_counters.window_ends_at
                END
            RETURNING count
            "#,
        )
        .bind(key)
        .bind(window.as_secs_f64())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u32)
    }
}
