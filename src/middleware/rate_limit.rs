// src/middleware/rate_limit.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Role};

pub const DEFAULT_WINDOW_SECS: u64 = 15;
pub const DEFAULT_MAX_REQUESTS: u32 = 50;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

/// O resultado de uma admissão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Rejected,
}

// ---
// Contrato do contador distribuído
// ---
// Incremento atômico com expiração, numa única operação do storage
// (nunca um par read-modify-write). Retorna a contagem JÁ incrementada
// dentro da janela corrente da chave.
#[async_trait::async_trait]
pub trait WindowCounter: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> Result<u32, AppError>;
}

// ---
// Estratégia local (janela fixa em memória)
// ---
// Estado estritamente por processo: sob múltiplas instâncias só vale como
// defesa em profundidade, nunca como garantia global.
struct Bucket {
    count: u32,
    reset_at: Instant,
}

pub struct LocalRateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl LocalRateLimiter {
    pub fn new() -> Self {
        Self { buckets: Mutex::new(HashMap::new()) }
    }

    /// Incrementa a chave e devolve a contagem dentro da janela corrente.
    /// A primeira requisição (ou janela expirada) abre janela nova com count=1.
    pub async fn hit(&self, key: &str, window: Duration) -> u32 {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        // Poda ocasional para o mapa não crescer sem limite.
        if buckets.len() > 1024 {
            buckets.retain(|_, bucket| bucket.reset_at > now);
        }

        match buckets.get_mut(key) {
            Some(bucket) if bucket.reset_at > now => {
                bucket.count += 1;
                bucket.count
            }
            _ => {
                buckets.insert(key.to_string(), Bucket { count: 1, reset_at: now + window });
                1
            }
        }
    }
}

// ---
// O limiter composto que o gatekeeper consulta
// ---
// Ordem fixa: distribuído primeiro (autoritativo), local depois (fallback).
// Nunca o inverso: o contador local sozinho não impõe limite global.
// Falha do store distribuído NÃO bloqueia tráfego: cai para o local (fail open).
pub struct RateLimiter {
    config: RateLimitConfig,
    distributed: Option<Arc<dyn WindowCounter>>,
    local: LocalRateLimiter,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, distributed: Option<Arc<dyn WindowCounter>>) -> Self {
        Self { config, distributed, local: LocalRateLimiter::new() }
    }

    pub async fn admit(&self, key: &str) -> RateDecision {
        if let Some(counter) = &self.distributed {
            match counter.increment(key, self.config.window).await {
                Ok(count) => return self.decide(count),
                Err(e) => {
                    tracing::warn!(
                        "Contador distribuído indisponível, caindo para a janela local: {}",
                        e
                    );
                }
            }
        }

        let count = self.local.hit(key, self.config.window).await;
        self.decide(count)
    }

    // Rejeita estritamente ACIMA do teto: exatamente max_requests passam.
    fn decide(&self, count: u32) -> RateDecision {
        if count > self.config.max_requests {
            RateDecision::Rejected
        } else {
            RateDecision::Allowed
        }
    }
}

/// Chave composta do balde: tenant, papel e identidade de rede do chamador.
pub fn bucket_key(tenant_id: Option<Uuid>, role: Role, headers: &HeaderMap) -> String {
    let tenant = tenant_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anon".to_string());
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("ip");
    format!("rl:{}:{}:{}", tenant, role.as_str(), ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RateLimitConfig {
        RateLimitConfig { window: Duration::from_millis(200), max_requests: 3 }
    }

    #[tokio::test]
    async fn admits_up_to_threshold_then_rejects() {
        let limiter = RateLimiter::new(small_config(), None);

        for _ in 0..3 {
            assert_eq!(limiter.admit("rl:t:OWNER:1.2.3.4").await, RateDecision::Allowed);
        }
        assert_eq!(limiter.admit("rl:t:OWNER:1.2.3.4").await, RateDecision::Rejected);
    }

    #[tokio::test]
    async fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(small_config(), None);

        for _ in 0..4 {
            limiter.admit("rl:t:OWNER:ip").await;
        }
        assert_eq!(limiter.admit("rl:t:OWNER:ip").await, RateDecision::Rejected);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(limiter.admit("rl:t:OWNER:ip").await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(small_config(), None);

        for _ in 0..4 {
            limiter.admit("rl:a:OWNER:ip").await;
        }
        assert_eq!(limiter.admit("rl:a:OWNER:ip").await, RateDecision::Rejected);
        assert_eq!(limiter.admit("rl:b:OWNER:ip").await, RateDecision::Allowed);
    }

    struct FixedCounter(u32);

    #[async_trait::async_trait]
    impl WindowCounter for FixedCounter {
        async fn increment(&self, _key: &str, _window: Duration) -> Result<u32, AppError> {
            Ok(self.0)
        }
    }

    struct BrokenCounter;

    #[async_trait::async_trait]
    impl WindowCounter for BrokenCounter {
        async fn increment(&self, _key: &str, _window: Duration) -> Result<u32, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("store fora do ar")))
        }
    }

    #[tokio::test]
    async fn distributed_counter_is_authoritative() {
        let over = RateLimiter::new(small_config(), Some(Arc::new(FixedCounter(10))));
        assert_eq!(over.admit("rl:t:OWNER:ip").await, RateDecision::Rejected);

        let under = RateLimiter::new(small_config(), Some(Arc::new(FixedCounter(2))));
        assert_eq!(under.admit("rl:t:OWNER:ip").await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn store_failure_fails_open_to_local_window() {
        let limiter = RateLimiter::new(small_config(), Some(Arc::new(BrokenCounter)));

        for _ in 0..3 {
            assert_eq!(limiter.admit("rl:t:OWNER:ip").await, RateDecision::Allowed);
        }
        // O fallback local continua impondo o teto.
        assert_eq!(limiter.admit("rl:t:OWNER:ip").await, RateDecision::Rejected);
    }

    #[test]
    fn bucket_key_composition() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        let tenant = Uuid::new_v4();

        let key = bucket_key(Some(tenant), Role::Manager, &headers);
        assert_eq!(key, format!("rl:{}:MANAGER:203.0.113.9", tenant));

        let anon = bucket_key(None, Role::Attendant, &HeaderMap::new());
        assert_eq!(anon, "rl:anon:ATTENDANT:ip");
    }
}
