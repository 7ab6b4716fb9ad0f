// src/services/idempotency_service.rs

use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{IdempotencyStore, StoredResponse},
};

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Lê a chave fornecida pelo chamador, se houver.
pub fn header_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Reconstrói a resposta gravada: mesmo status, mesmo corpo, byte a byte.
pub fn replay_response(hit: StoredResponse) -> axum::response::Response {
    use axum::response::IntoResponse;

    let status = axum::http::StatusCode::from_u16(hit.status)
        .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(hit.body)).into_response()
}

// ---
// O coordenador que os endpoints financeiros consultam
// ---
// lookup: acerto => a resposta gravada volta tal qual e o negócio é pulado.
// store: gravação "primeiro escritor vence"; quem perder a corrida recebe
// o registro do vencedor para espelhar. Falha no store NUNCA derruba a
// resposta da mutação que já aconteceu (perder o registro de dedup é um
// mal menor do que reportar erro falso a uma operação bem-sucedida).
// Falha no lookup, ao contrário, propaga: melhor recusar do que arriscar
// execução dupla (fail closed).
#[derive(Clone)]
pub struct IdempotencyCoordinator {
    store: Arc<dyn IdempotencyStore>,
}

impl IdempotencyCoordinator {
    pub fn new(store: Arc<dyn IdempotencyStore>) -> Self {
        Self { store }
    }

    pub async fn lookup(
        &self,
        tenant_id: Option<Uuid>,
        scope: &str,
        key: Option<&str>,
    ) -> Result<Option<StoredResponse>, AppError> {
        let Some(key) = key else { return Ok(None) };
        self.store.find(tenant_id, scope, key).await
    }

    pub async fn store(
        &self,
        tenant_id: Option<Uuid>,
        scope: &str,
        key: Option<&str>,
        status: u16,
        body: &Value,
    ) -> Option<StoredResponse> {
        let Some(key) = key else { return None };

        match self.store.insert_if_absent(tenant_id, scope, key, status, body).await {
            Ok(true) => None,
            // Outro escritor venceu a corrida: devolve o registro dele.
            Ok(false) => match self.store.find(tenant_id, scope, key).await {
                Ok(winner) => winner,
                Err(e) => {
                    tracing::error!("[idempotency] releitura pós-conflito falhou: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::error!("[idempotency] store falhou em {}:{}: {}", scope, key, e);
                None
            }
        }
    }
}
