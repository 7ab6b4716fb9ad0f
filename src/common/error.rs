use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::auth::Role;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada estágio do gatekeeper resolve localmente para uma resposta terminal:
// nada daqui se propaga como exceção até a lógica de negócio.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Contexto de tenant ausente")]
    MissingTenant,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Papel {role:?} não permitido em {path}")]
    RoleForbidden { role: Role, path: String },

    #[error("Tenant pendente de aprovação")]
    TenantPending,

    #[error("Tenant suspenso")]
    TenantSuspended,

    #[error("Token CSRF ausente ou divergente")]
    CsrfMismatch,

    #[error("Limite de requisições excedido")]
    RateLimited,

    #[error("Assinatura de webhook inválida")]
    InvalidWebhookSignature,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Campos obrigatórios ausentes: {0}")]
    MissingFields(String),

    #[error("{0}")]
    BadRequest(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // O corpo carrega role + path para o chamador saber qual regra barrou.
            AppError::RoleForbidden { role, path } => {
                let body = Json(json!({
                    "error": "Not allowed for this role.",
                    "role": role.as_str(),
                    "path": path,
                }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }

            AppError::MissingTenant => (
                StatusCode::BAD_REQUEST,
                "Missing tenant context. Provide X-Tenant-Id or set DEFAULT_TENANT_ID.".to_string(),
            ),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::TenantPending => (
                StatusCode::FORBIDDEN,
                "Conta pendente de aprovação.".to_string(),
            ),
            AppError::TenantSuspended => (
                StatusCode::FORBIDDEN,
                "Conta suspensa. Contate o suporte.".to_string(),
            ),
            AppError::CsrfMismatch => (
                StatusCode::FORBIDDEN,
                "Missing or invalid CSRF token. Echo the ez_csrf cookie in the x-csrf-token header.".to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Try again shortly.".to_string(),
            ),
            AppError::InvalidWebhookSignature => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            AppError::ResourceNotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado.", what))
            }
            AppError::MissingFields(what) => (StatusCode::BAD_REQUEST, format!("Missing fields: {}.", what)),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
