// src/middleware/session.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::{Role, Session}, tenancy::TenantStatus},
};

pub const SESSION_COOKIE: &str = "ez_session";
pub const SESSION_MAX_AGE_SECS: i64 = 86_400;

// O que de fato viaja dentro do cookie: base64 de um JSON.
// Todos os campos são opcionais na leitura; cookie malformado NUNCA vira erro,
// apenas sessão ausente (os defaults seguros entram na resolução abaixo).
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SessionClaims {
    user_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
    role: Option<String>,
    tenant_status: Option<String>,
}

/// Extrai o valor de um cookie do cabeçalho `Cookie`.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(|part| part.trim())
        .find_map(|part| part.strip_prefix(name)?.strip_prefix('=').map(|v| v.to_string()))
}

/// Decodifica o cookie de sessão. Entrada ausente ou malformada vira `None`,
/// nunca um erro: o chamador cai nos defaults seguros.
fn decode_claims(headers: &HeaderMap) -> Option<SessionClaims> {
    let raw = cookie_value(headers, SESSION_COOKIE)?;
    let bytes = BASE64.decode(raw.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Serializa a sessão para o valor do cookie. Usado apenas no login:
/// mudança de papel ou status exige reemitir o cookie inteiro.
pub fn encode_session(session: &Session) -> String {
    let claims = SessionClaims {
        user_id: Some(session.user_id),
        tenant_id: session.tenant_id,
        role: Some(session.role.as_str().to_string()),
        tenant_status: Some(session.tenant_status.as_str().to_string()),
    };
    // SessionClaims só tem tipos triviais; a serialização não falha.
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    BASE64.encode(json)
}

/// Monta o cabeçalho Set-Cookie da sessão (HttpOnly, SameSite=Lax).
pub fn session_cookie_header(value: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, value, SESSION_MAX_AGE_SECS
    )
}

/// Set-Cookie que apaga a sessão (logout).
pub fn clear_session_cookie_header() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

// ---
// Contexto resolvido da requisição
// ---
// O gatekeeper resolve isto uma vez e insere nos extensions; os handlers
// leem via extractors. Prioridade: sessão > cabeçalho > env > default seguro.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub tenant_status: TenantStatus,
}

pub fn resolve_context(
    headers: &HeaderMap,
    default_tenant_id: Option<Uuid>,
    default_role: Option<Role>,
) -> RequestContext {
    let claims = decode_claims(headers);

    let role = claims
        .as_ref()
        .and_then(|c| c.role.as_deref())
        .and_then(Role::parse)
        .or_else(|| {
            headers
                .get("x-role")
                .and_then(|v| v.to_str().ok())
                .and_then(Role::parse)
        })
        .or(default_role)
        // Default seguro: o papel de menor alcance.
        .unwrap_or(Role::Attendant);

    let tenant_id = claims
        .as_ref()
        .and_then(|c| c.tenant_id)
        .or_else(|| {
            headers
                .get("x-tenant-id")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| Uuid::parse_str(v).ok())
        })
        .or(default_tenant_id);

    let tenant_status = claims
        .as_ref()
        .and_then(|c| c.tenant_status.as_deref())
        .map(TenantStatus::parse)
        .unwrap_or(TenantStatus::Unknown);

    RequestContext {
        user_id: claims.and_then(|c| c.user_id),
        tenant_id,
        role,
        tenant_status,
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(AppError::MissingTenant)
    }
}

// O extrator que os handlers de negócio usam: garante tenant resolvido.
#[derive(Debug, Clone)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.tenant_id)
            .map(TenantContext)
            .ok_or(AppError::MissingTenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {}={}", SESSION_COOKIE, value)).unwrap(),
        );
        headers
    }

    #[test]
    fn roundtrip_encode_decode() {
        let session = Session {
            user_id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            role: Role::Manager,
            tenant_status: TenantStatus::Active,
        };
        let headers = headers_with_cookie(&encode_session(&session));
        let ctx = resolve_context(&headers, None, None);

        assert_eq!(ctx.user_id, Some(session.user_id));
        assert_eq!(ctx.tenant_id, session.tenant_id);
        assert_eq!(ctx.role, Role::Manager);
        assert_eq!(ctx.tenant_status, TenantStatus::Active);
    }

    #[test]
    fn malformed_cookie_is_anonymous_not_error() {
        for bad in ["%%%não-é-base64%%%", "bm90IGpzb24=", ""] {
            let headers = headers_with_cookie(bad);
            let ctx = resolve_context(&headers, None, None);
            assert_eq!(ctx.user_id, None);
            assert_eq!(ctx.tenant_id, None);
            assert_eq!(ctx.role, Role::Attendant);
            assert_eq!(ctx.tenant_status, TenantStatus::Unknown);
        }
    }

    #[test]
    fn missing_cookie_falls_back_to_headers_then_env() {
        let tenant = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("x-role", HeaderValue::from_static("manager"));
        headers.insert(
            "x-tenant-id",
            HeaderValue::from_str(&tenant.to_string()).unwrap(),
        );

        let ctx = resolve_context(&headers, None, None);
        assert_eq!(ctx.role, Role::Manager);
        assert_eq!(ctx.tenant_id, Some(tenant));

        // Sem cabeçalhos: cai no default configurado, depois no seguro.
        let fallback = Uuid::new_v4();
        let ctx = resolve_context(&HeaderMap::new(), Some(fallback), Some(Role::Owner));
        assert_eq!(ctx.tenant_id, Some(fallback));
        assert_eq!(ctx.role, Role::Owner);

        let ctx = resolve_context(&HeaderMap::new(), None, None);
        assert_eq!(ctx.role, Role::Attendant);
    }

    #[test]
    fn session_wins_over_header_and_env() {
        let session_tenant = Uuid::new_v4();
        let session = Session {
            user_id: Uuid::new_v4(),
            tenant_id: Some(session_tenant),
            role: Role::Owner,
            tenant_status: TenantStatus::Pending,
        };
        let mut headers = headers_with_cookie(&encode_session(&session));
        headers.insert("x-role", HeaderValue::from_static("ATTENDANT"));

        let ctx = resolve_context(&headers, Some(Uuid::new_v4()), Some(Role::Attendant));
        assert_eq!(ctx.tenant_id, Some(session_tenant));
        assert_eq!(ctx.role, Role::Owner);
        assert_eq!(ctx.tenant_status, TenantStatus::Pending);
    }

    #[test]
    fn unknown_status_text_is_conservative() {
        assert_eq!(TenantStatus::parse("active"), TenantStatus::Active);
        assert_eq!(TenantStatus::parse("DELETED"), TenantStatus::Unknown);
        assert_eq!(TenantStatus::parse(""), TenantStatus::Unknown);
    }
}
