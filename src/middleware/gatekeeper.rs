// src/middleware/gatekeeper.rs

// O pipeline fixo aplicado a TODA requisição, na ordem:
// rate limit -> CSRF (só métodos mutantes) -> sessão -> ciclo de vida do
// tenant -> autorização por papel. Rejeição em qualquer estágio é terminal:
// a lógica de negócio nunca vê uma requisição reprovada.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        csrf,
        lifecycle::{self, GateOutcome, RouteClass},
        rate_limit::{bucket_key, RateDecision},
        rbac::{self, ROLE_RULES},
        session::{cookie_value, resolve_context},
    },
    models::tenancy::TenantStatus,
};

pub async fn gatekeeper(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let headers = request.headers().clone();
    let class = lifecycle::classify(&path);

    // Resolução de sessão antecipada: o limiter precisa de tenant/papel
    // para compor a chave do balde antes dos demais estágios.
    let ctx = resolve_context(&headers, app_state.default_tenant_id, app_state.default_role);

    // 1. Rate limit (distribuído primeiro, janela local como fallback)
    let key = bucket_key(ctx.tenant_id, ctx.role, &headers);
    if app_state.rate_limiter.admit(&key).await == RateDecision::Rejected {
        tracing::warn!("Rate limit excedido para {}", key);
        return AppError::RateLimited.into_response();
    }

    // 2. CSRF para métodos que alteram estado (webhooks na lista de bypass)
    if let Err(err) = csrf::validate(&method, &headers, class == RouteClass::Exempt) {
        return err.into_response();
    }

    // 4. Ciclo de vida do tenant (domina o papel)
    let annotate_unknown = match lifecycle::decide(&ctx, class, &path) {
        GateOutcome::Continue { annotate_unknown } => annotate_unknown,
        GateOutcome::Redirect(to) => return Redirect::to(to).into_response(),
        GateOutcome::Fail(err) => return err.into_response(),
    };

    if annotate_unknown {
        tracing::warn!(
            "Tenant {:?} com status indeterminado em {}; seguindo com anotação",
            ctx.tenant_id,
            path
        );
    }

    // 5. Autorização por papel (toda regra que casar precisa permitir)
    if let Err(err) = rbac::authorize(&path, ctx.role, ROLE_RULES) {
        return err.into_response();
    }

    // Passou tudo: anexa o contexto resolvido para os handlers.
    let role = ctx.role;
    let tenant_id = ctx.tenant_id;
    let had_csrf_cookie = cookie_value(&headers, csrf::CSRF_COOKIE).is_some();
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;

    // Propaga identidade resolvida para consumo downstream.
    if let Some(tenant) = tenant_id {
        if let Ok(value) = HeaderValue::from_str(&tenant.to_string()) {
            response.headers_mut().insert("x-tenant-id", value);
        }
    }
    response
        .headers_mut()
        .insert("x-role", HeaderValue::from_static(role.as_str()));
    if annotate_unknown {
        response.headers_mut().insert(
            "x-tenant-status",
            HeaderValue::from_static(TenantStatus::Unknown.as_str()),
        );
    }

    // Emissão oportunista do token CSRF: requisição não-mutante que passou
    // o pipeline inteiro e ainda não carrega cookie ganha um fresco.
    if !csrf::is_mutating(&method) && !had_csrf_cookie && class != RouteClass::Exempt {
        let token = csrf::generate_token();
        if let Ok(value) = HeaderValue::from_str(&csrf::csrf_cookie_header(&token)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}
