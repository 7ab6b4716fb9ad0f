// tests/gatekeeper_test.rs

// Dirige o pipeline de admissão inteiro pelo Router, sem banco vivo:
// a pool é lazy e a porta é recusada, então o contador distribuído cai
// para a janela local (fail open) e qualquer handler que chegue ao banco
// devolve 500, o que por si só prova que o gate deixou passar.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use ezduka_backend::{
    app,
    config::AppState,
    middleware::{
        csrf::{CSRF_COOKIE, CSRF_HEADER},
        rate_limit::RateLimitConfig,
        session::{encode_session, SESSION_COOKIE},
    },
    models::{auth::{Role, Session}, tenancy::TenantStatus},
};

fn test_app(rate_config: RateLimitConfig) -> Router {
    // Porta 1 recusa na hora: o caminho distribuído falha rápido.
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://postgres@127.0.0.1:1/ezduka")
        .expect("URL da pool de teste");

    app(AppState::with_pool(pool, rate_config))
}

fn default_app() -> Router {
    test_app(RateLimitConfig { window: Duration::from_secs(60), max_requests: 50 })
}

fn session_cookie(tenant: Option<Uuid>, role: Role, status: TenantStatus) -> String {
    let session = Session {
        user_id: Uuid::new_v4(),
        tenant_id: tenant,
        role,
        tenant_status: status,
    };
    format!("{}={}", SESSION_COOKIE, encode_session(&session))
}

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let response = default_app().oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_protected_page_redirects_to_register() {
    let response = default_app().oneshot(get("/home", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/register");
}

#[tokio::test]
async fn anonymous_protected_api_is_missing_tenant() {
    let response = default_app()
        .oneshot(get("/api/tenant/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("tenant"));
}

#[tokio::test]
async fn suspended_tenant_is_locked_out_regardless_of_role() {
    for role in [Role::Owner, Role::Manager, Role::Attendant] {
        let cookie = session_cookie(Some(Uuid::new_v4()), role, TenantStatus::Suspended);

        // Página: redirect para a tela de suspensão.
        let response = default_app().oneshot(get("/home", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/access/suspended");

        // API: 403 estruturado.
        let response = default_app()
            .oneshot(get("/api/tenant/status", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn pending_tenant_redirects_to_pending_screen() {
    let cookie = session_cookie(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Pending);
    let response = default_app().oneshot(get("/invoices", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/access/pending");
}

#[tokio::test]
async fn logged_in_user_is_bounced_off_auth_pages() {
    let cookie = session_cookie(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Active);
    let response = default_app().oneshot(get("/login", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/home");
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    // Página sem papel ADMIN: volta para o login.
    let owner = session_cookie(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Active);
    let response = default_app().oneshot(get("/admin", Some(&owner))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    // API sem papel ADMIN: 403 com papel e rota no corpo.
    let response = default_app()
        .oneshot(get("/api/admin/tenants", Some(&owner)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["role"], "OWNER");
    assert_eq!(json["path"], "/api/admin/tenants");

    // ADMIN passa o gate (o 404 é só a rota inexistente atrás dele).
    let admin = session_cookie(None, Role::Admin, TenantStatus::Unknown);
    let response = default_app()
        .oneshot(get("/admin/qualquer-coisa", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_rules_gate_management_routes() {
    let attendant = session_cookie(Some(Uuid::new_v4()), Role::Attendant, TenantStatus::Active);
    let response = default_app()
        .oneshot(get("/inventory", Some(&attendant)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let manager = session_cookie(Some(Uuid::new_v4()), Role::Manager, TenantStatus::Active);
    let response = default_app().oneshot(get("/inventory", Some(&manager))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutations_require_the_double_submit_csrf_pair() {
    let tenant = Uuid::new_v4();
    let session = session_cookie(Some(tenant), Role::Attendant, TenantStatus::Active);

    // Sem token: 403 antes de qualquer lógica de negócio.
    let request = Request::builder()
        .method("POST")
        .uri("/api/sales/quick")
        .header(header::COOKIE, &session)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"item":"Sugar","amount":100.0}"#))
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Cookie e cabeçalho divergentes: idem.
    let request = Request::builder()
        .method("POST")
        .uri("/api/sales/quick")
        .header(header::COOKIE, format!("{}; {}=tok-a", session, CSRF_COOKIE))
        .header(CSRF_HEADER, "tok-b")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"item":"Sugar","amount":100.0}"#))
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Par correto: o gate libera e a requisição morre só no banco (500),
    // prova de que o CSRF deixou de ser o bloqueio.
    let request = Request::builder()
        .method("POST")
        .uri("/api/sales/quick")
        .header(header::COOKIE, format!("{}; {}=tok-a", session, CSRF_COOKIE))
        .header(CSRF_HEADER, "tok-a")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"item":"Sugar","amount":100.0}"#))
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn webhooks_bypass_csrf_and_session() {
    // Sem cookie, sem CSRF: chega ao handler, que recusa só pela assinatura.
    let request = Request::builder()
        .method("POST")
        .uri("/api/billing/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"tenantId":null,"plan":"pro"}"#))
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn passing_request_gets_context_headers_and_a_csrf_token() {
    let tenant = Uuid::new_v4();
    let cookie = session_cookie(Some(tenant), Role::Owner, TenantStatus::Active);
    let response = default_app().oneshot(get("/home", Some(&cookie))).await.unwrap();

    // Passou o gate (404 é a página inexistente atrás dele).
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-tenant-id"], tenant.to_string());
    assert_eq!(response.headers()["x-role"], "OWNER");

    // Emissão oportunista do token em GET sem cookie ez_csrf.
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("ez_csrf="));
    assert!(set_cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn unknown_status_passes_annotated() {
    let cookie = session_cookie(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Unknown);
    let response = default_app().oneshot(get("/home", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-tenant-status"], "UNKNOWN");
}

#[tokio::test]
async fn rate_limit_rejects_above_the_window_threshold() {
    let app = test_app(RateLimitConfig { window: Duration::from_secs(60), max_requests: 3 });
    let cookie = session_cookie(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Active);

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/api/health", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/api/health", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Outra identidade de rede entra em outro balde.
    let request = Request::builder()
        .uri("/api/health")
        .header(header::COOKIE, &cookie)
        .header("x-forwarded-for", "198.51.100.7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
