// src/middleware/lifecycle.rs

// A máquina de estados TenantStatus × classe de rota. O ciclo de vida do
// tenant domina a autorização por papel: o dono de um tenant suspenso não
// alcança conteúdo protegido mesmo passando em todas as regras de papel.

use crate::{
    common::error::AppError,
    middleware::session::RequestContext,
    models::{auth::Role, tenancy::TenantStatus},
};

pub const REGISTER_ROUTE: &str = "/register";
pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/home";
pub const PENDING_ROUTE: &str = "/access/pending";
pub const SUSPENDED_ROUTE: &str = "/access/suspended";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Rotas de entrada sem sessão (login, cadastro, reset).
    PublicAuth,
    /// Console administrativo: ignora tenant, exige papel ADMIN.
    Admin,
    /// Todo o resto do produto.
    Protected,
    /// Webhooks de máquina e health: autenticam por assinatura, não por cookie.
    Exempt,
}

pub fn classify(path: &str) -> RouteClass {
    const EXEMPT: &[&str] = &[
        "/api/health",
        "/api/payments/mpesa/webhook",
        "/api/billing/webhook",
        "/swagger-ui",
        "/api-docs",
    ];
    const PUBLIC_AUTH: &[&str] = &["/login", "/signup", "/register", "/reset", "/api/auth"];

    if EXEMPT.iter().any(|p| path.starts_with(p)) {
        return RouteClass::Exempt;
    }
    if PUBLIC_AUTH.iter().any(|p| path.starts_with(p)) {
        return RouteClass::PublicAuth;
    }
    if path.starts_with("/admin") || path.starts_with("/api/admin") {
        return RouteClass::Admin;
    }
    RouteClass::Protected
}

#[derive(Debug)]
pub enum GateOutcome {
    /// Segue o pipeline. `annotate_unknown` marca a resposta com
    /// x-tenant-status: UNKNOWN para o watcher do cliente continuar sondando.
    Continue { annotate_unknown: bool },
    /// Rotas de página redirecionam; nunca usado para rotas de API.
    Redirect(&'static str),
    /// Rotas de API recebem o erro estruturado correspondente.
    Fail(AppError),
}

pub fn decide(ctx: &RequestContext, class: RouteClass, path: &str) -> GateOutcome {
    let is_api = path.starts_with("/api");

    match class {
        RouteClass::Exempt => GateOutcome::Continue { annotate_unknown: false },

        // Admin ignora a resolução de tenant por completo.
        RouteClass::Admin => {
            if ctx.role == Role::Admin {
                GateOutcome::Continue { annotate_unknown: false }
            } else if is_api {
                GateOutcome::Fail(AppError::RoleForbidden {
                    role: ctx.role,
                    path: path.to_string(),
                })
            } else {
                GateOutcome::Redirect(LOGIN_ROUTE)
            }
        }

        RouteClass::PublicAuth => match ctx.tenant_id {
            // Sem tenant: entrada anônima liberada.
            None => GateOutcome::Continue { annotate_unknown: false },
            // Já logado: manda para o destino adequado ao status.
            Some(_) => GateOutcome::Redirect(match ctx.tenant_status {
                TenantStatus::Pending => PENDING_ROUTE,
                TenantStatus::Suspended => SUSPENDED_ROUTE,
                _ => HOME_ROUTE,
            }),
        },

        RouteClass::Protected => match ctx.tenant_id {
            None => {
                if is_api {
                    GateOutcome::Fail(AppError::MissingTenant)
                } else {
                    GateOutcome::Redirect(REGISTER_ROUTE)
                }
            }
            Some(_) => match ctx.tenant_status {
                // Independe do papel: OWNER suspenso também fica fora.
                TenantStatus::Pending => {
                    if is_api {
                        GateOutcome::Fail(AppError::TenantPending)
                    } else {
                        GateOutcome::Redirect(PENDING_ROUTE)
                    }
                }
                TenantStatus::Suspended => {
                    if is_api {
                        GateOutcome::Fail(AppError::TenantSuspended)
                    } else {
                        GateOutcome::Redirect(SUSPENDED_ROUTE)
                    }
                }
                TenantStatus::Active => GateOutcome::Continue { annotate_unknown: false },
                // Status indeterminado (ex: falha de lookup no login): não é
                // tratado como ACTIVE em silêncio nem bloqueado na hora.
                TenantStatus::Unknown => GateOutcome::Continue { annotate_unknown: true },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctx(tenant: Option<Uuid>, role: Role, status: TenantStatus) -> RequestContext {
        RequestContext { user_id: None, tenant_id: tenant, role, tenant_status: status }
    }

    #[test]
    fn classify_covers_the_route_families() {
        assert_eq!(classify("/api/health"), RouteClass::Exempt);
        assert_eq!(classify("/api/payments/mpesa/webhook"), RouteClass::Exempt);
        assert_eq!(classify("/api/billing/webhook"), RouteClass::Exempt);
        assert_eq!(classify("/login"), RouteClass::PublicAuth);
        assert_eq!(classify("/api/auth/login"), RouteClass::PublicAuth);
        assert_eq!(classify("/admin"), RouteClass::Admin);
        assert_eq!(classify("/api/admin/tenants"), RouteClass::Admin);
        assert_eq!(classify("/home"), RouteClass::Protected);
        assert_eq!(classify("/api/invoices"), RouteClass::Protected);
    }

    #[test]
    fn anonymous_public_auth_passes() {
        let outcome = decide(
            &ctx(None, Role::Attendant, TenantStatus::Unknown),
            RouteClass::PublicAuth,
            "/login",
        );
        assert!(matches!(outcome, GateOutcome::Continue { annotate_unknown: false }));
    }

    #[test]
    fn anonymous_protected_page_redirects_to_register() {
        let outcome = decide(
            &ctx(None, Role::Attendant, TenantStatus::Unknown),
            RouteClass::Protected,
            "/home",
        );
        assert!(matches!(outcome, GateOutcome::Redirect(REGISTER_ROUTE)));
    }

    #[test]
    fn anonymous_protected_api_is_missing_tenant() {
        let outcome = decide(
            &ctx(None, Role::Attendant, TenantStatus::Unknown),
            RouteClass::Protected,
            "/api/invoices",
        );
        assert!(matches!(outcome, GateOutcome::Fail(AppError::MissingTenant)));
    }

    #[test]
    fn logged_in_user_on_auth_route_goes_to_status_destination() {
        let tenant = Some(Uuid::new_v4());
        let cases = [
            (TenantStatus::Active, HOME_ROUTE),
            (TenantStatus::Pending, PENDING_ROUTE),
            (TenantStatus::Suspended, SUSPENDED_ROUTE),
            (TenantStatus::Unknown, HOME_ROUTE),
        ];
        for (status, destination) in cases {
            let outcome = decide(&ctx(tenant, Role::Owner, status), RouteClass::PublicAuth, "/login");
            match outcome {
                GateOutcome::Redirect(to) => assert_eq!(to, destination),
                other => panic!("esperava redirect, veio {:?}", other),
            }
        }
    }

    #[test]
    fn lifecycle_dominates_role_even_for_owner() {
        let tenant = Some(Uuid::new_v4());
        for role in [Role::Owner, Role::Manager, Role::Attendant] {
            let outcome = decide(
                &ctx(tenant, role, TenantStatus::Suspended),
                RouteClass::Protected,
                "/home",
            );
            assert!(matches!(outcome, GateOutcome::Redirect(SUSPENDED_ROUTE)));

            let outcome = decide(
                &ctx(tenant, role, TenantStatus::Pending),
                RouteClass::Protected,
                "/api/invoices",
            );
            assert!(matches!(outcome, GateOutcome::Fail(AppError::TenantPending)));
        }
    }

    #[test]
    fn admin_routes_bypass_tenant_but_require_admin() {
        let outcome = decide(
            &ctx(None, Role::Admin, TenantStatus::Unknown),
            RouteClass::Admin,
            "/api/admin/tenants",
        );
        assert!(matches!(outcome, GateOutcome::Continue { .. }));

        let outcome = decide(
            &ctx(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Active),
            RouteClass::Admin,
            "/admin",
        );
        assert!(matches!(outcome, GateOutcome::Redirect(LOGIN_ROUTE)));

        let outcome = decide(
            &ctx(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Active),
            RouteClass::Admin,
            "/api/admin/tenants",
        );
        assert!(matches!(outcome, GateOutcome::Fail(AppError::RoleForbidden { .. })));
    }

    #[test]
    fn unknown_status_continues_annotated() {
        let outcome = decide(
            &ctx(Some(Uuid::new_v4()), Role::Owner, TenantStatus::Unknown),
            RouteClass::Protected,
            "/home",
        );
        assert!(matches!(outcome, GateOutcome::Continue { annotate_unknown: true }));
    }
}
