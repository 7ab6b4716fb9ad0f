// src/middleware/rbac.rs

use crate::{common::error::AppError, models::auth::Role};

// Uma regra: prefixo de rota -> papéis autorizados.
#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub pattern: &'static str,
    pub allowed: &'static [Role],
}

impl RouteRule {
    // Casamento por prefixo, caso-insensitivo. Comparação em bytes para
    // não depender de fronteira de caractere em paths não-ASCII.
    fn matches(&self, path: &str) -> bool {
        path.len() >= self.pattern.len()
            && path.as_bytes()[..self.pattern.len()].eq_ignore_ascii_case(self.pattern.as_bytes())
    }
}

// A tabela ordenada de regras. Rotas de negócio fora da tabela passam
// (default-allow): elas dependem do escopo por tenant, não deste layer.
pub const ROLE_RULES: &[RouteRule] = &[
    RouteRule { pattern: "/admin", allowed: &[Role::Admin] },
    RouteRule { pattern: "/settings", allowed: &[Role::Owner] },
    RouteRule { pattern: "/suppliers", allowed: &[Role::Owner, Role::Manager] },
    RouteRule { pattern: "/inventory", allowed: &[Role::Owner, Role::Manager] },
    RouteRule { pattern: "/money", allowed: &[Role::Owner, Role::Manager] },
    RouteRule { pattern: "/api/purchase-orders", allowed: &[Role::Owner, Role::Manager] },
    RouteRule { pattern: "/api/suppliers", allowed: &[Role::Owner, Role::Manager] },
    // Vender e faturar também é trabalho de atendente.
    RouteRule { pattern: "/invoice", allowed: &[Role::Owner, Role::Manager, Role::Attendant] },
    RouteRule { pattern: "/api/invoices", allowed: &[Role::Owner, Role::Manager, Role::Attendant] },
    RouteRule { pattern: "/api/payments", allowed: &[Role::Owner, Role::Manager, Role::Attendant] },
];

/// Percorre a tabela inteira: TODA regra que casar com o path precisa
/// individualmente permitir o papel. Um path coberto por duas regras
/// exige pertencer aos dois conjuntos (interseção).
/// A primeira regra que barrar encerra, carregando papel + path no erro.
pub fn authorize(path: &str, role: Role, rules: &[RouteRule]) -> Result<(), AppError> {
    for rule in rules {
        if rule.matches(path) && !rule.allowed.contains(&role) {
            return Err(AppError::RoleForbidden { role, path: path.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_routes_are_default_allow() {
        for role in [Role::Admin, Role::Owner, Role::Manager, Role::Attendant] {
            assert!(authorize("/api/customers", role, ROLE_RULES).is_ok());
            assert!(authorize("/home", role, ROLE_RULES).is_ok());
        }
    }

    #[test]
    fn attendant_cannot_reach_management_routes() {
        for path in ["/inventory", "/suppliers", "/money", "/api/purchase-orders", "/api/suppliers"] {
            let err = authorize(path, Role::Attendant, ROLE_RULES).unwrap_err();
            match err {
                AppError::RoleForbidden { role, path: p } => {
                    assert_eq!(role, Role::Attendant);
                    assert_eq!(p, path);
                }
                other => panic!("esperava RoleForbidden, veio {:?}", other),
            }
        }
    }

    #[test]
    fn attendant_can_sell_and_invoice() {
        assert!(authorize("/invoice/novo", Role::Attendant, ROLE_RULES).is_ok());
        assert!(authorize("/api/invoices/abc/mark-paid", Role::Attendant, ROLE_RULES).is_ok());
        assert!(authorize("/api/payments/mpesa/request", Role::Attendant, ROLE_RULES).is_ok());
    }

    #[test]
    fn matching_is_case_insensitive_prefix() {
        assert!(authorize("/Admin/tenants", Role::Admin, ROLE_RULES).is_ok());
        assert!(authorize("/ADMIN", Role::Owner, ROLE_RULES).is_err());
    }

    #[test]
    fn overlapping_rules_require_membership_in_every_matching_set() {
        // Path coberto por duas regras: o conjunto efetivo é a interseção.
        const OVERLAPPING: &[RouteRule] = &[
            RouteRule { pattern: "/api", allowed: &[Role::Owner, Role::Manager] },
            RouteRule { pattern: "/api/reports", allowed: &[Role::Owner, Role::Attendant] },
        ];

        // Owner pertence aos dois conjuntos.
        assert!(authorize("/api/reports/daily", Role::Owner, OVERLAPPING).is_ok());
        // Manager passa na primeira mas falha na segunda.
        assert!(authorize("/api/reports/daily", Role::Manager, OVERLAPPING).is_err());
        // Attendant passa na segunda mas falha na primeira.
        assert!(authorize("/api/reports/daily", Role::Attendant, OVERLAPPING).is_err());
    }
}
