// src/middleware/csrf.rs

// Proteção CSRF pelo padrão double-submit-cookie: o token vive num cookie
// legível pelo script do cliente, que o espelha num cabeçalho a cada
// mutação. Um site terceiro não consegue ler o cookie para ecoá-lo.

use axum::http::{HeaderMap, Method};
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::{common::error::AppError, middleware::session::cookie_value};

pub const CSRF_COOKIE: &str = "ez_csrf";
pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_MAX_AGE_SECS: i64 = 8 * 60 * 60;

/// Métodos que alteram estado e portanto exigem o token.
pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Valida a dupla submissão. `exempt` cobre a lista de bypass (webhooks de
/// provedores de pagamento, que não carregam cookies de navegador).
pub fn validate(method: &Method, headers: &HeaderMap, exempt: bool) -> Result<(), AppError> {
    if !is_mutating(method) || exempt {
        return Ok(());
    }

    let cookie_token = cookie_value(headers, CSRF_COOKIE);
    let header_token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    match (cookie_token, header_token) {
        // Ambos presentes e byte a byte iguais, em tempo constante.
        (Some(cookie), Some(header))
            if bool::from(cookie.as_bytes().ct_eq(header.as_bytes())) =>
        {
            Ok(())
        }
        _ => Err(AppError::CsrfMismatch),
    }
}

/// Gera um token opaco novo (emitido quando um GET passa o pipeline inteiro
/// sem já carregar um).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Set-Cookie do token. NÃO é HttpOnly de propósito: o cliente precisa
/// ler o valor para espelhá-lo no cabeçalho.
pub fn csrf_cookie_header(token: &str) -> String {
    format!(
        "{}={}; Path=/; SameSite=Lax; Max-Age={}",
        CSRF_COOKIE, token, CSRF_MAX_AGE_SECS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn headers(cookie: Option<&str>, header_token: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(c) = cookie {
            map.insert(
                header::COOKIE,
                HeaderValue::from_str(&format!("{}={}", CSRF_COOKIE, c)).unwrap(),
            );
        }
        if let Some(h) = header_token {
            map.insert(CSRF_HEADER, HeaderValue::from_str(h).unwrap());
        }
        map
    }

    #[test]
    fn safe_methods_skip_validation() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(validate(&method, &HeaderMap::new(), false).is_ok());
        }
    }

    #[test]
    fn matching_tokens_admit_mutation() {
        let map = headers(Some("tok-123"), Some("tok-123"));
        assert!(validate(&Method::POST, &map, false).is_ok());
    }

    #[test]
    fn mismatch_or_missing_rejects() {
        let cases = [
            headers(Some("tok-123"), Some("tok-456")),
            headers(Some("tok-123"), None),
            headers(None, Some("tok-123")),
            headers(None, None),
        ];
        for map in cases {
            assert!(matches!(
                validate(&Method::POST, &map, false),
                Err(AppError::CsrfMismatch)
            ));
        }
    }

    #[test]
    fn exempt_paths_bypass_even_without_tokens() {
        assert!(validate(&Method::POST, &HeaderMap::new(), true).is_ok());
    }

    #[test]
    fn generated_tokens_are_opaque_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
