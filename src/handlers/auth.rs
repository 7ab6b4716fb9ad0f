// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::{clear_session_cookie_header, encode_session, session_cookie_header},
    models::auth::{AuthResponse, LoginPayload, SignupPayload},
};

// Handler de login: valida credenciais, emite o cookie de sessão e devolve
// o destino pós-login (admin, home ou tela de pendência).
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (session, redirect) = app_state
        .auth_service
        .login(&payload.email.trim().to_lowercase(), &payload.password)
        .await?;

    let cookie = session_cookie_header(&encode_session(&session));

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { redirect }),
    ))
}

// Handler de cadastro: tenant novo nasce PENDING, usuário nasce OWNER.
pub async fn signup(
    State(app_state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (session, redirect) = app_state
        .auth_service
        .signup(
            &payload.email.trim().to_lowercase(),
            &payload.password,
            payload.shop_name.trim(),
        )
        .await?;

    let cookie = session_cookie_header(&encode_session(&session));

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { redirect }),
    ))
}

// Logout: só apaga o cookie.
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie_header())],
        Json(json!({ "message": "Logged out." })),
    )
}
