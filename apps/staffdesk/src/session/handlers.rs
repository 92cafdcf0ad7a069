use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{AuthUser, UserRole};
use crate::session::idle::ActivityKind;
use crate::state::AppState;

/// Token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
}

/// Admits the request if it carries the active session's token and that
/// session holds one of `roles` (any role when `roles` is empty).
pub fn authorize(state: &AppState, headers: &HeaderMap, roles: &[UserRole]) -> Result<AuthUser, AppError> {
    Ok(state.session.authorize(bearer_token(headers), roles)?)
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthUser>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("email and password are required".into()));
    }
    // Submitting the login form is user input.
    state.idle.record(ActivityKind::Click);
    let user = state.session.login(&req.email, &req.password).await?;
    Ok(Json(user))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(State(state): State<AppState>) -> StatusCode {
    state.session.logout();
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/session
pub async fn handle_current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthUser>, AppError> {
    Ok(Json(authorize(&state, &headers, &[])?))
}

#[derive(Deserialize)]
pub struct ActivityReport {
    pub kind: ActivityKind,
}

/// POST /api/v1/session/activity
pub async fn handle_activity(
    State(state): State<AppState>,
    Json(report): Json<ActivityReport>,
) -> StatusCode {
    state.idle.record(report.kind);
    StatusCode::NO_CONTENT
}

/// GET /api/v1/session/notice
/// Returns the inactivity logout notice once, then 204.
pub async fn handle_take_notice(State(state): State<AppState>) -> Response {
    match state.idle.take_notice() {
        Some(notice) => Json(notice).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
