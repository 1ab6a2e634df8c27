use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::User;
use crate::services::access::{self, Action};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "vet_session";

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves the session cookie to a user, or 401.
pub fn current_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = session_token(headers).ok_or(AppError::Unauthorized)?;
    let conn = db::lock(&state.db)?;
    queries::get_session_user(&conn, &token)?.ok_or(AppError::Unauthorized)
}

pub fn require(user: &User, action: Action) -> Result<(), AppError> {
    if access::can(user.role, action) {
        Ok(())
    } else {
        tracing::info!(user_id = %user.id, role = user.role.as_str(), ?action, "access denied");
        Err(AppError::Forbidden)
    }
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = current_user(&state, &headers)?;
    Ok(Json(serde_json::json!({ "success": true, "user": user })))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = session_token(&headers).ok_or(AppError::Unauthorized)?;
    {
        let conn = db::lock(&state.db)?;
        queries::delete_session(&conn, &token)?;
    }

    let cookie = HeaderValue::from_str(&session_cookie("", 0))
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}
