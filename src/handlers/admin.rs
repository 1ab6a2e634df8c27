use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::handlers::auth::{current_user, require, session_cookie};
use crate::models::{Role, User};
use crate::services::access::Action;
use crate::services::datetime;
use crate::state::AppState;

fn bearer_matches(headers: &HeaderMap, expected_token: &str) -> bool {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    !token.is_empty() && token == expected_token
}

/// Admin bearer token, or a session belonging to an ADMIN.
fn check_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if bearer_matches(headers, &state.config.admin_token) {
        return Ok(());
    }
    let user = current_user(state, headers)?;
    require(&user, Action::ManageUsers)
}

// POST /api/admin/users
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(err, _)) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    check_admin(&state, &headers)?;

    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();
    if name.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("name and a valid email are required".to_string()));
    }

    let role = match body.role.as_deref() {
        Some(r) => Role::parse(r).ok_or_else(|| AppError::BadRequest(format!("unknown role: {r}")))?,
        None => Role::Customer,
    };

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        role,
    };

    {
        let conn = db::lock(&state.db)?;
        queries::save_user(&conn, &user).map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("email already registered".to_string())
            } else {
                AppError::Internal(e)
            }
        })?;
    }
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "user": user })),
    ))
}

// POST /api/admin/sessions
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Response, AppError> {
    check_admin(&state, &headers)?;

    let token = uuid::Uuid::new_v4().to_string();
    let ttl_hours = state.config.session_ttl_hours;

    let expires_at = {
        let conn = db::lock(&state.db)?;
        if queries::get_user(&conn, &body.user_id)?.is_none() {
            return Err(AppError::NotFound(format!("user {}", body.user_id)));
        }
        queries::create_session(&conn, &token, &body.user_id, ttl_hours)?
    };
    tracing::info!(user_id = %body.user_id, "session issued");

    let cookie = HeaderValue::from_str(&session_cookie(&token, ttl_hours * 3600))
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({
            "success": true,
            "token": token,
            "userId": body.user_id,
            "expiresAt": datetime::to_storage(&expires_at),
        })),
    )
        .into_response())
}
