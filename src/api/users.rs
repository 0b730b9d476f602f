//! User CRUD Endpoints
//! Mission: Read, update, and soft-delete user accounts

use crate::api::{ApiError, AppState};
use crate::auth::models::UserResponse;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

/// User update request body. Fields left out are untouched.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Get user - GET /api/users/:id
///
/// Deactivated users stay resolvable here; soft delete only removes them
/// from login and token validation.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    let user = state
        .users
        .find_by_id(&id)
        .map_err(|_| ApiError::InternalError)?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Update user - PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    // A rename must not collide with another account. The store's UNIQUE
    // constraint still backstops the narrow race between check and update.
    if let Some(username) = payload.username.as_deref() {
        let taken = state
            .users
            .find_by_username(username)
            .map_err(|_| ApiError::InternalError)?
            .is_some_and(|existing| existing.id != id);
        if taken {
            warn!("Rename rejected, username taken: {}", username);
            return Err(ApiError::DuplicateUsername);
        }
    }

    let user = state
        .users
        .update_user(&id, payload.username.as_deref(), payload.email.as_deref())
        .map_err(|_| ApiError::InternalError)?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Soft delete user - DELETE /api/users/:id
///
/// Flips the active flag; the record remains so historical references stay
/// resolvable, but the identity can no longer authenticate.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_user_id(&id)?;

    let deactivated = state
        .users
        .set_active(&id, false)
        .map_err(|_| ApiError::InternalError)?;

    if !deactivated {
        return Err(ApiError::UserNotFound);
    }

    Ok(Json(json!({ "message": format!("User '{id}' deactivated") })))
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!("Malformed user id: {}", raw);
        ApiError::InvalidId
    })
}
