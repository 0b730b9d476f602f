//! Authentication API Endpoints
//! Mission: Provide registration, login, and logout endpoints

use crate::auth::{
    jwt::JwtHandler,
    middleware::{authenticated_user, bearer_token},
    models::{AuthUser, LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    revocation::RevocationRegistry,
    user_store::UserStore,
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub revocations: Arc<RevocationRegistry>,
}

impl AuthState {
    pub fn new(
        user_store: Arc<UserStore>,
        jwt_handler: Arc<JwtHandler>,
        revocations: Arc<RevocationRegistry>,
    ) -> Self {
        Self {
            user_store,
            jwt_handler,
            revocations,
        }
    }
}

/// Register endpoint - POST /api/users
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(AuthApiError::EmptyUsername);
    }

    let user = state
        .user_store
        .create_user(username, &payload.email, &payload.password)
        .map_err(|e| {
            warn!("Registration failed: {}", e);
            AuthApiError::InternalError
        })?
        .ok_or(AuthApiError::DuplicateUsername)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    // Unknown username, deactivated account, and wrong password all collapse
    // into the same response; the store logs the distinction.
    let user = state
        .user_store
        .verify_credentials(&payload.username, &payload.password)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::InvalidCredentials)?;

    let (access_token, expires_in) = state
        .jwt_handler
        .issue_token(&user.id)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("✅ Login successful: {}", user.username);

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Logout endpoint - POST /api/auth/logout
///
/// Adds the presented token to the revocation registry. Works for any token
/// string, valid or not - revocation is a terminal state and inserting an
/// already-broken token is harmless.
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    let token = bearer_token(&headers).ok_or(AuthApiError::MissingToken)?;

    // Keep the registry sweepable: fall back to a full default lifetime when
    // the token's own expiry cannot be read.
    let expires_at = state.jwt_handler.peek_expiry(&token).unwrap_or_else(|| {
        Utc::now().timestamp() + state.jwt_handler.ttl_minutes() * 60
    });

    state.revocations.revoke(&token, expires_at);
    info!("👋 Session token revoked on logout");

    Ok(Json(json!({ "message": "Logged out" })))
}

/// Current user endpoint - GET /api/auth/me
///
/// Runs behind the session gate; the identity was already resolved against
/// the store, so no lookup happens here.
pub async fn me(req: Request) -> Result<Json<AuthUser>, AuthApiError> {
    let user = authenticated_user(&req)
        .cloned()
        .ok_or(AuthApiError::Unauthorized)?;
    Ok(Json(user))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    EmptyUsername,
    DuplicateUsername,
    MissingToken,
    Unauthorized,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::EmptyUsername => (StatusCode::BAD_REQUEST, "Username must not be empty"),
            AuthApiError::DuplicateUsername => (StatusCode::CONFLICT, "Username already exists"),
            AuthApiError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Missing authorization token")
            }
            AuthApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_api_error_responses() {
        let invalid_creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(invalid_creds.status(), StatusCode::UNAUTHORIZED);

        let empty = AuthApiError::EmptyUsername.into_response();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let conflict = AuthApiError::DuplicateUsername.into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing = AuthApiError::MissingToken.into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    }
}
