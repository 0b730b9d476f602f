//! Session Gate Middleware
//! Mission: Require a valid, non-revoked session token in front of protected routes

use crate::auth::{models::AuthUser, session::{AuthError, SessionAuthenticator}};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Session gate wrapping the protected routers.
///
/// Extracts the bearer credential, delegates to the validator, and injects
/// the resolved identity into request extensions. Any failure short-circuits
/// with a 401 before the downstream operation runs.
pub async fn auth_middleware(
    State(sessions): State<Arc<SessionAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let user = sessions.authenticate(&token)?;
    req.extensions_mut().insert(AuthUser::from(&user));

    Ok(next.run(req).await)
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
/// A missing header, a different scheme, or an empty token all yield `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Extract the authenticated identity from a request (after the gate ran).
pub fn authenticated_user(req: &Request) -> Option<&AuthUser> {
    req.extensions().get::<AuthUser>()
}
