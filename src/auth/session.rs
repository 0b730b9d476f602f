//! Session Token Validator
//! Mission: Resolve a presented bearer token to an active user

use crate::auth::{
    jwt::JwtHandler, models::User, revocation::RevocationRegistry, user_store::UserStore,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Validates session tokens end to end: revocation, signature, expiry, and
/// subject resolution. Pure with respect to its inputs - validation never
/// mutates the registry or the store.
pub struct SessionAuthenticator {
    jwt: Arc<JwtHandler>,
    revocations: Arc<RevocationRegistry>,
    users: Arc<UserStore>,
}

impl SessionAuthenticator {
    pub fn new(
        jwt: Arc<JwtHandler>,
        revocations: Arc<RevocationRegistry>,
        users: Arc<UserStore>,
    ) -> Self {
        Self {
            jwt,
            revocations,
            users,
        }
    }

    /// Resolve a token to its active backing user.
    ///
    /// The revocation check runs before any decode work: a revoked token is
    /// rejected without revealing whether its signature would still verify.
    pub fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        if self.revocations.is_revoked(token) {
            warn!("Rejected revoked token");
            return Err(AuthError::Revoked);
        }

        let claims = self.jwt.decode_token(token).map_err(|_| {
            warn!("Rejected malformed or expired token");
            AuthError::InvalidToken
        })?;

        let subject = Uuid::parse_str(&claims.sub).map_err(|_| {
            warn!("Token subject is not a valid user id");
            AuthError::InvalidToken
        })?;

        match self.users.find_by_id(&subject) {
            Ok(Some(user)) if user.active => Ok(user),
            Ok(_) => {
                warn!(subject = %subject, "Token subject missing or deactivated");
                Err(AuthError::UserNotFound)
            }
            Err(e) => {
                error!(subject = %subject, error = %e, "User lookup failed during validation");
                Err(AuthError::UserNotFound)
            }
        }
    }
}

/// Authentication failures surfaced by the validator and the session gate.
/// All map to 401; the body distinguishes the cases without echoing token
/// contents or usernames.
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    Revoked,
    InvalidToken,
    UserNotFound,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::Revoked => (StatusCode::UNAUTHORIZED, "Token has been revoked"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found"),
        };

        (status, message).into_response()
    }
}
