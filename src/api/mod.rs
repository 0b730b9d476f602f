//! HTTP API
//! Mission: CRUD handlers for users and tasks behind the session gate

pub mod tasks;
pub mod users;

use crate::auth::user_store::UserStore;
use crate::tasks::store::TaskStore;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Shared application state for the CRUD handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub tasks: Arc<TaskStore>,
}

impl AppState {
    pub fn new(users: Arc<UserStore>, tasks: Arc<TaskStore>) -> Self {
        Self { users, tasks }
    }
}

/// Business-operation errors. Distinct from the gate's auth failures: a 404
/// here means an operation referenced a missing record, not that the caller
/// is unauthenticated.
#[derive(Debug)]
pub enum ApiError {
    InvalidId,
    UserNotFound,
    TaskNotFound,
    DuplicateUsername,
    AssignedUserMissing,
    InternalError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid id format"),
            ApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            ApiError::TaskNotFound => (StatusCode::NOT_FOUND, "Task not found"),
            ApiError::DuplicateUsername => (StatusCode::CONFLICT, "Username already exists"),
            ApiError::AssignedUserMissing => {
                (StatusCode::BAD_REQUEST, "Assigned user does not exist")
            }
            ApiError::InternalError => {
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
    fn test_api_error_responses() {
        let invalid = ApiError::InvalidId.into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let user_missing = ApiError::UserNotFound.into_response();
        assert_eq!(user_missing.status(), StatusCode::NOT_FOUND);

        let task_missing = ApiError::TaskNotFound.into_response();
        assert_eq!(task_missing.status(), StatusCode::NOT_FOUND);

        let conflict = ApiError::DuplicateUsername.into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let bad_assignee = ApiError::AssignedUserMissing.into_response();
        assert_eq!(bad_assignee.status(), StatusCode::BAD_REQUEST);
    }
}
