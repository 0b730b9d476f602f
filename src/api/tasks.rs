//! Task CRUD Endpoints
//! Mission: Create, read, update, and delete tasks assigned to users

use crate::api::{ApiError, AppState};
use crate::tasks::models::{Task, TaskCreate, TaskUpdate};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub assigned_to: Option<String>,
}

/// Create task - POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskCreate>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if let Some(assignee) = payload.assigned_to.as_deref() {
        require_active_user(&state, assignee)?;
    }

    let task = state
        .tasks
        .create_task(&payload)
        .map_err(|_| ApiError::InternalError)?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Get task - GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;

    let task = state
        .tasks
        .get_task(&id)
        .map_err(|_| ApiError::InternalError)?
        .ok_or(ApiError::TaskNotFound)?;

    Ok(Json(task))
}

/// List tasks - GET /api/tasks?assigned_to=
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .tasks
        .list_tasks(query.assigned_to.as_deref())
        .map_err(|_| ApiError::InternalError)?;

    Ok(Json(tasks))
}

/// Update task - PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;

    // Reassignment gets the same active-user check as creation
    if let Some(assignee) = payload.assigned_to.as_deref() {
        require_active_user(&state, assignee)?;
    }

    let task = state
        .tasks
        .update_task(&id, &payload)
        .map_err(|_| ApiError::InternalError)?
        .ok_or(ApiError::TaskNotFound)?;

    Ok(Json(task))
}

/// Delete task - DELETE /api/tasks/:id
///
/// Tasks are hard-deleted, unlike users.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_task_id(&id)?;

    let deleted = state
        .tasks
        .delete_task(&id)
        .map_err(|_| ApiError::InternalError)?;

    if !deleted {
        return Err(ApiError::TaskNotFound);
    }

    Ok(Json(json!({ "message": format!("Task {id} deleted") })))
}

fn require_active_user(state: &AppState, username: &str) -> Result<(), ApiError> {
    let active = state
        .users
        .find_by_username(username)
        .map_err(|_| ApiError::InternalError)?
        .map(|user| user.active)
        .unwrap_or(false);

    if !active {
        warn!("Task assignment to missing or inactive user: {}", username);
        return Err(ApiError::AssignedUserMissing);
    }
    Ok(())
}

fn parse_task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!("Malformed task id: {}", raw);
        ApiError::InvalidId
    })
}
