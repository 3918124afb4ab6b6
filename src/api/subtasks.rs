//! Subtask routes, nested under `/api/tasks/{id}`.
//!
//! Every route resolves the parent task first (404 when absent); child
//! lookups additionally require the stored `task_id` to match the path,
//! so a subtask reached through the wrong task is a 404, not a leak.

use super::{created, ok, ok_message, parent_task, parse_path_id, ApiError, ApiResult, JsonBody, SharedState};
use crate::models::{Subtask, SubtaskRequest};
use crate::store::Store;
use crate::validate;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

fn owned_subtask(store: &Store, task_id: Uuid, raw_id: &str) -> Result<Subtask, ApiError> {
    let subtask_id = parse_path_id(raw_id)?;
    store
        .get_subtask(subtask_id)?
        .filter(|s| s.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("Subtask"))
}

// GET /api/tasks/{id}/subtasks
pub async fn list_subtasks(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    Ok(ok(state.store.subtasks_for_task(task.id)?))
}

// POST /api/tasks/{id}/subtasks
pub async fn create_subtask(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<SubtaskRequest>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let draft = validate::create_subtask(&payload).map_err(ApiError::validation)?;

    let subtask = Subtask {
        id: Uuid::new_v4(),
        task_id: task.id,
        name: draft.name,
        completed: draft.completed,
        created_at: Utc::now(),
    };
    state.store.create_subtask(&subtask)?;

    Ok(created(subtask))
}

// GET /api/tasks/{id}/subtasks/{subtask_id}
pub async fn get_subtask(
    State(state): State<SharedState>,
    Path((id, subtask_id)): Path<(String, String)>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let subtask = owned_subtask(&state.store, task.id, &subtask_id)?;
    Ok(ok(subtask))
}

// PUT /api/tasks/{id}/subtasks/{subtask_id}
pub async fn update_subtask(
    State(state): State<SharedState>,
    Path((id, subtask_id)): Path<(String, String)>,
    JsonBody(payload): JsonBody<SubtaskRequest>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let patch = validate::update_subtask(&payload).map_err(ApiError::validation)?;

    let mut subtask = owned_subtask(&state.store, task.id, &subtask_id)?;
    if let Some(name) = patch.name {
        subtask.name = name;
    }
    if let Some(completed) = patch.completed {
        subtask.completed = completed;
    }
    state.store.update_subtask(&subtask)?;

    Ok(ok(subtask))
}

// DELETE /api/tasks/{id}/subtasks/{subtask_id}
pub async fn delete_subtask(
    State(state): State<SharedState>,
    Path((id, subtask_id)): Path<(String, String)>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let subtask = owned_subtask(&state.store, task.id, &subtask_id)?;
    state.store.delete_subtask(subtask.id)?;
    Ok(ok_message("Subtask deleted"))
}
