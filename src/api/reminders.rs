//! Reminder routes, nested under `/api/tasks/{id}`. Same parent-existence
//! and ownership rules as subtasks.

use super::{created, ok, ok_message, parent_task, parse_path_id, ApiError, ApiResult, JsonBody, SharedState};
use crate::models::{Reminder, ReminderRequest};
use crate::store::Store;
use crate::validate;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

fn owned_reminder(store: &Store, task_id: Uuid, raw_id: &str) -> Result<Reminder, ApiError> {
    let reminder_id = parse_path_id(raw_id)?;
    store
        .get_reminder(reminder_id)?
        .filter(|r| r.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("Reminder"))
}

// GET /api/tasks/{id}/reminders
pub async fn list_reminders(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    Ok(ok(state.store.reminders_for_task(task.id)?))
}

// POST /api/tasks/{id}/reminders
pub async fn create_reminder(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ReminderRequest>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let remind_at = validate::create_reminder(&payload).map_err(ApiError::validation)?;

    let reminder = Reminder {
        id: Uuid::new_v4(),
        task_id: task.id,
        remind_at,
        created_at: Utc::now(),
    };
    state.store.create_reminder(&reminder)?;

    Ok(created(reminder))
}

// GET /api/tasks/{id}/reminders/{reminder_id}
pub async fn get_reminder(
    State(state): State<SharedState>,
    Path((id, reminder_id)): Path<(String, String)>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let reminder = owned_reminder(&state.store, task.id, &reminder_id)?;
    Ok(ok(reminder))
}

// PUT /api/tasks/{id}/reminders/{reminder_id}
pub async fn update_reminder(
    State(state): State<SharedState>,
    Path((id, reminder_id)): Path<(String, String)>,
    JsonBody(payload): JsonBody<ReminderRequest>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let remind_at = validate::update_reminder(&payload).map_err(ApiError::validation)?;

    let mut reminder = owned_reminder(&state.store, task.id, &reminder_id)?;
    if let Some(remind_at) = remind_at {
        reminder.remind_at = remind_at;
    }
    state.store.update_reminder(&reminder)?;

    Ok(ok(reminder))
}

// DELETE /api/tasks/{id}/reminders/{reminder_id}
pub async fn delete_reminder(
    State(state): State<SharedState>,
    Path((id, reminder_id)): Path<(String, String)>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let reminder = owned_reminder(&state.store, task.id, &reminder_id)?;
    state.store.delete_reminder(reminder.id)?;
    Ok(ok_message("Reminder deleted"))
}
