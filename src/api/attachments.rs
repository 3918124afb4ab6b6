//! Attachment metadata routes, nested under `/api/tasks/{id}`. The file
//! bytes themselves live wherever `url` points; this layer only tracks
//! the reference.

use super::{created, ok, ok_message, parent_task, parse_path_id, ApiError, ApiResult, JsonBody, SharedState};
use crate::models::{Attachment, AttachmentRequest};
use crate::store::Store;
use crate::validate;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

fn owned_attachment(store: &Store, task_id: Uuid, raw_id: &str) -> Result<Attachment, ApiError> {
    let attachment_id = parse_path_id(raw_id)?;
    store
        .get_attachment(attachment_id)?
        .filter(|a| a.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("Attachment"))
}

// GET /api/tasks/{id}/attachments
pub async fn list_attachments(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    Ok(ok(state.store.attachments_for_task(task.id)?))
}

// POST /api/tasks/{id}/attachments
pub async fn create_attachment(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<AttachmentRequest>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let draft = validate::create_attachment(&payload).map_err(ApiError::validation)?;

    let attachment = Attachment {
        id: Uuid::new_v4(),
        task_id: task.id,
        file_name: draft.file_name,
        url: draft.url,
        created_at: Utc::now(),
    };
    state.store.create_attachment(&attachment)?;

    Ok(created(attachment))
}

// GET /api/tasks/{id}/attachments/{attachment_id}
pub async fn get_attachment(
    State(state): State<SharedState>,
    Path((id, attachment_id)): Path<(String, String)>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let attachment = owned_attachment(&state.store, task.id, &attachment_id)?;
    Ok(ok(attachment))
}

// PUT /api/tasks/{id}/attachments/{attachment_id}
pub async fn update_attachment(
    State(state): State<SharedState>,
    Path((id, attachment_id)): Path<(String, String)>,
    JsonBody(payload): JsonBody<AttachmentRequest>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let patch = validate::update_attachment(&payload).map_err(ApiError::validation)?;

    let mut attachment = owned_attachment(&state.store, task.id, &attachment_id)?;
    if let Some(file_name) = patch.file_name {
        attachment.file_name = file_name;
    }
    if let Some(url) = patch.url {
        attachment.url = url;
    }
    state.store.update_attachment(&attachment)?;

    Ok(ok(attachment))
}

// DELETE /api/tasks/{id}/attachments/{attachment_id}
pub async fn delete_attachment(
    State(state): State<SharedState>,
    Path((id, attachment_id)): Path<(String, String)>,
) -> ApiResult {
    let task = parent_task(&state.store, &id)?;
    let attachment = owned_attachment(&state.store, task.id, &attachment_id)?;
    state.store.delete_attachment(attachment.id)?;
    Ok(ok_message("Attachment deleted"))
}
