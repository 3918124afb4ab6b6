use super::{created, ok, ok_message, parse_path_id, ApiError, ApiResult, JsonBody, SharedState};
use crate::models::{Label, LabelRequest};
use crate::validate;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

// GET /api/labels
pub async fn list_labels(State(state): State<SharedState>) -> ApiResult {
    Ok(ok(state.store.list_labels()?))
}

// POST /api/labels
pub async fn create_label(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<LabelRequest>,
) -> ApiResult {
    let name = validate::create_label(&payload).map_err(ApiError::validation)?;

    let label = Label { id: Uuid::new_v4(), name, created_at: Utc::now() };
    state.store.create_label(&label)?;

    Ok(created(label))
}

// GET /api/labels/{id}
pub async fn get_label(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let label_id = parse_path_id(&id)?;
    let label = state
        .store
        .get_label(label_id)?
        .ok_or_else(|| ApiError::not_found("Label"))?;
    Ok(ok(label))
}

// PUT /api/labels/{id}
pub async fn update_label(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<LabelRequest>,
) -> ApiResult {
    let label_id = parse_path_id(&id)?;
    let name = validate::update_label(&payload).map_err(ApiError::validation)?;

    let mut label = state
        .store
        .get_label(label_id)?
        .ok_or_else(|| ApiError::not_found("Label"))?;
    label.name = name;
    state.store.update_label(&label)?;

    Ok(ok(label))
}

// DELETE /api/labels/{id}
pub async fn delete_label(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let label_id = parse_path_id(&id)?;
    if !state.store.delete_label(label_id)? {
        return Err(ApiError::not_found("Label"));
    }
    Ok(ok_message("Label deleted"))
}
