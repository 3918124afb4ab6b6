use super::{created, ok, ok_message, parse_path_id, ApiError, ApiResult, JsonBody, SharedState};
use crate::models::{List, ListRequest};
use crate::validate;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

// GET /api/lists
pub async fn list_lists(State(state): State<SharedState>) -> ApiResult {
    Ok(ok(state.store.list_lists()?))
}

// POST /api/lists
pub async fn create_list(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ListRequest>,
) -> ApiResult {
    let name = validate::create_list(&payload).map_err(ApiError::validation)?;

    let list = List {
        id: Uuid::new_v4(),
        name,
        is_default: false,
        created_at: Utc::now(),
    };
    state.store.create_list(&list)?;

    Ok(created(list))
}

// GET /api/lists/{id}
pub async fn get_list(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let list_id = parse_path_id(&id)?;
    let list = state
        .store
        .get_list(list_id)?
        .ok_or_else(|| ApiError::not_found("List"))?;
    Ok(ok(list))
}

// PUT /api/lists/{id}
pub async fn update_list(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ListRequest>,
) -> ApiResult {
    let list_id = parse_path_id(&id)?;
    let name = validate::update_list(&payload).map_err(ApiError::validation)?;

    let mut list = state
        .store
        .get_list(list_id)?
        .ok_or_else(|| ApiError::not_found("List"))?;
    list.name = name;
    state.store.update_list(&list)?;

    Ok(ok(list))
}

// DELETE /api/lists/{id}
pub async fn delete_list(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let list_id = parse_path_id(&id)?;
    let list = state
        .store
        .get_list(list_id)?
        .ok_or_else(|| ApiError::not_found("List"))?;

    if list.is_default {
        return Err(ApiError::bad_request("Cannot delete the default list"));
    }

    // Orphaned tasks fall back to the default list.
    let fallback = state
        .store
        .default_list()?
        .ok_or_else(|| ApiError::internal("default list missing"))?;
    state.store.delete_list(list.id, fallback.id)?;

    Ok(ok_message("List deleted"))
}
