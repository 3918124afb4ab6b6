//! HTTP surface: envelope, error mapping, body extraction, router.
//!
//! Every response is `{ success, data?, error?, details?, message? }`.
//! Handlers validate identifiers and payloads first, then talk to the
//! store; anything unexpected is logged and flattened to a generic 500.

pub mod attachments;
pub mod labels;
pub mod lists;
pub mod reminders;
pub mod subtasks;
pub mod tasks;

#[cfg(test)]
mod tests;

use crate::models::Task;
use crate::store::{Store, StoreError};
use crate::validate::{self, Issue};
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

// ── Shared state ───────────────────────────────────────────────

pub struct AppState {
    pub store: Store,
}

pub type SharedState = Arc<AppState>;

// ── Router ─────────────────────────────────────────────────────

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/api/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/api/lists/{id}",
            get(lists::get_list)
                .put(lists::update_list)
                .delete(lists::delete_list),
        )
        .route(
            "/api/labels",
            get(labels::list_labels).post(labels::create_label),
        )
        .route(
            "/api/labels/{id}",
            get(labels::get_label)
                .put(labels::update_label)
                .delete(labels::delete_label),
        )
        .route(
            "/api/tasks/{id}/subtasks",
            get(subtasks::list_subtasks).post(subtasks::create_subtask),
        )
        .route(
            "/api/tasks/{id}/subtasks/{subtask_id}",
            get(subtasks::get_subtask)
                .put(subtasks::update_subtask)
                .delete(subtasks::delete_subtask),
        )
        .route(
            "/api/tasks/{id}/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route(
            "/api/tasks/{id}/reminders/{reminder_id}",
            get(reminders::get_reminder)
                .put(reminders::update_reminder)
                .delete(reminders::delete_reminder),
        )
        .route(
            "/api/tasks/{id}/attachments",
            get(attachments::list_attachments).post(attachments::create_attachment),
        )
        .route(
            "/api/tasks/{id}/attachments/{attachment_id}",
            get(attachments::get_attachment)
                .put(attachments::update_attachment)
                .delete(attachments::delete_attachment),
        )
        .with_state(state)
}

// ── Response envelope ──────────────────────────────────────────

pub type ApiResult = Result<Response, ApiError>;

pub fn ok<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, json!({ "success": true, "data": data }))
}

pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, json!({ "success": true, "data": data }))
}

pub fn ok_message(message: &str) -> Response {
    envelope(StatusCode::OK, json!({ "success": true, "message": message }))
}

fn envelope(status: StatusCode, body: serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<Vec<Issue>>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, error: message.into(), details: None }
    }

    /// Malformed identifier, path or body: fixed message, fires before any
    /// store access.
    pub fn invalid_id() -> Self {
        Self::bad_request(validate::INVALID_ID)
    }

    pub fn validation(issues: Vec<Issue>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            error: "Validation failed".to_string(),
            details: Some(issues),
        }
    }

    pub fn not_found(what: &str) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            error: format!("{what} not found"),
            details: None,
        }
    }

    /// Unexpected failure: log the cause for operators, never leak it.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(%cause, "request failed");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Internal server error".to_string(),
            details: None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": false, "error": self.error });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

// ── Body extraction ────────────────────────────────────────────

/// `Json<T>` with the rejection folded into the envelope, so malformed
/// bodies come back as a 400 in the same shape as every other error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

// ── Shared handler helpers ─────────────────────────────────────

pub(crate) fn parse_path_id(raw: &str) -> Result<Uuid, ApiError> {
    validate::parse_id(raw).ok_or_else(ApiError::invalid_id)
}

/// Resolve the `/tasks/{id}` segment of a child route: identifier check,
/// then parent existence.
pub(crate) fn parent_task(store: &Store, raw_id: &str) -> Result<Task, ApiError> {
    let task_id = parse_path_id(raw_id)?;
    store
        .get_task(task_id)?
        .ok_or_else(|| ApiError::not_found("Task"))
}
