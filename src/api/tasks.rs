use super::{created, ok, ok_message, parse_path_id, ApiError, ApiResult, JsonBody, SharedState};
use crate::filter::{self, TaskQuery};
use crate::models::{
    CreateTaskRequest, Pagination, Task, TaskPage, TaskResponse, UpdateTaskRequest,
};
use crate::store::{Store, StoreError};
use crate::validate;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use uuid::Uuid;

/// Attach labels and children to a task for the client.
fn hydrate(store: &Store, task: Task) -> Result<TaskResponse, StoreError> {
    let mut labels = Vec::with_capacity(task.label_ids.len());
    for label_id in &task.label_ids {
        // A label deleted out from under the task is simply omitted.
        if let Some(label) = store.get_label(*label_id)? {
            labels.push(label);
        }
    }

    Ok(TaskResponse {
        labels,
        subtasks: store.subtasks_for_task(task.id)?,
        reminders: store.reminders_for_task(task.id)?,
        attachments: store.attachments_for_task(task.id)?,
        id: task.id,
        name: task.name,
        description: task.description,
        completed: task.completed,
        due_date: task.due_date,
        priority: task.priority,
        list_id: task.list_id,
        created_at: task.created_at,
        updated_at: task.updated_at,
    })
}

/// Resolve the list a task should land in: explicit id must exist,
/// no id means the default list.
fn resolve_list(store: &Store, list_id: Option<Uuid>) -> Result<Uuid, ApiError> {
    match list_id {
        Some(id) => match store.get_list(id)? {
            Some(list) => Ok(list.id),
            None => Err(ApiError::not_found("List")),
        },
        None => store
            .default_list()?
            .map(|l| l.id)
            .ok_or_else(|| ApiError::internal("default list missing")),
    }
}

// GET /api/tasks
pub async fn list_tasks(
    State(state): State<SharedState>,
    Query(query): Query<TaskQuery>,
) -> ApiResult {
    let (filter, page) = filter::build(&query);
    let (tasks, total) = state.store.query_tasks(&filter, &page)?;

    let mut hydrated = Vec::with_capacity(tasks.len());
    for task in tasks {
        hydrated.push(hydrate(&state.store, task)?);
    }

    Ok(ok(TaskPage {
        tasks: hydrated,
        pagination: Pagination {
            total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(total),
        },
    }))
}

// POST /api/tasks
pub async fn create_task(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<CreateTaskRequest>,
) -> ApiResult {
    let draft = validate::create_task(&payload).map_err(ApiError::validation)?;
    let list_id = resolve_list(&state.store, draft.list_id)?;

    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        name: draft.name,
        description: draft.description,
        completed: draft.completed,
        due_date: draft.due_date,
        priority: draft.priority,
        list_id,
        label_ids: draft.label_ids,
        created_at: now,
        updated_at: now,
    };
    state.store.create_task(&task)?;

    Ok(created(hydrate(&state.store, task)?))
}

// GET /api/tasks/{id}
pub async fn get_task(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let task_id = parse_path_id(&id)?;
    let task = state
        .store
        .get_task(task_id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    Ok(ok(hydrate(&state.store, task)?))
}

// PUT /api/tasks/{id}
pub async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateTaskRequest>,
) -> ApiResult {
    let task_id = parse_path_id(&id)?;
    let patch = validate::update_task(&payload).map_err(ApiError::validation)?;

    let mut task = state
        .store
        .get_task(task_id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    // Apply updates
    if let Some(name) = patch.name {
        task.name = name;
    }
    if let Some(description) = patch.description {
        task.description = Some(description);
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(list_id) = patch.list_id {
        task.list_id = resolve_list(&state.store, Some(list_id))?;
    }
    if let Some(label_ids) = patch.label_ids {
        task.label_ids = label_ids;
    }
    task.updated_at = Utc::now();

    state.store.update_task(&task)?;

    Ok(ok(hydrate(&state.store, task)?))
}

// DELETE /api/tasks/{id}
pub async fn delete_task(State(state): State<SharedState>, Path(id): Path<String>) -> ApiResult {
    let task_id = parse_path_id(&id)?;
    if !state.store.delete_task(task_id)? {
        return Err(ApiError::not_found("Task"));
    }
    Ok(ok_message("Task deleted"))
}
