//! Router-level tests: real store on a temp file, requests driven through
//! `tower::ServiceExt::oneshot`.

use super::{router, AppState};
use crate::store::Store;
use crate::validate::INVALID_ID;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn test_app(name: &str) -> (Router, String) {
    let path = format!("/tmp/taskbox_api_{name}_{}.redb", std::process::id());
    let _ = fs::remove_file(&path);
    let store = Store::open(&path).unwrap();
    store.ensure_default_list().unwrap();
    (router(Arc::new(AppState { store })), path)
}

fn cleanup(path: &str) {
    let _ = fs::remove_file(path);
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_task(app: &Router, body: Value) -> Value {
    let (status, envelope) = send(app, "POST", "/api/tasks", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    envelope["data"].clone()
}

#[tokio::test]
async fn malformed_identifiers_get_a_fixed_400() {
    let (app, path) = test_app("bad_ids");

    for uri in [
        "/api/tasks/abc",
        "/api/lists/abc",
        "/api/labels/abc",
        "/api/tasks/abc/subtasks",
        "/api/tasks/abc/reminders",
        "/api/tasks/abc/attachments",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!(INVALID_ID));
    }

    // Simple (unhyphenated) UUID form is also rejected.
    let simple = Uuid::new_v4().simple().to_string();
    let (status, _) = send(&app, "GET", &format!("/api/tasks/{simple}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    cleanup(&path);
}

#[tokio::test]
async fn task_create_and_fetch_round_trip() {
    let (app, path) = test_app("round_trip");

    let task = create_task(
        &app,
        json!({
            "name": "Buy milk",
            "priority": "high",
            "due_date": "2026-09-01T09:00:00Z"
        }),
    )
    .await;
    assert_eq!(task["priority"], json!("high"));
    assert_eq!(task["completed"], json!(false));
    assert!(task["list_id"].is_string()); // landed in the default list

    let id = task["id"].as_str().unwrap();
    let (status, body) = send(&app, "GET", &format!("/api/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["name"], json!("Buy milk"));
    assert_eq!(body["data"]["subtasks"], json!([]));

    let unknown = Uuid::new_v4();
    let (status, body) = send(&app, "GET", &format!("/api/tasks/{unknown}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Task not found"));

    cleanup(&path);
}

#[tokio::test]
async fn invalid_priority_yields_field_level_details() {
    let (app, path) = test_app("bad_priority");

    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "name": "Oops", "priority": "urgent" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d["field"] == json!("priority")));

    cleanup(&path);
}

#[tokio::test]
async fn malformed_json_body_stays_in_the_envelope() {
    let (app, path) = test_app("bad_json");

    let request = Request::builder()
        .method("POST")
        .uri("/api/tasks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));

    cleanup(&path);
}

#[tokio::test]
async fn pagination_is_clamped_and_floored() {
    let (app, path) = test_app("clamp");

    let (status, body) = send(&app, "GET", "/api/tasks?limit=500&page=0", None).await;
    assert_eq!(status, StatusCode::OK);
    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["limit"], json!(100));
    assert_eq!(pagination["page"], json!(1));
    assert_eq!(pagination["total"], json!(0));

    cleanup(&path);
}

#[tokio::test]
async fn filters_compose_with_and() {
    let (app, path) = test_app("and_filter");

    create_task(&app, json!({ "name": "done high", "completed": true, "priority": "high" })).await;
    create_task(&app, json!({ "name": "open high", "priority": "high" })).await;
    create_task(&app, json!({ "name": "done low", "completed": true, "priority": "low" })).await;

    let (status, body) =
        send(&app, "GET", "/api/tasks?completed=true&priority=high", None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], json!("done high"));
    assert_eq!(body["data"]["pagination"]["total"], json!(1));

    // An invalid listId filter is dropped, not an error.
    let (status, body) = send(&app, "GET", "/api/tasks?listId=garbage", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], json!(3));

    cleanup(&path);
}

#[tokio::test]
async fn default_list_cannot_be_deleted() {
    let (app, path) = test_app("default_list");

    let (status, body) = send(&app, "GET", "/api/lists", None).await;
    assert_eq!(status, StatusCode::OK);
    let default = &body["data"][0];
    assert_eq!(default["is_default"], json!(true));
    let id = default["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/lists/{id}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cannot delete the default list"));

    // Still there.
    let (status, _) = send(&app, "GET", &format!("/api/lists/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    cleanup(&path);
}

#[tokio::test]
async fn deleting_a_list_moves_tasks_to_the_default() {
    let (app, path) = test_app("list_reassign");

    let (_, body) = send(&app, "POST", "/api/lists", Some(json!({ "name": "Errands" }))).await;
    let list_id = body["data"]["id"].as_str().unwrap().to_string();

    let task = create_task(&app, json!({ "name": "Post office", "list_id": list_id })).await;
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/api/lists/{list_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/api/tasks/{task_id}"), None).await;
    assert_ne!(body["data"]["list_id"].as_str().unwrap(), list_id);

    cleanup(&path);
}

#[tokio::test]
async fn create_task_in_missing_list_is_404() {
    let (app, path) = test_app("missing_list");

    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "name": "Lost", "list_id": Uuid::new_v4().to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("List not found"));

    cleanup(&path);
}

#[tokio::test]
async fn child_ownership_is_checked_on_every_access() {
    let (app, path) = test_app("ownership");

    let task_a = create_task(&app, json!({ "name": "A" })).await;
    let task_b = create_task(&app, json!({ "name": "B" })).await;
    let a = task_a["id"].as_str().unwrap();
    let b = task_b["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tasks/{a}/subtasks"),
        Some(json!({ "name": "A's child" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let subtask_id = body["data"]["id"].as_str().unwrap().to_string();

    // Reachable under the owning task.
    let (status, _) =
        send(&app, "GET", &format!("/api/tasks/{a}/subtasks/{subtask_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    // 404 under any other task, for read, update, and delete alike.
    let uri = format!("/api/tasks/{b}/subtasks/{subtask_id}");
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Subtask not found"));
    let (status, _) = send(&app, "PUT", &uri, Some(json!({ "completed": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The child is untouched.
    let (status, body) =
        send(&app, "GET", &format!("/api/tasks/{a}/subtasks/{subtask_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], json!(false));

    cleanup(&path);
}

#[tokio::test]
async fn child_routes_require_an_existing_parent() {
    let (app, path) = test_app("orphan_parent");

    let unknown = Uuid::new_v4();
    for resource in ["subtasks", "reminders", "attachments"] {
        let (status, body) =
            send(&app, "GET", &format!("/api/tasks/{unknown}/{resource}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{resource}");
        assert_eq!(body["error"], json!("Task not found"));
    }

    cleanup(&path);
}

#[tokio::test]
async fn reminder_and_attachment_lifecycle() {
    let (app, path) = test_app("children");

    let task = create_task(&app, json!({ "name": "Trip" })).await;
    let id = task["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tasks/{id}/reminders"),
        Some(json!({ "remind_at": "2026-09-01T08:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reminder_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{id}/reminders/{reminder_id}"),
        Some(json!({ "remind_at": "2026-09-02T08:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remind_at"], json!("2026-09-02T08:00:00Z"));

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tasks/{id}/attachments"),
        Some(json!({ "file_name": "tickets.pdf", "url": "/files/tickets.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let attachment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/tasks/{id}/attachments/{attachment_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Missing remind_at on create is a validation error, not a 500.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tasks/{id}/reminders"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_array().unwrap();
    assert_eq!(details[0]["field"], json!("remind_at"));

    cleanup(&path);
}

#[tokio::test]
async fn update_applies_only_present_fields() {
    let (app, path) = test_app("partial_update");

    let task = create_task(
        &app,
        json!({ "name": "Original", "description": "keep me", "priority": "low" }),
    )
    .await;
    let id = task["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{id}"),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], json!(true));
    assert_eq!(body["data"]["name"], json!("Original"));
    assert_eq!(body["data"]["description"], json!("keep me"));
    assert_eq!(body["data"]["priority"], json!("low"));

    cleanup(&path);
}

#[tokio::test]
async fn label_crud_and_task_membership_filter() {
    let (app, path) = test_app("labels");

    let (status, body) = send(&app, "POST", "/api/labels", Some(json!({ "name": "home" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let label_id = body["data"]["id"].as_str().unwrap().to_string();

    create_task(&app, json!({ "name": "Tagged", "label_ids": [label_id] })).await;
    create_task(&app, json!({ "name": "Untagged" })).await;

    let (status, body) =
        send(&app, "GET", &format!("/api/tasks?labelId={label_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], json!("Tagged"));
    assert_eq!(tasks[0]["labels"][0]["name"], json!("home"));

    // Deleting the label empties membership everywhere.
    let (status, _) = send(&app, "DELETE", &format!("/api/labels/{label_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/api/tasks?search=tagged", None).await;
    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert!(tasks.iter().all(|t| t["labels"].as_array().unwrap().is_empty()));

    cleanup(&path);
}
