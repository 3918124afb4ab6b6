use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Entity types ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    None,
}

impl Priority {
    /// The exact strings accepted on the wire, in query params and bodies.
    pub const ALLOWED: [&'static str; 4] = ["high", "medium", "low", "none"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            "none" => Some(Priority::None),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::None
    }
}

// No serde skip attributes here: this struct is postcard-encoded into the
// store, and postcard is positional — every field must always be present.
// TaskResponse is the JSON-facing shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub list_id: Uuid,
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub name: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub task_id: Uuid,
    pub remind_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

// ── Request types ─────────────────────────────────────────────
//
// Stringly-typed where the wire value needs a structured validation
// error rather than a serde rejection: priorities, ids, and timestamps
// arrive as strings and are checked in validate.rs.

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub list_id: Option<String>,
    pub label_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub list_id: Option<String>,
    pub label_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubtaskRequest {
    pub name: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    pub remind_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    pub file_name: Option<String>,
    pub url: Option<String>,
}

// ── Response types ────────────────────────────────────────────

/// A task with its children hydrated for the client.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub list_id: Uuid,
    pub labels: Vec<Label>,
    pub subtasks: Vec<Subtask>,
    pub reminders: Vec<Reminder>,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<TaskResponse>,
    pub pagination: Pagination,
}
