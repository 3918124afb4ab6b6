//! Payload and identifier validation.
//!
//! Request DTOs arrive stringly-typed (models.rs); this module checks them
//! and either returns a typed draft/patch or a list of field-level issues
//! for the 400 response. Identifier checks run before any store access.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    AttachmentRequest, CreateTaskRequest, LabelRequest, ListRequest, Priority, ReminderRequest,
    SubtaskRequest, UpdateTaskRequest,
};

/// Fixed message for any malformed identifier, path or body.
pub const INVALID_ID: &str = "Invalid identifier format";

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub field: String,
    pub message: String,
}

impl Issue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Issue { field: field.to_string(), message: message.into() }
    }
}

/// Parse an identifier in the canonical hyphenated UUID form.
/// `Uuid::try_parse` also accepts simple/braced/urn forms, which are not
/// part of the API contract.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::try_parse(raw).ok()
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Trimmed, non-empty, bounded-length name. Pushes an issue and returns
/// None on failure.
fn checked_name(raw: &str, field: &str, issues: &mut Vec<Issue>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        issues.push(Issue::new(field, "must not be empty"));
        return None;
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        issues.push(Issue::new(field, format!("must be at most {MAX_NAME_LEN} characters")));
        return None;
    }
    Some(trimmed.to_string())
}

fn checked_priority(raw: &str, issues: &mut Vec<Issue>) -> Option<Priority> {
    match Priority::parse(raw) {
        Some(p) => Some(p),
        None => {
            issues.push(Issue::new(
                "priority",
                format!("must be one of: {}", Priority::ALLOWED.join(", ")),
            ));
            None
        }
    }
}

fn checked_datetime(raw: &str, field: &str, issues: &mut Vec<Issue>) -> Option<DateTime<Utc>> {
    match parse_datetime(raw) {
        Some(dt) => Some(dt),
        None => {
            issues.push(Issue::new(field, "must be an RFC 3339 timestamp"));
            None
        }
    }
}

fn checked_id(raw: &str, field: &str, issues: &mut Vec<Issue>) -> Option<Uuid> {
    match parse_id(raw) {
        Some(id) => Some(id),
        None => {
            issues.push(Issue::new(field, INVALID_ID));
            None
        }
    }
}

fn checked_label_ids(raw: &[String], issues: &mut Vec<Issue>) -> Option<Vec<Uuid>> {
    let before = issues.len();
    let ids = raw
        .iter()
        .enumerate()
        .filter_map(|(i, s)| checked_id(s, &format!("label_ids[{i}]"), issues))
        .collect();
    (issues.len() == before).then_some(ids)
}

// ── Tasks ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    /// None means "use the default list".
    pub list_id: Option<Uuid>,
    pub label_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub list_id: Option<Uuid>,
    pub label_ids: Option<Vec<Uuid>>,
}

pub fn create_task(req: &CreateTaskRequest) -> Result<TaskDraft, Vec<Issue>> {
    let mut issues = Vec::new();

    let name = match req.name.as_deref() {
        Some(raw) => checked_name(raw, "name", &mut issues),
        None => {
            issues.push(Issue::new("name", "is required"));
            None
        }
    };
    let due_date = req
        .due_date
        .as_deref()
        .and_then(|raw| checked_datetime(raw, "due_date", &mut issues));
    let priority = req
        .priority
        .as_deref()
        .and_then(|raw| checked_priority(raw, &mut issues));
    let list_id = req
        .list_id
        .as_deref()
        .and_then(|raw| checked_id(raw, "list_id", &mut issues));
    let label_ids = match req.label_ids.as_deref() {
        Some(raw) => checked_label_ids(raw, &mut issues),
        None => Some(Vec::new()),
    };

    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(TaskDraft {
        // Unwraps cannot fire: issues is empty, so every check passed.
        name: name.unwrap_or_default(),
        description: req.description.clone(),
        completed: req.completed.unwrap_or(false),
        due_date,
        priority: priority.unwrap_or_default(),
        list_id,
        label_ids: label_ids.unwrap_or_default(),
    })
}

pub fn update_task(req: &UpdateTaskRequest) -> Result<TaskPatch, Vec<Issue>> {
    let mut issues = Vec::new();

    let name = req
        .name
        .as_deref()
        .and_then(|raw| checked_name(raw, "name", &mut issues));
    let due_date = req
        .due_date
        .as_deref()
        .and_then(|raw| checked_datetime(raw, "due_date", &mut issues));
    let priority = req
        .priority
        .as_deref()
        .and_then(|raw| checked_priority(raw, &mut issues));
    let list_id = req
        .list_id
        .as_deref()
        .and_then(|raw| checked_id(raw, "list_id", &mut issues));
    let label_ids = req
        .label_ids
        .as_deref()
        .and_then(|raw| checked_label_ids(raw, &mut issues));

    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(TaskPatch {
        name,
        description: req.description.clone(),
        completed: req.completed,
        due_date,
        priority,
        list_id,
        label_ids,
    })
}

// ── Lists and labels ──────────────────────────────────────────

pub fn create_list(req: &ListRequest) -> Result<String, Vec<Issue>> {
    required_name(req.name.as_deref())
}

pub fn update_list(req: &ListRequest) -> Result<String, Vec<Issue>> {
    required_name(req.name.as_deref())
}

pub fn create_label(req: &LabelRequest) -> Result<String, Vec<Issue>> {
    required_name(req.name.as_deref())
}

pub fn update_label(req: &LabelRequest) -> Result<String, Vec<Issue>> {
    required_name(req.name.as_deref())
}

fn required_name(raw: Option<&str>) -> Result<String, Vec<Issue>> {
    let mut issues = Vec::new();
    let name = match raw {
        Some(raw) => checked_name(raw, "name", &mut issues),
        None => {
            issues.push(Issue::new("name", "is required"));
            None
        }
    };
    match name {
        Some(name) if issues.is_empty() => Ok(name),
        _ => Err(issues),
    }
}

// ── Subtasks ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SubtaskDraft {
    pub name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SubtaskPatch {
    pub name: Option<String>,
    pub completed: Option<bool>,
}

pub fn create_subtask(req: &SubtaskRequest) -> Result<SubtaskDraft, Vec<Issue>> {
    let name = required_name(req.name.as_deref())?;
    Ok(SubtaskDraft { name, completed: req.completed.unwrap_or(false) })
}

pub fn update_subtask(req: &SubtaskRequest) -> Result<SubtaskPatch, Vec<Issue>> {
    let mut issues = Vec::new();
    let name = req
        .name
        .as_deref()
        .and_then(|raw| checked_name(raw, "name", &mut issues));
    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(SubtaskPatch { name, completed: req.completed })
}

// ── Reminders ─────────────────────────────────────────────────

pub fn create_reminder(req: &ReminderRequest) -> Result<DateTime<Utc>, Vec<Issue>> {
    let mut issues = Vec::new();
    let remind_at = match req.remind_at.as_deref() {
        Some(raw) => checked_datetime(raw, "remind_at", &mut issues),
        None => {
            issues.push(Issue::new("remind_at", "is required"));
            None
        }
    };
    match remind_at {
        Some(dt) if issues.is_empty() => Ok(dt),
        _ => Err(issues),
    }
}

pub fn update_reminder(req: &ReminderRequest) -> Result<Option<DateTime<Utc>>, Vec<Issue>> {
    let mut issues = Vec::new();
    let remind_at = req
        .remind_at
        .as_deref()
        .and_then(|raw| checked_datetime(raw, "remind_at", &mut issues));
    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(remind_at)
}

// ── Attachments ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AttachmentDraft {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentPatch {
    pub file_name: Option<String>,
    pub url: Option<String>,
}

pub fn create_attachment(req: &AttachmentRequest) -> Result<AttachmentDraft, Vec<Issue>> {
    let mut issues = Vec::new();
    let file_name = match req.file_name.as_deref() {
        Some(raw) => checked_name(raw, "file_name", &mut issues),
        None => {
            issues.push(Issue::new("file_name", "is required"));
            None
        }
    };
    let url = match req.url.as_deref().map(str::trim) {
        Some("") | None => {
            issues.push(Issue::new("url", "is required"));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    match (file_name, url) {
        (Some(file_name), Some(url)) if issues.is_empty() => {
            Ok(AttachmentDraft { file_name, url })
        }
        _ => Err(issues),
    }
}

pub fn update_attachment(req: &AttachmentRequest) -> Result<AttachmentPatch, Vec<Issue>> {
    let mut issues = Vec::new();
    let file_name = req
        .file_name
        .as_deref()
        .and_then(|raw| checked_name(raw, "file_name", &mut issues));
    let url = match req.url.as_deref().map(str::trim) {
        Some("") => {
            issues.push(Issue::new("url", "must not be empty"));
            None
        }
        Some(raw) => Some(raw.to_string()),
        None => None,
    };
    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(AttachmentPatch { file_name, url })
}
