//! Task list filtering and pagination.
//!
//! Query parameters come in as raw strings and are folded into a typed
//! `TaskFilter` + `Page` pair. Invalid ids, dates, and priorities are
//! dropped rather than rejected; page/limit fall back to defaults and are
//! clamped. The filter itself is plain predicate composition (logical AND).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Priority, Task};
use crate::validate;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 100;

/// Raw query string for `GET /api/tasks`. Everything optional, everything
/// a string: parse failures must degrade, not 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub list_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub completed: Option<String>,
    pub priority: Option<String>,
    pub overdue: Option<String>,
    pub search: Option<String>,
    pub label_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub list_id: Option<Uuid>,
    pub label_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub overdue: bool,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Page { page: 1, limit: DEFAULT_LIMIT }
    }
}

impl Page {
    pub fn offset(&self) -> usize {
        // page is user-supplied and unbounded; a saturated offset just
        // lands past the end and yields an empty page.
        self.page.saturating_sub(1).saturating_mul(self.limit) as usize
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Fold the raw query into a filter and a page selection.
pub fn build(query: &TaskQuery) -> (TaskFilter, Page) {
    let filter = TaskFilter {
        // Invalid ids are dropped, not errored: a stale filter in the UI
        // should degrade to "no filter", never break the whole view.
        list_id: query.list_id.as_deref().and_then(validate::parse_id),
        label_id: query.label_id.as_deref().and_then(validate::parse_id),
        date_from: query.date_from.as_deref().and_then(parse_datetime),
        date_to: query.date_to.as_deref().and_then(parse_datetime),
        completed: query.completed.as_deref().map(|v| v == "true"),
        priority: query.priority.as_deref().and_then(Priority::parse),
        overdue: query.overdue.as_deref() == Some("true"),
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase),
    };

    let page = query
        .page
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1)
        .max(1);
    let limit = query
        .limit
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT);

    (filter, Page { page, limit })
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl TaskFilter {
    /// All active predicates must hold (logical AND).
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(list_id) = self.list_id {
            if task.list_id != list_id {
                return false;
            }
        }
        if let Some(label_id) = self.label_id {
            if !task.label_ids.contains(&label_id) {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        // Date range applies to the due date; a task without one cannot
        // fall inside any range.
        if self.date_from.is_some() || self.date_to.is_some() {
            let due = match task.due_date {
                Some(due) => due,
                None => return false,
            };
            if let Some(from) = self.date_from {
                if due < from {
                    return false;
                }
            }
            if let Some(to) = self.date_to {
                if due > to {
                    return false;
                }
            }
        }
        if self.overdue {
            match task.due_date {
                Some(due) if due < now && !task.completed => {}
                _ => return false,
            }
        }
        if let Some(needle) = &self.search {
            let in_name = task.name.to_lowercase().contains(needle);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle));
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}
