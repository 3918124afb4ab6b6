//! redb-backed repository.
//!
//! One table per entity, keyed by UUID bytes, values postcard-encoded.
//! Every mutation is a single write transaction; cascade rules (task
//! children, label references, list reassignment) stay inside that
//! transaction so a crash can't leave dangling references.

use crate::filter::{Page, TaskFilter};
use crate::models::{Attachment, Label, List, Reminder, Subtask, Task};
use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use uuid::Uuid;

type RawTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

const LISTS: RawTable = TableDefinition::new("lists");
const TASKS: RawTable = TableDefinition::new("tasks");
const LABELS: RawTable = TableDefinition::new("labels");
const SUBTASKS: RawTable = TableDefinition::new("subtasks");
const REMINDERS: RawTable = TableDefinition::new("reminders");
const ATTACHMENTS: RawTable = TableDefinition::new("attachments");

const ALL_TABLES: [RawTable; 6] = [LISTS, TASKS, LABELS, SUBTASKS, REMINDERS, ATTACHMENTS];

/// Name of the seeded, non-deletable fallback list.
pub const DEFAULT_LIST_NAME: &str = "Inbox";

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at the given path.
    /// Creates tables if they don't exist.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        for table in ALL_TABLES {
            let _ = txn.open_table(table)?;
        }
        txn.commit()?;

        Ok(Store { db: Arc::new(db) })
    }

    // ── Generic plumbing ──────────────────────────────────────

    fn read_one<T: DeserializeOwned>(
        &self,
        table: RawTable,
        id: Uuid,
    ) -> Result<Option<T>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table)?;
        match table.get(id.as_bytes().as_slice())? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn read_all<T: DeserializeOwned>(&self, table: RawTable) -> Result<Vec<T>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn write_one<T: Serialize>(
        &self,
        table: RawTable,
        id: Uuid,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = encode(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.insert(id.as_bytes().as_slice(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove_one(&self, table: RawTable, id: Uuid) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let removed;
        {
            let mut table = txn.open_table(table)?;
            removed = table.remove(id.as_bytes().as_slice())?.is_some();
        }
        txn.commit()?;
        Ok(removed)
    }

    // ── Lists ─────────────────────────────────────────────────

    pub fn create_list(&self, list: &List) -> Result<(), StoreError> {
        self.write_one(LISTS, list.id, list)
    }

    pub fn get_list(&self, id: Uuid) -> Result<Option<List>, StoreError> {
        self.read_one(LISTS, id)
    }

    /// All lists, default first, then oldest first.
    pub fn list_lists(&self) -> Result<Vec<List>, StoreError> {
        let mut lists: Vec<List> = self.read_all(LISTS)?;
        lists.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(lists)
    }

    pub fn update_list(&self, list: &List) -> Result<(), StoreError> {
        self.write_one(LISTS, list.id, list)
    }

    /// Delete a list and move its tasks to `reassign_to` in one transaction.
    /// The caller is responsible for refusing to delete the default list.
    pub fn delete_list(&self, id: Uuid, reassign_to: Uuid) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let removed;
        {
            let mut lists = txn.open_table(LISTS)?;
            removed = lists.remove(id.as_bytes().as_slice())?.is_some();
        }
        if removed {
            let mut tasks = txn.open_table(TASKS)?;
            let mut moved = Vec::new();
            for entry in tasks.iter()? {
                let (_, value) = entry?;
                let mut task: Task = decode(value.value())?;
                if task.list_id == id {
                    task.list_id = reassign_to;
                    task.updated_at = Utc::now();
                    moved.push(task);
                }
            }
            for task in &moved {
                let bytes = encode(task)?;
                tasks.insert(task.id.as_bytes().as_slice(), bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(removed)
    }

    pub fn default_list(&self) -> Result<Option<List>, StoreError> {
        Ok(self.list_lists()?.into_iter().find(|l| l.is_default))
    }

    /// Seed the default list if none exists. Returns true when created.
    pub fn ensure_default_list(&self) -> Result<bool, StoreError> {
        if self.default_list()?.is_some() {
            return Ok(false);
        }
        let list = List {
            id: Uuid::new_v4(),
            name: DEFAULT_LIST_NAME.to_string(),
            is_default: true,
            created_at: Utc::now(),
        };
        self.create_list(&list)?;
        Ok(true)
    }

    // ── Tasks ─────────────────────────────────────────────────

    pub fn create_task(&self, task: &Task) -> Result<(), StoreError> {
        self.write_one(TASKS, task.id, task)
    }

    pub fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.read_one(TASKS, id)
    }

    pub fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        self.write_one(TASKS, task.id, task)
    }

    /// Delete a task and all of its children in one transaction.
    pub fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let removed;
        {
            let mut tasks = txn.open_table(TASKS)?;
            removed = tasks.remove(id.as_bytes().as_slice())?.is_some();
        }
        if removed {
            remove_children::<Subtask>(&txn, SUBTASKS, id, |s| s.task_id)?;
            remove_children::<Reminder>(&txn, REMINDERS, id, |r| r.task_id)?;
            remove_children::<Attachment>(&txn, ATTACHMENTS, id, |a| a.task_id)?;
        }
        txn.commit()?;
        Ok(removed)
    }

    /// The single filtered, paginated task query. Returns the requested
    /// page (newest first) plus the total match count.
    pub fn query_tasks(
        &self,
        filter: &TaskFilter,
        page: &Page,
    ) -> Result<(Vec<Task>, u64), StoreError> {
        let now = Utc::now();
        let mut matched: Vec<Task> = self
            .read_all::<Task>(TASKS)?
            .into_iter()
            .filter(|t| filter.matches(t, now))
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let tasks = matched
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();
        Ok((tasks, total))
    }

    // ── Labels ────────────────────────────────────────────────

    pub fn create_label(&self, label: &Label) -> Result<(), StoreError> {
        self.write_one(LABELS, label.id, label)
    }

    pub fn get_label(&self, id: Uuid) -> Result<Option<Label>, StoreError> {
        self.read_one(LABELS, id)
    }

    pub fn list_labels(&self) -> Result<Vec<Label>, StoreError> {
        let mut labels: Vec<Label> = self.read_all(LABELS)?;
        labels.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(labels)
    }

    pub fn update_label(&self, label: &Label) -> Result<(), StoreError> {
        self.write_one(LABELS, label.id, label)
    }

    /// Delete a label and strip it from every task in one transaction.
    pub fn delete_label(&self, id: Uuid) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let removed;
        {
            let mut labels = txn.open_table(LABELS)?;
            removed = labels.remove(id.as_bytes().as_slice())?.is_some();
        }
        if removed {
            let mut tasks = txn.open_table(TASKS)?;
            let mut touched = Vec::new();
            for entry in tasks.iter()? {
                let (_, value) = entry?;
                let mut task: Task = decode(value.value())?;
                if task.label_ids.contains(&id) {
                    task.label_ids.retain(|l| *l != id);
                    touched.push(task);
                }
            }
            for task in &touched {
                let bytes = encode(task)?;
                tasks.insert(task.id.as_bytes().as_slice(), bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(removed)
    }

    // ── Subtasks ──────────────────────────────────────────────

    pub fn create_subtask(&self, subtask: &Subtask) -> Result<(), StoreError> {
        self.write_one(SUBTASKS, subtask.id, subtask)
    }

    pub fn get_subtask(&self, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        self.read_one(SUBTASKS, id)
    }

    pub fn subtasks_for_task(&self, task_id: Uuid) -> Result<Vec<Subtask>, StoreError> {
        let mut subtasks: Vec<Subtask> = self.read_all(SUBTASKS)?;
        subtasks.retain(|s| s.task_id == task_id);
        subtasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(subtasks)
    }

    pub fn update_subtask(&self, subtask: &Subtask) -> Result<(), StoreError> {
        self.write_one(SUBTASKS, subtask.id, subtask)
    }

    pub fn delete_subtask(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove_one(SUBTASKS, id)
    }

    // ── Reminders ─────────────────────────────────────────────

    pub fn create_reminder(&self, reminder: &Reminder) -> Result<(), StoreError> {
        self.write_one(REMINDERS, reminder.id, reminder)
    }

    pub fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>, StoreError> {
        self.read_one(REMINDERS, id)
    }

    pub fn reminders_for_task(&self, task_id: Uuid) -> Result<Vec<Reminder>, StoreError> {
        let mut reminders: Vec<Reminder> = self.read_all(REMINDERS)?;
        reminders.retain(|r| r.task_id == task_id);
        reminders.sort_by(|a, b| a.remind_at.cmp(&b.remind_at));
        Ok(reminders)
    }

    pub fn update_reminder(&self, reminder: &Reminder) -> Result<(), StoreError> {
        self.write_one(REMINDERS, reminder.id, reminder)
    }

    pub fn delete_reminder(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove_one(REMINDERS, id)
    }

    // ── Attachments ───────────────────────────────────────────

    pub fn create_attachment(&self, attachment: &Attachment) -> Result<(), StoreError> {
        self.write_one(ATTACHMENTS, attachment.id, attachment)
    }

    pub fn get_attachment(&self, id: Uuid) -> Result<Option<Attachment>, StoreError> {
        self.read_one(ATTACHMENTS, id)
    }

    pub fn attachments_for_task(&self, task_id: Uuid) -> Result<Vec<Attachment>, StoreError> {
        let mut attachments: Vec<Attachment> = self.read_all(ATTACHMENTS)?;
        attachments.retain(|a| a.task_id == task_id);
        attachments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(attachments)
    }

    pub fn update_attachment(&self, attachment: &Attachment) -> Result<(), StoreError> {
        self.write_one(ATTACHMENTS, attachment.id, attachment)
    }

    pub fn delete_attachment(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove_one(ATTACHMENTS, id)
    }
}

/// Remove every row in `table` whose back-reference matches `task_id`.
/// Runs inside the caller's write transaction.
fn remove_children<T: DeserializeOwned>(
    txn: &redb::WriteTransaction,
    table: RawTable,
    task_id: Uuid,
    parent_of: fn(&T) -> Uuid,
) -> Result<(), StoreError> {
    let mut table = txn.open_table(table)?;
    let mut doomed = Vec::new();
    for entry in table.iter()? {
        let (key, value) = entry?;
        let child: T = decode(value.value())?;
        if parent_of(&child) == task_id {
            doomed.push(key.value().to_vec());
        }
    }
    for key in doomed {
        table.remove(key.as_slice())?;
    }
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StoreError {
    Redb(String),
    Decode(String),
    Encode(String),
}

// redb 2.x has many error types. Blanket them all into StoreError::Redb.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for StoreError {
            fn from(e: $t) -> Self { StoreError::Redb(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Redb(e) => write!(f, "redb: {e}"),
            StoreError::Decode(e) => write!(f, "decode: {e}"),
            StoreError::Encode(e) => write!(f, "encode: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ── Tests ──────────────────────────────────────────────────────
