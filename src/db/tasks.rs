//! Task CRUD.
//!
//! The free functions take a `&Connection` so the executor can compose them
//! inside a single transaction; the `Database` methods wrap each in its own.

use super::{Database, now_ms};
use crate::types::{Task, TaskStatus};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};

const TASK_COLUMNS: &str = "id, description, assignee, status, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = status.parse::<TaskStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;

    Ok(Task {
        id: row.get("id")?,
        description: row.get("description")?,
        assignee: row.get("assignee")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert a new task in the initial status.
pub fn insert_task(conn: &Connection, description: &str) -> Result<Task> {
    let description = description.trim();
    if description.is_empty() {
        return Err(anyhow!("Task description must not be empty"));
    }
    let now = now_ms();
    let status = TaskStatus::default();

    conn.execute(
        "INSERT INTO tasks (description, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![description, status.as_str(), now, now],
    )?;

    Ok(Task {
        id: conn.last_insert_rowid(),
        description: description.to_string(),
        assignee: None,
        status,
        created_at: now,
        updated_at: now,
    })
}

pub fn find_task(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// List tasks in creation order, optionally narrowed by status and assignee.
pub fn select_tasks(
    conn: &Connection,
    status: Option<TaskStatus>,
    assignee: Option<i64>,
) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks
         WHERE (?1 IS NULL OR status = ?1)
           AND (?2 IS NULL OR assignee = ?2)
         ORDER BY created_at, id",
        TASK_COLUMNS
    ))?;

    let tasks = stmt
        .query_map(params![status.map(|s| s.as_str()), assignee], parse_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Set a task's status. Returns the updated task, or `None` if it does not exist.
pub fn set_task_status(conn: &Connection, task_id: i64, status: TaskStatus) -> Result<Option<Task>> {
    // updated_at never moves backwards, even if the clock does
    let changed = conn.execute(
        "UPDATE tasks SET status = ?1, updated_at = MAX(?2, updated_at) WHERE id = ?3",
        params![status.as_str(), now_ms(), task_id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    find_task(conn, task_id)
}

/// Set or clear a task's assignee. Returns `None` if the task does not exist.
pub fn set_task_assignee(
    conn: &Connection,
    task_id: i64,
    assignee: Option<i64>,
) -> Result<Option<Task>> {
    let changed = conn.execute(
        "UPDATE tasks SET assignee = ?1, updated_at = MAX(?2, updated_at) WHERE id = ?3",
        params![assignee, now_ms(), task_id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    find_task(conn, task_id)
}

/// Delete a task. Returns whether a row was removed.
pub fn remove_task(conn: &Connection, task_id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
    Ok(changed > 0)
}

impl Database {
    /// Create a new task with status TODO.
    pub fn create_task(&self, description: &str) -> Result<Task> {
        self.transaction(|tx| insert_task(tx, description))
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| find_task(conn, task_id))
    }

    /// List tasks in creation order.
    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        self.with_conn(|conn| select_tasks(conn, status, None))
    }

    /// List the tasks assigned to a user.
    pub fn list_tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| select_tasks(conn, None, Some(user_id)))
    }

    /// Update a task's status.
    pub fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<Option<Task>> {
        self.transaction(|tx| set_task_status(tx, task_id, status))
    }

    /// Assign a task to a user, or unassign it with `None`.
    pub fn assign_task(&self, task_id: i64, user_id: Option<i64>) -> Result<Option<Task>> {
        self.transaction(|tx| set_task_assignee(tx, task_id, user_id))
    }

    /// Delete a task.
    pub fn delete_task(&self, task_id: i64) -> Result<bool> {
        self.transaction(|tx| remove_task(tx, task_id))
    }
}
