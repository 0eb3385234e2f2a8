//! Command execution: one resolved intent, one transaction.

use crate::db::Database;
use crate::db::tasks::{
    find_task, insert_task, remove_task, select_tasks, set_task_assignee, set_task_status,
};
use crate::db::users::{select_users, select_users_by_full_name};
use crate::error::{CommandError, CommandResult};
use crate::format::format_task_listing;
use crate::intent::Intent;
use crate::types::{Task, TaskFilter, TaskStatus, User};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// What a command touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Affected {
    Task(Task),
    Tasks(Vec<Task>),
    /// Id of the deleted task.
    Deleted(i64),
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Human-readable confirmation or listing.
    pub message: String,
    pub affected: Affected,
}

/// Runs intents against storage.
#[derive(Clone)]
pub struct Executor {
    db: Database,
}

impl Executor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Execute one intent. Lookups and the mutation share one transaction;
    /// any error rolls the whole command back.
    pub fn execute(&self, intent: &Intent) -> CommandResult<Outcome> {
        let outcome = match intent {
            Intent::CreateTask { description } => self.db.transaction(|tx| create(tx, description)),
            Intent::ListTasks { filter } => self.db.transaction(|tx| list(tx, filter)),
            Intent::UpdateStatus {
                task_id,
                new_status,
            } => self.db.transaction(|tx| update_status(tx, *task_id, *new_status)),
            Intent::AssignTask {
                task_id,
                assignee_name,
            } => self.db.transaction(|tx| assign(tx, *task_id, assignee_name)),
            Intent::DeleteTask { task_id } => self.db.transaction(|tx| delete(tx, *task_id)),
            Intent::Unrecognized { raw_text } => Err(CommandError::unrecognized(raw_text.as_str())),
        }?;

        info!(intent = intent.kind(), message = %outcome.message, "Command executed");
        Ok(outcome)
    }
}

fn create(conn: &Connection, description: &str) -> CommandResult<Outcome> {
    if description.trim().is_empty() {
        return Err(CommandError::invalid_value("description", "must not be empty"));
    }
    let task = insert_task(conn, description)?;
    Ok(Outcome {
        message: format!("Tarea creada con id {}: {}", task.id, task.description),
        affected: Affected::Task(task),
    })
}

fn list(conn: &Connection, filter: &TaskFilter) -> CommandResult<Outcome> {
    let assignee = match filter.assignee_name {
        Some(ref name) => Some(unique_user(conn, name)?.id),
        None => None,
    };
    let tasks = select_tasks(conn, filter.status, assignee)?;

    let names: HashMap<i64, String> = select_users(conn)?
        .into_iter()
        .map(|u| (u.id, u.display_name().to_string()))
        .collect();

    Ok(Outcome {
        message: format_task_listing(&tasks, &names),
        affected: Affected::Tasks(tasks),
    })
}

fn update_status(conn: &Connection, task_id: i64, status: TaskStatus) -> CommandResult<Outcome> {
    let task = set_task_status(conn, task_id, status)?
        .ok_or(CommandError::TaskNotFound { task_id })?;
    Ok(Outcome {
        message: format!("Tarea {} actualizada a {}", task.id, task.status.spanish()),
        affected: Affected::Task(task),
    })
}

fn assign(conn: &Connection, task_id: i64, assignee_name: &str) -> CommandResult<Outcome> {
    if find_task(conn, task_id)?.is_none() {
        return Err(CommandError::TaskNotFound { task_id });
    }
    let user = unique_user(conn, assignee_name)?;
    let task = set_task_assignee(conn, task_id, Some(user.id))?
        .ok_or(CommandError::TaskNotFound { task_id })?;

    Ok(Outcome {
        message: format!("Tarea {} asignada a {}", task.id, user.display_name()),
        affected: Affected::Task(task),
    })
}

fn delete(conn: &Connection, task_id: i64) -> CommandResult<Outcome> {
    if !remove_task(conn, task_id)? {
        return Err(CommandError::TaskNotFound { task_id });
    }
    Ok(Outcome {
        message: format!("Tarea {} eliminada", task_id),
        affected: Affected::Deleted(task_id),
    })
}

/// Exactly one user with this full name.
fn unique_user(conn: &Connection, name: &str) -> CommandResult<User> {
    let mut matches = select_users_by_full_name(conn, name)?;
    if matches.len() != 1 {
        return Err(CommandError::AmbiguousOrNotFound {
            name: name.to_string(),
            matches: matches.len(),
        });
    }
    Ok(matches.remove(0))
}
