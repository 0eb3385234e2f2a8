//! Output formatting for chat replies and CLI listings.

use crate::types::{Task, User};
use serde::Serialize;
use std::collections::HashMap;

/// Output format for CLI listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Format a single task as one line: `#3 Comprar leche [En Progreso] → Ana`.
///
/// `assignee_name` is the display name of the assignee, when known.
pub fn format_task_line(task: &Task, assignee_name: Option<&str>) -> String {
    let mut line = format!(
        "#{} {} [{}]",
        task.id,
        task.description,
        task.status.spanish()
    );
    match (task.assignee, assignee_name) {
        (Some(_), Some(name)) => line.push_str(&format!(" → {}", name)),
        (Some(id), None) => line.push_str(&format!(" → usuario {}", id)),
        (None, _) => {}
    }
    line
}

/// Format a task listing for a chat reply.
pub fn format_task_listing(tasks: &[Task], names: &HashMap<i64, String>) -> String {
    if tasks.is_empty() {
        return "No hay tareas.".to_string();
    }

    let mut out = format!("Tareas ({}):", tasks.len());
    for task in tasks {
        let name = task
            .assignee
            .and_then(|id| names.get(&id))
            .map(String::as_str);
        out.push('\n');
        out.push_str(&format_task_line(task, name));
    }
    out
}

/// Format a user as one line: `#1 Test User <test@example.com> (@testuser, chat 789012)`.
pub fn format_user_line(user: &User) -> String {
    let name = user.full_name();
    let mut line = format!("#{} ", user.id);
    if !name.is_empty() {
        line.push_str(&name);
        line.push(' ');
    }
    line.push_str(&format!("<{}>", user.email));

    let mut extra = Vec::new();
    if let Some(ref handle) = user.user_name {
        extra.push(format!("@{}", handle));
    }
    extra.push(format!("id {}", user.user_id));
    extra.push(format!("chat {}", user.chat_id));
    line.push_str(&format!(" ({})", extra.join(", ")));
    line
}

/// Render any serializable value as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
