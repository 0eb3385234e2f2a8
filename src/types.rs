//! Core types for the task manager.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task status. Stored as the SCREAMING_SNAKE_CASE name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    Blocked,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::Blocked,
        TaskStatus::InProgress,
        TaskStatus::Done,
    ];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Spanish display name used in chat replies.
    pub fn spanish(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Pendiente",
            TaskStatus::Blocked => "Bloqueada",
            TaskStatus::InProgress => "En Progreso",
            TaskStatus::Done => "Completada",
        }
    }

    /// Parse a Spanish status phrase ("en progreso", "Completada", "terminado", ...).
    ///
    /// Case and accents are ignored; surrounding whitespace is trimmed.
    pub fn from_spanish(phrase: &str) -> Option<Self> {
        let folded: String = phrase.trim().chars().map(crate::intent::fold_char).collect();
        let folded = folded.split_whitespace().collect::<Vec<_>>().join(" ");
        SPANISH_STATUS_PHRASES
            .iter()
            .find(|(p, _)| *p == folded)
            .map(|(_, status)| *status)
    }
}

/// Spanish phrases (folded: lowercase, no accents) and the status they name.
///
/// Longer phrases come first so callers scanning text match "en progreso"
/// before "progreso".
pub(crate) const SPANISH_STATUS_PHRASES: &[(&str, TaskStatus)] = &[
    ("en progreso", TaskStatus::InProgress),
    ("en curso", TaskStatus::InProgress),
    ("en proceso", TaskStatus::InProgress),
    ("progreso", TaskStatus::InProgress),
    ("por hacer", TaskStatus::Todo),
    ("pendientes", TaskStatus::Todo),
    ("pendiente", TaskStatus::Todo),
    ("bloqueadas", TaskStatus::Blocked),
    ("bloqueada", TaskStatus::Blocked),
    ("bloqueado", TaskStatus::Blocked),
    ("completadas", TaskStatus::Done),
    ("completada", TaskStatus::Done),
    ("completado", TaskStatus::Done),
    ("terminadas", TaskStatus::Done),
    ("terminada", TaskStatus::Done),
    ("terminado", TaskStatus::Done),
    ("finalizada", TaskStatus::Done),
    ("finalizado", TaskStatus::Done),
    ("hechas", TaskStatus::Done),
    ("hecha", TaskStatus::Done),
    ("hecho", TaskStatus::Done),
];

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            _ => TaskStatus::from_spanish(s).ok_or_else(|| format!("Unknown task status: {}", s)),
        }
    }
}

/// A task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub description: String,
    /// Id of the assigned user, if any.
    pub assignee: Option<i64>,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A user registered from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// User id on the chat platform.
    pub user_id: String,
    /// Conversation used to address replies.
    pub chat_id: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// "First Last", skipping missing parts.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name used in confirmations: first name, falling back to user name, then email.
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.user_name.as_deref())
            .unwrap_or(&self.email)
    }
}

/// Input for registering a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub user_id: String,
    pub chat_id: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Filter for listing tasks. Empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Full name of the assignee, matched like assignment names.
    pub assignee_name: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee_name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_names_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_spanish(status.spanish()), Some(status));
        }
    }

    #[test]
    fn from_spanish_ignores_case_and_accents() {
        assert_eq!(TaskStatus::from_spanish("  EN   PROGRESO "), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_spanish("Terminado"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::from_spanish("pendiente"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::from_spanish("volando"), None);
    }

    #[test]
    fn from_str_accepts_storage_and_spanish_forms() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("IN PROGRESS".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("Bloqueada".parse::<TaskStatus>(), Ok(TaskStatus::Blocked));
        assert!("later".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn display_name_prefers_first_name() {
        let mut user = User {
            id: 1,
            email: "test@example.com".into(),
            user_id: "123456".into(),
            chat_id: "789012".into(),
            user_name: Some("testuser".into()),
            first_name: Some("Test".into()),
            last_name: Some("User".into()),
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(user.display_name(), "Test");
        assert_eq!(user.full_name(), "Test User");

        user.first_name = None;
        assert_eq!(user.display_name(), "testuser");
        assert_eq!(user.full_name(), "User");
    }
}
