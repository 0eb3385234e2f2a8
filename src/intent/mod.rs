//! Intent resolution: natural-language utterances to typed commands.

mod normalize;
mod rules;

pub use normalize::{Folded, fold_char};
pub use rules::RuleResolver;

use crate::db::schema::SchemaContext;
use crate::types::{TaskFilter, TaskStatus};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    CreateTask {
        description: String,
    },
    ListTasks {
        #[serde(default)]
        filter: TaskFilter,
    },
    UpdateStatus {
        task_id: i64,
        new_status: TaskStatus,
    },
    AssignTask {
        task_id: i64,
        assignee_name: String,
    },
    DeleteTask {
        task_id: i64,
    },
    Unrecognized {
        raw_text: String,
    },
}

impl Intent {
    pub fn unrecognized(raw_text: impl Into<String>) -> Self {
        Intent::Unrecognized {
            raw_text: raw_text.into(),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::CreateTask { .. } => "create_task",
            Intent::ListTasks { .. } => "list_tasks",
            Intent::UpdateStatus { .. } => "update_status",
            Intent::AssignTask { .. } => "assign_task",
            Intent::DeleteTask { .. } => "delete_task",
            Intent::Unrecognized { .. } => "unrecognized",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::CreateTask { description } => write!(f, "create task {:?}", description),
            Intent::ListTasks { filter } => {
                write!(f, "list tasks")?;
                if let Some(status) = filter.status {
                    write!(f, " status={}", status)?;
                }
                if let Some(ref name) = filter.assignee_name {
                    write!(f, " assignee={:?}", name)?;
                }
                Ok(())
            }
            Intent::UpdateStatus {
                task_id,
                new_status,
            } => write!(f, "set task {} to {}", task_id, new_status),
            Intent::AssignTask {
                task_id,
                assignee_name,
            } => write!(f, "assign task {} to {:?}", task_id, assignee_name),
            Intent::DeleteTask { task_id } => write!(f, "delete task {}", task_id),
            Intent::Unrecognized { raw_text } => write!(f, "unrecognized {:?}", raw_text),
        }
    }
}

/// The translation boundary: turns an utterance into an [`Intent`].
///
/// Implementations backed by an external language model get the current
/// schema as context. `Err` means the translator itself failed; text that
/// cannot be understood resolves to [`Intent::Unrecognized`].
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, utterance: &str, schema: &SchemaContext) -> Result<Intent>;
}
