//! Structured error types for command execution.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input could not be understood
    ResolutionFailure,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    UserNotFound,
    AmbiguousOrNotFound,

    // Internal errors
    StorageFailure,
    TranslatorFailure,
    InternalError,
}

/// Failure of a single command, from resolution through commit.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not understand request: {raw_text:?}")]
    Resolution { raw_text: String },

    #[error("task {task_id} not found")]
    TaskNotFound { task_id: i64 },

    #[error("user {user_id} not found")]
    UserNotFound { user_id: i64 },

    #[error("{}", ambiguous_message(.name, .matches))]
    AmbiguousOrNotFound { name: String, matches: usize },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("translator failure: {0}")]
    Translator(String),

    #[error("{0}")]
    Internal(String),
}

fn ambiguous_message(name: &str, matches: &usize) -> String {
    if *matches == 0 {
        format!("no user named '{}'", name)
    } else {
        format!("{} users match '{}'", matches, name)
    }
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandError::Resolution { .. } => ErrorCode::ResolutionFailure,
            CommandError::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            CommandError::UserNotFound { .. } => ErrorCode::UserNotFound,
            CommandError::AmbiguousOrNotFound { .. } => ErrorCode::AmbiguousOrNotFound,
            CommandError::InvalidInput { .. } => ErrorCode::InvalidFieldValue,
            CommandError::Storage(_) => ErrorCode::StorageFailure,
            CommandError::Translator(_) => ErrorCode::TranslatorFailure,
            CommandError::Internal(_) => ErrorCode::InternalError,
        }
    }

    // Convenience constructors

    pub fn unrecognized(raw_text: impl Into<String>) -> Self {
        CommandError::Resolution {
            raw_text: raw_text.into(),
        }
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        CommandError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the "referenced entity does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommandError::TaskNotFound { .. }
                | CommandError::UserNotFound { .. }
                | CommandError::AmbiguousOrNotFound { .. }
        )
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<CommandError>() {
            Ok(cmd_err) => return cmd_err,
            Err(err) => err,
        };
        match err.downcast::<rusqlite::Error>() {
            Ok(sql_err) => CommandError::Storage(sql_err),
            Err(err) => CommandError::Internal(format!("{:#}", err)),
        }
    }
}

/// Serializable view of an error, for JSON output.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&CommandError> for ErrorBody {
    fn from(err: &CommandError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Result type for command operations.
pub type CommandResult<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_round_trip_keeps_variant() {
        let err: anyhow::Error = CommandError::TaskNotFound { task_id: 7 }.into();
        let back = CommandError::from(err);
        assert!(matches!(back, CommandError::TaskNotFound { task_id: 7 }));
    }

    #[test]
    fn rusqlite_errors_become_storage_failures() {
        let err: anyhow::Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(CommandError::from(err).code(), ErrorCode::StorageFailure);
    }

    #[test]
    fn ambiguous_message_distinguishes_zero_and_many() {
        let none = CommandError::AmbiguousOrNotFound {
            name: "Ana".into(),
            matches: 0,
        };
        let many = CommandError::AmbiguousOrNotFound {
            name: "Ana".into(),
            matches: 2,
        };
        assert_eq!(none.to_string(), "no user named 'Ana'");
        assert_eq!(many.to_string(), "2 users match 'Ana'");
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let body = ErrorBody::from(&CommandError::unrecognized("hola"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "RESOLUTION_FAILURE");
    }
}
