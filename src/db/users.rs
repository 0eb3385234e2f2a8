//! User registration and lookup.

use super::{Database, now_ms};
use crate::error::CommandError;
use crate::intent::fold_char;
use crate::types::{NewUser, User};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};

const USER_COLUMNS: &str =
    "id, email, user_id, chat_id, user_name, first_name, last_name, created_at, updated_at";

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        user_id: row.get("user_id")?,
        chat_id: row.get("chat_id")?,
        user_name: row.get("user_name")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Lowercase, fold accents and collapse whitespace, for name comparison.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.chars().map(fold_char).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn find_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

pub fn select_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users ORDER BY created_at, id",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], parse_user_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Users whose "first last" name equals `full_name`, ignoring case, accents and spacing.
///
/// Compared in Rust rather than with SQL `LOWER()`, which only folds ASCII.
pub fn select_users_by_full_name(conn: &Connection, full_name: &str) -> Result<Vec<User>> {
    let wanted = normalize_name(full_name);
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    Ok(select_users(conn)?
        .into_iter()
        .filter(|u| normalize_name(&u.full_name()) == wanted)
        .collect())
}

impl Database {
    /// Register a user from the chat platform.
    ///
    /// Missing fields and an email or platform id that is already taken are
    /// reported as `CommandError::InvalidInput`.
    pub fn create_user(&self, input: NewUser) -> Result<User> {
        for (field, value) in [
            ("email", &input.email),
            ("user_id", &input.user_id),
            ("chat_id", &input.chat_id),
        ] {
            if value.trim().is_empty() {
                return Err(CommandError::invalid_value(field, "is required").into());
            }
        }
        let email = input.email.trim();
        let user_id = input.user_id.trim();
        let now = now_ms();

        self.transaction(|tx| -> Result<User> {
            for (field, value) in [("email", email), ("user_id", user_id)] {
                let taken: bool = tx.query_row(
                    &format!("SELECT EXISTS(SELECT 1 FROM users WHERE {} = ?1)", field),
                    params![value],
                    |row| row.get(0),
                )?;
                if taken {
                    return Err(CommandError::invalid_value(
                        field,
                        format!("'{}' is already registered", value),
                    )
                    .into());
                }
            }

            tx.execute(
                "INSERT INTO users (
                    email, user_id, chat_id, user_name, first_name, last_name, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    email,
                    user_id,
                    input.chat_id.trim(),
                    input.user_name,
                    input.first_name,
                    input.last_name,
                    now,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            find_user(tx, id)?.ok_or_else(|| anyhow!("User {} vanished after insert", id))
        })
    }

    /// Get a user by row id.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| find_user(conn, id))
    }

    /// Get a user by their chat-platform user id.
    pub fn get_user_by_platform_id(&self, user_id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS),
                    params![user_id],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// List all users in registration order.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(select_users)
    }

    /// Users matching a "first last" name.
    pub fn find_users_by_full_name(&self, full_name: &str) -> Result<Vec<User>> {
        self.with_conn(|conn| select_users_by_full_name(conn, full_name))
    }

    /// Delete a user. Their tasks stay, unassigned.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.transaction(|tx| {
            let changed = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }
}
