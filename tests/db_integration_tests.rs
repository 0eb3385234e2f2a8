//! Integration tests for the database layer.
//!
//! These tests verify the core database operations using an in-memory SQLite database.
//! Tests are organized by module and functionality.

use nl_task_manager::db::Database;
use nl_task_manager::error::{CommandError, ErrorCode};
use nl_task_manager::types::{NewUser, TaskStatus};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn test_user(email: &str, user_id: &str, first: &str, last: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        user_id: user_id.to_string(),
        chat_id: "789012".to_string(),
        user_name: Some("testuser".to_string()),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_defaults_to_todo() {
        let db = setup_db();

        let task = db.create_task("Comprar leche").expect("Failed to create task");

        assert!(task.id > 0);
        assert_eq!(task.description, "Comprar leche");
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.assignee.is_none());
        assert_eq!(task.created_at, task.updated_at);

        let stored = db.get_task(task.id).unwrap().expect("task stored");
        assert_eq!(stored, task);
    }

    #[test]
    fn create_task_trims_and_rejects_empty_description() {
        let db = setup_db();

        let task = db.create_task("  Enviar informe \n").unwrap();
        assert_eq!(task.description, "Enviar informe");

        assert!(db.create_task("   ").is_err());
    }

    #[test]
    fn task_ids_are_not_reused_after_delete() {
        let db = setup_db();
        let first = db.create_task("uno").unwrap();
        assert!(db.delete_task(first.id).unwrap());

        let second = db.create_task("dos").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn get_task_returns_none_for_unknown_id() {
        let db = setup_db();

        assert!(db.get_task(999).unwrap().is_none());
    }

    #[test]
    fn list_tasks_in_creation_order_with_status_filter() {
        let db = setup_db();
        let a = db.create_task("Comprar leche").unwrap();
        let b = db.create_task("Llamar al médico").unwrap();
        let c = db.create_task("Enviar informe").unwrap();
        db.update_task_status(b.id, TaskStatus::InProgress).unwrap();
        db.update_task_status(c.id, TaskStatus::Done).unwrap();

        let all: Vec<i64> = db.list_tasks(None).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(all, vec![a.id, b.id, c.id]);

        let done = db.list_tasks(Some(TaskStatus::Done)).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].description, "Enviar informe");

        assert!(db.list_tasks(Some(TaskStatus::Blocked)).unwrap().is_empty());
    }

    #[test]
    fn update_status_refreshes_updated_at() {
        let db = setup_db();
        let task = db.create_task("Comprar leche").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let updated = db
            .update_task_status(task.id, TaskStatus::Blocked)
            .unwrap()
            .expect("task exists");

        assert_eq!(updated.status, TaskStatus::Blocked);
        assert!(updated.updated_at > task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let db = setup_db();
        let task = db.create_task("Comprar leche").unwrap();
        let future = task.updated_at + 60_000;
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                rusqlite::params![future, task.id],
            )?;
            Ok(())
        })
        .unwrap();

        let updated = db
            .update_task_status(task.id, TaskStatus::Done)
            .unwrap()
            .unwrap();

        assert_eq!(updated.updated_at, future);
    }

    #[test]
    fn mutations_on_missing_task_return_none() {
        let db = setup_db();

        assert!(db.update_task_status(42, TaskStatus::Done).unwrap().is_none());
        assert!(db.assign_task(42, None).unwrap().is_none());
        assert!(!db.delete_task(42).unwrap());
    }

    #[test]
    fn invalid_status_is_rejected_by_schema() {
        let db = setup_db();
        let result = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (description, status, created_at, updated_at)
                 VALUES ('x', 'LATER', 0, 0)",
                [],
            )?;
            Ok(())
        });

        assert!(result.is_err());
    }
}

mod user_tests {
    use super::*;

    #[test]
    fn create_and_get_user() {
        let db = setup_db();

        let user = db
            .create_user(test_user("test@example.com", "123456", "Test", "User"))
            .expect("Failed to create user");

        assert!(user.id > 0);
        assert_eq!(user.full_name(), "Test User");
        assert_eq!(db.get_user(user.id).unwrap(), Some(user.clone()));
        assert_eq!(db.get_user_by_platform_id("123456").unwrap(), Some(user));
        assert!(db.get_user_by_platform_id("000").unwrap().is_none());
    }

    #[test]
    fn email_and_platform_id_are_unique() {
        let db = setup_db();
        db.create_user(test_user("test@example.com", "1", "Test", "User"))
            .unwrap();

        assert!(
            db.create_user(test_user("test@example.com", "2", "Otro", "Nombre"))
                .is_err()
        );
        assert!(
            db.create_user(test_user("otro@example.com", "1", "Otro", "Nombre"))
                .is_err()
        );
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_registration_is_invalid_input() {
        let db = setup_db();
        db.create_user(test_user("test@example.com", "1", "Test", "User"))
            .unwrap();

        let err = db
            .create_user(test_user(" test@example.com ", "2", "Otro", "Nombre"))
            .unwrap_err();
        let err = CommandError::from(err);
        assert_eq!(err.code(), ErrorCode::InvalidFieldValue);
        assert!(err.to_string().contains("email"), "{}", err);

        let err = CommandError::from(
            db.create_user(test_user("otro@example.com", "1", "Otro", "Nombre"))
                .unwrap_err(),
        );
        assert!(
            matches!(err, CommandError::InvalidInput { ref field, .. } if field == "user_id"),
            "{:?}",
            err
        );
    }

    #[test]
    fn required_fields_are_checked() {
        let db = setup_db();
        let mut input = test_user("test@example.com", "1", "Test", "User");
        input.chat_id = "  ".to_string();

        let err = CommandError::from(db.create_user(input).unwrap_err());
        assert_eq!(err.code(), ErrorCode::InvalidFieldValue);
    }

    #[test]
    fn find_by_full_name_ignores_case_accents_and_spacing() {
        let db = setup_db();
        let ana = db
            .create_user(test_user("ana@example.com", "1", "Ána", "Pérez"))
            .unwrap();
        db.create_user(test_user("test@example.com", "2", "Test", "User"))
            .unwrap();

        let found = db.find_users_by_full_name("  ana   PEREZ ").unwrap();
        assert_eq!(found, vec![ana]);
        assert!(db.find_users_by_full_name("Ana").unwrap().is_empty());
        assert!(db.find_users_by_full_name("").unwrap().is_empty());
    }

    #[test]
    fn deleting_user_detaches_but_keeps_tasks() {
        let db = setup_db();
        let user = db
            .create_user(test_user("test@example.com", "123456", "Test", "User"))
            .unwrap();
        let task = db.create_task("Comprar leche").unwrap();
        db.assign_task(task.id, Some(user.id)).unwrap();
        assert_eq!(db.list_tasks_for_user(user.id).unwrap().len(), 1);

        assert!(db.delete_user(user.id).unwrap());

        let task = db.get_task(task.id).unwrap().expect("task survives");
        assert!(task.assignee.is_none());
        assert!(db.get_user(user.id).unwrap().is_none());
        assert!(!db.delete_user(user.id).unwrap());
    }

    #[test]
    fn assigning_to_unknown_user_violates_foreign_key() {
        let db = setup_db();
        let task = db.create_task("Comprar leche").unwrap();

        assert!(db.assign_task(task.id, Some(77)).is_err());
        assert!(db.get_task(task.id).unwrap().unwrap().assignee.is_none());
    }
}

mod connection_tests {
    use super::*;

    #[test]
    fn open_url_creates_file_database_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.db");
        let url = format!("sqlite:///{}", path.display());

        let db = Database::open_url(&url).expect("open file database");
        let task = db.create_task("Persistente").unwrap();
        drop(db);

        assert!(path.exists());
        let reopened = Database::open_url(&url).expect("reopen");
        assert_eq!(reopened.get_task(task.id).unwrap().unwrap().description, "Persistente");
    }

    #[test]
    fn open_url_in_memory() {
        let db = Database::open_url("sqlite:///:memory:").unwrap();
        assert!(db.list_tasks(None).unwrap().is_empty());
    }

    #[test]
    fn clones_share_the_connection() {
        let db = setup_db();
        let other = db.clone();
        let task = db.create_task("Compartida").unwrap();

        assert!(other.get_task(task.id).unwrap().is_some());
    }
}
