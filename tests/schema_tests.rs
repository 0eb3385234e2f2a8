//! Tests for schema introspection functionality.

use nl_task_manager::db::Database;
use nl_task_manager::types::NewUser;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

#[test]
fn schema_context_lists_application_tables_only() {
    let db = setup_db();

    let schema = db.schema_context().expect("Failed to get schema");

    assert!(!schema.sqlite_version.is_empty());
    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["tasks", "users"]);
}

#[test]
fn tasks_table_columns() {
    let db = setup_db();

    let schema = db.schema_context().unwrap();
    let tasks = schema.table("tasks").expect("tasks table");

    let column_names: Vec<&str> = tasks.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        column_names,
        vec![
            "id",
            "description",
            "assignee",
            "status",
            "created_at",
            "updated_at"
        ]
    );

    let id = &tasks.columns[0];
    assert!(id.primary_key);
    assert_eq!(id.data_type, "INTEGER");

    let description = tasks
        .columns
        .iter()
        .find(|c| c.name == "description")
        .unwrap();
    assert!(!description.nullable);

    let status = tasks.columns.iter().find(|c| c.name == "status").unwrap();
    assert_eq!(status.default_value.as_deref(), Some("'TODO'"));
}

#[test]
fn assignee_foreign_key_sets_null_on_delete() {
    let db = setup_db();

    let schema = db.schema_context().unwrap();
    let tasks = schema.table("tasks").unwrap();

    assert_eq!(tasks.foreign_keys.len(), 1);
    let fk = &tasks.foreign_keys[0];
    assert_eq!(fk.from_column, "assignee");
    assert_eq!(fk.to_table, "users");
    assert_eq!(fk.to_column, "id");
    assert_eq!(fk.on_delete, "SET NULL");
}

#[test]
fn row_counts_track_data() {
    let db = setup_db();
    db.create_task("Comprar leche").unwrap();
    db.create_task("Enviar informe").unwrap();
    db.create_user(NewUser {
        email: "test@example.com".to_string(),
        user_id: "123456".to_string(),
        chat_id: "789012".to_string(),
        user_name: None,
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
    })
    .unwrap();

    let schema = db.schema_context().unwrap();

    assert_eq!(schema.table("tasks").unwrap().row_count, 2);
    assert_eq!(schema.table("users").unwrap().row_count, 1);
    assert_eq!(schema.user_names, vec!["Test User".to_string()]);
}

#[test]
fn display_renders_one_line_per_table() {
    let db = setup_db();

    let rendered = db.schema_context().unwrap().to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("tasks(id INTEGER PRIMARY KEY"));
    assert!(lines[0].contains("assignee INTEGER REFERENCES users(id) ON DELETE SET NULL"));
    assert!(lines[0].ends_with("-- 0 rows"));
    assert!(lines[1].starts_with("users("));
}

#[test]
fn schema_serializes_to_json() {
    let db = setup_db();

    let json = serde_json::to_value(db.schema_context().unwrap()).unwrap();

    assert!(json["tables"].is_array());
    assert!(json["sqlite_version"].is_string());
}
