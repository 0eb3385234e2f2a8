//! Schema introspection, handed to translators as context.

use super::Database;
use super::users::select_users;
use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Information about a foreign key relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: String,
}

/// Information about a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub row_count: i64,
}

/// Read-only description of the current schema and data volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaContext {
    pub tables: Vec<TableInfo>,
    pub sqlite_version: String,
    /// "first last" names of registered users, in registration order.
    #[serde(default)]
    pub user_names: Vec<String>,
}

impl SchemaContext {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Compact DDL-like rendering, suitable for a language-model prompt.
impl fmt::Display for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for table in &self.tables {
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|c| {
                    let mut col = format!("{} {}", c.name, c.data_type);
                    if c.primary_key {
                        col.push_str(" PRIMARY KEY");
                    } else if !c.nullable {
                        col.push_str(" NOT NULL");
                    }
                    if let Some(fk) = table.foreign_keys.iter().find(|fk| fk.from_column == c.name) {
                        col.push_str(&format!(
                            " REFERENCES {}({}) ON DELETE {}",
                            fk.to_table, fk.to_column, fk.on_delete
                        ));
                    }
                    col
                })
                .collect();
            writeln!(
                f,
                "{}({}) -- {} rows",
                table.name,
                columns.join(", "),
                table.row_count
            )?;
        }
        Ok(())
    }
}

impl Database {
    /// Describe the application tables.
    pub fn schema_context(&self) -> Result<SchemaContext> {
        self.with_conn(|conn| {
            let sqlite_version: String =
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;

            // Skip internal sqlite_ tables and the refinery history
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table'
                 AND name NOT LIKE 'sqlite_%'
                 AND name NOT LIKE 'refinery_%'
                 ORDER BY name",
            )?;
            let table_names: Vec<String> = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut tables = Vec::new();
            for name in table_names {
                tables.push(TableInfo {
                    columns: table_columns(conn, &name)?,
                    foreign_keys: table_foreign_keys(conn, &name)?,
                    row_count: conn.query_row(
                        &format!("SELECT COUNT(*) FROM \"{}\"", name),
                        [],
                        |row| row.get(0),
                    )?,
                    name,
                });
            }

            let user_names = select_users(conn)?
                .iter()
                .map(|u| u.full_name())
                .filter(|name| !name.is_empty())
                .collect();

            Ok(SchemaContext {
                tables,
                sqlite_version,
                user_names,
            })
        })
    }
}

fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table_name))?;

    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get::<_, String>(2)?.to_uppercase(),
                nullable: row.get::<_, i32>(3)? == 0,
                default_value: row.get(4)?,
                primary_key: row.get::<_, i32>(5)? > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table_name: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list('{}')", table_name))?;

    let foreign_keys = stmt
        .query_map([], |row| {
            Ok(ForeignKeyInfo {
                from_column: row.get(3)?,
                to_table: row.get(2)?,
                to_column: row.get(4)?,
                on_delete: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(foreign_keys)
}
