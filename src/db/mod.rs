//! Database layer: the connection manager and per-table operations.

pub mod schema;
pub mod tasks;
pub mod users;

use anyhow::{Result, anyhow, bail};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Where a `DATABASE_URL` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

/// Parse a SQLite connection string.
///
/// Accepts `sqlite:///relative.db`, `sqlite:////absolute.db`, the in-memory forms
/// `:memory:`, `sqlite://`, `sqlite://:memory:` and `sqlite:///:memory:`, or a bare path.
pub fn parse_database_url(url: &str) -> Result<DatabaseLocation> {
    let url = url.trim();
    if url.is_empty() {
        bail!("database URL is empty");
    }

    let rest = match url.strip_prefix("sqlite:") {
        Some(rest) => rest,
        None if url.contains("://") => {
            bail!("unsupported database URL '{}': only sqlite is supported", url)
        }
        None => {
            return Ok(if url == ":memory:" {
                DatabaseLocation::Memory
            } else {
                DatabaseLocation::File(PathBuf::from(url))
            });
        }
    };

    let path = if let Some(path) = rest.strip_prefix("///") {
        path
    } else if let Some(path) = rest.strip_prefix("//") {
        if !path.is_empty() && path != ":memory:" {
            bail!(
                "invalid database URL '{}': expected sqlite:///<path> (three slashes)",
                url
            );
        }
        path
    } else {
        rest
    };

    match path {
        "" | ":memory:" => Ok(DatabaseLocation::Memory),
        path => Ok(DatabaseLocation::File(PathBuf::from(path))),
    }
}

/// Database handle wrapping a SQLite connection.
///
/// Cloning shares the same connection. Each command takes the lock for the
/// duration of its own transaction.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database a connection string points to.
    pub fn open_url(url: &str) -> Result<Self> {
        match parse_database_url(url)? {
            DatabaseLocation::Memory => Self::open_in_memory(),
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Self::open(path)
            }
        }
    }

    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "Opening database");
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Create any missing tables.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock();
        let report = embedded::migrations::runner()
            .run(&mut *conn)
            .map_err(|e| anyhow!("migration failed: {}", e))?;
        for migration in report.applied_migrations() {
            debug!(
                version = migration.version(),
                name = migration.name(),
                "Applied migration"
            );
        }
        Ok(())
    }

    /// A panic while holding the lock leaves no open transaction behind
    /// (it is rolled back on drop), so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Run `f` inside one transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// Generic over the error type so callers with a domain error can use it
    /// directly, as long as SQLite errors convert into it.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        // Dropping `tx` on the error path rolls it back.
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlalchemy_style_urls() {
        assert_eq!(
            parse_database_url("sqlite:///task_manager.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("task_manager.db"))
        );
        assert_eq!(
            parse_database_url("sqlite:////var/lib/tasks.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("/var/lib/tasks.db"))
        );
        assert_eq!(
            parse_database_url("data/tasks.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("data/tasks.db"))
        );
    }

    #[test]
    fn parses_in_memory_urls() {
        for url in [":memory:", "sqlite://", "sqlite://:memory:", "sqlite:///:memory:"] {
            assert_eq!(parse_database_url(url).unwrap(), DatabaseLocation::Memory, "{}", url);
        }
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(parse_database_url("postgres://localhost/tasks").is_err());
        assert!(parse_database_url("sqlite://host/tasks.db").is_err());
        assert!(parse_database_url("   ").is_err());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO tasks (description, status, created_at, updated_at)
                 VALUES ('x', 'TODO', 0, 0)",
                [],
            )?;
            Err(anyhow!("abort"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }
}
