// 🗄️ Connection Scope - one connection per unit of work
//
// Every public operation goes through Database::with_cursor:
//   connect → hand the connection to the caller once → commit (if asked) → release
// Release happens by Drop, so it runs on every exit path including errors and panics.

use crate::config::DatabaseConfig;
use crate::error::{ExpenseError, Result};
use rusqlite::Connection;
use tracing::debug;

/// Handle to the expense store. Holds configuration only; no connection is kept open.
#[derive(Debug, Clone)]
pub struct Database {
    config: DatabaseConfig,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Database { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Open a fresh connection. Failure is a ConnectionError and nothing is released.
    fn connect(&self) -> Result<Connection> {
        let target = self.config.target();

        if !self.config.is_local_host() {
            return Err(ExpenseError::Connection {
                target,
                source: rusqlite::Error::InvalidPath(self.config.path()),
            });
        }

        let conn = Connection::open(self.config.path())
            .map_err(|source| ExpenseError::Connection {
                target: target.clone(),
                source,
            })?;

        debug!(target = %target, "opened connection");
        Ok(conn)
    }

    /// Run one unit of work on a fresh connection.
    ///
    /// The work runs inside a transaction. When `commit` is set the transaction
    /// is committed after the work returns, whether or not the work succeeded;
    /// otherwise it is rolled back. The connection is closed before returning.
    pub fn with_cursor<T, F>(&self, commit: bool, work: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;

        let outcome = {
            let tx = conn.transaction()?;
            let outcome = work(&*tx);

            let finished = if commit { tx.commit() } else { tx.rollback() };

            match (outcome, finished) {
                (Err(e), _) => Err(e),
                (Ok(_), Err(e)) => Err(e.into()),
                (Ok(value), Ok(())) => Ok(value),
            }
        };

        drop(conn);
        debug!(commit, ok = outcome.is_ok(), "released connection");

        outcome
    }

    /// Create the expenses table if it does not exist yet
    pub fn setup(&self) -> Result<()> {
        let conn = self.connect()?;
        setup_database(&conn)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            expense_date TEXT NOT NULL CHECK (expense_date <> ''),
            amount REAL NOT NULL CHECK (amount > 0),
            category TEXT NOT NULL CHECK (category <> ''),
            notes TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date)",
        [],
    )?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::temp_database;
    use super::*;

    fn count(db: &Database) -> i64 {
        db.with_cursor(false, |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?)
        })
        .unwrap()
    }

    fn insert_raw(conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO expenses (expense_date, amount, category) VALUES ('2024-08-10', 5.0, 'Food')",
            [],
        )?;
        Ok(())
    }

    #[test]
    fn test_commit_persists_work() {
        let (_dir, db) = temp_database();

        db.with_cursor(true, insert_raw).unwrap();

        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_without_commit_work_is_rolled_back() {
        let (_dir, db) = temp_database();

        db.with_cursor(false, insert_raw).unwrap();

        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_work_error_is_returned_and_connection_released() {
        let (_dir, db) = temp_database();

        let result: Result<()> = db.with_cursor(true, |conn| {
            conn.execute("INSERT INTO no_such_table VALUES (1)", [])?;
            Ok(())
        });

        assert!(matches!(result, Err(ExpenseError::Query(_))));

        // Next unit of work gets its own connection without trouble
        db.with_cursor(true, insert_raw).unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_connect_failure_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir").join("expenses.db");
        let db = Database::new(DatabaseConfig::for_path(missing));

        let result = db.with_cursor(false, |_| Ok(()));

        assert!(matches!(result, Err(ExpenseError::Connection { .. })));
    }

    #[test]
    fn test_remote_host_is_connection_error() {
        let mut config = DatabaseConfig::for_path("expenses.db");
        config.host = "db.example.com".to_string();
        let db = Database::new(config);

        let err = db.with_cursor(false, |_| Ok(())).unwrap_err();

        assert!(matches!(err, ExpenseError::Connection { .. }));
        assert!(err.to_string().contains("db.example.com"));
    }

    #[test]
    fn test_setup_is_repeatable() {
        let (_dir, db) = temp_database();
        db.setup().unwrap();
        assert_eq!(count(&db), 0);
    }
}
