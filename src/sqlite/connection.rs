use std::fmt;

use tracing::debug;

use crate::config::DataSourceConfig;
use crate::driver::DriverConnection;
use crate::error::DriverError;
use crate::results::ResultTable;
use crate::types::SqlValue;

use super::params::Params;
use super::query::build_result_table;

/// A single rusqlite connection.
///
/// In manual-commit mode a `BEGIN` is issued lazily before the first
/// statement, so `commit`/`rollback` with no work pending are no-ops.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    auto_commit: bool,
}

impl SqliteConnection {
    /// Open the database file named by the config URI (`:memory:` for an
    /// in-memory database). A leading `sqlite:` or `sqlite://` is accepted.
    ///
    /// # Errors
    /// Returns `DriverError` if the file cannot be opened.
    pub fn open(config: &DataSourceConfig) -> Result<Self, DriverError> {
        let path = sqlite_path(config.uri());
        let conn = rusqlite::Connection::open(path)?;
        if let Some(timeout) = config.timeout() {
            conn.busy_timeout(timeout)?;
        }
        Ok(Self {
            conn,
            auto_commit: true,
        })
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn ensure_transaction(&mut self) -> Result<(), DriverError> {
        if !self.auto_commit && !self.in_transaction() {
            self.conn.execute_batch("BEGIN")?;
            debug!("sqlite: BEGIN");
        }
        Ok(())
    }
}

fn sqlite_path(uri: &str) -> &str {
    uri.strip_prefix("sqlite://")
        .or_else(|| uri.strip_prefix("sqlite:"))
        .unwrap_or(uri)
}

impl DriverConnection for SqliteConnection {
    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn.close().map_err(|(_, err)| DriverError::Sqlite(err))
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        if enabled && self.in_transaction() {
            self.conn.execute_batch("COMMIT")?;
        }
        self.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultTable, DriverError> {
        self.ensure_transaction()?;
        let converted = Params::convert(params);
        let mut stmt = self.conn.prepare(sql)?;
        build_result_table(&mut stmt, converted.as_values())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DriverError> {
        self.ensure_transaction()?;
        let converted = Params::convert(params);
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.execute(rusqlite::params_from_iter(converted.as_values()))?)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .field("auto_commit", &self.auto_commit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_prefixes() {
        assert_eq!(sqlite_path("sqlite://data/app.db"), "data/app.db");
        assert_eq!(sqlite_path("sqlite::memory:"), ":memory:");
        assert_eq!(sqlite_path("app.db"), "app.db");
    }
}
