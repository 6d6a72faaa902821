use std::fmt;

use tracing::{debug, info, warn};

use crate::config::DataSourceConfig;
use crate::driver::{BuiltinDriver, Driver, DriverConnection};
use crate::error::{DriverError, Result, SqlAccessError};
use crate::placeholders::count_placeholders;
use crate::results::ResultTable;
use crate::types::SqlValue;

struct OpenConnection {
    handle: Box<dyn DriverConnection>,
    auto_commit: bool,
}

/// Access to one data source over at most one connection.
///
/// A unit of work looks like:
/// ```rust
/// use sql_resultset::{params, DataAccess, DataSourceConfig, SqlAccessError};
///
/// # fn main() -> Result<(), SqlAccessError> {
/// let mut db = DataAccess::new(DataSourceConfig::builder("sqlite", ":memory:").build());
/// db.connect()?;
/// db.execute("CREATE TABLE team (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
///
/// db.begin_transaction()?;
/// match db.execute("INSERT INTO team (id, name) VALUES (?, ?)", &params![1, "Reds"]) {
///     Ok(_) => db.commit()?,
///     Err(err) => {
///         db.rollback()?;
///         return Err(err);
///     }
/// }
///
/// let rows = db.query("SELECT name AS team_name FROM team WHERE id = ?", &params![1])?;
/// assert_eq!(rows[0].get("team_name").and_then(|v| v.as_text()), Some("Reds"));
/// db.disconnect()?;
/// # Ok(())
/// # }
/// ```
///
/// Methods take `&mut self`; share an instance across threads only behind
/// your own lock, or give each thread its own instance.
///
/// Every call blocks. With the Postgres backend, calls made from a task on a
/// tokio runtime fail with a driver error rather than blocking that runtime;
/// dropping the instance there ends the session without waiting, and the
/// server discards any open transaction.
pub struct DataAccess {
    config: DataSourceConfig,
    driver: Option<Box<dyn Driver>>,
    conn: Option<OpenConnection>,
}

impl DataAccess {
    /// Use the built-in backend named by `config.driver()`.
    #[must_use]
    pub fn new(config: DataSourceConfig) -> Self {
        Self {
            config,
            driver: None,
            conn: None,
        }
    }

    /// Use a caller-supplied driver instead of the built-in backends.
    #[must_use]
    pub fn with_driver(config: DataSourceConfig, driver: impl Driver + 'static) -> Self {
        Self {
            config,
            driver: Some(Box::new(driver)),
            conn: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// `false` while a transaction started by [`begin_transaction`](Self::begin_transaction)
    /// is open, and while disconnected.
    #[must_use]
    pub fn is_auto_commit(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| c.auto_commit)
    }

    /// Open the connection. Does nothing if one is already open.
    ///
    /// # Errors
    /// Returns `SqlAccessError::Connection` if the driver cannot be located or
    /// the data source cannot be reached; the instance stays disconnected.
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let opened = match &self.driver {
            Some(driver) => driver.open(&self.config),
            None => self
                .config
                .driver_kind()
                .and_then(|kind| BuiltinDriver(kind).open(&self.config)),
        };
        let handle = opened.map_err(SqlAccessError::Connection)?;

        info!(driver = %self.config.driver(), uri = %self.config.uri(), "connected to data source");
        self.conn = Some(OpenConnection {
            handle,
            auto_commit: true,
        });
        Ok(())
    }

    /// Close the connection. Does nothing if none is open.
    ///
    /// The instance is disconnected afterwards even when closing fails.
    ///
    /// # Errors
    /// Returns `SqlAccessError::Connection` if the driver fails to close the connection.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(open) = self.conn.take() else {
            return Ok(());
        };
        open.handle.close().map_err(SqlAccessError::Connection)?;
        info!(uri = %self.config.uri(), "disconnected from data source");
        Ok(())
    }

    /// Switch the connection to manual-commit mode.
    ///
    /// # Errors
    /// Returns `SqlAccessError::Connection` if not connected, or
    /// `SqlAccessError::Transaction` if the driver rejects the mode change.
    pub fn begin_transaction(&mut self) -> Result<()> {
        let open = self.open_mut()?;
        if !open.auto_commit {
            return Ok(());
        }
        open.handle
            .set_auto_commit(false)
            .map_err(SqlAccessError::transaction)?;
        open.auto_commit = false;
        debug!("transaction started");
        Ok(())
    }

    /// Commit pending work, then switch back to auto-commit.
    ///
    /// Auto-commit is restored even if the commit fails.
    ///
    /// # Errors
    /// Returns `SqlAccessError::Transaction` if no transaction is open, the
    /// commit fails, or auto-commit cannot be restored (both failures are
    /// carried when both happen).
    pub fn commit(&mut self) -> Result<()> {
        self.finish_transaction("commit", |conn| conn.commit())
    }

    /// Revert pending work, then switch back to auto-commit.
    ///
    /// Auto-commit is restored even if the rollback fails.
    ///
    /// # Errors
    /// Same as [`commit`](Self::commit).
    pub fn rollback(&mut self) -> Result<()> {
        self.finish_transaction("rollback", |conn| conn.rollback())
    }

    fn finish_transaction(
        &mut self,
        action: &'static str,
        step: impl FnOnce(&mut dyn DriverConnection) -> std::result::Result<(), DriverError>,
    ) -> Result<()> {
        let open = self.open_mut()?;
        if open.auto_commit {
            return Err(SqlAccessError::transaction(DriverError::NoTransaction));
        }

        let outcome = step(open.handle.as_mut());
        let restored = open.handle.set_auto_commit(true);
        if restored.is_ok() {
            open.auto_commit = true;
        }

        match (outcome, restored) {
            (Ok(()), Ok(())) => {
                debug!(action, "transaction finished");
                Ok(())
            }
            (Err(source), restored) => Err(SqlAccessError::Transaction {
                source,
                restore: restored.err(),
            }),
            (Ok(()), Err(source)) => Err(SqlAccessError::transaction(source)),
        }
    }

    /// Run a query and materialize every row.
    ///
    /// `params` bind to the `?` placeholders left to right. Rows are keyed by
    /// column label (the `AS` alias when there is one).
    ///
    /// # Errors
    /// Returns `SqlAccessError::ParameterMismatch` before touching the
    /// connection if the placeholder and parameter counts differ,
    /// `SqlAccessError::Connection` if not connected, and
    /// `SqlAccessError::Query` if the driver fails.
    pub fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultTable> {
        check_param_count(sql, params)?;
        let open = self.open_mut()?;
        debug!(sql, params = params.len(), "query");
        open.handle.query(sql, params).map_err(SqlAccessError::Query)
    }

    /// Run an INSERT, UPDATE, DELETE, or DDL statement; returns affected rows.
    ///
    /// # Errors
    /// As [`query`](Self::query), with `SqlAccessError::Execute` for driver failures.
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        check_param_count(sql, params)?;
        let open = self.open_mut()?;
        debug!(sql, params = params.len(), "execute");
        open.handle
            .execute(sql, params)
            .map_err(SqlAccessError::Execute)
    }

    fn open_mut(&mut self) -> Result<&mut OpenConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| SqlAccessError::Connection(DriverError::NotConnected))
    }
}

fn check_param_count(sql: &str, params: &[SqlValue]) -> Result<()> {
    let expected = count_placeholders(sql);
    if expected == params.len() {
        Ok(())
    } else {
        Err(SqlAccessError::ParameterMismatch {
            expected,
            actual: params.len(),
        })
    }
}

impl Drop for DataAccess {
    fn drop(&mut self) {
        let Some(mut open) = self.conn.take() else {
            return;
        };
        if !open.auto_commit
            && let Err(err) = open.handle.rollback()
        {
            warn!(error = %err, "rollback of pending transaction failed on drop");
        }
        if let Err(err) = open.handle.close() {
            warn!(error = %err, "closing connection failed on drop");
        }
    }
}

impl fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAccess")
            .field("config", &self.config)
            .field("custom_driver", &self.driver.is_some())
            .field("connected", &self.is_connected())
            .field("auto_commit", &self.is_auto_commit())
            .finish()
    }
}
