//! The driver boundary.
//!
//! A [`Driver`] opens connections; a [`DriverConnection`] runs already
//! validated statements. Preparing, binding, and cursor handling stay inside
//! each backend and are released before a call returns.

use crate::config::{DataSourceConfig, DriverKind};
use crate::error::DriverError;
use crate::results::ResultTable;
use crate::types::SqlValue;

/// Opens physical connections for a data source.
pub trait Driver {
    /// # Errors
    /// Returns `DriverError` if the data source cannot be reached or rejects the credentials.
    fn open(&self, config: &DataSourceConfig) -> Result<Box<dyn DriverConnection>, DriverError>;
}

/// One open physical connection.
///
/// `set_auto_commit(false)` puts the connection in manual-commit mode: work
/// accumulates until `commit` or `rollback`. Re-enabling auto-commit while
/// work is pending commits it.
pub trait DriverConnection {
    /// # Errors
    /// Returns `DriverError` if the connection does not close cleanly.
    fn close(self: Box<Self>) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the backend rejects the mode change.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if committing pending work fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if reverting pending work fails.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Run a query, binding `params` to the positional placeholders in order.
    ///
    /// # Errors
    /// Returns `DriverError` if preparing, binding, or fetching fails.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultTable, DriverError>;

    /// Run a DML statement and return the number of affected rows.
    ///
    /// # Errors
    /// Returns `DriverError` if preparing, binding, or executing fails.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DriverError>;
}

/// Driver for one of the backends compiled into this crate.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinDriver(pub DriverKind);

impl Driver for BuiltinDriver {
    fn open(&self, config: &DataSourceConfig) -> Result<Box<dyn DriverConnection>, DriverError> {
        match self.0 {
            #[cfg(feature = "sqlite")]
            DriverKind::Sqlite => Ok(Box::new(crate::sqlite::SqliteConnection::open(config)?)),
            #[cfg(feature = "postgres")]
            DriverKind::Postgres => Ok(Box::new(crate::postgres::PostgresConnection::open(
                config,
            )?)),
        }
    }
}
