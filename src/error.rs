use thiserror::Error;

/// Failure reported by a backend at the driver boundary.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error("no driver available for identifier `{0}`")]
    UnknownDriver(String),

    #[error("not connected to a data source")]
    NotConnected,

    #[error("no transaction in progress")]
    NoTransaction,

    #[error("row has {values} value(s) for {labels} column label(s)")]
    ColumnCount { labels: usize, values: usize },

    #[error("column `{column}` has type `{type_name}`, which cannot be read into a SqlValue")]
    UnsupportedType { column: String, type_name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by [`DataAccess`](crate::DataAccess).
#[derive(Debug, Error)]
pub enum SqlAccessError {
    /// The connection could not be opened, authenticated, or closed, or none is open.
    #[error("connection error: {0}")]
    Connection(#[source] DriverError),

    /// Changing the commit mode, committing, or rolling back failed.
    ///
    /// `restore` holds the failure of re-enabling auto-commit when the
    /// commit or rollback itself had already failed.
    #[error("transaction error: {source}{}", restore_suffix(.restore))]
    Transaction {
        #[source]
        source: DriverError,
        restore: Option<DriverError>,
    },

    #[error("statement has {expected} placeholder(s) but {actual} parameter(s) were supplied")]
    ParameterMismatch { expected: usize, actual: usize },

    #[error("query error: {0}")]
    Query(#[source] DriverError),

    #[error("execute error: {0}")]
    Execute(#[source] DriverError),
}

impl SqlAccessError {
    pub(crate) fn transaction(source: DriverError) -> Self {
        SqlAccessError::Transaction {
            source,
            restore: None,
        }
    }

    /// True when the error stems from calling an operation without an open connection.
    #[must_use]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, SqlAccessError::Connection(DriverError::NotConnected))
    }
}

fn restore_suffix(restore: &Option<DriverError>) -> String {
    match restore {
        Some(err) => format!("; restoring auto-commit also failed: {err}"),
        None => String::new(),
    }
}

pub type Result<T, E = SqlAccessError> = std::result::Result<T, E>;
