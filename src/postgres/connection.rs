use std::fmt;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use crate::config::DataSourceConfig;
use crate::driver::DriverConnection;
use crate::error::DriverError;
use crate::placeholders::to_numbered;
use crate::results::ResultTable;
use crate::types::SqlValue;

use super::params::Params;
use super::query::build_result_table;

/// A single tokio-postgres client plus the runtime that drives it.
pub struct PostgresConnection {
    client: Client,
    connection_task: JoinHandle<()>,
    runtime: Runtime,
    auto_commit: bool,
    in_transaction: bool,
}

impl PostgresConnection {
    /// Connect using the config URI (`postgres://host:port/db` or a
    /// `key=value` string); a non-empty user or password in the config
    /// overrides the URI's.
    ///
    /// # Errors
    /// Returns `DriverError` if the URI is invalid or the server cannot be
    /// reached or rejects the credentials.
    pub fn open(config: &DataSourceConfig) -> Result<Self, DriverError> {
        outside_async_context()?;
        let mut pg_config: tokio_postgres::Config = config.uri().parse()?;
        if !config.user().is_empty() {
            pg_config.user(config.user());
        }
        if !config.password().is_empty() {
            pg_config.password(config.password());
        }
        if let Some(timeout) = config.timeout() {
            pg_config.connect_timeout(timeout);
        }

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let (client, connection) = runtime.block_on(pg_config.connect(NoTls))?;
        let connection_task = runtime.spawn(async move {
            if let Err(err) = connection.await {
                warn!(error = %err, "postgres connection terminated with error");
            }
        });

        Ok(Self {
            client,
            connection_task,
            runtime,
            auto_commit: true,
            in_transaction: false,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, DriverError> {
        outside_async_context()?;
        Ok(self.runtime.block_on(future))
    }

    fn batch(&mut self, sql: &str) -> Result<(), DriverError> {
        self.block_on(self.client.batch_execute(sql))??;
        debug!(sql, "postgres batch");
        Ok(())
    }

    fn ensure_transaction(&mut self) -> Result<(), DriverError> {
        if !self.auto_commit && !self.in_transaction {
            self.batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Ends the open transaction; the server considers it over even if
    /// `COMMIT`/`ROLLBACK` reports an error.
    fn end_transaction(&mut self, sql: &str) -> Result<(), DriverError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.batch(sql)
    }
}

impl DriverConnection for PostgresConnection {
    fn close(self: Box<Self>) -> Result<(), DriverError> {
        let PostgresConnection {
            client,
            connection_task,
            runtime,
            ..
        } = *self;
        // Dropping the client ends the session; the task then finishes.
        drop(client);
        if outside_async_context().is_err() {
            // The server rolls back whatever the session left open.
            connection_task.abort();
            runtime.shutdown_background();
            return Ok(());
        }
        runtime
            .block_on(connection_task)
            .map_err(|err| DriverError::Other(format!("postgres connection task failed: {err}")))
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        if enabled {
            self.end_transaction("COMMIT")?;
        }
        self.auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.end_transaction("ROLLBACK")
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultTable, DriverError> {
        self.ensure_transaction()?;
        let sql = to_numbered(sql);
        let converted = Params::convert(params);
        let client = &self.client;
        let (stmt, rows) = self.block_on(async {
            let stmt = client.prepare(&sql).await?;
            let rows = client.query(&stmt, converted.as_refs()).await?;
            Ok::<_, tokio_postgres::Error>((stmt, rows))
        })??;
        build_result_table(&stmt, &rows)
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DriverError> {
        self.ensure_transaction()?;
        let sql = to_numbered(sql);
        let converted = Params::convert(params);
        let client = &self.client;
        let affected = self.block_on(async {
            let stmt = client.prepare(&sql).await?;
            client.execute(&stmt, converted.as_refs()).await
        })??;
        usize::try_from(affected)
            .map_err(|e| DriverError::Other(format!("postgres affected rows conversion error: {e}")))
    }
}

/// Blocking on the private runtime panics when the caller is itself running
/// on a tokio runtime, so such calls fail instead.
fn outside_async_context() -> Result<(), DriverError> {
    if Handle::try_current().is_ok() {
        return Err(DriverError::Other(
            "blocking postgres call made from inside an async runtime".into(),
        ));
    }
    Ok(())
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("auto_commit", &self.auto_commit)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_is_refused_inside_a_runtime() {
        assert!(outside_async_context().is_ok());

        let runtime = Builder::new_current_thread().build().unwrap();
        let inside = runtime.block_on(async { outside_async_context() });
        assert!(matches!(inside, Err(DriverError::Other(_))));
    }
}
