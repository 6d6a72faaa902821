//! Blocking access to a relational data source that hands back every result
//! set as dynamically typed rows.
//!
//! Open a [`DataAccess`] for a [`DataSourceConfig`], run parameterized SQL
//! with `?` placeholders, and read columns by label from the returned
//! [`ResultTable`]. No per-table record types are needed.
//!
//! ```rust
//! use sql_resultset::prelude::*;
//!
//! # fn main() -> Result<(), SqlAccessError> {
//! let mut db = DataAccess::new(DataSourceConfig::builder("sqlite", ":memory:").build());
//! db.connect()?;
//! db.execute("CREATE TABLE payment (id INTEGER, amount REAL)", &[])?;
//! db.execute("INSERT INTO payment VALUES (?, ?)", &params![1, 9.5])?;
//!
//! let rows = db.query("SELECT amount FROM payment WHERE id = ?", &params![1])?;
//! assert_eq!(rows[0].get("amount"), Some(&SqlValue::Float(9.5)));
//! # Ok(())
//! # }
//! ```
//!
//! Backends are selected by cargo feature: `sqlite` (default) and `postgres`.

mod access;
pub mod config;
pub mod driver;
pub mod error;
pub mod placeholders;
pub mod prelude;
pub mod results;
pub mod tuple;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use access::DataAccess;
pub use config::{DataSourceConfig, DataSourceConfigBuilder, DriverKind};
pub use driver::{BuiltinDriver, Driver, DriverConnection};
pub use error::{DriverError, Result, SqlAccessError};
pub use results::{ResultTable, Row};
pub use tuple::Tuple;
pub use types::SqlValue;
