//! Convenient imports for common functionality.

pub use crate::params;
pub use crate::{
    DataAccess, DataSourceConfig, DriverError, ResultTable, Row, SqlAccessError, SqlValue, Tuple,
};
