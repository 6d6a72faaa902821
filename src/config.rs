use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::DriverError;

/// Backends this crate ships a driver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DriverKind {
    /// `SQLite` through rusqlite
    #[cfg(feature = "sqlite")]
    #[value(alias = "sqlite3")]
    Sqlite,
    /// `PostgreSQL` through tokio-postgres
    #[cfg(feature = "postgres")]
    #[value(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl FromStr for DriverKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <DriverKind as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| DriverError::UnknownDriver(s.to_string()))
    }
}

/// Where and how to connect.
///
/// All four fields are plain strings supplied by the caller; the driver
/// identifier is resolved to a [`DriverKind`] only when a connection is opened.
///
/// ```rust
/// use sql_resultset::DataSourceConfig;
///
/// let cfg = DataSourceConfig::builder("sqlite", ":memory:").build();
/// assert_eq!(cfg.uri(), ":memory:");
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct DataSourceConfig {
    driver: String,
    uri: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    password: String,
    #[serde(default, with = "timeout_secs")]
    timeout: Option<Duration>,
}

impl DataSourceConfig {
    #[must_use]
    pub fn new(
        driver: impl Into<String>,
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            driver: driver.into(),
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn builder(driver: impl Into<String>, uri: impl Into<String>) -> DataSourceConfigBuilder {
        DataSourceConfigBuilder {
            cfg: Self::new(driver, uri, String::new(), String::new()),
        }
    }

    #[must_use]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Busy timeout for `SQLite`, connect timeout for `PostgreSQL`.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolve the driver identifier.
    ///
    /// # Errors
    /// Returns [`DriverError::UnknownDriver`] if no compiled-in backend matches.
    pub fn driver_kind(&self) -> Result<DriverKind, DriverError> {
        self.driver.parse()
    }
}

impl fmt::Debug for DataSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceConfig")
            .field("driver", &self.driver)
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fluent builder for [`DataSourceConfig`].
#[derive(Debug, Clone)]
pub struct DataSourceConfigBuilder {
    cfg: DataSourceConfig,
}

impl DataSourceConfigBuilder {
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.cfg.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.cfg.password = password.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn build(self) -> DataSourceConfig {
        self.cfg
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.map(Duration::from_secs_f64))
    }
}
