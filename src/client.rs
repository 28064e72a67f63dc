//! Backend seam: the traits a database driver implements so the connection
//! manager and retrying executor stay driver-agnostic, plus the prepared
//! [`Statement`] handed between them.

use async_trait::async_trait;

use crate::config::ConnectConfig;
use crate::error::StewardError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// A statement prepared for execution: the query text plus an optional debug
/// note that shows up in the diagnostics log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// The SQL text.
    pub sql: String,
    /// Optional annotation recorded alongside the statement in the query log.
    pub note: Option<String>,
}

impl Statement {
    /// Create a statement from query text.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            note: None,
        }
    }

    /// Attach a debug note; rendered as `sql -- note` in the query log.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A live client connection.
///
/// Every call blocks the task for the duration of the round trip; there is no
/// cancellation primitive at this layer. Implementations exist for
/// `mysql_async` (feature `mysql`) and for scripted mocks in tests.
#[async_trait]
pub trait SqlClient: Send {
    /// Run a statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns the driver error mapped into [`StewardError`].
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, StewardError>;

    /// Run a query and collect its rows.
    ///
    /// # Errors
    /// Returns the driver error mapped into [`StewardError`].
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, StewardError>;

    /// The server version string, e.g. `8.0.36` or `10.6.12-MariaDB`.
    ///
    /// # Errors
    /// Returns an error if the version cannot be obtained from the server.
    async fn server_version(&mut self) -> Result<String, StewardError>;
}

/// Creates client connections from a [`ConnectConfig`].
#[async_trait]
pub trait Connector: Send {
    type Client: SqlClient;

    /// Open a new connection.
    ///
    /// # Errors
    /// Returns `StewardError::Connection` (or a driver error) when the
    /// connection cannot be established.
    async fn connect(&self, config: &ConnectConfig) -> Result<Self::Client, StewardError>;
}
