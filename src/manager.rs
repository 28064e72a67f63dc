//! The connection manager: owns the lazily-created client handle and
//! re-initializes the session after every (re)connect.

use std::fmt;

use tracing::debug;

use crate::client::{Connector, SqlClient, Statement};
use crate::config::ConnectConfig;
use crate::diagnostics::QueryLog;
use crate::error::{LastError, StewardError};
use crate::metadata::MetadataCache;
use crate::sanitize;
use crate::sqlmode::{self, SqlModeAction, SqlModeDirective};

/// Callback invoked when the server reports an unknown column; receives the
/// parsed `(table, column)` pair. The table part is empty for bare column
/// names.
pub type UnknownColumnHook = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Manages a single logical connection.
///
/// The handle is created on first use and transparently recreated after
/// [`close`](ConnectionManager::close) or a detected connection loss. There
/// is no internal locking: safe concurrent use requires external
/// synchronization or one manager per task.
///
/// ```rust,no_run
/// use sql_steward::prelude::*;
///
/// # async fn demo() -> Result<(), StewardError> {
/// let config = ConnectConfig::new("cms", "editor", "secret").with_diagnostics(true);
/// let mut db = ConnectionManager::new(MysqlConnector, config);
///
/// let stmt = db.prepare("UPDATE posts SET title = ? WHERE id = ?");
/// db.execute(&stmt, &[SqlValue::Text("hello".into()), SqlValue::Int(1)]).await?;
/// # Ok(()) }
/// ```
pub struct ConnectionManager<C: Connector> {
    pub(crate) connector: C,
    pub(crate) config: ConnectConfig,
    pub(crate) client: Option<C::Client>,
    pub(crate) initialized: bool,
    pub(crate) in_transaction: bool,
    pub(crate) server_version: Option<String>,
    pub(crate) strip_four_byte: bool,
    pub(crate) diagnostics: QueryLog,
    pub(crate) last_error: Option<LastError>,
    pub(crate) unknown_column_hook: Option<UnknownColumnHook>,
    pub(crate) stopword_cache: Option<Box<dyn crate::cache::DurableCache>>,
    pub(crate) meta: MetadataCache,
}

impl<C: Connector> fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.config.host)
            .field("dbname", &self.config.dbname)
            .field("connected", &self.client.is_some())
            .field("initialized", &self.initialized)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager. No connection is opened until first use.
    #[must_use]
    pub fn new(connector: C, config: ConnectConfig) -> Self {
        let diagnostics = QueryLog::new(config.diagnostics, config.max_logged_queries);
        let strip_four_byte = config.strip_four_byte();
        Self {
            connector,
            config,
            client: None,
            initialized: false,
            in_transaction: false,
            server_version: None,
            strip_four_byte,
            diagnostics,
            last_error: None,
            unknown_column_hook: None,
            stopword_cache: None,
            meta: MetadataCache::default(),
        }
    }

    /// Install the unknown-column notification hook. Default is a no-op.
    #[must_use]
    pub fn with_unknown_column_hook(
        mut self,
        hook: impl Fn(&str, &str) + Send + Sync + 'static,
    ) -> Self {
        self.unknown_column_hook = Some(Box::new(hook));
        self
    }

    /// Install the external durable cache used for the stopword set.
    #[must_use]
    pub fn with_durable_cache(mut self, cache: impl crate::cache::DurableCache + 'static) -> Self {
        self.stopword_cache = Some(Box::new(cache));
        self
    }

    /// The configuration this manager was built with.
    #[must_use]
    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    /// A ready-to-use client handle, connecting and initializing the session
    /// if necessary.
    ///
    /// # Errors
    /// Returns a connection or initialization error; these are fatal for the
    /// current call and never retried here.
    pub async fn handle(&mut self) -> Result<&mut C::Client, StewardError> {
        if self.client.is_none() {
            debug!(
                host = %self.config.host,
                dbname = %self.config.dbname,
                "opening database connection"
            );
            let client = self.connector.connect(&self.config).await?;
            self.client = Some(client);
            self.initialized = false;
        }
        if !self.initialized {
            self.init_session().await?;
            self.initialized = true;
        }
        self.client
            .as_mut()
            .ok_or_else(|| StewardError::Connection("connection handle unavailable".to_string()))
    }

    /// Discard the current handle. No statement is sent; the next
    /// [`handle`](ConnectionManager::handle) call reconnects and re-runs
    /// session initialization.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("discarding database connection handle");
        }
        self.initialized = false;
        self.in_transaction = false;
    }

    /// Whether a live handle currently exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Session initialization, run once per live handle: character set,
    /// configured init command, server version capture, and the declarative
    /// SQL-mode directives.
    async fn init_session(&mut self) -> Result<(), StewardError> {
        self.strip_four_byte = self.config.strip_four_byte();
        let Some(client) = self.client.as_mut() else {
            return Err(StewardError::Connection(
                "cannot initialize without a live handle".to_string(),
            ));
        };

        let charset = sanitize::escape_identifier(&self.config.charset);
        let set_names = match &self.config.collation {
            Some(collation) => format!(
                "SET NAMES '{charset}' COLLATE '{}'",
                sanitize::escape_identifier(collation)
            ),
            None => format!("SET NAMES '{charset}'"),
        };
        client.execute(&set_names, &[]).await?;

        if let Some(command) = &self.config.init_command {
            client.execute(command, &[]).await?;
        }

        let version = client.server_version().await?;
        for directive in &self.config.sql_mode_directives {
            sqlmode::apply_directive(client, &version, directive).await?;
        }
        debug!(server_version = %version, charset = %self.config.charset, "session initialized");
        self.server_version = Some(version);
        Ok(())
    }

    /// Prepare a statement for execution.
    #[must_use]
    pub fn prepare(&self, sql: impl Into<String>) -> Statement {
        Statement::new(sql)
    }

    /// The server version string, cached after the first lookup.
    ///
    /// # Errors
    /// Returns a connection error when the version has to be fetched and no
    /// connection can be established.
    pub async fn server_version(&mut self) -> Result<String, StewardError> {
        if self.server_version.is_none() {
            let client = self.handle().await?;
            let version = client.server_version().await?;
            self.server_version = Some(version);
        }
        Ok(self.server_version.clone().unwrap_or_default())
    }

    /// The current session SQL mode.
    ///
    /// # Errors
    /// Propagates connection and query errors.
    pub async fn sql_mode(&mut self) -> Result<String, StewardError> {
        let client = self.handle().await?;
        sqlmode::read_sql_mode(client).await
    }

    /// Adjust the session SQL mode. Returns `false` without issuing a
    /// statement when `min_version` is newer than the running server.
    ///
    /// # Errors
    /// Propagates connection and execution errors.
    pub async fn set_sql_mode(
        &mut self,
        action: SqlModeAction,
        modes: &[&str],
        min_version: Option<&str>,
    ) -> Result<bool, StewardError> {
        let version = self.server_version().await?;
        let directive = SqlModeDirective {
            action,
            modes: modes.iter().map(|m| (*m).to_string()).collect(),
            min_version: min_version.map(str::to_string),
        };
        let client = self.handle().await?;
        sqlmode::apply_directive(client, &version, &directive).await
    }

    /// Open a transaction.
    ///
    /// # Errors
    /// Propagates execution errors; the transaction flag is only set on
    /// success.
    pub async fn begin(&mut self) -> Result<(), StewardError> {
        let stmt = Statement::new("START TRANSACTION");
        self.execute(&stmt, &[]).await?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// # Errors
    /// Propagates execution errors.
    pub async fn commit(&mut self) -> Result<(), StewardError> {
        let stmt = Statement::new("COMMIT");
        self.execute(&stmt, &[]).await?;
        self.in_transaction = false;
        Ok(())
    }

    /// Roll back the open transaction.
    ///
    /// # Errors
    /// Propagates execution errors.
    pub async fn rollback(&mut self) -> Result<(), StewardError> {
        let stmt = Statement::new("ROLLBACK");
        self.execute(&stmt, &[]).await?;
        self.in_transaction = false;
        Ok(())
    }

    /// Whether a transaction opened through this manager is pending.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Quote a string value under this session's 4-byte-unicode policy.
    #[must_use]
    pub fn quote(&self, value: &str) -> String {
        sanitize::quote(value, self.strip_four_byte)
    }

    /// Escape a string value (no surrounding quotes) under this session's
    /// 4-byte-unicode policy.
    #[must_use]
    pub fn escape_string(&self, value: &str) -> String {
        sanitize::escape_string(value, self.strip_four_byte)
    }

    /// The diagnostics query log.
    #[must_use]
    pub fn query_log(&self) -> &QueryLog {
        &self.diagnostics
    }

    /// The most recent statement failure, whether it was propagated or
    /// recorded as a warning. Cleared by the next successful statement.
    #[must_use]
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }
}
