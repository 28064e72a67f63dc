//! Typed connection configuration.
//!
//! Immutable after construction; the manager re-reads it on every
//! (re)connect, so one config describes the session for the lifetime of the
//! manager.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sqlmode::{SqlModeAction, SqlModeDirective};

/// Default capacity of the diagnostics query log.
pub const DEFAULT_MAX_LOGGED_QUERIES: usize = 500;

/// Connection configuration for the session layer.
///
/// ```rust
/// use sql_steward::ConnectConfig;
///
/// let config = ConnectConfig::new("cms", "editor", "secret")
///     .with_host("db.internal")
///     .with_charset("utf8mb4")
///     .with_diagnostics(true);
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Server hostname or IP.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
    /// Unix socket path; preferred over TCP when set.
    pub socket: Option<String>,
    /// Database (schema) name.
    pub dbname: String,
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
    /// Connection character set, applied via `SET NAMES` after connect.
    pub charset: String,
    /// Optional collation for `SET NAMES ... COLLATE`.
    pub collation: Option<String>,
    /// Statement executed once per (re)connect, before anything else the
    /// caller issues.
    pub init_command: Option<String>,
    /// Extra driver options, passed through to the driver adapter by name.
    pub driver_options: HashMap<String, String>,
    /// Enables the diagnostics query log.
    pub diagnostics: bool,
    /// Capacity of the diagnostics query log before entries collapse into an
    /// aggregate overflow counter.
    pub max_logged_queries: usize,
    /// SQL-mode directives applied during session initialization, each gated
    /// on a minimum server version.
    pub sql_mode_directives: Vec<SqlModeDirective>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            socket: None,
            dbname: String::new(),
            user: String::new(),
            password: String::new(),
            charset: "utf8mb4".to_string(),
            collation: None,
            init_command: None,
            driver_options: HashMap::new(),
            diagnostics: false,
            max_logged_queries: DEFAULT_MAX_LOGGED_QUERIES,
            sql_mode_directives: default_sql_mode_directives(),
        }
    }
}

/// Modes that break the host application's legacy schema assumptions; removed
/// from the session on servers that enable them by default.
fn default_sql_mode_directives() -> Vec<SqlModeDirective> {
    vec![SqlModeDirective {
        action: SqlModeAction::Remove,
        modes: vec![
            "NO_ZERO_DATE".to_string(),
            "NO_ZERO_IN_DATE".to_string(),
            "ONLY_FULL_GROUP_BY".to_string(),
            "STRICT_TRANS_TABLES".to_string(),
            "STRICT_ALL_TABLES".to_string(),
            "TRADITIONAL".to_string(),
            "ANSI".to_string(),
        ],
        min_version: Some("5.7.0".to_string()),
    }]
}

impl ConnectConfig {
    /// Create a config for the given database with all other fields at their
    /// defaults.
    #[must_use]
    pub fn new(
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    #[must_use]
    pub fn with_init_command(mut self, command: impl Into<String>) -> Self {
        self.init_command = Some(command.into());
        self
    }

    #[must_use]
    pub fn with_driver_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.driver_options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    #[must_use]
    pub fn with_max_logged_queries(mut self, max: usize) -> Self {
        self.max_logged_queries = max;
        self
    }

    #[must_use]
    pub fn with_sql_mode_directives(mut self, directives: Vec<SqlModeDirective>) -> Self {
        self.sql_mode_directives = directives;
        self
    }

    /// Whether the 4-byte-unicode stripping policy is active for this
    /// session. Only `utf8mb4` (and raw `binary`) connections can store
    /// supplementary-plane characters; everything else gets them stripped
    /// before quoting.
    #[must_use]
    pub fn strip_four_byte(&self) -> bool {
        let charset = self.charset.to_ascii_lowercase();
        !(charset == "utf8mb4" || charset == "binary")
    }
}
