use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// MySQL error code for an unknown column in a statement (`ER_BAD_FIELD_ERROR`).
pub const ER_BAD_FIELD_ERROR: u16 = 1054;

/// Client-side error code for "MySQL server has gone away" (`CR_SERVER_GONE_ERROR`).
pub const CR_SERVER_GONE_ERROR: u16 = 2006;

/// Client-side error code for "Lost connection to MySQL server during query"
/// (`CR_SERVER_LOST`).
pub const CR_SERVER_LOST: u16 = 2013;

static UNKNOWN_COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[Uu]nknown column '([^']+)'").expect("static regex is valid")
});

/// Errors surfaced by the session layer.
#[derive(Debug, Error)]
pub enum StewardError {
    /// An error bubbled up from the underlying driver that carries no usable
    /// server error code (protocol, URL, or internal driver failures).
    #[cfg(feature = "mysql")]
    #[error(transparent)]
    Driver(#[from] mysql_async::Error),

    /// An error reported by the server, with its numeric error code.
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL execution error: {0}")]
    Execution(String),
}

impl StewardError {
    /// The server-reported error code, when one is available.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            StewardError::Server { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this error indicates the server connection was dropped and a
    /// reconnect is worth attempting.
    ///
    /// Matches the "gone away" / "lost connection" class of failures: the
    /// dedicated client error codes, the well-known message texts, and any
    /// transport-level connection error.
    #[must_use]
    pub fn is_connection_dropped(&self) -> bool {
        match self {
            StewardError::Connection(_) => true,
            StewardError::Server { code, message } => {
                if matches!(*code, CR_SERVER_GONE_ERROR | CR_SERVER_LOST) {
                    return true;
                }
                let text = message.to_ascii_lowercase();
                text.contains("server has gone away") || text.contains("lost connection")
            }
            #[cfg(feature = "mysql")]
            StewardError::Driver(err) => matches!(err, mysql_async::Error::Io(_)),
            _ => false,
        }
    }

    /// For an unknown-column server error, the offending `(table, column)`
    /// parsed from the error detail. The table part is empty when the server
    /// reported a bare column name.
    #[must_use]
    pub fn unknown_column_target(&self) -> Option<(String, String)> {
        let StewardError::Server { code, message } = self else {
            return None;
        };
        if *code != ER_BAD_FIELD_ERROR {
            return None;
        }
        let token = UNKNOWN_COLUMN_RE.captures(message)?.get(1)?.as_str();
        match token.split_once('.') {
            Some((table, column)) => Some((table.to_string(), column.to_string())),
            None => Some((String::new(), token.to_string())),
        }
    }
}

/// Snapshot of the most recent statement failure, kept for introspection after
/// the error value itself has been propagated or suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    /// Server error code, when the failure carried one.
    pub code: Option<u16>,
    /// Rendered error message.
    pub message: String,
}

impl From<&StewardError> for LastError {
    fn from(err: &StewardError) -> Self {
        LastError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
