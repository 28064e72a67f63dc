//! Convenient imports for common functionality.

pub use crate::cache::DurableCache;
pub use crate::client::{Connector, SqlClient, Statement};
pub use crate::config::ConnectConfig;
pub use crate::diagnostics::QueryLog;
pub use crate::error::{LastError, StewardError};
pub use crate::executor::{DEFAULT_MAX_ATTEMPTS, ErrorMode};
pub use crate::manager::ConnectionManager;
pub use crate::metadata::StorageEngine;
pub use crate::results::{ResultSet, Row};
pub use crate::sanitize::{
    escape_identifier, escape_like_pattern, escape_qualified_identifier, escape_string,
    is_comparison_operator, quote,
};
pub use crate::sqlmode::{SqlModeAction, SqlModeDirective, version_compare};
pub use crate::types::SqlValue;

#[cfg(feature = "mysql")]
pub use crate::mysql::{MysqlClient, MysqlConnector};
