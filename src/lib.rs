//! Resilient MySQL session layer for content-management applications.
//!
//! The crate wraps a single logical database connection and takes care of the
//! unglamorous parts of talking to MySQL/MariaDB from a long-lived process:
//!
//! - **Connection management**: the handle is created lazily and
//!   re-initialized (charset, init command, SQL-mode directives) after every
//!   reconnect.
//! - **Bounded retry**: statements that fail with a "server has gone away"
//!   class error force a reconnect and are retried a fixed number of times;
//!   schema-drift errors fire a notification hook; everything else fails
//!   fast.
//! - **Sanitization**: pure helpers for identifier escaping, literal
//!   quoting, `LIKE` pattern escaping, and operator validation.
//! - **Diagnostics**: a bounded in-memory query log with overflow
//!   accounting.
//! - **Metadata caches**: memoized table list, stopword set, and engine
//!   variable lookups with explicit cache bypass.
//!
//! ```rust,no_run
//! use sql_steward::prelude::*;
//!
//! # async fn demo() -> Result<(), StewardError> {
//! let config = ConnectConfig::new("cms", "editor", "secret")
//!     .with_host("127.0.0.1")
//!     .with_diagnostics(true);
//! let mut db = ConnectionManager::new(MysqlConnector, config);
//!
//! let stmt = db
//!     .prepare("SELECT id, title FROM posts WHERE status = ?")
//!     .with_note("front page");
//! let rows = db.query(&stmt, &[SqlValue::Text("published".into())]).await?;
//! for row in &rows.rows {
//!     println!("{:?}", row.get("title"));
//! }
//! # Ok(()) }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod manager;
pub mod metadata;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod prelude;
pub mod results;
pub mod sanitize;
pub mod sqlmode;
pub mod types;

pub use cache::{DurableCache, STOPWORD_CACHE_KEY, STOPWORD_CACHE_TTL};
pub use client::{Connector, SqlClient, Statement};
pub use config::ConnectConfig;
pub use diagnostics::QueryLog;
pub use error::{LastError, StewardError};
pub use executor::{DEFAULT_MAX_ATTEMPTS, ErrorMode};
pub use manager::ConnectionManager;
pub use metadata::StorageEngine;
#[cfg(feature = "mysql")]
pub use mysql::{MysqlClient, MysqlConnector};
pub use results::{ResultSet, Row};
pub use sqlmode::{SqlModeAction, SqlModeDirective, version_compare};
pub use types::SqlValue;
