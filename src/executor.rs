//! The retrying executor: bounded retry on reconnect-worthy errors, a hook
//! for schema-drift errors, and strict control over when a terminal error is
//! surfaced.

use tracing::{debug, warn};

use crate::client::{Connector, SqlClient, Statement};
use crate::error::{LastError, StewardError};
use crate::manager::ConnectionManager;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Default retry budget: total attempts per statement.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// What to do with a terminal statement error.
///
/// Mid-retry errors are always suppressed so the loop can continue; this mode
/// only governs the error that survives the retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Propagate the terminal error to the caller.
    Propagate,
    /// Record the terminal error as a retrievable warning and report failure
    /// through the return value instead.
    Record,
}

enum StatementKind {
    Query,
    Execute,
}

enum StatementOutput {
    Rows(ResultSet),
    Affected(u64),
}

impl<C: Connector> ConnectionManager<C> {
    /// Execute a statement with the default retry budget, propagating the
    /// terminal error.
    ///
    /// # Errors
    /// Returns the terminal error once the retry budget is exhausted, or
    /// immediately for errors that do not warrant a reconnect.
    pub async fn execute(
        &mut self,
        stmt: &Statement,
        params: &[SqlValue],
    ) -> Result<u64, StewardError> {
        match self
            .execute_with(stmt, params, ErrorMode::Propagate, DEFAULT_MAX_ATTEMPTS)
            .await?
        {
            Some(affected) => Ok(affected),
            None => Err(StewardError::Execution(
                "statement failed without a terminal error".to_string(),
            )),
        }
    }

    /// Execute a statement under an explicit error mode and retry budget.
    ///
    /// Returns `Ok(Some(affected_rows))` on success and `Ok(None)` when the
    /// statement failed but `ErrorMode::Record` asked for the error to be
    /// recorded instead of propagated.
    ///
    /// # Errors
    /// In `ErrorMode::Propagate`, the terminal error.
    pub async fn execute_with(
        &mut self,
        stmt: &Statement,
        params: &[SqlValue],
        mode: ErrorMode,
        max_attempts: u32,
    ) -> Result<Option<u64>, StewardError> {
        match self
            .run_retrying(stmt, params, StatementKind::Execute, mode, max_attempts)
            .await?
        {
            Some(StatementOutput::Affected(affected)) => Ok(Some(affected)),
            Some(StatementOutput::Rows(set)) => Ok(Some(set.rows_affected)),
            None => Ok(None),
        }
    }

    /// Run a query with the default retry budget, propagating the terminal
    /// error.
    ///
    /// # Errors
    /// Same policy as [`execute`](ConnectionManager::execute).
    pub async fn query(
        &mut self,
        stmt: &Statement,
        params: &[SqlValue],
    ) -> Result<ResultSet, StewardError> {
        match self
            .query_with(stmt, params, ErrorMode::Propagate, DEFAULT_MAX_ATTEMPTS)
            .await?
        {
            Some(set) => Ok(set),
            None => Err(StewardError::Execution(
                "query failed without a terminal error".to_string(),
            )),
        }
    }

    /// Run a query under an explicit error mode and retry budget; `Ok(None)`
    /// means the failure was recorded per `ErrorMode::Record`.
    ///
    /// # Errors
    /// In `ErrorMode::Propagate`, the terminal error.
    pub async fn query_with(
        &mut self,
        stmt: &Statement,
        params: &[SqlValue],
        mode: ErrorMode,
        max_attempts: u32,
    ) -> Result<Option<ResultSet>, StewardError> {
        match self
            .run_retrying(stmt, params, StatementKind::Query, mode, max_attempts)
            .await?
        {
            Some(StatementOutput::Rows(set)) => Ok(Some(set)),
            Some(StatementOutput::Affected(_)) => Ok(Some(ResultSet::default())),
            None => Ok(None),
        }
    }

    /// Convenience wrapper: prepare and execute a parameterless statement.
    ///
    /// # Errors
    /// Same policy as [`execute`](ConnectionManager::execute).
    pub async fn exec(&mut self, sql: &str) -> Result<u64, StewardError> {
        let stmt = Statement::new(sql);
        self.execute(&stmt, &[]).await
    }

    /// The retry loop.
    ///
    /// Sequencing is deliberate: while attempts remain, a reconnect-worthy
    /// failure closes the handle and loops, suppressing the error regardless
    /// of the caller's mode. Only the terminal failure honors the mode. An
    /// unknown-column error fires the notification hook and is terminal on
    /// its own, never retried. Connect failures inside the loop are
    /// configuration-class and propagate immediately.
    async fn run_retrying(
        &mut self,
        stmt: &Statement,
        params: &[SqlValue],
        kind: StatementKind,
        mode: ErrorMode,
        max_attempts: u32,
    ) -> Result<Option<StatementOutput>, StewardError> {
        let mut remaining = max_attempts.max(1);
        loop {
            self.diagnostics.record(&stmt.sql, stmt.note.as_deref());
            let attempt = {
                let client = self.handle().await?;
                match kind {
                    StatementKind::Query => client
                        .query(&stmt.sql, params)
                        .await
                        .map(StatementOutput::Rows),
                    StatementKind::Execute => client
                        .execute(&stmt.sql, params)
                        .await
                        .map(StatementOutput::Affected),
                }
            };

            let err = match attempt {
                Ok(output) => {
                    self.last_error = None;
                    return Ok(Some(output));
                }
                Err(err) => err,
            };
            remaining -= 1;

            if let Some((table, column)) = err.unknown_column_target() {
                debug!(table, column, "server reported unknown column");
                if let Some(hook) = &self.unknown_column_hook {
                    hook(&table, &column);
                }
                return self.terminal(err, mode);
            }

            if err.is_connection_dropped() && remaining > 0 {
                warn!(
                    remaining,
                    error = %err,
                    "connection lost during statement, reconnecting"
                );
                self.close();
                continue;
            }

            return self.terminal(err, mode);
        }
    }

    fn terminal(
        &mut self,
        err: StewardError,
        mode: ErrorMode,
    ) -> Result<Option<StatementOutput>, StewardError> {
        self.last_error = Some(LastError::from(&err));
        match mode {
            ErrorMode::Propagate => Err(err),
            ErrorMode::Record => {
                warn!(error = %err, "statement failed, error recorded");
                Ok(None)
            }
        }
    }
}
