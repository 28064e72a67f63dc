use std::sync::Arc;

use crate::types::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Create a row from shared column names and its values.
    #[must_use]
    pub fn new(columns: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// The column names for this row.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get a value by column name, or `None` if the column does not exist.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.values.get(index)
    }

    /// Get a value by column index, or `None` if out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// The values of this row, in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Result of a query: the returned rows plus the affected-row count reported
/// by the server (meaningful for DML statements).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query.
    pub rows: Vec<Row>,
    /// Number of rows affected, as reported by the server.
    pub rows_affected: u64,
    columns: Option<Arc<Vec<String>>>,
}

impl ResultSet {
    /// Build a result set from plain column names and row values.
    #[must_use]
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        let shared = Arc::new(columns);
        let rows_affected = rows.len() as u64;
        let rows = rows
            .into_iter()
            .map(|values| Row::new(shared.clone(), values))
            .collect();
        Self {
            rows,
            rows_affected,
            columns: Some(shared),
        }
    }

    /// The shared column names, if any row has been added.
    #[must_use]
    pub fn columns(&self) -> Option<&Arc<Vec<String>>> {
        self.columns.as_ref()
    }

    /// First value of the first row, the common shape for `SELECT @@var`
    /// style lookups.
    #[must_use]
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.get_by_index(0))
    }
}
