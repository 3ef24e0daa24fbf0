//! SQL execution seam
//!
//! The core never talks to a database directly. An [`SqlExecutor`] runs one
//! statement and reports the result as data: rows, a mutation acknowledgement,
//! or an [`ExecutionFailure`] carrying the database's own error text.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Ordered result rows. Column order is the statement's result column order.
///
/// Executors may learn column names from the returned rows, so an empty
/// result can carry no columns. Callers check [`RowSet::is_empty`] before
/// relying on the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with `null`, long rows truncated.
    pub fn push_row(&mut self, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Null);
        self.rows.push(values);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `index` as (column, value) pairs in column order.
    pub fn row_map(&self, index: usize) -> Option<Vec<(&str, &Value)>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect(),
        )
    }

    /// Value of `column` in row `index`.
    pub fn get(&self, index: usize, column: &str) -> Option<&Value> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.rows.get(index)?.get(position)
    }
}

/// Successful execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutput {
    /// A read statement and the rows it returned
    Rows(RowSet),
    /// A committed mutating statement
    Applied { rows_affected: u64 },
}

/// The database rejected or could not run a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionFailure {
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of running one statement. Failures are values, never raised.
pub type ExecutionOutcome = Result<QueryOutput, ExecutionFailure>;

/// Runs statements against the target database.
///
/// Implementations wrap every statement in its own transaction: read
/// statements are never committed, mutating statements are committed only
/// when they succeed.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> ExecutionOutcome;
}
