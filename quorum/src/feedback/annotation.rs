//! The per-command working query.
//!
//! Every failed attempt appends one `# ERROR last time:` line; the original
//! text is kept for logging and is what the next command starts from.

use super::correction_loop::AttemptFailure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingQuery {
    original: String,
    current: String,
}

impl WorkingQuery {
    pub fn new(query: impl Into<String>) -> Self {
        let original = query.into();
        Self {
            current: original.clone(),
            original,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Text sent to the oracles on the next attempt.
    pub fn as_str(&self) -> &str {
        &self.current
    }

    pub fn is_annotated(&self) -> bool {
        self.current.len() != self.original.len()
    }

    /// Append the feedback line for `failure`. Oracle failures and declined
    /// attempts add nothing.
    pub fn annotate(&mut self, failure: &AttemptFailure, sql: Option<&str>) {
        match failure {
            AttemptFailure::Oracle | AttemptFailure::Declined => {}
            AttemptFailure::Consensus { reason } => {
                self.current.push_str(&format!(
                    "\n# ERROR last time: {reason} try to figure it out and generate a new sql"
                ));
            }
            AttemptFailure::Execution { error } => {
                self.current.push_str(&format!(
                    "\n# ERROR last time: {error} SQL last time: {} try to figure it out and generate a new sql",
                    sql.unwrap_or_default()
                ));
            }
        }
    }
}

impl std::fmt::Display for WorkingQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.current)
    }
}
