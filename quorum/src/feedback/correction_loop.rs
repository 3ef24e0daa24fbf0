//! Retry-execution loop
//!
//! Each attempt resolves the working query, passes the safety gate and
//! executes the statement. Consensus and execution failures are appended to
//! the working query; oracle failures simply retry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::annotation::WorkingQuery;
use crate::ensemble::{ConsensusMode, Resolution, Resolver};
use crate::executor::{QueryOutput, SqlExecutor};
use crate::operator::{LoopEvent, Operator};
use crate::safety;
use crate::sql::strip_code_fences;

/// Retries allowed after the first attempt.
pub const MAX_RETRIES: u32 = 2;

/// Configuration for the correction loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
        }
    }
}

impl CorrectionConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Why an attempt did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AttemptFailure {
    /// The oracles needed for the round produced nothing
    Oracle,
    /// Candidates existed but none was accepted
    Consensus { reason: String },
    /// The database rejected the statement
    Execution { error: String },
    /// The operator declined the safety confirmation
    Declined,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oracle => write!(f, "no usable translation from the oracles"),
            Self::Consensus { reason } => write!(f, "no consensus: {reason}"),
            Self::Execution { error } => write!(f, "execution failed: {error}"),
            Self::Declined => write!(f, "declined by the operator"),
        }
    }
}

/// Result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt number (1-indexed)
    pub number: u32,
    /// Timestamp of attempt
    pub started_at: DateTime<Utc>,
    /// Statement chosen by the round, if any
    pub sql: Option<String>,
    /// `None` when the attempt succeeded
    pub failure: Option<AttemptFailure>,
}

/// Final outcome of one operator command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Succeeded {
        sql: String,
        output: QueryOutput,
        attempts: Vec<AttemptRecord>,
    },
    /// The operator declined the safety confirmation for `sql`
    Declined {
        sql: String,
        attempts: Vec<AttemptRecord>,
    },
    /// The pre-check rejected the input and the operator did not force it
    Dismissed { reason: String },
    /// Every attempt failed
    Exhausted { attempts: Vec<AttemptRecord> },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Declined { attempts, .. }
            | Self::Exhausted { attempts } => attempts,
            Self::Dismissed { .. } => &[],
        }
    }
}

/// The correction loop controller
pub struct CorrectionLoop<'a> {
    resolver: Resolver<'a>,
    executor: &'a dyn SqlExecutor,
    config: CorrectionConfig,
}

impl<'a> CorrectionLoop<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        executor: &'a dyn SqlExecutor,
        config: CorrectionConfig,
    ) -> Self {
        Self {
            resolver,
            executor,
            config,
        }
    }

    pub async fn run(
        &self,
        mode: ConsensusMode,
        query: &str,
        operator: &dyn Operator,
    ) -> CommandOutcome {
        let max_attempts = self.config.max_attempts();
        let mut working = WorkingQuery::new(query);
        let mut attempts = Vec::new();

        for number in 1..=max_attempts {
            let started_at = Utc::now();
            info!(attempt = number, max_attempts, mode = %mode, "Resolving query");

            let (sql, failure) = match self.resolver.resolve(mode, working.as_str()).await {
                Resolution::OracleFailure => (None, AttemptFailure::Oracle),
                Resolution::ConsensusFailure(reason) => {
                    (None, AttemptFailure::Consensus { reason })
                }
                Resolution::Resolved(raw) => {
                    let sql = strip_code_fences(&raw);
                    if !safety::allows_execution(&sql, operator) {
                        info!(sql = %sql, "Execution declined by operator");
                        attempts.push(AttemptRecord {
                            number,
                            started_at,
                            sql: Some(sql.clone()),
                            failure: Some(AttemptFailure::Declined),
                        });
                        return CommandOutcome::Declined { sql, attempts };
                    }

                    match self.executor.execute(&sql).await {
                        Ok(output) => {
                            info!(attempt = number, sql = %sql, "Statement executed");
                            attempts.push(AttemptRecord {
                                number,
                                started_at,
                                sql: Some(sql.clone()),
                                failure: None,
                            });
                            return CommandOutcome::Succeeded {
                                sql,
                                output,
                                attempts,
                            };
                        }
                        Err(e) => (
                            Some(sql),
                            AttemptFailure::Execution {
                                error: e.message,
                            },
                        ),
                    }
                }
            };

            warn!(attempt = number, failure = %failure, "Attempt failed");
            working.annotate(&failure, sql.as_deref());
            if number < max_attempts {
                operator.notify(&LoopEvent::AttemptFailed {
                    attempt: number,
                    max_attempts,
                    reason: &failure.to_string(),
                });
            }
            attempts.push(AttemptRecord {
                number,
                started_at,
                sql,
                failure: Some(failure),
            });
        }

        warn!(query = working.original(), attempts = attempts.len(), "All attempts failed");
        CommandOutcome::Exhausted { attempts }
    }
}
