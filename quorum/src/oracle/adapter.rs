//! Uniform translate/vote contract over any [`Oracle`].
//!
//! Nothing raised by a backend crosses this boundary: every transport,
//! timeout or parse problem is logged and turned into `None`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{parse_verdicts, Oracle, OracleError, Verdict};
use crate::prompts::PromptBuilder;

/// Per-call deadline applied on top of the backend's own HTTP timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// An oracle wrapped with the translate/vote contract.
#[derive(Clone)]
pub struct OracleAdapter {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl OracleAdapter {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        self.oracle.id()
    }

    /// Raw completion with the per-call deadline applied.
    pub async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        match tokio::time::timeout(self.timeout, self.oracle.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        }
    }

    /// Translate a natural-language query into one SQL statement.
    ///
    /// `None` means the oracle failed; it never means "empty SQL".
    pub async fn translate(&self, prompts: &PromptBuilder, query: &str) -> Option<String> {
        let result = self.complete(&prompts.translate(query)).await.and_then(|text| {
            let sql = text.trim();
            if sql.is_empty() {
                Err(OracleError::EmptyCompletion)
            } else {
                Ok(sql.to_string())
            }
        });

        match result {
            Ok(sql) => {
                debug!(oracle = self.id(), sql = %sql, "Translation received");
                Some(sql)
            }
            Err(e) => {
                warn!(oracle = self.id(), error = %e, "Translation failed");
                None
            }
        }
    }

    /// Judge two candidates at once.
    ///
    /// `None` (no verdict at all) when the call fails or the response is not
    /// exactly two yes/no tokens.
    pub async fn vote(
        &self,
        prompts: &PromptBuilder,
        query: &str,
        sql_a: Option<&str>,
        sql_b: Option<&str>,
    ) -> Option<(Verdict, Verdict)> {
        let result = self
            .complete(&prompts.vote(query, sql_a, sql_b))
            .await
            .and_then(|raw| parse_verdicts(&raw));

        match result {
            Ok(verdicts) => {
                debug!(
                    oracle = self.id(),
                    first = %verdicts.0,
                    second = %verdicts.1,
                    "Vote received"
                );
                Some(verdicts)
            }
            Err(e) => {
                warn!(oracle = self.id(), error = %e, "Vote discarded");
                None
            }
        }
    }
}

impl std::fmt::Debug for OracleAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleAdapter")
            .field("oracle", &self.id())
            .field("timeout", &self.timeout)
            .finish()
    }
}
