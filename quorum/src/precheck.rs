//! Plausibility pre-check
//!
//! One oracle is asked whether the input is a database request at all. The
//! prompt is lenient; anything that is not an explicit `True` fails closed and
//! is left to the operator to override.

use tracing::{debug, warn};

use crate::oracle::OracleAdapter;
use crate::prompts::PromptBuilder;

/// Classifier outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plausibility {
    Plausible,
    Implausible { reason: String },
}

impl Plausibility {
    pub fn is_plausible(&self) -> bool {
        matches!(self, Self::Plausible)
    }

    /// Interpret a raw classifier answer.
    pub fn from_answer(answer: &str) -> Self {
        let answer = answer.trim();
        if answer.starts_with("True") {
            return Self::Plausible;
        }

        let remainder = answer
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .filter(|rest| !rest.is_empty());

        let reason = if answer.starts_with("False") {
            match remainder {
                Some(r) if matches!(r.to_ascii_lowercase().as_str(), "<reason>" | "reason") => {
                    "input is invalid".to_string()
                }
                Some(r) => r.to_string(),
                None => "unknown reason".to_string(),
            }
        } else {
            format!("unexpected classifier answer: {answer:?}")
        };

        Self::Implausible { reason }
    }
}

/// Ask `oracle` whether `query` is plausibly a database request.
pub async fn check(oracle: &OracleAdapter, prompts: &PromptBuilder, query: &str) -> Plausibility {
    match oracle.complete(&prompts.precheck(query)).await {
        Ok(answer) => {
            let verdict = Plausibility::from_answer(&answer);
            match &verdict {
                Plausibility::Plausible => debug!(oracle = oracle.id(), "Input accepted"),
                Plausibility::Implausible { reason } => {
                    warn!(oracle = oracle.id(), reason = %reason, "Input rejected by pre-check")
                }
            }
            verdict
        }
        Err(e) => {
            warn!(oracle = oracle.id(), error = %e, "Pre-check unavailable");
            Plausibility::Implausible {
                reason: format!("validation failed: {e}"),
            }
        }
    }
}
