//! Text-generation oracles
//!
//! Every backend implements the single [`Oracle`] capability: turn a prompt
//! into a completion or fail. Translation and voting are layered on top by
//! [`OracleAdapter`], so a new backend never has to know about SQL, votes or
//! consensus.
//!
//! ```text
//!   GptOracle ─┐
//! CohereOracle ─┼─► OracleAdapter ─► translate() / vote() / complete()
//! GeminiOracle ─┘      (timeout, failure containment, logging)
//! ```

pub mod adapter;
pub mod providers;
pub mod verdict;

pub use adapter::{OracleAdapter, DEFAULT_CALL_TIMEOUT};
pub use providers::{CohereOracle, GeminiOracle, GptOracle};
pub use verdict::{parse_verdicts, Verdict};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Stable identifier of an oracle (e.g. `"gpt"`), used as the tally key.
pub type OracleId = String;

/// Errors from a single backend call
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("{backend} API error ({status}): {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("API key not configured for {0}")]
    MissingApiKey(String),

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("No completion within {0:?}")]
    Timeout(Duration),

    #[error("Empty completion")]
    EmptyCompletion,

    #[error("Unexpected vote format: {0:?}")]
    MalformedVote(String),
}

/// A text-generation backend.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Identifier used in logs and vote tallies
    fn id(&self) -> &str;

    /// Return the completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}
