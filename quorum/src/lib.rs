//! Quorum: natural-language to SQL by oracle consensus
//!
//! This library provides:
//! - A polymorphic set of text-generation oracles (OpenAI, Cohere, Gemini)
//! - Consensus strategies that turn their candidate translations into one statement
//! - A pre-check gate, a safety gate and a retry-execution loop that feeds
//!   database errors back into the next attempt
//! - A cached snapshot of the target schema embedded in every prompt
//!
//! # Modes
//!
//! - `base`: round-robin cross-voting, most accurate
//! - `fast`: peers vet the primary oracle's translation
//! - `simple`: primary oracle only, no pre-check
//!
//! # Usage
//!
//! ```ignore
//! let panel = OraclePanel::new(gpt, [cohere, gemini]);
//! let engine = Engine::new(panel, executor);
//! let session = Session::new(schema, ConsensusMode::Fast);
//! let outcome = engine.handle(&session, "show all tables", &AutoDeny).await;
//! ```

pub mod engine;
pub mod ensemble;
pub mod executor;
pub mod feedback;
pub mod operator;
pub mod oracle;
pub mod precheck;
pub mod prompts;
pub mod safety;
pub mod schema;
pub mod session;
pub mod sql;

#[cfg(test)]
mod test_support;

pub use engine::Engine;
pub use ensemble::{ConsensusMode, OraclePanel, Resolution, Resolver};
pub use executor::{ExecutionFailure, ExecutionOutcome, QueryOutput, RowSet, SqlExecutor};
pub use feedback::{AttemptFailure, AttemptRecord, CommandOutcome, CorrectionConfig, MAX_RETRIES};
pub use operator::{AutoApprove, AutoDeny, Confirmation, LoopEvent, Operator};
pub use oracle::{Oracle, OracleAdapter, OracleError, Verdict};
pub use prompts::PromptBuilder;
pub use schema::{SchemaCache, SchemaDescription, SchemaError, SchemaIntrospector};
pub use session::{Command, Session};
