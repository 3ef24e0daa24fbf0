//! Execution feedback
//!
//! Resolves a query, executes the result and feeds failures back into the
//! next attempt:
//!
//! ```text
//! WorkingQuery → Resolver → SafetyGate → Executor → rows / ack
//!       ↑            │                      │
//!       └── annotate ┴──────────────────────┘
//! ```

pub mod annotation;
pub mod correction_loop;

pub use annotation::WorkingQuery;
pub use correction_loop::{
    AttemptFailure, AttemptRecord, CommandOutcome, CorrectionConfig, CorrectionLoop, MAX_RETRIES,
};
