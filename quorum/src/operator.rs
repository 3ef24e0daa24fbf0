//! Operator capability
//!
//! The core asks the operator synchronously before anything it is not
//! allowed to decide alone. Interactive shells prompt a human; embeddings
//! pick a policy such as [`AutoDeny`].

/// A decision the core needs from the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation<'a> {
    /// A `select` with no `where`, `group by` or `limit`
    UnfilteredScan { sql: &'a str },
    /// The pre-check judged the input not to be a database request
    ForceAfterPrecheck { reason: &'a str },
}

/// Progress the core reports while handling a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent<'a> {
    /// The pre-check rejected the input
    PrecheckRejected { reason: &'a str },
    /// An attempt failed and another one follows
    AttemptFailed {
        attempt: u32,
        max_attempts: u32,
        reason: &'a str,
    },
}

/// Confirmation and progress sink supplied by the embedding.
pub trait Operator: Send + Sync {
    /// `true` to proceed, `false` to abort the current command.
    fn confirm(&self, request: &Confirmation<'_>) -> bool;

    fn notify(&self, _event: &LoopEvent<'_>) {}
}

/// Approves every confirmation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Operator for AutoApprove {
    fn confirm(&self, _request: &Confirmation<'_>) -> bool {
        true
    }
}

/// Declines every confirmation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDeny;

impl Operator for AutoDeny {
    fn confirm(&self, _request: &Confirmation<'_>) -> bool {
        false
    }
}
