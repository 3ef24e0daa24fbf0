//! Ensemble consensus
//!
//! Combines the candidate translations of every oracle on the panel into a
//! single statement.
//!
//! ```text
//!            ┌──────────── OraclePanel ────────────┐
//!            │  primary        peer        peer    │
//!            └─────┬─────────────┬──────────┬──────┘
//!                  ▼             ▼          ▼
//!             candidates (translated concurrently)
//!                  │
//!      ┌───────────┼──────────────┐
//!      ▼           ▼              ▼
//!   simple       fast           base
//!  (primary    (peers vet     (round-robin
//!   verbatim)   primary)       cross-votes)
//!      └───────────┴──────┬───────┘
//!                         ▼
//!                     Resolution
//! ```
//!
//! # Strategies
//!
//! - **simple**: the primary oracle's translation, no voting.
//! - **fast**: every peer judges the primary candidate against its own; one
//!   "yes" for the primary is enough.
//! - **base**: every oracle judges the pairs of candidates it did not write;
//!   the candidate with most "yes" votes wins, ties go to the primary.

pub mod panel;
pub mod resolver;
pub mod voting;

pub use panel::{Candidate, OraclePanel};
pub use resolver::{Resolution, Resolver};
pub use voting::{Judgment, VoteTally};

use serde::{Deserialize, Serialize};

/// Consensus strategy selected by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusMode {
    /// Full round-robin voting (most accurate, slowest)
    Base,
    /// Peers vet the primary oracle's candidate
    Fast,
    /// Primary oracle only
    Simple,
}

impl ConsensusMode {
    pub const ALL: [ConsensusMode; 3] = [Self::Base, Self::Fast, Self::Simple];

    /// Parse a mode switch token: `1`/`base`, `2`/`fast`, `3`/`simple`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "1" | "base" => Some(Self::Base),
            "2" | "fast" => Some(Self::Fast),
            "3" | "simple" => Some(Self::Simple),
            _ => None,
        }
    }

    /// Menu number used by the interactive shell
    pub fn menu_number(&self) -> u8 {
        match self {
            Self::Base => 1,
            Self::Fast => 2,
            Self::Simple => 3,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Base => "Base voting (high accuracy, slower)",
            Self::Fast => "Fast voting (faster, primary-oracle prioritized)",
            Self::Simple => "Simple (primary oracle only)",
        }
    }

    /// Whether commands in this mode are screened by the pre-check
    pub fn uses_precheck(&self) -> bool {
        !matches!(self, Self::Simple)
    }
}

impl std::fmt::Display for ConsensusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Fast => write!(f, "fast"),
            Self::Simple => write!(f, "simple"),
        }
    }
}

impl std::str::FromStr for ConsensusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| format!("unknown consensus mode: {s}"))
    }
}
