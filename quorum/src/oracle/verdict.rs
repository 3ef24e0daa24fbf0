//! Vote verdicts and the strict parser for vote responses.

use serde::{Deserialize, Serialize};

use super::OracleError;

/// A judge's opinion of one candidate statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Yes,
    No,
}

impl Verdict {
    /// Parse a single `yes`/`no` token, ignoring case.
    pub fn parse_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("yes") {
            Some(Self::Yes)
        } else if token.eq_ignore_ascii_case("no") {
            Some(Self::No)
        } else {
            None
        }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// Parse a raw vote response into a verdict pair.
///
/// Exactly two whitespace-separated tokens, each `yes` or `no`. Anything else
/// is rejected as a whole; no partial verdict is ever guessed.
pub fn parse_verdicts(raw: &str) -> Result<(Verdict, Verdict), OracleError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    match tokens.as_slice() {
        [first, second] => match (Verdict::parse_token(first), Verdict::parse_token(second)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(OracleError::MalformedVote(raw.trim().to_string())),
        },
        _ => Err(OracleError::MalformedVote(raw.trim().to_string())),
    }
}
