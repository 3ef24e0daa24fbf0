//! Cross-vote bookkeeping
//!
//! A [`Judgment`] is one oracle's opinion of two candidates. Judgments that
//! produced no verdict count for nothing: neither "yes" nor "no".

use serde::Serialize;

use super::panel::Candidate;
use crate::oracle::{OracleId, Verdict};

/// One judge's verdicts on the candidates at `first` and `second`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub judge: OracleId,
    pub first: usize,
    pub second: usize,
    pub verdicts: Option<(Verdict, Verdict)>,
}

impl Judgment {
    /// Candidate indices this judgment approved.
    pub fn approvals(&self) -> Vec<usize> {
        match self.verdicts {
            Some((a, b)) => {
                let mut approved = Vec::new();
                if a.is_yes() {
                    approved.push(self.first);
                }
                if b.is_yes() {
                    approved.push(self.second);
                }
                approved
            }
            None => Vec::new(),
        }
    }
}

/// Round-robin pairs for `base`: each judge gets every pair of candidates it
/// did not author, in panel order.
pub fn round_robin_pairs(panel_size: usize) -> Vec<(usize, usize, usize)> {
    let mut pairs = Vec::new();
    for judge in 0..panel_size {
        for first in 0..panel_size {
            for second in (first + 1)..panel_size {
                if first != judge && second != judge {
                    pairs.push((judge, first, second));
                }
            }
        }
    }
    pairs
}

/// "Yes" counts per oracle for one round, in panel order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    counts: Vec<(OracleId, u32)>,
}

impl VoteTally {
    /// Empty tally over the given oracles.
    pub fn new(ids: impl IntoIterator<Item = OracleId>) -> Self {
        Self {
            counts: ids.into_iter().map(|id| (id, 0)).collect(),
        }
    }

    /// Tally judgments over candidates. Only present candidates are eligible,
    /// so approvals of a failed oracle's (absent) candidate are dropped.
    pub fn from_judgments(candidates: &[Candidate], judgments: &[Judgment]) -> Self {
        let mut tally = Self::new(
            candidates
                .iter()
                .filter(|c| c.is_present())
                .map(|c| c.origin.clone()),
        );
        for judgment in judgments {
            for index in judgment.approvals() {
                if let Some(candidate) = candidates.get(index) {
                    tally.record_yes(&candidate.origin);
                }
            }
        }
        tally
    }

    /// Count one "yes" for `id`. Unknown ids are ignored.
    pub fn record_yes(&mut self, id: &str) {
        if let Some((_, count)) = self.counts.iter_mut().find(|(oracle, _)| oracle == id) {
            *count += 1;
        }
    }

    pub fn get(&self, id: &str) -> Option<u32> {
        self.counts
            .iter()
            .find(|(oracle, _)| oracle == id)
            .map(|(_, count)| *count)
    }

    pub fn max(&self) -> Option<u32> {
        self.counts.iter().map(|(_, count)| *count).max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The oracle with the most votes. When `primary` reaches the maximum it
    /// wins the tie; otherwise the earliest oracle in panel order does.
    pub fn leader(&self, primary: &str) -> Option<&str> {
        let max = self.max()?;
        self.counts
            .iter()
            .find(|(id, count)| id == primary && *count == max)
            .or_else(|| self.counts.iter().find(|(_, count)| *count == max))
            .map(|(id, _)| id.as_str())
    }
}

impl FromIterator<(OracleId, u32)> for VoteTally {
    fn from_iter<T: IntoIterator<Item = (OracleId, u32)>>(iter: T) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for VoteTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(id, count)| format!("{id}:{count}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
