//! Consensus resolution
//!
//! Runs one translation round in the selected [`ConsensusMode`] and reduces
//! it to a [`Resolution`]. Oracle calls of a round are independent and are
//! issued concurrently; the round waits for all of them before tallying.

use futures::future::join_all;
use tracing::{debug, info};

use super::panel::{Candidate, OraclePanel};
use super::voting::{round_robin_pairs, Judgment, VoteTally};
use super::ConsensusMode;
use crate::oracle::{OracleAdapter, Verdict};
use crate::prompts::PromptBuilder;

/// Outcome of a consensus round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A statement was chosen
    Resolved(String),
    /// Candidates existed but none reached the acceptance threshold. Retryable,
    /// and the reason is fed back into the next attempt.
    ConsensusFailure(String),
    /// The oracles needed for this round produced nothing.
    OracleFailure,
}

impl Resolution {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Resolved(sql) => Some(sql),
            _ => None,
        }
    }
}

/// Resolves a query into one statement using a panel of oracles.
pub struct Resolver<'a> {
    panel: &'a OraclePanel,
    prompts: &'a PromptBuilder,
}

impl<'a> Resolver<'a> {
    pub fn new(panel: &'a OraclePanel, prompts: &'a PromptBuilder) -> Self {
        Self { panel, prompts }
    }

    pub async fn resolve(&self, mode: ConsensusMode, query: &str) -> Resolution {
        debug!(mode = %mode, oracles = self.panel.len(), "Starting consensus round");
        match mode {
            ConsensusMode::Simple => self.simple(query).await,
            ConsensusMode::Fast => self.fast(query).await,
            ConsensusMode::Base => self.base(query).await,
        }
    }

    /// Translate with every oracle concurrently, in panel order.
    async fn candidates(&self, query: &str) -> Vec<Candidate> {
        let translations = self
            .panel
            .members()
            .iter()
            .map(|oracle| oracle.translate(self.prompts, query));
        join_all(translations)
            .await
            .into_iter()
            .zip(self.panel.members())
            .map(|(sql, oracle)| Candidate::new(oracle.id(), sql))
            .collect()
    }

    async fn simple(&self, query: &str) -> Resolution {
        match self.panel.primary().translate(self.prompts, query).await {
            Some(sql) => Resolution::Resolved(sql),
            None => Resolution::OracleFailure,
        }
    }

    async fn fast(&self, query: &str) -> Resolution {
        let candidates = self.candidates(query).await;
        let Some(primary_sql) = candidates[0].sql.clone() else {
            return Resolution::OracleFailure;
        };

        let reviews = self
            .panel
            .peers()
            .iter()
            .zip(&candidates[1..])
            .map(|(peer, own)| self.judge(peer, query, Some(&primary_sql), own.sql.as_deref()));
        let verdicts = join_all(reviews).await;

        let approvals = verdicts
            .iter()
            .filter(|v| matches!(v, Some((first, _)) if first.is_yes()))
            .count();

        info!(
            primary = self.panel.primary().id(),
            approvals,
            reviewers = verdicts.len(),
            "Fast consensus tallied"
        );

        if approvals >= 1 {
            Resolution::Resolved(primary_sql)
        } else {
            Resolution::ConsensusFailure(format!(
                "the peer oracles voted no on the {} statement",
                self.panel.primary().id()
            ))
        }
    }

    async fn base(&self, query: &str) -> Resolution {
        let candidates = self.candidates(query).await;
        if !candidates.iter().any(Candidate::is_present) {
            return Resolution::OracleFailure;
        }

        let members = self.panel.members();
        let pairs = round_robin_pairs(members.len());
        let votes = pairs.iter().map(|&(judge, first, second)| {
            self.judge(
                &members[judge],
                query,
                candidates[first].sql.as_deref(),
                candidates[second].sql.as_deref(),
            )
        });
        let judgments: Vec<Judgment> = join_all(votes)
            .await
            .into_iter()
            .zip(&pairs)
            .map(|(verdicts, &(judge, first, second))| Judgment {
                judge: members[judge].id().to_string(),
                first,
                second,
                verdicts,
            })
            .collect();

        let tally = VoteTally::from_judgments(&candidates, &judgments);
        let Some(winner) = tally.leader(self.panel.primary().id()) else {
            return Resolution::OracleFailure;
        };
        info!(tally = %tally, winner, "Base consensus tallied");

        candidates
            .into_iter()
            .find(|c| c.origin == winner)
            .and_then(|c| c.sql)
            .map(Resolution::Resolved)
            .unwrap_or(Resolution::OracleFailure)
    }

    async fn judge(
        &self,
        judge: &OracleAdapter,
        query: &str,
        sql_a: Option<&str>,
        sql_b: Option<&str>,
    ) -> Option<(Verdict, Verdict)> {
        judge.vote(self.prompts, query, sql_a, sql_b).await
    }
}
