//! The set of oracles taking part in a consensus round.

use crate::oracle::{OracleAdapter, OracleId};

/// One oracle's translation for a round. `sql: None` means the oracle failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub origin: OracleId,
    pub sql: Option<String>,
}

impl Candidate {
    pub fn new(origin: impl Into<OracleId>, sql: Option<String>) -> Self {
        Self {
            origin: origin.into(),
            sql,
        }
    }

    pub fn is_present(&self) -> bool {
        self.sql.is_some()
    }
}

/// Ordered oracle panel. The first member is the designated primary; panel
/// order is also the tie-break order among peers.
#[derive(Debug, Clone)]
pub struct OraclePanel {
    members: Vec<OracleAdapter>,
}

impl OraclePanel {
    pub fn new(primary: OracleAdapter, peers: impl IntoIterator<Item = OracleAdapter>) -> Self {
        let mut members = vec![primary];
        members.extend(peers);
        Self { members }
    }

    pub fn primary(&self) -> &OracleAdapter {
        &self.members[0]
    }

    pub fn peers(&self) -> &[OracleAdapter] {
        &self.members[1..]
    }

    pub fn members(&self) -> &[OracleAdapter] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`; a panel has at least its primary.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn ids(&self) -> Vec<OracleId> {
        self.members.iter().map(|m| m.id().to_string()).collect()
    }
}
