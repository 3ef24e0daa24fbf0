//! Unfiltered-scan guard
//!
//! A heuristic, not a parser: a `select` that has no `limit` and neither a
//! `where` nor a `group by` clause is treated as a full-table scan and needs
//! the operator's explicit go-ahead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quorum::safety::{allows_execution, is_unfiltered_scan};
//!
//! assert!(is_unfiltered_scan("select * from orders"));
//! if !allows_execution(sql, &operator) {
//!     return; // operator declined, abort the command
//! }
//! ```

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::operator::{Confirmation, Operator};
use crate::sql::leading_keyword;

static LIMIT_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\b").expect("LIMIT_CLAUSE regex should compile"));
static WHERE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwhere\b").expect("WHERE_CLAUSE regex should compile"));
static GROUP_BY_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bgroup\s+by\b").expect("GROUP_BY_CLAUSE regex should compile")
});

/// `true` when `sql` is a `select` with no `limit`, `where` or `group by`.
pub fn is_unfiltered_scan(sql: &str) -> bool {
    if leading_keyword(sql).as_deref() != Some("select") {
        return false;
    }
    if LIMIT_CLAUSE.is_match(sql) {
        return false;
    }
    !(WHERE_CLAUSE.is_match(sql) || GROUP_BY_CLAUSE.is_match(sql))
}

/// Decide whether `sql` may run, asking the operator for unfiltered scans.
pub fn allows_execution(sql: &str, operator: &dyn Operator) -> bool {
    if !is_unfiltered_scan(sql) {
        return true;
    }

    warn!(sql = %sql, "Statement scans a whole table without a filter");
    operator.confirm(&Confirmation::UnfilteredScan { sql })
}
