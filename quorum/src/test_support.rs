//! Deterministic doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::executor::{ExecutionFailure, ExecutionOutcome, QueryOutput, RowSet, SqlExecutor};
use crate::oracle::{Oracle, OracleAdapter, OracleError};
use crate::schema::{ColumnInfo, SchemaDescription, TableInfo};

/// Replays canned replies; the last reply repeats once the script runs out.
#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<Option<String>>>,
    last: Mutex<Option<Option<String>>>,
}

impl Script {
    fn push(&self, reply: Option<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn next(&self) -> Option<String> {
        let mut replies = self.replies.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = replies.pop_front() {
            *last = Some(reply.clone());
            reply
        } else {
            last.clone().flatten()
        }
    }
}

/// Oracle whose answers are scripted per prompt kind.
#[derive(Default)]
pub struct ScriptedOracle {
    id: String,
    translations: Script,
    votes: Script,
    classifications: Script,
    pub translate_calls: AtomicUsize,
    pub vote_calls: AtomicUsize,
    pub precheck_calls: AtomicUsize,
    seen_translate_prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn translating<'a>(self, replies: impl IntoIterator<Item = &'a str>) -> Self {
        for reply in replies {
            self.translations.push(Some(reply.to_string()));
        }
        self
    }

    pub fn failing_translation(self) -> Self {
        self.translations.push(None);
        self
    }

    pub fn voting<'a>(self, replies: impl IntoIterator<Item = &'a str>) -> Self {
        for reply in replies {
            self.votes.push(Some(reply.to_string()));
        }
        self
    }

    pub fn failing_vote(self) -> Self {
        self.votes.push(None);
        self
    }

    pub fn classifying<'a>(self, replies: impl IntoIterator<Item = &'a str>) -> Self {
        for reply in replies {
            self.classifications.push(Some(reply.to_string()));
        }
        self
    }

    /// Every translate prompt received, in order.
    pub fn translate_prompts(&self) -> Vec<String> {
        self.seen_translate_prompts.lock().unwrap().clone()
    }

    pub fn translations(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    pub fn votes(&self) -> usize {
        self.vote_calls.load(Ordering::SeqCst)
    }

    pub fn prechecks(&self) -> usize {
        self.precheck_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let reply = if prompt.contains("SQL candidate 1:") {
            self.vote_calls.fetch_add(1, Ordering::SeqCst);
            self.votes.next()
        } else if prompt.contains("User input:") {
            self.precheck_calls.fetch_add(1, Ordering::SeqCst);
            self.classifications.next()
        } else {
            self.translate_calls.fetch_add(1, Ordering::SeqCst);
            self.seen_translate_prompts
                .lock()
                .unwrap()
                .push(prompt.to_string());
            self.translations.next()
        };
        reply.ok_or_else(|| OracleError::RequestFailed(format!("{} is scripted to fail", self.id)))
    }
}

pub fn adapter(oracle: &Arc<ScriptedOracle>) -> OracleAdapter {
    OracleAdapter::new(oracle.clone())
}

/// Executor replaying scripted outcomes and recording every statement.
#[derive(Default)]
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<ExecutionOutcome>>,
    pub executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: impl IntoIterator<Item = ExecutionOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> ExecutionOutcome {
        Err(ExecutionFailure::new(message))
    }

    pub fn rows(columns: &[&str], rows: &[&[&str]]) -> ExecutionOutcome {
        let mut set = RowSet::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            set.push_row(row.iter().map(|v| serde_json::Value::from(*v)).collect());
        }
        Ok(QueryOutput::Rows(set))
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> ExecutionOutcome {
        self.executed.lock().unwrap().push(sql.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(QueryOutput::Applied { rows_affected: 0 }))
    }
}

/// One database `shop` with a single `orders` table.
pub fn orders_schema() -> SchemaDescription {
    let mut schema = SchemaDescription::new();
    schema.insert_table(
        "shop",
        "orders",
        TableInfo {
            columns: vec![
                ColumnInfo::new("id", "INTEGER", false),
                ColumnInfo::new("customer", "VARCHAR(64)", true),
                ColumnInfo::new("total", "DECIMAL(10, 2)", true),
            ],
            primary_keys: Some(vec!["id".to_string()]),
            foreign_keys: None,
            create_statement: None,
        },
    );
    schema
}
