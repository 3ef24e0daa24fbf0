//! Mocked command-flow integration test: exercises engine, consensus,
//! gates and the retry loop with deterministic mock oracles (no network, no
//! database).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use quorum::schema::{ColumnInfo, SchemaCache, TableInfo};
use quorum::{
    AttemptFailure, AutoApprove, AutoDeny, CommandOutcome, ConsensusMode, Engine,
    ExecutionFailure, ExecutionOutcome, LoopEvent, Operator, Oracle, OracleAdapter, OracleError,
    OraclePanel, QueryOutput, RowSet, SchemaDescription, Session, SqlExecutor,
};

/// Helper: oracle answering by prompt kind, replaying the last reply forever.
struct MockOracle {
    id: &'static str,
    translations: Mutex<VecDeque<&'static str>>,
    vote: &'static str,
    precheck: &'static str,
    translate_calls: AtomicUsize,
    translate_prompts: Mutex<Vec<String>>,
}

impl MockOracle {
    fn new(id: &'static str, translations: &[&'static str], vote: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            translations: Mutex::new(translations.iter().copied().collect()),
            vote,
            precheck: "True",
            translate_calls: AtomicUsize::new(0),
            translate_prompts: Mutex::new(Vec::new()),
        })
    }

    fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }

    fn translate_prompts(&self) -> Vec<String> {
        self.translate_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    fn id(&self) -> &str {
        self.id
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        if prompt.contains("SQL candidate 1:") {
            return Ok(self.vote.to_string());
        }
        if prompt.contains("User input:") {
            return Ok(self.precheck.to_string());
        }
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        self.translate_prompts.lock().unwrap().push(prompt.to_string());
        let mut queue = self.translations.lock().unwrap();
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        };
        reply
            .map(str::to_string)
            .ok_or_else(|| OracleError::RequestFailed(format!("{} has no script", self.id)))
    }
}

/// Helper: executor that serves `SHOW TABLES` from the schema and fails
/// statements naming unknown tables.
struct SchemaBackedExecutor {
    schema: SchemaDescription,
    database: &'static str,
    executed: Mutex<Vec<String>>,
}

impl SchemaBackedExecutor {
    fn new(schema: SchemaDescription, database: &'static str) -> Arc<Self> {
        Arc::new(Self {
            schema,
            database,
            executed: Mutex::new(Vec::new()),
        })
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for SchemaBackedExecutor {
    async fn execute(&self, sql: &str) -> ExecutionOutcome {
        self.executed.lock().unwrap().push(sql.to_string());
        if sql.eq_ignore_ascii_case("show tables") {
            let mut rows = RowSet::new(vec![format!("Tables_in_{}", self.database)]);
            for table in self.schema.tables(self.database).into_iter().flatten() {
                rows.push_row(vec![json!(table.0)]);
            }
            return Ok(QueryOutput::Rows(rows));
        }
        let known = self
            .schema
            .tables(self.database)
            .into_iter()
            .flatten()
            .any(|(name, _)| sql.contains(&format!("FROM {name} ")));
        if known {
            Ok(QueryOutput::Applied { rows_affected: 1 })
        } else {
            Err(ExecutionFailure::new(format!(
                "Table '{}' doesn't exist",
                self.database
            )))
        }
    }
}

/// Helper: operator recording retry notifications.
#[derive(Default)]
struct RecordingOperator {
    retries: Mutex<Vec<u32>>,
}

impl Operator for RecordingOperator {
    fn confirm(&self, _request: &quorum::Confirmation<'_>) -> bool {
        false
    }

    fn notify(&self, event: &LoopEvent<'_>) {
        if let LoopEvent::AttemptFailed { attempt, .. } = event {
            self.retries.lock().unwrap().push(*attempt);
        }
    }
}

fn one_table_schema() -> SchemaDescription {
    let mut schema = SchemaDescription::new();
    schema.insert_table(
        "shop",
        "orders",
        TableInfo {
            columns: vec![
                ColumnInfo::new("id", "int", false),
                ColumnInfo::new("total", "decimal(10,2)", true),
            ],
            primary_keys: Some(vec!["id".into()]),
            foreign_keys: None,
            create_statement: None,
        },
    );
    schema
}

fn panel(members: &[Arc<MockOracle>]) -> OraclePanel {
    let mut adapters = members
        .iter()
        .map(|m| OracleAdapter::new(m.clone() as Arc<dyn Oracle>));
    let primary = adapters.next().expect("panel needs a primary");
    OraclePanel::new(primary, adapters.collect::<Vec<_>>())
}

// ── End-to-end: simple mode ────────────────────────────────────────

#[tokio::test]
async fn test_show_all_tables_in_simple_mode() {
    let gpt = MockOracle::new("gpt", &["SHOW TABLES"], "yes yes");
    let executor = SchemaBackedExecutor::new(one_table_schema(), "shop");
    let engine = Engine::new(panel(&[gpt.clone()]), executor.clone());
    let session = Session::new(one_table_schema(), ConsensusMode::Simple);

    let outcome = engine.handle(&session, "show all tables", &AutoDeny).await;

    let CommandOutcome::Succeeded { sql, output, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(sql, "SHOW TABLES");
    let QueryOutput::Rows(rows) = output else {
        panic!("SHOW TABLES must return rows");
    };
    assert_eq!(rows.columns().len(), 1);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.get(0, "Tables_in_shop"), Some(&json!("orders")));
    assert_eq!(executor.executed(), vec!["SHOW TABLES".to_string()]);
}

// ── Retry loop ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_execution_errors_are_fed_back_until_success() {
    let gpt = MockOracle::new(
        "gpt",
        &[
            "SELECT * FROM order WHERE id = 1",
            "SELECT * FROM ordr WHERE id = 1",
            "SELECT * FROM orders WHERE id = 1",
        ],
        "yes yes",
    );
    let executor = SchemaBackedExecutor::new(one_table_schema(), "shop");
    let engine = Engine::new(panel(&[gpt.clone()]), executor.clone());
    let session = Session::new(one_table_schema(), ConsensusMode::Simple);
    let operator = RecordingOperator::default();

    let outcome = engine.handle(&session, "order number one", &operator).await;

    assert!(outcome.is_success());
    assert_eq!(gpt.translate_calls(), 3);
    assert_eq!(executor.executed().len(), 3);
    assert_eq!(*operator.retries.lock().unwrap(), vec![1, 2]);
    let attempts = outcome.attempts();
    assert!(matches!(
        attempts[0].failure,
        Some(AttemptFailure::Execution { .. })
    ));
    assert_eq!(attempts[0].sql.as_deref(), Some("SELECT * FROM order WHERE id = 1"));
    assert!(attempts[2].failure.is_none());

    let first_note = "# ERROR last time: Table 'shop' doesn't exist \
                      SQL last time: SELECT * FROM order WHERE id = 1 \
                      try to figure it out and generate a new sql";
    let second_note = "# ERROR last time: Table 'shop' doesn't exist \
                       SQL last time: SELECT * FROM ordr WHERE id = 1 \
                       try to figure it out and generate a new sql";
    let prompts = gpt.translate_prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("order number one\n"));
    assert!(!prompts[0].contains("# ERROR last time"));
    assert!(prompts[1].contains(&format!("order number one\n{first_note}\n")));
    assert!(!prompts[1].contains(second_note));
    assert!(prompts[2].contains(&format!("order number one\n{first_note}\n{second_note}\n")));
}

#[tokio::test]
async fn test_no_fourth_attempt() {
    let gpt = MockOracle::new("gpt", &["SELECT * FROM nowhere WHERE id = 1"], "yes yes");
    let executor = SchemaBackedExecutor::new(one_table_schema(), "shop");
    let engine = Engine::new(panel(&[gpt.clone()]), executor.clone());
    let session = Session::new(one_table_schema(), ConsensusMode::Simple);

    let outcome = engine.handle(&session, "from nowhere", &AutoApprove).await;

    assert!(matches!(outcome, CommandOutcome::Exhausted { .. }));
    assert_eq!(gpt.translate_calls(), 3);
}

// ── Consensus modes ────────────────────────────────────────────────

#[tokio::test]
async fn test_base_mode_picks_majority_candidate() {
    // gpt judges (cohere, gemini), cohere judges (gpt, gemini),
    // gemini judges (gpt, cohere): gemini collects two votes
    let gpt = MockOracle::new("gpt", &["SELECT * FROM orders WHERE id = 1"], "no yes");
    let cohere = MockOracle::new("cohere", &["SELECT id FROM orders WHERE id = 1"], "no yes");
    let gemini = MockOracle::new(
        "gemini",
        &["SELECT total FROM orders WHERE id = 1"],
        "no no",
    );
    let executor = SchemaBackedExecutor::new(one_table_schema(), "shop");
    let engine = Engine::new(panel(&[gpt, cohere, gemini]), executor.clone());
    let session = Session::new(one_table_schema(), ConsensusMode::Base);

    let outcome = engine.handle(&session, "total of order one", &AutoDeny).await;

    let CommandOutcome::Succeeded { sql, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(sql, "SELECT total FROM orders WHERE id = 1");
}

#[tokio::test]
async fn test_fast_mode_without_approval_exhausts() {
    let gpt = MockOracle::new("gpt", &["SELECT * FROM orders WHERE id = 1"], "no no");
    let cohere = MockOracle::new("cohere", &["SELECT 1"], "no yes");
    let gemini = MockOracle::new("gemini", &["SELECT 2"], "no yes");
    let executor = SchemaBackedExecutor::new(one_table_schema(), "shop");
    let engine = Engine::new(panel(&[gpt.clone(), cohere, gemini]), executor.clone());
    let session = Session::new(one_table_schema(), ConsensusMode::Fast);

    let outcome = engine.handle(&session, "order number one", &AutoDeny).await;

    let CommandOutcome::Exhausted { attempts } = outcome else {
        panic!("expected exhaustion, got {outcome:?}");
    };
    assert_eq!(attempts.len(), 3);
    assert!(attempts
        .iter()
        .all(|a| matches!(a.failure, Some(AttemptFailure::Consensus { .. }))));
    assert!(executor.executed().is_empty());
    assert_eq!(gpt.translate_calls(), 3);
}

// ── Schema cache ───────────────────────────────────────────────────

#[test]
fn test_cache_round_trip_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SchemaCache::new(dir.path().join("db_full_metadata.json"));
    cache.save(&one_table_schema()).unwrap();

    let first = cache.load().unwrap().unwrap();
    let second = cache.load().unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, one_table_schema());
}
