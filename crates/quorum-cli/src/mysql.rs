//! MySQL executor and schema introspector backed by an `sqlx` pool.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use quorum::executor::{ExecutionFailure, ExecutionOutcome, QueryOutput, RowSet, SqlExecutor};
use quorum::schema::{
    ColumnInfo, ForeignKey, SchemaDescription, SchemaError, SchemaIntrospector, SchemaResult,
    TableInfo, SYSTEM_SCHEMAS,
};
use quorum::sql::StatementKind;
use serde_json::Value;
use sqlx::mysql::{MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

/// Open a pool and verify the connection.
pub async fn connect(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Runs each statement in its own transaction. Statements carry no bind
/// arguments, so they go over the text protocol and `SHOW` and `DESCRIBE`
/// work without preparation.
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn run(&self, sql: &str) -> Result<QueryOutput, sqlx::Error> {
        let kind = StatementKind::classify(sql);
        let mut tx = self.pool.begin().await?;

        // dropping `tx` on error rolls it back
        let output = run_statement(&mut *tx, sql, kind).await?;
        match completion(kind) {
            Completion::Rollback => tx.rollback().await?,
            Completion::Commit => tx.commit().await?,
        }
        Ok(output)
    }
}

/// How a statement's transaction ends after it ran without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Rollback,
    Commit,
}

/// Reads are never committed.
fn completion(kind: StatementKind) -> Completion {
    match kind {
        StatementKind::Read => Completion::Rollback,
        StatementKind::Mutation => Completion::Commit,
    }
}

async fn run_statement(
    conn: &mut MySqlConnection,
    sql: &str,
    kind: StatementKind,
) -> Result<QueryOutput, sqlx::Error> {
    if kind.is_read() {
        let rows = conn.fetch_all(sql).await?;
        Ok(QueryOutput::Rows(row_set(&rows)))
    } else {
        let result = conn.execute(sql).await?;
        Ok(QueryOutput::Applied {
            rows_affected: result.rows_affected(),
        })
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn execute(&self, sql: &str) -> ExecutionOutcome {
        debug!(sql = %sql, "Executing statement");
        self.run(sql).await.map_err(|e| {
            warn!(error = %e, "Statement failed");
            ExecutionFailure::new(e.to_string())
        })
    }
}

/// Column names are taken from the first row, so an empty result has none.
fn row_set(rows: &[MySqlRow]) -> RowSet {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let mut set = RowSet::new(columns);
    for row in rows {
        set.push_row((0..row.len()).map(|index| cell(row, index)).collect());
    }
    set
}

fn cell(row: &MySqlRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        Ok(_) => {}
    }
    let type_name = row.columns()[index].type_info().name().to_string();
    let text = row
        .try_get_unchecked::<String, _>(index)
        .or_else(|_| {
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
        .unwrap_or_default();
    json_value(&type_name, text)
}

/// Integers and floats become JSON numbers; everything else, including
/// `DECIMAL`, stays text so no precision is lost.
fn json_value(type_name: &str, text: String) -> Value {
    let base = type_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    match base.as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => text
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| text.parse::<u64>().map(Value::from))
            .unwrap_or(Value::String(text)),
        "FLOAT" | "DOUBLE" => match text.parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::String(text)),
            Err(_) => Value::String(text),
        },
        _ => Value::String(text),
    }
}

/// Builds a [`SchemaDescription`] from `information_schema`.
pub struct MySqlIntrospector {
    pool: MySqlPool,
}

type ColumnRow = (String, String, String, String, String, Option<String>);
type KeyRow = (String, String, String, String, Option<String>, Option<String>);

impl MySqlIntrospector {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn create_statement(&self, database: &str, table: &str) -> Option<String> {
        let sql = format!(
            "SHOW CREATE TABLE `{}`.`{}`",
            database.replace('`', "``"),
            table.replace('`', "``")
        );
        match self.pool.fetch_all(sql.as_str()).await {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.try_get_unchecked::<String, _>(1).ok()),
            Err(e) => {
                warn!(database, table, error = %e, "Could not read CREATE TABLE statement");
                None
            }
        }
    }

    async fn fetch(&self) -> Result<SchemaDescription, sqlx::Error> {
        let excluded = SYSTEM_SCHEMAS
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let databases: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT CAST(SCHEMA_NAME AS CHAR) FROM information_schema.SCHEMATA \
             WHERE SCHEMA_NAME NOT IN ({excluded}) ORDER BY SCHEMA_NAME"
        ))
        .fetch_all(&self.pool)
        .await?;

        let tables: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT CAST(TABLE_SCHEMA AS CHAR), CAST(TABLE_NAME AS CHAR) \
             FROM information_schema.TABLES \
             WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA NOT IN ({excluded}) \
             ORDER BY TABLE_SCHEMA, TABLE_NAME"
        ))
        .fetch_all(&self.pool)
        .await?;

        let columns: Vec<ColumnRow> = sqlx::query_as(&format!(
            "SELECT CAST(TABLE_SCHEMA AS CHAR), CAST(TABLE_NAME AS CHAR), \
             CAST(COLUMN_NAME AS CHAR), CAST(COLUMN_TYPE AS CHAR), \
             CAST(IS_NULLABLE AS CHAR), CAST(COLUMN_DEFAULT AS CHAR) \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA NOT IN ({excluded}) \
             ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION"
        ))
        .fetch_all(&self.pool)
        .await?;

        let keys: Vec<KeyRow> = sqlx::query_as(&format!(
            "SELECT CAST(TABLE_SCHEMA AS CHAR), CAST(TABLE_NAME AS CHAR), \
             CAST(CONSTRAINT_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR), \
             CAST(REFERENCED_TABLE_NAME AS CHAR), CAST(REFERENCED_COLUMN_NAME AS CHAR) \
             FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA NOT IN ({excluded}) \
             ORDER BY TABLE_SCHEMA, TABLE_NAME, CONSTRAINT_NAME, ORDINAL_POSITION"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut schema = assemble(
            databases.into_iter().map(|(name,)| name),
            tables.iter().cloned(),
            columns,
            keys,
        );

        for (database, table) in tables {
            let ddl = self.create_statement(&database, &table).await;
            if let Some(info) = schema.table_mut(&database, &table) {
                info.create_statement = ddl;
            }
        }

        Ok(schema)
    }
}

#[async_trait]
impl SchemaIntrospector for MySqlIntrospector {
    async fn introspect(&self) -> SchemaResult<SchemaDescription> {
        self.fetch()
            .await
            .map_err(|e| SchemaError::Introspection(e.to_string()))
    }
}

/// Group flat `information_schema` rows into a schema description.
fn assemble(
    databases: impl IntoIterator<Item = String>,
    tables: impl IntoIterator<Item = (String, String)>,
    columns: Vec<ColumnRow>,
    keys: Vec<KeyRow>,
) -> SchemaDescription {
    let mut schema = SchemaDescription::new();
    for database in databases {
        schema.insert_database(database);
    }
    for (database, table) in tables {
        schema.insert_table(database, table, TableInfo::default());
    }

    for (database, table, name, data_type, nullable, default) in columns {
        if let Some(info) = schema.table_mut(&database, &table) {
            let mut column = ColumnInfo::new(name, data_type, nullable.eq_ignore_ascii_case("YES"));
            if let Some(default) = default {
                column = column.with_default(default);
            }
            info.columns.push(column);
        }
    }

    // (database, table, constraint) -> (columns, referenced table, referenced columns)
    let mut foreign: BTreeMap<(String, String, String), (Vec<String>, String, Vec<String>)> =
        BTreeMap::new();
    for (database, table, constraint, column, referenced_table, referenced_column) in keys {
        if constraint == "PRIMARY" {
            if let Some(info) = schema.table_mut(&database, &table) {
                info.primary_keys.get_or_insert_with(Vec::new).push(column);
            }
            continue;
        }
        if let (Some(referenced_table), Some(referenced_column)) =
            (referenced_table, referenced_column)
        {
            let entry = foreign
                .entry((database, table, constraint))
                .or_insert_with(|| (Vec::new(), referenced_table, Vec::new()));
            entry.0.push(column);
            entry.2.push(referenced_column);
        }
    }
    for ((database, table, _), (columns, referenced_table, referenced_columns)) in foreign {
        if let Some(info) = schema.table_mut(&database, &table) {
            info.foreign_keys
                .get_or_insert_with(Vec::new)
                .push(ForeignKey {
                    columns,
                    referenced_table,
                    referenced_columns,
                });
        }
    }

    schema
}
