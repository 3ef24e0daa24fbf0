//! Schema snapshot types
//!
//! The snapshot mirrors the on-disk cache document exactly: database name →
//! table name → table description. Ordered maps keep prompt text stable
//! between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog schemas that never belong in a snapshot.
pub const SYSTEM_SCHEMAS: &[&str] = &["mysql", "performance_schema", "information_schema", "sys"];

/// Returns `true` for MySQL's own catalog schemas.
pub fn is_system_schema(name: &str) -> bool {
    SYSTEM_SCHEMAS
        .iter()
        .any(|system| system.eq_ignore_ascii_case(name))
}

/// Tables of a single database, keyed by table name.
pub type TableMap = BTreeMap<String, TableInfo>;

/// Immutable description of every user database reachable from a connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDescription {
    databases: BTreeMap<String, TableMap>,
}

impl SchemaDescription {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. Tables of system schemas are ignored and `false` is returned.
    pub fn insert_table(
        &mut self,
        database: impl Into<String>,
        table: impl Into<String>,
        info: TableInfo,
    ) -> bool {
        let database = database.into();
        if is_system_schema(&database) {
            return false;
        }
        self.databases
            .entry(database)
            .or_default()
            .insert(table.into(), info);
        true
    }

    /// Register a database with no tables yet.
    pub fn insert_database(&mut self, database: impl Into<String>) -> bool {
        let database = database.into();
        if is_system_schema(&database) {
            return false;
        }
        self.databases.entry(database).or_default();
        true
    }

    /// Drop any system schema that slipped in (e.g. from a hand-edited cache).
    pub fn without_system_schemas(mut self) -> Self {
        self.databases.retain(|name, _| !is_system_schema(name));
        self
    }

    pub fn databases(&self) -> &BTreeMap<String, TableMap> {
        &self.databases
    }

    pub fn tables(&self, database: &str) -> Option<&TableMap> {
        self.databases.get(database)
    }

    pub fn table(&self, database: &str, table: &str) -> Option<&TableInfo> {
        self.databases.get(database)?.get(table)
    }

    pub fn table_mut(&mut self, database: &str, table: &str) -> Option<&mut TableInfo> {
        self.databases.get_mut(database)?.get_mut(table)
    }

    /// Total number of tables across all databases
    pub fn table_count(&self) -> usize {
        self.databases.values().map(|tables| tables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Pretty JSON (2-space indent) embedded in every prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Description of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
    /// Primary key columns in key order, `None` when the table has no primary key
    pub primary_keys: Option<Vec<String>>,
    /// Outgoing foreign keys, `None` when there are none
    pub foreign_keys: Option<Vec<ForeignKey>>,
    /// Raw `CREATE TABLE` DDL when it could be retrieved
    pub create_statement: Option<String>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A foreign key relationship.
///
/// Older cache files name the fields `column` and `references`; both spellings
/// are accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(alias = "column")]
    pub columns: Vec<String>,
    #[serde(alias = "references")]
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}
