//! Database schema snapshot and its on-disk cache.

pub mod cache;
pub mod types;

pub use cache::{SchemaCache, SchemaIntrospector, SchemaSource, Unavailable, DEFAULT_CACHE_FILE};
pub use types::{
    is_system_schema, ColumnInfo, ForeignKey, SchemaDescription, TableInfo, TableMap,
    SYSTEM_SCHEMAS,
};

use thiserror::Error;

/// Errors from loading, saving or introspecting a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema cache is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Live introspection failed: {0}")]
    Introspection(String),
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
