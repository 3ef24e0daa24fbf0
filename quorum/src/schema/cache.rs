//! Schema cache file
//!
//! The snapshot is read from disk when the cache exists; otherwise it is
//! introspected from the live database and persisted before first use.
//! Writes go to a temp file that is renamed over the target.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::SchemaDescription;
use super::{SchemaError, SchemaResult};

/// Default cache file name, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = "db_full_metadata.json";

/// Anything able to produce a live schema snapshot.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    async fn introspect(&self) -> SchemaResult<SchemaDescription>;
}

/// Where a loaded snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    Cache,
    Live,
}

/// JSON schema cache at a fixed path.
#[derive(Debug, Clone)]
pub struct SchemaCache {
    path: PathBuf,
}

impl SchemaCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. `Ok(None)` when no cache file exists.
    pub fn load(&self) -> SchemaResult<Option<SchemaDescription>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)?;
        let schema: SchemaDescription = serde_json::from_str(&json)?;
        debug!(path = %self.path.display(), "Loaded schema cache");
        Ok(Some(schema.without_system_schemas()))
    }

    /// Write the whole snapshot atomically with 4-space indentation.
    pub fn save(&self, schema: &SchemaDescription) -> SchemaResult<()> {
        let temp_path = self.path.with_extension("json.tmp");

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        schema.serialize(&mut serializer)?;

        std::fs::write(&temp_path, &buffer)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Return the cached snapshot, introspecting and persisting it only when
    /// no cache file exists.
    pub async fn load_or_introspect(
        &self,
        introspector: &dyn SchemaIntrospector,
    ) -> SchemaResult<(SchemaDescription, SchemaSource)> {
        if let Some(schema) = self.load()? {
            return Ok((schema, SchemaSource::Cache));
        }
        let schema = self.refresh(introspector).await?;
        Ok((schema, SchemaSource::Live))
    }

    /// Introspect unconditionally and overwrite the cache.
    pub async fn refresh(
        &self,
        introspector: &dyn SchemaIntrospector,
    ) -> SchemaResult<SchemaDescription> {
        let schema = introspector.introspect().await?.without_system_schemas();
        self.save(&schema)?;
        info!(
            path = %self.path.display(),
            databases = schema.databases().len(),
            tables = schema.table_count(),
            "Schema introspected and cached"
        );
        Ok(schema)
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_FILE)
    }
}

/// Introspector that always fails; useful when no database is configured.
pub struct Unavailable(pub String);

#[async_trait]
impl SchemaIntrospector for Unavailable {
    async fn introspect(&self) -> SchemaResult<SchemaDescription> {
        Err(SchemaError::Introspection(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnInfo, TableInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingIntrospector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SchemaIntrospector for CountingIntrospector {
        async fn introspect(&self) -> SchemaResult<SchemaDescription> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut schema = SchemaDescription::new();
            schema.insert_table(
                "shop",
                "orders",
                TableInfo {
                    columns: vec![ColumnInfo::new("id", "INTEGER", false)],
                    primary_keys: Some(vec!["id".into()]),
                    ..TableInfo::default()
                },
            );
            Ok(schema)
        }
    }

    #[test]
    fn test_load_missing_cache() {
        let dir = tempdir().unwrap();
        let cache = SchemaCache::new(dir.path().join("missing.json"));
        assert!(cache.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_introspects_once_then_reads_cache() {
        let dir = tempdir().unwrap();
        let cache = SchemaCache::new(dir.path().join("meta.json"));
        let introspector = CountingIntrospector {
            calls: AtomicUsize::new(0),
        };

        let (first, source) = cache.load_or_introspect(&introspector).await.unwrap();
        assert_eq!(source, SchemaSource::Live);

        let (second, source) = cache.load_or_introspect(&introspector).await.unwrap();
        assert_eq!(source, SchemaSource::Cache);
        let (third, _) = cache.load_or_introspect(&introspector).await.unwrap();

        assert_eq!(introspector.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[tokio::test]
    async fn test_save_uses_four_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let cache = SchemaCache::new(&path);
        let introspector = CountingIntrospector {
            calls: AtomicUsize::new(0),
        };
        cache.refresh(&introspector).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"shop\""));
        assert!(!dir.path().join("meta.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unavailable_introspector_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let cache = SchemaCache::new(&path);
        let result = cache
            .load_or_introspect(&Unavailable("no database configured".into()))
            .await;
        assert!(matches!(result, Err(SchemaError::Introspection(_))));
        assert!(!path.exists());
    }
}
