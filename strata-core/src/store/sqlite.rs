use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::types::{AppId, ChildNodeRow, ElementType, MethodSummaryRow, NodeRecord};

use super::SummaryStore;
use super::schema;

/// SQLite-backed implementation of [`SummaryStore`].
///
/// The pipeline is single-threaded, so a plain mutex around the connection
/// is all the locking discipline required.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> crate::error::Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> crate::error::Result<()> {
        let conn = self.lock();

        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(StoreError::Sqlite)?;

        // Try WAL mode — silently ignored for in-memory
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;

        conn.execute(
            "INSERT OR IGNORE INTO strata_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;

        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("strata store mutex poisoned")
    }
}

/// Escape `%`, `_`, and `\` so a key prefix matches literally under
/// `LIKE ... ESCAPE '\'`.
fn like_prefix(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait::async_trait]
impl SummaryStore for SqliteStore {
    async fn register_application(
        &self,
        name: &str,
        run: &str,
        root: &str,
    ) -> crate::error::Result<AppId> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO applications (name, run, root_path, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name, run) DO UPDATE SET root_path = excluded.root_path",
            params![name, run, root, Utc::now().to_rfc3339()],
        )
        .map_err(StoreError::Sqlite)?;

        let id: i64 = conn
            .query_row(
                "SELECT id FROM applications WHERE name = ?1 AND run = ?2",
                params![name, run],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        Ok(AppId(id))
    }

    async fn find_application(
        &self,
        name: &str,
        run: &str,
    ) -> crate::error::Result<Option<AppId>> {
        let conn = self.lock();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM applications WHERE name = ?1 AND run = ?2",
                params![name, run],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(id.map(AppId))
    }

    async fn exists(
        &self,
        app: AppId,
        key: &str,
        element_type: ElementType,
    ) -> crate::error::Result<bool> {
        let conn = self.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM nodes
                 WHERE application_id = ?1 AND node_key = ?2 AND element_type = ?3",
                params![app.0, key, element_type.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(found.is_some())
    }

    async fn upsert_node(
        &self,
        app: AppId,
        key: &str,
        record: &NodeRecord,
    ) -> crate::error::Result<()> {
        let record_json = serde_json::to_string(record).map_err(StoreError::Serialization)?;

        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO nodes
             (application_id, node_key, element_type, name, granularity, file_type,
              record, summary_markdown, executive_summary, technical_breakdown,
              dataflow, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                app.0,
                key,
                record.element_type.as_str(),
                record.name,
                record.metadata.granularity.as_str(),
                record.metadata.file_type.as_str(),
                record_json,
                record.summary.summary_markdown,
                record.summary.executive_summary,
                record.summary.technical_breakdown,
                record.summary.dataflow,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn method_summaries(
        &self,
        app: AppId,
        key_prefix: &str,
    ) -> crate::error::Result<Vec<MethodSummaryRow>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT name, executive_summary, summary_markdown FROM nodes
                 WHERE application_id = ?1 AND element_type = 'method'
                   AND node_key LIKE ?2 ESCAPE '\\'
                 ORDER BY id",
            )
            .map_err(StoreError::Sqlite)?;

        let rows = stmt
            .query_map(params![app.0, like_prefix(key_prefix)], |row| {
                Ok(MethodSummaryRow {
                    name: row.get(0)?,
                    executive_summary: row.get(1)?,
                    summary_markdown: row.get(2)?,
                })
            })
            .map_err(StoreError::Sqlite)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(StoreError::Sqlite)?);
        }
        Ok(out)
    }

    async fn nodes_by_prefix(
        &self,
        app: AppId,
        key_prefix: &str,
    ) -> crate::error::Result<Vec<ChildNodeRow>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT node_key, element_type, name, summary_markdown FROM nodes
                 WHERE application_id = ?1 AND element_type IN ('file', 'folder')
                   AND node_key LIKE ?2 ESCAPE '\\'
                 ORDER BY id",
            )
            .map_err(StoreError::Sqlite)?;

        let rows = stmt
            .query_map(params![app.0, like_prefix(key_prefix)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(StoreError::Sqlite)?;

        let mut out = Vec::new();
        for row in rows {
            let (full_path, element_type, name, summary_markdown) =
                row.map_err(StoreError::Sqlite)?;
            let Some(element_type) = ElementType::parse(&element_type) else {
                continue;
            };
            out.push(ChildNodeRow {
                full_path,
                element_type,
                name,
                summary_markdown,
            });
        }
        Ok(out)
    }

    async fn put_run_state(
        &self,
        app: AppId,
        key: &str,
        value: &str,
    ) -> crate::error::Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO run_state (application_id, state_key, state_value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(application_id, state_key)
             DO UPDATE SET state_value = excluded.state_value,
                           updated_at = excluded.updated_at",
            params![app.0, key, value, Utc::now().to_rfc3339()],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn run_state(&self, app: AppId, key: &str) -> crate::error::Result<Option<String>> {
        let conn = self.lock();
        let value: Option<String> = conn
            .query_row(
                "SELECT state_value FROM run_state
                 WHERE application_id = ?1 AND state_key = ?2",
                params![app.0, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(value)
    }

    async fn run_state_all(&self, app: AppId) -> crate::error::Result<Vec<(String, String)>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT state_key, state_value FROM run_state
                 WHERE application_id = ?1 ORDER BY state_key",
            )
            .map_err(StoreError::Sqlite)?;

        let rows = stmt
            .query_map(params![app.0], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(StoreError::Sqlite)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(StoreError::Sqlite)?);
        }
        Ok(out)
    }

    async fn count_nodes(&self, app: AppId) -> crate::error::Result<u64> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM nodes WHERE application_id = ?1",
                params![app.0],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        #[allow(clippy::cast_sign_loss)]
        Ok(count as u64)
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DependencySurface, FileType, Granularity, NodeSummary, RecordMetadata,
    };

    fn record(key_name: &str, element_type: ElementType, exec: &str) -> NodeRecord {
        let granularity = match element_type {
            ElementType::Method => Granularity::Method,
            ElementType::File => Granularity::File,
            ElementType::Folder => Granularity::Folder,
        };
        NodeRecord {
            full_path: format!("/repo/{key_name}"),
            element_type,
            name: key_name.to_string(),
            summary: NodeSummary {
                executive_summary: exec.to_string(),
                technical_breakdown: String::new(),
                dependencies_and_interactions: DependencySurface::default(),
                key_concepts: vec![],
                dataflow: String::new(),
                unique_terms: vec![],
                summary_markdown: format!("### 1. Executive Summary\n{exec}"),
            },
            metadata: RecordMetadata {
                granularity,
                file_type: match element_type {
                    ElementType::Folder => FileType::NotApplicable,
                    _ => FileType::Code,
                },
            },
        }
    }

    async fn store_with_app() -> (SqliteStore, AppId) {
        let store = SqliteStore::in_memory().unwrap();
        let app = store
            .register_application("demo", "run-1", "/repo")
            .await
            .unwrap();
        (store, app)
    }

    #[tokio::test]
    async fn exists_gates_writes() {
        let (store, app) = store_with_app().await;
        assert!(!store.exists(app, "a/b.rs", ElementType::File).await.unwrap());

        store
            .upsert_node(app, "a/b.rs", &record("b.rs", ElementType::File, "first"))
            .await
            .unwrap();
        assert!(store.exists(app, "a/b.rs", ElementType::File).await.unwrap());
        // Same key, different element type: distinct node.
        assert!(!store.exists(app, "a/b.rs", ElementType::Folder).await.unwrap());
    }

    #[tokio::test]
    async fn first_write_wins() {
        let (store, app) = store_with_app().await;
        store
            .upsert_node(app, "k", &record("k", ElementType::File, "original"))
            .await
            .unwrap();
        store
            .upsert_node(app, "k", &record("k", ElementType::File, "overwrite"))
            .await
            .unwrap();

        let rows = store.nodes_by_prefix(app, "k").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].summary_markdown.contains("original"));
    }

    #[tokio::test]
    async fn method_summaries_filter_by_prefix() {
        let (store, app) = store_with_app().await;
        store
            .upsert_node(
                app,
                "src/A.java#method:A.f(0)",
                &record("A.f()", ElementType::Method, "f summary"),
            )
            .await
            .unwrap();
        store
            .upsert_node(
                app,
                "src/A.java#ctor:A.A(1)",
                &record("A.A(int)", ElementType::Method, "ctor summary"),
            )
            .await
            .unwrap();
        store
            .upsert_node(
                app,
                "src/B.java#method:B.g(0)",
                &record("B.g()", ElementType::Method, "other file"),
            )
            .await
            .unwrap();
        store
            .upsert_node(app, "src/A.java", &record("A.java", ElementType::File, "file"))
            .await
            .unwrap();

        let rows = store.method_summaries(app, "src/A.java#").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "A.f()");
        assert_eq!(rows[1].name, "A.A(int)");
    }

    #[tokio::test]
    async fn like_wildcards_in_keys_match_literally() {
        let (store, app) = store_with_app().await;
        store
            .upsert_node(
                app,
                "my_app/mod.rs",
                &record("mod.rs", ElementType::File, "underscore dir"),
            )
            .await
            .unwrap();
        store
            .upsert_node(
                app,
                "myxapp/mod.rs",
                &record("mod.rs", ElementType::File, "decoy"),
            )
            .await
            .unwrap();

        let rows = store.nodes_by_prefix(app, "my_app/").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].full_path, "my_app/mod.rs");
    }

    #[tokio::test]
    async fn nodes_by_prefix_excludes_methods() {
        let (store, app) = store_with_app().await;
        store
            .upsert_node(app, "a/f.rs", &record("f.rs", ElementType::File, "file"))
            .await
            .unwrap();
        store
            .upsert_node(app, "a/sub", &record("sub", ElementType::Folder, "folder"))
            .await
            .unwrap();
        store
            .upsert_node(
                app,
                "a/f.rs#method:F.f(0)",
                &record("F.f()", ElementType::Method, "method"),
            )
            .await
            .unwrap();

        let rows = store.nodes_by_prefix(app, "a/").await.unwrap();
        let types: Vec<_> = rows.iter().map(|r| r.element_type).collect();
        assert_eq!(types, vec![ElementType::File, ElementType::Folder]);
    }

    #[tokio::test]
    async fn run_state_round_trip() {
        let (store, app) = store_with_app().await;
        assert!(store.run_state(app, "run.model").await.unwrap().is_none());

        store.put_run_state(app, "run.model", "qwen").await.unwrap();
        store.put_run_state(app, "run.model", "qwen2").await.unwrap();
        assert_eq!(
            store.run_state(app, "run.model").await.unwrap().as_deref(),
            Some("qwen2")
        );

        store
            .put_run_state(app, "run.processed.files", "3")
            .await
            .unwrap();
        let all = store.run_state_all(app).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "run.model");
    }

    #[tokio::test]
    async fn application_registration_is_stable() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store
            .register_application("demo", "run-1", "/repo")
            .await
            .unwrap();
        let b = store
            .register_application("demo", "run-1", "/repo2")
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.find_application("demo", "run-1").await.unwrap(), Some(a));
        assert_eq!(store.find_application("demo", "run-9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn counts_nodes_per_application() {
        let (store, app) = store_with_app().await;
        let other = store
            .register_application("other", "run-1", "/x")
            .await
            .unwrap();
        store
            .upsert_node(app, "a", &record("a", ElementType::File, "x"))
            .await
            .unwrap();
        store
            .upsert_node(other, "a", &record("a", ElementType::File, "x"))
            .await
            .unwrap();
        assert_eq!(store.count_nodes(app).await.unwrap(), 1);
    }
}
