use crate::types::{AppId, ChildNodeRow, ElementType, MethodSummaryRow, NodeRecord};

/// The persistence surface the bottom-up pipeline reads and writes through.
///
/// Node records are create-once: `upsert_node` never overwrites an existing
/// `(application, key, element type)` row, and `exists` gates every write in
/// the pipeline, which is what makes interrupted runs resumable.
#[async_trait::async_trait]
pub trait SummaryStore: Send + Sync {
    /// Register (or look up) an application+run. Returns its ID.
    async fn register_application(
        &self,
        name: &str,
        run: &str,
        root: &str,
    ) -> crate::error::Result<AppId>;

    /// Look up an already-registered application+run.
    async fn find_application(
        &self,
        name: &str,
        run: &str,
    ) -> crate::error::Result<Option<AppId>>;

    /// True if a node with this key and element type is already persisted.
    async fn exists(
        &self,
        app: AppId,
        key: &str,
        element_type: ElementType,
    ) -> crate::error::Result<bool>;

    /// Persist a node record. A key collision is a no-op: the first write
    /// wins and the row is never updated afterwards.
    async fn upsert_node(
        &self,
        app: AppId,
        key: &str,
        record: &NodeRecord,
    ) -> crate::error::Result<()>;

    /// Method summaries whose key starts with `key_prefix`, in insertion
    /// order (file-level aggregation).
    async fn method_summaries(
        &self,
        app: AppId,
        key_prefix: &str,
    ) -> crate::error::Result<Vec<MethodSummaryRow>>;

    /// File and folder rows whose key starts with `key_prefix`, in insertion
    /// order (folder-level aggregation). Method rows are excluded.
    async fn nodes_by_prefix(
        &self,
        app: AppId,
        key_prefix: &str,
    ) -> crate::error::Result<Vec<ChildNodeRow>>;

    /// Write one run-state entry (counters, timestamps, analysis payloads).
    async fn put_run_state(
        &self,
        app: AppId,
        key: &str,
        value: &str,
    ) -> crate::error::Result<()>;

    /// Read one run-state entry.
    async fn run_state(&self, app: AppId, key: &str) -> crate::error::Result<Option<String>>;

    /// All run-state entries for an application, ordered by key.
    async fn run_state_all(&self, app: AppId) -> crate::error::Result<Vec<(String, String)>>;

    /// Count persisted nodes for an application.
    async fn count_nodes(&self, app: AppId) -> crate::error::Result<u64>;
}
