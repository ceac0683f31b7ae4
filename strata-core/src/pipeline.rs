//! Bottom-up orchestrator: methods → files → folders.
//!
//! Every phase walks its candidates in scan order, skips nodes that already
//! exist in the store, and fully persists one node before touching the next.
//! That existence check is the whole resumability story: an aborted run
//! leaves only complete nodes behind, and the next invocation picks up at
//! the first unprocessed one.

use std::path::Path;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::extract::{MethodExtraction, MethodExtractor};
use crate::llm::{PromptBundle, SummaryBackend};
use crate::markdown::parse_summary;
use crate::progress::ProgressReporter;
use crate::request::{CHILD_MARKDOWN_CAP, NodeRequest, truncate};
use crate::scan::ScanResults;
use crate::store::SummaryStore;
use crate::types::{AppId, ElementType, FileType, Granularity, RelPath};

/// Run-state key holding the codebase-level analysis JSON.
pub const CODEBASE_ANALYSIS_KEY: &str = "analysis.codebase";

/// Limits and toggles for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    /// Cap on the combined code+doc file list. Applies to both the method
    /// and file phases, which iterate the same capped list.
    pub max_files: Option<usize>,
    /// Cap on the folder list, applied after the depth sort.
    pub max_folders: Option<usize>,
    /// Skip the method phase entirely.
    pub skip_methods: bool,
}

/// Per-phase counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineResult {
    pub processed_methods: u64,
    pub processed_files: u64,
    pub processed_folders: u64,
}

/// Orchestrates the three-phase bottom-up traversal for one application run.
pub struct BottomUpPipeline<'a> {
    backend: &'a dyn SummaryBackend,
    store: &'a dyn SummaryStore,
    prompts: &'a PromptBundle,
    extractor: MethodExtractor,
    model: String,
    app: AppId,
}

impl std::fmt::Debug for BottomUpPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BottomUpPipeline")
            .field("model", &self.model)
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

impl<'a> BottomUpPipeline<'a> {
    pub fn new(
        backend: &'a dyn SummaryBackend,
        store: &'a dyn SummaryStore,
        prompts: &'a PromptBundle,
        model: impl Into<String>,
        app: AppId,
    ) -> Self {
        Self {
            backend,
            store,
            prompts,
            extractor: MethodExtractor::new(),
            model: model.into(),
            app,
        }
    }

    /// Drive the full traversal. Backend and store errors abort the run;
    /// a single file's parse failure degrades to zero methods for that file.
    #[instrument(skip_all, name = "bottom_up_run")]
    pub async fn run(
        &self,
        scan: &ScanResults,
        limits: &RunLimits,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<PipelineResult> {
        self.store
            .put_run_state(self.app, "run.started_at", &Utc::now().to_rfc3339())
            .await?;
        self.store
            .put_run_state(self.app, "run.model", &self.model)
            .await?;

        // One capped list drives both the method and file phases.
        let mut files: Vec<(&Path, FileType)> = scan
            .code_files
            .iter()
            .map(|p| (p.as_path(), FileType::Code))
            .chain(scan.doc_files.iter().map(|p| (p.as_path(), FileType::Document)))
            .collect();
        if let Some(max) = limits.max_files {
            files.truncate(max);
        }

        let mut result = PipelineResult::default();
        if limits.skip_methods {
            info!("Method phase skipped by flag");
        } else {
            result.processed_methods = self.process_methods(scan, &files, progress).await?;
        }
        result.processed_files = self.process_files(scan, &files, progress).await?;
        result.processed_folders = self.process_folders(scan, limits, progress).await?;

        self.store
            .put_run_state(
                self.app,
                "run.processed.methods",
                &result.processed_methods.to_string(),
            )
            .await?;
        self.store
            .put_run_state(
                self.app,
                "run.processed.files",
                &result.processed_files.to_string(),
            )
            .await?;
        self.store
            .put_run_state(
                self.app,
                "run.processed.folders",
                &result.processed_folders.to_string(),
            )
            .await?;
        self.store
            .put_run_state(self.app, "run.finished_at", &Utc::now().to_rfc3339())
            .await?;

        info!(
            methods = result.processed_methods,
            files = result.processed_files,
            folders = result.processed_folders,
            "Bottom-up run complete"
        );
        Ok(result)
    }

    #[instrument(skip_all, name = "phase_methods")]
    async fn process_methods(
        &self,
        scan: &ScanResults,
        files: &[(&Path, FileType)],
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<u64> {
        let eligible: Vec<&Path> = files
            .iter()
            .filter(|(path, file_type)| {
                *file_type == FileType::Code && self.extractor.supports(path)
            })
            .map(|(path, _)| *path)
            .collect();

        progress.begin_phase("methods", eligible.len() as u64);
        let mut processed = 0u64;

        for abs in eligible {
            let rel = scan.rel(abs);

            let methods = match self.extractor.extract_file(abs)? {
                MethodExtraction::Methods(methods) => methods,
                MethodExtraction::Unsupported => Vec::new(),
                MethodExtraction::ParseFailed => {
                    debug!(path = %rel, "Parse failed; treating as zero methods");
                    Vec::new()
                }
            };

            for method in methods {
                let key = format!("{rel}#{}", method.stable_id);
                if self.store.exists(self.app, &key, ElementType::Method).await? {
                    continue;
                }

                let full_path = format!("{}#{}", abs.display(), method.stable_id);
                let request =
                    NodeRequest::method(&full_path, &method.display_name, &method.source_text);
                let markdown = self
                    .backend
                    .summarize(&self.model, self.prompts, &request)
                    .await?;
                let record = parse_summary(
                    &full_path,
                    ElementType::Method,
                    &method.display_name,
                    FileType::Code,
                    Granularity::Method,
                    &markdown,
                );

                self.store.upsert_node(self.app, &key, &record).await?;
                processed += 1;
            }
            progress.advance();
        }

        progress.finish_phase();
        info!(processed, "Method phase complete");
        Ok(processed)
    }

    #[instrument(skip_all, name = "phase_files")]
    async fn process_files(
        &self,
        scan: &ScanResults,
        files: &[(&Path, FileType)],
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<u64> {
        progress.begin_phase("files", files.len() as u64);
        let mut processed = 0u64;

        for (abs, file_type) in files {
            let rel = scan.rel(abs);
            let key = rel.to_string();
            if self.store.exists(self.app, &key, ElementType::File).await? {
                progress.advance();
                continue;
            }

            let name = abs
                .file_name()
                .map_or_else(|| rel.name().to_string(), |n| n.to_string_lossy().into_owned());
            let full_path = abs.display().to_string();

            // Prefer already-persisted method summaries; fall back to raw
            // content when the file yielded none.
            let method_rows = self
                .store
                .method_summaries(self.app, &format!("{key}#"))
                .await?;
            let request = if method_rows.is_empty() {
                let content = std::fs::read_to_string(abs).unwrap_or_default();
                NodeRequest::file(&full_path, &name, *file_type, &content)
            } else {
                NodeRequest::file_with_methods(&full_path, &name, *file_type, &method_rows)
            };

            let markdown = self
                .backend
                .summarize(&self.model, self.prompts, &request)
                .await?;
            let record = parse_summary(
                &full_path,
                ElementType::File,
                &name,
                *file_type,
                Granularity::File,
                &markdown,
            );

            self.store.upsert_node(self.app, &key, &record).await?;
            processed += 1;
            progress.advance();
        }

        progress.finish_phase();
        info!(processed, "File phase complete");
        Ok(processed)
    }

    #[instrument(skip_all, name = "phase_folders")]
    async fn process_folders(
        &self,
        scan: &ScanResults,
        limits: &RunLimits,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<u64> {
        let mut folders: Vec<RelPath> = scan
            .folders
            .iter()
            .map(|abs| scan.rel(abs))
            .filter(|rel| !rel.is_empty())
            .collect();

        // Deepest subtrees first; the sort is stable, so ties keep their
        // original relative order.
        folders.sort_by_key(|rel| std::cmp::Reverse(rel.depth()));
        if let Some(max) = limits.max_folders {
            folders.truncate(max);
        }

        progress.begin_phase("folders", folders.len() as u64);
        let mut processed = 0u64;

        for folder in &folders {
            let key = folder.to_string();
            if self.store.exists(self.app, &key, ElementType::Folder).await? {
                progress.advance();
                continue;
            }

            let mut child_files = Vec::new();
            let mut child_folders = Vec::new();
            for row in self
                .store
                .nodes_by_prefix(self.app, &format!("{key}/"))
                .await?
            {
                let child = RelPath::parse(&row.full_path);
                if !child.is_direct_child_of(folder) {
                    continue;
                }
                match row.element_type {
                    ElementType::File => child_files.push(row),
                    ElementType::Folder => child_folders.push(row),
                    ElementType::Method => {}
                }
            }

            let full_path = scan.root.join(&key).display().to_string();
            let request =
                NodeRequest::folder(&full_path, folder.name(), &child_files, &child_folders);
            let markdown = self
                .backend
                .summarize(&self.model, self.prompts, &request)
                .await?;
            let record = parse_summary(
                &full_path,
                ElementType::Folder,
                folder.name(),
                FileType::NotApplicable,
                Granularity::Folder,
                &markdown,
            );

            self.store.upsert_node(self.app, &key, &record).await?;
            processed += 1;
            progress.advance();
        }

        progress.finish_phase();
        info!(processed, "Folder phase complete");
        Ok(processed)
    }

    /// Codebase-level strict-JSON analysis over the persisted folder
    /// summaries. Skipped (returns `None`) once the analysis exists in run
    /// state; a decode failure of the backend's reply is fatal to this call.
    pub async fn run_codebase_analysis(
        &self,
        scan: &ScanResults,
    ) -> crate::error::Result<Option<serde_json::Value>> {
        if self
            .store
            .run_state(self.app, CODEBASE_ANALYSIS_KEY)
            .await?
            .is_some()
        {
            debug!("Codebase analysis already recorded; skipping");
            return Ok(None);
        }

        let folder_summaries: Vec<serde_json::Value> = self
            .store
            .nodes_by_prefix(self.app, "")
            .await?
            .into_iter()
            .filter(|row| row.element_type == ElementType::Folder)
            .map(|row| {
                json!({
                    "full_path": row.full_path,
                    "name": row.name,
                    "summary_markdown": truncate(&row.summary_markdown, CHILD_MARKDOWN_CAP),
                })
            })
            .collect();

        let request = json!({
            "full_path": scan.root.display().to_string(),
            "element_type": "codebase",
            "folder_summaries": folder_summaries,
        });

        let analysis = self
            .backend
            .analyze(&self.model, self.prompts, &request)
            .await?;
        self.store
            .put_run_state(self.app, CODEBASE_ANALYSIS_KEY, &analysis.to_string())
            .await?;

        info!("Codebase analysis recorded");
        Ok(Some(analysis))
    }
}
