//! Per-node request payloads sent to the backend.
//!
//! Requests carry either raw content (methods, files without known methods)
//! or child summaries (files with methods, folders). Every embedded text is
//! capped with a hard character cut plus an explicit marker — truncation is
//! never silent.

use serde::Serialize;

use crate::types::{ChildNodeRow, ElementType, FileType, MethodSummaryRow};

/// Raw method source cap, in characters.
pub const METHOD_CONTENT_CAP: usize = 6000;
/// Raw file content cap, in characters.
pub const FILE_CONTENT_CAP: usize = 8000;
/// Child executive-summary cap, in characters.
pub const EXEC_SUMMARY_CAP: usize = 800;
/// Child raw-markdown cap, in characters.
pub const CHILD_MARKDOWN_CAP: usize = 2000;
/// Marker appended whenever a cap cuts content.
pub const TRUNCATION_MARKER: &str = "\n...<truncated>...";

/// Hard character cut with the explicit marker appended when content is cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// The serialized request for one node. Field presence mirrors the element
/// type: methods and content-files carry `content`, files with known methods
/// carry `method_summaries`, folders always carry both child lists.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRequest {
    pub full_path: String,
    pub element_type: ElementType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_summaries: Option<Vec<MethodSummaryRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_summaries: Option<Vec<ChildSummaryRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder_summaries: Option<Vec<ChildSummaryRef>>,
}

/// A child method's summary, embedded in its file's request.
#[derive(Debug, Clone, Serialize)]
pub struct MethodSummaryRef {
    pub name: String,
    pub executive_summary: String,
    pub summary_markdown: String,
}

/// A child file's or subfolder's summary, embedded in its folder's request.
#[derive(Debug, Clone, Serialize)]
pub struct ChildSummaryRef {
    pub full_path: String,
    pub name: String,
    pub summary_markdown: String,
}

impl NodeRequest {
    /// Method granularity: raw source, capped.
    pub fn method(full_path: &str, name: &str, source_text: &str) -> Self {
        Self {
            full_path: full_path.to_string(),
            element_type: ElementType::Method,
            name: name.to_string(),
            file_type: Some(FileType::Code),
            content: Some(truncate(source_text, METHOD_CONTENT_CAP)),
            method_summaries: None,
            file_summaries: None,
            subfolder_summaries: None,
        }
    }

    /// File granularity without known methods: raw content, capped.
    pub fn file(full_path: &str, name: &str, file_type: FileType, content: &str) -> Self {
        Self {
            full_path: full_path.to_string(),
            element_type: ElementType::File,
            name: name.to_string(),
            file_type: Some(file_type),
            content: Some(truncate(content, FILE_CONTENT_CAP)),
            method_summaries: None,
            file_summaries: None,
            subfolder_summaries: None,
        }
    }

    /// File granularity with known methods: child summaries, no raw content.
    pub fn file_with_methods(
        full_path: &str,
        name: &str,
        file_type: FileType,
        methods: &[MethodSummaryRow],
    ) -> Self {
        let method_summaries = methods
            .iter()
            .map(|m| MethodSummaryRef {
                name: m.name.clone(),
                executive_summary: truncate(&m.executive_summary, EXEC_SUMMARY_CAP),
                summary_markdown: truncate(&m.summary_markdown, CHILD_MARKDOWN_CAP),
            })
            .collect();
        Self {
            full_path: full_path.to_string(),
            element_type: ElementType::File,
            name: name.to_string(),
            file_type: Some(file_type),
            content: None,
            method_summaries: Some(method_summaries),
            file_summaries: None,
            subfolder_summaries: None,
        }
    }

    /// Folder granularity: immediate child files and subfolders as two
    /// ordered lists; raw file content never appears at this level.
    pub fn folder(
        full_path: &str,
        name: &str,
        child_files: &[ChildNodeRow],
        child_folders: &[ChildNodeRow],
    ) -> Self {
        let to_ref = |row: &ChildNodeRow| ChildSummaryRef {
            full_path: row.full_path.clone(),
            name: row.name.clone(),
            summary_markdown: truncate(&row.summary_markdown, CHILD_MARKDOWN_CAP),
        };
        Self {
            full_path: full_path.to_string(),
            element_type: ElementType::Folder,
            name: name.to_string(),
            file_type: None,
            content: None,
            method_summaries: None,
            file_summaries: Some(child_files.iter().map(to_ref).collect()),
            subfolder_summaries: Some(child_folders.iter().map(to_ref).collect()),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_content_passes_through() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("", 1), "");
    }

    #[test]
    fn truncation_appends_marker() {
        let input = "x".repeat(100);
        let out = truncate(&input, 40);
        assert!(out.starts_with(&"x".repeat(40)));
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            out.chars().count(),
            40 + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let input = "héllo wörld ünïcode çhars".repeat(20);
        let out = truncate(&input, 30);
        let body: String = out.chars().take(30).collect();
        let prefix: String = input.chars().take(30).collect();
        assert_eq!(body, prefix);
    }

    proptest! {
        #[test]
        fn truncation_law(s in ".{0,300}", cap in 1usize..150) {
            let out = truncate(&s, cap);
            let n = s.chars().count();
            if n <= cap {
                prop_assert_eq!(&out, &s);
            } else {
                prop_assert_eq!(
                    out.chars().count(),
                    cap + TRUNCATION_MARKER.chars().count()
                );
                let body: String = out.chars().take(cap).collect();
                let prefix: String = s.chars().take(cap).collect();
                prop_assert_eq!(body, prefix);
            }
        }
    }

    #[test]
    fn method_request_caps_source() {
        let source = "a".repeat(METHOD_CONTENT_CAP + 50);
        let req = NodeRequest::method("/r/F.java#method:F.f(0)", "F.f()", &source);
        let content = req.content.unwrap();
        assert!(content.ends_with(TRUNCATION_MARKER));
        let v = serde_json::to_value(NodeRequest::method("/r/F.java#m", "F.f()", "short"))
            .unwrap();
        assert_eq!(v["element_type"], "method");
        assert_eq!(v["file_type"], "code");
        assert!(v.get("method_summaries").is_none());
        assert!(v.get("file_summaries").is_none());
    }

    #[test]
    fn file_with_methods_omits_content() {
        let rows = vec![crate::types::MethodSummaryRow {
            name: "F.f()".into(),
            executive_summary: "e".repeat(EXEC_SUMMARY_CAP + 10),
            summary_markdown: "m".repeat(CHILD_MARKDOWN_CAP + 10),
        }];
        let req = NodeRequest::file_with_methods("/r/F.java", "F.java", FileType::Code, &rows);
        assert!(req.content.is_none());
        let methods = req.method_summaries.as_ref().unwrap();
        assert!(methods[0].executive_summary.ends_with(TRUNCATION_MARKER));
        assert!(methods[0].summary_markdown.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn folder_request_always_has_both_lists() {
        let req = NodeRequest::folder("/r/a", "a", &[], &[]);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v["file_summaries"].as_array().unwrap().is_empty());
        assert!(v["subfolder_summaries"].as_array().unwrap().is_empty());
        assert!(v.get("content").is_none());
        assert!(v.get("file_type").is_none());
    }
}
