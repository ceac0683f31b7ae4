use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Typed ID wrapper ───────────────────────────────────────────────

/// Row ID of an application+run registration in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppId(pub i64);

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AppId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ── Node classification ────────────────────────────────────────────

/// The unit of summarization a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Method,
    File,
    Folder,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    /// Parse the store's TEXT column form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "method" => Some(Self::Method),
            "file" => Some(Self::File),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of file content, as decided by the scan collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "document")]
    Document,
    /// Folders carry no file type.
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Document => "document",
            Self::NotApplicable => "n/a",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node's level in the method → file → folder hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Method,
    File,
    Folder,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Method => "Method",
            Self::File => "File",
            Self::Folder => "Folder",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Path model ─────────────────────────────────────────────────────

/// A root-relative path as an explicit list of segments.
///
/// All ingestion goes through this type so that depth and child checks never
/// depend on host path separators. The empty path is the scan root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    /// Build from a `/`- or `\`-separated string, dropping empty segments.
    pub fn parse(s: &str) -> Self {
        let segments = s
            .split(['/', '\\'])
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    /// Relativize `abs` against `root`. Falls back to the full path's
    /// components when `abs` is not under `root`.
    pub fn from_absolute(root: &Path, abs: &Path) -> Self {
        let rel = abs.strip_prefix(root).unwrap_or(abs);
        let segments = rel
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(seg) => {
                    Some(seg.to_string_lossy().into_owned())
                }
                _ => None,
            })
            .collect();
        Self { segments }
    }

    /// Depth = number of `/` separators in the joined form (root = 0).
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, or `""` for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// True when `self` sits exactly one level below `parent`.
    pub fn is_direct_child_of(&self, parent: &RelPath) -> bool {
        self.segments.len() == parent.segments.len() + 1
            && self.segments.starts_with(&parent.segments)
    }
}

impl std::fmt::Display for RelPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

// ── Persisted record shape ─────────────────────────────────────────

/// The structured record persisted for every node, serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub full_path: String,
    pub element_type: ElementType,
    pub name: String,
    pub summary: NodeSummary,
    pub metadata: RecordMetadata,
}

/// Parsed summary fields plus the verbatim markdown they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub executive_summary: String,
    pub technical_breakdown: String,
    pub dependencies_and_interactions: DependencySurface,
    pub key_concepts: Vec<String>,
    pub dataflow: String,
    pub unique_terms: Vec<String>,
    pub summary_markdown: String,
}

/// Reserved cross-reference structure. Always empty today; the wire shape is
/// kept so stored records don't change when extraction lands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencySurface {
    pub imports: Vec<String>,
    pub calls_to: Vec<String>,
    pub called_by: Vec<String>,
    pub uses: Vec<String>,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub granularity: Granularity,
    pub file_type: FileType,
}

// ── Store row views ────────────────────────────────────────────────

/// Child method summary row used for file-level aggregation.
#[derive(Debug, Clone)]
pub struct MethodSummaryRow {
    pub name: String,
    pub executive_summary: String,
    pub summary_markdown: String,
}

/// File/folder row view used for folder-level aggregation. `full_path` is
/// the node key (root-relative).
#[derive(Debug, Clone)]
pub struct ChildNodeRow {
    pub full_path: String,
    pub element_type: ElementType,
    pub name: String,
    pub summary_markdown: String,
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_path_depth_counts_separators() {
        assert_eq!(RelPath::parse("").depth(), 0);
        assert_eq!(RelPath::parse("a").depth(), 0);
        assert_eq!(RelPath::parse("a/b").depth(), 1);
        assert_eq!(RelPath::parse("a/b/c.java").depth(), 2);
    }

    #[test]
    fn rel_path_normalizes_backslashes() {
        let p = RelPath::parse(r"a\b\c.java");
        assert_eq!(p.to_string(), "a/b/c.java");
        assert_eq!(p.depth(), 2);
    }

    #[test]
    fn rel_path_direct_child() {
        let parent = RelPath::parse("a/b");
        assert!(RelPath::parse("a/b/x.rs").is_direct_child_of(&parent));
        assert!(RelPath::parse("a/b/c").is_direct_child_of(&parent));
        assert!(!RelPath::parse("a/b/c/d").is_direct_child_of(&parent));
        assert!(!RelPath::parse("a/bb/x.rs").is_direct_child_of(&parent));
        assert!(!RelPath::parse("a/b").is_direct_child_of(&parent));
    }

    #[test]
    fn rel_path_from_absolute() {
        let root = Path::new("/repo/project");
        let p = RelPath::from_absolute(root, Path::new("/repo/project/src/main.rs"));
        assert_eq!(p.to_string(), "src/main.rs");
        assert_eq!(p.name(), "main.rs");

        // Outside the root: fall back to the path's own components.
        let q = RelPath::from_absolute(root, Path::new("/elsewhere/x.rs"));
        assert_eq!(q.to_string(), "elsewhere/x.rs");
    }

    #[test]
    fn rel_path_root_is_empty() {
        let root = Path::new("/repo");
        let p = RelPath::from_absolute(root, Path::new("/repo"));
        assert!(p.is_empty());
        assert_eq!(p.name(), "");
    }

    #[test]
    fn element_type_round_trip() {
        for et in [ElementType::Method, ElementType::File, ElementType::Folder] {
            assert_eq!(ElementType::parse(et.as_str()), Some(et));
        }
        assert_eq!(ElementType::parse("module"), None);
    }

    #[test]
    fn file_type_serializes_na() {
        let json = serde_json::to_string(&FileType::NotApplicable).unwrap();
        assert_eq!(json, "\"n/a\"");
    }

    #[test]
    fn record_serializes_reserved_dependency_surface() {
        let record = NodeRecord {
            full_path: "/repo/a.rs".into(),
            element_type: ElementType::File,
            name: "a.rs".into(),
            summary: NodeSummary {
                executive_summary: "x".into(),
                technical_breakdown: String::new(),
                dependencies_and_interactions: DependencySurface::default(),
                key_concepts: vec![],
                dataflow: String::new(),
                unique_terms: vec![],
                summary_markdown: "raw".into(),
            },
            metadata: RecordMetadata {
                granularity: Granularity::File,
                file_type: FileType::Code,
            },
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["element_type"], "file");
        assert_eq!(v["metadata"]["granularity"], "File");
        assert!(
            v["summary"]["dependencies_and_interactions"]["imports"]
                .as_array()
                .unwrap()
                .is_empty()
        );
    }
}
