//! Method extraction over tree-sitter.
//!
//! One file in, an ordered list of method/constructor units out. Identity is
//! syntactic only (enclosing type, declaration name, parameter count), so
//! reformatting or editing a body never changes a unit's stable id.

pub mod java;
pub mod python;
pub mod rust;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::ExtractError;

/// A method or constructor lifted from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMethod {
    /// `kind:TypeName.methodName(paramCount)` — the node key suffix.
    pub stable_id: String,
    /// Human-oriented name, e.g. `Widget.grow(int by)`.
    pub display_name: String,
    /// Exact line range of the declaration, `""` when unavailable.
    pub source_text: String,
}

/// Outcome of method extraction over one file.
///
/// Callers treat `Unsupported` and `ParseFailed` as "no methods"; only
/// `ParseFailed` is worth logging.
#[derive(Debug)]
pub enum MethodExtraction {
    Methods(Vec<ExtractedMethod>),
    /// The file's extension is not in the language registry.
    Unsupported,
    /// Tree-sitter could not produce an error-free syntax tree.
    ParseFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Ctor,
}

impl MethodKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Ctor => "ctor",
        }
    }
}

/// Raw declaration facts a language implementation hands back.
/// Lines are 1-indexed and inclusive.
#[derive(Debug)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub type_name: String,
    pub method_name: String,
    pub param_count: usize,
    /// Parameter list text including parentheses, e.g. `(int by)`.
    pub params_text: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Trait implemented by each language's method-extraction support.
pub trait MethodLanguage: Send + Sync + std::fmt::Debug {
    /// Language identifier (e.g. "java").
    fn id(&self) -> &'static str;

    /// File extensions this language handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Tree-sitter grammar for parsing.
    fn grammar(&self) -> tree_sitter::Language;

    /// Collect methods/constructors declared directly inside type bodies.
    fn collect(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<MethodDecl>;
}

/// Registry of all supported languages, keyed by file extension.
#[derive(Debug)]
pub struct LanguageRegistry {
    extension_map: HashMap<String, Arc<dyn MethodLanguage>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            extension_map: HashMap::new(),
        };
        reg.register(Arc::new(java::JavaMethods));
        reg.register(Arc::new(rust::RustMethods));
        reg.register(Arc::new(python::PythonMethods));
        reg
    }

    fn register(&mut self, lang: Arc<dyn MethodLanguage>) {
        for ext in lang.extensions() {
            self.extension_map.insert((*ext).to_string(), lang.clone());
        }
    }

    /// Look up the language support for a file by its extension.
    pub fn for_file(&self, path: &Path) -> Option<Arc<dyn MethodLanguage>> {
        let ext = path.extension()?.to_str()?;
        self.extension_map.get(ext).cloned()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Front door for method extraction: resolves the language, parses, and
/// assembles [`ExtractedMethod`] values with stable ids and source slices.
#[derive(Debug, Default)]
pub struct MethodExtractor {
    registry: LanguageRegistry,
}

impl MethodExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the file's extension maps to a registered language.
    pub fn supports(&self, path: &Path) -> bool {
        self.registry.for_file(path).is_some()
    }

    /// Extract from a file on disk. IO errors propagate; parse failures
    /// degrade to [`MethodExtraction::ParseFailed`].
    pub fn extract_file(&self, path: &Path) -> Result<MethodExtraction, ExtractError> {
        let Some(lang) = self.registry.for_file(path) else {
            return Ok(MethodExtraction::Unsupported);
        };
        let source = std::fs::read_to_string(path)?;
        self.extract_with(&lang, &source)
    }

    /// Extract from in-memory source, language resolved from `path`.
    pub fn extract_source(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<MethodExtraction, ExtractError> {
        let Some(lang) = self.registry.for_file(path) else {
            return Ok(MethodExtraction::Unsupported);
        };
        self.extract_with(&lang, source)
    }

    fn extract_with(
        &self,
        lang: &Arc<dyn MethodLanguage>,
        source: &str,
    ) -> Result<MethodExtraction, ExtractError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&lang.grammar())
            .map_err(|e| ExtractError::Grammar {
                language: lang.id().to_string(),
                message: e.to_string(),
            })?;

        let Some(tree) = parser.parse(source, None) else {
            return Ok(MethodExtraction::ParseFailed);
        };
        // Partial parses are not attempted.
        if tree.root_node().has_error() {
            debug!(language = lang.id(), "Syntax errors; skipping method extraction");
            return Ok(MethodExtraction::ParseFailed);
        }

        let lines: Vec<&str> = source.lines().collect();
        let methods = lang
            .collect(&tree, source)
            .into_iter()
            .map(|decl| ExtractedMethod {
                stable_id: format!(
                    "{}:{}.{}({})",
                    decl.kind.tag(),
                    decl.type_name,
                    decl.method_name,
                    decl.param_count
                ),
                display_name: format!(
                    "{}.{}{}",
                    decl.type_name, decl.method_name, decl.params_text
                ),
                source_text: slice_lines(&lines, decl.start_line, decl.end_line),
            })
            .collect();

        Ok(MethodExtraction::Methods(methods))
    }
}

/// Reconstruct an inclusive 1-indexed line range from the file's lines.
fn slice_lines(lines: &[&str], start_line: usize, end_line: usize) -> String {
    let start = start_line.max(1);
    let end = end_line.min(lines.len());
    if start > end {
        return String::new();
    }
    let mut out = String::new();
    for line in &lines[start - 1..end] {
        out.push_str(line);
        out.push('\n');
    }
    out
}

// ── Shared tree-sitter helpers ─────────────────────────────────────

/// Extract the source text for a tree-sitter node.
pub(crate) fn node_text<'a>(node: tree_sitter::Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// 1-indexed start/end lines of a node.
pub(crate) fn node_lines(node: tree_sitter::Node<'_>) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension() {
        let extractor = MethodExtractor::new();
        let result = extractor
            .extract_source(Path::new("notes.md"), "# not code")
            .unwrap();
        assert!(matches!(result, MethodExtraction::Unsupported));
        assert!(!extractor.supports(Path::new("notes.md")));
        assert!(extractor.supports(Path::new("Widget.java")));
    }

    #[test]
    fn broken_source_degrades_to_parse_failed() {
        let extractor = MethodExtractor::new();
        let result = extractor
            .extract_source(Path::new("Broken.java"), "public class { {{{")
            .unwrap();
        assert!(matches!(result, MethodExtraction::ParseFailed));
    }

    #[test]
    fn slice_lines_is_inclusive_and_clamped() {
        let lines = vec!["one", "two", "three"];
        assert_eq!(slice_lines(&lines, 2, 3), "two\nthree\n");
        assert_eq!(slice_lines(&lines, 1, 99), "one\ntwo\nthree\n");
        assert_eq!(slice_lines(&lines, 5, 6), "");
    }

    #[test]
    fn stable_id_survives_body_edits() {
        let extractor = MethodExtractor::new();
        let before = "public class A {\n    int f(int x) { return x; }\n}\n";
        let after = "public class A {\n    int f(int x) {\n        int y = x * 2;\n        return y;\n    }\n}\n";

        let id = |src: &str| -> String {
            match extractor.extract_source(Path::new("A.java"), src).unwrap() {
                MethodExtraction::Methods(ms) => ms[0].stable_id.clone(),
                _ => panic!("expected methods"),
            }
        };
        assert_eq!(id(before), id(after));
        assert_eq!(id(before), "method:A.f(1)");
    }
}
