//! Parsing of the backend's semi-structured markdown reply.
//!
//! The backend is instructed to emit numbered `### N.` section headings.
//! Local models drift from that contract constantly, so the parser never
//! fails: missing sections become empty fields and the verbatim markdown is
//! always retained alongside whatever structure was recovered.

use std::collections::HashMap;

use crate::types::{
    DependencySurface, ElementType, FileType, Granularity, NodeRecord, NodeSummary,
    RecordMetadata,
};

/// Cap on parsed key-concept bullets.
pub const KEY_CONCEPTS_CAP: usize = 50;
/// Cap on parsed unique-term bullets.
pub const UNIQUE_TERMS_CAP: usize = 100;

/// Parse a raw markdown reply into the persisted record for one node.
pub fn parse_summary(
    full_path: &str,
    element_type: ElementType,
    name: &str,
    file_type: FileType,
    granularity: Granularity,
    markdown: &str,
) -> NodeRecord {
    let sections = split_sections(markdown);
    let section = |key: char| sections.get(&key).map_or("", String::as_str).trim();

    NodeRecord {
        full_path: full_path.to_string(),
        element_type,
        name: name.to_string(),
        summary: NodeSummary {
            executive_summary: section('1').to_string(),
            technical_breakdown: section('2').to_string(),
            // Section 3 text is parsed but the structured surface stays
            // reserved until cross-reference extraction exists.
            dependencies_and_interactions: DependencySurface::default(),
            key_concepts: parse_bullets(section('4'), KEY_CONCEPTS_CAP),
            dataflow: section('5').to_string(),
            unique_terms: parse_bullets(section('6'), UNIQUE_TERMS_CAP),
            summary_markdown: markdown.trim().to_string(),
        },
        metadata: RecordMetadata {
            granularity,
            file_type,
        },
    }
}

/// Split markdown into sections keyed by the heading digit. Text before the
/// first recognized heading is discarded; unrecognized headings do not start
/// a new section.
fn split_sections(markdown: &str) -> HashMap<char, String> {
    let mut sections: HashMap<char, String> = HashMap::new();
    let mut current: Option<char> = None;

    let normalized = markdown.replace('\r', "");
    for line in normalized.split('\n') {
        if let Some(key) = section_key(line.trim()) {
            current = Some(key);
            sections.entry(key).or_default();
            continue;
        }
        if let Some(key) = current {
            let buf = sections.entry(key).or_default();
            buf.push_str(line);
            buf.push('\n');
        }
    }

    sections
}

/// `### <digit>.` headings name a section; anything else is body text.
fn section_key(trimmed_line: &str) -> Option<char> {
    let rest = trimmed_line.strip_prefix("###")?.trim_start();
    let mut chars = rest.chars();
    let digit = chars.next().filter(char::is_ascii_digit)?;
    (chars.next() == Some('.')).then_some(digit)
}

/// Collect `- ` bullet items from a section body, up to `max_items`.
fn parse_bullets(text: &str, max_items: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.split('\n') {
        if out.len() >= max_items {
            break;
        }
        let t = line.trim();
        if let Some(item) = t.strip_prefix("- ") {
            let item = item.trim();
            if !item.is_empty() {
                out.push(item.to_string());
            }
        }
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markdown: &str) -> NodeRecord {
        parse_summary(
            "/repo/src/a.rs",
            ElementType::File,
            "a.rs",
            FileType::Code,
            Granularity::File,
            markdown,
        )
    }

    #[test]
    fn maps_numbered_sections_to_fields() {
        let record = parse(
            "### 1. Executive Summary\nfoo bar\n### 2. Technical Breakdown\nbaz",
        );
        assert_eq!(record.summary.executive_summary, "foo bar");
        assert_eq!(record.summary.technical_breakdown, "baz");
        assert_eq!(record.summary.dataflow, "");
    }

    #[test]
    fn preamble_before_first_heading_is_discarded() {
        let record = parse("Sure, here is the summary:\n\n### 1. Executive Summary\nactual");
        assert_eq!(record.summary.executive_summary, "actual");
        // But the verbatim markdown keeps it all.
        assert!(record.summary.summary_markdown.starts_with("Sure,"));
    }

    #[test]
    fn unrecognized_heading_continues_active_section() {
        let record = parse("### 1. Executive Summary\nfirst\n### Notes\nsecond\n");
        assert_eq!(record.summary.executive_summary, "first\n### Notes\nsecond");
    }

    #[test]
    fn bullets_are_collected_in_order() {
        let record = parse(
            "### 4. Key Concepts\n- alpha\nprose in between\n-not a bullet\n- beta\n-    \n### 6. Unique Terms\n  - gamma\n",
        );
        assert_eq!(record.summary.key_concepts, vec!["alpha", "beta"]);
        assert_eq!(record.summary.unique_terms, vec!["gamma"]);
    }

    #[test]
    fn key_concepts_cap_at_fifty() {
        let mut md = String::from("### 4. Key Concepts\n");
        for i in 0..60 {
            md.push_str(&format!("- item {i}\n"));
        }
        let record = parse(&md);
        assert_eq!(record.summary.key_concepts.len(), 50);
        assert_eq!(record.summary.key_concepts[0], "item 0");
        assert_eq!(record.summary.key_concepts[49], "item 49");
    }

    #[test]
    fn missing_sections_never_fail() {
        let record = parse("no headings here at all");
        assert_eq!(record.summary.executive_summary, "");
        assert!(record.summary.key_concepts.is_empty());
        assert_eq!(record.summary.summary_markdown, "no headings here at all");
    }

    #[test]
    fn crlf_replies_parse_like_lf() {
        let record = parse("### 1. Executive Summary\r\nwindows text\r\n### 5. Data Flow\r\nflows\r\n");
        assert_eq!(record.summary.executive_summary, "windows text");
        assert_eq!(record.summary.dataflow, "flows");
    }

    #[test]
    fn section_zero_is_recognized_but_unmapped() {
        let record = parse("### 0. Metadata\nGranularity: File\n### 1. Executive Summary\nreal\n");
        assert_eq!(record.summary.executive_summary, "real");
    }

    #[test]
    fn raw_markdown_is_trimmed() {
        let record = parse("\n\n### 1. Executive Summary\nx\n\n");
        assert!(record.summary.summary_markdown.starts_with("###"));
        assert!(!record.summary.summary_markdown.ends_with('\n'));
    }
}
