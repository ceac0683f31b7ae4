use std::path::Path;

/// Instruction texts sent with every backend call.
///
/// Built-in compact prompts keep requests small for local models with short
/// context windows; a prompts directory can override either text.
#[derive(Debug, Clone)]
pub struct PromptBundle {
    summary_definition: String,
    bottom_up_analysis: String,
}

const SUMMARY_DEFINITION_FILE: &str = "summary_definition.md";
const BOTTOM_UP_ANALYSIS_FILE: &str = "bottom_up_analysis.md";

impl PromptBundle {
    /// The built-in compact prompts.
    pub fn compact() -> Self {
        Self {
            summary_definition: compact_summary_definition(),
            bottom_up_analysis: compact_bottom_up_analysis(),
        }
    }

    /// Use prompt files from `prompts_dir` when present, else the built-ins.
    /// The analysis prompt is compacted to its output contract when it
    /// carries a `## JSON Output` heading.
    pub fn load_or_default(prompts_dir: &Path) -> Self {
        let mut bundle = Self::compact();
        if let Ok(text) = std::fs::read_to_string(prompts_dir.join(SUMMARY_DEFINITION_FILE)) {
            if !text.trim().is_empty() {
                bundle.summary_definition = text;
            }
        }
        if let Ok(text) = std::fs::read_to_string(prompts_dir.join(BOTTOM_UP_ANALYSIS_FILE)) {
            if !text.trim().is_empty() {
                bundle.bottom_up_analysis = compact_from_heading(&text, "## JSON Output");
            }
        }
        bundle
    }

    pub fn summary_definition(&self) -> &str {
        &self.summary_definition
    }

    pub fn bottom_up_analysis(&self) -> &str {
        &self.bottom_up_analysis
    }

    /// The single combined user message for one summarization call. Some
    /// llama.cpp chat templates reject the system role, so all instructions
    /// ride in one user message.
    pub fn summary_instruction(&self, request_json: &str) -> String {
        format!(
            "{}\n\nInput JSON:\n{}\n\nOutput requirements:\n\
             - Return ONLY the Markdown summary (no JSON, no code fences).\n\
             - Use the exact numbered section headings 0.-6., in order.\n\
             - Keep it concise; prefer bullets.",
            self.summary_definition, request_json
        )
    }

    /// The combined user message for the strict-JSON analysis call.
    pub fn analysis_instruction(&self, request_json: &str) -> String {
        format!(
            "{}\n\nInput JSON:\n{}\n\nOutput requirements:\n\
             - Return ONLY a single JSON object (no prose, no code fences).",
            self.bottom_up_analysis, request_json
        )
    }
}

/// Keep only the output contract of a long prompt when the heading exists.
fn compact_from_heading(text: &str, heading: &str) -> String {
    match text.find(heading) {
        Some(i) => text[i..].to_string(),
        None => text.to_string(),
    }
}

fn compact_summary_definition() -> String {
    "You summarize ONE node of a codebase at a time and produce a Markdown \
     summary usable as context when summarizing the node's parent.\n\n\
     Context keys you may be given: granularity=Method|File|Folder, \
     file_type=code|document|n/a. If unknown, infer conservatively.\n\n\
     Your Markdown output MUST have these sections, in this exact order:\n\
     0. Metadata (Granularity, FileType, Name, Path)\n\
     1. Executive Summary\n\
     2. Technical / Content Breakdown\n\
     3. Dependencies & Interactions\n\
     4. Key Concepts\n\
     5. Data / Information Flow\n\
     6. Unique Terms\n\n\
     Strategy:\n\
     - Method+code: single responsibility, step-by-step flow, direct \
     calls, inputs/outputs, unique identifiers.\n\
     - File+code: synthesize file responsibility across contained methods; \
     mention entry points, helpers, imports, state, IO.\n\
     - File+document: summarize purpose/audience, section structure, \
     commands/config mentioned, procedures and expected outcomes.\n\
     - Folder: cover both code and document perspectives; if one type is \
     absent, say so explicitly.\n\n\
     Stay grounded in the provided content; if it is truncated or \
     ambiguous, say so."
        .to_string()
}

fn compact_bottom_up_analysis() -> String {
    "You are given the persisted folder and file summaries of a whole \
     codebase, produced bottom-up. Synthesize ONE codebase-level analysis \
     as a JSON object with keys: \"purpose\" (string), \"architecture\" \
     (string), \"major_components\" (array of strings), \"risks\" (array \
     of strings). Ground every claim in the supplied summaries."
        .to_string()
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_instruction_embeds_request_and_contract() {
        let bundle = PromptBundle::compact();
        let msg = bundle.summary_instruction("{\"name\":\"a.rs\"}");
        assert!(msg.contains("{\"name\":\"a.rs\"}"));
        assert!(msg.contains("1. Executive Summary"));
        assert!(msg.contains("no code fences"));
    }

    #[test]
    fn load_or_default_prefers_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(SUMMARY_DEFINITION_FILE),
            "custom summary prompt",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join(BOTTOM_UP_ANALYSIS_FILE),
            "long preamble\n## JSON Output\nreturn {\"x\": 1}",
        )
        .unwrap();

        let bundle = PromptBundle::load_or_default(tmp.path());
        assert_eq!(bundle.summary_definition(), "custom summary prompt");
        assert!(bundle.bottom_up_analysis().starts_with("## JSON Output"));
    }

    #[test]
    fn missing_prompt_files_fall_back_to_compact() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = PromptBundle::load_or_default(tmp.path());
        assert!(bundle.summary_definition().contains("Executive Summary"));
    }
}
