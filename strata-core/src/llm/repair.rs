//! Lenient recovery of a JSON object from noisy backend text.
//!
//! Local models wrap JSON in code fences and leave raw control characters
//! inside string literals; both break strict decoding. Repair strips the
//! fences, cuts out the first balanced object, and rewrites in-string
//! control characters as escapes before handing the text to `serde_json`.

use crate::error::LlmError;

/// Outcome of the best-effort object extraction.
///
/// `was_balanced` is false when no closing brace matched the first opening
/// one (the text from the first `{` onward is returned); callers decide
/// whether a truncated extraction is worth decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedJson {
    pub text: String,
    pub was_balanced: bool,
}

/// Run the full repair: defence, extract, escape. Never fails; decoding the
/// result still can.
pub fn repair(text: &str) -> RepairedJson {
    let defenced = strip_fences(text);
    let (extracted, was_balanced) = extract_first_object(defenced);
    RepairedJson {
        text: escape_control_chars(&extracted),
        was_balanced,
    }
}

/// Repair and decode in one step; a residual syntax error is a decode error.
pub fn parse_object(text: &str) -> Result<serde_json::Value, LlmError> {
    let repaired = repair(text);
    serde_json::from_str(&repaired.text).map_err(|e| LlmError::Decode(e.to_string()))
}

/// Drop a leading fence line and everything from the last fence marker on.
fn strip_fences(text: &str) -> &str {
    let mut t = text.trim();
    if !t.starts_with("```") {
        return t;
    }
    if let Some(i) = t.find('\n') {
        t = &t[i + 1..];
    }
    if let Some(i) = t.rfind("```") {
        t = &t[..i];
    }
    t.trim()
}

/// Substring from the first `{` through the brace that closes it, tracking
/// string and escape state so braces inside literals don't count. Returns
/// the tail of the text (balanced = false) when depth never returns to zero.
fn extract_first_object(text: &str) -> (String, bool) {
    let Some(start) = text.find('{') else {
        return (text.to_string(), false);
    };

    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (text[start..=start + i].to_string(), true);
                }
            }
            _ => {}
        }
    }

    (text[start..].to_string(), false)
}

/// Rewrite literal newline/carriage-return/tab characters inside string
/// literals as their two-character escapes; pass everything else through.
fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }

    out
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_decodes() {
        let value = parse_object("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn fence_without_language_tag() {
        let value = parse_object("```\n{\"ok\": true}\n```").unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn literal_newline_inside_string_is_escaped() {
        let value = parse_object("{\"a\":\"line1\nline2\"}").unwrap();
        assert_eq!(value["a"], "line1\nline2");
    }

    #[test]
    fn tabs_and_carriage_returns_are_escaped() {
        let value = parse_object("{\"a\":\"col1\tcol2\r\"}").unwrap();
        assert_eq!(value["a"], "col1\tcol2\r");
    }

    #[test]
    fn surrounding_prose_is_cut_away() {
        let value =
            parse_object("Here you go:\n{\"n\": {\"inner\": 2}}\nHope that helps!").unwrap();
        assert_eq!(value["n"]["inner"], 2);
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_object() {
        let value = parse_object("{\"brace\": \"}\", \"x\": 1}").unwrap();
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn escaped_quotes_keep_string_state() {
        let value = parse_object("{\"q\": \"she said \\\"hi\\\"\"}").unwrap();
        assert_eq!(value["q"], "she said \"hi\"");
    }

    #[test]
    fn unbalanced_object_is_best_effort() {
        let repaired = repair("{\"a\": {\"b\": 1}");
        assert!(!repaired.was_balanced);
        assert!(repaired.text.starts_with('{'));
        // Decoding the truncated span is the caller's risk.
        assert!(parse_object("{\"a\": {\"b\": 1}").is_err());
    }

    #[test]
    fn balanced_extraction_sets_the_flag() {
        let repaired = repair("junk {\"a\": 1} trailing");
        assert!(repaired.was_balanced);
        assert_eq!(repaired.text, "{\"a\": 1}");
    }

    #[test]
    fn no_object_at_all_fails_decode() {
        assert!(parse_object("no json here").is_err());
    }
}
