//! Tolerant parsing of structured model output
//!
//! Models asked for JSON often return almost-JSON: wrapped in markdown
//! fences, preceded by a sentence of chatter, or with a trailing comma
//! before a closing bracket. [`repair_json`] fixes those defects and
//! [`parse_tolerant`] parses the result, failing with
//! [`LlmError::MalformedOutput`] when nothing usable remains.

use crate::LlmError;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tracing::debug;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("trailing comma pattern is valid"));

const MAX_ERROR_EXCERPT: usize = 200;

/// Repair common formatting defects in model-produced JSON
///
/// # Examples
///
/// ```
/// use argmap_llm::json::repair_json;
///
/// let raw = "```json\n[\"a\", \"b\",]\n```";
/// assert_eq!(repair_json(raw), "[\"a\", \"b\"]");
/// ```
pub fn repair_json(raw: &str) -> String {
    let unfenced = strip_fences(raw.trim());
    let body = outermost_value(unfenced).unwrap_or(unfenced);
    let quoted = string_mask(body);
    TRAILING_COMMA
        .replace_all(body, |caps: &Captures| {
            let whole = &caps[0];
            match caps.get(0) {
                Some(m) if quoted[m.start()] => whole.to_string(),
                _ => caps[1].to_string(),
            }
        })
        .into_owned()
}

/// For every byte of `text`, whether it lies inside a string literal
fn string_mask(text: &str) -> Vec<bool> {
    let mut mask = Vec::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        let inside = in_string;
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else if byte == b'"' {
            in_string = true;
        }
        mask.push(inside || in_string);
    }
    mask
}

/// Parse model output into `T`, repairing it first if needed
pub fn parse_tolerant<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    if let Ok(value) = serde_json::from_str(raw.trim()) {
        return Ok(value);
    }
    let repaired = repair_json(raw);
    serde_json::from_str(&repaired).map_err(|e| {
        debug!("Unparseable structured output: {}", raw);
        let excerpt: String = raw.chars().take(MAX_ERROR_EXCERPT).collect();
        LlmError::MalformedOutput(format!("{} in {:?}", e, excerpt))
    })
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json) up to the first newline
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn outermost_value(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Premises {
        premises: Vec<String>,
    }

    #[test]
    fn test_trailing_comma_in_array() {
        let parsed: Vec<String> = parse_tolerant(r#"["first", "second",]"#).unwrap();
        assert_eq!(parsed, vec!["first", "second"]);
    }

    #[test]
    fn test_trailing_comma_in_nested_object() {
        let raw = "{\"premises\": [\"A\", \"B\",\n],\n}";
        let parsed: Premises = parse_tolerant(raw).unwrap();
        assert_eq!(parsed.premises, vec!["A", "B"]);
    }

    #[test]
    fn test_fenced_output_with_chatter() {
        let raw = "Sure! Here is the JSON:\n{\"premises\": [\"A\"]}\nHope this helps.";
        let parsed: Premises = parse_tolerant(raw).unwrap();
        assert_eq!(parsed.premises, vec!["A"]);

        let fenced = "```json\n{\"premises\": []}\n```";
        let parsed: Premises = parse_tolerant(fenced).unwrap();
        assert!(parsed.premises.is_empty());
    }

    #[test]
    fn test_unrecoverable_output() {
        let result: Result<Premises, _> = parse_tolerant("I cannot answer that.");
        assert!(matches!(result, Err(LlmError::MalformedOutput(_))));
    }

    #[test]
    fn test_commas_inside_strings_kept() {
        let raw = "Here you go:\n[\"Costs rise (fuel, ]power)\", \"Jobs move\",]";
        let parsed: Vec<String> = parse_tolerant(raw).unwrap();
        assert_eq!(parsed, vec!["Costs rise (fuel, ]power)", "Jobs move"]);

        let raw = r#"{"premises": ["Say \"yes, }\" twice", "B",],}"#;
        let parsed: Premises = parse_tolerant(raw).unwrap();
        assert_eq!(parsed.premises, vec![r#"Say "yes, }" twice"#, "B"]);
    }

    #[test]
    fn test_clean_json_untouched() {
        assert_eq!(repair_json("[1, 2]"), "[1, 2]");
    }
}
