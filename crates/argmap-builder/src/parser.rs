//! Validation of structured model output
//!
//! The loosely-shaped JSON the model produces is turned into explicit
//! records here, before anything downstream sees it.

use argmap_domain::{ArgumentCandidate, Valence};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Premise list, as an object or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PremisesOutput {
    Object { premises: Vec<String> },
    List(Vec<String>),
}

/// Ranking, as an object or a bare array of labels or numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RankingOutput {
    Object { ranking: Vec<Value> },
    List(Vec<Value>),
}

/// Argument batch, as an object or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ArgumentsOutput {
    Object { arguments: Vec<ArgumentItem> },
    List(Vec<ArgumentItem>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ArgumentItem {
    Pair {
        #[serde(alias = "title")]
        label: String,
        #[serde(alias = "statement")]
        claim: String,
    },
    Line(String),
}

/// Selected labels, as strings or `{label}` objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SelectionOutput {
    Object { selected: Vec<LabelItem> },
    List(Vec<LabelItem>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LabelItem {
    Text(String),
    Object { label: String },
}

/// Clean a premise list: strip numbering, drop blanks and repeats, cap length
pub(crate) fn premises(output: PremisesOutput, max: usize) -> Vec<String> {
    let raw = match output {
        PremisesOutput::Object { premises } | PremisesOutput::List(premises) => premises,
    };
    let mut cleaned: Vec<String> = Vec::new();
    for premise in raw {
        let text = strip_enumeration(&premise);
        if text.is_empty() || cleaned.iter().any(|p| p == text) {
            continue;
        }
        cleaned.push(text.to_string());
    }
    if cleaned.len() > max {
        warn!("Truncating {} premises to {}", cleaned.len(), max);
        cleaned.truncate(max);
    }
    cleaned
}

fn strip_enumeration(text: &str) -> &str {
    let trimmed = text.trim();
    let rest = trimmed
        .strip_prefix("Premise")
        .or_else(|| trimmed.strip_prefix('P'))
        .unwrap_or(trimmed)
        .trim_start();
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return trimmed;
    }
    match rest[digits..].strip_prefix(['.', ')', ':']) {
        Some(after) => after.trim(),
        None => trimmed,
    }
}

/// Turn a ranking into a permutation of `0..n`
///
/// Labels are parsed tolerantly (`"P2"`, `"2."`, `2`, `"Premise 2"`); only
/// the first run of digits counts, so `"P2 (score 7/10)"` is premise 2;
/// unparseable or out-of-range entries are skipped, repeats keep their first
/// occurrence, and unmentioned indices are appended in index order. Returns
/// `None` when no entry could be parsed at all.
pub(crate) fn ranking(output: RankingOutput, n: usize) -> Option<Vec<usize>> {
    let items = match output {
        RankingOutput::Object { ranking } | RankingOutput::List(ranking) => ranking,
    };
    let mut order: Vec<usize> = Vec::with_capacity(n);
    for item in &items {
        let number = match item {
            Value::Number(num) => num.as_u64().map(|v| v as usize),
            Value::String(s) => s
                .split(|c: char| !c.is_ascii_digit())
                .find(|run| !run.is_empty())
                .and_then(|run| run.parse::<usize>().ok()),
            _ => None,
        };
        if let Some(idx) = number.and_then(|v| v.checked_sub(1)) {
            if idx < n && !order.contains(&idx) {
                order.push(idx);
            }
        }
    }
    if order.is_empty() {
        return None;
    }
    for idx in 0..n {
        if !order.contains(&idx) {
            order.push(idx);
        }
    }
    Some(order)
}

/// Validate generated arguments into candidates, keeping at most `n`
pub(crate) fn candidates(
    output: ArgumentsOutput,
    target_index: usize,
    valence: Valence,
    n: usize,
) -> Vec<ArgumentCandidate> {
    let items = match output {
        ArgumentsOutput::Object { arguments } | ArgumentsOutput::List(arguments) => arguments,
    };
    items
        .into_iter()
        .filter_map(|item| {
            let (label, claim) = match item {
                ArgumentItem::Pair { label, claim } => (clean_title(&label), clean_text(&claim)),
                ArgumentItem::Line(line) => split_line(&line)?,
            };
            ArgumentCandidate::new(label, claim, target_index, valence)
        })
        .take(n)
        .collect()
}

/// Selected labels in answer order
pub(crate) fn selection(output: SelectionOutput) -> Vec<String> {
    let items = match output {
        SelectionOutput::Object { selected } | SelectionOutput::List(selected) => selected,
    };
    items
        .into_iter()
        .map(|item| match item {
            LabelItem::Text(s) | LabelItem::Object { label: s } => s,
        })
        .collect()
}

fn clean_text(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}

fn clean_title(title: &str) -> String {
    let text = clean_text(title);
    let text = text.strip_prefix("Title:").unwrap_or(&text).trim();
    text.trim_end_matches(':').trim().to_string()
}

/// Split a `"**Title:** statement"` line
fn split_line(line: &str) -> Option<(String, String)> {
    let text = clean_text(line);
    let text = text.strip_prefix("Title:").unwrap_or(&text).trim();
    let text = strip_enumeration(text);
    let (label, claim) = text.split_once(':')?;
    Some((label.trim().to_string(), claim.trim().to_string()))
}
