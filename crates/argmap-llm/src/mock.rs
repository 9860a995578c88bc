//! Deterministic doubles for tests and offline runs
//!
//! Both mocks route on substrings of their input: a rule fires when every
//! one of its needles occurs in the prompt (or classified sequence). Rules
//! are checked in insertion order and the first match wins. Clones share
//! rules and call logs.

use crate::LlmError;
use argmap_domain::traits::{Classification, Classifier, GenerationParams, LlmProvider};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn matches_all(text: &str, needles: &[String]) -> bool {
    needles.iter().all(|n| text.contains(n.as_str()))
}

#[derive(Debug, Clone)]
enum Outcome {
    Respond(String),
    Fail(LlmError),
}

#[derive(Debug, Clone)]
struct Rule<T> {
    needles: Vec<String>,
    outcome: T,
}

/// Mock generation provider
///
/// # Examples
///
/// ```
/// use argmap_llm::MockProvider;
/// use argmap_domain::traits::{GenerationParams, LlmProvider};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("premises", r#"{"premises": ["A"]}"#);
/// provider.add_rule(&["Task: Rank", "P2"], r#"{"ranking": ["P2", "P1"]}"#);
///
/// let params = GenerationParams::default();
/// let out = provider.generate("Identify the premises of X", params).await.unwrap();
/// assert_eq!(out, r#"{"premises": ["A"]}"#);
/// assert_eq!(provider.generate("unknown", params).await.unwrap(), "Default mock response");
/// assert_eq!(provider.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<Rule<Outcome>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for unmatched prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `response` to prompts containing `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.push(vec![needle.into()], Outcome::Respond(response.into()));
    }

    /// Respond with `response` to prompts containing every needle
    pub fn add_rule(&mut self, needles: &[&str], response: impl Into<String>) {
        let needles = needles.iter().map(|n| n.to_string()).collect();
        self.push(needles, Outcome::Respond(response.into()));
    }

    /// Fail prompts containing `needle` with `error`
    pub fn add_error(&mut self, needle: impl Into<String>, error: LlmError) {
        self.push(vec![needle.into()], Outcome::Fail(error));
    }

    /// Number of generation calls so far
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Number of calls whose prompt contained `needle`
    pub fn calls_matching(&self, needle: &str) -> usize {
        lock(&self.prompts)
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }

    /// All prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Forget recorded calls
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }

    fn push(&mut self, needles: Vec<String>, outcome: Outcome) {
        lock(&self.rules).push(Rule { needles, outcome });
    }

    fn respond(&self, prompt: &str) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());

        let rules = lock(&self.rules);
        match rules.iter().find(|r| matches_all(prompt, &r.needles)) {
            Some(Rule {
                outcome: Outcome::Respond(response),
                ..
            }) => Ok(response.clone()),
            Some(Rule {
                outcome: Outcome::Fail(error),
                ..
            }) => Err(error.clone()),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str, _params: GenerationParams) -> Result<String, Self::Error> {
        self.respond(prompt)
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        _schema: &str,
        _params: GenerationParams,
    ) -> Result<String, Self::Error> {
        self.respond(prompt)
    }
}

/// Mock zero-shot classifier
///
/// Without a matching rule the candidate labels come back in reverse order,
/// so the *last* label wins. With the label sets the equivalence checks use
/// ("... independent of", "... is neutral wrt.") that means "no
/// equivalence". A rule lists preferred labels; those present among the
/// candidate labels are ranked first, in rule order.
#[derive(Debug, Clone, Default)]
pub struct MockClassifier {
    rules: Arc<Mutex<Vec<Rule<Result<Vec<String>, LlmError>>>>>,
    sequences: Arc<Mutex<Vec<String>>>,
}

impl MockClassifier {
    /// Create a classifier with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer `labels` for sequences containing every needle
    pub fn add_rule(&mut self, needles: &[&str], labels: &[&str]) {
        lock(&self.rules).push(Rule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            outcome: Ok(labels.iter().map(|l| l.to_string()).collect()),
        });
    }

    /// Fail any request containing a sequence with `needle`
    pub fn add_error(&mut self, needle: impl Into<String>, error: LlmError) {
        lock(&self.rules).push(Rule {
            needles: vec![needle.into()],
            outcome: Err(error),
        });
    }

    /// Number of sequences classified so far
    pub fn call_count(&self) -> usize {
        lock(&self.sequences).len()
    }

    fn rank(&self, sequence: &str, labels: &[&str]) -> Result<Classification, LlmError> {
        lock(&self.sequences).push(sequence.to_string());

        let rules = lock(&self.rules);
        let preferred: Vec<String> = match rules.iter().find(|r| matches_all(sequence, &r.needles)) {
            Some(Rule {
                outcome: Err(error),
                ..
            }) => return Err(error.clone()),
            Some(Rule {
                outcome: Ok(preferred),
                ..
            }) => preferred.clone(),
            None => Vec::new(),
        };

        let mut ranked: Vec<String> = preferred
            .into_iter()
            .filter(|p| labels.contains(&p.as_str()))
            .collect();
        for label in labels.iter().rev() {
            if !ranked.iter().any(|r| r == label) {
                ranked.push(label.to_string());
            }
        }

        let total: f64 = (1..=ranked.len()).map(|i| 1.0 / i as f64).sum();
        let scores = (1..=ranked.len()).map(|i| (1.0 / i as f64) / total).collect();
        Ok(Classification {
            sequence: sequence.to_string(),
            labels: ranked,
            scores,
        })
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    type Error = LlmError;

    async fn classify(
        &self,
        sequences: &[String],
        labels: &[&str],
        _hypothesis_template: Option<&str>,
    ) -> Result<Vec<Classification>, Self::Error> {
        sequences.iter().map(|s| self.rank(s, labels)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [&str; 3] = ["entails", "contradicts", "is neutral wrt."];

    #[tokio::test]
    async fn test_mock_provider_rules() {
        let mut provider = MockProvider::default();
        provider.add_rule(&["support", "Carbon"], "carbon support");
        provider.add_response("support", "generic support");

        let params = GenerationParams::default();
        assert_eq!(
            provider.generate("support Carbon tax", params).await.unwrap(),
            "carbon support"
        );
        assert_eq!(provider.generate("support uniforms", params).await.unwrap(), "generic support");
        assert_eq!(provider.generate("other", params).await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt", LlmError::RateLimitExceeded);

        let result = provider.generate("a bad prompt", GenerationParams::default()).await;
        assert_eq!(result, Err(LlmError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_mock_provider_call_log_shared_by_clones() {
        let provider = MockProvider::new("test");
        let clone = provider.clone();

        provider.generate("premises of A", GenerationParams::default()).await.unwrap();
        clone
            .generate_structured("premises of B", "{}", GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(clone.calls_matching("of A"), 1);

        provider.reset_call_count();
        assert_eq!(clone.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_classifier_default_prefers_last_label() {
        let classifier = MockClassifier::new();
        let out = classifier
            .classify(&["anything".to_string()], &LABELS, None)
            .await
            .unwrap();

        assert_eq!(out[0].top_label(), Some("is neutral wrt."));
        assert_eq!(out[0].labels.len(), 3);
        assert!(out[0].scores[0] > out[0].scores[1]);
    }

    #[tokio::test]
    async fn test_mock_classifier_rule_ignores_absent_labels() {
        let mut classifier = MockClassifier::new();
        classifier.add_rule(&["Shared"], &["directly confirmed by", "entails"]);

        let out = classifier
            .classify(&["Shared claim".to_string(), "other".to_string()], &LABELS, None)
            .await
            .unwrap();

        assert_eq!(out[0].top_label(), Some("entails"));
        assert_eq!(out[1].top_label(), Some("is neutral wrt."));
        assert_eq!(classifier.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_classifier_error() {
        let mut classifier = MockClassifier::new();
        classifier.add_error("boom", LlmError::Timeout("slow".into()));

        let result = classifier.classify(&["boom".to_string()], &LABELS, None).await;
        assert!(result.is_err());
    }
}
