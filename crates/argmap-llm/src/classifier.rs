//! Zero-shot classification client
//!
//! Speaks the Hugging Face inference protocol for zero-shot NLI pipelines:
//!
//! ```json
//! {"inputs": ["..."], "parameters": {"candidate_labels": ["..."], "hypothesis_template": "... {} ..."}}
//! ```
//!
//! The endpoint answers with one `{sequence, labels, scores}` object per
//! input (labels sorted by score) or with an `{"error": "..."}` object.

use crate::{error_for_status, http_client, LlmError, RetryPolicy};
use argmap_domain::traits::{Classification, Classifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP zero-shot classifier
pub struct ZeroShotClassifier {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [String],
    parameters: ClassifyParameters<'a>,
}

#[derive(Serialize)]
struct ClassifyParameters<'a> {
    candidate_labels: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    hypothesis_template: Option<&'a str>,
    multi_label: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyItem {
    Result {
        sequence: String,
        labels: Vec<String>,
        scores: Vec<f64>,
    },
    Error {
        error: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Many(Vec<ClassifyItem>),
    One(ClassifyItem),
}

impl ZeroShotClassifier {
    /// Create a classifier for the endpoint at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            client: http_client(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Authenticate with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn into_results(
        response: ClassifyResponse,
        expected: usize,
    ) -> Result<Vec<Classification>, LlmError> {
        let items = match response {
            ClassifyResponse::Many(items) => items,
            ClassifyResponse::One(item) => vec![item],
        };
        if items.len() != expected {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} classifications, got {}",
                expected,
                items.len()
            )));
        }
        items
            .into_iter()
            .map(|item| match item {
                ClassifyItem::Result {
                    sequence,
                    labels,
                    scores,
                } => Ok(Classification {
                    sequence,
                    labels,
                    scores,
                }),
                ClassifyItem::Error { error } => Err(LlmError::InvalidResponse(error)),
            })
            .collect()
    }
}

#[async_trait]
impl Classifier for ZeroShotClassifier {
    type Error = LlmError;

    async fn classify(
        &self,
        sequences: &[String],
        labels: &[&str],
        hypothesis_template: Option<&str>,
    ) -> Result<Vec<Classification>, Self::Error> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }
        let body = ClassifyRequest {
            inputs: sequences,
            parameters: ClassifyParameters {
                candidate_labels: labels,
                hypothesis_template,
                multi_label: false,
            },
        };

        let response = self
            .retry
            .run("zero-shot classification", || async {
                let mut request = self.client.post(&self.url).json(&body);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                let response = error_for_status(request.send().await?, &self.url).await?;
                Ok::<_, LlmError>(response.json::<ClassifyResponse>().await?)
            })
            .await?;

        Self::into_results(response, sequences.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let inputs = vec!["CLAIM_1: a\n\nCLAIM_2: b".to_string()];
        let body = ClassifyRequest {
            inputs: &inputs,
            parameters: ClassifyParameters {
                candidate_labels: &["entails", "contradicts"],
                hypothesis_template: Some("CLAIM_1 {} CLAIM_2"),
                multi_label: false,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["parameters"]["candidate_labels"][1], "contradicts");
        assert_eq!(json["parameters"]["hypothesis_template"], "CLAIM_1 {} CLAIM_2");
    }

    #[test]
    fn test_parse_results() {
        let raw = r#"[{"sequence": "s", "labels": ["entails", "contradicts"], "scores": [0.9, 0.1]}]"#;
        let response: ClassifyResponse = serde_json::from_str(raw).unwrap();
        let results = ZeroShotClassifier::into_results(response, 1).unwrap();
        assert_eq!(results[0].top_label(), Some("entails"));
    }

    #[test]
    fn test_single_object_response() {
        let raw = r#"{"sequence": "s", "labels": ["a"], "scores": [1.0]}"#;
        let response: ClassifyResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(ZeroShotClassifier::into_results(response, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_error_item_surfaces() {
        let raw = r#"[{"error": "Model is loading"}]"#;
        let response: ClassifyResponse = serde_json::from_str(raw).unwrap();
        let result = ZeroShotClassifier::into_results(response, 1);
        assert!(matches!(result, Err(LlmError::InvalidResponse(e)) if e == "Model is loading"));
    }

    #[test]
    fn test_count_mismatch() {
        let raw = r#"[{"sequence": "s", "labels": ["a"], "scores": [1.0]}]"#;
        let response: ClassifyResponse = serde_json::from_str(raw).unwrap();
        assert!(ZeroShotClassifier::into_results(response, 2).is_err());
    }
}
