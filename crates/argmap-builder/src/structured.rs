//! Generation calls with tolerant parsing and reformat retries

use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::prompt;
use argmap_domain::traits::{GenerationParams, LlmProvider};
use argmap_llm::json::parse_tolerant;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Wraps a provider with the builder's sampling settings
pub struct StructuredCaller<L: LlmProvider> {
    llm: Arc<L>,
    drafting: GenerationParams,
    formatting: GenerationParams,
    reformat_retries: usize,
}

impl<L: LlmProvider> StructuredCaller<L> {
    /// Create a caller using the temperatures and limits from `config`
    pub fn new(llm: Arc<L>, config: &BuilderConfig) -> Self {
        Self {
            llm,
            drafting: GenerationParams::new(config.max_tokens, config.drafting_temperature),
            formatting: GenerationParams::new(config.max_tokens, config.formatting_temperature),
            reformat_retries: config.reformat_retries,
        }
    }

    /// Free-text drafting call
    pub async fn draft(&self, prompt: &str) -> Result<String, BuilderError> {
        self.llm
            .generate(prompt, self.drafting)
            .await
            .map_err(|e| BuilderError::Provider(e.to_string()))
    }

    /// Structured drafting call
    pub async fn draft_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &str,
    ) -> Result<T, BuilderError> {
        self.call(prompt, schema, self.drafting).await
    }

    /// Structured call at formatting temperature (rankings, selections)
    pub async fn format_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &str,
    ) -> Result<T, BuilderError> {
        self.call(prompt, schema, self.formatting).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &str,
        params: GenerationParams,
    ) -> Result<T, BuilderError> {
        let mut raw = self.structured(prompt, schema, params).await?;
        let mut last_error = match parse_tolerant::<T>(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        for attempt in 1..=self.reformat_retries {
            warn!("Unparseable output, reformat attempt {}: {}", attempt, last_error);
            raw = self
                .structured(&prompt::reformat(&raw, schema), schema, self.formatting)
                .await?;
            match parse_tolerant::<T>(&raw) {
                Ok(value) => {
                    debug!("Reformatted output parsed");
                    return Ok(value);
                }
                Err(e) => last_error = e,
            }
        }
        Err(BuilderError::MalformedOutput(last_error.to_string()))
    }

    async fn structured(
        &self,
        prompt: &str,
        schema: &str,
        params: GenerationParams,
    ) -> Result<String, BuilderError> {
        self.llm
            .generate_structured(prompt, schema, params)
            .await
            .map_err(|e| BuilderError::Provider(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PremisesOutput;
    use argmap_llm::MockProvider;

    #[tokio::test]
    async fn test_reformat_retry_recovers() {
        let mut llm = MockProvider::default();
        llm.add_response("Task: Reformat", r#"{"premises": ["A"]}"#);
        llm.add_response("Task: Identify", "Premises: A");
        let llm = Arc::new(llm);
        let caller = StructuredCaller::new(llm.clone(), &BuilderConfig::default());

        let out: PremisesOutput = caller
            .draft_json("Task: Identify the premises", crate::prompt::PREMISES_SCHEMA)
            .await
            .unwrap();
        assert!(matches!(out, PremisesOutput::Object { premises } if premises == vec!["A"]));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_after_retries() {
        let llm = Arc::new(MockProvider::new("not json at all"));
        let config = BuilderConfig {
            reformat_retries: 2,
            ..BuilderConfig::default()
        };
        let caller = StructuredCaller::new(llm.clone(), &config);

        let result: Result<PremisesOutput, _> = caller.draft_json("prompt", "{}").await;
        assert!(matches!(result, Err(BuilderError::MalformedOutput(_))));
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut llm = MockProvider::default();
        llm.add_error("prompt", argmap_llm::LlmError::RateLimitExceeded);
        let caller = StructuredCaller::new(Arc::new(llm), &BuilderConfig::default());

        let result: Result<PremisesOutput, _> = caller.format_json("prompt", "{}").await;
        assert!(matches!(result, Err(BuilderError::Provider(_))));
    }
}
