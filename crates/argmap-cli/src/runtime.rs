//! Wiring configured backends into a debate builder.

use crate::config::{Config, EmbeddingKind, ProviderKind};
use crate::error::{CliError, Result};
use argmap_builder::{DebateBuilder, IndexFactory, Personas};
use argmap_domain::traits::{Embedder, GenerationParams, LlmProvider};
use argmap_llm::{InferenceEmbedder, LlmError, OllamaProvider, OpenAiProvider, ZeroShotClassifier};
use argmap_store::{HashingEmbedder, HnswSimilarityIndex};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Generation provider selected by configuration.
pub enum AnyProvider {
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// OpenAI-compatible API
    OpenAi(OpenAiProvider),
}

#[async_trait]
impl LlmProvider for AnyProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str, params: GenerationParams) -> std::result::Result<String, LlmError> {
        match self {
            AnyProvider::Ollama(p) => p.generate(prompt, params).await,
            AnyProvider::OpenAi(p) => p.generate(prompt, params).await,
        }
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &str,
        params: GenerationParams,
    ) -> std::result::Result<String, LlmError> {
        match self {
            AnyProvider::Ollama(p) => p.generate_structured(prompt, schema, params).await,
            AnyProvider::OpenAi(p) => p.generate_structured(prompt, schema, params).await,
        }
    }
}

/// Embedding backend selected by configuration.
pub enum AnyEmbedder {
    /// Offline feature hashing
    Hashing(HashingEmbedder),
    /// Remote feature extraction
    Inference(InferenceEmbedder),
}

#[async_trait]
impl Embedder for AnyEmbedder {
    type Error = String;

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, String> {
        match self {
            AnyEmbedder::Hashing(e) => e.embed(text).await.map_err(|e| e.to_string()),
            AnyEmbedder::Inference(e) => e.embed(text).await.map_err(|e| e.to_string()),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            AnyEmbedder::Hashing(e) => e.dimension(),
            AnyEmbedder::Inference(e) => e.dimension(),
        }
    }
}

/// The builder type assembled by the CLI.
pub type CliBuilder = DebateBuilder<AnyProvider, ZeroShotClassifier, HnswSimilarityIndex<AnyEmbedder>>;

fn secret(env_var: Option<&str>) -> Option<String> {
    let name = env_var?;
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            warn!("Environment variable {} is not set", name);
            None
        }
    }
}

/// Build the generation provider.
pub fn provider(config: &Config) -> AnyProvider {
    let settings = &config.provider;
    match settings.kind {
        ProviderKind::Ollama => AnyProvider::Ollama(
            OllamaProvider::new(&settings.endpoint, &settings.model).with_retry(config.retry.clone()),
        ),
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(&settings.endpoint, &settings.model)
                .with_retry(config.retry.clone());
            if let Some(key) = secret(settings.api_key_env.as_deref()) {
                provider = provider.with_api_key(key);
            }
            AnyProvider::OpenAi(provider)
        }
    }
}

/// Build the zero-shot classifier.
pub fn classifier(config: &Config) -> ZeroShotClassifier {
    let mut classifier =
        ZeroShotClassifier::new(&config.classifier.url).with_retry(config.retry.clone());
    if let Some(token) = secret(config.classifier.token_env.as_deref()) {
        classifier = classifier.with_token(token);
    }
    classifier
}

/// Build the embedder.
pub fn embedder(config: &Config) -> Result<AnyEmbedder> {
    let settings = &config.embeddings;
    match settings.kind {
        EmbeddingKind::Hashing => Ok(AnyEmbedder::Hashing(HashingEmbedder::new(settings.dimension))),
        EmbeddingKind::Inference => {
            let url = settings.url.as_deref().ok_or_else(|| {
                CliError::Config("embeddings.url is required for inference embeddings".into())
            })?;
            let mut embedder =
                InferenceEmbedder::new(url, settings.dimension).with_retry(config.retry.clone());
            if let Some(token) = secret(settings.token_env.as_deref()) {
                embedder = embedder.with_token(token);
            }
            Ok(AnyEmbedder::Inference(embedder))
        }
    }
}

/// Load the persona source.
pub fn personas(config: &Config) -> Result<Personas> {
    match &config.personas_file {
        Some(path) => {
            let personas = Personas::load(path)?;
            debug!("Loaded {} personas from {}", personas.len(), path.display());
            Ok(personas)
        }
        None => Ok(Personas::default()),
    }
}

/// Load the universal tags.
pub fn universal_tags(config: &Config) -> Result<Vec<String>> {
    match &config.tags_file {
        Some(path) => Ok(std::fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()),
        None => Ok(Vec::new()),
    }
}

/// Assemble a debate builder from the configuration.
pub fn debate_builder(config: &Config) -> Result<CliBuilder> {
    let embedder = Arc::new(embedder(config)?);
    let index_factory: IndexFactory<HnswSimilarityIndex<AnyEmbedder>> =
        Arc::new(move || HnswSimilarityIndex::new(embedder.clone()));
    let builder = DebateBuilder::new(
        Arc::new(provider(config)),
        Arc::new(classifier(config)),
        index_factory,
        personas(config)?,
        config.builder.clone(),
    )?
    .with_universal_tags(universal_tags(config)?);
    Ok(builder)
}

/// A shutdown signal raised on Ctrl+C.
pub fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling build");
            let _ = tx.send(true);
        }
    });
    rx
}
