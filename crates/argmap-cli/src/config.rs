//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use argmap_builder::BuilderConfig;
use argmap_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Persona file, one persona per line (built-in set when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas_file: Option<PathBuf>,

    /// Universal domain tags, one per line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_file: Option<PathBuf>,

    /// Ledger database used by `batch` and `export --debate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,

    /// Generation provider
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Zero-shot classifier endpoint
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Embeddings for the similarity index
    #[serde(default)]
    pub embeddings: EmbeddingSettings,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Debate builder tuning
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Retry policy for remote calls
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Generation provider kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

/// Generation provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider kind
    #[serde(default)]
    pub kind: ProviderKind,

    /// Base URL
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Zero-shot classification endpoint
    #[serde(default = "default_classifier_url")]
    pub url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env", skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

/// Embedding backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingKind {
    /// Offline feature hashing
    #[default]
    Hashing,
    /// Remote feature-extraction endpoint
    Inference,
}

/// Embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Backend kind
    #[serde(default)]
    pub kind: EmbeddingKind,

    /// Feature-extraction endpoint (inference only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Numbered outline
    #[default]
    Outline,
    /// Node-link JSON
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Get the default ledger path.
    pub fn default_ledger_path() -> Result<PathBuf> {
        Ok(Self::home()?.join("ledger.db"))
    }

    fn home() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".argmap"))
    }

    /// Resolve an explicit path or fall back to the default one.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Load configuration from file, or defaults if it does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        let config = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve_path(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.builder.validate().map_err(CliError::Config)?;
        self.retry.validate().map_err(CliError::Config)?;
        if self.embeddings.kind == EmbeddingKind::Inference && self.embeddings.url.is_none() {
            return Err(CliError::Config(
                "embeddings.url is required for inference embeddings".into(),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(CliError::Config("embeddings.dimension must be greater than 0".into()));
        }
        Ok(())
    }

    /// Ledger path from the config, or the default one.
    pub fn ledger(&self) -> Result<PathBuf> {
        match &self.ledger_path {
            Some(p) => Ok(p.clone()),
            None => Self::default_ledger_path(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Ollama,
            endpoint: default_provider_endpoint(),
            model: default_model(),
            api_key_env: None,
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            url: default_classifier_url(),
            token_env: default_token_env(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            kind: EmbeddingKind::Hashing,
            url: None,
            dimension: default_dimension(),
            token_env: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Outline,
        }
    }
}

fn default_provider_endpoint() -> String {
    argmap_llm::ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_classifier_url() -> String {
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli".to_string()
}

fn default_token_env() -> Option<String> {
    Some("HF_TOKEN".to_string())
}

fn default_dimension() -> usize {
    384
}

fn default_true() -> bool {
    true
}
