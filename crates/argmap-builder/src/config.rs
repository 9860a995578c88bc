//! Configuration for the debate builder

use serde::{Deserialize, Serialize};

/// Tuning knobs for a debate build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Candidates requested per persona and valence
    pub args_per_persona: usize,

    /// Neighbours retrieved for duplicate detection
    pub top_k_retrieval: usize,

    /// Nodes expanded concurrently
    pub max_workers: usize,

    /// Upper bound on premises extracted per claim
    pub max_premises: usize,

    /// Domain tags passed to each generation request
    pub tags_per_cluster: usize,

    /// Follow-up calls asking the model to fix unparseable output
    pub reformat_retries: usize,

    /// Debates built concurrently by a batch
    pub batch_size: usize,

    /// Token limit per generation call
    pub max_tokens: u32,

    /// Temperature for drafting (premises, arguments, assessments)
    pub drafting_temperature: f32,

    /// Temperature for ranking, selection and reformatting
    pub formatting_temperature: f32,

    /// Seed for persona and tag sampling
    pub seed: Option<u64>,
}

impl BuilderConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.args_per_persona == 0 {
            return Err("args_per_persona must be greater than 0".to_string());
        }
        if self.top_k_retrieval == 0 {
            return Err("top_k_retrieval must be greater than 0".to_string());
        }
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".to_string());
        }
        if self.max_premises == 0 {
            return Err("max_premises must be greater than 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        for (name, t) in [
            ("drafting_temperature", self.drafting_temperature),
            ("formatting_temperature", self.formatting_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("{} must be in [0, 2], got {}", name, t));
            }
        }
        Ok(())
    }

    /// Fast preset: fewer retrievals and no reformatting
    pub fn fast() -> Self {
        Self {
            top_k_retrieval: 2,
            max_premises: 3,
            reformat_retries: 0,
            max_tokens: 512,
            max_workers: 16,
            ..Self::default()
        }
    }

    /// Thorough preset: wider dedup search and more repair attempts
    pub fn thorough() -> Self {
        Self {
            top_k_retrieval: 5,
            reformat_retries: 2,
            max_tokens: 2048,
            max_workers: 4,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            args_per_persona: 2,
            top_k_retrieval: 3,
            max_workers: 8,
            max_premises: 5,
            tags_per_cluster: 8,
            reformat_retries: 1,
            batch_size: 10,
            max_tokens: 1024,
            drafting_temperature: 0.6,
            formatting_temperature: 0.0,
            seed: None,
        }
    }
}
