//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Debate build error
    #[error("Build error: {0}")]
    Build(#[from] argmap_builder::BuilderError),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] argmap_store::GraphError),

    /// Graph document error
    #[error("Document error: {0}")]
    Document(#[from] argmap_store::DocumentError),

    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] argmap_store::LedgerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested debate is not in the ledger
    #[error("No built graph for debate '{0}'")]
    NotFound(String),
}
