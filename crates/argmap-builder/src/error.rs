//! Error types for the debate builder

use argmap_store::GraphError;
use thiserror::Error;

/// Errors that can occur while building a debate
///
/// Node-level failures (`Provider`, `MalformedOutput`, `MissingPremises`,
/// `DuplicateResolution`) are contained where they happen: the affected
/// node becomes a leaf or the candidate is dropped. Only fatal errors abort
/// the build of a debate.
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Provider call failed after retries
    #[error("Provider error: {0}")]
    Provider(String),

    /// Structured output could not be parsed, even after reformatting
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// Premises could not be obtained for a node
    #[error("Missing premises for node {node}: {reason}")]
    MissingPremises {
        /// Node id
        node: String,
        /// Underlying failure
        reason: String,
    },

    /// A classifier call failed during duplicate detection
    #[error("Duplicate resolution failed: {0}")]
    DuplicateResolution(String),

    /// The argument graph would violate one of its invariants
    #[error("Graph invariant violated: {0}")]
    GraphInvariant(#[from] GraphError),

    /// The debate definition is invalid
    #[error("Invalid debate: {0}")]
    InvalidDebate(String),

    /// Similarity index error
    #[error("Similarity index error: {0}")]
    Index(String),

    /// Build ledger error
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task panicked or was lost
    #[error("Expansion worker failed: {0}")]
    Worker(String),

    /// The build was cancelled
    #[error("Build cancelled")]
    Cancelled,
}

impl BuilderError {
    /// Whether this error aborts the whole debate build
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BuilderError::GraphInvariant(_) | BuilderError::Worker(_) | BuilderError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(BuilderError::Cancelled.is_fatal());
        assert!(BuilderError::GraphInvariant(GraphError::NoRoot).is_fatal());
        assert!(!BuilderError::Provider("timeout".into()).is_fatal());
        assert!(!BuilderError::MalformedOutput("x".into()).is_fatal());
        assert!(!BuilderError::DuplicateResolution("x".into()).is_fatal());
    }
}
