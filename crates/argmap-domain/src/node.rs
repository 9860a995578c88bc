//! Nodes and edges of the argument graph

use crate::{NodeId, Valence};

/// A claim placed in the argument graph
///
/// Premises start out unset and are filled in at most once, the first time
/// the node is expanded. The graph store enforces that they never change
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// The proposition itself
    pub claim: String,

    /// Short title
    pub label: String,

    /// Cached premises, in the order they were extracted
    pub premises: Option<Vec<String>>,
}

impl Node {
    /// Create a node without cached premises
    pub fn new(id: NodeId, claim: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            claim: claim.into(),
            label: label.into(),
            premises: None,
        }
    }
}

/// A directed edge from a child claim to the parent claim it argues about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentEdge {
    /// The child (arguing) node
    pub source: NodeId,

    /// The parent node being argued about
    pub target: NodeId,

    /// Support or attack
    pub valence: Valence,

    /// Index of the parent's premise this edge addresses
    pub target_index: usize,
}

impl ArgumentEdge {
    /// Create a new edge
    pub fn new(source: NodeId, target: NodeId, valence: Valence, target_index: usize) -> Self {
        Self {
            source,
            target,
            valence,
            target_index,
        }
    }
}
