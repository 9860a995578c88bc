//! Node-link JSON documents
//!
//! The storage form of a built graph. Valence is kept as a
//! [`Valence`] in memory and only becomes `"PRO"` / `"CON"` here; reading a
//! document validates it again and re-checks every graph invariant.

use crate::graph::{ArgumentGraph, GraphError};
use argmap_domain::{ArgumentEdge, Node, NodeId, Valence};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Invalid JSON
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid node id
    #[error("Invalid node id: {0}")]
    InvalidId(String),

    /// Unknown valence string
    #[error("Invalid valence '{0}'")]
    InvalidValence(String),

    /// The root could not be determined
    #[error("Document has no root node")]
    MissingRoot,

    /// The rebuilt graph violates an invariant
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A node entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node id (hyphenated UUID)
    pub id: String,
    /// Claim text
    pub claim: String,
    /// Short title
    pub label: String,
    /// Cached premises, if extracted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premises: Option<Vec<String>>,
}

/// An edge entry, child to parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Child node id
    pub source: String,
    /// Parent node id
    pub target: String,
    /// `"PRO"` or `"CON"`
    pub valence: String,
    /// Index of the addressed parent premise
    pub target_index: usize,
}

/// Node-link representation of an [`ArgumentGraph`]
///
/// The root is always the first node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Always `true`
    pub directed: bool,
    /// Nodes, root first
    pub nodes: Vec<NodeRecord>,
    /// Edges in creation order
    pub links: Vec<LinkRecord>,
}

impl GraphDocument {
    /// Snapshot a graph
    pub fn from_graph(graph: &ArgumentGraph) -> Self {
        let root = graph.root();
        let mut nodes: Vec<NodeRecord> = graph
            .nodes()
            .map(|node| NodeRecord {
                id: node.id.to_string(),
                claim: node.claim.clone(),
                label: node.label.clone(),
                premises: node.premises.clone(),
            })
            .collect();
        if let Some(root) = root.map(|r| r.to_string()) {
            if let Some(pos) = nodes.iter().position(|n| n.id == root) {
                let root_record = nodes.remove(pos);
                nodes.insert(0, root_record);
            }
        }

        let links = graph
            .edges()
            .into_iter()
            .map(|edge| LinkRecord {
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                valence: edge.valence.as_str().to_string(),
                target_index: edge.target_index,
            })
            .collect();

        Self {
            directed: true,
            nodes,
            links,
        }
    }

    /// Rebuild and validate the graph
    ///
    /// The root is the only node without outgoing links.
    pub fn into_graph(self) -> Result<ArgumentGraph, DocumentError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for record in self.nodes {
            let id = NodeId::from_string(&record.id).map_err(DocumentError::InvalidId)?;
            let mut node = Node::new(id, record.claim, record.label);
            node.premises = record.premises;
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(self.links.len());
        for link in self.links {
            let source = NodeId::from_string(&link.source).map_err(DocumentError::InvalidId)?;
            let target = NodeId::from_string(&link.target).map_err(DocumentError::InvalidId)?;
            let valence = Valence::parse(&link.valence)
                .ok_or_else(|| DocumentError::InvalidValence(link.valence.clone()))?;
            edges.push(ArgumentEdge::new(source, target, valence, link.target_index));
        }

        let root_pos = nodes
            .iter()
            .position(|n| !edges.iter().any(|e| e.source == n.id))
            .ok_or(DocumentError::MissingRoot)?;
        let root = nodes.remove(root_pos);
        Ok(ArgumentGraph::from_parts(root, nodes, edges)?)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArgumentGraph {
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("We should tax carbon emissions.", "Carbon tax").unwrap();
        let pro = graph
            .add_child("It funds green infrastructure.", "Revenue", root, Valence::Pro, 0)
            .unwrap();
        graph.set_premises(pro, vec!["Revenue is earmarked.".into()]).unwrap();
        graph
            .add_child("It burdens low-income households.", "Cost", root, Valence::Con, 0)
            .unwrap();
        graph
    }

    #[test]
    fn test_document_shape() {
        let doc = GraphDocument::from_graph(&sample());
        assert!(doc.directed);
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.nodes[0].claim, "We should tax carbon emissions.");
        assert_eq!(doc.links[0].valence, "PRO");
        assert_eq!(doc.links[1].valence, "CON");

        let json = doc.to_json().unwrap();
        assert!(json.contains("\"target_index\": 0"));
        assert!(!json.contains("\"premises\": null"));
    }

    #[test]
    fn test_into_graph_restores_structure() {
        let graph = sample();
        let restored = GraphDocument::from_graph(&graph).into_graph().unwrap();

        assert_eq!(restored.node_count(), 3);
        assert_eq!(restored.edge_count(), 2);
        assert_eq!(restored.root(), graph.root());
        let pro = graph.edges()[0].source;
        assert_eq!(
            restored.node(pro).unwrap().premises,
            Some(vec!["Revenue is earmarked.".to_string()])
        );
    }

    #[test]
    fn test_invalid_valence_rejected() {
        let mut doc = GraphDocument::from_graph(&sample());
        doc.links[0].valence = "NEUTRAL".to_string();
        assert!(matches!(doc.into_graph(), Err(DocumentError::InvalidValence(v)) if v == "NEUTRAL"));
    }

    #[test]
    fn test_second_sink_rejected() {
        let mut doc = GraphDocument::from_graph(&sample());
        doc.links.pop();
        assert!(matches!(
            doc.into_graph(),
            Err(DocumentError::Graph(GraphError::Orphan(_)))
        ));
    }
}
