//! The argument graph arena
//!
//! Nodes are keyed by opaque [`NodeId`]s; edges point from a child claim to
//! the parent claim it argues about. The arena enforces the structural
//! invariants of a debate map:
//!
//! - exactly one root (the motion), which never gains an outgoing edge
//! - every other node is created together with its parent edge
//! - no edge may close a cycle
//! - cached premises are write-once
//!
//! Nodes are never removed, so petgraph's stable indices double as creation
//! order for both nodes and edges.

use argmap_domain::{ArgumentEdge, Node, NodeId, Valence};
use petgraph::algo::{dijkstra, has_path_connecting, is_cyclic_directed};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

/// Violations of the graph's structural invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A second root was requested
    #[error("Graph already has a root: {0}")]
    RootExists(NodeId),

    /// The operation needs a root but none was created
    #[error("Graph has no root")]
    NoRoot,

    /// Unknown node id
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with this id is already present
    #[error("Node already exists: {0}")]
    NodeExists(NodeId),

    /// A non-root node without any parent edge
    #[error("Non-root node {0} has no parent edge")]
    Orphan(NodeId),

    /// A node whose parent edges never lead to the root
    #[error("Node {0} does not reach the root")]
    Unreachable(NodeId),

    /// The root was given a parent
    #[error("Root node {0} must not have a parent edge")]
    RootHasParent(NodeId),

    /// Edge from a node to itself
    #[error("Self-loop on node {0}")]
    SelfLoop(NodeId),

    /// The edge would make the graph cyclic
    #[error("Edge {child} -> {target} would create a cycle")]
    Cycle {
        /// Child side of the rejected edge
        child: NodeId,
        /// Parent side of the rejected edge
        target: NodeId,
    },

    /// The graph contains a cycle
    #[error("Graph contains a cycle")]
    Cyclic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeAttrs {
    valence: Valence,
    target_index: usize,
}

/// Directed argument graph with a single root
#[derive(Debug, Clone, Default)]
pub struct ArgumentGraph {
    inner: StableDiGraph<Node, EdgeAttrs>,
    index: HashMap<NodeId, NodeIndex>,
    root: Option<NodeId>,
}

impl ArgumentGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root (motion) node
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::RootExists`] if the graph already has a root.
    pub fn create_root(
        &mut self,
        claim: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<NodeId, GraphError> {
        self.insert_root(Node::new(NodeId::new(), claim, label))
    }

    /// Create a new node together with its edge to `parent`
    pub fn add_child(
        &mut self,
        claim: impl Into<String>,
        label: impl Into<String>,
        parent: NodeId,
        valence: Valence,
        target_index: usize,
    ) -> Result<NodeId, GraphError> {
        self.insert_child(
            Node::new(NodeId::new(), claim, label),
            parent,
            valence,
            target_index,
        )
    }

    /// Insert a prepared node together with its edge to `parent`
    pub fn insert_child(
        &mut self,
        node: Node,
        parent: NodeId,
        valence: Valence,
        target_index: usize,
    ) -> Result<NodeId, GraphError> {
        let parent_idx = self.idx(parent)?;
        let id = node.id;
        let child_idx = self.insert_detached(node)?;
        self.inner.add_edge(
            child_idx,
            parent_idx,
            EdgeAttrs {
                valence,
                target_index,
            },
        );
        Ok(id)
    }

    /// Add an edge between two existing nodes
    ///
    /// Idempotent: returns `Ok(false)` if `source -> target` already exists
    /// (whatever its attributes), `Ok(true)` if the edge was added.
    ///
    /// # Errors
    ///
    /// Rejects self-loops and edges that would close a cycle.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        valence: Valence,
        target_index: usize,
    ) -> Result<bool, GraphError> {
        let source_idx = self.idx(source)?;
        let target_idx = self.idx(target)?;
        if source == target {
            return Err(GraphError::SelfLoop(source));
        }
        if self.inner.find_edge(source_idx, target_idx).is_some() {
            return Ok(false);
        }
        if Some(source) == self.root {
            return Err(GraphError::RootHasParent(source));
        }
        if has_path_connecting(&self.inner, target_idx, source_idx, None) {
            return Err(GraphError::Cycle {
                child: source,
                target,
            });
        }
        self.inner.add_edge(
            source_idx,
            target_idx,
            EdgeAttrs {
                valence,
                target_index,
            },
        );
        Ok(true)
    }

    /// Whether adding `source -> target` would be rejected as a cycle
    pub fn would_create_cycle(&self, source: NodeId, target: NodeId) -> bool {
        match (self.index.get(&source), self.index.get(&target)) {
            (Some(&s), Some(&t)) => s == t || has_path_connecting(&self.inner, t, s, None),
            _ => false,
        }
    }

    /// Whether the edge `source -> target` exists
    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        match (self.index.get(&source), self.index.get(&target)) {
            (Some(&s), Some(&t)) => self.inner.find_edge(s, t).is_some(),
            _ => false,
        }
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).and_then(|&idx| self.inner.node_weight(idx))
    }

    /// Whether the graph contains `id`
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// The root's id, if created
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The node's original parent edge
    ///
    /// Edges added later by deduplication merges are not returned here; see
    /// [`ArgumentGraph::parent_edges`].
    pub fn parent_edge(&self, id: NodeId) -> Option<ArgumentEdge> {
        let idx = *self.index.get(&id)?;
        self.inner
            .edges_directed(idx, Direction::Outgoing)
            .min_by_key(|e| e.id())
            .and_then(|e| self.to_edge(e.id()))
    }

    /// All outgoing edges of a node, in creation order
    pub fn parent_edges(&self, id: NodeId) -> Vec<ArgumentEdge> {
        self.edges_of(id, Direction::Outgoing)
    }

    /// All incoming edges (the node's children), in creation order
    pub fn child_edges(&self, id: NodeId) -> Vec<ArgumentEdge> {
        self.edges_of(id, Direction::Incoming)
    }

    /// Length of the shortest path from `id` to the root
    pub fn depth(&self, id: NodeId) -> Result<usize, GraphError> {
        let root = self.root.ok_or(GraphError::NoRoot)?;
        let start = self.idx(id)?;
        let root_idx = self.idx(root)?;
        if start == root_idx {
            return Ok(0);
        }
        dijkstra(&self.inner, start, Some(root_idx), |_| 1usize)
            .get(&root_idx)
            .copied()
            .ok_or(GraphError::Unreachable(id))
    }

    /// Cache premises on a node
    ///
    /// Premises are write-once: returns `Ok(true)` when stored and
    /// `Ok(false)` when the node already had premises (left untouched).
    pub fn set_premises(&mut self, id: NodeId, premises: Vec<String>) -> Result<bool, GraphError> {
        let idx = self.idx(id)?;
        let node = self
            .inner
            .node_weight_mut(idx)
            .ok_or(GraphError::NodeNotFound(id))?;
        if node.premises.is_some() {
            return Ok(false);
        }
        node.premises = Some(premises);
        Ok(true)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    /// Edges in creation order
    pub fn edges(&self) -> Vec<ArgumentEdge> {
        self.inner
            .edge_indices()
            .filter_map(|e| self.to_edge(e))
            .collect()
    }

    /// Check every structural invariant
    ///
    /// Acyclic, exactly one node without outgoing edges (the root), and
    /// every other node reaches the root.
    pub fn validate(&self) -> Result<(), GraphError> {
        let root = self.root.ok_or(GraphError::NoRoot)?;
        let root_idx = self.idx(root)?;

        if is_cyclic_directed(&self.inner) {
            return Err(GraphError::Cyclic);
        }
        for idx in self.inner.node_indices() {
            let id = self.inner[idx].id;
            let out_degree = self.inner.edges_directed(idx, Direction::Outgoing).count();
            if idx == root_idx {
                if out_degree > 0 {
                    return Err(GraphError::RootHasParent(id));
                }
                continue;
            }
            if out_degree == 0 {
                return Err(GraphError::Orphan(id));
            }
            if !has_path_connecting(&self.inner, idx, root_idx, None) {
                return Err(GraphError::Unreachable(id));
            }
        }
        Ok(())
    }

    /// Rebuild a graph from stored parts and validate it
    pub fn from_parts(
        root: Node,
        nodes: Vec<Node>,
        edges: Vec<ArgumentEdge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        graph.insert_root(root)?;
        for node in nodes {
            graph.insert_detached(node)?;
        }
        for edge in edges {
            graph.add_edge(edge.source, edge.target, edge.valence, edge.target_index)?;
        }
        graph.validate()?;
        Ok(graph)
    }

    fn insert_root(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if let Some(existing) = self.root {
            return Err(GraphError::RootExists(existing));
        }
        let id = node.id;
        self.insert_detached(node)?;
        self.root = Some(id);
        Ok(id)
    }

    fn insert_detached(&mut self, node: Node) -> Result<NodeIndex, GraphError> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::NodeExists(node.id));
        }
        let id = node.id;
        let idx = self.inner.add_node(node);
        self.index.insert(id, idx);
        Ok(idx)
    }

    fn idx(&self, id: NodeId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn edges_of(&self, id: NodeId, direction: Direction) -> Vec<ArgumentEdge> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut ids: Vec<EdgeIndex> = self
            .inner
            .edges_directed(idx, direction)
            .map(|e| e.id())
            .collect();
        ids.sort();
        ids.into_iter().filter_map(|e| self.to_edge(e)).collect()
    }

    fn to_edge(&self, edge: EdgeIndex) -> Option<ArgumentEdge> {
        let (source, target) = self.inner.edge_endpoints(edge)?;
        let attrs = self.inner.edge_weight(edge)?;
        Some(ArgumentEdge::new(
            self.inner[source].id,
            self.inner[target].id,
            attrs.valence,
            attrs.target_index,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> (ArgumentGraph, NodeId, NodeId, NodeId) {
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("We should tax carbon emissions.", "Carbon tax").unwrap();
        let pro = graph
            .add_child("It funds green infrastructure.", "Revenue", root, Valence::Pro, 0)
            .unwrap();
        let con = graph
            .add_child("It burdens low-income households.", "Cost", root, Valence::Con, 0)
            .unwrap();
        (graph, root, pro, con)
    }

    #[test]
    fn test_second_root_rejected() {
        let (mut graph, root, _, _) = small_graph();
        let result = graph.create_root("Another motion", "");
        assert_eq!(result, Err(GraphError::RootExists(root)));
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let (mut graph, _, pro, con) = small_graph();
        assert_eq!(graph.add_edge(pro, con, Valence::Con, 0), Ok(true));
        assert_eq!(graph.add_edge(pro, con, Valence::Con, 0), Ok(false));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut graph, root, pro, _) = small_graph();
        let grandchild = graph
            .add_child("Green jobs follow.", "Jobs", pro, Valence::Pro, 0)
            .unwrap();

        let result = graph.add_edge(pro, grandchild, Valence::Pro, 0);
        assert_eq!(
            result,
            Err(GraphError::Cycle {
                child: pro,
                target: grandchild,
            })
        );
        assert_eq!(
            GraphError::Cycle {
                child: pro,
                target: grandchild,
            }
            .to_string(),
            format!("Edge {} -> {} would create a cycle", pro, grandchild)
        );
        assert!(graph.would_create_cycle(pro, grandchild));
        assert!(!graph.would_create_cycle(grandchild, root));
        assert_eq!(graph.add_edge(root, pro, Valence::Pro, 0), Err(GraphError::RootHasParent(root)));
        assert_eq!(graph.add_edge(pro, pro, Valence::Pro, 0), Err(GraphError::SelfLoop(pro)));
    }

    #[test]
    fn test_depth() {
        let (mut graph, root, pro, con) = small_graph();
        let grandchild = graph
            .add_child("Green jobs follow.", "Jobs", pro, Valence::Pro, 0)
            .unwrap();

        assert_eq!(graph.depth(root), Ok(0));
        assert_eq!(graph.depth(pro), Ok(1));
        assert_eq!(graph.depth(grandchild), Ok(2));

        // An extra parent edge at the same depth keeps the shortest path
        graph.add_edge(grandchild, con, Valence::Con, 0).unwrap();
        assert_eq!(graph.depth(grandchild), Ok(2));
    }

    #[test]
    fn test_parent_edge_is_the_original_one() {
        let (mut graph, _, pro, con) = small_graph();
        let shared = graph
            .add_child("Shared argument.", "Shared", pro, Valence::Pro, 0)
            .unwrap();
        graph.add_edge(shared, con, Valence::Con, 0).unwrap();

        let parent = graph.parent_edge(shared).unwrap();
        assert_eq!(parent.target, pro);
        assert_eq!(graph.parent_edges(shared).len(), 2);
        assert_eq!(graph.child_edges(con).len(), 1);
    }

    #[test]
    fn test_premises_are_write_once() {
        let (mut graph, _, pro, _) = small_graph();
        assert_eq!(graph.set_premises(pro, vec!["P1".into()]), Ok(true));
        assert_eq!(graph.set_premises(pro, vec!["other".into()]), Ok(false));
        assert_eq!(graph.node(pro).unwrap().premises, Some(vec!["P1".to_string()]));
    }

    #[test]
    fn test_validate_detects_orphans() {
        let (graph, _, pro, _) = small_graph();
        assert!(graph.validate().is_ok());

        let root = graph.node(graph.root().unwrap()).unwrap().clone();
        let orphan = Node::new(NodeId::new(), "Floating claim", "Orphan");
        let orphan_id = orphan.id;
        let result = ArgumentGraph::from_parts(
            root.clone(),
            vec![graph.node(pro).unwrap().clone(), orphan],
            vec![ArgumentEdge::new(pro, root.id, Valence::Pro, 0)],
        );
        assert_eq!(result.err(), Some(GraphError::Orphan(orphan_id)));
    }

    #[test]
    fn test_unknown_node() {
        let (mut graph, _, pro, _) = small_graph();
        let ghost = NodeId::new();
        assert_eq!(graph.add_edge(ghost, pro, Valence::Pro, 0), Err(GraphError::NodeNotFound(ghost)));
        assert!(graph.node(ghost).is_none());
        assert!(graph.parent_edges(ghost).is_empty());
    }
}
