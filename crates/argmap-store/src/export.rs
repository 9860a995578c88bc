//! Flat outline rendering
//!
//! ```text
//! 1. We should tax carbon emissions.
//! 1.1. PRO: It funds green infrastructure.
//! 1.2. CON: It burdens low-income households.
//! ```
//!
//! Children are numbered in the order their edges were created. A node that
//! was merged under several parents is rendered under each of them.

use crate::graph::{ArgumentGraph, GraphError};
use argmap_domain::{NodeId, Valence};
use std::fmt::Write;

/// Renders an [`ArgumentGraph`] as a numbered outline
pub struct GraphExporter<'a> {
    graph: &'a ArgumentGraph,
}

impl<'a> GraphExporter<'a> {
    /// Create an exporter for `graph`
    pub fn new(graph: &'a ArgumentGraph) -> Self {
        Self { graph }
    }

    /// Render the outline, one line per node
    pub fn outline(&self) -> Result<String, GraphError> {
        let root = self.graph.root().ok_or(GraphError::NoRoot)?;
        let mut out = String::new();
        self.write_node(&mut out, root, "1.", None)?;
        Ok(out)
    }

    /// Render the outline under a `Discussion Title:` header
    pub fn outline_with_title(&self, title: &str) -> Result<String, GraphError> {
        Ok(format!("Discussion Title: {}\n\n{}", title, self.outline()?))
    }

    fn write_node(
        &self,
        out: &mut String,
        id: NodeId,
        number: &str,
        valence: Option<Valence>,
    ) -> Result<(), GraphError> {
        let node = self.graph.node(id).ok_or(GraphError::NodeNotFound(id))?;
        let line = match valence {
            Some(v) => format!("{} {}: {}", number, v, node.claim),
            None => format!("{} {}", number, node.claim),
        };
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}", line);

        for (i, edge) in self.graph.child_edges(id).iter().enumerate() {
            let child_number = format!("{}{}.", number, i + 1);
            self.write_node(out, edge.source, &child_number, Some(edge.valence))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_numbering() {
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("We should tax carbon emissions.", "").unwrap();
        let pro = graph
            .add_child("It funds green infrastructure.", "Revenue", root, Valence::Pro, 0)
            .unwrap();
        graph
            .add_child("It burdens low-income households.", "Cost", root, Valence::Con, 0)
            .unwrap();
        graph
            .add_child("Infrastructure creates jobs.", "Jobs", pro, Valence::Pro, 0)
            .unwrap();

        let outline = GraphExporter::new(&graph).outline().unwrap();
        assert_eq!(
            outline,
            "1. We should tax carbon emissions.\n\
             1.1. PRO: It funds green infrastructure.\n\
             1.1.1. PRO: Infrastructure creates jobs.\n\
             1.2. CON: It burdens low-income households.\n"
        );
    }

    #[test]
    fn test_merged_node_listed_under_each_parent() {
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("Motion", "").unwrap();
        let a = graph.add_child("A", "A", root, Valence::Pro, 0).unwrap();
        let b = graph.add_child("B", "B", root, Valence::Con, 0).unwrap();
        let shared = graph.add_child("Shared", "S", a, Valence::Pro, 0).unwrap();
        graph.add_edge(shared, b, Valence::Con, 0).unwrap();

        let outline = GraphExporter::new(&graph).outline().unwrap();
        assert!(outline.contains("1.1.1. PRO: Shared"));
        assert!(outline.contains("1.2.1. CON: Shared"));
    }

    #[test]
    fn test_outline_with_title() {
        let mut graph = ArgumentGraph::new();
        graph.create_root("Motion", "").unwrap();
        let text = GraphExporter::new(&graph).outline_with_title("Carbon").unwrap();
        assert_eq!(text, "Discussion Title: Carbon\n\n1. Motion\n");
    }

    #[test]
    fn test_outline_without_root() {
        let graph = ArgumentGraph::new();
        assert_eq!(GraphExporter::new(&graph).outline(), Err(GraphError::NoRoot));
    }
}
