//! Debate definitions and build results

use argmap_domain::NodeId;
use argmap_store::ArgumentGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// The central claim of a debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motion {
    /// The claim defended by the pro side
    pub claim: String,

    /// Short title
    #[serde(default)]
    pub label: String,
}

/// Everything needed to build one debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateSpec {
    /// Unique identifier, used by the ledger and for output file names
    pub debate_id: String,

    /// Topic the debate is about
    pub topic: String,

    /// Root claim
    pub motion: Motion,

    /// Domain tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Target number of pro (and con) children per depth; depths beyond the
    /// list are leaves
    pub degree_config: Vec<usize>,
}

impl DebateSpec {
    /// Target degree for nodes at `depth`
    pub fn degree_at(&self, depth: usize) -> usize {
        self.degree_config.get(depth).copied().unwrap_or(0)
    }

    /// Validate the definition
    pub fn validate(&self) -> Result<(), String> {
        if self.debate_id.trim().is_empty() {
            return Err("debate_id must not be empty".to_string());
        }
        if self.motion.claim.trim().is_empty() {
            return Err(format!("debate '{}' has an empty motion", self.debate_id));
        }
        Ok(())
    }
}

/// A TOML manifest listing debates to build
///
/// ```toml
/// [[debates]]
/// debate_id = "carbon-tax"
/// topic = "Carbon pricing"
/// tags = ["climate", "economy"]
/// degree_config = [2, 1]
///
/// [debates.motion]
/// claim = "We should tax carbon emissions."
/// label = "Carbon tax"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateManifest {
    /// Debates in build order
    #[serde(default)]
    pub debates: Vec<DebateSpec>,
}

impl DebateManifest {
    /// Parse a manifest and validate every entry
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let manifest: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse manifest: {}", e))?;
        let mut seen = std::collections::HashSet::new();
        for spec in &manifest.debates {
            spec.validate()?;
            if !seen.insert(spec.debate_id.as_str()) {
                return Err(format!("duplicate debate_id '{}'", spec.debate_id));
            }
        }
        Ok(manifest)
    }
}

/// Lifecycle of a node during expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    /// Created, waiting for a worker
    Pending,
    /// A worker is expanding it
    Expanding,
    /// Terminal
    Expanded,
}

/// Counters collected during a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Nodes expanded (including leaves)
    pub nodes_expanded: usize,
    /// Nodes created (excluding the root)
    pub nodes_created: usize,
    /// Candidates merged into existing nodes
    pub merges: usize,
    /// Nodes that became leaves because of a contained failure
    pub failed_nodes: usize,
    /// Created nodes missing from the similarity index after a failed insert
    pub unindexed_nodes: usize,
}

/// The outcome of a successful debate build
#[derive(Debug)]
pub struct BuildReport {
    /// Debate identifier
    pub debate_id: String,

    /// The finished graph
    pub graph: ArgumentGraph,

    /// Final state of every node
    pub states: HashMap<NodeId, ExpansionState>,

    /// Build counters
    pub stats: BuildStats,

    /// Wall-clock build time
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[[debates]]
debate_id = "carbon-tax"
topic = "Carbon pricing"
tags = ["climate", "economy"]
degree_config = [2, 1]

[debates.motion]
claim = "We should tax carbon emissions."
label = "Carbon tax"

[[debates]]
debate_id = "uniforms"
topic = "Schools"
degree_config = []

[debates.motion]
claim = "School uniforms should be mandatory."
"#;

    #[test]
    fn test_manifest_parsing() {
        let manifest = DebateManifest::from_toml(MANIFEST).unwrap();
        assert_eq!(manifest.debates.len(), 2);

        let carbon = &manifest.debates[0];
        assert_eq!(carbon.motion.label, "Carbon tax");
        assert_eq!(carbon.degree_at(0), 2);
        assert_eq!(carbon.degree_at(1), 1);
        assert_eq!(carbon.degree_at(2), 0);

        assert!(manifest.debates[1].tags.is_empty());
        assert_eq!(manifest.debates[1].degree_at(0), 0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let doubled = format!("{}\n{}", MANIFEST, MANIFEST.replace("uniforms", "other"));
        assert!(DebateManifest::from_toml(&doubled).is_err());
    }

    #[test]
    fn test_empty_motion_rejected() {
        let spec = DebateSpec {
            debate_id: "x".into(),
            topic: "t".into(),
            motion: Motion {
                claim: "  ".into(),
                label: String::new(),
            },
            tags: vec![],
            degree_config: vec![1],
        };
        assert!(spec.validate().is_err());
    }
}
