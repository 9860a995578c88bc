//! Opaque node identifiers

use std::fmt;

/// Unique identifier for a node in the argument graph, based on UUIDv7
///
/// UUIDv7 keeps identifiers roughly ordered by creation time, which makes
/// exported graphs and logs easier to follow, and needs no coordination
/// between concurrent expansion workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u128);

impl NodeId {
    /// Generate a new UUIDv7-based NodeId
    ///
    /// # Examples
    ///
    /// ```
    /// use argmap_domain::NodeId;
    ///
    /// let id = NodeId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a NodeId from a raw u128 value
    ///
    /// This is primarily for deserialization at the storage boundary.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a NodeId from its hyphenated UUID string form
    ///
    /// # Examples
    ///
    /// ```
    /// use argmap_domain::NodeId;
    ///
    /// let id = NodeId::new();
    /// let parsed = NodeId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid node id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Round-trip through the string form preserves the id
        #[test]
        fn test_node_id_string_roundtrip(value: u128) {
            let id = NodeId::from_value(value);

            match NodeId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
