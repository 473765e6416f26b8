//! Edge type and related structures.
//!
//! Edges connect a parent node to a child node over a genomic sub-span.
//! Each edge has:
//! - Parent and child node ids (by value, the edge owns neither node)
//! - The span `[edge_start, edge_end)` over which the child inherits from
//!   the parent

use ordered_float::OrderedFloat;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::node::NodeId;

/// Identity of an edge: its child and the start of its span.
///
/// A child may have many incoming edges (different parents, or the same
/// parent over disjoint spans) but never two that start at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub child_id: NodeId,
    pub edge_start: OrderedFloat<f64>,
}

impl EdgeKey {
    #[inline]
    pub fn new(child_id: NodeId, edge_start: f64) -> Self {
        Self {
            child_id,
            edge_start: OrderedFloat(edge_start),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({}@{})", self.child_id.0, self.edge_start)
    }
}

/// Render memo for one parent-child relationship.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub parent_id: NodeId,
    pub child_id: NodeId,
    pub edge_start: f64,
    pub edge_end: f64,
}

impl EdgeRecord {
    pub(crate) fn new(parent_id: NodeId, child_id: NodeId, edge_start: f64, edge_end: f64) -> Self {
        Self {
            parent_id,
            child_id,
            edge_start,
            edge_end,
        }
    }

    #[inline]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.child_id, self.edge_start)
    }
}

impl PartialEq for EdgeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EdgeRecord {}

impl Hash for EdgeRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_key_display() {
        let key = EdgeKey::new(NodeId(4), 2.5);
        assert_eq!(format!("{}", key), "Edge(4@2.5)");
    }

    #[test]
    fn test_identity_is_child_and_start() {
        let a = EdgeRecord::new(NodeId(2), NodeId(0), 5.0, 8.0);
        let b = EdgeRecord::new(NodeId(9), NodeId(0), 5.0, 6.0);
        let c = EdgeRecord::new(NodeId(2), NodeId(0), 2.0, 4.0);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.key(), EdgeKey::new(NodeId(0), 5.0));
    }
}
