//! Node type and related structures.
//!
//! Each ARG node is rendered as a line along the genome axis. A node has:
//! - A stable unique identifier (the external ARG node id)
//! - An ancestral height (0 for samples)
//! - The genomic span `[span_start, span_end)` it is defined over
//! - A horizontal layout position and depth, assigned by the layout pass

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable node identifier.
///
/// This is the id the ARG source uses for the node. It wraps a u32 for
/// efficient storage and WebAssembly interop, and orders nodes when no
/// better hint exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Render memo for one ARG node.
///
/// Equality and hashing use `id` only: two records with the same id are the
/// same node regardless of their layout state.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub height: f64,
    pub span_start: f64,
    pub span_end: f64,
    /// Horizontal position; `None` until layout sets it.
    pub x_pos: Option<f64>,
    /// Initial horizontal position given at insertion (e.g. sample order).
    /// Every layout starts from this, never from a previous layout's `x_pos`.
    pub x_hint: Option<f64>,
    /// Layout depth, 0 for leaves; `None` until layout reaches the node.
    pub depth: Option<u32>,
}

impl NodeRecord {
    pub(crate) fn new(id: NodeId, height: f64, span_start: f64, span_end: f64) -> Self {
        Self {
            id,
            height,
            span_start,
            span_end,
            x_pos: None,
            x_hint: None,
            depth: None,
        }
    }

    /// Whether `[start, end)` lies within this node's span.
    #[inline]
    pub fn covers(&self, start: f64, end: f64) -> bool {
        self.span_start <= start && end <= self.span_end
    }
}

impl PartialEq for NodeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeRecord {}

impl Hash for NodeRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
