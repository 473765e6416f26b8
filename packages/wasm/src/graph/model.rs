//! RenderModel - node/edge memo records plus their derived layout.
//!
//! The model stores the ARG as two append-only record lists and keeps every
//! derived structure (incoming-edge lookup, breakpoints, classification,
//! layering) in a single cache. Any mutation drops the cache; `rebuild`
//! recomputes all of it in one pass, so many additions during incremental
//! construction cost a single layout.

use ordered_float::OrderedFloat;
use petgraph::Directed;
use petgraph::algo::toposort;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::edge::{EdgeKey, EdgeRecord};
use super::node::{NodeId, NodeRecord};
use crate::error::{Error, ErrorCode, ErrorKind, Result};
use crate::layout::layered::{Layering, LayoutConfig, compute_layers};
use crate::layout::scale::{RenderScale, ScaleConfig};

/// Topological role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeRole {
    /// Never the parent of an edge.
    Leaf,
    /// A parent that is never a child.
    Root,
    /// Both parent and child.
    Interior,
}

/// Everything recomputed by `rebuild`.
#[derive(Debug, Default)]
struct LayoutCache {
    /// Whether this cache was produced by a validating rebuild.
    validated: bool,
    /// Child id to indices into `edges` of its incoming edges.
    edges_by_child: HashMap<NodeId, Vec<usize>>,
    breakpoints: BTreeSet<OrderedFloat<f64>>,
    roles: HashMap<NodeId, NodeRole>,
    leaves: Vec<NodeId>,
    roots: Vec<NodeId>,
    interior: Vec<NodeId>,
    layering: Layering,
}

/// Serializable view of a laid-out model for the scene builder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub leaves: Vec<NodeId>,
    pub roots: Vec<NodeId>,
    pub interior: Vec<NodeId>,
    pub breakpoints: Vec<f64>,
    pub max_depth: u32,
}

/// The render model for one ARG.
///
/// This struct manages:
/// - Node and edge records in insertion order
/// - An id lookup (append-only, so it never goes stale)
/// - The derived layout cache, present only while the model is clean
#[derive(Debug)]
pub struct RenderModel {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,

    /// Map from node id to position in `nodes`
    node_by_id: HashMap<NodeId, usize>,

    /// Keys of all inserted edges, for duplicate rejection
    edge_keys: HashSet<EdgeKey>,

    config: LayoutConfig,

    /// `None` means dirty
    cache: Option<LayoutCache>,
}

impl RenderModel {
    /// Create a new empty model with default layout settings.
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_by_id: HashMap::new(),
            edge_keys: HashSet::new(),
            config,
            cache: None,
        }
    }

    /// Create a model with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize, config: LayoutConfig) -> Self {
        Self {
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            node_by_id: HashMap::with_capacity(node_capacity),
            edge_keys: HashSet::with_capacity(edge_capacity),
            config,
            cache: None,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the layout settings. Takes effect on the next rebuild.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.cache = None;
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add a node with no position. Duplicate ids are rejected.
    pub fn add_node(
        &mut self,
        id: NodeId,
        height: f64,
        span_start: f64,
        span_end: f64,
    ) -> Result<&NodeRecord> {
        self.push_node(NodeRecord::new(id, height, span_start, span_end))
    }

    /// Add a node with an x position hint, e.g. sample order from an importer.
    ///
    /// Leaf hints survive layout as long as every leaf carries one; interior
    /// hints are overwritten by averaging.
    pub fn add_positioned_node(
        &mut self,
        id: NodeId,
        height: f64,
        span_start: f64,
        span_end: f64,
        x_pos: f64,
    ) -> Result<&NodeRecord> {
        if !x_pos.is_finite() {
            return Err(Error::construction(
                ErrorCode::InvalidPosition,
                format!("{} has position hint {}", id, x_pos),
            ));
        }
        let mut node = NodeRecord::new(id, height, span_start, span_end);
        node.x_hint = Some(x_pos);
        node.x_pos = Some(x_pos);
        self.push_node(node)
    }

    fn push_node(&mut self, node: NodeRecord) -> Result<&NodeRecord> {
        if self.node_by_id.contains_key(&node.id) {
            return Err(Error::construction(
                ErrorCode::DuplicateNode,
                format!("{} already exists", node.id),
            ));
        }
        if !node.height.is_finite() || node.height < 0.0 {
            return Err(Error::construction(
                ErrorCode::InvalidHeight,
                format!("{} has height {}", node.id, node.height),
            ));
        }
        check_span(node.span_start, node.span_end, || node.id.to_string())?;

        let slot = self.nodes.len();
        self.node_by_id.insert(node.id, slot);
        self.nodes.push(node);
        self.cache = None;
        Ok(&self.nodes[slot])
    }

    /// Add an edge. Endpoints need not exist yet.
    pub fn add_edge(
        &mut self,
        parent_id: NodeId,
        child_id: NodeId,
        edge_start: f64,
        edge_end: f64,
    ) -> Result<&EdgeRecord> {
        let edge = EdgeRecord::new(parent_id, child_id, edge_start, edge_end);
        check_span(edge_start, edge_end, || edge.key().to_string())?;

        if parent_id == child_id {
            return Err(Error::construction(
                ErrorCode::SelfLoop,
                format!("{} cannot be its own parent", child_id),
            ));
        }
        if !self.edge_keys.insert(edge.key()) {
            return Err(Error::construction(
                ErrorCode::DuplicateEdge,
                format!("{} already exists", edge.key()),
            ));
        }

        let slot = self.edges.len();
        self.edges.push(edge);
        self.cache = None;
        Ok(&self.edges[slot])
    }

    /// Remove all nodes and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_by_id.clear();
        self.edge_keys.clear();
        self.cache = None;
    }

    // =========================================================================
    // Rebuild
    // =========================================================================

    /// Recompute derived maps, classification, and layout.
    ///
    /// A clean model returns immediately, unless `validate` is requested and
    /// the current layout was built without it.
    ///
    /// With `validate`, the graph must be complete: every edge endpoint known,
    /// every edge span inside both endpoint spans, and every node touched by
    /// some edge. Without it, edges with unknown endpoints still count toward
    /// classification but are left out of lookups and layout, so a graph under
    /// construction can still be drawn. A parent whose children are all
    /// missing stays unplaced until one of them is added. A cyclic edge set is
    /// always an error. On failure the model stays dirty.
    pub fn rebuild(&mut self, validate: bool) -> Result<()> {
        if let Some(cache) = &self.cache {
            if cache.validated || !validate {
                return Ok(());
            }
        }

        self.cache = None;
        let mut cache = LayoutCache {
            validated: validate,
            ..Default::default()
        };

        let mut used_as_parent: HashSet<NodeId> = HashSet::new();
        let mut used_as_child: HashSet<NodeId> = HashSet::new();
        let mut parents_of: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for (slot, edge) in self.edges.iter().enumerate() {
            // Classification counts every edge, including ones whose other
            // endpoint is not added yet.
            used_as_parent.insert(edge.parent_id);
            used_as_child.insert(edge.child_id);

            let parent = self.node_by_id.get(&edge.parent_id).map(|&i| &self.nodes[i]);
            let child = self.node_by_id.get(&edge.child_id).map(|&i| &self.nodes[i]);

            let (parent, child) = match (parent, child) {
                (Some(parent), Some(child)) => (parent, child),
                (None, _) if validate => return Err(Error::unknown_node(edge.parent_id, "parent")),
                (_, None) if validate => return Err(Error::unknown_node(edge.child_id, "child")),
                _ => {
                    tracing::warn!(
                        "skipping edge {} -> {}: endpoint not added yet",
                        edge.parent_id,
                        edge.child_id
                    );
                    continue;
                }
            };

            let contained = parent.covers(edge.edge_start, edge.edge_end)
                && child.covers(edge.edge_start, edge.edge_end);
            if validate && !contained {
                return Err(Error::validation(
                    ErrorCode::EdgeOutsideSpan,
                    format!(
                        "{} spans [{}, {}) outside {} or {}",
                        edge.key(),
                        edge.edge_start,
                        edge.edge_end,
                        parent.id,
                        child.id
                    ),
                ));
            }

            cache.edges_by_child.entry(edge.child_id).or_default().push(slot);
            cache.breakpoints.insert(OrderedFloat(edge.edge_start));
            cache.breakpoints.insert(OrderedFloat(edge.edge_end));

            let parents = parents_of.entry(edge.child_id).or_default();
            if !parents.contains(&edge.parent_id) {
                parents.push(edge.parent_id);
            }
        }

        if validate {
            if let Some(orphan) = self
                .nodes
                .iter()
                .find(|n| !used_as_parent.contains(&n.id) && !used_as_child.contains(&n.id))
            {
                return Err(Error::validation(
                    ErrorCode::DisconnectedNode,
                    format!("{} is not an endpoint of any edge", orphan.id),
                ));
            }
        }

        self.check_acyclic(&parents_of)?;

        for node in &self.nodes {
            let role = if !used_as_parent.contains(&node.id) {
                cache.leaves.push(node.id);
                NodeRole::Leaf
            } else if !used_as_child.contains(&node.id) {
                cache.roots.push(node.id);
                NodeRole::Root
            } else {
                cache.interior.push(node.id);
                NodeRole::Interior
            };
            cache.roles.insert(node.id, role);
        }

        cache.layering = compute_layers(
            &mut self.nodes,
            &self.node_by_id,
            &parents_of,
            &cache.leaves,
            &self.config,
        );

        tracing::debug!(
            "rebuilt layout: {} nodes, {} edges, {} leaves, {} roots, {} interior, max depth {}",
            self.nodes.len(),
            self.edges.len(),
            cache.leaves.len(),
            cache.roots.len(),
            cache.interior.len(),
            cache.layering.max_depth
        );

        self.cache = Some(cache);
        Ok(())
    }

    /// Reject cyclic ancestry, which has no layering.
    fn check_acyclic(&self, parents_of: &HashMap<NodeId, Vec<NodeId>>) -> Result<()> {
        let mut graph: StableGraph<NodeId, (), Directed> =
            StableGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: HashMap<NodeId, NodeIndex> = self
            .nodes
            .iter()
            .map(|node| (node.id, graph.add_node(node.id)))
            .collect();

        for (child, parents) in parents_of {
            for parent in parents {
                if let (Some(&c), Some(&p)) = (indices.get(child), indices.get(parent)) {
                    graph.add_edge(c, p, ());
                }
            }
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            let id = graph
                .node_weight(cycle.node_id())
                .map(|id| id.to_string())
                .unwrap_or_default();
            Error::new(
                ErrorKind::Layout,
                ErrorCode::Cycle,
                Some(format!("ancestry cycle through {}", id)),
            )
        })
    }

    /// Rebuild without validation, then derive render scale factors.
    pub fn render_scale(&mut self, config: &ScaleConfig) -> Result<RenderScale> {
        self.rebuild(false)?;
        RenderScale::new(self, config)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn fresh(&self) -> Result<&LayoutCache> {
        self.cache.as_ref().ok_or_else(Error::stale)
    }

    /// Whether a mutation has happened since the last successful rebuild.
    pub fn is_dirty(&self) -> bool {
        self.cache.is_none()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.node_by_id.get(&id).map(|&i| &self.nodes[i])
    }

    /// Role of a node, or `None` if the id is unknown.
    pub fn role(&self, id: NodeId) -> Result<Option<NodeRole>> {
        Ok(self.fresh()?.roles.get(&id).copied())
    }

    pub fn node_is_leaf(&self, id: NodeId) -> Result<bool> {
        Ok(self.role(id)? == Some(NodeRole::Leaf))
    }

    pub fn node_is_root(&self, id: NodeId) -> Result<bool> {
        Ok(self.role(id)? == Some(NodeRole::Root))
    }

    pub fn node_is_interior(&self, id: NodeId) -> Result<bool> {
        Ok(self.role(id)? == Some(NodeRole::Interior))
    }

    fn resolve<'a>(&'a self, ids: &'a [NodeId]) -> impl Iterator<Item = &'a NodeRecord> + 'a {
        ids.iter().filter_map(move |id| self.node(*id))
    }

    /// Leaf nodes in insertion order.
    pub fn leaf_nodes(&self) -> Result<impl Iterator<Item = &NodeRecord> + '_> {
        Ok(self.resolve(&self.fresh()?.leaves))
    }

    /// Root nodes in insertion order.
    pub fn root_nodes(&self) -> Result<impl Iterator<Item = &NodeRecord> + '_> {
        Ok(self.resolve(&self.fresh()?.roots))
    }

    /// Interior nodes in insertion order.
    pub fn interior_nodes(&self) -> Result<impl Iterator<Item = &NodeRecord> + '_> {
        Ok(self.resolve(&self.fresh()?.interior))
    }

    /// Distinct edge start/end positions, ascending.
    pub fn breakpoint_positions(&self) -> Result<impl Iterator<Item = f64> + '_> {
        Ok(self.fresh()?.breakpoints.iter().map(|b| b.into_inner()))
    }

    /// Edges whose child is `child`, in insertion order.
    pub fn incoming_edges(&self, child: NodeId) -> Result<impl Iterator<Item = &EdgeRecord> + '_> {
        let slots = self
            .fresh()?
            .edges_by_child
            .get(&child)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(slots.iter().map(move |&i| &self.edges[i]))
    }

    /// Nodes whose positions were averaged into `parent`'s.
    pub fn layout_children(&self, parent: NodeId) -> Result<&[NodeId]> {
        Ok(self.fresh()?.layering.children_of(parent))
    }

    pub fn nodes_at_depth(&self, depth: u32) -> Result<&[NodeId]> {
        Ok(self.fresh()?.layering.at_depth(depth))
    }

    pub fn max_depth(&self) -> Result<u32> {
        Ok(self.fresh()?.layering.max_depth)
    }

    /// Owned copy of the laid-out graph for export.
    pub fn snapshot(&self) -> Result<LayoutSnapshot> {
        let cache = self.fresh()?;
        Ok(LayoutSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            leaves: cache.leaves.clone(),
            roots: cache.roots.clone(),
            interior: cache.interior.clone(),
            breakpoints: cache.breakpoints.iter().map(|b| b.into_inner()).collect(),
            max_depth: cache.layering.max_depth,
        })
    }
}

impl Default for RenderModel {
    fn default() -> Self {
        Self::new()
    }
}

fn check_span(start: f64, end: f64, what: impl FnOnce() -> String) -> Result<()> {
    if start.is_finite() && end.is_finite() && start < end {
        Ok(())
    } else {
        Err(Error::construction(
            ErrorCode::InvalidSpan,
            format!("{} has span [{}, {})", what(), start, end),
        ))
    }
}
