//! Layered leaves-up layout for ancestral recombination graphs.
//!
//! Unlike a tree, an ARG node may inherit from several parents over disjoint
//! genomic spans, so a parent's horizontal position cannot come from a single
//! subtree. The layout instead sweeps the DAG in breadth-first layers
//! starting at the leaves:
//!
//! 1. **Depth sweep (bottom-up):** every frontier node gets the current layer
//!    as its depth and pushes its parents into the next frontier. A node that
//!    is reached again in a later layer has its depth overwritten, so the final
//!    depth is the longest leaf-to-node path. Each visit also records the node
//!    as a layout child of every parent it pushed.
//! 2. **Leaf placement:** leaves with no position hint get sequential indices.
//! 3. **Averaging (ascending depth):** each non-leaf takes the mean x of its
//!    layout children, so ancestors sit between their descendants.
//! 4. **Quantization:** optionally replace x by its rank among the leaves or
//!    among all nodes, giving evenly spaced integer columns.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::graph::{NodeId, NodeRecord};

/// Which nodes are re-ranked into integer columns after averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuantizeMode {
    /// Keep averaged positions exactly as computed.
    Off,
    /// Rank leaves only; interior nodes keep their averaged (possibly
    /// fractional) positions.
    #[default]
    Leaves,
    /// Rank every node, so no two nodes share a column.
    All,
}

/// Configuration for the layered layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub quantize: QuantizeMode,
}

/// Derived layering produced by [`compute_layers`].
#[derive(Debug, Clone, Default)]
pub struct Layering {
    /// Parent id to the nodes whose x positions it averages, in discovery order.
    pub layout_children: HashMap<NodeId, Vec<NodeId>>,
    /// Node ids per depth, in node insertion order.
    pub nodes_by_depth: Vec<Vec<NodeId>>,
    /// Deepest layer reached (0 when only leaves exist).
    pub max_depth: u32,
}

impl Layering {
    pub fn children_of(&self, parent: NodeId) -> &[NodeId] {
        self.layout_children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn at_depth(&self, depth: u32) -> &[NodeId] {
        self.nodes_by_depth
            .get(depth as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Run the layered layout over `nodes`, writing `depth` and `x_pos` in place.
///
/// Every node starts from its `x_hint`, so the result depends only on the
/// current graph and config, never on an earlier layout.
///
/// # Arguments
///
/// * `nodes` - All node records, in insertion order
/// * `index` - Node id to position in `nodes`
/// * `parents_of` - Child id to the parent ids of its incoming edges. Edges
///   whose endpoints are not in `index` must already be filtered out.
/// * `leaves` - Leaf ids, in insertion order
/// * `config` - Quantization settings
///
/// The edge set must be acyclic; the caller is expected to have checked.
pub fn compute_layers(
    nodes: &mut [NodeRecord],
    index: &HashMap<NodeId, usize>,
    parents_of: &HashMap<NodeId, Vec<NodeId>>,
    leaves: &[NodeId],
    config: &LayoutConfig,
) -> Layering {
    for node in nodes.iter_mut() {
        node.depth = None;
        node.x_pos = node.x_hint;
    }

    let layout_children = sweep_depths(nodes, index, parents_of, leaves);

    let mut nodes_by_depth: Vec<Vec<NodeId>> = Vec::new();
    for node in nodes.iter() {
        if let Some(depth) = node.depth {
            let depth = depth as usize;
            if nodes_by_depth.len() <= depth {
                nodes_by_depth.resize_with(depth + 1, Vec::new);
            }
            nodes_by_depth[depth].push(node.id);
        }
    }
    let max_depth = nodes_by_depth.len().saturating_sub(1) as u32;

    let layering = Layering {
        layout_children,
        nodes_by_depth,
        max_depth,
    };

    place_leaves(nodes, index, layering.at_depth(0));
    average_positions(nodes, index, &layering);

    match config.quantize {
        QuantizeMode::Off => {}
        QuantizeMode::Leaves => {
            let slots: Vec<usize> = leaves.iter().filter_map(|id| index.get(id).copied()).collect();
            quantize(nodes, &slots);
        }
        QuantizeMode::All => {
            let slots: Vec<usize> = (0..nodes.len())
                .filter(|&slot| nodes[slot].x_pos.is_some())
                .collect();
            quantize(nodes, &slots);
        }
    }

    tracing::trace!(
        "layered layout: {} layers, {} parents with layout children",
        layering.nodes_by_depth.len(),
        layering.layout_children.len()
    );

    layering
}

/// Breadth-first sweep from the leaves assigning maximal depths.
fn sweep_depths(
    nodes: &mut [NodeRecord],
    index: &HashMap<NodeId, usize>,
    parents_of: &HashMap<NodeId, Vec<NodeId>>,
    leaves: &[NodeId],
) -> HashMap<NodeId, Vec<NodeId>> {
    let mut layout_children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut seen_children: HashSet<(NodeId, NodeId)> = HashSet::new();

    let mut frontier: Vec<NodeId> = leaves.to_vec();
    let mut layer = 0u32;

    while !frontier.is_empty() {
        let mut next: Vec<NodeId> = Vec::new();
        let mut queued: HashSet<NodeId> = HashSet::new();

        for &id in &frontier {
            let Some(&slot) = index.get(&id) else {
                continue;
            };
            // Later layers overwrite earlier ones: longest path wins.
            nodes[slot].depth = Some(layer);

            let Some(parents) = parents_of.get(&id) else {
                continue;
            };
            for &parent in parents {
                if queued.insert(parent) {
                    next.push(parent);
                }
                if seen_children.insert((parent, id)) {
                    layout_children.entry(parent).or_default().push(id);
                }
            }
        }

        tracing::trace!("layer {}: {} nodes", layer, frontier.len());
        frontier = next;
        layer += 1;
    }

    layout_children
}

/// Give leaves sequential positions unless every leaf already has one.
fn place_leaves(nodes: &mut [NodeRecord], index: &HashMap<NodeId, usize>, leaves: &[NodeId]) {
    let slots: Vec<usize> = leaves.iter().filter_map(|id| index.get(id).copied()).collect();
    if slots.iter().all(|&slot| nodes[slot].x_pos.is_some()) {
        return;
    }

    for (column, slot) in slots.into_iter().enumerate() {
        nodes[slot].x_pos = Some(column as f64);
    }
}

/// Ascend the layers setting each node to the mean x of its layout children.
fn average_positions(
    nodes: &mut [NodeRecord],
    index: &HashMap<NodeId, usize>,
    layering: &Layering,
) {
    for depth in 1..=layering.max_depth {
        for &id in layering.at_depth(depth) {
            let children = layering.children_of(id);
            let xs: Vec<f64> = children
                .iter()
                .filter_map(|child| index.get(child))
                .filter_map(|&slot| nodes[slot].x_pos)
                .collect();
            if xs.is_empty() {
                continue;
            }

            let mean = xs.iter().sum::<f64>() / xs.len() as f64;
            if let Some(&slot) = index.get(&id) {
                nodes[slot].x_pos = Some(mean);
            }
        }
    }
}

/// Replace the x position of each slot by its rank in ascending x order.
///
/// The sort is stable, so ties keep the order of `slots`. Unplaced nodes sort
/// first.
pub fn quantize(nodes: &mut [NodeRecord], slots: &[usize]) {
    let mut order: Vec<usize> = slots.to_vec();
    order.sort_by(|&a, &b| {
        let xa = nodes[a].x_pos.unwrap_or(f64::NEG_INFINITY);
        let xb = nodes[b].x_pos.unwrap_or(f64::NEG_INFINITY);
        xa.total_cmp(&xb)
    });

    for (rank, slot) in order.into_iter().enumerate() {
        nodes[slot].x_pos = Some(rank as f64);
    }
}
