//! Bulk construction of a [`RenderModel`] from an external ARG.
//!
//! The simulation/inference library that produces the ARG is abstracted as
//! [`ArgSource`]. [`ArgDocument`] is a plain serde form of the same data, used
//! when the ARG arrives as JSON or as a JS object through the WASM API.

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::HashMap;

use crate::error::{Error, ErrorCode, ErrorKind, Result};
use crate::graph::{NodeId, RenderModel};
use crate::layout::LayoutConfig;

/// One ARG node as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceNode {
    pub id: NodeId,
    pub height: f64,
    pub start: f64,
    pub end: f64,
}

/// One incoming ancestry edge of a source node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceEdge {
    pub parent: NodeId,
    pub start: f64,
    pub end: f64,
}

/// Read access to an ARG held by some other library.
pub trait ArgSource {
    /// All node ids, in source order.
    fn node_ids(&self) -> Vec<NodeId>;

    fn node(&self, id: NodeId) -> Option<SourceNode>;

    /// Edges from the node's parents into it.
    fn parent_edges(&self, id: NodeId) -> Vec<SourceEdge>;
}

/// Build a validated model from `source`.
///
/// Nodes are added in ascending id order with their id as the initial x
/// position, so samples keep the source's ordering. Every parent edge of
/// every node is then added and the model is rebuilt with validation.
pub fn import_arg<S: ArgSource + ?Sized>(source: &S, config: LayoutConfig) -> Result<RenderModel> {
    let mut ids = source.node_ids();
    ids.sort();

    let mut model = RenderModel::with_capacity(ids.len(), ids.len(), config);
    let mut pending = Vec::with_capacity(ids.len());

    for id in ids {
        let node = source.node(id).ok_or_else(|| {
            Error::new(
                ErrorKind::Construction,
                ErrorCode::MissingSourceNode,
                Some(format!("source lists {} but cannot resolve it", id)),
            )
        })?;
        model.add_positioned_node(node.id, node.height, node.start, node.end, f64::from(id.0))?;
        pending.push(id);
    }

    for child in pending {
        for edge in source.parent_edges(child) {
            model.add_edge(edge.parent, child, edge.start, edge.end)?;
        }
    }

    model.rebuild(true)?;
    tracing::debug!(
        "imported ARG: {} nodes, {} edges",
        model.node_count(),
        model.edge_count()
    );

    Ok(model)
}

/// A node entry in an [`ArgDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: NodeId,
    pub height: f64,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub parents: Vec<SourceEdge>,
}

/// Serializable ARG: nodes with their incoming edges.
///
/// ```json
/// { "nodes": [
///     { "id": 0, "height": 0, "start": 0, "end": 10,
///       "parents": [{ "parent": 2, "start": 5, "end": 8 }] },
///     { "id": 2, "height": 3, "start": 1, "end": 8 }
/// ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgDocument {
    pub nodes: Vec<DocumentNode>,
    /// Id to position in `nodes`, built on first lookup.
    #[serde(skip)]
    index: OnceCell<HashMap<NodeId, usize>>,
}

impl ArgDocument {
    pub fn new(nodes: Vec<DocumentNode>) -> Self {
        Self {
            nodes,
            index: OnceCell::new(),
        }
    }

    /// First node with `id`.
    fn find(&self, id: NodeId) -> Option<&DocumentNode> {
        let index = self.index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.nodes.len());
            for (slot, node) in self.nodes.iter().enumerate() {
                index.entry(node.id).or_insert(slot);
            }
            index
        });
        index.get(&id).map(|&slot| &self.nodes[slot])
    }
}

impl ArgSource for ArgDocument {
    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    fn node(&self, id: NodeId) -> Option<SourceNode> {
        self.find(id).map(|node| SourceNode {
            id: node.id,
            height: node.height,
            start: node.start,
            end: node.end,
        })
    }

    fn parent_edges(&self, id: NodeId) -> Vec<SourceEdge> {
        self.find(id).map(|node| node.parents.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::QuantizeMode;

    const SCENARIO_A: &str = r#"{
        "nodes": [
            { "id": 2, "height": 3, "start": 1, "end": 8 },
            { "id": 1, "height": 0, "start": 0, "end": 10,
              "parents": [{ "parent": 2, "start": 1, "end": 5 }] },
            { "id": 0, "height": 0, "start": 0, "end": 10,
              "parents": [{ "parent": 2, "start": 5, "end": 8 }] }
        ]
    }"#;

    #[test]
    fn test_import_from_json() {
        let document: ArgDocument = serde_json::from_str(SCENARIO_A).unwrap();
        let model = import_arg(&document, LayoutConfig::default()).unwrap();

        assert!(!model.is_dirty());
        let order: Vec<u32> = model.nodes().iter().map(|n| n.id.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(model.edge_count(), 2);
        assert!(model.node_is_root(NodeId(2)).unwrap());
        assert!((model.node(NodeId(2)).unwrap().x_pos.unwrap() - 0.5).abs() < 1e-9);
    }

    /// A height-0 node over `[0, 1)` inheriting fully from each parent.
    fn sample(id: u32, parents: &[u32]) -> DocumentNode {
        DocumentNode {
            id: NodeId(id),
            height: 0.0,
            start: 0.0,
            end: 1.0,
            parents: parents
                .iter()
                .map(|&parent| SourceEdge {
                    parent: NodeId(parent),
                    start: 0.0,
                    end: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_document_lookup_by_id() {
        let document = ArgDocument::new(vec![sample(7, &[9]), sample(4, &[9]), sample(7, &[])]);

        assert_eq!(document.node(NodeId(4)).map(|n| n.id), Some(NodeId(4)));
        assert_eq!(document.node(NodeId(5)), None);
        // Repeated ids resolve to the first entry.
        assert_eq!(document.parent_edges(NodeId(7)).len(), 1);
        assert!(document.parent_edges(NodeId(5)).is_empty());
    }

    #[test]
    fn test_duplicate_document_ids_rejected() {
        let document = ArgDocument::new(vec![sample(0, &[1]), sample(0, &[1])]);

        let err = import_arg(&document, LayoutConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateNode);
    }

    #[test]
    fn test_sample_ids_order_leaves() {
        // Sample ids 4 and 7 keep their relative order; leaves are ranked.
        let document = ArgDocument::new(vec![
            sample(7, &[9]),
            sample(4, &[9]),
            DocumentNode {
                id: NodeId(9),
                height: 1.0,
                start: 0.0,
                end: 1.0,
                parents: vec![],
            },
        ]);
        let model = import_arg(&document, LayoutConfig::default()).unwrap();

        assert_eq!(model.node(NodeId(4)).unwrap().x_pos, Some(0.0));
        assert_eq!(model.node(NodeId(7)).unwrap().x_pos, Some(1.0));
    }

    #[test]
    fn test_hints_survive_without_quantization() {
        let document: ArgDocument = serde_json::from_str(SCENARIO_A).unwrap();
        let config = LayoutConfig {
            quantize: QuantizeMode::Off,
        };
        let model = import_arg(&document, config).unwrap();

        assert_eq!(model.node(NodeId(1)).unwrap().x_pos, Some(1.0));
    }

    #[test]
    fn test_unknown_parent_fails_validation() {
        let json = r#"{ "nodes": [
            { "id": 0, "height": 0, "start": 0, "end": 10,
              "parents": [{ "parent": 5, "start": 0, "end": 10 }] }
        ] }"#;
        let document: ArgDocument = serde_json::from_str(json).unwrap();

        let err = import_arg(&document, LayoutConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownNode);
    }

    #[test]
    fn test_disconnected_node_fails_validation() {
        let json = r#"{ "nodes": [
            { "id": 0, "height": 0, "start": 0, "end": 10 }
        ] }"#;
        let document: ArgDocument = serde_json::from_str(json).unwrap();

        let err = import_arg(&document, LayoutConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DisconnectedNode);
    }

    struct BrokenSource;

    impl ArgSource for BrokenSource {
        fn node_ids(&self) -> Vec<NodeId> {
            vec![NodeId(0)]
        }

        fn node(&self, _id: NodeId) -> Option<SourceNode> {
            None
        }

        fn parent_edges(&self, _id: NodeId) -> Vec<SourceEdge> {
            Vec::new()
        }
    }

    #[test]
    fn test_unresolvable_source_node() {
        let err = import_arg(&BrokenSource, LayoutConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSourceNode);
    }
}
