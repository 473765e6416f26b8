//! Property tests for classification, layering, and quantization over
//! randomly generated ancestry DAGs.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use super::layered::quantize;
use super::{LayoutConfig, QuantizeMode};
use crate::graph::{NodeId, NodeRecord, RenderModel};

/// Node count plus (parent, child) pairs with parent id > child id, which
/// keeps every generated graph acyclic.
fn dag_strategy() -> impl Strategy<Value = (u32, Vec<(u32, u32)>)> {
    (2u32..14).prop_flat_map(|n| {
        let pairs = prop::collection::vec((0..n, 0..n), 0..30).prop_map(|raw| {
            raw.into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| (a.max(b), a.min(b)))
                .collect::<Vec<_>>()
        });
        (Just(n), pairs)
    })
}

fn build(n: u32, pairs: &[(u32, u32)], quantize: QuantizeMode) -> RenderModel {
    let mut model = RenderModel::with_config(LayoutConfig { quantize });
    for id in 0..n {
        model.add_node(NodeId(id), f64::from(id), 0.0, 100.0).unwrap();
    }
    for (i, &(parent, child)) in pairs.iter().enumerate() {
        // Distinct starts keep every (child, start) key unique.
        let start = i as f64;
        model.add_edge(NodeId(parent), NodeId(child), start, start + 1.0).unwrap();
    }
    model.rebuild(false).unwrap();
    model
}

fn quantize_mode() -> impl Strategy<Value = QuantizeMode> {
    prop_oneof![
        Just(QuantizeMode::Off),
        Just(QuantizeMode::Leaves),
        Just(QuantizeMode::All),
    ]
}

fn layout_of(model: &RenderModel) -> Vec<(Option<f64>, Option<u32>)> {
    model.nodes().iter().map(|n| (n.x_pos, n.depth)).collect()
}

fn longest_path(
    id: u32,
    children: &HashMap<u32, HashSet<u32>>,
    memo: &mut HashMap<u32, u32>,
) -> u32 {
    if let Some(&depth) = memo.get(&id) {
        return depth;
    }
    let depth = match children.get(&id) {
        Some(kids) => 1 + kids
            .iter()
            .map(|&kid| longest_path(kid, children, memo))
            .max()
            .unwrap_or(0),
        None => 0,
    };
    memo.insert(id, depth);
    depth
}

fn records(xs: &[f64]) -> Vec<NodeRecord> {
    xs.iter()
        .enumerate()
        .map(|(i, &x)| {
            let mut node = NodeRecord::new(NodeId(i as u32), 0.0, 0.0, 1.0);
            node.x_pos = Some(x);
            node
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn classification_partitions_nodes((n, pairs) in dag_strategy()) {
        let model = build(n, &pairs, QuantizeMode::Leaves);

        let leaves: HashSet<NodeId> = model.leaf_nodes().unwrap().map(|n| n.id).collect();
        let roots: HashSet<NodeId> = model.root_nodes().unwrap().map(|n| n.id).collect();
        let interior: HashSet<NodeId> = model.interior_nodes().unwrap().map(|n| n.id).collect();

        prop_assert!(leaves.is_disjoint(&roots));
        prop_assert!(leaves.is_disjoint(&interior));
        prop_assert!(roots.is_disjoint(&interior));
        prop_assert_eq!(leaves.len() + roots.len() + interior.len(), n as usize);
    }

    #[test]
    fn depth_is_longest_leaf_path((n, pairs) in dag_strategy()) {
        let model = build(n, &pairs, QuantizeMode::Leaves);

        let mut children: HashMap<u32, HashSet<u32>> = HashMap::new();
        for &(parent, child) in &pairs {
            children.entry(parent).or_default().insert(child);
        }
        let mut memo = HashMap::new();
        for id in 0..n {
            let expected = longest_path(id, &children, &mut memo);
            prop_assert_eq!(model.node(NodeId(id)).unwrap().depth, Some(expected));
        }
    }

    #[test]
    fn parents_sit_at_mean_of_layout_children((n, pairs) in dag_strategy()) {
        let model = build(n, &pairs, QuantizeMode::Off);

        for node in model.nodes() {
            if model.node_is_leaf(node.id).unwrap() {
                continue;
            }
            let kids = model.layout_children(node.id).unwrap();
            prop_assert!(!kids.is_empty());

            let direct: HashSet<u32> = pairs
                .iter()
                .filter(|(p, _)| *p == node.id.0)
                .map(|&(_, c)| c)
                .collect();
            let recorded: HashSet<u32> = kids.iter().map(|id| id.0).collect();
            prop_assert_eq!(recorded, direct);

            let mean = kids
                .iter()
                .map(|id| model.node(*id).unwrap().x_pos.unwrap())
                .sum::<f64>()
                / kids.len() as f64;
            prop_assert!((node.x_pos.unwrap() - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn incremental_growth_matches_fresh_build(
        (n, pairs) in dag_strategy(),
        mode in quantize_mode(),
    ) {
        let mut grown = RenderModel::with_config(LayoutConfig { quantize: mode });
        for id in 0..n {
            grown.add_node(NodeId(id), f64::from(id), 0.0, 100.0).unwrap();
        }
        grown.rebuild(false).unwrap();
        for (i, &(parent, child)) in pairs.iter().enumerate() {
            let start = i as f64;
            grown.add_edge(NodeId(parent), NodeId(child), start, start + 1.0).unwrap();
            grown.rebuild(false).unwrap();
        }

        let fresh = build(n, &pairs, mode);
        prop_assert_eq!(layout_of(&grown), layout_of(&fresh));
    }

    #[test]
    fn quantize_all_gives_distinct_ranks((n, pairs) in dag_strategy()) {
        let model = build(n, &pairs, QuantizeMode::All);

        let mut xs: Vec<i64> = model.nodes().iter().map(|n| n.x_pos.unwrap() as i64).collect();
        xs.sort();
        prop_assert_eq!(xs, (0..n as i64).collect::<Vec<_>>());
    }

    #[test]
    fn quantize_is_idempotent(xs in prop::collection::vec(-50.0f64..50.0, 0..20)) {
        let mut nodes = records(&xs);
        let slots: Vec<usize> = (0..nodes.len()).collect();

        quantize(&mut nodes, &slots);
        let once: Vec<Option<f64>> = nodes.iter().map(|n| n.x_pos).collect();
        quantize(&mut nodes, &slots);
        let twice: Vec<Option<f64>> = nodes.iter().map(|n| n.x_pos).collect();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn quantize_preserves_order(xs in prop::collection::vec(-5i32..5, 0..20)) {
        // Small integer range so ties are common.
        let xs: Vec<f64> = xs.into_iter().map(f64::from).collect();
        let mut nodes = records(&xs);
        let slots: Vec<usize> = (0..nodes.len()).collect();
        quantize(&mut nodes, &slots);

        for a in 0..xs.len() {
            for b in 0..xs.len() {
                let (qa, qb) = (nodes[a].x_pos.unwrap(), nodes[b].x_pos.unwrap());
                if xs[a] < xs[b] {
                    prop_assert!(qa < qb);
                }
                if xs[a] == xs[b] && a < b {
                    prop_assert!(qa < qb);
                }
            }
        }
    }
}
