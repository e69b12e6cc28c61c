//! End-to-end flow validation on seeded random instances
//!
//! Every computed flow is checked against its certificate (conservation,
//! capacities, value, min-cut duality) and against an exhaustive minimum
//! cut enumeration on small graphs.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::algorithm::graph::max_flow::{
    build_flow_map, compute_max_flow, maximum_flow_value, minimum_cut, preflow_push,
    MaxFlowSolver, PreflowPushConfig,
};
use crate::algorithm::graph::preflow_push::PreflowPush;
use crate::algorithm::traits::{Capacity, FlowError};
use crate::data_structures::graph::{AttributeKey, CapacityAccessor, EdgeAttributes, FlowGraph, Graph};
use crate::data_structures::residual::build_residual_network;
use crate::validation::correctness::FlowValidator;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Random simple graph on `0..n`; roughly one edge in eight unbounded
fn random_graph(rng: &mut StdRng, n: u32, directed: bool, with_unbounded: bool) -> Graph<u32> {
    let mut graph = if directed { Graph::directed() } else { Graph::undirected() };
    for u in 0..n {
        graph.add_node(u);
    }
    let attempts = rng.gen_range(n..=3 * n);
    for _ in 0..attempts {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        if graph.has_edge(&u, &v) {
            continue;
        }
        let attributes = if with_unbounded && rng.gen_bool(0.125) {
            EdgeAttributes::new()
        } else {
            EdgeAttributes::with_capacity(rng.gen_range(0..=20))
        };
        graph.add_edge(u, v, attributes).unwrap();
    }
    graph
}

/// Minimum over every source/sink partition of the crossing capacity;
/// `None` if every such cut crosses an unbounded edge
fn brute_force_min_cut(graph: &Graph<u32>, source: u32, sink: u32) -> Option<Capacity> {
    let key = AttributeKey::default();
    let others: Vec<u32> = graph
        .nodes()
        .copied()
        .filter(|&u| u != source && u != sink)
        .collect();
    let mut best: Option<Capacity> = None;

    for mask in 0u32..(1 << others.len()) {
        let mut source_side: HashSet<u32> = HashSet::new();
        source_side.insert(source);
        for (i, &u) in others.iter().enumerate() {
            if mask & (1 << i) != 0 {
                source_side.insert(u);
            }
        }

        let mut total: Option<Capacity> = Some(0);
        for (&u, &v, attributes) in graph.edges() {
            if u == v {
                continue;
            }
            let forward = source_side.contains(&u) && !source_side.contains(&v);
            let backward = !graph.is_directed() && source_side.contains(&v) && !source_side.contains(&u);
            if forward || backward {
                total = match (total, key.capacity(attributes)) {
                    (Some(t), Some(c)) => Some(t + c),
                    _ => None,
                };
            }
        }
        if let Some(t) = total {
            best = Some(best.map_or(t, |b| b.min(t)));
        }
    }
    best
}

fn unbounded_path_exists(graph: &Graph<u32>, source: u32, sink: u32) -> bool {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(source);
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        for (&v, attributes) in graph.out_edges(&u) {
            if v != u && attributes.get("capacity").is_none() && seen.insert(v) {
                if v == sink {
                    return true;
                }
                queue.push_back(v);
            }
        }
    }
    false
}

fn check_instance(graph: &Graph<u32>, source: u32, sink: u32, freq: usize) {
    let key = AttributeKey::default();
    match compute_max_flow(graph, &source, &sink, &key, freq) {
        Err(FlowError::Unbounded) => {
            assert!(unbounded_path_exists(graph, source, sink));
        }
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(result) => {
            assert!(!unbounded_path_exists(graph, source, sink));
            let validator = FlowValidator::new(graph, &key);
            validator.verify(&result, &source, &sink).unwrap();
            assert_eq!(Some(result.flow_value), brute_force_min_cut(graph, source, sink));

            let (cut_result, cut) = MaxFlowSolver::new()
                .solve_with_cut(graph, &source, &sink, &key)
                .unwrap();
            assert_eq!(cut_result.flow_value, result.flow_value);
            validator.verify_cut(&cut_result, &cut).unwrap();

            let value = maximum_flow_value(graph, &source, &sink, &key, freq).unwrap();
            assert_eq!(value, result.flow_value);
        }
    }
}

#[test]
fn test_random_directed_instances() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for round in 0..150 {
        let n = rng.gen_range(2..=9);
        let graph = random_graph(&mut rng, n, true, round % 3 == 0);
        check_instance(&graph, 0, n - 1, round % 4);
    }
}

#[test]
fn test_random_undirected_instances() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..100 {
        let n = rng.gen_range(2..=8);
        let graph = random_graph(&mut rng, n, false, round % 4 == 0);
        check_instance(&graph, n - 1, 0, 1 + round % 2);
    }
}

#[test]
fn test_relabel_frequency_does_not_change_value() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let n = rng.gen_range(3..=10);
        let graph = random_graph(&mut rng, n, true, false);
        let key = AttributeKey::default();
        let values: Vec<_> = [0, 1, 2, 10]
            .iter()
            .map(|&freq| compute_max_flow(&graph, &0, &(n - 1), &key, freq).unwrap().flow_value)
            .collect();
        assert!(values.windows(2).all(|w| w[0] == w[1]), "{:?}", values);
    }
}

#[test]
fn test_residual_invariant_after_run() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..40 {
        let n = rng.gen_range(2..=10);
        let directed = rng.gen_bool(0.5);
        let graph = random_graph(&mut rng, n, directed, false);
        let mut residual =
            build_residual_network(&graph, &0, &(n - 1), &AttributeKey::default()).unwrap();
        let before: Vec<Capacity> = (0..residual.arc_count()).map(|a| residual.pair_capacity(a)).collect();

        PreflowPush::new(&mut residual, 1).run(false).unwrap();

        for (arc, edge) in residual.edges().iter().enumerate() {
            let reverse = residual.edge(edge.reverse_edge_index);
            assert!(edge.residual_capacity() >= 0);
            assert_eq!(edge.residual_capacity() + reverse.residual_capacity(), before[arc]);
            assert_eq!(edge.flow, -reverse.flow);
        }
        for u in 0..residual.node_count() {
            if u != residual.source() && u != residual.sink() {
                assert_eq!(residual.excess(u), 0);
            }
        }
    }
}

#[test]
fn test_flow_map_lists_every_edge() {
    let mut rng = StdRng::seed_from_u64(3);
    let graph = random_graph(&mut rng, 8, true, false);
    let key = AttributeKey::default();
    let (residual, _) = preflow_push(&graph, &0, &7, &key, &PreflowPushConfig::default()).unwrap();
    let flow_map = build_flow_map(&graph, &residual);

    assert_eq!(flow_map, build_flow_map(&graph, &residual));
    assert_eq!(flow_map.len(), graph.node_count());
    for (&u, &v, _) in graph.edges() {
        assert!(flow_map[&u].contains_key(&v));
    }
    let cut = minimum_cut(&residual);
    assert_eq!(cut.value, residual.flow_value());
}

#[test]
fn test_layered_network() {
    // source -> 4 x 4 grid of layers -> sink, all capacities known
    let mut graph = Graph::directed();
    let layers = 4u32;
    let width = 4u32;
    let node = |layer: u32, i: u32| 1 + layer * width + i;
    let sink = 1 + layers * width;
    for i in 0..width {
        graph.add_edge_with_capacity(0, node(0, i), 5).unwrap();
        graph.add_edge_with_capacity(node(layers - 1, i), sink, 5).unwrap();
    }
    for layer in 0..layers - 1 {
        for i in 0..width {
            for j in 0..width {
                graph.add_edge_with_capacity(node(layer, i), node(layer + 1, j), 1).unwrap();
            }
        }
    }
    let key = AttributeKey::default();
    let result = compute_max_flow(&graph, &0, &sink, &key, 1).unwrap();
    assert_eq!(result.flow_value, 16);
    FlowValidator::new(&graph, &key).verify(&result, &0, &sink).unwrap();
}
