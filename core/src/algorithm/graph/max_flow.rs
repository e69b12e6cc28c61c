//! Maximum Flow Algorithm Implementation
//!
//! Public entry points of the flow core. A computation flows one way:
//! input graph, then [`build_residual_network`], then the preflow-push
//! engine mutating the residual network in place, then [`build_flow_map`]
//! producing the caller-facing per-edge flow mapping.
//!
//! # Example
//! ```
//! use chronos_flow::algorithm::graph::max_flow::compute_max_flow;
//! use chronos_flow::data_structures::graph::{AttributeKey, Graph};
//!
//! let mut graph = Graph::directed();
//! graph.add_edge_with_capacity("s", "a", 3).unwrap();
//! graph.add_edge_with_capacity("a", "t", 2).unwrap();
//!
//! let result = compute_max_flow(&graph, &"s", &"t", &AttributeKey::default(), 1).unwrap();
//! assert_eq!(result.flow_value, 2);
//! assert_eq!(result.flow_map[&"s"][&"a"], 2);
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;
use serde::{Serialize, Deserialize};

use crate::algorithm::graph::preflow_push::PreflowPush;
use crate::algorithm::traits::{
    Algorithm, AlgorithmParameter, Flow, FlowError, FlowMetrics, ParameterType,
};
use crate::data_structures::graph::{CapacityAccessor, FlowGraph};
use crate::data_structures::residual::{build_residual_network, ResidualNetwork};

/// Node to out-neighbor to flow on that edge
pub type FlowMap<N> = HashMap<N, HashMap<N, Flow>>;

/// Preflow-push configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflowPushConfig {
    /// Global relabeling runs after `(n + m) / freq` units of relabel work;
    /// 0 disables the heuristic
    pub global_relabel_freq: usize,
    /// Stop after the maximum preflow is found
    pub value_only: bool,
}

impl Default for PreflowPushConfig {
    fn default() -> Self {
        Self {
            global_relabel_freq: 1,
            value_only: false,
        }
    }
}

impl PreflowPushConfig {
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        serde_json::from_str(json).map_err(|e| FlowError::InvalidParameter {
            name: "config".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Maximum flow result with per-edge flow information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResult<N: Eq + Hash> {
    /// Maximum flow value
    pub flow_value: Flow,
    /// Flow on every original edge, zero-flow edges included
    pub flow_map: FlowMap<N>,
    /// Algorithm performance metrics
    pub metrics: FlowMetrics,
}

/// Minimum s-t cut derived from a converged residual network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimumCut<N: Eq + Hash> {
    /// Total capacity of arcs leaving the source side
    pub value: Flow,
    pub source_side: HashSet<N>,
    /// Nodes that can still reach the sink in the residual network
    pub sink_side: HashSet<N>,
}

/// Runs preflow-push and returns the converged residual network.
///
/// With `config.value_only` the network holds a maximum preflow: its flow
/// value and minimum cut are exact, per-arc flows may violate conservation.
pub fn preflow_push<G, C>(
    graph: &G,
    source: &G::Node,
    sink: &G::Node,
    capacity: &C,
    config: &PreflowPushConfig,
) -> Result<(ResidualNetwork<G::Node>, FlowMetrics), FlowError>
where
    G: FlowGraph,
    C: CapacityAccessor<G::Edge> + ?Sized,
{
    let mut residual = build_residual_network(graph, source, sink, capacity)?;
    let metrics = PreflowPush::new(&mut residual, config.global_relabel_freq).run(config.value_only)?;
    debug!(
        "Preflow-push {:?} -> {:?}: value {}, {} pushes, {} relabels, {} global relabels, {} gaps",
        source,
        sink,
        residual.flow_value(),
        metrics.push_operations,
        metrics.relabel_operations,
        metrics.global_relabels,
        metrics.gap_relabels
    );
    Ok((residual, metrics))
}

/// Computes a maximum flow and its per-edge mapping
pub fn compute_max_flow<G, C>(
    graph: &G,
    source: &G::Node,
    sink: &G::Node,
    capacity: &C,
    relabel_frequency: usize,
) -> Result<FlowResult<G::Node>, FlowError>
where
    G: FlowGraph,
    C: CapacityAccessor<G::Edge> + ?Sized,
{
    let config = PreflowPushConfig {
        global_relabel_freq: relabel_frequency,
        value_only: false,
    };
    let (residual, metrics) = preflow_push(graph, source, sink, capacity, &config)?;
    Ok(FlowResult {
        flow_value: residual.flow_value(),
        flow_map: build_flow_map(graph, &residual),
        metrics,
    })
}

/// Maximum flow value only; skips the excess-return phase
pub fn maximum_flow_value<G, C>(
    graph: &G,
    source: &G::Node,
    sink: &G::Node,
    capacity: &C,
    relabel_frequency: usize,
) -> Result<Flow, FlowError>
where
    G: FlowGraph,
    C: CapacityAccessor<G::Edge> + ?Sized,
{
    let config = PreflowPushConfig {
        global_relabel_freq: relabel_frequency,
        value_only: true,
    };
    preflow_push(graph, source, sink, capacity, &config).map(|(residual, _)| residual.flow_value())
}

/// Flow on every original edge of `graph`, read from `residual`
pub fn build_flow_map<G>(graph: &G, residual: &ResidualNetwork<G::Node>) -> FlowMap<G::Node>
where
    G: FlowGraph,
{
    let mut flow_map = HashMap::with_capacity(graph.node_count());
    for u in graph.nodes() {
        let mut flows: HashMap<G::Node, Flow> =
            graph.out_edges(u).map(|(v, _)| (v.clone(), 0)).collect();
        if let Some(ui) = residual.index_of(u) {
            for &arc in residual.out_arcs(ui) {
                let edge = residual.edge(arc);
                if edge.flow > 0 {
                    flows.insert(residual.node(edge.to).clone(), edge.flow);
                }
            }
        }
        flow_map.insert(u.clone(), flows);
    }
    flow_map
}

/// Source side: nodes that cannot reach the sink in the residual network
pub fn minimum_cut<N>(residual: &ResidualNetwork<N>) -> MinimumCut<N>
where
    N: Clone + Eq + Hash + Debug,
{
    let n = residual.node_count();
    let mut reaches_sink = vec![false; n];
    let mut queue = VecDeque::new();
    reaches_sink[residual.sink()] = true;
    queue.push_back(residual.sink());

    while let Some(u) = queue.pop_front() {
        for &arc in residual.out_arcs(u) {
            let reverse = residual.edge(residual.edge(arc).reverse_edge_index);
            if !reaches_sink[reverse.from] && reverse.residual_capacity() > 0 {
                reaches_sink[reverse.from] = true;
                queue.push_back(reverse.from);
            }
        }
    }

    let value = residual
        .edges()
        .iter()
        .filter(|e| !reaches_sink[e.from] && reaches_sink[e.to])
        .map(|e| e.capacity)
        .sum::<Flow>();

    let (sink_side, source_side): (Vec<usize>, Vec<usize>) = (0..n).partition(|&u| reaches_sink[u]);
    MinimumCut {
        value,
        source_side: source_side.into_iter().map(|u| residual.node(u).clone()).collect(),
        sink_side: sink_side.into_iter().map(|u| residual.node(u).clone()).collect(),
    }
}

/// Maximum flow solver with configurable heuristics
#[derive(Debug, Clone, Default)]
pub struct MaxFlowSolver {
    config: PreflowPushConfig,
    /// Metrics of the most recent run
    last_metrics: Option<FlowMetrics>,
    runs: usize,
}

impl MaxFlowSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PreflowPushConfig) -> Self {
        Self {
            config,
            last_metrics: None,
            runs: 0,
        }
    }

    pub fn config(&self) -> &PreflowPushConfig {
        &self.config
    }

    pub fn last_metrics(&self) -> Option<&FlowMetrics> {
        self.last_metrics.as_ref()
    }

    /// Completed runs of this solver
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Solves with the current configuration. In value-only mode the flow
    /// map reflects a preflow and may violate conservation.
    pub fn solve<G, C>(
        &mut self,
        graph: &G,
        source: &G::Node,
        sink: &G::Node,
        capacity: &C,
    ) -> Result<FlowResult<G::Node>, FlowError>
    where
        G: FlowGraph,
        C: CapacityAccessor<G::Edge> + ?Sized,
    {
        let (residual, metrics) = preflow_push(graph, source, sink, capacity, &self.config)?;
        self.last_metrics = Some(metrics.clone());
        self.runs += 1;
        Ok(FlowResult {
            flow_value: residual.flow_value(),
            flow_map: build_flow_map(graph, &residual),
            metrics,
        })
    }

    /// Solves and returns the minimum cut alongside the flow
    pub fn solve_with_cut<G, C>(
        &mut self,
        graph: &G,
        source: &G::Node,
        sink: &G::Node,
        capacity: &C,
    ) -> Result<(FlowResult<G::Node>, MinimumCut<G::Node>), FlowError>
    where
        G: FlowGraph,
        C: CapacityAccessor<G::Edge> + ?Sized,
    {
        let (residual, metrics) = preflow_push(graph, source, sink, capacity, &self.config)?;
        self.last_metrics = Some(metrics.clone());
        self.runs += 1;
        let cut = minimum_cut(&residual);
        Ok((
            FlowResult {
                flow_value: residual.flow_value(),
                flow_map: build_flow_map(graph, &residual),
                metrics,
            },
            cut,
        ))
    }
}

impl Algorithm for MaxFlowSolver {
    fn name(&self) -> &'static str {
        "Push-Relabel Highest Label"
    }

    fn category(&self) -> &'static str {
        "max_flow"
    }

    fn description(&self) -> String {
        "Goldberg-Tarjan preflow-push with highest-label selection, current-arc scanning, \
         global relabeling and the gap heuristic. O(n^2 sqrt(m)) time."
            .to_string()
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        vec![
            AlgorithmParameter {
                name: "global_relabel_freq".to_string(),
                value: self.config.global_relabel_freq.to_string(),
                value_type: ParameterType::Integer,
                description: "Relative frequency of global relabeling; 0 disables it".to_string(),
            },
            AlgorithmParameter {
                name: "value_only".to_string(),
                value: self.config.value_only.to_string(),
                value_type: ParameterType::Boolean,
                description: "Compute only the maximum preflow".to_string(),
            },
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), FlowError> {
        match name {
            "global_relabel_freq" => {
                self.config.global_relabel_freq = value.parse::<usize>().map_err(|_| {
                    FlowError::InvalidParameter {
                        name: name.to_string(),
                        reason: "global_relabel_freq must be a nonnegative integer".to_string(),
                    }
                })?;
                Ok(())
            }
            "value_only" => {
                self.config.value_only = value.parse::<bool>().map_err(|_| {
                    FlowError::InvalidParameter {
                        name: name.to_string(),
                        reason: "value_only must be true or false".to_string(),
                    }
                })?;
                Ok(())
            }
            _ => Err(FlowError::InvalidParameter {
                name: name.to_string(),
                reason: format!("Unknown parameter: {}", name),
            }),
        }
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "global_relabel_freq" => Some(self.config.global_relabel_freq.to_string()),
            "value_only" => Some(self.config.value_only.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::{AttributeKey, EdgeAttributes, Graph};

    fn key() -> AttributeKey {
        AttributeKey::default()
    }

    fn diamond() -> Graph<&'static str> {
        let mut graph = Graph::directed();
        graph.add_edge_with_capacity("s", "a", 10).unwrap();
        graph.add_edge_with_capacity("s", "b", 5).unwrap();
        graph.add_edge_with_capacity("a", "t", 10).unwrap();
        graph.add_edge_with_capacity("b", "t", 5).unwrap();
        graph.add_edge_with_capacity("a", "b", 15).unwrap();
        graph
    }

    #[test]
    fn test_diamond_max_flow() {
        let result = compute_max_flow(&diamond(), &"s", &"t", &key(), 1).unwrap();
        assert_eq!(result.flow_value, 15);
        assert_eq!(result.flow_map[&"s"][&"a"], 10);
        assert_eq!(result.flow_map[&"s"][&"b"], 5);
        assert_eq!(result.flow_map[&"a"][&"t"], 10);
        assert_eq!(result.flow_map[&"b"][&"t"], 5);
        assert_eq!(result.flow_map[&"a"][&"b"], 0);
        assert!(result.flow_map[&"t"].is_empty());
    }

    #[test]
    fn test_single_edge() {
        let mut graph = Graph::directed();
        graph.add_edge_with_capacity("s", "t", 7).unwrap();
        let result = compute_max_flow(&graph, &"s", &"t", &key(), 1).unwrap();
        assert_eq!(result.flow_value, 7);
        assert_eq!(result.flow_map[&"s"][&"t"], 7);
    }

    #[test]
    fn test_disconnected_terminals() {
        let mut graph = Graph::directed();
        graph.add_edge_with_capacity("s", "a", 4).unwrap();
        graph.add_edge_with_capacity("b", "t", 4).unwrap();
        let result = compute_max_flow(&graph, &"s", &"t", &key(), 1).unwrap();
        assert_eq!(result.flow_value, 0);
        assert!(result.flow_map.values().flat_map(|m| m.values()).all(|&f| f == 0));
        assert_eq!(result.flow_map[&"s"].len(), 1);
    }

    #[test]
    fn test_unbounded_edge_fails() {
        let mut graph = Graph::directed();
        graph.add_unbounded_edge("s", "t").unwrap();
        assert_eq!(
            compute_max_flow(&graph, &"s", &"t", &key(), 1).unwrap_err(),
            FlowError::Unbounded
        );
    }

    #[test]
    fn test_same_terminal_fails() {
        let graph = diamond();
        assert!(matches!(
            compute_max_flow(&graph, &"s", &"s", &key(), 1),
            Err(FlowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_directed_four_cycle() {
        let mut graph = Graph::directed();
        for (u, v) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            graph.add_edge_with_capacity(u, v, 1).unwrap();
        }
        let result = compute_max_flow(&graph, &0, &2, &key(), 1).unwrap();
        assert_eq!(result.flow_value, 1);
        assert_eq!(result.flow_map[&0][&1], 1);
        assert_eq!(result.flow_map[&1][&2], 1);
        assert_eq!(result.flow_map[&2][&3], 0);
        assert_eq!(result.flow_map[&3][&0], 0);
    }

    #[test]
    fn test_unbounded_edges_off_the_cut() {
        let mut graph = Graph::directed();
        graph.add_unbounded_edge("s", "a").unwrap();
        graph.add_edge_with_capacity("a", "t", 4).unwrap();
        graph.add_edge_with_capacity("s", "b", 2).unwrap();
        graph.add_unbounded_edge("b", "t").unwrap();
        let result = compute_max_flow(&graph, &"s", &"t", &key(), 1).unwrap();
        assert_eq!(result.flow_value, 6);
        assert_eq!(result.flow_map[&"s"][&"a"], 4);
        assert_eq!(result.flow_map[&"b"][&"t"], 2);
    }

    #[test]
    fn test_undirected_graph() {
        let mut graph = Graph::undirected();
        graph.add_edge_with_capacity("s", "a", 3).unwrap();
        graph.add_edge_with_capacity("t", "a", 2).unwrap();
        graph.add_edge_with_capacity("s", "b", 1).unwrap();
        graph.add_edge_with_capacity("b", "t", 4).unwrap();
        let result = compute_max_flow(&graph, &"s", &"t", &key(), 1).unwrap();
        assert_eq!(result.flow_value, 3);
        assert_eq!(result.flow_map[&"a"][&"t"], 2);
        assert_eq!(result.flow_map[&"t"][&"a"], 0);
        assert_eq!(result.flow_map[&"a"][&"s"], 0);
    }

    #[test]
    fn test_custom_capacity_key_and_closure() {
        let mut graph = Graph::directed();
        graph
            .add_edge("s", "t", EdgeAttributes::new().with("bandwidth", 9).with("capacity", 1))
            .unwrap();
        let by_key = compute_max_flow(&graph, &"s", &"t", &AttributeKey::new("bandwidth"), 1).unwrap();
        assert_eq!(by_key.flow_value, 9);

        let halved = |e: &EdgeAttributes| e.get("bandwidth").map(|c| c / 2);
        assert_eq!(maximum_flow_value(&graph, &"s", &"t", &halved, 1).unwrap(), 4);
    }

    #[test]
    fn test_maximum_flow_value_matches_full_run() {
        let graph = diamond();
        let value = maximum_flow_value(&graph, &"s", &"t", &key(), 1).unwrap();
        let full = compute_max_flow(&graph, &"s", &"t", &key(), 1).unwrap();
        assert_eq!(value, full.flow_value);
    }

    #[test]
    fn test_minimum_cut() {
        let mut graph = Graph::directed();
        graph.add_edge_with_capacity("s", "a", 5).unwrap();
        graph.add_edge_with_capacity("a", "b", 1).unwrap();
        graph.add_edge_with_capacity("b", "t", 5).unwrap();
        let (residual, _) =
            preflow_push(&graph, &"s", &"t", &key(), &PreflowPushConfig::default()).unwrap();
        let cut = minimum_cut(&residual);
        assert_eq!(cut.value, 1);
        assert_eq!(cut.source_side, ["s", "a"].into_iter().collect::<HashSet<_>>());
        assert_eq!(cut.sink_side, ["b", "t"].into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn test_flow_map_extraction_is_idempotent() {
        let graph = diamond();
        let (residual, _) =
            preflow_push(&graph, &"s", &"t", &key(), &PreflowPushConfig::default()).unwrap();
        assert_eq!(build_flow_map(&graph, &residual), build_flow_map(&graph, &residual));
    }

    #[test]
    fn test_solver_parameters() {
        let mut solver = MaxFlowSolver::new();
        assert_eq!(solver.name(), "Push-Relabel Highest Label");
        assert_eq!(solver.category(), "max_flow");
        assert_eq!(solver.get_parameter("global_relabel_freq"), Some("1".to_string()));

        assert!(solver.set_parameter("global_relabel_freq", "4").is_ok());
        assert_eq!(solver.config().global_relabel_freq, 4);
        assert!(solver.set_parameter("value_only", "true").is_ok());
        assert_eq!(solver.get_parameters()["value_only"], "true");

        // Test invalid parameters
        assert!(solver.set_parameter("invalid_param", "value").is_err());
        assert!(solver.set_parameter("global_relabel_freq", "-1").is_err());
        assert!(solver.set_parameter("value_only", "maybe").is_err());
        assert_eq!(solver.get_parameter("invalid_param"), None);
    }

    #[test]
    fn test_solver_runs_record_metrics() {
        let mut solver = MaxFlowSolver::new();
        assert!(solver.last_metrics().is_none());
        let (result, cut) = solver.solve_with_cut(&diamond(), &"s", &"t", &key()).unwrap();
        assert_eq!(result.flow_value, cut.value);
        assert_eq!(solver.last_metrics(), Some(&result.metrics));
        solver.solve(&diamond(), &"s", &"t", &key()).unwrap();
        assert_eq!(solver.runs(), 2);
    }

    #[test]
    fn test_config_from_json() {
        let config = PreflowPushConfig::from_json(r#"{"global_relabel_freq": 0}"#).unwrap();
        assert_eq!(config.global_relabel_freq, 0);
        assert!(!config.value_only);
        assert_eq!(PreflowPushConfig::from_json("{}").unwrap(), PreflowPushConfig::default());
        assert!(PreflowPushConfig::from_json(r#"{"global_relabel_freq": -2}"#).is_err());
    }

    #[test]
    fn test_flow_result_serialization() {
        let result = compute_max_flow(&diamond(), &"s", &"t", &key(), 1).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["flow_value"], 15);
        assert_eq!(json["flow_map"]["a"]["t"], 10);
    }
}
