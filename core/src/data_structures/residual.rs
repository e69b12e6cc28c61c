//! Residual network construction and bookkeeping
//!
//! A residual network is built once per computation. Every original edge
//! `(u, v)` contributes to a forward/reverse arc pair; arcs live in a single
//! arena and refer to their pair by index, and each node keeps its outgoing
//! arc indices in stable insertion order so that current-arc cursors can
//! address them by position.
//!
//! # Residual Invariant
//! An arc stores its capacity and its current flow, and pushing `d` units
//! along an arc adds `d` to its flow and subtracts `d` from its pair's flow.
//! `residual(u, v) + residual(v, u)` therefore always equals the pair's total
//! capacity.
//!
//! # Unbounded Capacities
//! Edges without a capacity are given a finite sentinel: twice the sum of
//! all finite capacities, or 1 if there are none. No finite minimum cut can
//! contain a sentinel arc, and sentinel arcs stay distinguishable for the
//! unboundedness check that runs before any flow is pushed.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;

use crate::algorithm::traits::{Capacity, Flow, FlowError};
use crate::data_structures::graph::{CapacityAccessor, FlowGraph};

/// Residual arc with a paired reverse arc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualEdge {
    /// Tail vertex index
    pub from: usize,
    /// Head vertex index
    pub to: usize,
    /// Capacity contributed by original edges
    pub capacity: Capacity,
    /// Current flow; the negation of the pair's flow
    pub flow: Flow,
    /// Index of the paired reverse arc
    pub reverse_edge_index: usize,
}

impl ResidualEdge {
    fn new(from: usize, to: usize, reverse_edge_index: usize) -> Self {
        Self {
            from,
            to,
            capacity: 0,
            flow: 0,
            reverse_edge_index,
        }
    }

    /// Remaining capacity after accounting for current flow
    #[inline]
    pub fn residual_capacity(&self) -> Capacity {
        self.capacity - self.flow
    }
}

/// Residual network over dense node indices
#[derive(Debug, Clone)]
pub struct ResidualNetwork<N> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    edges: Vec<ResidualEdge>,
    adjacency: Vec<Vec<usize>>,
    lookup: HashMap<(usize, usize), usize>,
    excess: Vec<Flow>,
    source: usize,
    sink: usize,
    infinity: Capacity,
    flow_value: Flow,
}

impl<N: Clone + Eq + Hash + Debug> ResidualNetwork<N> {
    fn with_nodes(nodes: Vec<N>, source: usize, sink: usize, infinity: Capacity) -> Self {
        let index = nodes.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
        let count = nodes.len();
        Self {
            nodes,
            index,
            edges: Vec::new(),
            adjacency: vec![Vec::new(); count],
            lookup: HashMap::new(),
            excess: vec![0; count],
            source,
            sink,
            infinity,
            flow_value: 0,
        }
    }

    /// Arc `(u, v)`, creating the `(u, v)`/`(v, u)` pair with zero capacity
    /// if it does not exist yet
    fn ensure_pair(&mut self, u: usize, v: usize) -> usize {
        if let Some(&e) = self.lookup.get(&(u, v)) {
            return e;
        }
        let forward = self.edges.len();
        let reverse = forward + 1;
        self.edges.push(ResidualEdge::new(u, v, reverse));
        self.edges.push(ResidualEdge::new(v, u, forward));
        self.adjacency[u].push(forward);
        self.adjacency[v].push(reverse);
        self.lookup.insert((u, v), forward);
        self.lookup.insert((v, u), reverse);
        forward
    }

    fn add_capacity(&mut self, u: usize, v: usize, capacity: Capacity) -> Result<(), FlowError> {
        let e = self.ensure_pair(u, v);
        self.edges[e].capacity = self.edges[e]
            .capacity
            .checked_add(capacity)
            .ok_or_else(|| FlowError::invalid_input("edge capacities overflow i64"))?;
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of residual arcs (twice the number of arc pairs)
    pub fn arc_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, index: usize) -> &N {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn sink(&self) -> usize {
        self.sink
    }

    /// Finite stand-in for unbounded capacities
    pub fn infinity(&self) -> Capacity {
        self.infinity
    }

    /// Excess at the sink once the engine has run
    pub fn flow_value(&self) -> Flow {
        self.flow_value
    }

    pub(crate) fn set_flow_value(&mut self, value: Flow) {
        self.flow_value = value;
    }

    pub fn edge(&self, index: usize) -> &ResidualEdge {
        &self.edges[index]
    }

    pub fn edges(&self) -> &[ResidualEdge] {
        &self.edges
    }

    /// Outgoing arc indices of `node` in stable insertion order
    pub fn out_arcs(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn arc_between(&self, from: usize, to: usize) -> Option<usize> {
        self.lookup.get(&(from, to)).copied()
    }

    pub fn excess(&self, node: usize) -> Flow {
        self.excess[node]
    }

    /// Flow currently carried by arc `(from, to)`, negative on reverse arcs
    pub fn flow(&self, from: &N, to: &N) -> Option<Flow> {
        let u = self.index_of(from)?;
        let v = self.index_of(to)?;
        self.arc_between(u, v).map(|e| self.edges[e].flow)
    }

    /// `capacity(u, v) + capacity(v, u)` for the pair containing `arc`;
    /// equals `residual(u, v) + residual(v, u)` at every point of a run
    pub fn pair_capacity(&self, arc: usize) -> Capacity {
        let edge = &self.edges[arc];
        edge.capacity + self.edges[edge.reverse_edge_index].capacity
    }

    /// Moves `amount` units along `arc`, updating the pair and both excesses
    pub(crate) fn push(&mut self, arc: usize, amount: Flow) {
        let (from, to, reverse) = {
            let edge = &self.edges[arc];
            (edge.from, edge.to, edge.reverse_edge_index)
        };
        self.edges[arc].flow += amount;
        self.edges[reverse].flow -= amount;
        self.excess[from] -= amount;
        self.excess[to] += amount;
    }

    /// Whether `to` can be reached from `from` using only sentinel arcs
    fn infinite_path_exists(&self, from: usize, to: usize) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back(from);

        while let Some(u) = queue.pop_front() {
            for &e in &self.adjacency[u] {
                let edge = &self.edges[e];
                if edge.capacity >= self.infinity && !seen[edge.to] {
                    if edge.to == to {
                        return true;
                    }
                    seen[edge.to] = true;
                    queue.push_back(edge.to);
                }
            }
        }
        false
    }
}

/// Builds the residual network of `graph` for a flow from `source` to
/// `sink`, initialized to the zero flow.
///
/// # Errors
/// - `InvalidInput` for multigraphs, missing terminals, `source == sink`,
///   negative capacities, or capacity totals that do not fit in an `i64`
/// - `Unbounded` if an infinite-capacity path joins source and sink
pub fn build_residual_network<G, C>(
    graph: &G,
    source: &G::Node,
    sink: &G::Node,
    capacity: &C,
) -> Result<ResidualNetwork<G::Node>, FlowError>
where
    G: FlowGraph,
    C: CapacityAccessor<G::Edge> + ?Sized,
{
    if graph.is_multigraph() {
        return Err(FlowError::invalid_input("MultiGraph and MultiDiGraph not supported"));
    }
    if !graph.contains_node(source) {
        return Err(FlowError::invalid_input(format!("node {:?} not in graph", source)));
    }
    if !graph.contains_node(sink) {
        return Err(FlowError::invalid_input(format!("node {:?} not in graph", sink)));
    }
    if source == sink {
        return Err(FlowError::invalid_input("source and sink are the same node"));
    }

    let nodes: Vec<G::Node> = graph.nodes().cloned().collect();
    let position: HashMap<&G::Node, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

    // Positive-capacity edges, self-loops excluded
    let mut edge_list: Vec<(usize, usize, Option<Capacity>)> = Vec::new();
    for (u, v, attributes) in graph.edges() {
        if u == v {
            continue;
        }
        let declared = capacity.capacity(attributes);
        match declared {
            Some(c) if c < 0 => {
                return Err(FlowError::invalid_input(format!(
                    "edge {:?} -> {:?} has negative capacity {}",
                    u, v, c
                )));
            }
            Some(0) => continue,
            _ => {}
        }
        edge_list.push((position[u], position[v], declared));
    }

    let finite_sum = edge_list
        .iter()
        .filter_map(|&(_, _, c)| c)
        .try_fold(0 as Capacity, |acc, c| acc.checked_add(c))
        .ok_or_else(|| FlowError::invalid_input("edge capacities overflow i64"))?;
    let infinity = match finite_sum.checked_mul(2) {
        Some(0) => 1,
        Some(value) => value,
        None => return Err(FlowError::invalid_input("edge capacities overflow i64")),
    };

    let s = position[source];
    let t = position[sink];

    let mut network = ResidualNetwork::with_nodes(nodes, s, t, infinity);
    let directed = graph.is_directed();
    for (u, v, declared) in edge_list {
        let r = declared.unwrap_or(infinity);
        network.add_capacity(u, v, r)?;
        if !directed {
            network.add_capacity(v, u, r)?;
        }
    }

    // Excess at any node is bounded by the total arc capacity
    network
        .edges
        .iter()
        .try_fold(0 as Capacity, |acc, e| acc.checked_add(e.capacity))
        .ok_or_else(|| FlowError::invalid_input("total residual capacity overflows i64"))?;

    debug!(
        "Residual network built: {} nodes, {} arcs, infinity = {}",
        network.node_count(),
        network.arc_count(),
        infinity
    );

    if network.infinite_path_exists(s, t) {
        return Err(FlowError::Unbounded);
    }

    Ok(network)
}
