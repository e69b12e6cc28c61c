//! Attributed graph storage consumed by the flow core
//!
//! The flow algorithms only see graphs through the [`FlowGraph`] trait:
//! node iteration, per-node outgoing edge iteration with attributes, and
//! directed/multigraph classification. [`Graph`] is the in-crate
//! implementation, an insertion-ordered adjacency list whose edges carry a
//! string-keyed attribute map.
//!
//! Capacities are read through a [`CapacityAccessor`], so the attribute name
//! (or any other derivation of a capacity from an edge payload) is a
//! parameter of the computation rather than a property of the graph.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Serialize, Deserialize};

use crate::algorithm::traits::Capacity;

/// Read-only graph view required by the residual network builder
pub trait FlowGraph {
    /// Opaque node identity
    type Node: Clone + Eq + Hash + Debug;
    /// Edge payload handed to the capacity accessor
    type Edge;

    fn is_directed(&self) -> bool;

    fn is_multigraph(&self) -> bool;

    fn contains_node(&self, node: &Self::Node) -> bool;

    fn node_count(&self) -> usize;

    /// Nodes in insertion order
    fn nodes(&self) -> Box<dyn Iterator<Item = &Self::Node> + '_>;

    /// Every edge exactly once, oriented as inserted
    fn edges(&self) -> Box<dyn Iterator<Item = (&Self::Node, &Self::Node, &Self::Edge)> + '_>;

    /// Outgoing edges of `node`. For undirected graphs this is every
    /// incident edge, seen from `node`'s side.
    fn out_edges<'a>(
        &'a self,
        node: &Self::Node,
    ) -> Box<dyn Iterator<Item = (&'a Self::Node, &'a Self::Edge)> + 'a>;
}

/// Extracts an edge capacity; `None` means the edge is unbounded
pub trait CapacityAccessor<E: ?Sized> {
    fn capacity(&self, edge: &E) -> Option<Capacity>;
}

impl<E: ?Sized, F> CapacityAccessor<E> for F
where
    F: Fn(&E) -> Option<Capacity>,
{
    fn capacity(&self, edge: &E) -> Option<Capacity> {
        self(edge)
    }
}

/// Capacity lookup by attribute name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeKey(pub String);

impl AttributeKey {
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AttributeKey {
    fn default() -> Self {
        Self::new("capacity")
    }
}

impl CapacityAccessor<EdgeAttributes> for AttributeKey {
    fn capacity(&self, edge: &EdgeAttributes) -> Option<Capacity> {
        edge.get(&self.0)
    }
}

/// String-keyed numeric edge attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    values: HashMap<String, Capacity>,
}

impl EdgeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes holding a single `"capacity"` entry
    pub fn with_capacity(capacity: Capacity) -> Self {
        Self::new().with("capacity", capacity)
    }

    pub fn with(mut self, key: &str, value: Capacity) -> Self {
        self.values.insert(key.to_owned(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<Capacity> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: &str, value: Capacity) {
        self.values.insert(key.to_owned(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Graph mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Duplicate edge: {0} -> {1}")]
    DuplicateEdge(String, String),
}

#[derive(Debug, Clone)]
struct EdgeRecord {
    source: usize,
    target: usize,
    attributes: EdgeAttributes,
}

/// Insertion-ordered attributed graph
#[derive(Debug, Clone)]
pub struct Graph<N> {
    directed: bool,
    multigraph: bool,
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    /// Per node: (neighbor index, edge index) in insertion order
    adjacency: Vec<Vec<(usize, usize)>>,
    edges: Vec<EdgeRecord>,
    /// Simple graphs only: canonical endpoint pair to edge index
    lookup: HashMap<(usize, usize), usize>,
}

impl<N: Clone + Eq + Hash + Debug> Graph<N> {
    fn with_kind(directed: bool, multigraph: bool) -> Self {
        Self {
            directed,
            multigraph,
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
            edges: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Simple directed graph
    pub fn directed() -> Self {
        Self::with_kind(true, false)
    }

    /// Simple undirected graph
    pub fn undirected() -> Self {
        Self::with_kind(false, false)
    }

    /// Directed graph allowing parallel edges
    pub fn multi_directed() -> Self {
        Self::with_kind(true, true)
    }

    /// Undirected graph allowing parallel edges
    pub fn multi_undirected() -> Self {
        Self::with_kind(false, true)
    }

    /// Adds a node; returns `false` if it was already present
    pub fn add_node(&mut self, node: N) -> bool {
        if self.index.contains_key(&node) {
            return false;
        }
        self.intern(node);
        true
    }

    fn intern(&mut self, node: N) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.clone(), i);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        i
    }

    fn canonical(&self, u: usize, v: usize) -> (usize, usize) {
        if self.directed || u <= v {
            (u, v)
        } else {
            (v, u)
        }
    }

    /// Adds an edge, inserting missing endpoints
    pub fn add_edge(&mut self, source: N, target: N, attributes: EdgeAttributes) -> Result<(), GraphError> {
        let u = self.intern(source);
        let v = self.intern(target);
        let key = self.canonical(u, v);

        if !self.multigraph && self.lookup.contains_key(&key) {
            return Err(GraphError::DuplicateEdge(
                format!("{:?}", self.nodes[u]),
                format!("{:?}", self.nodes[v]),
            ));
        }

        let edge_id = self.edges.len();
        self.edges.push(EdgeRecord { source: u, target: v, attributes });
        if !self.multigraph {
            self.lookup.insert(key, edge_id);
        }

        self.adjacency[u].push((v, edge_id));
        if !self.directed && u != v {
            self.adjacency[v].push((u, edge_id));
        }
        Ok(())
    }

    /// Adds an edge with a `"capacity"` attribute
    pub fn add_edge_with_capacity(&mut self, source: N, target: N, capacity: Capacity) -> Result<(), GraphError> {
        self.add_edge(source, target, EdgeAttributes::with_capacity(capacity))
    }

    /// Adds an edge with no attributes (unbounded under any key)
    pub fn add_unbounded_edge(&mut self, source: N, target: N) -> Result<(), GraphError> {
        self.add_edge(source, target, EdgeAttributes::new())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, source: &N, target: &N) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&u), Some(&v)) => self.adjacency[u].iter().any(|&(w, _)| w == v),
            _ => false,
        }
    }

    /// Attributes of the first edge between `source` and `target`
    pub fn edge_attributes(&self, source: &N, target: &N) -> Option<&EdgeAttributes> {
        let u = *self.index.get(source)?;
        let v = *self.index.get(target)?;
        self.adjacency[u]
            .iter()
            .find(|&&(w, _)| w == v)
            .map(|&(_, e)| &self.edges[e].attributes)
    }
}

impl<N: Clone + Eq + Hash + Debug> FlowGraph for Graph<N> {
    type Node = N;
    type Edge = EdgeAttributes;

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn is_multigraph(&self) -> bool {
        self.multigraph
    }

    fn contains_node(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &N> + '_> {
        Box::new(self.nodes.iter())
    }

    fn edges(&self) -> Box<dyn Iterator<Item = (&N, &N, &EdgeAttributes)> + '_> {
        Box::new(
            self.edges
                .iter()
                .map(move |e| (&self.nodes[e.source], &self.nodes[e.target], &e.attributes)),
        )
    }

    fn out_edges<'a>(&'a self, node: &N) -> Box<dyn Iterator<Item = (&'a N, &'a EdgeAttributes)> + 'a> {
        match self.index.get(node) {
            Some(&u) => Box::new(
                self.adjacency[u]
                    .iter()
                    .map(move |&(v, e)| (&self.nodes[v], &self.edges[e].attributes)),
            ),
            None => Box::new(std::iter::empty()),
        }
    }
}
