//! CHRONOS Flow Core
//!
//! Residual networks and maximum flow computation for the CHRONOS graph
//! algorithm library. Given a graph with edge capacities, a source and a
//! sink, the core computes a maximum feasible flow with highest-label
//! preflow-push (or proves the flow unbounded) and exposes it as a per-edge
//! mapping for callers such as minimum cuts, matching reductions and
//! connectivity bounds.
//!
//! # Architecture
//!
//! ```text
//! input graph ──▶ residual network builder ──▶ preflow-push engine ──▶ flow extractor
//!  (FlowGraph)     (data_structures::residual)   (algorithm::graph)      (FlowMap)
//! ```
//!
//! - [`data_structures`] - graph view, residual network, current-arc
//!   cursors, level buckets
//! - [`algorithm`] - error taxonomy, relabel budget, preflow-push engine,
//!   public max-flow API
//! - [`validation`] - flow certificate checks
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod data_structures;
pub mod validation;

pub use algorithm::graph::max_flow::{
    build_flow_map, compute_max_flow, maximum_flow_value, minimum_cut, preflow_push, FlowMap,
    FlowResult, MaxFlowSolver, MinimumCut, PreflowPushConfig,
};
pub use algorithm::traits::{Capacity, Flow, FlowError, FlowMetrics};
pub use data_structures::graph::{AttributeKey, CapacityAccessor, EdgeAttributes, FlowGraph, Graph};
pub use data_structures::residual::{build_residual_network, ResidualNetwork};
