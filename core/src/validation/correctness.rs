//! Flow Correctness Verification
//!
//! Certificate checks for a computed maximum flow against its input graph:
//! conservation at every non-terminal node, capacity feasibility on every
//! edge, agreement of source outflow, sink inflow and the reported value,
//! and min-cut duality. Node and edge checks are independent of each other
//! and run in parallel.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;

use rayon::prelude::*;
use thiserror::Error;

use crate::algorithm::graph::max_flow::{FlowResult, MinimumCut};
use crate::algorithm::traits::Flow;
use crate::data_structures::graph::{CapacityAccessor, FlowGraph};

/// Certificate violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Conservation violated at {node}: inflow {inflow}, outflow {outflow}")]
    ConservationViolated { node: String, inflow: Flow, outflow: Flow },

    #[error("Edge {from} -> {to} missing from flow mapping")]
    MissingEdge { from: String, to: String },

    #[error("Edge {from} -> {to} carries flow {flow} outside [0, {capacity}]")]
    CapacityViolated { from: String, to: String, flow: Flow, capacity: Flow },

    #[error("Flow value {reported} disagrees with source outflow {source_net} / sink inflow {sink_net}")]
    ValueMismatch { reported: Flow, source_net: Flow, sink_net: Flow },

    #[error("Cut capacity {cut} differs from flow value {flow}")]
    CutMismatch { cut: Flow, flow: Flow },

    #[error("Unbounded edge {from} -> {to} crosses the cut")]
    UnboundedCutEdge { from: String, to: String },
}

/// Flow certificate validator bound to one input graph
#[derive(Debug)]
pub struct FlowValidator<'a, G, C: ?Sized> {
    graph: &'a G,
    capacity: &'a C,
}

impl<'a, G, C> FlowValidator<'a, G, C>
where
    G: FlowGraph + Sync,
    G::Node: Send + Sync,
    G::Edge: Sync,
    C: CapacityAccessor<G::Edge> + Sync + ?Sized,
{
    pub fn new(graph: &'a G, capacity: &'a C) -> Self {
        Self { graph, capacity }
    }

    /// Conservation, capacity feasibility and value consistency
    pub fn verify(
        &self,
        result: &FlowResult<G::Node>,
        source: &G::Node,
        sink: &G::Node,
    ) -> Result<(), ValidationError> {
        self.verify_capacities(result)?;
        self.verify_conservation(result, source, sink)?;
        self.verify_value(result, source, sink)
    }

    fn flow_on(&self, result: &FlowResult<G::Node>, from: &G::Node, to: &G::Node) -> Result<Flow, ValidationError> {
        result
            .flow_map
            .get(from)
            .and_then(|m| m.get(to))
            .copied()
            .ok_or_else(|| ValidationError::MissingEdge {
                from: format!("{:?}", from),
                to: format!("{:?}", to),
            })
    }

    /// `0 <= flow <= capacity` on every edge, in each direction the edge
    /// can carry flow
    pub fn verify_capacities(&self, result: &FlowResult<G::Node>) -> Result<(), ValidationError> {
        let edges: Vec<_> = self.graph.edges().collect();
        let directed = self.graph.is_directed();

        edges.par_iter().try_for_each(|&(u, v, attributes)| {
            let limit = self.capacity.capacity(attributes);
            let mut directions = vec![(u, v)];
            if !directed && u != v {
                directions.push((v, u));
            }
            for (from, to) in directions {
                let flow = self.flow_on(result, from, to)?;
                let within = flow >= 0 && limit.map_or(true, |c| flow <= c.max(0));
                let self_loop_ok = from != to || flow == 0;
                if !within || !self_loop_ok {
                    return Err(ValidationError::CapacityViolated {
                        from: format!("{:?}", from),
                        to: format!("{:?}", to),
                        flow,
                        capacity: limit.unwrap_or(Flow::MAX),
                    });
                }
            }
            Ok(())
        })
    }

    fn inflows(&self, result: &FlowResult<G::Node>) -> HashMap<G::Node, Flow> {
        let mut inflow: HashMap<G::Node, Flow> = HashMap::new();
        for targets in result.flow_map.values() {
            for (v, &f) in targets {
                *inflow.entry(v.clone()).or_insert(0) += f;
            }
        }
        inflow
    }

    fn outflow(result: &FlowResult<G::Node>, node: &G::Node) -> Flow {
        result.flow_map.get(node).map_or(0, |m| m.values().sum())
    }

    /// Inflow equals outflow at every node but the terminals
    pub fn verify_conservation(
        &self,
        result: &FlowResult<G::Node>,
        source: &G::Node,
        sink: &G::Node,
    ) -> Result<(), ValidationError> {
        let inflow = self.inflows(result);
        let nodes: Vec<&G::Node> = self
            .graph
            .nodes()
            .filter(|&n| n != source && n != sink)
            .collect();

        nodes.par_iter().try_for_each(|&node| {
            let incoming = inflow.get(node).copied().unwrap_or(0);
            let outgoing = Self::outflow(result, node);
            if incoming == outgoing {
                Ok(())
            } else {
                Err(ValidationError::ConservationViolated {
                    node: format!("{:?}", node),
                    inflow: incoming,
                    outflow: outgoing,
                })
            }
        })
    }

    /// Net source outflow, net sink inflow and the reported value agree
    pub fn verify_value(
        &self,
        result: &FlowResult<G::Node>,
        source: &G::Node,
        sink: &G::Node,
    ) -> Result<(), ValidationError> {
        let inflow = self.inflows(result);
        let source_net = Self::outflow(result, source) - inflow.get(source).copied().unwrap_or(0);
        let sink_net = inflow.get(sink).copied().unwrap_or(0) - Self::outflow(result, sink);
        if source_net == result.flow_value && sink_net == result.flow_value {
            Ok(())
        } else {
            Err(ValidationError::ValueMismatch {
                reported: result.flow_value,
                source_net,
                sink_net,
            })
        }
    }

    /// Capacity of original edges crossing from the source side to the sink
    /// side equals the flow value
    pub fn verify_cut(
        &self,
        result: &FlowResult<G::Node>,
        cut: &MinimumCut<G::Node>,
    ) -> Result<(), ValidationError> {
        let directed = self.graph.is_directed();
        let mut crossing: Flow = 0;
        for (u, v, attributes) in self.graph.edges() {
            let forward = cut.source_side.contains(u) && cut.sink_side.contains(v);
            let backward = !directed && cut.source_side.contains(v) && cut.sink_side.contains(u);
            if !(forward || backward) {
                continue;
            }
            match self.capacity.capacity(attributes) {
                Some(c) if c > 0 => crossing += c,
                Some(_) => {}
                None => {
                    return Err(ValidationError::UnboundedCutEdge {
                        from: format!("{:?}", u),
                        to: format!("{:?}", v),
                    })
                }
            }
        }

        if crossing == result.flow_value && cut.value == result.flow_value {
            Ok(())
        } else {
            Err(ValidationError::CutMismatch {
                cut: crossing,
                flow: result.flow_value,
            })
        }
    }
}
