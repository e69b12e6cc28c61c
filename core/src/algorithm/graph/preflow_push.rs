//! Highest-label preflow-push engine
//!
//! Goldberg-Tarjan push-relabel over a [`ResidualNetwork`], with the
//! current-arc data structure, level-bucketed highest-label selection, the
//! global relabeling heuristic gated by a work budget, and the gap
//! heuristic.
//!
//! # Phases
//! 1. Push as much flow as possible towards the sink. Nodes whose height
//!    reaches `n - 1` are known to lie on the source side of a minimum cut
//!    and are parked until phase 2. The sink excess is the maximum flow
//!    value once no active node remains below `n`.
//! 2. Return the remaining excess to the source, turning the maximum
//!    preflow into a maximum flow that satisfies conservation everywhere but
//!    at the terminals.
//!
//! # Height Function
//! The source is fixed at `n` and the sink at 0. Every residual arc `(u, v)`
//! satisfies `height(u) <= height(v) + 1`, so a node at height `n + 1` or
//! above cannot reach the sink.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

use log::{debug, trace};

use crate::algorithm::graph::relabel_budget::GlobalRelabelBudget;
use crate::algorithm::traits::{FlowError, FlowMetrics, Height};
use crate::data_structures::current_arc::{CurrentArc, CursorStep};
use crate::data_structures::levels::{LevelBuckets, Membership};
use crate::data_structures::residual::ResidualNetwork;

/// Per-call engine state; nothing here outlives one run
#[derive(Debug)]
pub struct PreflowPush<'a, N> {
    network: &'a mut ResidualNetwork<N>,
    heights: Vec<Height>,
    cursors: Vec<CurrentArc>,
    levels: LevelBuckets,
    budget: GlobalRelabelBudget,
    metrics: FlowMetrics,
    n: usize,
    source: usize,
    sink: usize,
}

impl<'a, N: Clone + Eq + Hash + Debug> PreflowPush<'a, N> {
    pub fn new(network: &'a mut ResidualNetwork<N>, global_relabel_freq: usize) -> Self {
        let n = network.node_count();
        let cursors = (0..n).map(|u| CurrentArc::new(network.out_arcs(u).len())).collect();
        let budget = GlobalRelabelBudget::new(n, network.arc_count(), global_relabel_freq);
        let source = network.source();
        let sink = network.sink();
        Self {
            network,
            heights: vec![0; n],
            cursors,
            levels: LevelBuckets::new(2 * n, n),
            budget,
            metrics: FlowMetrics::default(),
            n,
            source,
            sink,
        }
    }

    pub fn metrics(&self) -> &FlowMetrics {
        &self.metrics
    }

    /// Runs both phases (or only the first with `value_only`) and records
    /// the sink excess as the network's flow value.
    pub fn run(mut self, value_only: bool) -> Result<FlowMetrics, FlowError> {
        let started = Instant::now();

        let distances = self.reverse_bfs(self.sink);
        if distances[self.source].is_none() {
            // The sink is unreachable; the maximum flow is zero.
            debug!("Sink unreachable from source, flow value 0");
            self.network.set_flow_value(0);
            return Ok(self.finish(started));
        }

        let max_height = self.initialize(&distances)?;
        self.phase_one(max_height)?;
        let value = self.network.excess(self.sink);
        debug!("Maximum preflow found, value {}", value);

        if !value_only {
            self.phase_two()?;
            debug!("Excess returned to source, flow value {}", self.network.excess(self.sink));
        }

        self.network.set_flow_value(self.network.excess(self.sink));
        Ok(self.finish(started))
    }

    fn finish(&mut self, started: Instant) -> FlowMetrics {
        self.metrics.execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.clone()
    }

    /// Exact-label initialization followed by saturation of the source arcs.
    /// Returns the highest label below `n`.
    fn initialize(&mut self, distances: &[Option<Height>]) -> Result<Height, FlowError> {
        let n = self.n;
        let mut max_height = 0;
        for u in 0..n {
            self.heights[u] = match distances[u] {
                Some(d) => {
                    if u != self.source {
                        max_height = max_height.max(d);
                    }
                    d
                }
                None => n + 1,
            };
        }
        self.heights[self.source] = n;

        for i in 0..self.network.out_arcs(self.source).len() {
            let arc = self.network.out_arcs(self.source)[i];
            let capacity = self.network.edge(arc).capacity;
            if capacity > 0 {
                self.network.push(arc, capacity);
                self.metrics.push_operations += 1;
            }
        }

        for u in 0..n {
            if u == self.source || u == self.sink {
                continue;
            }
            let height = self.checked_level(self.heights[u])?;
            let membership = if self.network.excess(u) > 0 {
                Membership::Active
            } else {
                Membership::Inactive
            };
            self.levels.insert(u, height, membership);
        }
        Ok(max_height)
    }

    fn phase_one(&mut self, mut max_height: Height) -> Result<(), FlowError> {
        let mut height = max_height;
        while height > 0 {
            // Discharge the active nodes of the current level, then move down.
            let u = match self.levels.pick_active(height) {
                Some(u) => u,
                None => {
                    height -= 1;
                    continue;
                }
            };
            let old_height = height;
            height = self.discharge(u, true)?;

            if self.budget.reached() {
                height = self.global_relabel(true)?;
                max_height = height;
                self.budget.reset();
            } else if self.levels.is_empty(old_height) {
                // Nothing above the gap can reach the sink any more.
                self.gap_heuristic(old_height, max_height)?;
                height = old_height - 1;
                max_height = height;
            } else {
                max_height = max_height.max(height);
            }
        }
        Ok(())
    }

    fn phase_two(&mut self) -> Result<(), FlowError> {
        let mut height = self.global_relabel(false)?;
        self.budget.reset();

        while height > self.n {
            let u = match self.levels.pick_active(height) {
                Some(u) => u,
                None => {
                    height -= 1;
                    continue;
                }
            };
            height = self.discharge(u, false)?;

            if self.budget.reached() {
                height = self.global_relabel(false)?;
                self.budget.reset();
            }
        }
        Ok(())
    }

    fn activate(&mut self, v: usize) {
        if v != self.source && v != self.sink {
            self.levels.activate(v);
        }
    }

    /// Pushes along admissible arcs under the current-arc cursor, relabeling
    /// on every wraparound, until `u` runs dry (or, in phase 1, is parked).
    /// Returns the next level the caller should examine.
    fn discharge(&mut self, u: usize, is_phase_one: bool) -> Result<Height, FlowError> {
        let mut height = self.heights[u];
        // The first relabel after a global relabel may not raise the node,
        // since cursors are not rewound; examine the same level again.
        let mut next_height = height;
        self.levels.remove(u);

        loop {
            let arc = self.cursors[u]
                .current(self.network.out_arcs(u))
                .ok_or_else(|| {
                    FlowError::invariant(format!(
                        "active node {:?} has no outgoing arcs",
                        self.network.node(u)
                    ))
                })?;
            let (v, residual) = {
                let edge = self.network.edge(arc);
                (edge.to, edge.residual_capacity())
            };

            if residual > 0 && height == self.heights[v] + 1 {
                let amount = self.network.excess(u).min(residual);
                self.network.push(arc, amount);
                self.metrics.push_operations += 1;
                self.activate(v);
                if self.network.excess(u) == 0 {
                    let level = self.checked_level(height)?;
                    self.levels.insert(u, level, Membership::Inactive);
                    break;
                }
            }

            if self.cursors[u].advance() == CursorStep::Wrapped {
                height = self.relabel(u)?;
                self.heights[u] = height;
                if is_phase_one && height >= self.n - 1 {
                    // On the source side of the minimum cut; wait for phase 2.
                    let level = self.checked_level(height)?;
                    self.levels.insert(u, level, Membership::Active);
                    break;
                }
                next_height = height;
            }
        }

        self.heights[u] = height;
        Ok(next_height)
    }

    /// `1 + min(height(v))` over residual arcs `(u, v)`
    fn relabel(&mut self, u: usize) -> Result<Height, FlowError> {
        let arcs = self.network.out_arcs(u);
        self.budget.record(arcs.len());
        self.metrics.relabel_operations += 1;

        let network = &*self.network;
        let heights = &self.heights;
        self.cursors[u]
            .snapshot(arcs)
            .map(|&arc| network.edge(arc))
            .filter(|edge| edge.residual_capacity() > 0)
            .map(|edge| heights[edge.to])
            .min()
            .map(|h| h + 1)
            .ok_or_else(|| {
                FlowError::invariant(format!(
                    "node {:?} holds excess {} but has no residual arc",
                    network.node(u),
                    network.excess(u)
                ))
            })
    }

    /// Moves every node at levels `gap + 1 ..= max_height` to `n + 1`
    fn gap_heuristic(&mut self, gap: Height, max_height: Height) -> Result<(), FlowError> {
        let target = self.checked_level(self.n + 1)?;
        let mut moved = 0;
        for level in (gap + 1)..=max_height {
            for (u, membership) in self.levels.drain(level) {
                self.heights[u] = target;
                self.levels.insert(u, target, membership);
                moved += 1;
            }
        }
        self.metrics.gap_relabels += 1;
        trace!("Gap at level {}: {} nodes lifted to {}", gap, moved, target);
        Ok(())
    }

    /// Recomputes exact heights by reverse BFS from the sink (phase 1) or
    /// the source (phase 2). Returns the highest label assigned.
    fn global_relabel(&mut self, from_sink: bool) -> Result<Height, FlowError> {
        let n = self.n;
        let root = if from_sink { self.sink } else { self.source };
        let distances = self.reverse_bfs(root);
        self.metrics.global_relabels += 1;

        let mut max_height = 0;
        for (u, distance) in distances.iter().enumerate() {
            if u == self.sink && !from_sink {
                continue;
            }
            if let Some(d) = distance {
                max_height = max_height.max(*d);
            }
        }
        if !from_sink {
            max_height += n;
        }

        let mut relabeled = 0;
        for u in 0..n {
            if u == self.source || u == self.sink {
                continue;
            }
            let new_height = match distances[u] {
                Some(d) if from_sink => d,
                Some(d) => d + n,
                // Cut off from the sink; same effect as a gap.
                None if from_sink && self.heights[u] < n => n + 1,
                None => continue,
            };
            if new_height != self.heights[u] {
                let level = self.checked_level(new_height)?;
                self.levels.relocate(u, level);
                self.heights[u] = new_height;
                relabeled += 1;
            }
        }
        trace!(
            "Global relabel from {}: {} nodes relabeled, max height {}",
            if from_sink { "sink" } else { "source" },
            relabeled,
            max_height
        );
        Ok(max_height)
    }

    /// BFS distances to `root` over residual-capacity-positive arcs
    fn reverse_bfs(&self, root: usize) -> Vec<Option<Height>> {
        let mut distances = vec![None; self.n];
        let mut queue = VecDeque::new();
        distances[root] = Some(0);
        queue.push_back((root, 0));

        while let Some((u, height)) = queue.pop_front() {
            let next = height + 1;
            for &arc in self.network.out_arcs(u) {
                // The pair of (u, v) is (v, u), an arc into u.
                let reverse = self.network.edge(self.network.edge(arc).reverse_edge_index);
                if distances[reverse.from].is_none() && reverse.residual_capacity() > 0 {
                    distances[reverse.from] = Some(next);
                    queue.push_back((reverse.from, next));
                }
            }
        }
        distances
    }

    fn checked_level(&self, height: Height) -> Result<Height, FlowError> {
        if height < self.levels.level_count() {
            Ok(height)
        } else {
            Err(FlowError::invariant(format!(
                "height {} exceeds level table of size {}",
                height,
                self.levels.level_count()
            )))
        }
    }
}
