//! Work budget gating the global relabeling heuristic
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

/// Accumulated discharge work measured against `(n + m) / freq`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRelabelBudget {
    /// `n + m`
    scale: u64,
    /// Frequency divisor; 0 disables global relabeling
    freq: u64,
    work: u64,
}

impl GlobalRelabelBudget {
    pub fn new(node_count: usize, arc_count: usize, freq: usize) -> Self {
        Self {
            scale: (node_count + arc_count) as u64,
            freq: freq as u64,
            work: 0,
        }
    }

    pub fn record(&mut self, work: usize) {
        self.work = self.work.saturating_add(work as u64);
    }

    /// `work >= (n + m) / freq`, compared without division
    pub fn reached(&self) -> bool {
        self.freq != 0 && self.work.saturating_mul(self.freq) >= self.scale
    }

    pub fn reset(&mut self) {
        self.work = 0;
    }

    pub fn work(&self) -> u64 {
        self.work
    }
}
