//! Resumable circular cursor over a node's outgoing arcs
//!
//! The cursor stores only a position into the node's arc list, which is
//! owned by the residual network and never reordered during a run. Callers
//! pass the list in when they need the arc itself, so the cursor and the
//! collection it scans are never aliased mutably.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

/// Outcome of advancing a cursor
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStep {
    /// Moved to the next arc
    Moved,
    /// Ran off the end and rewound to the first arc
    Wrapped,
}

/// Per-node current-arc cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentArc {
    position: usize,
    len: usize,
}

impl CurrentArc {
    /// Cursor over an arc list of `len` entries, positioned at the first arc
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Arc under the cursor; `None` only for nodes without outgoing arcs
    pub fn current<T: Copy>(&self, arcs: &[T]) -> Option<T> {
        debug_assert_eq!(arcs.len(), self.len);
        arcs.get(self.position).copied()
    }

    /// Moves to the next arc, rewinding on wraparound
    pub fn advance(&mut self) -> CursorStep {
        self.position += 1;
        if self.position >= self.len {
            self.rewind();
            CursorStep::Wrapped
        } else {
            CursorStep::Moved
        }
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Every arc exactly once, starting at the cursor, without moving it
    pub fn snapshot<'a, T>(&self, arcs: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        debug_assert_eq!(arcs.len(), self.len);
        let split = self.position.min(arcs.len());
        let (head, tail) = arcs.split_at(split);
        tail.iter().chain(head.iter())
    }
}
