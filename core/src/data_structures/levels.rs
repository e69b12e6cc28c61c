//! Height-indexed buckets of active and inactive nodes
//!
//! Each level keeps two dense node lists. A slot per node records which
//! level and list it sits in and its position there, so insertion, removal
//! and activation are O(1) via swap-remove.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use crate::algorithm::traits::Height;

/// List a node belongs to within its level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    level: Height,
    membership: Membership,
    position: usize,
}

#[derive(Debug, Clone, Default)]
struct Level {
    active: Vec<usize>,
    inactive: Vec<usize>,
}

impl Level {
    fn list(&self, membership: Membership) -> &Vec<usize> {
        match membership {
            Membership::Active => &self.active,
            Membership::Inactive => &self.inactive,
        }
    }

    fn list_mut(&mut self, membership: Membership) -> &mut Vec<usize> {
        match membership {
            Membership::Active => &mut self.active,
            Membership::Inactive => &mut self.inactive,
        }
    }
}

/// Level buckets over dense node indices
#[derive(Debug, Clone)]
pub struct LevelBuckets {
    levels: Vec<Level>,
    slots: Vec<Option<Slot>>,
}

impl LevelBuckets {
    pub fn new(level_count: usize, node_count: usize) -> Self {
        Self {
            levels: vec![Level::default(); level_count],
            slots: vec![None; node_count],
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.slots[node].is_some()
    }

    pub fn level_of(&self, node: usize) -> Option<Height> {
        self.slots[node].map(|slot| slot.level)
    }

    pub fn membership(&self, node: usize) -> Option<Membership> {
        self.slots[node].map(|slot| slot.membership)
    }

    pub fn is_inactive(&self, node: usize) -> bool {
        self.membership(node) == Some(Membership::Inactive)
    }

    /// Places a node that is in no bucket yet
    pub fn insert(&mut self, node: usize, level: Height, membership: Membership) {
        debug_assert!(self.slots[node].is_none(), "node {} already bucketed", node);
        let list = self.levels[level].list_mut(membership);
        let position = list.len();
        list.push(node);
        self.slots[node] = Some(Slot { level, membership, position });
    }

    /// Takes a node out of its bucket
    pub fn remove(&mut self, node: usize) -> Option<(Height, Membership)> {
        let slot = self.slots[node].take()?;
        let list = self.levels[slot.level].list_mut(slot.membership);
        list.swap_remove(slot.position);
        if let Some(&moved) = list.get(slot.position) {
            if let Some(moved_slot) = self.slots[moved].as_mut() {
                moved_slot.position = slot.position;
            }
        }
        Some((slot.level, slot.membership))
    }

    /// Moves an inactive node to the active list of its level
    pub fn activate(&mut self, node: usize) -> bool {
        match self.slots[node] {
            Some(slot) if slot.membership == Membership::Inactive => {
                self.remove(node);
                self.insert(node, slot.level, Membership::Active);
                true
            }
            _ => false,
        }
    }

    /// Moves a node to another level, keeping its membership
    pub fn relocate(&mut self, node: usize, level: Height) {
        if let Some((_, membership)) = self.remove(node) {
            self.insert(node, level, membership);
        }
    }

    pub fn has_active(&self, level: Height) -> bool {
        !self.levels[level].active.is_empty()
    }

    pub fn is_empty(&self, level: Height) -> bool {
        let bucket = &self.levels[level];
        bucket.active.is_empty() && bucket.inactive.is_empty()
    }

    /// Any active node of `level`
    pub fn pick_active(&self, level: Height) -> Option<usize> {
        self.levels[level].active.last().copied()
    }

    pub fn nodes_at(&self, level: Height, membership: Membership) -> &[usize] {
        self.levels[level].list(membership)
    }

    /// Empties `level`, returning its nodes with their membership
    pub fn drain(&mut self, level: Height) -> Vec<(usize, Membership)> {
        let bucket = std::mem::take(&mut self.levels[level]);
        let mut drained = Vec::with_capacity(bucket.active.len() + bucket.inactive.len());
        for node in bucket.active {
            self.slots[node] = None;
            drained.push((node, Membership::Active));
        }
        for node in bucket.inactive {
            self.slots[node] = None;
            drained.push((node, Membership::Inactive));
        }
        drained
    }
}
