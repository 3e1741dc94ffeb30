//! Core node/type/level/span data model (§3).
//!
//! Node identifiers are dense positive integers in `[1, maxNode]`;
//! slots occupy `[1, maxSlot]` and non-slot nodes occupy
//! `(maxSlot, maxNode]`, partitioned into contiguous per-type ranges
//! that are monotone in level.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A node identifier. Dense, `1`-based; `0` is never a valid node.
pub type NodeId = u32;

/// A non-slot type's contiguous id range `[first, last]` (inclusive)
/// together with its level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRange {
    pub otype: String,
    pub first: NodeId,
    pub last: NodeId,
    pub level: u32,
}

impl TypeRange {
    pub fn contains(&self, n: NodeId) -> bool {
        n >= self.first && n <= self.last
    }
}

/// The reserved type name shared by every slot.
pub const SLOT_TYPE: &str = "slot";

/// Per-node type lookup plus per-type level, built once at compile
/// time and stored in the manifest (the ranges are small — one entry
/// per non-slot type, not per node).
#[derive(Debug, Clone)]
pub struct TypeTable {
    pub max_slot: NodeId,
    pub max_node: NodeId,
    /// Non-slot type ranges, sorted ascending by `first` (and hence,
    /// by the monotone-range invariant, by level).
    pub ranges: Vec<TypeRange>,
}

impl TypeTable {
    /// The type name for node `n`, or `None` if `n` is out of range.
    pub fn otype(&self, n: NodeId) -> Option<&str> {
        if n == 0 || n > self.max_node {
            return None;
        }
        if n <= self.max_slot {
            return Some(SLOT_TYPE);
        }
        self.ranges
            .iter()
            .find(|r| r.contains(n))
            .map(|r| r.otype.as_str())
    }

    /// The level of node `n`. Slots sit at level `0`, the bottom of
    /// the containment hierarchy (§3); non-slot levels start at `1`
    /// and grow with average span, so "up" is always `level + 1` and
    /// "down" is always `level - 1`, for slots and non-slot types
    /// alike.
    pub fn level(&self, n: NodeId) -> Option<u32> {
        if n == 0 || n > self.max_node {
            return None;
        }
        if n <= self.max_slot {
            return Some(self.slot_level());
        }
        self.ranges.iter().find(|r| r.contains(n)).map(|r| r.level)
    }

    /// The level reserved for slots: always `0`, one below the
    /// smallest-span non-slot type.
    pub fn slot_level(&self) -> u32 {
        0
    }

    pub fn range_of(&self, otype: &str) -> Option<&TypeRange> {
        self.ranges.iter().find(|r| r.otype == otype)
    }

    pub fn level_of_type(&self, otype: &str) -> Option<u32> {
        if otype == SLOT_TYPE {
            Some(self.slot_level())
        } else {
            self.range_of(otype).map(|r| r.level)
        }
    }

    /// All non-slot types at exactly `level`, in the order they occur
    /// in `ranges` (i.e. by ascending id range).
    pub fn types_at_level(&self, level: u32) -> Vec<&str> {
        self.ranges
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.otype.as_str())
            .collect()
    }
}

/// Levels are computed from average slot-span size: bigger average
/// span implies a higher (more inclusive) level. Ties are broken
/// deterministically by type name (§3).
pub fn compute_levels(avg_span_by_type: &HashMap<String, f64>) -> Vec<(String, u32)> {
    let mut entries: Vec<(&String, &f64)> = avg_span_by_type.iter().collect();
    // Ascending avg span -> ascending level; ties broken by type name so
    // the assignment is deterministic regardless of hash-map iteration
    // order.
    entries.sort_by(|a, b| {
        a.1.partial_cmp(b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (otype, _))| (otype.clone(), (i + 1) as u32))
        .collect()
}

/// Per-node `(minSlot, maxSlot)` span table (§3). Slots are their own
/// span; non-slot spans are computed at compile time from their slot
/// set and stored densely, one entry per node.
#[derive(Debug, Clone)]
pub struct SpanTable {
    /// `min_slot[n - 1]` is `minSlot(n)` for `n` in `[1, max_node]`.
    pub min_slot: Vec<NodeId>,
    pub max_slot: Vec<NodeId>,
}

impl SpanTable {
    /// Persists `min_slot`/`max_slot` as a pair of plain integer
    /// columns, picking one dtype wide enough for both (they share
    /// the same value range, `[1, maxSlot]`).
    pub fn save(
        &self,
        dir: &std::path::Path,
        min_path: &std::path::Path,
        max_path: &std::path::Path,
    ) -> crate::error::Result<crate::dtype::IntDtype> {
        use crate::column::IntColumn;
        let max_node = self.min_slot.len() as NodeId;
        let min_pairs: Vec<(NodeId, i64)> = (1..=max_node)
            .map(|n| (n, i64::from(self.min_slot[(n - 1) as usize])))
            .collect();
        let max_pairs: Vec<(NodeId, i64)> = (1..=max_node)
            .map(|n| (n, i64::from(self.max_slot[(n - 1) as usize])))
            .collect();
        let min_col = IntColumn::build(max_node, &min_pairs);
        let max_col = IntColumn::build(max_node, &max_pairs);
        let dtype = min_col.dtype().max(max_col.dtype());
        min_col.save(dir, min_path)?;
        max_col.save(dir, max_path)?;
        Ok(dtype)
    }

    pub fn load(
        min_path: &std::path::Path,
        max_path: &std::path::Path,
        max_node: NodeId,
        dtype: crate::dtype::IntDtype,
    ) -> crate::error::Result<SpanTable> {
        use crate::column::IntColumn;
        let min_col = IntColumn::load(min_path, max_node, dtype)?;
        let max_col = IntColumn::load(max_path, max_node, dtype)?;
        let min_slot = (1..=max_node)
            .map(|n| min_col.get(n).unwrap_or(0) as NodeId)
            .collect();
        let max_slot = (1..=max_node)
            .map(|n| max_col.get(n).unwrap_or(0) as NodeId)
            .collect();
        Ok(SpanTable { min_slot, max_slot })
    }

    /// Builds the span table from each node's sorted slot set
    /// (`node_slots[n - 1]`; a slot's own set is `[n]`), the same
    /// input `embed::build_lev_up_down` consumes.
    pub fn build(node_slots: &[Vec<NodeId>]) -> SpanTable {
        let mut min_slot = Vec::with_capacity(node_slots.len());
        let mut max_slot = Vec::with_capacity(node_slots.len());
        for slots in node_slots {
            min_slot.push(slots[0]);
            max_slot.push(slots[slots.len() - 1]);
        }
        SpanTable { min_slot, max_slot }
    }

    pub fn get(&self, n: NodeId) -> Option<(NodeId, NodeId)> {
        if n == 0 {
            return None;
        }
        let i = (n - 1) as usize;
        let lo = *self.min_slot.get(i)?;
        let hi = *self.max_slot.get(i)?;
        Some((lo, hi))
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
