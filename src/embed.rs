//! The embedding index (§4.4): `levUp`/`levDown`, the two CSR
//! structures that make containment navigation `O(k)` instead of a
//! slot-set scan.
//!
//! `levUp(n)` is the minimal set of nodes one level up (`level(n) + 1`
//! — slots sit at level `0`, the bottom, per §3) whose slot set
//! contains `n`'s. `levDown(n)` is the dual: the maximal nodes one
//! level down (`level(n) - 1`) whose slot set is contained in `n`'s.
//! Both are derived once at compile time from each node's slot set and
//! stored sorted ascending by target node id.

use std::collections::HashMap;

use crate::config::EmbeddingCacheMode;
use crate::csr::CSRArray;
use crate::types::{NodeId, TypeTable};

/// True when `sub` (sorted, deduped) is a subset of `sup` (same).
fn is_subset_sorted(sub: &[NodeId], sup: &[NodeId]) -> bool {
    if sub.len() > sup.len() {
        return false;
    }
    let mut j = 0;
    for &s in sub {
        while j < sup.len() && sup[j] < s {
            j += 1;
        }
        if j >= sup.len() || sup[j] != s {
            return false;
        }
        j += 1;
    }
    true
}

/// Compiler-side derivation: given each node's sorted slot set
/// (`node_slots[n - 1]`, `n` in `1..=max_node`; a slot's own set is
/// `[n]`), builds the `levUp` and `levDown` CSRs.
///
/// `(minSlot, maxSlot)` is used as a cheap rejection test before the
/// exact sorted-subset check, the same "conservative inclusion
/// filter" role the per-node span plays at query time (§3).
pub fn build_lev_up_down(types: &TypeTable, node_slots: &[Vec<NodeId>]) -> (CSRArray, CSRArray) {
    let max_node = types.max_node as usize;
    assert_eq!(node_slots.len(), max_node, "one slot set per node");

    let mut by_level: HashMap<u32, Vec<NodeId>> = HashMap::new();
    for n in 1..=types.max_node {
        if let Some(l) = types.level(n) {
            by_level.entry(l).or_default().push(n);
        }
    }

    let span_of = |n: NodeId| -> (NodeId, NodeId) {
        let slots = &node_slots[(n - 1) as usize];
        (slots[0], slots[slots.len() - 1])
    };

    let mut up_rows: Vec<Vec<NodeId>> = vec![Vec::new(); max_node];
    let mut down_rows: Vec<Vec<NodeId>> = vec![Vec::new(); max_node];

    for n in 1..=types.max_node {
        let level_n = match types.level(n) {
            Some(l) => l,
            None => continue,
        };
        let candidates = match by_level.get(&(level_n + 1)) {
            Some(c) => c,
            None => continue,
        };
        let (n_min, n_max) = span_of(n);
        let n_slots = &node_slots[(n - 1) as usize];

        let mut containers: Vec<NodeId> = Vec::new();
        for &m in candidates {
            let (m_min, m_max) = span_of(m);
            if m_min > n_min || m_max < n_max {
                continue;
            }
            let m_slots = &node_slots[(m - 1) as usize];
            if is_subset_sorted(n_slots, m_slots) {
                containers.push(m);
            }
        }

        // Keep only the minimal containers: drop any candidate whose
        // slot set properly contains another candidate's.
        let minimal: Vec<NodeId> = containers
            .iter()
            .copied()
            .filter(|&m| {
                let m_slots = &node_slots[(m - 1) as usize];
                !containers.iter().any(|&m2| {
                    if m2 == m {
                        return false;
                    }
                    let m2_slots = &node_slots[(m2 - 1) as usize];
                    m2_slots.len() < m_slots.len() && is_subset_sorted(m2_slots, m_slots)
                })
            })
            .collect();

        for &m in &minimal {
            up_rows[(n - 1) as usize].push(m);
            down_rows[(m - 1) as usize].push(n);
        }
    }

    for row in up_rows.iter_mut().chain(down_rows.iter_mut()) {
        row.sort_unstable();
        row.dedup();
    }

    (CSRArray::build(&up_rows), CSRArray::build(&down_rows))
}

/// Owns the two derived CSRs and applies the process-wide preload
/// policy (§4.4, §6) once at construction; `preload`/`release` remain
/// available regardless of the policy for callers that manage their
/// own load phase.
pub struct EmbeddingIndex {
    lev_up: CSRArray,
    lev_down: CSRArray,
}

impl EmbeddingIndex {
    pub fn new(lev_up: CSRArray, lev_down: CSRArray, mode: EmbeddingCacheMode) -> EmbeddingIndex {
        let idx = EmbeddingIndex { lev_up, lev_down };
        if mode.auto_preloads() {
            idx.preload();
        }
        idx
    }

    pub fn lev_up(&self) -> &CSRArray {
        &self.lev_up
    }

    pub fn lev_down(&self) -> &CSRArray {
        &self.lev_down
    }

    pub fn preload(&self) {
        self.lev_up.preload_to_ram();
        self.lev_down.preload_to_ram();
    }

    pub fn release(&self) {
        self.lev_up.release_cache();
        self.lev_down.release_cache();
    }

    pub fn is_cached(&self) -> bool {
        self.lev_up.is_cached() && self.lev_down.is_cached()
    }
}

#[cfg(test)]
#[path = "embed_test.rs"]
mod embed_test;
