//! Deduplicated string pool (§4.2): a `strings` table plus a per-node
//! `index` array of codes into it. `index[n] == 0` (`MISSING_STR_INDEX`)
//! means "no value"; `strings[0]` is the empty/missing sentinel so that
//! index `0` always resolves to the empty string if ever dereferenced
//! directly.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::column::IntColumn;
use crate::dtype::IntDtype;
use crate::error::Result;
use crate::types::NodeId;

pub const MISSING_STR_INDEX: i64 = 0;

/// A string-valued node feature.
pub struct StringPool {
    strings: Vec<String>,
    index: IntColumn,
}

impl StringPool {
    /// Builds a pool from a dense `node_id -> value` partial map.
    /// `strings` ends up in first-seen order (by iterating `values` as
    /// given) so that repeated compiles of byte-identical input
    /// produce a byte-identical pool (§4.7 determinism).
    pub fn build(max_node: NodeId, values: &[(NodeId, String)]) -> StringPool {
        let mut strings = vec![String::new()];
        let mut seen: FxHashMap<String, i64> = FxHashMap::default();
        let mut codes = Vec::with_capacity(values.len());
        for (n, s) in values {
            let code = *seen.entry(s.clone()).or_insert_with(|| {
                strings.push(s.clone());
                (strings.len() - 1) as i64
            });
            codes.push((*n, code));
        }
        let index = IntColumn::build(max_node, &codes);
        StringPool { strings, index }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    /// `strings[k]`, the `k`-th distinct value (`k == 0` is the empty
    /// sentinel).
    pub fn string_at(&self, k: usize) -> Option<&str> {
        self.strings.get(k).map(|s| s.as_str())
    }

    /// `get(n)` returns the stored string, or `None` for a missing
    /// value or an out-of-range node — lookups are total.
    pub fn get(&self, n: NodeId) -> Option<&str> {
        let code = self.index.get(n)?;
        if code == MISSING_STR_INDEX {
            None
        } else {
            self.strings.get(code as usize).map(|s| s.as_str())
        }
    }

    /// Resolves `value` to its internal code, once, so bulk predicates
    /// can scan the `index` column as a plain integer column instead
    /// of doing string comparisons per node.
    pub fn get_value_index(&self, value: &str) -> Option<i64> {
        self.strings
            .iter()
            .position(|s| s == value)
            .map(|i| i as i64)
            .filter(|&i| i != 0)
    }

    pub fn filter_by_value(&self, nodes: &[NodeId], value: &str) -> Vec<NodeId> {
        match self.get_value_index(value) {
            Some(code) => self.index.filter_by_value(nodes, code),
            None => Vec::new(),
        }
    }

    pub fn filter_by_values(&self, nodes: &[NodeId], values: &[&str]) -> Vec<NodeId> {
        let codes: Vec<i64> = values
            .iter()
            .filter_map(|v| self.get_value_index(v))
            .collect();
        if codes.is_empty() {
            return Vec::new();
        }
        self.index.filter_by_values(nodes, &codes)
    }

    pub fn filter_has_value(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        self.index.filter_has_value(nodes)
    }

    pub fn filter_missing_value(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        self.index.filter_missing_value(nodes)
    }

    pub fn dtype(&self) -> IntDtype {
        self.index.dtype()
    }

    /// Saves `strings` (newline-delimited, first-seen order) and the
    /// `index` column side by side as `<stem>.pool` / `<stem>.idx`.
    pub fn save(&self, dir: &Path, pool_path: &Path, idx_path: &Path) -> Result<()> {
        let mut body = String::new();
        for s in &self.strings {
            body.push_str(s);
            body.push('\n');
        }
        crate::util::atomic_write(dir, pool_path, body.as_bytes())?;
        self.index.save(dir, idx_path)
    }

    pub fn load(
        pool_path: &Path,
        idx_path: &Path,
        max_node: NodeId,
        dtype: IntDtype,
    ) -> Result<StringPool> {
        let body = std::fs::read_to_string(pool_path)?;
        let mut strings: Vec<String> = body.lines().map(|s| s.to_string()).collect();
        if strings.is_empty() {
            strings.push(String::new());
        }
        let index = IntColumn::load(idx_path, max_node, dtype)?;
        Ok(StringPool { strings, index })
    }

    /// Count of distinct non-missing values actually stored — used by
    /// the dedup invariant in §8.
    pub fn distinct_count(&self) -> usize {
        self.strings.len() - 1
    }

    /// Builds a pool holding only a string dictionary, with no
    /// per-node index column. Edge-value features key their codes
    /// positionally rather than by node id, so they have no use for
    /// `StringPool`'s `index` half — this still lets them share
    /// `string_at` with node features.
    pub(crate) fn from_dictionary(strings: Vec<String>) -> StringPool {
        StringPool {
            strings,
            index: IntColumn::build(0, &[]),
        }
    }

    /// Reads back a dictionary written as newline-delimited strings
    /// (the same format `save` uses for its `strings` half).
    pub(crate) fn load_dictionary(pool_path: &Path) -> Result<StringPool> {
        let body = std::fs::read_to_string(pool_path)?;
        let mut strings: Vec<String> = body.lines().map(|s| s.to_string()).collect();
        if strings.is_empty() {
            strings.push(String::new());
        }
        Ok(StringPool::from_dictionary(strings))
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
