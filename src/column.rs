//! Flat typed columns (§4.1): one file per integer node feature,
//! memory-mapped read-only, indexed directly by node id.
//!
//! A column's backing bytes are `(max_node + 1) * dtype.byte_width()`
//! long — index `0` is wasted but this keeps every lookup a direct
//! `node_id`-indexed slice, with no off-by-one arithmetic at the read
//! path. `CorruptCache` is raised at load time if the mapped file's
//! length disagrees with that formula.

use std::path::Path;

use memmap2::Mmap;

use crate::backing::Backing;
use crate::dtype::IntDtype;
use crate::error::{Error, Result};
use crate::types::NodeId;
use crate::util;

/// A single integer node feature, `nodeID -> value | ABSENT`.
pub struct IntColumn {
    dtype: IntDtype,
    max_node: NodeId,
    data: Backing,
}

impl IntColumn {
    /// Builds an in-memory column from a dense `node_id -> value`
    /// partial map. `max_node` fixes the column's length regardless of
    /// which nodes actually have a value.
    pub fn build(max_node: NodeId, values: &[(NodeId, i64)]) -> IntColumn {
        let (min_v, max_v) = values
            .iter()
            .map(|(_, v)| *v)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0, 0));
        let dtype = IntDtype::narrowest_for_range(min_v, max_v);
        let width = dtype.byte_width();
        let mut buf = vec![0u8; (max_node as usize + 1) * width];
        let sentinel = dtype.sentinel();
        for chunk in buf.chunks_exact_mut(width) {
            let mut tmp = Vec::with_capacity(width);
            dtype.encode_le(sentinel, &mut tmp);
            chunk.copy_from_slice(&tmp);
        }
        for (n, v) in values {
            let i = *n as usize;
            let mut tmp = Vec::with_capacity(width);
            dtype.encode_le(*v, &mut tmp);
            buf[i * width..(i + 1) * width].copy_from_slice(&tmp);
        }
        IntColumn {
            dtype,
            max_node,
            data: Backing::Owned(buf),
        }
    }

    pub(crate) fn raw_bytes(&self) -> &[u8] {
        self.data.bytes()
    }

    pub fn dtype(&self) -> IntDtype {
        self.dtype
    }

    /// Writes the column's raw bytes to `path` atomically.
    pub fn save(&self, dir: &Path, path: &Path) -> Result<()> {
        util::atomic_write(dir, path, self.data.bytes())
    }

    /// Memory-maps a previously-saved column. `max_node` and `dtype`
    /// come from the manifest; the file's length is validated against
    /// them.
    pub fn load(path: &Path, max_node: NodeId, dtype: IntDtype) -> Result<IntColumn> {
        let file = util::open_file_r(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let expected = (max_node as usize + 1) * dtype.byte_width();
        if mmap.len() != expected {
            return Err(Error::CorruptCache {
                path: path.to_path_buf(),
                reason: format!(
                    "column length {} does not match maxNode+1 ({}) for dtype {:?}",
                    mmap.len(),
                    expected,
                    dtype
                ),
            });
        }
        Ok(IntColumn {
            dtype,
            max_node,
            data: Backing::Mapped(mmap),
        })
    }

    /// `O(1)` bounds-checked lookup. Out-of-range or missing ids both
    /// yield `None` — lookups here are total, never fail.
    pub fn get(&self, n: NodeId) -> Option<i64> {
        if n == 0 || n > self.max_node {
            return None;
        }
        let width = self.dtype.byte_width();
        let i = n as usize;
        let bytes = self.data.bytes();
        let slice = &bytes[i * width..(i + 1) * width];
        let v = self.dtype.decode_le(slice);
        if v == self.dtype.sentinel() {
            None
        } else {
            Some(v)
        }
    }

    pub fn filter_by_value(&self, nodes: &[NodeId], v: i64) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&n| self.get(n) == Some(v))
            .collect()
    }

    pub fn filter_by_values(&self, nodes: &[NodeId], values: &[i64]) -> Vec<NodeId> {
        let set: std::collections::HashSet<i64> = values.iter().copied().collect();
        nodes
            .iter()
            .copied()
            .filter(|&n| self.get(n).map_or(false, |v| set.contains(&v)))
            .collect()
    }

    pub fn filter_less_than(&self, nodes: &[NodeId], t: i64) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&n| self.get(n).map_or(false, |v| v < t))
            .collect()
    }

    pub fn filter_greater_than(&self, nodes: &[NodeId], t: i64) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&n| self.get(n).map_or(false, |v| v > t))
            .collect()
    }

    pub fn filter_has_value(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&n| self.get(n).is_some())
            .collect()
    }

    pub fn filter_missing_value(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&n| self.get(n).is_none())
            .collect()
    }
}

#[cfg(test)]
#[path = "column_test.rs"]
mod column_test;
