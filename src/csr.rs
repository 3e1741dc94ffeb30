//! Compressed-sparse-row graphs (§4.3): `CSRArray` for edges without a
//! value, `CSRArrayWithValues` for edges that carry one.
//!
//! Row `i` (`0`-based) belongs to node id `i + 1` — the same
//! 1-based-node/0-based-row convention used throughout the embedding
//! index (§4.4) and confirmed by the original implementation's CSR
//! tests (a source set `{1, 3}` selects rows `0` and `2`). A source or
//! target id of `0`, or one beyond `num_rows`, always yields an empty
//! row rather than a panic.

use std::cell::RefCell;
use std::collections::HashSet;
use std::convert::TryInto;
use std::path::Path;

use memmap2::Mmap;

use crate::backing::Backing;
use crate::dtype::IntDtype;
use crate::error::Result;
use crate::types::NodeId;
use crate::util;

fn read_u32(bytes: &[u8], i: usize) -> u32 {
    u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap())
}

fn encode_offsets(offsets: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(offsets.len() * 4);
    for o in offsets {
        buf.extend_from_slice(&o.to_le_bytes());
    }
    buf
}

fn encode_data(data: &[NodeId]) -> Vec<u8> {
    encode_offsets(data)
}

fn row_of(offsets: &[u8], data: &[u8], num_rows: usize, i: usize) -> Vec<NodeId> {
    if i >= num_rows {
        return Vec::new();
    }
    let start = read_u32(offsets, i) as usize;
    let end = read_u32(offsets, i + 1) as usize;
    data[start * 4..end * 4]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

fn row_index_of(source: NodeId) -> Option<usize> {
    if source == 0 {
        None
    } else {
        Some((source - 1) as usize)
    }
}

/// An edge feature with no per-target value: `nodeID -> ordered list of
/// nodeID`.
pub struct CSRArray {
    offsets: Backing,
    data: Backing,
    num_rows: usize,
    ram: RefCell<Option<(Vec<u8>, Vec<u8>)>>,
}

impl CSRArray {
    /// Builds a CSR from `rows[i]` = the target list for node `i + 1`.
    /// Callers that need ascending-sorted rows (embeddings, value-less
    /// edges) sort each row before calling this; insertion-ordered
    /// edges (e.g. reading-order children) pass rows as-is.
    pub fn build(rows: &[Vec<NodeId>]) -> CSRArray {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut data = Vec::new();
        offsets.push(0u32);
        for row in rows {
            data.extend_from_slice(row);
            offsets.push(data.len() as u32);
        }
        CSRArray {
            offsets: Backing::Owned(encode_offsets(&offsets)),
            data: Backing::Owned(encode_data(&data)),
            num_rows: rows.len(),
            ram: RefCell::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    fn with_bytes<R>(&self, f: impl FnOnce(&[u8], &[u8]) -> R) -> R {
        let ram = self.ram.borrow();
        match &*ram {
            Some((offs, data)) => f(offs, data),
            None => f(self.offsets.bytes(), self.data.bytes()),
        }
    }

    /// Row `i` (`0`-based).
    pub fn row(&self, i: usize) -> Vec<NodeId> {
        self.with_bytes(|offs, data| row_of(offs, data, self.num_rows, i))
    }

    /// Row belonging to node id `source` (`1`-based).
    pub fn get(&self, source: NodeId) -> Vec<NodeId> {
        match row_index_of(source) {
            Some(i) => self.row(i),
            None => Vec::new(),
        }
    }

    /// Same as `get`, named to mirror the façade's "immutable snapshot"
    /// API for callers that want a tuple-like read-only view.
    pub fn get_as_tuple(&self, source: NodeId) -> Vec<NodeId> {
        self.get(source)
    }

    /// Union of targets across every row named by `sources`.
    /// Out-of-range sources contribute nothing.
    pub fn get_all_targets(&self, sources: &[NodeId]) -> HashSet<NodeId> {
        let mut out = HashSet::new();
        for &s in sources {
            out.extend(self.get(s));
        }
        out
    }

    /// Streams each row named by `sources`, testing intersection with
    /// `targets`; returns the sources that had a hit and the subset of
    /// `targets` that was actually found.
    pub fn filter_sources_with_targets_in(
        &self,
        sources: &[NodeId],
        targets: &[NodeId],
    ) -> (HashSet<NodeId>, HashSet<NodeId>) {
        let target_set: HashSet<NodeId> = targets.iter().copied().collect();
        let mut matched_sources = HashSet::new();
        let mut matched_targets = HashSet::new();
        if target_set.is_empty() {
            return (matched_sources, matched_targets);
        }
        for &s in sources {
            let row = self.get(s);
            let mut hit = false;
            for t in row {
                if target_set.contains(&t) {
                    matched_targets.insert(t);
                    hit = true;
                }
            }
            if hit {
                matched_sources.insert(s);
            }
        }
        (matched_sources, matched_targets)
    }

    pub fn preload_to_ram(&self) {
        let mut ram = self.ram.borrow_mut();
        if ram.is_some() {
            return;
        }
        *ram = Some((self.offsets.bytes().to_vec(), self.data.bytes().to_vec()));
    }

    pub fn release_cache(&self) {
        *self.ram.borrow_mut() = None;
    }

    pub fn is_cached(&self) -> bool {
        self.ram.borrow().is_some()
    }

    pub fn memory_usage_bytes(&self) -> usize {
        match &*self.ram.borrow() {
            Some((offs, data)) => offs.len() + data.len(),
            None => 0,
        }
    }

    pub fn save(&self, dir: &Path, offsets_path: &Path, data_path: &Path) -> Result<()> {
        util::atomic_write(dir, offsets_path, self.offsets.bytes())?;
        util::atomic_write(dir, data_path, self.data.bytes())
    }

    pub fn load(offsets_path: &Path, data_path: &Path, num_rows: usize) -> Result<CSRArray> {
        let offsets_file = util::open_file_r(offsets_path)?;
        let data_file = util::open_file_r(data_path)?;
        let offsets_mmap = unsafe { Mmap::map(&offsets_file)? };
        let data_mmap = unsafe { Mmap::map(&data_file)? };
        Ok(CSRArray {
            offsets: Backing::Mapped(offsets_mmap),
            data: Backing::Mapped(data_mmap),
            num_rows,
            ram: RefCell::new(None),
        })
    }
}

/// An edge feature with a per-target value, `nodeID -> ordered list of
/// (nodeID, value)`. Values are either plain integers or string-pool
/// codes; the façade layer (`facade.rs`) knows which and resolves
/// string codes against the owning pool. A per-edge sentinel (the
/// value dtype's reserved minimum) represents "no value for this
/// particular edge" without requiring a second, valueless
/// representation to coexist at runtime (§9).
pub struct CSRArrayWithValues {
    offsets: Backing,
    data: Backing,
    values: Backing,
    value_dtype: IntDtype,
    num_rows: usize,
    ram: RefCell<Option<(Vec<u8>, Vec<u8>, Vec<u8>)>>,
}

impl CSRArrayWithValues {
    /// Builds from `rows[i]` = the ordered `(target, value)` list for
    /// node `i + 1`.
    pub fn build(rows: &[Vec<(NodeId, i64)>]) -> CSRArrayWithValues {
        let (min_v, max_v) = rows
            .iter()
            .flatten()
            .map(|(_, v)| *v)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0, 0));
        let value_dtype = IntDtype::narrowest_for_range(min_v, max_v);

        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut data = Vec::new();
        let mut values: Vec<u8> = Vec::new();
        offsets.push(0u32);
        for row in rows {
            for (t, v) in row {
                data.push(*t);
                value_dtype.encode_le(*v, &mut values);
            }
            offsets.push(data.len() as u32);
        }
        CSRArrayWithValues {
            offsets: Backing::Owned(encode_offsets(&offsets)),
            data: Backing::Owned(encode_data(&data)),
            values: Backing::Owned(values),
            value_dtype,
            num_rows: rows.len(),
            ram: RefCell::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn value_dtype(&self) -> IntDtype {
        self.value_dtype
    }

    fn with_bytes<R>(&self, f: impl FnOnce(&[u8], &[u8], &[u8]) -> R) -> R {
        let ram = self.ram.borrow();
        match &*ram {
            Some((offs, data, values)) => f(offs, data, values),
            None => f(self.offsets.bytes(), self.data.bytes(), self.values.bytes()),
        }
    }

    /// Row `i` (`0`-based) as parallel `(targets, values)` arrays, the
    /// hot-path shape consumers use directly.
    pub fn row(&self, i: usize) -> (Vec<NodeId>, Vec<Option<i64>>) {
        self.with_bytes(|offs, data, values| {
            if i >= self.num_rows {
                return (Vec::new(), Vec::new());
            }
            let start = read_u32(offs, i) as usize;
            let end = read_u32(offs, i + 1) as usize;
            let targets = data[start * 4..end * 4]
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                .collect();
            let width = self.value_dtype.byte_width();
            let sentinel = self.value_dtype.sentinel();
            let vals = values[start * width..end * width]
                .chunks_exact(width)
                .map(|c| {
                    let v = self.value_dtype.decode_le(c);
                    if v == sentinel {
                        None
                    } else {
                        Some(v)
                    }
                })
                .collect();
            (targets, vals)
        })
    }

    pub fn get(&self, source: NodeId) -> (Vec<NodeId>, Vec<Option<i64>>) {
        match row_index_of(source) {
            Some(i) => self.row(i),
            None => (Vec::new(), Vec::new()),
        }
    }

    /// Materializes `{target: value}` for a single source, for
    /// callers that want dict-shaped access rather than the parallel
    /// arrays of `row`/`get`.
    pub fn get_as_dict(&self, source: NodeId) -> Vec<(NodeId, Option<i64>)> {
        let (targets, values) = self.get(source);
        targets.into_iter().zip(values).collect()
    }

    pub fn preload_to_ram(&self) {
        let mut ram = self.ram.borrow_mut();
        if ram.is_some() {
            return;
        }
        *ram = Some((
            self.offsets.bytes().to_vec(),
            self.data.bytes().to_vec(),
            self.values.bytes().to_vec(),
        ));
    }

    pub fn release_cache(&self) {
        *self.ram.borrow_mut() = None;
    }

    pub fn is_cached(&self) -> bool {
        self.ram.borrow().is_some()
    }

    pub fn memory_usage_bytes(&self) -> usize {
        match &*self.ram.borrow() {
            Some((offs, data, values)) => offs.len() + data.len() + values.len(),
            None => 0,
        }
    }

    pub fn save(
        &self,
        dir: &Path,
        offsets_path: &Path,
        data_path: &Path,
        values_path: &Path,
    ) -> Result<()> {
        util::atomic_write(dir, offsets_path, self.offsets.bytes())?;
        util::atomic_write(dir, data_path, self.data.bytes())?;
        util::atomic_write(dir, values_path, self.values.bytes())
    }

    pub fn load(
        offsets_path: &Path,
        data_path: &Path,
        values_path: &Path,
        num_rows: usize,
        value_dtype: IntDtype,
    ) -> Result<CSRArrayWithValues> {
        let offsets_mmap = unsafe { Mmap::map(&util::open_file_r(offsets_path)?)? };
        let data_mmap = unsafe { Mmap::map(&util::open_file_r(data_path)?)? };
        let values_mmap = unsafe { Mmap::map(&util::open_file_r(values_path)?)? };
        Ok(CSRArrayWithValues {
            offsets: Backing::Mapped(offsets_mmap),
            data: Backing::Mapped(data_mmap),
            values: Backing::Mapped(values_mmap),
            value_dtype,
            num_rows,
            ram: RefCell::new(None),
        })
    }
}

#[cfg(test)]
#[path = "csr_test.rs"]
mod csr_test;
