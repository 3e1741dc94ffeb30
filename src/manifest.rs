//! The cache manifest (§4.8, §6): the single document that lists every
//! on-disk array, its shape and dtype, the format version, and the
//! compiled source's content hash. The loader treats this as the only
//! source of truth for what features exist — there is no ad hoc
//! attribute discovery (§9).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dtype::IntDtype;
use crate::error::{Error, Result};
use crate::types::{NodeId, TypeRange};
use crate::util;

/// Bumped whenever the on-disk layout changes incompatibly. A cache
/// whose manifest reports a different version is always discarded and
/// recompiled (§6, §7 `VersionMismatch`).
pub const FORMAT_VERSION: u32 = 1;

/// One entry per feature the compiler produced, tagged by kind so the
/// façade layer (`facade.rs`) can dispatch without attribute-style
/// magic (§9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FeatureEntry {
    Int {
        name: String,
        dtype: IntDtype,
        path: PathBuf,
    },
    Str {
        name: String,
        dtype: IntDtype,
        pool_path: PathBuf,
        idx_path: PathBuf,
    },
    /// A valueless edge feature (§9: represented as a plain `CSRArray`
    /// rather than an `EdgeWithValue` carrying an all-ABSENT values
    /// array).
    Edge {
        name: String,
        offsets_path: PathBuf,
        data_path: PathBuf,
        num_rows: u32,
    },
    EdgeWithValue {
        name: String,
        offsets_path: PathBuf,
        data_path: PathBuf,
        values_path: PathBuf,
        value_dtype: IntDtype,
        /// When true, `values` holds string-pool codes resolved
        /// against `value_pool_path`/`value_idx_path` rather than
        /// plain integers.
        value_is_string: bool,
        value_pool_path: Option<PathBuf>,
        num_rows: u32,
    },
    /// A derived structure such as `levUp`/`levDown`; the loader knows
    /// how to build these from the type table rather than reading a
    /// generic entry, but they are still listed so `UnknownFeature`
    /// can be raised for typos in `C.<name>`.
    Computed { name: String },
}

impl FeatureEntry {
    pub fn name(&self) -> &str {
        match self {
            FeatureEntry::Int { name, .. } => name,
            FeatureEntry::Str { name, .. } => name,
            FeatureEntry::Edge { name, .. } => name,
            FeatureEntry::EdgeWithValue { name, .. } => name,
            FeatureEntry::Computed { name, .. } => name,
        }
    }
}

/// The cache root's sole descriptor. Every path is relative to the
/// cache directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub max_node: NodeId,
    pub max_slot: NodeId,
    pub type_ranges: Vec<TypeRange>,
    /// The per-node `(minSlot, maxSlot)` span table (§3, §6), stored as
    /// two plain integer columns rather than a generic `FeatureEntry`
    /// since the loader always needs it (it backs `L`, not just one
    /// named feature).
    pub span_dtype: IntDtype,
    pub min_slot_path: PathBuf,
    pub max_slot_path: PathBuf,
    /// The embedding index (§4.4), always present and always loaded —
    /// the minimal `C.levUp`/`C.levDown` structures, not a per-feature
    /// choice.
    pub lev_up_offsets_path: PathBuf,
    pub lev_up_data_path: PathBuf,
    pub lev_down_offsets_path: PathBuf,
    pub lev_down_data_path: PathBuf,
    pub features: Vec<FeatureEntry>,
    pub content_hash: String,
}

impl Manifest {
    /// Fails with `VersionMismatch` unless this manifest's format
    /// version matches the loader's.
    pub fn check_version(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::VersionMismatch {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }

    pub fn feature(&self, name: &str) -> Result<&FeatureEntry> {
        self.features
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }

    pub fn save(&self, dir: &Path, path: &Path) -> Result<()> {
        let body = serde_json::to_vec_pretty(self)?;
        util::atomic_write(dir, path, &body)
    }

    pub fn load(path: &Path) -> Result<Manifest> {
        let body = std::fs::read(path)?;
        let manifest: Manifest = serde_json::from_slice(&body)?;
        manifest.check_version()?;
        Ok(manifest)
    }
}

/// A fast, non-cryptographic content hash used only to detect whether
/// the authored source changed between compiles (§4.7 idempotence) —
/// not a security boundary, so the stdlib's `DefaultHasher` is enough.
pub fn hash_content(chunks: &[&[u8]]) -> String {
    let mut hasher = DefaultHasher::new();
    for chunk in chunks {
        chunk.len().hash(&mut hasher);
        hasher.write(chunk);
    }
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod manifest_test;
