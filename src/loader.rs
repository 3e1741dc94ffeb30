//! Opens a compiled cache directory into a queryable `Corpus` (§4.8):
//! validates the manifest's format version, memory-maps every listed
//! file, and builds the `F`/`E`/`C`/`L` façades over them.
//!
//! Façade entries are constructed eagerly here rather than on first
//! access — mapping a file is cheap relative to the query traffic a
//! corpus sees once opened, so there is little to gain from deferring
//! it, and an eager build keeps `F`/`E` plain owning structs instead of
//! lazily-initialized cells.

use std::path::Path;

use crate::column::IntColumn;
use crate::compiler::CorpusSource;
use crate::config::LoaderConfig;
use crate::csr::{CSRArray, CSRArrayWithValues};
use crate::embed::EmbeddingIndex;
use crate::error::Result;
use crate::facade::{EdgeFeature, C, E, F};
use crate::locality::Locality;
use crate::manifest::{FeatureEntry, Manifest};
use crate::pool::StringPool;
use crate::compiler;
use crate::types::{NodeId, SpanTable, TypeTable};

/// A fully opened corpus: the type/span/embedding backbone that backs
/// `L`, plus the `F`/`E` feature façades built from the manifest's
/// feature table.
pub struct Corpus {
    types: TypeTable,
    spans: SpanTable,
    embed: EmbeddingIndex,
    f: F,
    e: E,
}

impl Corpus {
    /// Opens an already-compiled cache under `source_dir`. Fails with
    /// `VersionMismatch` if the cache predates this loader and with
    /// `Io` if no cache exists yet — callers that can re-derive the
    /// corpus should use `compile_and_open` instead.
    pub fn open(source_dir: &Path, cfg: &LoaderConfig) -> Result<Corpus> {
        let cache_dir = cfg.cache_dir(source_dir);
        let manifest = Manifest::load(&cache_dir.join("manifest"))?;
        Corpus::from_manifest(&cache_dir, manifest, cfg)
    }

    /// Compiles `source` if its content hash differs from what's
    /// already cached (or the cache is missing/version-mismatched),
    /// then opens the result. This is the entry point that gives the
    /// "version mismatch triggers full recompile" guarantee of §6,
    /// since only here is a `CorpusSource` available to rebuild from.
    pub fn compile_and_open(
        source: &CorpusSource,
        source_dir: &Path,
        cfg: &LoaderConfig,
    ) -> Result<Corpus> {
        compiler::compile(source, source_dir, cfg)?;
        Corpus::open(source_dir, cfg)
    }

    fn from_manifest(cache_dir: &Path, manifest: Manifest, cfg: &LoaderConfig) -> Result<Corpus> {
        let types = TypeTable {
            max_slot: manifest.max_slot,
            max_node: manifest.max_node,
            ranges: manifest.type_ranges.clone(),
        };

        let spans = SpanTable::load(
            &cache_dir.join(&manifest.min_slot_path),
            &cache_dir.join(&manifest.max_slot_path),
            manifest.max_node,
            manifest.span_dtype,
        )?;

        let num_rows = manifest.max_node as usize;
        let lev_up = CSRArray::load(
            &cache_dir.join(&manifest.lev_up_offsets_path),
            &cache_dir.join(&manifest.lev_up_data_path),
            num_rows,
        )?;
        let lev_down = CSRArray::load(
            &cache_dir.join(&manifest.lev_down_offsets_path),
            &cache_dir.join(&manifest.lev_down_data_path),
            num_rows,
        )?;
        let embed = EmbeddingIndex::new(lev_up, lev_down, cfg.embedding_cache);

        let mut f = F::new();
        let mut e = E::new();

        for entry in &manifest.features {
            match entry {
                FeatureEntry::Int { name, dtype, path } => {
                    let col = IntColumn::load(&cache_dir.join(path), manifest.max_node, *dtype)?;
                    f.insert_int(name, col);
                }
                FeatureEntry::Str {
                    name,
                    dtype,
                    pool_path,
                    idx_path,
                } => {
                    let pool = StringPool::load(
                        &cache_dir.join(pool_path),
                        &cache_dir.join(idx_path),
                        manifest.max_node,
                        *dtype,
                    )?;
                    f.insert_str(name, pool);
                }
                FeatureEntry::Edge {
                    name,
                    offsets_path,
                    data_path,
                    num_rows,
                } => {
                    let csr = CSRArray::load(
                        &cache_dir.join(offsets_path),
                        &cache_dir.join(data_path),
                        *num_rows as usize,
                    )?;
                    e.insert(name, EdgeFeature::Plain(csr));
                }
                FeatureEntry::EdgeWithValue {
                    name,
                    offsets_path,
                    data_path,
                    values_path,
                    value_dtype,
                    value_is_string,
                    value_pool_path,
                    num_rows,
                } => {
                    let csr = CSRArrayWithValues::load(
                        &cache_dir.join(offsets_path),
                        &cache_dir.join(data_path),
                        &cache_dir.join(values_path),
                        *num_rows as usize,
                        *value_dtype,
                    )?;
                    let pool = if *value_is_string {
                        let pool_path = value_pool_path.as_ref().ok_or_else(|| {
                            crate::error::Error::CorruptCache {
                                path: cache_dir.to_path_buf(),
                                reason: format!(
                                    "edge feature {:?} is marked string-valued but has no value pool path",
                                    name
                                ),
                            }
                        })?;
                        Some(StringPool::load_dictionary(&cache_dir.join(pool_path))?)
                    } else {
                        None
                    };
                    e.insert(name, EdgeFeature::WithValue(csr, pool));
                }
                // levUp/levDown are loaded unconditionally above via the
                // manifest's dedicated path fields, not through this
                // per-feature loop; the `Computed` entry exists only so
                // `C.levUp`/`C.levDown` can be validated against the
                // manifest like any other named feature.
                FeatureEntry::Computed { .. } => {}
            }
        }

        Ok(Corpus { types, spans, embed, f, e })
    }

    pub fn f(&self) -> &F {
        &self.f
    }

    pub fn e(&self) -> &E {
        &self.e
    }

    pub fn c(&self) -> C<'_> {
        C::new(&self.embed)
    }

    pub fn l(&self) -> Locality<'_> {
        Locality::new(&self.types, &self.spans, &self.embed)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn max_node(&self) -> NodeId {
        self.types.max_node
    }

    pub fn max_slot(&self) -> NodeId {
        self.types.max_slot
    }

    /// Preloads both embedding CSRs to RAM regardless of the
    /// `EmbeddingCacheMode` the corpus was opened with (§5: preload
    /// must complete before workers start querying, so this is
    /// exposed for callers that manage their own fork-with-preload
    /// timing instead of relying on open-time policy).
    pub fn preload_embeddings(&self) {
        self.embed.preload();
    }

    pub fn release_embeddings(&self) {
        self.embed.release();
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;
