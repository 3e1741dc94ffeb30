//! The compiler (§4.7): turns an in-memory corpus description into the
//! on-disk cache. The textual tokenizer front-end that produces a
//! `CorpusSource` from authored source files is an explicit Non-goal
//! (§1) and lives outside this crate; `CorpusSource` is the contract
//! between that front-end and this compiler.
//!
//! Contract: deterministic (string pools in first-seen order, edge
//! rows sorted ascending), idempotent (skips recompilation when the
//! content hash is unchanged), atomic (builds in a sibling temp
//! directory and swaps it into place, so a crash never corrupts or
//! removes the previous good cache).

use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info, warn};

use crate::column::IntColumn;
use crate::config::LoaderConfig;
use crate::csr::{CSRArray, CSRArrayWithValues};
use crate::embed::build_lev_up_down;
use crate::error::{Error, Result};
use crate::manifest::{hash_content, FeatureEntry, Manifest, FORMAT_VERSION};
use crate::pool::StringPool;
use crate::types::{NodeId, SpanTable, TypeRange, TypeTable};
use crate::util;

/// The value carried by one edge instance, before it is written to
/// disk as either a plain integer column or a resolved string-pool
/// code (§9: a feature is either wholly string-valued or wholly
/// integer-valued, never mixed).
#[derive(Debug, Clone)]
pub enum EdgeValue {
    Int(i64),
    Str(String),
}

/// The in-memory intermediate representation the compiler consumes.
/// Node ids are dense and `1`-based exactly as described in §3; this
/// struct carries no raw text, only already-parsed structure.
pub struct CorpusSource {
    pub max_slot: NodeId,
    pub type_ranges: Vec<TypeRange>,
    /// `node_slots[n - 1]` is the sorted, deduplicated slot set of
    /// node `n` (a slot's own set is `[n]`). Its length fixes
    /// `maxNode`.
    pub node_slots: Vec<Vec<NodeId>>,
    pub int_features: Vec<(String, Vec<(NodeId, i64)>)>,
    pub str_features: Vec<(String, Vec<(NodeId, String)>)>,
    /// Valueless edge features; each row should already be in the
    /// order the feature is semantically defined in (sorted ascending
    /// for set-like edges, insertion order for reading-order edges).
    pub edges: Vec<(String, Vec<Vec<NodeId>>)>,
    pub edge_values: Vec<(String, Vec<Vec<(NodeId, EdgeValue)>>)>,
    /// Raw bytes of the authored source, used only to compute the
    /// content hash that drives idempotent recompilation (§4.7).
    pub content_bytes: Vec<u8>,
}

impl CorpusSource {
    fn validate(&self) -> Result<()> {
        if self.node_slots.is_empty() {
            return Err(Error::CompilerFailure("corpus has no nodes".to_string()));
        }
        if (self.max_slot as usize) > self.node_slots.len() {
            return Err(Error::CompilerFailure(
                "maxSlot exceeds maxNode".to_string(),
            ));
        }
        for slots in &self.node_slots {
            if slots.is_empty() {
                return Err(Error::CompilerFailure(
                    "a node's slot set must not be empty".to_string(),
                ));
            }
            if !slots.windows(2).all(|w| w[0] < w[1]) {
                return Err(Error::CompilerFailure(
                    "a node's slot set must be sorted and deduplicated".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Compiles `source` into the cache directory named by `cfg` under
/// `source_dir`, or returns the already-compiled manifest untouched if
/// its content hash already matches (§4.7 idempotence).
pub fn compile(source: &CorpusSource, source_dir: &Path, cfg: &LoaderConfig) -> Result<Manifest> {
    source.validate()?;
    let cache_dir = cfg.cache_dir(source_dir);
    let content_hash = hash_content(&[&source.content_bytes]);

    if let Ok(existing) = Manifest::load(&cache_dir.join("manifest")) {
        if existing.content_hash == content_hash {
            debug!(target: "cfabric::compiler", "cache at {:?} is up to date, skipping compile", cache_dir);
            return Ok(existing);
        }
    }

    std::fs::create_dir_all(source_dir)?;
    let lock_path = source_dir.join(format!("{}.lock", cfg.cache_dir_name));
    let lock_file = util::create_file(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| Error::ConcurrentWrite(cache_dir.clone()))?;

    let result = (|| -> Result<Manifest> {
        let tmp_dir =
            source_dir.join(format!(".{}-build-{}", cfg.cache_dir_name, util::uniq_suffix()));
        let manifest = build_into(source, &tmp_dir, content_hash)?;
        swap_into_place(&tmp_dir, &cache_dir)?;
        info!(target: "cfabric::compiler", "compiled corpus into {:?}", cache_dir);
        Ok(manifest)
    })();

    lock_file.unlock().ok();
    let _ = std::fs::remove_file(&lock_path);
    result
}

fn build_into(source: &CorpusSource, tmp_dir: &Path, content_hash: String) -> Result<Manifest> {
    std::fs::create_dir_all(tmp_dir.join("features"))?;
    std::fs::create_dir_all(tmp_dir.join("edges"))?;
    std::fs::create_dir_all(tmp_dir.join("computed"))?;

    let max_node = source.node_slots.len() as NodeId;
    let types = TypeTable {
        max_slot: source.max_slot,
        max_node,
        ranges: source.type_ranges.clone(),
    };

    let mut features = Vec::new();

    for (name, values) in &source.int_features {
        let col = IntColumn::build(max_node, values);
        let rel = PathBuf::from("features").join(format!("{}.col", name));
        col.save(tmp_dir, &tmp_dir.join(&rel))?;
        features.push(FeatureEntry::Int {
            name: name.clone(),
            dtype: col.dtype(),
            path: rel,
        });
    }

    for (name, values) in &source.str_features {
        let pool = StringPool::build(max_node, values);
        let pool_rel = PathBuf::from("features").join(format!("{}.pool", name));
        let idx_rel = PathBuf::from("features").join(format!("{}.idx", name));
        pool.save(tmp_dir, &tmp_dir.join(&pool_rel), &tmp_dir.join(&idx_rel))?;
        features.push(FeatureEntry::Str {
            name: name.clone(),
            dtype: pool.dtype(),
            pool_path: pool_rel,
            idx_path: idx_rel,
        });
    }

    for (name, rows) in &source.edges {
        let mut sorted_rows = rows.clone();
        for row in &mut sorted_rows {
            row.sort_unstable();
            row.dedup();
        }
        let csr = CSRArray::build(&sorted_rows);
        let offsets_rel = PathBuf::from("edges").join(format!("{}.offsets", name));
        let data_rel = PathBuf::from("edges").join(format!("{}.data", name));
        csr.save(tmp_dir, &tmp_dir.join(&offsets_rel), &tmp_dir.join(&data_rel))?;
        features.push(FeatureEntry::Edge {
            name: name.clone(),
            offsets_path: offsets_rel,
            data_path: data_rel,
            num_rows: sorted_rows.len() as u32,
        });
    }

    for (name, rows) in &source.edge_values {
        let is_string = rows
            .iter()
            .flatten()
            .any(|(_, v)| matches!(v, EdgeValue::Str(_)));

        // Edge values are per-edge, not per-node, so the node-keyed
        // `StringPool` doesn't fit here: dedup the strings by hand and
        // store the dictionary as the same newline-delimited format
        // `StringPool` uses for its own `strings` table.
        let mut dict_codes: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
        let mut dict = vec![String::new()];
        let int_rows: Vec<Vec<(NodeId, i64)>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(t, v)| {
                        let code = match v {
                            EdgeValue::Int(i) => *i,
                            EdgeValue::Str(s) => *dict_codes.entry(s.clone()).or_insert_with(|| {
                                dict.push(s.clone());
                                (dict.len() - 1) as i64
                            }),
                        };
                        (*t, code)
                    })
                    .collect()
            })
            .collect();

        let csr = CSRArrayWithValues::build(&int_rows);
        let offsets_rel = PathBuf::from("edges").join(format!("{}.offsets", name));
        let data_rel = PathBuf::from("edges").join(format!("{}.data", name));
        let values_rel = PathBuf::from("edges").join(format!("{}.values", name));
        csr.save(
            tmp_dir,
            &tmp_dir.join(&offsets_rel),
            &tmp_dir.join(&data_rel),
            &tmp_dir.join(&values_rel),
        )?;

        let value_pool_rel = if is_string {
            let pool_rel = PathBuf::from("edges").join(format!("{}.values.pool", name));
            let mut body = String::new();
            for s in &dict {
                body.push_str(s);
                body.push('\n');
            }
            util::atomic_write(tmp_dir, &tmp_dir.join(&pool_rel), body.as_bytes())?;
            Some(pool_rel)
        } else {
            None
        };

        features.push(FeatureEntry::EdgeWithValue {
            name: name.clone(),
            offsets_path: offsets_rel,
            data_path: data_rel,
            values_path: values_rel,
            value_dtype: csr.value_dtype(),
            value_is_string: is_string,
            value_pool_path: value_pool_rel,
            num_rows: int_rows.len() as u32,
        });
    }

    let (lev_up, lev_down) = build_lev_up_down(&types, &source.node_slots);
    let lev_up_offsets_rel = PathBuf::from("computed/levUp.offsets");
    let lev_up_data_rel = PathBuf::from("computed/levUp.data");
    let lev_down_offsets_rel = PathBuf::from("computed/levDown.offsets");
    let lev_down_data_rel = PathBuf::from("computed/levDown.data");
    lev_up.save(
        tmp_dir,
        &tmp_dir.join(&lev_up_offsets_rel),
        &tmp_dir.join(&lev_up_data_rel),
    )?;
    lev_down.save(
        tmp_dir,
        &tmp_dir.join(&lev_down_offsets_rel),
        &tmp_dir.join(&lev_down_data_rel),
    )?;
    features.push(FeatureEntry::Computed { name: "levUp".to_string() });
    features.push(FeatureEntry::Computed { name: "levDown".to_string() });

    let spans = SpanTable::build(&source.node_slots);
    let min_slot_rel = PathBuf::from("computed/minSlot.col");
    let max_slot_rel = PathBuf::from("computed/maxSlot.col");
    let span_dtype = spans.save(
        tmp_dir,
        &tmp_dir.join(&min_slot_rel),
        &tmp_dir.join(&max_slot_rel),
    )?;

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        max_node,
        max_slot: source.max_slot,
        type_ranges: source.type_ranges.clone(),
        span_dtype,
        min_slot_path: min_slot_rel,
        max_slot_path: max_slot_rel,
        lev_up_offsets_path: lev_up_offsets_rel,
        lev_up_data_path: lev_up_data_rel,
        lev_down_offsets_path: lev_down_offsets_rel,
        lev_down_data_path: lev_down_data_rel,
        features,
        content_hash,
    };
    manifest.save(tmp_dir, &tmp_dir.join("manifest"))?;
    Ok(manifest)
}

/// Swaps `tmp_dir` into `cache_dir`'s place. If `cache_dir` already
/// exists it is first renamed aside and only removed once the new
/// directory is successfully in place, so a crash between the two
/// renames leaves either the old or the new cache fully intact, never
/// a half-written one.
fn swap_into_place(tmp_dir: &Path, cache_dir: &Path) -> Result<()> {
    if cache_dir.exists() {
        let backup = cache_dir.with_file_name(format!(
            "{}.stale-{}",
            cache_dir.file_name().and_then(|s| s.to_str()).unwrap_or("cache"),
            util::uniq_suffix()
        ));
        std::fs::rename(cache_dir, &backup)?;
        std::fs::rename(tmp_dir, cache_dir)?;
        if let Err(err) = std::fs::remove_dir_all(&backup) {
            warn!(target: "cfabric::compiler", "could not remove stale cache {:?}: {}", backup, err);
        }
    } else {
        if let Some(parent) = cache_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(tmp_dir, cache_dir)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "compiler_test.rs"]
mod compiler_test;
