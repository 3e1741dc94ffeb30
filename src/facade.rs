//! Feature façades `F`, `E`, `C` (§4.6, §9): explicit name→feature
//! registries dispatched by tagged variant, replacing the source's
//! attribute-style `F.<name>.v(n)` magic. Every name is validated
//! against the manifest; an unknown name fails loudly with
//! `UnknownFeature` at first access rather than silently returning
//! nothing.

use std::collections::{HashMap, HashSet};

use crate::column::IntColumn;
use crate::csr::{CSRArray, CSRArrayWithValues};
use crate::embed::EmbeddingIndex;
use crate::error::{Error, Result};
use crate::pool::StringPool;
use crate::types::NodeId;

/// A single node-feature lookup result, type-erased so the façade can
/// expose one `v()` regardless of whether the feature is backed by a
/// column or a string pool.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Str(String),
}

enum NodeFeature {
    Int(IntColumn),
    Str(StringPool),
}

impl NodeFeature {
    fn v(&self, n: NodeId) -> Option<FeatureValue> {
        match self {
            NodeFeature::Int(col) => col.get(n).map(FeatureValue::Int),
            NodeFeature::Str(pool) => pool.get(n).map(|s| FeatureValue::Str(s.to_string())),
        }
    }
}

/// The `F` façade: node features.
pub struct F {
    features: HashMap<String, NodeFeature>,
}

impl F {
    pub fn new() -> F {
        F { features: HashMap::new() }
    }

    pub fn insert_int(&mut self, name: &str, col: IntColumn) {
        self.features.insert(name.to_string(), NodeFeature::Int(col));
    }

    pub fn insert_str(&mut self, name: &str, pool: StringPool) {
        self.features.insert(name.to_string(), NodeFeature::Str(pool));
    }

    /// Untyped single-node lookup. Fails with `UnknownFeature` if
    /// `name` is not in the manifest; never fails for an absent or
    /// out-of-range node (returns `Ok(None)` for those, §7).
    pub fn v(&self, name: &str, n: NodeId) -> Result<Option<FeatureValue>> {
        Ok(self.get(name)?.v(n))
    }

    /// The underlying integer column, for callers that want the
    /// vectorized predicates of §4.1 directly. Also returns
    /// `UnknownFeature` if `name` names a string feature instead.
    pub fn int_column(&self, name: &str) -> Result<&IntColumn> {
        match self.get(name)? {
            NodeFeature::Int(col) => Ok(col),
            NodeFeature::Str(_) => Err(Error::UnknownFeature(name.to_string())),
        }
    }

    /// The underlying string pool, for the vectorized predicates of
    /// §4.2. Also returns `UnknownFeature` if `name` names an integer
    /// feature instead.
    pub fn string_pool(&self, name: &str) -> Result<&StringPool> {
        match self.get(name)? {
            NodeFeature::Str(pool) => Ok(pool),
            NodeFeature::Int(_) => Err(Error::UnknownFeature(name.to_string())),
        }
    }

    fn get(&self, name: &str) -> Result<&NodeFeature> {
        self.features
            .get(name)
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }
}

impl Default for F {
    fn default() -> Self {
        F::new()
    }
}

/// An edge feature, with or without a per-target value (§9: the two
/// representations never mix for a single feature).
pub enum EdgeFeature {
    Plain(CSRArray),
    WithValue(CSRArrayWithValues, Option<StringPool>),
}

impl EdgeFeature {
    /// `{target: value}` for `source`, resolving string-coded values
    /// against the attached pool when present. A plain edge feature
    /// synthesizes `None` for every target (ABSENT, §9).
    pub fn get_as_dict(&self, source: NodeId) -> Vec<(NodeId, Option<FeatureValue>)> {
        match self {
            EdgeFeature::Plain(csr) => csr.get(source).into_iter().map(|t| (t, None)).collect(),
            EdgeFeature::WithValue(csr, pool) => csr
                .get_as_dict(source)
                .into_iter()
                .map(|(t, v)| {
                    let value = v.map(|code| match pool {
                        Some(p) => p
                            .string_at(code as usize)
                            .map(|s| FeatureValue::Str(s.to_string()))
                            .unwrap_or(FeatureValue::Int(code)),
                        None => FeatureValue::Int(code),
                    });
                    (t, value)
                })
                .collect(),
        }
    }

    /// The raw target list for `source`, irrespective of values.
    pub fn targets(&self, source: NodeId) -> Vec<NodeId> {
        match self {
            EdgeFeature::Plain(csr) => csr.get(source),
            EdgeFeature::WithValue(csr, _) => csr.get(source).0,
        }
    }

    /// Sources among `sources` with at least one target in `targets`,
    /// paired with the subset of `targets` actually hit. Values play
    /// no part in this test, so both representations share one
    /// implementation over `targets()`.
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
            let mut hit = false;
            for t in self.targets(s) {
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
}

/// The `E` façade: edge features.
pub struct E {
    features: HashMap<String, EdgeFeature>,
}

impl E {
    pub fn new() -> E {
        E { features: HashMap::new() }
    }

    pub fn insert(&mut self, name: &str, feature: EdgeFeature) {
        self.features.insert(name.to_string(), feature);
    }

    pub fn get(&self, name: &str) -> Result<&EdgeFeature> {
        self.features
            .get(name)
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }
}

impl Default for E {
    fn default() -> Self {
        E::new()
    }
}

/// The `C` façade: computed/derived structures. At minimum `levUp` and
/// `levDown` (§4.4, §4.6); named the same way so `C.levUp`/`C.levDown`
/// reads exactly as the spec's notation.
pub struct C<'a> {
    embed: &'a EmbeddingIndex,
}

impl<'a> C<'a> {
    pub fn new(embed: &'a EmbeddingIndex) -> C<'a> {
        C { embed }
    }

    pub fn get(&self, name: &str) -> Result<&'a CSRArray> {
        match name {
            "levUp" => Ok(self.embed.lev_up()),
            "levDown" => Ok(self.embed.lev_down()),
            _ => Err(Error::UnknownFeature(name.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "facade_test.rs"]
mod facade_test;
