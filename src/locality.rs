//! The locality façade `L` (§4.5): containment and ordering navigation
//! built entirely on the embedding index plus the per-type ranges and
//! span table. Every operation is `O(k)` in its result size.

use crate::embed::EmbeddingIndex;
use crate::types::{NodeId, SpanTable, TypeTable};

pub struct Locality<'a> {
    types: &'a TypeTable,
    spans: &'a SpanTable,
    embed: &'a EmbeddingIndex,
}

impl<'a> Locality<'a> {
    pub fn new(types: &'a TypeTable, spans: &'a SpanTable, embed: &'a EmbeddingIndex) -> Self {
        Locality { types, spans, embed }
    }

    /// Containers of `n`. Without `t`, the unique minimal container at
    /// each level above `n`, walked all the way to the top, in
    /// ascending level order. With `t`, only containers of type `t`,
    /// sorted by node id.
    pub fn u(&self, n: NodeId, t: Option<&str>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut frontier = vec![n];
        loop {
            let mut next: Vec<NodeId> = Vec::new();
            for &f in &frontier {
                next.extend(self.embed.lev_up().get(f));
            }
            if next.is_empty() {
                break;
            }
            next.sort_unstable();
            next.dedup();
            out.extend(next.iter().copied());
            frontier = next;
        }
        match t {
            Some(want) => {
                let mut filtered: Vec<NodeId> = out
                    .into_iter()
                    .filter(|&m| self.types.otype(m) == Some(want))
                    .collect();
                filtered.sort_unstable();
                filtered.dedup();
                filtered
            }
            None => out,
        }
    }

    /// Contained nodes of `n`. Without `t`, the maximal contained
    /// nodes at each level below `n`, walked all the way down to
    /// slots. With `t`, contained nodes of type `t` in slot order
    /// (ties broken by node id).
    pub fn d(&self, n: NodeId, t: Option<&str>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut frontier = vec![n];
        loop {
            let mut next: Vec<NodeId> = Vec::new();
            for &f in &frontier {
                next.extend(self.embed.lev_down().get(f));
            }
            if next.is_empty() {
                break;
            }
            next.sort_unstable();
            next.dedup();
            out.extend(next.iter().copied());
            frontier = next;
        }
        match t {
            Some(want) => {
                let mut filtered: Vec<NodeId> = out
                    .into_iter()
                    .filter(|&m| self.types.otype(m) == Some(want))
                    .collect();
                self.sort_by_slot_order(&mut filtered);
                filtered
            }
            None => out,
        }
    }

    /// Next sibling(s): nodes of `n`'s own type (or of `t`) whose
    /// `minSlot` is strictly greater than `maxSlot(n)` and minimal
    /// among such. Empty at the end of the corpus.
    pub fn n(&self, n: NodeId, t: Option<&str>) -> Vec<NodeId> {
        self.sibling(n, t, true)
    }

    /// Previous sibling(s), the mirror of `n`.
    pub fn p(&self, n: NodeId, t: Option<&str>) -> Vec<NodeId> {
        self.sibling(n, t, false)
    }

    fn sibling(&self, n: NodeId, t: Option<&str>, forward: bool) -> Vec<NodeId> {
        let (n_min, n_max) = match self.spans.get(n) {
            Some(s) => s,
            None => return Vec::new(),
        };
        let want_type = match t.or_else(|| self.types.otype(n)) {
            Some(ty) => ty,
            None => return Vec::new(),
        };
        let candidates = self.nodes_of_type(want_type);

        let mut best: Option<(NodeId, NodeId)> = None; // (boundary slot, node id)
        for &m in &candidates {
            if m == n {
                continue;
            }
            let (m_min, m_max) = match self.spans.get(m) {
                Some(s) => s,
                None => continue,
            };
            let qualifies = if forward {
                m_min > n_max
            } else {
                m_max < n_min
            };
            if !qualifies {
                continue;
            }
            let boundary = if forward { m_min } else { m_max };
            match best {
                None => best = Some((boundary, m)),
                Some((b, _)) if (forward && boundary < b) || (!forward && boundary > b) => {
                    best = Some((boundary, m))
                }
                _ => {}
            }
        }

        match best {
            Some((boundary, _)) => {
                let mut winners: Vec<NodeId> = candidates
                    .into_iter()
                    .filter(|&m| {
                        if m == n {
                            return false;
                        }
                        match self.spans.get(m) {
                            Some((m_min, m_max)) => {
                                if forward {
                                    m_min == boundary
                                } else {
                                    m_max == boundary
                                }
                            }
                            None => false,
                        }
                    })
                    .collect();
                winners.sort_unstable();
                winners
            }
            None => Vec::new(),
        }
    }

    fn nodes_of_type(&self, otype: &str) -> Vec<NodeId> {
        if otype == crate::types::SLOT_TYPE {
            return (1..=self.types.max_slot).collect();
        }
        match self.types.range_of(otype) {
            Some(r) => (r.first..=r.last).collect(),
            None => Vec::new(),
        }
    }

    fn sort_by_slot_order(&self, nodes: &mut Vec<NodeId>) {
        nodes.sort_by(|&a, &b| {
            let sa = self.spans.get(a);
            let sb = self.spans.get(b);
            sa.cmp(&sb).then(a.cmp(&b))
        });
    }
}

#[cfg(test)]
#[path = "locality_test.rs"]
mod locality_test;
