//! Pattern discovery trie.
//!
//! Sequences are ingested into levels (depth 0 = first token). Every level
//! carries a fixed slot prefix: slot 0 is the leaf sentinel, slots
//! `1..numFieldKinds` index by field kind, the following slots by token
//! kind; literal nodes are appended after the prefix and found through a
//! per-level value map. Parent/child links across adjacent levels are
//! bitsets over slot indices.
//!
//! `finalize` merges sibling literals that share at least one parent and one
//! child into a single free-string node, then compacts the levels and
//! freezes the trie. `analyze` is a depth-first best-scoring walk.

use ahash::AHashMap;

use crate::bitset::BitSet;
use crate::error::{Error, Result};
use crate::sequence::Sequence;
use crate::tokens::{match_weight, FieldKind, Token, TokenKind, MIN_FIXED_SLOTS, NUM_FIELD_KINDS};

#[derive(Debug, Clone)]
struct Node {
    token: Token,
    slot: usize,
    is_key: bool,
    leaf: bool,
    parents: BitSet,
    children: BitSet,
}

impl Node {
    fn new(token: Token, slot: usize) -> Node {
        Node {
            token,
            slot,
            is_key: false,
            leaf: false,
            parents: BitSet::new(),
            children: BitSet::new(),
        }
    }
}

/// Append-only while ingesting; frozen once [`Analyzer::finalize`] has run.
///
/// `add` and `finalize` need `&mut self`, `analyze` is `&self`, so a frozen
/// analyzer can be shared across threads (`Arc`) or guarded by an `RwLock`
/// while still being fed.
#[derive(Debug, Default)]
pub struct Analyzer {
    levels: Vec<Vec<Option<Node>>>,
    litmaps: Vec<AHashMap<String, usize>>,
    root_children: BitSet,
    finalized: bool,
}

impl Analyzer {
    pub fn new() -> Analyzer {
        Analyzer::default()
    }

    /// Ingests one token sequence into the trie.
    pub fn add(&mut self, seq: &Sequence) {
        assert!(!self.finalized, "analyzer is frozen after finalize");
        if seq.is_empty() {
            return;
        }

        // One spare level past the deepest token keeps child lookups in
        // bounds during the walk.
        while self.levels.len() < seq.len() + 1 {
            self.levels.push(vec![None; MIN_FIXED_SLOTS]);
            self.litmaps.push(AHashMap::new());
        }

        let mut parent: Option<usize> = None;

        for (i, token) in seq.iter().enumerate() {
            let slot = if token.field != FieldKind::Unknown {
                // A recognized semantic field goes into its fixed slot.
                let slot = token.field as usize;
                if self.levels[i][slot].is_none() {
                    self.levels[i][slot] = Some(Node::new(token.clone(), slot));
                }
                slot
            } else if token.kind != TokenKind::Unknown && token.kind != TokenKind::Literal {
                // A non-literal kind stands for changing values; fixed slot.
                let slot = NUM_FIELD_KINDS + token.kind as usize;
                if self.levels[i][slot].is_none() {
                    self.levels[i][slot] = Some(Node::new(token.clone(), slot));
                }
                slot
            } else {
                // A literal we cannot yet tell apart from a variable; track
                // it in the level's literal map.
                match self.litmaps[i].get(&token.value).copied() {
                    Some(slot) => slot,
                    None => {
                        let slot = self.levels[i].len();
                        let mut node = Node::new(token.clone(), slot);
                        node.is_key = token.is_key;
                        self.levels[i].push(Some(node));
                        self.litmaps[i].insert(token.value.clone(), slot);
                        slot
                    }
                }
            };

            match parent {
                None => {
                    self.root_children.set(slot);
                    if let Some(node) = self.levels[i][slot].as_mut() {
                        node.parents.set(0);
                    }
                }
                Some(prev_slot) => {
                    if let Some(node) = self.levels[i][slot].as_mut() {
                        node.parents.set(prev_slot);
                    }
                    if let Some(node) = self.levels[i - 1][prev_slot].as_mut() {
                        node.children.set(slot);
                    }
                }
            }

            parent = Some(slot);
        }

        // The last node ends a pattern: flag it and link it to the leaf
        // sentinel slot.
        if let Some(slot) = parent {
            if let Some(node) = self.levels[seq.len() - 1][slot].as_mut() {
                node.leaf = true;
                node.children.set(0);
            }
        }
    }

    /// Merges generalizable sibling literals and compacts the levels. Must
    /// be called exactly once, after the last `add` and before the first
    /// `analyze`.
    pub fn finalize(&mut self) {
        assert!(!self.finalized, "finalize must be called exactly once");
        self.merge();
        self.compact();
        self.finalized = true;
    }

    /// Walks the trie for the best-scoring leaf path and returns the input
    /// rewritten through the matched node templates.
    pub fn analyze(&self, seq: &Sequence) -> Result<Sequence> {
        assert!(self.finalized, "analyze requires a finalized analyzer");
        let path = self.best_path(seq)?;

        let mut out = Vec::with_capacity(seq.len());
        for (input, (level, slot)) in seq.iter().zip(path) {
            let node = self.levels[level][slot]
                .as_ref()
                .expect("matched path references live nodes");
            let mut token = node.token.clone();
            token.value = input.value.clone();
            token.is_key = input.is_key;
            token.is_value = input.is_value;
            out.push(token);
        }
        Ok(Sequence(out))
    }

    /// Number of populated trie levels.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    fn merge(&mut self) {
        for i in 0..self.levels.len() {
            for j in MIN_FIXED_SLOTS..self.levels[i].len() {
                let skip = match &self.levels[i][j] {
                    None => true,
                    Some(node) => {
                        (node.token.kind == TokenKind::Literal && node.token.value.len() == 1)
                            || node.is_key
                    }
                };
                if skip {
                    continue;
                }

                let merge_set = self.merge_set(i, j);
                if merge_set.count() <= 1 {
                    continue;
                }

                tracing::debug!(
                    depth = i,
                    survivor = j,
                    merged = merge_set.count() - 1,
                    "merging sibling literals"
                );

                let victims: Vec<usize> = merge_set.ones().filter(|&k| k > j).collect();
                for k in victims {
                    let removed = match self.levels[i][k].take() {
                        Some(node) => node,
                        None => continue,
                    };

                    {
                        let cur = self.levels[i][j]
                            .as_mut()
                            .expect("merge survivor outlives the pass");
                        cur.parents.union_with(&removed.parents);
                        cur.children.union_with(&removed.children);
                        cur.leaf = cur.leaf || removed.leaf;
                    }

                    // Every neighbour that pointed at the removed node now
                    // points at the survivor.
                    if i == 0 {
                        self.root_children.clear(k);
                        self.root_children.set(j);
                    } else {
                        for l in removed.parents.ones() {
                            if let Some(p) = self.levels[i - 1][l].as_mut() {
                                p.children.clear(k);
                                p.children.set(j);
                            }
                        }
                    }
                    if i + 1 < self.levels.len() {
                        for l in removed.children.ones() {
                            if let Some(c) = self.levels[i + 1][l].as_mut() {
                                c.parents.clear(k);
                                c.parents.set(j);
                            }
                        }
                    }
                }

                if let Some(cur) = self.levels[i][j].as_mut() {
                    // The survivor no longer stands for one fixed string,
                    // nor for a fixed key.
                    cur.token.kind = TokenKind::String;
                    cur.is_key = false;
                }
            }
        }
    }

    /// Slots at level `i` beyond `j` holding literal or string nodes that
    /// share at least one parent and at least one child with slot `j`,
    /// plus `j` itself.
    fn merge_set(&self, i: usize, j: usize) -> BitSet {
        let level = &self.levels[i];
        let cur = level[j].as_ref().expect("caller checked the survivor");

        let mut share_parents = BitSet::new();
        let mut share_children = BitSet::new();
        share_parents.set(j);
        share_children.set(j);

        for (k, other) in level.iter().enumerate().skip(j + 1) {
            let Some(other) = other else { continue };
            if !matches!(other.token.kind, TokenKind::Literal | TokenKind::String) {
                continue;
            }
            if other.token.kind == TokenKind::Literal && other.token.value.len() == 1 {
                continue;
            }
            if cur.parents.intersection_count(&other.parents) > 0 {
                share_parents.set(k);
            }
            if cur.children.intersection_count(&other.children) > 0 {
                share_children.set(k);
            }
        }

        let mut out = BitSet::new();
        for k in share_parents.ones() {
            if share_children.test(k) {
                out.set(k);
            }
        }
        out
    }

    fn compact(&mut self) {
        let old_levels = std::mem::take(&mut self.levels);
        let level_count = old_levels.len();

        // Pass 1: pack out removed slots. The fixed prefix is kept verbatim
        // so index-by-kind stays valid; literal slots shift down.
        let mut slot_maps: Vec<Vec<Option<usize>>> = Vec::with_capacity(level_count);
        let mut new_levels: Vec<Vec<Option<Node>>> = Vec::with_capacity(level_count);
        let mut new_litmaps: Vec<AHashMap<String, usize>> = vec![AHashMap::new(); level_count];

        for (i, level) in old_levels.into_iter().enumerate() {
            let mut map = vec![None; level.len()];
            let mut packed: Vec<Option<Node>> = Vec::with_capacity(level.len());
            for (j, entry) in level.into_iter().enumerate() {
                if j < MIN_FIXED_SLOTS {
                    map[j] = Some(j);
                    packed.push(entry.map(|mut node| {
                        node.slot = j;
                        node
                    }));
                } else if let Some(mut node) = entry {
                    let slot = packed.len();
                    node.slot = slot;
                    map[j] = Some(slot);
                    if node.token.kind == TokenKind::Literal {
                        new_litmaps[i].insert(node.token.value.clone(), slot);
                    }
                    packed.push(Some(node));
                }
            }
            slot_maps.push(map);
            new_levels.push(packed);
        }

        // Pass 2: retranslate every bitset through the neighbour level's
        // slot map and drop sample values from non-literal nodes.
        for i in 0..level_count {
            for slot in 0..new_levels[i].len() {
                let Some(mut node) = new_levels[i][slot].take() else {
                    continue;
                };

                let mut parents = BitSet::new();
                if i == 0 {
                    parents.set(0);
                } else {
                    for k in node.parents.ones() {
                        let mapped = slot_maps[i - 1].get(k).copied().flatten();
                        assert!(mapped.is_some(), "parent link to a removed slot");
                        if let Some(m) = mapped {
                            parents.set(m);
                        }
                    }
                }

                let mut children = BitSet::new();
                if i + 1 < level_count {
                    for k in node.children.ones() {
                        let mapped = slot_maps[i + 1].get(k).copied().flatten();
                        assert!(mapped.is_some(), "child link to a removed slot");
                        if let Some(m) = mapped {
                            children.set(m);
                        }
                    }
                }

                node.parents = parents;
                node.children = children;
                if node.token.kind != TokenKind::Literal {
                    node.token.value.clear();
                }
                new_levels[i][slot] = Some(node);
            }
        }

        let mut root_children = BitSet::new();
        for k in self.root_children.ones() {
            if let Some(m) = slot_maps
                .first()
                .and_then(|map| map.get(k))
                .copied()
                .flatten()
            {
                root_children.set(m);
            }
        }

        self.root_children = root_children;
        self.levels = new_levels;
        self.litmaps = new_litmaps;
    }

    /// Depth-first best-scoring walk. Returns `(level, slot)` per input
    /// token. Ties resolve to the earliest completed candidate.
    fn best_path(&self, seq: &Sequence) -> Result<Vec<(usize, usize)>> {
        struct Visit {
            node: Option<(usize, usize)>,
            depth: usize,
            score: i32,
        }

        let n = seq.len();
        let mut path: Vec<(usize, usize)> = vec![(0, 0); n + 1];
        let mut best: Option<(Vec<(usize, usize)>, i32)> = None;

        let mut stack = Vec::with_capacity(64);
        stack.push(Visit {
            node: None,
            depth: 0,
            score: 0,
        });

        while let Some(visit) = stack.pop() {
            if let Some(at) = visit.node {
                if visit.depth <= n {
                    path[visit.depth] = at;
                }
            }

            if visit.depth >= n {
                let is_leaf = visit.node.is_some_and(|(level, slot)| {
                    self.levels[level][slot]
                        .as_ref()
                        .is_some_and(|node| node.leaf)
                });
                if is_leaf {
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, score)| visit.score > *score);
                    if better {
                        best = Some((path[1..=n].to_vec(), visit.score));
                    }
                }
                continue;
            }

            let token = &seq[visit.depth];
            let (children, child_level) = match visit.node {
                None => (&self.root_children, 0),
                Some((level, slot)) => {
                    let node = self.levels[level][slot]
                        .as_ref()
                        .expect("visited nodes are live");
                    (&node.children, level + 1)
                }
            };
            if child_level >= self.levels.len() {
                continue;
            }

            for bit in children.ones() {
                let Some(Some(child)) = self.levels[child_level].get(bit) else {
                    continue;
                };
                if let Some(weight) = match_weight(&child.token, token) {
                    stack.push(Visit {
                        node: Some((child_level, bit)),
                        depth: visit.depth + 1,
                        score: visit.score + weight,
                    });
                }
            }
        }

        best.map(|(path, _)| path).ok_or(Error::NoMatch)
    }
}
