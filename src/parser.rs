//! Classification trie over a fixed set of known patterns.
//!
//! Each node carries one token template; children are keyed by the field
//! placeholder if the token names a known field, else the kind placeholder
//! for non-literal kinds, else the literal value. Matching reuses the
//! analyzer's scoring rules; a field placeholder with a range consumes that
//! many adjacent input tokens.

use ahash::AHashMap;

use crate::error::{Error, Result};
use crate::sequence::Sequence;
use crate::tokens::{match_weight, FieldKind, Token, TokenKind};

#[derive(Debug)]
struct ParseNode {
    token: Token,
    leaf: bool,
    /// Child ids in insertion order; keeps the depth-first walk and its
    /// tie-breaking deterministic.
    children: Vec<usize>,
    index: AHashMap<String, usize>,
}

impl ParseNode {
    fn new(token: Token) -> ParseNode {
        ParseNode {
            token,
            leaf: false,
            children: Vec::new(),
            index: AHashMap::new(),
        }
    }
}

fn child_key(token: &Token) -> String {
    if token.field != FieldKind::Unknown {
        token.field.placeholder().to_string()
    } else if token.kind != TokenKind::Unknown && token.kind != TokenKind::Literal {
        token.kind.placeholder().to_string()
    } else {
        token.value.clone()
    }
}

/// Append-only pattern trie. `add` takes `&mut self`; `parse` is `&self`, so
/// a built parser can serve concurrent readers (e.g. behind an `Arc` across
/// a worker pool, or an `RwLock` when patterns are still being added).
#[derive(Debug)]
pub struct Parser {
    nodes: Vec<ParseNode>,
    height: usize,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            nodes: vec![ParseNode::new(Token::default())],
            height: 0,
        }
    }

    /// Inserts one pattern sequence, marking its terminal node as a leaf.
    pub fn add(&mut self, seq: &Sequence) {
        let mut cur = 0;
        for token in seq {
            let key = child_key(token);
            let next = match self.nodes[cur].index.get(&key).copied() {
                Some(id) => id,
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(ParseNode::new(token.clone()));
                    self.nodes[cur].index.insert(key, id);
                    self.nodes[cur].children.push(id);
                    id
                }
            };
            cur = next;
        }
        self.nodes[cur].leaf = true;
        if seq.len() > self.height {
            self.height = seq.len();
        }
    }

    /// Longest pattern added so far, in tokens.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Classifies a message against the known patterns, returning the input
    /// rewritten through the best-scoring pattern's token templates.
    pub fn parse(&self, seq: &Sequence) -> Result<Sequence> {
        struct Frame {
            id: usize,
            depth: usize,
            pos: usize,
            score: i32,
            start: usize,
            take: usize,
        }

        let n = seq.len();
        // (node id, first consumed input token, tokens consumed) per depth.
        let mut path: Vec<(usize, usize, usize)> = vec![(0, 0, 0); n + 1];
        let mut best: Option<(Vec<(usize, usize, usize)>, i32)> = None;

        let mut stack = Vec::with_capacity(64);
        stack.push(Frame {
            id: 0,
            depth: 0,
            pos: 0,
            score: 0,
            start: 0,
            take: 0,
        });

        while let Some(frame) = stack.pop() {
            if frame.depth <= n {
                path[frame.depth] = (frame.id, frame.start, frame.take);
            }

            if frame.pos >= n {
                if self.nodes[frame.id].leaf {
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, score)| frame.score > *score);
                    if better {
                        best = Some((path[1..=frame.depth].to_vec(), frame.score));
                    }
                }
                continue;
            }

            let token = &seq[frame.pos];
            for &child_id in &self.nodes[frame.id].children {
                let child = &self.nodes[child_id];
                let Some(weight) = match_weight(&child.token, token) else {
                    continue;
                };
                let take = child.token.range.max(1);
                if frame.pos + take > n {
                    continue;
                }
                stack.push(Frame {
                    id: child_id,
                    depth: frame.depth + 1,
                    pos: frame.pos + take,
                    score: frame.score + weight,
                    start: frame.pos,
                    take,
                });
            }
        }

        let (path, _) = best.ok_or(Error::NoMatch)?;

        let mut out = Vec::with_capacity(path.len());
        for &(id, start, take) in &path {
            let mut token = self.nodes[id].token.clone();
            if take <= 1 {
                token.value = seq[start].value.clone();
                token.is_key = seq[start].is_key;
                token.is_value = seq[start].is_value;
            } else {
                // A ranged placeholder swallowed several tokens; rejoin
                // their surface values.
                let values: Vec<&str> = seq[start..start + take]
                    .iter()
                    .map(|t| t.value.as_str())
                    .collect();
                token.value = values.join(" ");
                token.is_key = false;
                token.is_value = seq[start].is_value;
            }
            out.push(token);
        }
        Ok(Sequence(out))
    }
}
