use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::tokens::{FieldKind, Token, TokenKind};

/// An ordered list of tokens, as produced by the scanner and rewritten by the
/// analyzer and parser.
///
/// `Display` renders the pattern string: per token the field placeholder if
/// the field is known, else the kind placeholder if the kind is not literal,
/// else the literal value, joined by single spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence(pub Vec<Token>);

impl Sequence {
    pub fn new() -> Sequence {
        Sequence::default()
    }

    /// Coarse structural fingerprint: the kind placeholder of every
    /// non-literal, non-string token plus the raw value of single-byte
    /// literals, concatenated.
    pub fn signature(&self) -> String {
        let mut sig = String::new();
        for token in &self.0 {
            match token.kind {
                TokenKind::Unknown | TokenKind::String => {}
                TokenKind::Literal => {
                    if token.value.len() == 1 {
                        sig.push_str(&token.value);
                    }
                }
                kind => sig.push_str(kind.placeholder()),
            }
        }
        sig
    }

    /// One token per line, for the `scan` command.
    pub fn long_string(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("# {i:3}: {token}"));
        }
        out
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in &self.0 {
            let piece = if token.field != FieldKind::Unknown {
                token.field.placeholder()
            } else if token.kind != TokenKind::Unknown && token.kind != TokenKind::Literal {
                token.kind.placeholder()
            } else if token.kind == TokenKind::Literal {
                token.value.as_str()
            } else {
                continue;
            };
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(piece)?;
            first = false;
        }
        Ok(())
    }
}

impl Deref for Sequence {
    type Target = Vec<Token>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Sequence {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Token>> for Sequence {
    fn from(tokens: Vec<Token>) -> Sequence {
        Sequence(tokens)
    }
}

impl IntoIterator for Sequence {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
