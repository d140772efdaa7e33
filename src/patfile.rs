//! Pattern file loading.
//!
//! One pattern per non-empty, non-`#` line; tokens separated by whitespace;
//! placeholders written `%name%` with an optional `-N` range suffix. The
//! `analyze` command emits this same grammar, so its output can be fed back
//! in as a pattern file.

use std::io::BufRead;

use crate::error::Result;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::sequence::Sequence;

/// Reads every pattern line of `reader` into a scanned sequence.
pub fn read_patterns<R: BufRead>(reader: R) -> Result<Vec<Sequence>> {
    let scanner = Scanner::new();
    let mut patterns = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        patterns.push(scanner.scan(line)?);
    }
    Ok(patterns)
}

/// Builds a parser preloaded with the patterns of `reader`.
pub fn build_parser<R: BufRead>(reader: R) -> Result<Parser> {
    let mut parser = Parser::new();
    for pattern in read_patterns(reader)? {
        parser.add(&pattern);
    }
    Ok(parser)
}
