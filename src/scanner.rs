//! Sequential lexer. Breaks a log message into a sequence of typed tokens
//! without regular expressions: a generic character-class automaton, a
//! positional MAC matcher and the shared time FSM advance in lock step over
//! the input, and a small state machine recognises key=value pairs,
//! including values spanning several tokens inside quotes or brackets.

use crate::error::{Error, Result};
use crate::sequence::Sequence;
use crate::time_fsm::TIME_FSM;
use crate::tokens::{FieldKind, Token, TokenKind};

/// Stateless scanner; one instance can serve any number of messages.
///
/// # Example
///
/// `Jan 12 06:49:42 irc sshd[7034]: Failed password for root from
/// 218.161.81.238 port 4228 ssh2` scans to a timestamp token, literals,
/// an integer (`7034`), an IPv4 address and the port integer, and
/// `smac=00:0b:5f:b2:1d:80` scans to a literal key, a `=` literal and a
/// MAC token marked as the pair's value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Scanner {
        Scanner
    }

    /// Tokenizes a message. Fails on blank input and on input no recogniser
    /// understands.
    pub fn scan(&self, data: &str) -> Result<Sequence> {
        let data = data.trim();
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut t = Tokenizer::new(data);
        while t.scan_one()? {}
        Ok(Sequence(t.tokens))
    }
}

struct Tokenizer<'a> {
    data: &'a str,
    tokens: Vec<Token>,

    // per-token state
    kind: TokenKind,
    stop: bool,
    dots: usize,

    // per-message state
    prev: Token,
    single: bool,
    double: bool,
    square: bool,
    angle: bool,
    cursor: usize,
    next_is_value: bool,
    // distance of the current value token from its `=`, in tokens
    #[allow(dead_code)]
    value_distance: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(data: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            data,
            tokens: Vec::with_capacity(20),
            kind: TokenKind::Unknown,
            stop: false,
            dots: 0,
            prev: Token::default(),
            single: false,
            double: false,
            square: false,
            angle: false,
            cursor: 0,
            next_is_value: false,
            value_distance: 0,
        }
    }

    fn inside_quote(&self) -> bool {
        self.single || self.double || self.square || self.angle
    }

    fn push(&mut self, token: Token) {
        self.prev = token.clone();
        self.tokens.push(token);
    }

    /// Produces the next token; returns false at end of input.
    fn scan_one(&mut self) -> Result<bool> {
        let data = self.data;
        if self.cursor >= data.len() {
            return Ok(false);
        }

        // Number of bytes of whitespace skipped before this token.
        let nss: usize = data[self.cursor..]
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        self.cursor += nss;

        let rest = &data[self.cursor..];
        if rest.is_empty() {
            return Ok(false);
        }

        let (mut len, kind) = self.scan_token(rest);
        if kind == TokenKind::Unknown {
            return Err(Error::UnknownToken {
                offset: self.cursor,
                fragment: rest.chars().take(32).collect(),
            });
        }

        while len > 0 && rest.as_bytes()[len - 1] == b' ' {
            len -= 1;
        }

        let raw = &rest[..len];
        self.cursor += len;

        let value = match kind {
            TokenKind::Mac | TokenKind::Literal | TokenKind::Url | TokenKind::Timestamp => {
                raw.to_lowercase()
            }
            _ => raw.to_string(),
        };

        let mut token = Token::new(kind, value);

        if token.value.len() >= 2 && token.value.starts_with('%') && token.value.ends_with('%') {
            if self.resolve_placeholder(&mut token)? {
                self.push(token);
                return Ok(true);
            }
        }

        self.key_value_step(nss, token);
        Ok(true)
    }

    /// Interprets a `%name%` or `%name-N%` surface value. Returns true when
    /// the name resolved to a known field or token kind and the token was
    /// fully typed.
    fn resolve_placeholder(&mut self, token: &mut Token) -> Result<bool> {
        let mut name = token.value.clone();
        let inner = &token.value[..token.value.len() - 1];
        if let Some((head, count)) = inner.split_once('-') {
            let n: usize = count.parse().map_err(|_| Error::InvalidCount {
                placeholder: token.value.clone(),
            })?;
            token.range = n;
            name = format!("{head}%");
        }

        let field = FieldKind::from_placeholder(&name);
        if field != FieldKind::Unknown {
            token.field = field;
            token.kind = field.token_kind();
            return Ok(true);
        }

        let kind = TokenKind::from_placeholder(&name);
        if kind != TokenKind::Unknown {
            token.kind = kind;
            token.field = FieldKind::Unknown;
            return Ok(true);
        }

        Ok(false)
    }

    /// The key=value state machine applied after a normal token is produced.
    fn key_value_step(&mut self, nss: usize, mut token: Token) {
        if nss == 0 && token.value == "=" && !self.next_is_value {
            // "abc=": the previous token is a key and the next is its value.
            if let Some(last) = self.tokens.last_mut() {
                last.is_key = true;
                last.kind = TokenKind::Literal;
                last.is_value = false;
                self.next_is_value = true;
            }
        } else if self.next_is_value {
            match token.value.as_str() {
                "\"" => {
                    if self.double {
                        self.double = false;
                        self.value_distance = 0;
                        self.next_is_value = false;
                    } else {
                        self.double = true;
                        self.value_distance = 1;
                    }
                }
                "<" => {
                    self.angle = true;
                    self.value_distance = 1;
                }
                ">" => {
                    self.angle = false;
                    self.value_distance = 0;
                    self.next_is_value = false;
                }
                "[" => {
                    self.square = true;
                    self.value_distance = 1;
                }
                "]" => {
                    self.square = false;
                    self.value_distance = 0;
                    self.next_is_value = false;
                }
                _ => {
                    let inside = self.inside_quote();
                    if let Some(last) = self.tokens.last_mut() {
                        if last.is_value {
                            // Still inside the quoted value: extend it.
                            if nss > 0 {
                                last.value.push(' ');
                            }
                            last.value.push_str(&token.value);
                            self.prev = last.clone();
                            if inside {
                                self.value_distance += 1;
                            }
                            return;
                        }
                    }

                    token.is_value = true;
                    if token.kind == TokenKind::Literal {
                        token.kind = TokenKind::String;
                    }
                    if !inside {
                        self.next_is_value = false;
                        self.value_distance = 0;
                    }
                }
            }
        } else if nss == 0 && self.prev.value == "=" {
            // "=def" with no key expectation: glue onto the "=" literal.
            if let Some(last) = self.tokens.last_mut() {
                last.value.push_str(&token.value);
                self.prev = last.clone();
                self.next_is_value = false;
                self.value_distance = 0;
                return;
            }
        }

        self.push(token);
    }

    /// Runs the three recognisers over `data` and returns the byte length and
    /// kind of the next token. Precedence on stop: MAC, then timestamp, then
    /// the generic kind; a single-byte literal if nothing made progress.
    fn scan_token(&mut self, data: &str) -> (usize, TokenKind) {
        let mut time_node = &*TIME_FSM;
        let mut time_stop = false;
        let mut mac_stop = false;
        let mut time_len = 0usize;
        let mut token_len = 0usize;

        self.dots = 0;
        self.kind = TokenKind::Unknown;
        self.stop = false;

        for (i, c) in data.char_indices() {
            let end = i + c.len_utf8();

            if !self.stop {
                self.token_step(i, c);
                if !self.stop {
                    token_len = end;
                }
            }

            if !mac_stop {
                let (is_mac, stopped) = mac_step(i, c);
                mac_stop = stopped;
                if is_mac && stopped {
                    return (end, TokenKind::Mac);
                }
            }

            if !time_stop {
                match time_node.step(c) {
                    Some(next) => {
                        time_node = next;
                        if next.is_terminal() && end > time_len {
                            time_len = end;
                        }
                    }
                    None => {
                        time_stop = true;
                        if time_len > 0 {
                            return (time_len, TokenKind::Timestamp);
                        }
                    }
                }
            }

            if self.stop && time_stop && mac_stop {
                if token_len == 0 {
                    // Not a word, not a timestamp, not spaces: a single
                    // character literal.
                    let first = data.chars().next().map_or(1, char::len_utf8);
                    return (first, TokenKind::Literal);
                }
                return (token_len, self.kind);
            }
        }

        (data.len(), self.kind)
    }

    fn token_step(&mut self, index: usize, r: char) {
        if self.kind == TokenKind::Url {
            if (index == 1 && (r == 't' || r == 'T'))
                || (index == 2 && (r == 't' || r == 'T'))
                || (index == 3 && (r == 'p' || r == 'P'))
                || (index == 4 && (r == 's' || r == 'S'))
                || ((index == 4 || index == 5) && r == ':')
                || ((index == 5 || index == 6) && r == '/')
                || ((index == 6 || index == 7) && r == '/')
                || (index >= 6 && !r.is_whitespace())
            {
                // still inside the URL
            } else if r.is_whitespace() {
                self.stop = true;
            } else {
                self.kind = TokenKind::Literal;
            }
        } else if index == 0 && (r == 'h' || r == 'H') {
            self.kind = TokenKind::Url;
        } else if r.is_ascii_alphabetic()
            || matches!(r, '-' | '_' | '/' | '#' | '\\' | '%' | '*' | '@' | '$' | '?')
        {
            if r == '/' {
                if self.kind == TokenKind::Ipv4 {
                    self.stop = true;
                } else if self.prev.kind == TokenKind::Ipv4 {
                    self.kind = TokenKind::Literal;
                    self.stop = true;
                } else {
                    self.kind = TokenKind::Literal;
                }
            } else {
                self.kind = TokenKind::Literal;
            }
        } else if r.is_ascii_digit() {
            if self.kind == TokenKind::Integer || index == 0 {
                self.kind = TokenKind::Integer;
            } else if self.kind == TokenKind::Ipv4 && self.dots < 4 {
                self.kind = TokenKind::Ipv4;
            } else if self.kind == TokenKind::Float && self.dots == 1 {
                self.kind = TokenKind::Float;
            } else {
                self.kind = TokenKind::Literal;
            }
        } else if r == '.' {
            self.dots += 1;
            if self.kind == TokenKind::Integer && self.dots == 1 {
                self.kind = TokenKind::Float;
            } else if (self.dots > 1 && self.kind == TokenKind::Float)
                || (self.dots < 4 && self.kind == TokenKind::Ipv4)
            {
                self.kind = TokenKind::Ipv4;
            } else {
                self.kind = TokenKind::Literal;
            }
        } else if r == '\'' {
            if index == 0 && !self.single {
                self.single = true;
                self.stop = true;
            } else if index != 0 && self.single {
                self.stop = true;
            } else if index == 0 && self.single {
                self.single = false;
                self.stop = true;
            } else {
                self.kind = TokenKind::Literal;
            }
        } else if !self.single {
            // Inside a single-quoted run everything up to the closing quote
            // belongs to one literal, spaces included.
            self.stop = true;
        }

        if self.stop
            && ((self.kind == TokenKind::Ipv4 && self.dots != 3)
                || (self.kind == TokenKind::Float && self.dots != 1))
        {
            self.kind = TokenKind::Literal;
        }
    }
}

/// Positional matcher for `HH:HH:HH:HH:HH:HH`. Returns (still a MAC, stop).
fn mac_step(index: usize, r: char) -> (bool, bool) {
    match index {
        0 | 1 | 3 | 4 | 6 | 7 | 9 | 10 | 12 | 13 | 15 if r.is_ascii_hexdigit() => (true, false),
        2 | 5 | 8 | 11 | 14 if r == ':' => (true, false),
        16 if r.is_ascii_hexdigit() => (true, true),
        _ => (false, true),
    }
}
