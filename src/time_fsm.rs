//! Shared timestamp automaton.
//!
//! The accepted formats are compiled once into a tree of character classes;
//! the scanner walks it byte by byte alongside its other recognisers. Letters
//! and digits match by class, so `may  2 19:00:02` walks the same path as
//! `Jan  2 15:04:05`. Matching is case-insensitive.

use once_cell::sync::Lazy;

/// Accepted timestamp formats, written in Go reference-time notation
/// (`_2` is a digit-or-space day, `-0700` a numeric zone).
pub(crate) const TIME_FORMATS: &[&str] = &[
    "Mon Jan _2 15:04:05 2006",
    "Mon Jan _2 15:04:05 MST 2006",
    "Mon Jan 02 15:04:05 -0700 2006",
    "02 Jan 06 15:04 MST",
    "02 Jan 06 15:04 -0700",
    "Monday, 02-Jan-06 15:04:05 MST",
    "Mon, 02 Jan 2006 15:04:05 MST",
    "Mon, 02 Jan 2006 15:04:05 -0700",
    "2006-01-02T15:04:05Z07:00",
    "2006-01-02T15:04:05.999999999Z07:00",
    "Jan _2 15:04:05",
    "Jan _2 15:04:05.000",
    "Jan _2 15:04:05.000000",
    "Jan _2 15:04:05.000000000",
    "Jan 2 15:04:05",
    "_2/Jan/2006:15:04:05 -0700",
    "Jan 2, 2006 3:04:05 PM",
    "Jan 2 2006 15:04:05",
    "Jan 2 15:04:05 2006",
    "Jan 2 15:04:05 -0700",
    "2006-01-02 15:04:05,000 -0700",
    "2006-01-02 15:04:05 -0700",
    "2006-01-02 15:04:05-0700",
    "2006-01-02 15:04:05,000",
    "2006-01-02 15:04:05",
    "2006/01/02 15:04:05",
    "06-01-02 15:04:05,000 -0700",
    "06-01-02 15:04:05,000",
    "06-01-02 15:04:05",
    "06/01/02 15:04:05",
    "15:04:05,000",
    "1/2/2006 3:04:05 PM",
    "1/2/06 3:04:05.000 PM",
    "1/2/2006 15:04",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    Root,
    Digit,
    Letter,
    Literal,
    Space,
    DigitOrSpace,
    PlusOrMinus,
}

#[derive(Debug)]
pub(crate) struct TimeNode {
    class: CharClass,
    value: u8,
    terminal: bool,
    children: Vec<TimeNode>,
}

pub(crate) static TIME_FSM: Lazy<TimeNode> = Lazy::new(build_time_fsm);

fn class_of(c: char) -> CharClass {
    match c {
        '0'..='9' => CharClass::Digit,
        'a'..='z' | 'A'..='Z' => CharClass::Letter,
        ' ' => CharClass::Space,
        '_' => CharClass::DigitOrSpace,
        '+' | '-' => CharClass::PlusOrMinus,
        _ => CharClass::Literal,
    }
}

fn build_time_fsm() -> TimeNode {
    let mut root = TimeNode {
        class: CharClass::Root,
        value: 0,
        terminal: false,
        children: Vec::new(),
    };

    for format in TIME_FORMATS {
        let mut parent = &mut root;
        for b in format.to_ascii_lowercase().bytes() {
            let class = class_of(b as char);

            let mut found = None;
            for (i, child) in parent.children.iter_mut().enumerate() {
                let merges = (child.class == class
                    && (class != CharClass::Literal || child.value == b))
                    || (child.class == CharClass::DigitOrSpace
                        && matches!(class, CharClass::Digit | CharClass::Space));
                if merges {
                    found = Some(i);
                    break;
                }
                // A digit position widened by a later `_` format.
                if child.class == CharClass::Digit && class == CharClass::DigitOrSpace {
                    child.class = CharClass::DigitOrSpace;
                    found = Some(i);
                    break;
                }
            }

            let idx = match found {
                Some(i) => i,
                None => {
                    parent.children.push(TimeNode {
                        class,
                        value: b,
                        terminal: false,
                        children: Vec::new(),
                    });
                    parent.children.len() - 1
                }
            };
            parent = &mut parent.children[idx];
        }
        parent.terminal = true;
    }

    root
}

impl TimeNode {
    /// Advances one input character, or `None` if no transition accepts it.
    pub fn step(&self, c: char) -> Option<&TimeNode> {
        let class = class_of(c);
        self.children.iter().find(|child| {
            (child.class == CharClass::DigitOrSpace
                && matches!(class, CharClass::Digit | CharClass::Space))
                || (child.class == class
                    && (class != CharClass::Literal || child.value as char == c))
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Byte length of the longest prefix of `s` ending on a terminal node.
    #[cfg(test)]
    pub fn longest_match(&self, s: &str) -> usize {
        let mut node = self;
        let mut best = 0;
        for (i, c) in s.char_indices() {
            match node.step(c) {
                Some(next) => {
                    node = next;
                    if node.terminal {
                        best = i + c.len_utf8();
                    }
                }
                None => break,
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syslog_timestamps() {
        assert_eq!(TIME_FSM.longest_match("jan 12 06:49:42 irc sshd"), 15);
        assert_eq!(TIME_FSM.longest_match("may  2 19:00:02 dlfssrv"), 15);
        assert_eq!(TIME_FSM.longest_match("mar 01 09:42:03.875 pffbisvr"), 19);
    }

    #[test]
    fn single_space_day() {
        assert_eq!(TIME_FSM.longest_match("may 2 15:51:24 dlfssrv"), 14);
    }

    #[test]
    fn iso_and_slash_formats() {
        assert_eq!(TIME_FSM.longest_match("2012-04-05 17:54:47 rest"), 19);
        assert_eq!(TIME_FSM.longest_match("2006/01/02 15:04:05"), 19);
        assert_eq!(TIME_FSM.longest_match("4/5/2012 17:55,172.23.1.101"), 14);
    }

    #[test]
    fn apache_clf_timestamp() {
        assert_eq!(TIME_FSM.longest_match("16/jan/2003:21:22:59 -0500] rest"), 26);
    }

    #[test]
    fn greedy_prefers_longer_terminal() {
        // Both `jan 2 15:04:05` and `jan 2 15:04:05 2006` are accepted.
        assert_eq!(TIME_FSM.longest_match("jan 2 15:04:05 2006 x"), 19);
    }

    #[test]
    fn case_insensitive_letters() {
        assert_eq!(TIME_FSM.longest_match("JAN 12 06:49:42 rest"), 15);
    }

    #[test]
    fn no_match_on_plain_words() {
        assert_eq!(TIME_FSM.longest_match("irc sshd"), 0);
        assert_eq!(TIME_FSM.longest_match("duration 0:09:23"), 0);
    }
}
