//! One concrete instance per accepted timestamp shape, checked through the
//! public scanner: the first token must be the whole timestamp (lowercased)
//! and scanning must resume cleanly after it.

use seqscope::scanner::Scanner;
use seqscope::sequence::Sequence;
use seqscope::tokens::TokenKind;

fn scan(msg: &str) -> Sequence {
    Scanner::new().scan(msg).expect("message scans")
}

#[test]
fn accepted_formats() {
    let timestamps = [
        "tue jan  2 15:04:05 2006",
        "tue jan 12 15:04:05 pst 2006",
        "tue jan 02 15:04:05 -0700 2006",
        "02 jan 06 15:04 mst",
        "02 jan 06 15:04 -0700",
        "monday, 02-jan-06 15:04:05 mst",
        "mon, 02 jan 2006 15:04:05 mst",
        "mon, 02 jan 2006 15:04:05 -0700",
        "jan 12 06:49:42",
        "mar 01 09:42:03.875",
        "may 2 15:51:24",
        "dec 2, 2006 3:04:05 pm",
        "apr 5 2018 11:12:13",
        "jun 3 15:04:05 2019",
        "jul 4 15:04:05 -0700",
        "16/jan/2003:21:22:59 -0500",
        "2012-04-05 17:54:47,123 -0500",
        "2012-04-05 17:54:47 -0500",
        "2012-04-05 17:54:47-0500",
        "2012-04-05 17:54:47,123",
        "2012-04-05 17:54:47",
        "2012/04/05 17:54:47",
        "12-04-05 17:54:47,001",
        "12-04-05 17:54:47",
        "12/04/05 17:54:47",
        "15:04:05,999",
        "4/5/2012 3:04:05 pm",
        "4/5/12 3:04:05.123 pm",
        "4/5/2012 17:55",
    ];

    for ts in timestamps {
        let seq = scan(&format!("{ts} x"));
        assert_eq!(seq[0].kind, TokenKind::Timestamp, "timestamp: {ts}");
        assert_eq!(seq[0].value, ts, "timestamp: {ts}");
        assert_eq!(seq.last().unwrap().value, "x", "timestamp: {ts}");
    }
}

#[test]
fn case_folds_to_lowercase() {
    let seq = scan("Tue Jan 02 15:04:05 -0700 2006 x");
    assert_eq!(seq[0].kind, TokenKind::Timestamp);
    assert_eq!(seq[0].value, "tue jan 02 15:04:05 -0700 2006");
}

#[test]
fn bare_clock_is_not_a_timestamp() {
    // Only the comma-millisecond clock form is accepted; a bare hh:mm:ss
    // lexes as integers and colons.
    let seq = scan("14:01:43 x");
    let kinds: Vec<TokenKind> = seq.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Integer,
            TokenKind::Literal,
            TokenKind::Integer,
            TokenKind::Literal,
            TokenKind::Integer,
            TokenKind::Literal,
        ]
    );
    assert_eq!(seq[0].value, "14");
}

#[test]
fn words_are_not_timestamps() {
    let seq = scan("mayhem at noon");
    assert_eq!(seq[0].kind, TokenKind::Literal);
    assert_eq!(seq[0].value, "mayhem");
}

#[test]
fn longest_accepting_prefix_wins() {
    // Both "jun 3 15:04:05" and "jun 3 15:04:05 2019" are accepted; the
    // longer one is taken.
    let seq = scan("jun 3 15:04:05 2019 rest");
    assert_eq!(seq[0].value, "jun 3 15:04:05 2019");
    assert_eq!(seq[1].value, "rest");
}
