use seqscope::scanner::Scanner;
use seqscope::sequence::Sequence;
use seqscope::tokens::{Token, TokenKind};

fn scan(msg: &str) -> Sequence {
    Scanner::new().scan(msg).expect("message scans")
}

#[test]
fn pattern_strings_round_trip_through_the_scanner() {
    let patterns = [
        "%createtime% %apphost% %appname% : vfs root %action%",
        "%ts% %string% sshd [ %integer% ] : %string% %string% for %string% from %ipv4% port %integer% ssh2",
        "id = %string% time = \" %ts% \" fw = %string% priv = %integer%",
        "%ipv4% - - [ %ts% ] \" get %url% http/1.1 \" %integer% %integer%",
        "%srcmac% %dstmac% %float% %severity%",
    ];
    for pattern in patterns {
        assert_eq!(scan(pattern).to_string(), pattern, "pattern: {pattern}");
    }
}

#[test]
fn rendering_prefers_field_over_kind_over_value() {
    let seq = scan("%createtime% %integer% word");
    assert_eq!(seq.to_string(), "%createtime% %integer% word");
}

#[test]
fn signature_ignores_strings_and_long_literals() {
    let base = Sequence(vec![
        Token::new(TokenKind::Timestamp, "jan 12 06:49:42"),
        Token::new(TokenKind::Literal, "["),
        Token::new(TokenKind::Integer, "7034"),
        Token::new(TokenKind::Literal, "]"),
    ]);
    let sig = base.signature();
    assert_eq!(sig, "%ts%[%integer%]");

    // Multi-character literals and free strings are structural noise.
    let mut padded = base.clone();
    padded.insert(1, Token::new(TokenKind::Literal, "gateway"));
    padded.push(Token::new(TokenKind::String, "whatever"));
    assert_eq!(padded.signature(), sig);
}

#[test]
fn signature_keeps_single_byte_literals() {
    let seq = Sequence(vec![
        Token::new(TokenKind::Literal, ";"),
        Token::new(TokenKind::Literal, "="),
        Token::new(TokenKind::Integer, "0"),
    ]);
    assert_eq!(seq.signature(), ";=%integer%");
}

#[test]
fn long_string_lists_every_token() {
    let seq = scan("port 4228");
    let dump = seq.long_string();
    assert_eq!(dump.lines().count(), 2);
    assert!(dump.contains("\"port\""));
    assert!(dump.contains("%integer%"));
}
