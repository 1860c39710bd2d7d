//! Charset detection, decoding, and the meta-driven restart.

mod common;

use common::{parse_chunked_with, utf8_options};
use html5::{CharsetSource, Error, Parser, ParserOptions};
use html5_test_support::snapshot::snapshot;
use html5_test_support::ArenaSink;

fn new_parser(options: ParserOptions) -> Parser<ArenaSink> {
    let sink = ArenaSink::new();
    let document = sink.document();
    Parser::new(sink, document, options).expect("parser")
}

#[test]
fn declared_charset_is_certain() {
    let mut parser = new_parser(utf8_options());
    parser.parse_chunk(b"<p>x").expect("parse");
    assert_eq!(parser.charset(), Some(("UTF-8", CharsetSource::Certain)));
}

#[test]
fn unknown_declared_charset_is_rejected() {
    let sink = ArenaSink::new();
    let document = sink.document();
    let result = Parser::new(
        sink,
        document,
        ParserOptions {
            charset: Some("martian-7".to_string()),
            ..ParserOptions::default()
        },
    );
    assert!(matches!(result, Err(Error::Encoding)));
}

#[test]
fn utf8_bom_wins_and_is_not_content() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("<p>caf\u{E9}</p>".as_bytes());
    let mut parser = new_parser(ParserOptions::default());
    parser.parse_chunk(&bytes).expect("parse");
    parser.finish().expect("finish");
    assert_eq!(parser.charset(), Some(("UTF-8", CharsetSource::Certain)));
    let sink = parser.into_sink();
    let tree = snapshot(&sink);
    assert!(tree.contains("caf\u{E9}"), "tree was: {tree}");
}

#[test]
fn utf16le_document_decodes() {
    let text = "\u{FEFF}<p>hi</p>";
    let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let mut parser = new_parser(ParserOptions::default());
    parser.parse_chunk(&bytes).expect("parse");
    parser.finish().expect("finish");
    assert_eq!(parser.charset(), Some(("UTF-16LE", CharsetSource::Certain)));
    let tree = snapshot(parser.sink());
    assert!(tree.contains("\"hi\""), "tree was: {tree}");
}

#[test]
fn undeclared_short_document_falls_back_tentative() {
    let mut parser = new_parser(ParserOptions::default());
    parser.parse_chunk(b"<p>plain</p>").expect("parse");
    // Detection defers until the prescan window fills or the stream ends.
    assert_eq!(parser.charset(), None);
    parser.finish().expect("finish");
    assert_eq!(
        parser.charset(),
        Some(("windows-1252", CharsetSource::Tentative))
    );
}

#[test]
fn prescan_meta_is_confident() {
    let mut document = b"<html><head><meta charset=utf-8></head><body>".to_vec();
    document.resize(2048, b' ');
    let mut parser = new_parser(ParserOptions::default());
    parser.parse_chunk(&document).expect("parse");
    assert_eq!(parser.charset(), Some(("UTF-8", CharsetSource::Confident)));
}

/// A meta beyond the prescan window triggers the tree-builder-driven
/// restart: the sink is told, construction re-runs, and the result matches a
/// parse that knew the charset up front.
#[test]
fn late_meta_restarts_and_matches_upfront_parse() {
    let mut document = Vec::new();
    document.extend_from_slice(b"<!DOCTYPE html><html><head><!--");
    document.resize(1200, b'x');
    document.extend_from_slice(b"--><meta charset=utf-8></head><body><p>caf\xC3\xA9</p>");

    let mut parser = new_parser(ParserOptions::default());
    parser.parse_chunk(&document).expect("parse");
    parser.finish().expect("finish");
    let restarted = parser.into_sink();
    assert_eq!(restarted.encoding_changes, vec!["UTF-8"]);
    restarted.assert_refs_balanced();

    let upfront = parse_chunked_with(&[&document], utf8_options());
    assert_eq!(snapshot(&restarted), snapshot(&upfront));
    let tree = snapshot(&restarted);
    assert!(tree.contains("caf\u{E9}"), "tree was: {tree}");
}

#[test]
fn meta_matching_current_charset_upgrades_without_restart() {
    let mut document = Vec::new();
    document.extend_from_slice(b"<!DOCTYPE html><head><!--");
    document.resize(1200, b'y');
    document.extend_from_slice(b"--><meta charset=windows-1252><body>ok");

    let mut parser = new_parser(ParserOptions::default());
    parser.parse_chunk(&document).expect("parse");
    parser.finish().expect("finish");
    assert_eq!(
        parser.charset(),
        Some(("windows-1252", CharsetSource::Confident))
    );
    assert_eq!(parser.counters().encoding_restarts, 0);
    assert!(parser.into_sink().encoding_changes.is_empty());
}

#[test]
fn windows_1252_high_bytes_decode() {
    let mut parser = new_parser(ParserOptions {
        charset: Some("latin1".to_string()),
        ..ParserOptions::default()
    });
    // 0x93/0x94 are curly quotes in windows-1252 (latin1 labels fold in).
    parser.parse_chunk(b"<p>\x93q\x94</p>").expect("parse");
    parser.finish().expect("finish");
    let tree = snapshot(parser.sink());
    assert!(tree.contains("\u{201C}q\u{201D}"), "tree was: {tree}");
}

#[test]
fn change_charset_is_ignored_once_confident() {
    let mut parser = new_parser(utf8_options());
    parser.parse_chunk(b"<p>x").expect("parse");
    parser.change_charset("windows-1252").expect("no-op");
    assert_eq!(parser.charset(), Some(("UTF-8", CharsetSource::Certain)));
    assert_eq!(parser.change_charset("martian-7"), Err(Error::Encoding));
}

#[test]
fn claim_buffer_returns_bytes_and_poisons_the_parser() {
    let mut parser = new_parser(utf8_options());
    parser.parse_chunk(b"<p>one").expect("parse");
    parser.parse_chunk(b" two").expect("parse");
    let buffer = parser.claim_buffer().expect("claim");
    assert_eq!(buffer, b"<p>one two");
    assert_eq!(parser.parse_chunk(b"x"), Err(Error::BadParam));
    assert_eq!(parser.claim_buffer(), Err(Error::BadParam));
    assert_eq!(parser.change_charset("utf-8"), Err(Error::BadParam));
    // References were released on claim.
    parser.into_sink().assert_refs_balanced();
}

#[test]
fn crlf_normalization_across_chunks() {
    let whole = common::parse_chunked(&[b"<pre>a\r\nb\rc</pre>"]);
    let split = common::parse_chunked(&[b"<pre>a\r", b"\nb\r", b"c</pre>"]);
    assert_eq!(snapshot(&whole), snapshot(&split));
    let tree = snapshot(&whole);
    assert!(tree.contains("\"a\nb\nc\""), "tree was: {tree}");
}
