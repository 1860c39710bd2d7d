//! Shared helpers for the integration suites.

use html5::{Parser, ParserOptions};
use html5_test_support::snapshot::snapshot;
use html5_test_support::ArenaSink;

/// Parse a complete UTF-8 document and return the sink.
pub fn parse(html: &str) -> ArenaSink {
    parse_chunked(&[html.as_bytes()])
}

/// Parse byte chunks with a declared UTF-8 charset.
pub fn parse_chunked(chunks: &[&[u8]]) -> ArenaSink {
    parse_chunked_with(chunks, utf8_options())
}

pub fn parse_chunked_with(chunks: &[&[u8]], options: ParserOptions) -> ArenaSink {
    let sink = ArenaSink::new();
    let document = sink.document();
    let mut parser = Parser::new(sink, document, options).expect("parser");
    for chunk in chunks {
        parser.parse_chunk(chunk).expect("parse_chunk");
    }
    parser.finish().expect("finish");
    let sink = parser.into_sink();
    sink.assert_refs_balanced();
    sink
}

pub fn utf8_options() -> ParserOptions {
    ParserOptions {
        charset: Some("utf-8".to_string()),
        ..ParserOptions::default()
    }
}

/// Assert the document tree matches an expected snapshot.
///
/// The expected string is dedented: leading blank line and trailing spaces
/// are stripped, and the common indentation of the remaining lines removed.
pub fn assert_tree(html: &str, expected: &str) {
    let sink = parse(html);
    let got = snapshot(&sink);
    assert_eq!(
        got.trim_end(),
        dedent(expected).trim_end(),
        "tree mismatch for {html:?}\n--- got ---\n{got}"
    );
}

pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| if line.len() >= indent { &line[indent..] } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}
