//! Chunk-boundary invariance at the sink-call level: any split of the input
//! must produce the same sink call sequence as a single chunk.

mod common;

use common::{parse_chunked, utf8_options};
use html5::{Parser, ParserOptions};
use html5_test_support::snapshot::snapshot;
use html5_test_support::ArenaSink;

static DOCUMENTS: &[&str] = &[
    "<!DOCTYPE html><html><head><title>t</title></head><body><p class=\"a b\">x &amp; y</p></body></html>",
    "<table>a<tr><td>b",
    "<b>1<i>2</b>3</i>4",
    "<script>var s = \"</scr\" + \"ipt>\";</script>",
    "<svg><foreignObject><div>hi</div></foreignObject></svg>",
    "<ul><li>one<li>two</ul><!-- done -->",
    "<textarea>\nkeep</textarea>",
    "<pre>\na</pre>",
    "<p>x &notit; &notin; &#x41;</p>",
];

#[test]
fn single_byte_chunks_match_single_chunk() {
    for document in DOCUMENTS {
        let bytes = document.as_bytes();
        let whole = parse_chunked(&[bytes]);
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        let split = parse_chunked(&chunks);
        assert_eq!(
            split.log, whole.log,
            "sink call sequence diverged for {document:?}"
        );
        assert_eq!(snapshot(&split), snapshot(&whole));
    }
}

#[test]
fn varied_chunk_sizes_match() {
    for document in DOCUMENTS {
        let bytes = document.as_bytes();
        let whole = parse_chunked(&[bytes]);
        for size in [2, 3, 7] {
            let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
            let split = parse_chunked(&chunks);
            assert_eq!(
                split.log, whole.log,
                "chunk size {size} diverged for {document:?}"
            );
        }
    }
}

#[test]
fn multibyte_utf8_split_across_chunks() {
    let document = "<p>caf\u{E9} \u{1F642}</p>".to_string();
    let bytes = document.as_bytes();
    let whole = parse_chunked(&[bytes]);
    let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
    let split = parse_chunked(&chunks);
    assert_eq!(snapshot(&split), snapshot(&whole));
}

#[test]
fn empty_chunks_are_harmless() {
    let sink = parse_chunked(&[b"", b"<p>", b"", b"x", b""]);
    let whole = parse_chunked(&[b"<p>x"]);
    assert_eq!(sink.log, whole.log);
}

#[test]
fn finish_without_any_input() {
    let sink = ArenaSink::new();
    let document = sink.document();
    let mut parser = Parser::new(sink, document, utf8_options()).expect("parser");
    parser.finish().expect("finish");
    let sink = parser.into_sink();
    sink.assert_refs_balanced();
    // An empty document still synthesizes the skeleton.
    assert_eq!(
        snapshot(&sink).trim_end(),
        "#document\n  <html>\n    <head>\n    <body>"
    );
}

#[test]
fn parse_after_finish_is_rejected() {
    let sink = ArenaSink::new();
    let document = sink.document();
    let mut parser = Parser::new(sink, document, ParserOptions::default()).expect("parser");
    parser.parse_chunk(b"<p>x").expect("parse_chunk");
    parser.finish().expect("finish");
    assert_eq!(parser.parse_chunk(b"more"), Err(html5::Error::BadParam));
}
