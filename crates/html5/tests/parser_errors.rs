//! Error reporting, sink failures, and the script pause scaffold.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::utf8_options;
use html5::{Error, ParseErrorCode, Parser, ParserOptions, SinkError};
use html5_test_support::snapshot::snapshot;
use html5_test_support::ArenaSink;

fn new_parser(options: ParserOptions) -> Parser<ArenaSink> {
    let sink = ArenaSink::new();
    let document = sink.document();
    Parser::new(sink, document, options).expect("parser")
}

#[test]
fn error_handler_sees_line_and_column() {
    let seen: Rc<RefCell<Vec<(u32, u32, ParseErrorCode)>>> = Rc::default();
    let mut parser = new_parser(utf8_options());
    let sink_handle = Rc::clone(&seen);
    parser.set_error_handler(Some(Box::new(move |line, col, code| {
        sink_handle.borrow_mut().push((line, col, code));
    })));
    parser.parse_chunk(b"<p>ok</p>\n</>").expect("parse");
    parser.finish().expect("finish");
    let seen = seen.borrow();
    assert!(
        seen.iter()
            .any(|(line, _, code)| *line == 2 && *code == ParseErrorCode::MissingEndTagName),
        "errors were: {seen:?}"
    );
}

#[test]
fn parse_errors_never_fail_the_parse() {
    // A pile of malformed constructs; the parse must still complete.
    let sink = common::parse(
        "<!DOCTYPE nonsense><p <b>>x</b tail></p></nosuch><table><td>y<!-- open",
    );
    assert!(snapshot(&sink).contains('y'));
}

#[test]
fn sink_failure_latches_the_parser() {
    let mut sink = ArenaSink::new();
    // Fail the third node creation.
    sink.fail_on_create = Some((2, 7));
    let document = sink.document();
    let mut parser = Parser::new(sink, document, utf8_options()).expect("parser");
    let result = parser.parse_chunk(b"<html><head><body><p>x");
    assert_eq!(result, Err(Error::Sink(SinkError(7))));
    // The failure is latched; further calls return the same error.
    assert_eq!(parser.parse_chunk(b"more"), Err(Error::Sink(SinkError(7))));
    assert_eq!(parser.finish(), Err(Error::Sink(SinkError(7))));
    // Held references were released on abort.
    parser.into_sink().assert_refs_balanced();
}

#[test]
fn script_completion_pauses_when_scripting_enabled() {
    let mut parser = new_parser(ParserOptions {
        charset: Some("utf-8".to_string()),
        scripting: true,
        ..ParserOptions::default()
    });
    let result = parser.parse_chunk(b"<script>var x;</script>");
    assert_eq!(result, Err(Error::Paused));
    // Host injects document.write-style data at the insertion point.
    parser.insert_chunk(b"written").expect("insert while paused");
    parser.resume().expect("resume");
    parser.finish().expect("finish");
    let sink = parser.into_sink();
    sink.assert_refs_balanced();
    let tree = snapshot(&sink);
    assert!(tree.contains("\"written\""), "tree was: {tree}");
    assert!(tree.contains("<script>"), "tree was: {tree}");
}

#[test]
fn scripting_disabled_never_pauses() {
    let sink = common::parse("<script>var x;</script><p>y");
    let tree = snapshot(&sink);
    assert!(tree.contains("var x;"));
    assert!(tree.contains('y'));
}

#[test]
fn resume_without_pause_is_an_error() {
    let mut parser = new_parser(utf8_options());
    assert_eq!(parser.resume(), Err(Error::BadParam));
}

#[test]
fn noscript_content_parses_as_markup_without_scripting() {
    let sink = common::parse("<head><noscript><link href=a></noscript></head>");
    let link = sink.nodes.iter().any(|node| {
        matches!(&node.data, html5_test_support::NodeData::Element { name, .. } if name == "link")
    });
    assert!(link, "noscript contents should be parsed as elements");
}

#[test]
fn noscript_content_is_text_with_scripting() {
    let mut parser = new_parser(ParserOptions {
        charset: Some("utf-8".to_string()),
        scripting: true,
        ..ParserOptions::default()
    });
    parser
        .parse_chunk(b"<head><noscript><link href=a></noscript></head>")
        .expect("parse");
    parser.finish().expect("finish");
    let sink = parser.into_sink();
    let link = sink.nodes.iter().any(|node| {
        matches!(&node.data, html5_test_support::NodeData::Element { name, .. } if name == "link")
    });
    assert!(!link, "noscript contents should stay raw text");
}

#[test]
fn counters_accumulate() {
    let mut parser = new_parser(utf8_options());
    parser.parse_chunk(b"<p>x</p>").expect("parse");
    parser.finish().expect("finish");
    let counters = parser.counters();
    assert!(counters.tokens_processed >= 4);
    assert!(counters.sink_calls >= 6);
    assert!(counters.max_open_elements_depth >= 3);
}
