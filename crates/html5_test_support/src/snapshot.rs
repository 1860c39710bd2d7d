//! Indented-text DOM snapshots for golden assertions.
//!
//! Format, one node per line, two-space indent per depth:
//!
//! ```text
//! #document
//!   <!DOCTYPE html>
//!   <html>
//!     <body>
//!       "hi"
//!       <!-- note -->
//!       <svg svg>
//! ```
//!
//! Foreign elements are prefixed with their namespace, html5lib style.
//! Attributes are listed sorted, on the element line.

use std::fmt::Write;

use html5::Ns;

use crate::{ArenaSink, NodeData};

pub fn snapshot(sink: &ArenaSink) -> String {
    let mut out = String::new();
    write_node(sink, 0, 0, &mut out);
    out
}

fn write_node(sink: &ArenaSink, id: usize, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match &sink.nodes[id].data {
        NodeData::Document => out.push_str("#document\n"),
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            let _ = write!(out, "{indent}<!DOCTYPE {}", name.as_deref().unwrap_or(""));
            if public_id.is_some() || system_id.is_some() {
                let _ = write!(
                    out,
                    " \"{}\" \"{}\"",
                    public_id.as_deref().unwrap_or(""),
                    system_id.as_deref().unwrap_or("")
                );
            }
            out.push_str(">\n");
        }
        NodeData::Element {
            ns,
            name,
            attributes,
        } => {
            let prefix = match ns {
                Ns::Html => "",
                Ns::Svg => "svg ",
                Ns::MathMl => "math ",
            };
            let _ = write!(out, "{indent}<{prefix}{name}");
            let mut attrs: Vec<String> = attributes
                .iter()
                .map(|(ns, name, value)| match ns {
                    Some(uri) => format!("{name}[{uri}]=\"{value}\""),
                    None => format!("{name}=\"{value}\""),
                })
                .collect();
            attrs.sort();
            for attr in attrs {
                let _ = write!(out, " {attr}");
            }
            out.push_str(">\n");
        }
        NodeData::Text(text) => {
            let _ = writeln!(out, "{indent}\"{text}\"");
        }
        NodeData::Comment(text) => {
            let _ = writeln!(out, "{indent}<!-- {text} -->");
        }
    }
    for child in sink.nodes[id].children.clone() {
        write_node(sink, child, depth + 1, out);
    }
}
