//! Token model produced by the tokenizer.

use crate::atom::AtomId;
use crate::span::Span;

/// Character data, either borrowed from the decoded input buffer or owned
/// (after character-reference decoding or replacement-character insertion).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextValue {
    Span(Span),
    Owned(String),
}

/// HTML attribute with interned name and optional value.
///
/// A missing value (`value: None`) reaches the sink as the empty string; the
/// distinction is kept only so token snapshots can show the source form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: AtomId,
    pub value: Option<TextValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype {
        name: Option<AtomId>,
        public_id: Option<String>,
        system_id: Option<String>,
        force_quirks: bool,
    },
    StartTag {
        name: AtomId,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: AtomId,
    },
    Comment {
        text: TextValue,
    },
    Text {
        text: TextValue,
    },
    Eof,
}
