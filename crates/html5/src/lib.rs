//! Streaming HTML5 parsing engine.
//!
//! Bytes go in through [`Parser::parse_chunk`]; ordered node-construction
//! calls come out on a client-supplied [`TreeSink`]. The engine owns the
//! input stream (decoding, charset detection, restarts), the tokenizer, and
//! the tree builder; the DOM itself belongs to the embedder.
//!
//! Clients that want raw tokens instead of tree construction drive
//! [`Tokenizer`] directly over an [`Input`] of decoded text.

mod atom;
mod charset;
mod context;
mod elements;
mod entities;
mod errors;
mod input;
mod parser;
mod sink;
mod span;
mod token;
mod tokenizer;
mod tree_builder;

pub use atom::{AtomId, AtomTable};
pub use charset::{resolve_label, CharsetSource, Encoding, LabelResolution};
pub use context::{Counters, DocumentParseContext};
pub use elements::{element_type, ElementType, Ns};
pub use errors::{
    Error, ErrorOrigin, ErrorPolicy, ParseError, ParseErrorCode, SinkError,
};
pub use input::Input;
pub use parser::{ErrorHandler, Parser, ParserOptions};
pub use sink::{
    AttrNs, AttributeData, DoctypeData, ElementData, QuirksMode, TreeSink,
};
pub use span::Span;
pub use token::{Attribute, TextValue, Token};
pub use tokenizer::{
    ContentModel, TokenStep, Tokenizer, TokenizerConfig, TokenizerStats,
};
