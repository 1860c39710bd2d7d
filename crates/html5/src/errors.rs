//! Error types for the parsing engine.
//!
//! Two worlds are kept strictly apart:
//! - [`Error`] is what public entry points return. It is about the caller's
//!   contract (bad arguments, resource exhaustion, sink failures), never about
//!   the document being malformed.
//! - [`ParseError`] is an observation about the document. Parse errors are
//!   reported through the error handler and parsing always continues.

/// Status code returned by a tree sink operation.
///
/// `0` is success; any other value is sink-defined and treated as fatal by the
/// engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkError(pub u32);

/// Public API error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Invalid argument, or a call made in a state that forbids it (e.g. any
    /// call after `claim_buffer`).
    BadParam,
    /// Resource exhaustion (atom-id space, buffer size overflow).
    Nomem,
    /// Unknown or unsupported encoding label.
    Encoding,
    /// A meta tag requires a different encoding; internal restart signal.
    ///
    /// Never escapes `parse_chunk`: the parser consumes it and re-feeds the
    /// buffered bytes under the new decoder.
    EncodingChange,
    /// The engine voluntarily stopped at a script insertion point.
    Paused,
    /// A sink call failed; the parse is aborted and the parser is latched
    /// into a failed state returning this same error.
    Sink(SinkError),
}

/// Where a parse error was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorOrigin {
    Input,
    Tokenizer,
    TreeBuilder,
}

/// Stable identifiers for HTML parse errors.
///
/// The set is coarser than the WHATWG error-name catalogue; codes identify a
/// family of errors, the position identifies the site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    InvalidByteSequence,
    UnexpectedNullCharacter,
    UnexpectedCharacter,
    UnexpectedEof,
    EofInTag,
    EofInComment,
    EofInDoctype,
    EofInScriptContent,
    EofInCdata,
    InvalidFirstCharacterOfTagName,
    MissingEndTagName,
    DuplicateAttribute,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    UnexpectedSolidusInTag,
    AbruptClosingOfComment,
    IncorrectlyOpenedComment,
    NestedComment,
    IncorrectlyClosedComment,
    MissingDoctypeName,
    MissingDoctypePublicId,
    MissingDoctypeSystemId,
    MissingQuoteBeforeDoctypeId,
    UnexpectedCharacterAfterDoctypeSystemId,
    CdataInHtmlContent,
    UnknownNamedCharacterReference,
    MissingSemicolonAfterCharacterReference,
    AbsenceOfDigitsInNumericCharacterReference,
    NullCharacterReference,
    CharacterReferenceOutsideUnicodeRange,
    SurrogateCharacterReference,
    NoncharacterCharacterReference,
    ControlCharacterReference,
    UnexpectedToken,
    UnexpectedStartTag,
    UnexpectedEndTag,
    UnexpectedDoctype,
    MisnestedTag,
    ImproperlyNestedFormattingElement,
}

/// A recorded HTML parse error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub origin: ErrorOrigin,
    pub code: ParseErrorCode,
    /// Byte offset into the decoded input buffer.
    pub position: usize,
}

/// Error tracking policy.
#[derive(Clone, Copy, Debug)]
pub struct ErrorPolicy {
    /// Whether to store parse errors for later retrieval.
    pub track: bool,
    /// Maximum number of stored errors (newest dropped once full).
    pub max_stored: usize,
    /// Always increment counters even when storage is disabled.
    pub track_counters: bool,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            track: true,
            max_stored: 128,
            track_counters: true,
        }
    }
}

/// Engine invariant violation (bug/corruption), not a recoverable HTML error.
#[derive(Debug)]
pub struct EngineInvariantError;
