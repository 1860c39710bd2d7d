//! Streaming HTML5 tokenizer.
//!
//! An explicit state machine over decoded input. The tokenizer is resumable
//! at any chunk boundary:
//!
//! - Chunk-equivalence: feeding input in one chunk or many yields the same
//!   token sequence for the same text.
//! - Multi-character lookaheads (`<!--`, `<!DOCTYPE`, `[CDATA[`, keyword and
//!   named-reference matching) never commit on a partial match; they either
//!   match against buffered input or report starvation without consuming.
//! - A tokenizer instance is bound to one `Input` instance for its lifetime;
//!   an encoding restart replaces both.
//!
//! Tokens are delivered one at a time so the tree builder can switch the
//! content model (rawtext/rcdata/script/plaintext) between a start tag and
//! the first character that follows it.

use std::collections::VecDeque;

use crate::context::DocumentParseContext;
use crate::errors::{Error, ErrorOrigin, ParseErrorCode};
use crate::input::Input;
use crate::token::{Attribute, Token};

mod accum;
mod charref;
mod raw;
mod states;

use accum::Accum;
use states::State;

/// Content model the tree builder selects before the tokenizer resumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentModel {
    #[default]
    Pcdata,
    Rcdata,
    /// Raw text (`style`, `xmp`, `iframe`, `noembed`, `noframes`, ...).
    Cdata,
    ScriptData,
    Plaintext,
}

/// Configuration for the tokenizer.
#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Emit an `Eof` token once the end of the stream is processed.
    pub emit_eof: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { emit_eof: true }
    }
}

/// Outcome of asking for the next token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenStep {
    Token(Token),
    /// More decoded input is required to continue.
    Starved,
    /// The EOF token has been delivered; the stream is exhausted.
    Drained,
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub state_transitions: u64,
    pub tokens_emitted: u64,
    pub bytes_consumed: u64,
}

/// What a single state step observed at the cursor.
enum Look {
    Ch(char),
    /// End of stream, definitively.
    End,
    /// Out of buffered input, but more may arrive.
    Starved,
}

/// Result of a single state step.
enum Step {
    Continue,
    Starved,
}

#[derive(Debug, Default)]
struct TagAccum {
    active: bool,
    is_end: bool,
    name: Accum,
    self_closing: bool,
    attrs: Vec<Attribute>,
    attr_active: bool,
    attr_name: Accum,
    attr_value: Accum,
    attr_has_value: bool,
}

#[derive(Debug, Default)]
struct DoctypeAccum {
    active: bool,
    name: Accum,
    has_name: bool,
    public_id: Accum,
    has_public: bool,
    system_id: Accum,
    has_system: bool,
    force_quirks: bool,
}

/// Streaming HTML5 tokenizer.
pub struct Tokenizer {
    config: TokenizerConfig,
    state: State,
    return_state: State,
    cursor: usize,
    input_id: Option<u64>,
    end_of_stream: bool,
    eof_emitted: bool,
    tokens: VecDeque<Token>,
    text: Accum,
    temp: String,
    tag: TagAccum,
    comment: Accum,
    comment_active: bool,
    doctype: DoctypeAccum,
    charref_start: usize,
    charref_code: u32,
    charref_had_digits: bool,
    last_start_tag: Option<Box<str>>,
    cdata_allowed: bool,
    stats: TokenizerStats,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            state: State::Data,
            return_state: State::Data,
            cursor: 0,
            input_id: None,
            end_of_stream: false,
            eof_emitted: false,
            tokens: VecDeque::new(),
            text: Accum::Empty,
            temp: String::new(),
            tag: TagAccum::default(),
            comment: Accum::Empty,
            comment_active: false,
            doctype: DoctypeAccum::default(),
            charref_start: 0,
            charref_code: 0,
            charref_had_digits: false,
            last_start_tag: None,
            cdata_allowed: false,
            stats: TokenizerStats::default(),
        }
    }

    /// Mark end-of-stream. All buffered input will still be consumed; the
    /// EOF token is emitted once the machine reaches it.
    pub fn finish(&mut self) {
        self.end_of_stream = true;
    }

    /// Select the content model for subsequent data.
    ///
    /// Only meaningful between tokens (the parser applies it immediately
    /// after the start tag that triggered it, before any further input is
    /// consumed).
    pub fn set_content_model(&mut self, model: ContentModel) {
        let next = match model {
            ContentModel::Pcdata => State::Data,
            ContentModel::Rcdata => State::Rcdata,
            ContentModel::Cdata => State::Rawtext,
            ContentModel::ScriptData => State::ScriptData,
            ContentModel::Plaintext => State::Plaintext,
        };
        self.transition_to(next);
    }

    /// Whether `<![CDATA[` opens a CDATA section (true in foreign content).
    pub fn set_cdata_allowed(&mut self, allowed: bool) {
        self.cdata_allowed = allowed;
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Produce the next token, or report starvation/exhaustion.
    pub fn next_token(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<TokenStep, Error> {
        if let Some(id) = self.input_id {
            assert_eq!(id, input.id(), "tokenizer is bound to a single Input instance");
        } else {
            self.input_id = Some(input.id());
        }

        let mut stall_guard = StallGuard::new(self.cursor);
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Ok(TokenStep::Token(token));
            }
            if self.eof_emitted {
                return Ok(TokenStep::Drained);
            }
            self.stats.steps = self.stats.steps.saturating_add(1);
            match self.step(input, ctx)? {
                Step::Continue => stall_guard.check(self.cursor, self.state),
                Step::Starved => {
                    self.stats.bytes_consumed = self.cursor as u64;
                    // A state may flush (e.g. a text run) right before
                    // starving; deliver that first.
                    return Ok(match self.tokens.pop_front() {
                        Some(token) => TokenStep::Token(token),
                        None => TokenStep::Starved,
                    });
                }
            }
            self.stats.bytes_consumed = self.cursor as u64;
        }
    }

    fn transition_to(&mut self, next: State) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html5.tokenizer",
            "state {:?} -> {:?} @{}",
            self.state,
            next,
            self.cursor
        );
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    // ---- cursor primitives -------------------------------------------------

    fn look(&self, input: &Input) -> Look {
        debug_assert!(
            input.as_str().is_char_boundary(self.cursor),
            "tokenizer cursor must stay on a UTF-8 scalar boundary"
        );
        match input.as_str()[self.cursor..].chars().next() {
            Some(ch) => Look::Ch(ch),
            None if self.end_of_stream => Look::End,
            None => Look::Starved,
        }
    }

    /// Consume the character at the cursor. Caller has already looked.
    fn advance(&mut self, ch: char) {
        self.cursor += ch.len_utf8();
    }

    /// Match an ASCII pattern at the cursor without consuming.
    fn match_ascii(&self, input: &Input, pattern: &[u8], ci: bool) -> Match {
        let bytes = &input.as_str().as_bytes()[self.cursor..];
        let head = &bytes[..pattern.len().min(bytes.len())];
        let head_matches = if ci {
            head.eq_ignore_ascii_case(&pattern[..head.len()])
        } else {
            head == &pattern[..head.len()]
        };
        if !head_matches {
            Match::No
        } else if head.len() == pattern.len() {
            Match::Yes
        } else if self.end_of_stream {
            Match::No
        } else {
            Match::Starved
        }
    }

    fn consume_matched(&mut self, len: usize) {
        self.cursor += len;
    }

    fn error(&self, ctx: &mut DocumentParseContext, code: ParseErrorCode) {
        ctx.report(ErrorOrigin::Tokenizer, code, self.cursor);
    }

    // ---- emission ----------------------------------------------------------

    fn emit(&mut self, token: Token) {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html5.tokenizer", "emit token: {token:?}");
        self.tokens.push_back(token);
        self.stats.tokens_emitted = self.stats.tokens_emitted.saturating_add(1);
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            self.text.clear();
            return;
        }
        let text = self.text.take_text();
        self.emit(Token::Text { text });
    }

    fn emit_eof(&mut self) {
        debug_assert!(self.end_of_stream, "EOF emission requires end of stream");
        self.flush_text();
        if self.config.emit_eof {
            self.emit(Token::Eof);
        }
        self.eof_emitted = true;
    }

    fn emit_comment(&mut self) {
        let text = self.comment.take_text();
        self.comment_active = false;
        self.emit(Token::Comment { text });
    }

    /// Commit the attribute under construction, dropping duplicates.
    fn commit_attr(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Result<(), Error> {
        if !self.tag.attr_active {
            return Ok(());
        }
        self.tag.attr_active = false;
        let name = ctx.atoms.intern(self.tag.attr_name.resolve(input))?;
        self.tag.attr_name.clear();
        let value = if self.tag.attr_has_value {
            Some(self.tag.attr_value.take_text())
        } else {
            self.tag.attr_value.clear();
            None
        };
        self.tag.attr_has_value = false;
        if self.tag.attrs.iter().any(|attr| attr.name == name) {
            self.error(ctx, ParseErrorCode::DuplicateAttribute);
            return Ok(());
        }
        self.tag.attrs.push(Attribute { name, value });
        Ok(())
    }

    fn begin_attr(&mut self) {
        debug_assert!(!self.tag.attr_active, "previous attribute must be committed");
        self.tag.attr_active = true;
        self.tag.attr_name.clear();
        self.tag.attr_value.clear();
        self.tag.attr_has_value = false;
    }

    fn begin_tag(&mut self, is_end: bool) {
        self.tag = TagAccum {
            active: true,
            is_end,
            ..TagAccum::default()
        };
    }

    fn emit_tag(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Result<(), Error> {
        debug_assert!(self.tag.active, "no tag under construction");
        self.commit_attr(input, ctx)?;
        debug_assert!(
            !self.tag.name.is_empty(),
            "tag states never emit an empty name"
        );
        let name = ctx.atoms.intern(self.tag.name.resolve(input))?;
        let tag = std::mem::take(&mut self.tag);
        if tag.is_end {
            if !tag.attrs.is_empty() {
                self.error(ctx, ParseErrorCode::EndTagWithAttributes);
            }
            if tag.self_closing {
                self.error(ctx, ParseErrorCode::EndTagWithTrailingSolidus);
            }
            self.emit(Token::EndTag { name });
        } else {
            self.last_start_tag = Some(ctx.atoms.resolve(name).into());
            self.emit(Token::StartTag {
                name,
                attributes: tag.attrs,
                self_closing: tag.self_closing,
            });
        }
        Ok(())
    }

    fn emit_doctype(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Result<(), Error> {
        let doctype = std::mem::take(&mut self.doctype);
        let name = if doctype.has_name {
            let mut name = doctype.name;
            Some(ctx.atoms.intern(name.resolve(input))?)
        } else {
            None
        };
        let mut public_id = doctype.public_id;
        let mut system_id = doctype.system_id;
        self.emit(Token::Doctype {
            name,
            public_id: doctype.has_public.then(|| public_id.take_string(input)),
            system_id: doctype.has_system.then(|| system_id.take_string(input)),
            force_quirks: doctype.force_quirks,
        });
        Ok(())
    }

    /// Whether the end tag under construction matches the last start tag.
    fn is_appropriate_end_tag(&self, input: &Input) -> bool {
        match &self.last_start_tag {
            Some(last) => self
                .tag
                .name
                .resolve(input)
                .eq_ignore_ascii_case(last),
            None => false,
        }
    }

    // ---- dispatch ----------------------------------------------------------

    fn step(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Result<Step, Error> {
        match self.state {
            State::Data => self.step_data(input, ctx),
            State::TagOpen => self.step_tag_open(input, ctx),
            State::EndTagOpen => self.step_end_tag_open(input, ctx),
            State::TagName => self.step_tag_name(input, ctx),
            State::BeforeAttributeName => self.step_before_attribute_name(input, ctx),
            State::AttributeName => self.step_attribute_name(input, ctx),
            State::AfterAttributeName => self.step_after_attribute_name(input, ctx),
            State::BeforeAttributeValue => self.step_before_attribute_value(input, ctx),
            State::AttributeValueDoubleQuoted => {
                self.step_attribute_value_quoted(input, ctx, '"')
            }
            State::AttributeValueSingleQuoted => {
                self.step_attribute_value_quoted(input, ctx, '\'')
            }
            State::AttributeValueUnquoted => self.step_attribute_value_unquoted(input, ctx),
            State::AfterAttributeValueQuoted => {
                self.step_after_attribute_value_quoted(input, ctx)
            }
            State::SelfClosingStartTag => self.step_self_closing_start_tag(input, ctx),
            State::MarkupDeclarationOpen => self.step_markup_declaration_open(input, ctx),
            State::BogusComment => self.step_bogus_comment(input, ctx),
            State::CommentStart => self.step_comment_start(input, ctx),
            State::CommentStartDash => self.step_comment_start_dash(input, ctx),
            State::Comment => self.step_comment(input, ctx),
            State::CommentLessThan => self.step_comment_less_than(input, ctx),
            State::CommentLessThanBang => self.step_comment_less_than_bang(input, ctx),
            State::CommentLessThanBangDash => self.step_comment_less_than_bang_dash(input, ctx),
            State::CommentLessThanBangDashDash => {
                self.step_comment_less_than_bang_dash_dash(input, ctx)
            }
            State::CommentEndDash => self.step_comment_end_dash(input, ctx),
            State::CommentEnd => self.step_comment_end(input, ctx),
            State::CommentEndBang => self.step_comment_end_bang(input, ctx),
            State::Doctype => self.step_doctype(input, ctx),
            State::BeforeDoctypeName => self.step_before_doctype_name(input, ctx),
            State::DoctypeName => self.step_doctype_name(input, ctx),
            State::AfterDoctypeName => self.step_after_doctype_name(input, ctx),
            State::AfterDoctypePublicKeyword => {
                self.step_after_doctype_public_keyword(input, ctx)
            }
            State::BeforeDoctypePublicId => self.step_before_doctype_public_id(input, ctx),
            State::DoctypePublicIdDoubleQuoted => {
                self.step_doctype_id(input, ctx, '"', IdKind::Public)
            }
            State::DoctypePublicIdSingleQuoted => {
                self.step_doctype_id(input, ctx, '\'', IdKind::Public)
            }
            State::AfterDoctypePublicId => self.step_after_doctype_public_id(input, ctx),
            State::BetweenDoctypePublicAndSystem => {
                self.step_between_doctype_public_and_system(input, ctx)
            }
            State::AfterDoctypeSystemKeyword => {
                self.step_after_doctype_system_keyword(input, ctx)
            }
            State::BeforeDoctypeSystemId => self.step_before_doctype_system_id(input, ctx),
            State::DoctypeSystemIdDoubleQuoted => {
                self.step_doctype_id(input, ctx, '"', IdKind::System)
            }
            State::DoctypeSystemIdSingleQuoted => {
                self.step_doctype_id(input, ctx, '\'', IdKind::System)
            }
            State::AfterDoctypeSystemId => self.step_after_doctype_system_id(input, ctx),
            State::BogusDoctype => self.step_bogus_doctype(input, ctx),

            State::Rcdata
            | State::Rawtext
            | State::ScriptData
            | State::Plaintext
            | State::RcdataLessThan
            | State::RcdataEndTagOpen
            | State::RcdataEndTagName
            | State::RawtextLessThan
            | State::RawtextEndTagOpen
            | State::RawtextEndTagName
            | State::ScriptDataLessThan
            | State::ScriptDataEndTagOpen
            | State::ScriptDataEndTagName
            | State::ScriptDataEscapeStart
            | State::ScriptDataEscapeStartDash
            | State::ScriptDataEscaped
            | State::ScriptDataEscapedDash
            | State::ScriptDataEscapedDashDash
            | State::ScriptDataEscapedLessThan
            | State::ScriptDataEscapedEndTagOpen
            | State::ScriptDataEscapedEndTagName
            | State::ScriptDataDoubleEscapeStart
            | State::ScriptDataDoubleEscaped
            | State::ScriptDataDoubleEscapedDash
            | State::ScriptDataDoubleEscapedDashDash
            | State::ScriptDataDoubleEscapedLessThan
            | State::ScriptDataDoubleEscapeEnd
            | State::CdataSection
            | State::CdataSectionBracket
            | State::CdataSectionEnd => self.step_raw(input, ctx),

            State::CharacterReference
            | State::NamedCharacterReference
            | State::AmbiguousAmpersand
            | State::NumericCharacterReference
            | State::HexCharacterReferenceStart
            | State::HexCharacterReference
            | State::DecCharacterReference
            | State::NumericCharacterReferenceEnd => self.step_charref(input, ctx),
        }
    }

    // ---- data and tag states ----------------------------------------------

    fn step_data(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('<') => {
                    self.advance('<');
                    self.transition_to(State::TagOpen);
                    return Ok(Step::Continue);
                }
                Look::Ch('&') => {
                    self.begin_charref(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.text.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.text.note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                // Text is held across chunk boundaries: flush points are
                // content-determined (a delimiter or EOF), never scheduling-
                // determined, so chunking cannot change the token sequence.
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_tag_open(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('!') => {
                self.advance('!');
                self.transition_to(State::MarkupDeclarationOpen);
            }
            Look::Ch('/') => {
                self.advance('/');
                self.transition_to(State::EndTagOpen);
            }
            Look::Ch(ch) if ch.is_ascii_alphabetic() => {
                self.flush_text();
                self.begin_tag(false);
                self.transition_to(State::TagName);
            }
            Look::Ch('?') => {
                self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                self.flush_text();
                self.comment.clear();
                self.comment_active = true;
                self.transition_to(State::BogusComment);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::InvalidFirstCharacterOfTagName);
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.transition_to(State::Data);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::UnexpectedEof);
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_end_tag_open(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_alphabetic() => {
                self.flush_text();
                self.begin_tag(true);
                self.transition_to(State::TagName);
            }
            Look::Ch('>') => {
                self.error(ctx, ParseErrorCode::MissingEndTagName);
                self.advance('>');
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::InvalidFirstCharacterOfTagName);
                self.flush_text();
                self.comment.clear();
                self.comment_active = true;
                self.transition_to(State::BogusComment);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::UnexpectedEof);
                self.text.push_str(input, "</");
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_tag_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => {
                    self.advance(ch);
                    self.transition_to(State::BeforeAttributeName);
                    return Ok(Step::Continue);
                }
                Look::Ch('/') => {
                    self.advance('/');
                    self.transition_to(State::SelfClosingStartTag);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_tag(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.tag.name.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.tag
                        .name
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInTag);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_before_attribute_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('/') | Look::Ch('>') | Look::End => {
                    self.transition_to(State::AfterAttributeName);
                    return Ok(Step::Continue);
                }
                Look::Ch('=') => {
                    self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                    self.commit_attr(input, ctx)?;
                    self.begin_attr();
                    self.advance('=');
                    self.tag.attr_name.note_verbatim(input, self.cursor - 1, '=');
                    self.transition_to(State::AttributeName);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) => {
                    self.commit_attr(input, ctx)?;
                    self.begin_attr();
                    self.transition_to(State::AttributeName);
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_attribute_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => {
                    self.transition_to(State::AfterAttributeName);
                    return Ok(Step::Continue);
                }
                Look::Ch('/') | Look::Ch('>') | Look::End => {
                    self.transition_to(State::AfterAttributeName);
                    return Ok(Step::Continue);
                }
                Look::Ch('=') => {
                    self.advance('=');
                    self.tag.attr_has_value = true;
                    self.transition_to(State::BeforeAttributeValue);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.tag.attr_name.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    if matches!(ch, '"' | '\'' | '<') {
                        self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                    }
                    self.advance(ch);
                    self.tag
                        .attr_name
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_after_attribute_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('/') => {
                    self.advance('/');
                    self.transition_to(State::SelfClosingStartTag);
                    return Ok(Step::Continue);
                }
                Look::Ch('=') => {
                    self.advance('=');
                    self.tag.attr_has_value = true;
                    self.transition_to(State::BeforeAttributeValue);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_tag(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) => {
                    self.commit_attr(input, ctx)?;
                    self.begin_attr();
                    self.transition_to(State::AttributeName);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInTag);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_before_attribute_value(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('"') => {
                    self.advance('"');
                    self.transition_to(State::AttributeValueDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('\'') => {
                    self.advance('\'');
                    self.transition_to(State::AttributeValueSingleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                    self.advance('>');
                    self.emit_tag(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) | Look::End => {
                    self.transition_to(State::AttributeValueUnquoted);
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_attribute_value_quoted(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
        quote: char,
    ) -> Result<Step, Error> {
        let return_state = self.state;
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch == quote => {
                    self.advance(ch);
                    self.transition_to(State::AfterAttributeValueQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('&') => {
                    self.begin_charref(return_state);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.tag.attr_value.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.tag
                        .attr_value
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInTag);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_attribute_value_unquoted(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => {
                    self.advance(ch);
                    self.transition_to(State::BeforeAttributeName);
                    return Ok(Step::Continue);
                }
                Look::Ch('&') => {
                    self.begin_charref(State::AttributeValueUnquoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_tag(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.tag.attr_value.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    if matches!(ch, '"' | '\'' | '<' | '=' | '`') {
                        self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                    }
                    self.advance(ch);
                    self.tag
                        .attr_value
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInTag);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_after_attribute_value_quoted(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_whitespace() => {
                self.advance(ch);
                self.transition_to(State::BeforeAttributeName);
            }
            Look::Ch('/') => {
                self.advance('/');
                self.transition_to(State::SelfClosingStartTag);
            }
            Look::Ch('>') => {
                self.advance('>');
                self.emit_tag(input, ctx)?;
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                self.transition_to(State::BeforeAttributeName);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInTag);
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_self_closing_start_tag(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('>') => {
                self.advance('>');
                self.tag.self_closing = true;
                self.emit_tag(input, ctx)?;
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::UnexpectedSolidusInTag);
                self.transition_to(State::BeforeAttributeName);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInTag);
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    // ---- markup declarations, comments, doctype ---------------------------

    fn step_markup_declaration_open(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.match_ascii(input, b"--", false) {
            Match::Yes => {
                self.consume_matched(2);
                self.flush_text();
                self.comment.clear();
                self.comment_active = true;
                self.transition_to(State::CommentStart);
                return Ok(Step::Continue);
            }
            Match::Starved => return Ok(Step::Starved),
            Match::No => {}
        }
        match self.match_ascii(input, b"DOCTYPE", true) {
            Match::Yes => {
                self.consume_matched(7);
                self.flush_text();
                self.transition_to(State::Doctype);
                return Ok(Step::Continue);
            }
            Match::Starved => return Ok(Step::Starved),
            Match::No => {}
        }
        match self.match_ascii(input, b"[CDATA[", false) {
            Match::Yes => {
                self.consume_matched(7);
                if self.cdata_allowed {
                    self.transition_to(State::CdataSection);
                } else {
                    self.error(ctx, ParseErrorCode::CdataInHtmlContent);
                    self.flush_text();
                    self.comment.clear();
                    self.comment.push_str(input, "[CDATA[");
                    self.comment_active = true;
                    self.transition_to(State::BogusComment);
                }
                return Ok(Step::Continue);
            }
            Match::Starved => return Ok(Step::Starved),
            Match::No => {}
        }
        self.error(ctx, ParseErrorCode::IncorrectlyOpenedComment);
        self.flush_text();
        self.comment.clear();
        self.comment_active = true;
        self.transition_to(State::BogusComment);
        Ok(Step::Continue)
    }

    fn step_bogus_comment(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_comment();
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.comment.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.comment
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.emit_comment();
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_comment_start(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.transition_to(State::CommentStartDash);
            }
            Look::Ch('>') => {
                self.error(ctx, ParseErrorCode::AbruptClosingOfComment);
                self.advance('>');
                self.emit_comment();
                self.transition_to(State::Data);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::Comment),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_start_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.transition_to(State::CommentEnd);
            }
            Look::Ch('>') => {
                self.error(ctx, ParseErrorCode::AbruptClosingOfComment);
                self.advance('>');
                self.emit_comment();
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.comment.push_char(input, '-');
                self.transition_to(State::Comment);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('<') => {
                    self.advance('<');
                    self.comment.note_verbatim(input, self.cursor - 1, '<');
                    self.transition_to(State::CommentLessThan);
                    return Ok(Step::Continue);
                }
                Look::Ch('-') => {
                    self.advance('-');
                    self.transition_to(State::CommentEndDash);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.comment.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.comment
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInComment);
                    self.emit_comment();
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_comment_less_than(
        &mut self,
        input: &Input,
        _ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('!') => {
                self.advance('!');
                self.comment.note_verbatim(input, self.cursor - 1, '!');
                self.transition_to(State::CommentLessThanBang);
            }
            Look::Ch('<') => {
                self.advance('<');
                self.comment.note_verbatim(input, self.cursor - 1, '<');
            }
            Look::Ch(_) | Look::End => self.transition_to(State::Comment),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_less_than_bang(
        &mut self,
        input: &Input,
        _ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.transition_to(State::CommentLessThanBangDash);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::Comment),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_less_than_bang_dash(
        &mut self,
        input: &Input,
        _ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.transition_to(State::CommentLessThanBangDashDash);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::CommentEndDash),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_less_than_bang_dash_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('>') | Look::End => self.transition_to(State::CommentEnd),
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::NestedComment);
                self.transition_to(State::CommentEnd);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_end_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.transition_to(State::CommentEnd);
            }
            Look::Ch(_) => {
                self.comment.push_char(input, '-');
                self.transition_to(State::Comment);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_end(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('>') => {
                self.advance('>');
                self.emit_comment();
                self.transition_to(State::Data);
            }
            Look::Ch('!') => {
                self.advance('!');
                self.transition_to(State::CommentEndBang);
            }
            Look::Ch('-') => {
                self.advance('-');
                self.comment.push_char(input, '-');
            }
            Look::Ch(_) => {
                self.comment.push_str(input, "--");
                self.transition_to(State::Comment);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_comment_end_bang(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.comment.push_str(input, "--!");
                self.transition_to(State::CommentEndDash);
            }
            Look::Ch('>') => {
                self.error(ctx, ParseErrorCode::IncorrectlyClosedComment);
                self.advance('>');
                self.emit_comment();
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.comment.push_str(input, "--!");
                self.transition_to(State::Comment);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInComment);
                self.emit_comment();
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_doctype(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        self.doctype = DoctypeAccum {
            active: true,
            ..DoctypeAccum::default()
        };
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_whitespace() => {
                self.advance(ch);
                self.transition_to(State::BeforeDoctypeName);
            }
            Look::Ch('>') => self.transition_to(State::BeforeDoctypeName),
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                self.transition_to(State::BeforeDoctypeName);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInDoctype);
                self.doctype.force_quirks = true;
                self.emit_doctype(input, ctx)?;
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_before_doctype_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('>') => {
                    self.error(ctx, ParseErrorCode::MissingDoctypeName);
                    self.advance('>');
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.doctype.has_name = true;
                    self.doctype.name.push_char(input, '\u{FFFD}');
                    self.transition_to(State::DoctypeName);
                    return Ok(Step::Continue);
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.doctype.has_name = true;
                    self.doctype
                        .name
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                    self.transition_to(State::DoctypeName);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_doctype_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => {
                    self.advance(ch);
                    self.transition_to(State::AfterDoctypeName);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.doctype.name.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => {
                    self.advance(ch);
                    self.doctype
                        .name
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_after_doctype_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
                Look::Ch(_) => {
                    match self.match_ascii(input, b"PUBLIC", true) {
                        Match::Yes => {
                            self.consume_matched(6);
                            self.transition_to(State::AfterDoctypePublicKeyword);
                            return Ok(Step::Continue);
                        }
                        Match::Starved => return Ok(Step::Starved),
                        Match::No => {}
                    }
                    match self.match_ascii(input, b"SYSTEM", true) {
                        Match::Yes => {
                            self.consume_matched(6);
                            self.transition_to(State::AfterDoctypeSystemKeyword);
                            return Ok(Step::Continue);
                        }
                        Match::Starved => return Ok(Step::Starved),
                        Match::No => {}
                    }
                    self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                    self.doctype.force_quirks = true;
                    self.transition_to(State::BogusDoctype);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    fn step_after_doctype_public_keyword(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_whitespace() => {
                self.advance(ch);
                self.transition_to(State::BeforeDoctypePublicId);
            }
            Look::Ch('"') => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.advance('"');
                self.doctype.has_public = true;
                self.transition_to(State::DoctypePublicIdDoubleQuoted);
            }
            Look::Ch('\'') => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.advance('\'');
                self.doctype.has_public = true;
                self.transition_to(State::DoctypePublicIdSingleQuoted);
            }
            Look::Ch('>') => {
                self.error(ctx, ParseErrorCode::MissingDoctypePublicId);
                self.advance('>');
                self.doctype.force_quirks = true;
                self.emit_doctype(input, ctx)?;
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.doctype.force_quirks = true;
                self.transition_to(State::BogusDoctype);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInDoctype);
                self.doctype.force_quirks = true;
                self.emit_doctype(input, ctx)?;
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_before_doctype_public_id(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('"') => {
                    self.advance('"');
                    self.doctype.has_public = true;
                    self.transition_to(State::DoctypePublicIdDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('\'') => {
                    self.advance('\'');
                    self.doctype.has_public = true;
                    self.transition_to(State::DoctypePublicIdSingleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.error(ctx, ParseErrorCode::MissingDoctypePublicId);
                    self.advance('>');
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) => {
                    self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                    self.doctype.force_quirks = true;
                    self.transition_to(State::BogusDoctype);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_doctype_id(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
        quote: char,
        kind: IdKind,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch == quote => {
                    self.advance(ch);
                    self.transition_to(match kind {
                        IdKind::Public => State::AfterDoctypePublicId,
                        IdKind::System => State::AfterDoctypeSystemId,
                    });
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    let id = match kind {
                        IdKind::Public => &mut self.doctype.public_id,
                        IdKind::System => &mut self.doctype.system_id,
                    };
                    id.push_char(input, '\u{FFFD}');
                }
                Look::Ch('>') => {
                    self.error(ctx, ParseErrorCode::UnexpectedCharacter);
                    self.advance('>');
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch(ch) => {
                    let at = self.cursor;
                    self.advance(ch);
                    let id = match kind {
                        IdKind::Public => &mut self.doctype.public_id,
                        IdKind::System => &mut self.doctype.system_id,
                    };
                    id.note_verbatim(input, at, ch);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_after_doctype_public_id(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_whitespace() => {
                self.advance(ch);
                self.transition_to(State::BetweenDoctypePublicAndSystem);
            }
            Look::Ch('>') => {
                self.advance('>');
                self.emit_doctype(input, ctx)?;
                self.transition_to(State::Data);
            }
            Look::Ch('"') => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.advance('"');
                self.doctype.has_system = true;
                self.transition_to(State::DoctypeSystemIdDoubleQuoted);
            }
            Look::Ch('\'') => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.advance('\'');
                self.doctype.has_system = true;
                self.transition_to(State::DoctypeSystemIdSingleQuoted);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.doctype.force_quirks = true;
                self.transition_to(State::BogusDoctype);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInDoctype);
                self.doctype.force_quirks = true;
                self.emit_doctype(input, ctx)?;
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_between_doctype_public_and_system(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('"') => {
                    self.advance('"');
                    self.doctype.has_system = true;
                    self.transition_to(State::DoctypeSystemIdDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('\'') => {
                    self.advance('\'');
                    self.doctype.has_system = true;
                    self.transition_to(State::DoctypeSystemIdSingleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) => {
                    self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                    self.doctype.force_quirks = true;
                    self.transition_to(State::BogusDoctype);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_after_doctype_system_keyword(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_whitespace() => {
                self.advance(ch);
                self.transition_to(State::BeforeDoctypeSystemId);
            }
            Look::Ch('"') => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.advance('"');
                self.doctype.has_system = true;
                self.transition_to(State::DoctypeSystemIdDoubleQuoted);
            }
            Look::Ch('\'') => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.advance('\'');
                self.doctype.has_system = true;
                self.transition_to(State::DoctypeSystemIdSingleQuoted);
            }
            Look::Ch('>') => {
                self.error(ctx, ParseErrorCode::MissingDoctypeSystemId);
                self.advance('>');
                self.doctype.force_quirks = true;
                self.emit_doctype(input, ctx)?;
                self.transition_to(State::Data);
            }
            Look::Ch(_) => {
                self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                self.doctype.force_quirks = true;
                self.transition_to(State::BogusDoctype);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInDoctype);
                self.doctype.force_quirks = true;
                self.emit_doctype(input, ctx)?;
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_before_doctype_system_id(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('"') => {
                    self.advance('"');
                    self.doctype.has_system = true;
                    self.transition_to(State::DoctypeSystemIdDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('\'') => {
                    self.advance('\'');
                    self.doctype.has_system = true;
                    self.transition_to(State::DoctypeSystemIdSingleQuoted);
                    return Ok(Step::Continue);
                }
                Look::Ch('>') => {
                    self.error(ctx, ParseErrorCode::MissingDoctypeSystemId);
                    self.advance('>');
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) => {
                    self.error(ctx, ParseErrorCode::MissingQuoteBeforeDoctypeId);
                    self.doctype.force_quirks = true;
                    self.transition_to(State::BogusDoctype);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_after_doctype_system_id(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_whitespace() => self.advance(ch),
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) => {
                    self.error(ctx, ParseErrorCode::UnexpectedCharacterAfterDoctypeSystemId);
                    self.transition_to(State::BogusDoctype);
                    return Ok(Step::Continue);
                }
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInDoctype);
                    self.doctype.force_quirks = true;
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_bogus_doctype(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('>') => {
                    self.advance('>');
                    self.emit_doctype(input, ctx)?;
                    self.transition_to(State::Data);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                }
                Look::Ch(ch) => self.advance(ch),
                Look::End => {
                    self.emit_doctype(input, ctx)?;
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }
}

#[derive(Clone, Copy)]
enum IdKind {
    Public,
    System,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Match {
    Yes,
    No,
    Starved,
}

/// Livelock guard: the machine must either consume input, emit a token, or
/// settle within a bounded number of pure state transitions.
struct StallGuard {
    cursor: usize,
    stalled_steps: u32,
}

impl StallGuard {
    const LIMIT: u32 = 64;

    fn new(cursor: usize) -> Self {
        Self {
            cursor,
            stalled_steps: 0,
        }
    }

    fn check(&mut self, cursor: usize, state: State) {
        if cursor != self.cursor {
            self.cursor = cursor;
            self.stalled_steps = 0;
            return;
        }
        self.stalled_steps += 1;
        assert!(
            self.stalled_steps < Self::LIMIT,
            "tokenizer stalled without consuming input (state {state:?}, cursor {cursor})"
        );
    }
}

#[cfg(test)]
mod tests;
