//! Raw-text content models: RCDATA, RAWTEXT, script data (with the escape
//! and double-escape sub-machines), PLAINTEXT, and CDATA sections.
//!
//! NULL handling note: script-data content preserves NUL bytes verbatim;
//! every other model replaces them with U+FFFD and reports a parse error.

use super::states::State;
use super::{Look, Step, Tokenizer};
use crate::context::DocumentParseContext;
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;

impl Tokenizer {
    pub(super) fn step_raw(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.state {
            State::Rcdata => self.step_rcdata(input, ctx),
            State::Rawtext => self.step_rawtext(input, ctx),
            State::ScriptData => self.step_script_data(input, ctx),
            State::Plaintext => self.step_plaintext(input, ctx),
            State::RcdataLessThan => {
                self.step_raw_less_than(input, State::RcdataEndTagOpen, State::Rcdata)
            }
            State::RawtextLessThan => {
                self.step_raw_less_than(input, State::RawtextEndTagOpen, State::Rawtext)
            }
            State::RcdataEndTagOpen => {
                self.step_raw_end_tag_open(input, State::RcdataEndTagName, State::Rcdata)
            }
            State::RawtextEndTagOpen => {
                self.step_raw_end_tag_open(input, State::RawtextEndTagName, State::Rawtext)
            }
            State::RcdataEndTagName => self.step_raw_end_tag_name(input, ctx, State::Rcdata),
            State::RawtextEndTagName => self.step_raw_end_tag_name(input, ctx, State::Rawtext),
            State::ScriptDataLessThan => self.step_script_data_less_than(input),
            State::ScriptDataEndTagOpen => {
                self.step_raw_end_tag_open(input, State::ScriptDataEndTagName, State::ScriptData)
            }
            State::ScriptDataEndTagName => {
                self.step_raw_end_tag_name(input, ctx, State::ScriptData)
            }
            State::ScriptDataEscapeStart => self.step_script_data_escape_start(input),
            State::ScriptDataEscapeStartDash => self.step_script_data_escape_start_dash(input),
            State::ScriptDataEscaped => self.step_script_data_escaped(input, ctx),
            State::ScriptDataEscapedDash => self.step_script_data_escaped_dash(input, ctx),
            State::ScriptDataEscapedDashDash => {
                self.step_script_data_escaped_dash_dash(input, ctx)
            }
            State::ScriptDataEscapedLessThan => self.step_script_data_escaped_less_than(input),
            State::ScriptDataEscapedEndTagOpen => self.step_raw_end_tag_open(
                input,
                State::ScriptDataEscapedEndTagName,
                State::ScriptDataEscaped,
            ),
            State::ScriptDataEscapedEndTagName => {
                self.step_raw_end_tag_name(input, ctx, State::ScriptDataEscaped)
            }
            State::ScriptDataDoubleEscapeStart => self.step_script_data_double_escape_toggle(
                input,
                State::ScriptDataDoubleEscaped,
                State::ScriptDataEscaped,
            ),
            State::ScriptDataDoubleEscaped => self.step_script_data_double_escaped(input, ctx),
            State::ScriptDataDoubleEscapedDash => {
                self.step_script_data_double_escaped_dash(input, ctx)
            }
            State::ScriptDataDoubleEscapedDashDash => {
                self.step_script_data_double_escaped_dash_dash(input, ctx)
            }
            State::ScriptDataDoubleEscapedLessThan => {
                self.step_script_data_double_escaped_less_than(input)
            }
            State::ScriptDataDoubleEscapeEnd => self.step_script_data_double_escape_toggle(
                input,
                State::ScriptDataEscaped,
                State::ScriptDataDoubleEscaped,
            ),
            State::CdataSection => self.step_cdata_section(input, ctx),
            State::CdataSectionBracket => self.step_cdata_section_bracket(input),
            State::CdataSectionEnd => self.step_cdata_section_end(input),
            other => unreachable!("step_raw dispatched with non-raw state {other:?}"),
        }
    }

    fn note_text(&mut self, input: &Input, ch: char) {
        self.advance(ch);
        self.text
            .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
    }

    fn step_rcdata(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('&') => {
                    self.begin_charref(State::Rcdata);
                    return Ok(Step::Continue);
                }
                Look::Ch('<') => {
                    self.advance('<');
                    self.transition_to(State::RcdataLessThan);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.text.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_rawtext(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('<') => {
                    self.advance('<');
                    self.transition_to(State::RawtextLessThan);
                    return Ok(Step::Continue);
                }
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.text.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_script_data(
        &mut self,
        input: &Input,
        _ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('<') => {
                    self.advance('<');
                    self.transition_to(State::ScriptDataLessThan);
                    return Ok(Step::Continue);
                }
                // NUL preserved in script data.
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_plaintext(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('\0') => {
                    self.error(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    self.advance('\0');
                    self.text.push_char(input, '\u{FFFD}');
                }
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    /// `<` seen inside RCDATA/RAWTEXT; only `</` can leave the model.
    fn step_raw_less_than(
        &mut self,
        input: &Input,
        end_tag_open: State,
        fallback: State,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('/') => {
                self.advance('/');
                self.temp.clear();
                self.transition_to(end_tag_open);
            }
            Look::Ch(_) | Look::End => {
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.transition_to(fallback);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_raw_end_tag_open(
        &mut self,
        input: &Input,
        end_tag_name: State,
        fallback: State,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_alphabetic() => {
                self.begin_tag(true);
                self.transition_to(end_tag_name);
            }
            Look::Ch(_) | Look::End => {
                self.text.push_str(input, "</");
                self.transition_to(fallback);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    /// Accumulating a candidate end tag name inside a raw content model.
    ///
    /// Only the appropriate end tag (matching the start tag that switched the
    /// model) terminates the raw run; anything else is flushed back as text.
    fn step_raw_end_tag_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
        fallback: State,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_alphabetic() => {
                    self.advance(ch);
                    self.tag
                        .name
                        .note_verbatim(input, self.cursor - ch.len_utf8(), ch);
                    self.temp.push(ch);
                }
                Look::Ch(ch)
                    if (ch.is_ascii_whitespace() || ch == '/' || ch == '>')
                        && self.is_appropriate_end_tag(input) =>
                {
                    self.flush_text();
                    match ch {
                        '>' => {
                            self.advance('>');
                            self.emit_tag(input, ctx)?;
                            self.transition_to(State::Data);
                        }
                        '/' => {
                            self.advance('/');
                            self.transition_to(State::SelfClosingStartTag);
                        }
                        _ => {
                            self.advance(ch);
                            self.transition_to(State::BeforeAttributeName);
                        }
                    }
                    return Ok(Step::Continue);
                }
                Look::Ch(_) | Look::End => {
                    self.text.push_str(input, "</");
                    let flushed = std::mem::take(&mut self.temp);
                    self.text.push_str(input, &flushed);
                    self.tag = Default::default();
                    self.transition_to(fallback);
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_script_data_less_than(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('/') => {
                self.advance('/');
                self.temp.clear();
                self.transition_to(State::ScriptDataEndTagOpen);
            }
            Look::Ch('!') => {
                self.advance('!');
                self.text.note_verbatim(input, self.cursor - 2, '<');
                self.text.note_verbatim(input, self.cursor - 1, '!');
                self.transition_to(State::ScriptDataEscapeStart);
            }
            Look::Ch(_) | Look::End => {
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.transition_to(State::ScriptData);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_escape_start(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.text.note_verbatim(input, self.cursor - 1, '-');
                self.transition_to(State::ScriptDataEscapeStartDash);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::ScriptData),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_escape_start_dash(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.text.note_verbatim(input, self.cursor - 1, '-');
                self.transition_to(State::ScriptDataEscapedDashDash);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::ScriptData),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_escaped(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('-') => {
                    self.advance('-');
                    self.text.note_verbatim(input, self.cursor - 1, '-');
                    self.transition_to(State::ScriptDataEscapedDash);
                    return Ok(Step::Continue);
                }
                Look::Ch('<') => {
                    self.advance('<');
                    self.transition_to(State::ScriptDataEscapedLessThan);
                    return Ok(Step::Continue);
                }
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInScriptContent);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_script_data_escaped_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.text.note_verbatim(input, self.cursor - 1, '-');
                self.transition_to(State::ScriptDataEscapedDashDash);
            }
            Look::Ch('<') => {
                self.advance('<');
                self.transition_to(State::ScriptDataEscapedLessThan);
            }
            Look::Ch(ch) => {
                self.note_text(input, ch);
                self.transition_to(State::ScriptDataEscaped);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_escaped_dash_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.text.note_verbatim(input, self.cursor - 1, '-');
            }
            Look::Ch('<') => {
                self.advance('<');
                self.transition_to(State::ScriptDataEscapedLessThan);
            }
            Look::Ch('>') => {
                self.advance('>');
                self.text.note_verbatim(input, self.cursor - 1, '>');
                self.transition_to(State::ScriptData);
            }
            Look::Ch(ch) => {
                self.note_text(input, ch);
                self.transition_to(State::ScriptDataEscaped);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_escaped_less_than(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('/') => {
                self.advance('/');
                self.temp.clear();
                self.transition_to(State::ScriptDataEscapedEndTagOpen);
            }
            Look::Ch(ch) if ch.is_ascii_alphabetic() => {
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.temp.clear();
                self.transition_to(State::ScriptDataDoubleEscapeStart);
            }
            Look::Ch(_) | Look::End => {
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.transition_to(State::ScriptDataEscaped);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    /// Shared by the double-escape entry and exit checks: accumulate a tag
    /// name, then pick `on_script`/`on_other` depending on whether it spells
    /// `script`. The examined characters stay in the text stream.
    fn step_script_data_double_escape_toggle(
        &mut self,
        input: &Input,
        on_script: State,
        on_other: State,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_alphabetic() => {
                    self.temp.push(ch);
                    self.note_text(input, ch);
                }
                Look::Ch(ch) if ch.is_ascii_whitespace() || ch == '/' || ch == '>' => {
                    let next = if self.temp.eq_ignore_ascii_case("script") {
                        on_script
                    } else {
                        on_other
                    };
                    self.note_text(input, ch);
                    self.transition_to(next);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) | Look::End => {
                    // Not a tag-name shape after all; fall back without
                    // consuming.
                    self.transition_to(on_other);
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_script_data_double_escaped(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch('-') => {
                    self.advance('-');
                    self.text.note_verbatim(input, self.cursor - 1, '-');
                    self.transition_to(State::ScriptDataDoubleEscapedDash);
                    return Ok(Step::Continue);
                }
                Look::Ch('<') => {
                    self.advance('<');
                    self.text.note_verbatim(input, self.cursor - 1, '<');
                    self.transition_to(State::ScriptDataDoubleEscapedLessThan);
                    return Ok(Step::Continue);
                }
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInScriptContent);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_script_data_double_escaped_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.text.note_verbatim(input, self.cursor - 1, '-');
                self.transition_to(State::ScriptDataDoubleEscapedDashDash);
            }
            Look::Ch('<') => {
                self.advance('<');
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.transition_to(State::ScriptDataDoubleEscapedLessThan);
            }
            Look::Ch(ch) => {
                self.note_text(input, ch);
                self.transition_to(State::ScriptDataDoubleEscaped);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_double_escaped_dash_dash(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('-') => {
                self.advance('-');
                self.text.note_verbatim(input, self.cursor - 1, '-');
            }
            Look::Ch('<') => {
                self.advance('<');
                self.text.note_verbatim(input, self.cursor - 1, '<');
                self.transition_to(State::ScriptDataDoubleEscapedLessThan);
            }
            Look::Ch('>') => {
                self.advance('>');
                self.text.note_verbatim(input, self.cursor - 1, '>');
                self.transition_to(State::ScriptData);
            }
            Look::Ch(ch) => {
                self.note_text(input, ch);
                self.transition_to(State::ScriptDataDoubleEscaped);
            }
            Look::End => {
                self.error(ctx, ParseErrorCode::EofInScriptContent);
                self.emit_eof();
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_script_data_double_escaped_less_than(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('/') => {
                self.advance('/');
                self.text.note_verbatim(input, self.cursor - 1, '/');
                self.temp.clear();
                self.transition_to(State::ScriptDataDoubleEscapeEnd);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::ScriptDataDoubleEscaped),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_cdata_section(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(']') => {
                    self.advance(']');
                    self.transition_to(State::CdataSectionBracket);
                    return Ok(Step::Continue);
                }
                Look::Ch(ch) => self.note_text(input, ch),
                Look::End => {
                    self.error(ctx, ParseErrorCode::EofInCdata);
                    self.emit_eof();
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_cdata_section_bracket(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(']') => {
                self.advance(']');
                self.transition_to(State::CdataSectionEnd);
            }
            Look::Ch(_) | Look::End => {
                self.text.push_char(input, ']');
                self.transition_to(State::CdataSection);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_cdata_section_end(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(']') => {
                self.advance(']');
                self.text.push_char(input, ']');
            }
            Look::Ch('>') => {
                self.advance('>');
                self.transition_to(State::Data);
            }
            Look::Ch(_) | Look::End => {
                self.text.push_str(input, "]]");
                self.transition_to(State::CdataSection);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }
}
