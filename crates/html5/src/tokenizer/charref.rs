//! Character-reference sub-machine.
//!
//! Entered from the data, RCDATA, and attribute-value states. The return
//! state decides where decoded characters land (text stream vs. the pending
//! attribute value) and whether the legacy-name compatibility rule applies.
//!
//! Streaming contract: the named and numeric scanners never consume past a
//! point they might have to take back. A scan that runs out of buffered input
//! mid-candidate reports starvation with the cursor still at the ampersand's
//! successor, and simply runs again when more input arrives.

use super::states::State;
use super::{Look, Step, Tokenizer};
use crate::context::DocumentParseContext;
use crate::entities::{numeric_to_char, query_named};
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;

impl Tokenizer {
    /// Consume `&` and enter the reference machine.
    pub(super) fn begin_charref(&mut self, return_state: State) {
        self.charref_start = self.cursor;
        self.advance('&');
        self.return_state = return_state;
        self.charref_code = 0;
        self.charref_had_digits = false;
        self.transition_to(State::CharacterReference);
    }

    fn in_attribute(&self) -> bool {
        self.return_state.is_attribute_value()
    }

    /// Route a decoded (non-verbatim) character to the active sink.
    fn sink_decoded(&mut self, input: &Input, ch: char) {
        if self.in_attribute() {
            self.tag.attr_value.push_char(input, ch);
        } else {
            self.text.push_char(input, ch);
        }
    }

    /// Route an already-consumed verbatim input character to the active sink.
    fn sink_verbatim(&mut self, input: &Input, at: usize, ch: char) {
        if self.in_attribute() {
            self.tag.attr_value.note_verbatim(input, at, ch);
        } else {
            self.text.note_verbatim(input, at, ch);
        }
    }

    /// Flush the raw input range `charref_start..upto` to the active sink.
    fn flush_raw(&mut self, input: &Input, upto: usize) {
        let start = self.charref_start;
        let text: String = input.as_str()[start..upto].to_string();
        let mut at = start;
        for ch in text.chars() {
            self.sink_verbatim(input, at, ch);
            at += ch.len_utf8();
        }
        self.cursor = upto;
    }

    pub(super) fn step_charref(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        match self.state {
            State::CharacterReference => self.step_charref_entry(input),
            State::NamedCharacterReference => self.step_named_charref(input, ctx),
            State::AmbiguousAmpersand => self.step_ambiguous_ampersand(input, ctx),
            State::NumericCharacterReference => self.step_numeric_charref(input),
            State::HexCharacterReferenceStart => {
                self.step_numeric_charref_digits(input, ctx, 16, true)
            }
            State::HexCharacterReference => {
                self.step_numeric_charref_digits(input, ctx, 16, false)
            }
            State::DecCharacterReference => {
                self.step_numeric_charref_digits(input, ctx, 10, false)
            }
            State::NumericCharacterReferenceEnd => self.step_numeric_charref_end(input, ctx),
            other => unreachable!("step_charref dispatched with non-reference state {other:?}"),
        }
    }

    fn step_charref_entry(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch(ch) if ch.is_ascii_alphanumeric() => {
                self.transition_to(State::NamedCharacterReference);
            }
            Look::Ch('#') => {
                self.advance('#');
                self.transition_to(State::NumericCharacterReference);
            }
            Look::Ch(_) | Look::End => {
                self.sink_verbatim(input, self.charref_start, '&');
                self.transition_to(self.return_state);
            }
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    fn step_named_charref(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        let text = input.as_str();
        // Candidate names start just past the ampersand.
        let name_start = self.cursor;
        let mut pos = self.cursor;
        // (end position after the match, expansion, semicolon-terminated)
        let mut best: Option<(usize, char, bool)> = None;

        loop {
            let Some(ch) = text[pos..].chars().next() else {
                if self.end_of_stream {
                    break;
                }
                return Ok(Step::Starved);
            };
            if ch == ';' {
                if let Some((expansion, _)) = query_named(&text[name_start..pos]).exact {
                    best = Some((pos + 1, expansion, true));
                }
                break;
            }
            if !ch.is_ascii_alphanumeric() {
                break;
            }
            let query = query_named(&text[name_start..pos + 1]);
            if query.exact.is_none() && !query.can_extend {
                break;
            }
            pos += 1;
            if let Some((expansion, legacy)) = query.exact {
                if legacy {
                    best = Some((pos, expansion, false));
                }
            }
        }

        match best {
            Some((end, expansion, true)) => {
                self.cursor = end;
                self.sink_decoded(input, expansion);
                self.transition_to(self.return_state);
                Ok(Step::Continue)
            }
            Some((end, expansion, false)) => {
                // Legacy compatibility rule: inside an attribute value, a
                // semicolon-less match followed by `=` or an alphanumeric is
                // not decoded.
                let following = match text[end..].chars().next() {
                    Some(ch) => Some(ch),
                    None if self.end_of_stream => None,
                    None => return Ok(Step::Starved),
                };
                let suppressed = self.in_attribute()
                    && following
                        .is_some_and(|ch| ch == '=' || ch.is_ascii_alphanumeric());
                if suppressed {
                    self.flush_raw(input, end);
                } else {
                    self.error(ctx, ParseErrorCode::MissingSemicolonAfterCharacterReference);
                    self.cursor = end;
                    self.sink_decoded(input, expansion);
                }
                self.transition_to(self.return_state);
                Ok(Step::Continue)
            }
            None => {
                // Nothing matched; re-emit the ampersand and let the
                // ambiguous-ampersand state walk the alphanumeric run.
                self.sink_verbatim(input, self.charref_start, '&');
                self.transition_to(State::AmbiguousAmpersand);
                Ok(Step::Continue)
            }
        }
    }

    fn step_ambiguous_ampersand(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_alphanumeric() => {
                    let at = self.cursor;
                    self.advance(ch);
                    self.sink_verbatim(input, at, ch);
                }
                Look::Ch(';') => {
                    self.error(ctx, ParseErrorCode::UnknownNamedCharacterReference);
                    self.transition_to(self.return_state);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) | Look::End => {
                    self.transition_to(self.return_state);
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_numeric_charref(&mut self, input: &Input) -> Result<Step, Error> {
        match self.look(input) {
            Look::Ch('x') | Look::Ch('X') => {
                self.advance('x');
                self.transition_to(State::HexCharacterReferenceStart);
            }
            Look::Ch(_) | Look::End => self.transition_to(State::DecCharacterReference),
            Look::Starved => return Ok(Step::Starved),
        }
        Ok(Step::Continue)
    }

    /// Digit accumulation for both radices; `entry` distinguishes the
    /// hex-start state, which must see at least one digit before committing.
    fn step_numeric_charref_digits(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
        radix: u32,
        entry: bool,
    ) -> Result<Step, Error> {
        if entry {
            // First hex digit decides between digits and raw flush.
            match self.look(input) {
                Look::Ch(ch) if ch.is_ascii_hexdigit() => {
                    self.transition_to(State::HexCharacterReference);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) | Look::End => {
                    self.error(
                        ctx,
                        ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference,
                    );
                    let upto = self.cursor;
                    self.flush_raw(input, upto);
                    self.transition_to(self.return_state);
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
        loop {
            match self.look(input) {
                Look::Ch(ch) if ch.is_digit(radix) => {
                    self.advance(ch);
                    self.charref_had_digits = true;
                    self.charref_code = self
                        .charref_code
                        .saturating_mul(radix)
                        .saturating_add(ch.to_digit(radix).expect("digit checked"));
                }
                Look::Ch(';') => {
                    self.advance(';');
                    self.transition_to(State::NumericCharacterReferenceEnd);
                    return Ok(Step::Continue);
                }
                Look::Ch(_) | Look::End => {
                    if self.charref_had_digits {
                        self.error(
                            ctx,
                            ParseErrorCode::MissingSemicolonAfterCharacterReference,
                        );
                        self.transition_to(State::NumericCharacterReferenceEnd);
                    } else {
                        self.error(
                            ctx,
                            ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference,
                        );
                        let upto = self.cursor;
                        self.flush_raw(input, upto);
                        self.transition_to(self.return_state);
                    }
                    return Ok(Step::Continue);
                }
                Look::Starved => return Ok(Step::Starved),
            }
        }
    }

    fn step_numeric_charref_end(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<Step, Error> {
        let (ch, error) = numeric_to_char(self.charref_code);
        if let Some(code) = error {
            self.error(ctx, code);
        }
        self.sink_decoded(input, ch);
        self.transition_to(self.return_state);
        Ok(Step::Continue)
    }
}
