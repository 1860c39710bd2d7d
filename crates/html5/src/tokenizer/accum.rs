//! Text accumulation over the decoded input buffer.
//!
//! Token payloads prefer borrowed spans into the decoded buffer; an
//! accumulator is promoted to owned text only when the emitted characters
//! stop being a verbatim slice of the input (character references,
//! replacement characters, re-emitted markup like `</`).

use crate::input::Input;
use crate::span::Span;
use crate::token::TextValue;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Accum {
    #[default]
    Empty,
    Span {
        start: usize,
        end: usize,
    },
    Owned(String),
}

impl Accum {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Accum::Empty => true,
            Accum::Span { start, end } => start == end,
            Accum::Owned(s) => s.is_empty(),
        }
    }

    /// Record a character consumed verbatim from the input at byte offset
    /// `at`.
    ///
    /// Invariant: verbatim characters arrive in buffer order, so a live span
    /// always ends exactly where the next one starts; a gap means the caller
    /// skipped input, which promotes to owned.
    pub(crate) fn note_verbatim(&mut self, input: &Input, at: usize, ch: char) {
        let ch_end = at + ch.len_utf8();
        match self {
            Accum::Empty => {
                *self = Accum::Span {
                    start: at,
                    end: ch_end,
                };
            }
            Accum::Span { end, .. } if *end == at => *end = ch_end,
            Accum::Span { start, end } => {
                debug_assert!(*end <= at, "verbatim characters must arrive in order");
                let mut owned = String::with_capacity((*end - *start) + ch.len_utf8());
                owned.push_str(input.text(Span::new(*start, *end)));
                owned.push(ch);
                *self = Accum::Owned(owned);
            }
            Accum::Owned(s) => s.push(ch),
        }
    }

    /// Append a character that is not a verbatim input slice.
    pub(crate) fn push_char(&mut self, input: &Input, ch: char) {
        self.promote(input).push(ch);
    }

    /// Append a string that is not a verbatim input slice.
    pub(crate) fn push_str(&mut self, input: &Input, text: &str) {
        self.promote(input).push_str(text);
    }

    fn promote(&mut self, input: &Input) -> &mut String {
        if let Accum::Span { start, end } = *self {
            *self = Accum::Owned(input.text(Span::new(start, end)).to_string());
        }
        if let Accum::Empty = self {
            *self = Accum::Owned(String::new());
        }
        match self {
            Accum::Owned(s) => s,
            _ => unreachable!("promote always leaves an owned accumulator"),
        }
    }

    /// Resolve to borrowed text for inspection (interning, comparisons).
    pub(crate) fn resolve<'a>(&'a self, input: &'a Input) -> &'a str {
        match self {
            Accum::Empty => "",
            Accum::Span { start, end } => input.text(Span::new(*start, *end)),
            Accum::Owned(s) => s,
        }
    }

    /// Convert into a token payload, resetting the accumulator.
    pub(crate) fn take_text(&mut self) -> TextValue {
        match std::mem::take(self) {
            Accum::Empty => TextValue::Owned(String::new()),
            Accum::Span { start, end } => TextValue::Span(Span::new(start, end)),
            Accum::Owned(s) => TextValue::Owned(s),
        }
    }

    /// Convert into an owned string, resetting the accumulator.
    pub(crate) fn take_string(&mut self, input: &Input) -> String {
        match std::mem::take(self) {
            Accum::Empty => String::new(),
            Accum::Span { start, end } => input.text(Span::new(start, end)).to_string(),
            Accum::Owned(s) => s,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Accum::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;

    fn input_with(text: &str) -> Input {
        let mut stream = crate::input::InputStream::new(Some(crate::charset::Encoding::Utf8));
        let mut ctx = crate::context::DocumentParseContext::new();
        stream.append(text.as_bytes());
        stream.finish();
        stream.pump(&mut ctx);
        std::mem::replace(stream.input_mut(), Input::new())
    }

    #[test]
    fn contiguous_verbatim_chars_stay_borrowed() {
        let input = input_with("hello");
        let mut accum = Accum::Empty;
        let mut at = 0;
        for ch in "hello".chars() {
            accum.note_verbatim(&input, at, ch);
            at += ch.len_utf8();
        }
        assert_eq!(accum, Accum::Span { start: 0, end: 5 });
        assert_eq!(accum.resolve(&input), "hello");
    }

    #[test]
    fn non_verbatim_push_promotes_to_owned() {
        let input = input_with("a&amp;b");
        let mut accum = Accum::Empty;
        accum.note_verbatim(&input, 0, 'a');
        accum.push_char(&input, '&');
        accum.note_verbatim(&input, 6, 'b');
        assert_eq!(accum.resolve(&input), "a&b");
        assert!(matches!(accum, Accum::Owned(_)));
    }

    #[test]
    fn gap_in_verbatim_chars_promotes() {
        let input = input_with("abcdef");
        let mut accum = Accum::Empty;
        accum.note_verbatim(&input, 0, 'a');
        accum.note_verbatim(&input, 3, 'd');
        assert_eq!(accum.resolve(&input), "ad");
    }
}
