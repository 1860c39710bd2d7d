//! Byte-level input stream and the decoded character buffer.
//!
//! The stream owns the raw document bytes for the whole parse (they are
//! needed again on an encoding restart, and the client may claim them at the
//! end). Decoding runs behind a frontier: bytes before `raw_consumed` have
//! been decoded into the append-only `Input` buffer the tokenizer reads.

use memchr::memchr_iter;

use crate::charset::{detect, CharsetSource, Decoder, Detection, Encoding};
use crate::context::DocumentParseContext;
use crate::errors::{ErrorOrigin, ParseErrorCode};
use crate::span::Span;

/// Decoded Unicode input stream.
///
/// Invariant: buffer is append-only while spans are live; an encoding restart
/// replaces the whole instance (new id), invalidating prior spans by
/// construction.
#[derive(Debug)]
pub struct Input {
    id: u64,
    buffer: String,
    /// Byte offsets at which lines begin. First entry is always 0.
    line_starts: Vec<usize>,
}

impl Input {
    pub fn new() -> Self {
        static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Self {
            id,
            buffer: String::new(),
            line_starts: vec![0],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Append already-decoded, newline-normalized text.
    ///
    /// This is the entry point for clients driving the tokenizer directly
    /// with characters; byte-level parsing goes through the parser instead.
    pub fn push_str(&mut self, text: &str) {
        let from = self.buffer.len();
        self.buffer.push_str(text);
        self.index_new_lines(from);
    }

    /// Opaque identity for this input buffer instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolve a span to text.
    pub fn text(&self, span: Span) -> &str {
        debug_assert!(
            span.end <= self.buffer.len()
                && self.buffer.is_char_boundary(span.start)
                && self.buffer.is_char_boundary(span.end),
            "span must lie on UTF-8 boundaries inside the decoded buffer"
        );
        &self.buffer[span.start..span.end]
    }

    /// Map a decoded-buffer byte offset to a 1-based (line, column).
    pub fn line_col(&self, position: usize) -> (u32, u32) {
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= position)
            .saturating_sub(1);
        let col = position - self.line_starts[line_idx] + 1;
        (line_idx as u32 + 1, col as u32)
    }

    fn index_new_lines(&mut self, from: usize) {
        for rel in memchr_iter(b'\n', &self.buffer.as_bytes()[from..]) {
            self.line_starts.push(from + rel + 1);
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of pumping the byte stream through the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StreamProgress {
    /// New decoded text may be available.
    Decoded,
    /// Waiting on charset detection or an incomplete byte sequence.
    NeedMoreData,
}

/// The byte-level document stream.
#[derive(Debug)]
pub(crate) struct InputStream {
    raw: Vec<u8>,
    raw_consumed: usize,
    declared: Option<Encoding>,
    charset: Option<(Encoding, CharsetSource)>,
    decoder: Option<Decoder>,
    input: Input,
    finished: bool,
    claimed: bool,
}

impl InputStream {
    pub(crate) fn new(declared: Option<Encoding>) -> Self {
        Self {
            raw: Vec::new(),
            raw_consumed: 0,
            declared,
            charset: None,
            decoder: None,
            input: Input::new(),
            finished: false,
            claimed: false,
        }
    }

    pub(crate) fn append(&mut self, bytes: &[u8]) {
        debug_assert!(!self.finished, "append after finish");
        self.raw.extend_from_slice(bytes);
    }

    /// Insert bytes at the current read point (script-inserted data).
    ///
    /// The read point is the decode frontier: already-decoded text stays in
    /// place, and the inserted bytes are decoded before any buffered
    /// not-yet-decoded input.
    pub(crate) fn insert(&mut self, bytes: &[u8]) {
        self.raw
            .splice(self.raw_consumed..self.raw_consumed, bytes.iter().copied());
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn input(&self) -> &Input {
        &self.input
    }

    pub(crate) fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    pub(crate) fn charset(&self) -> Option<(Encoding, CharsetSource)> {
        self.charset
    }

    /// Adopt a charset established outside the detection ladder.
    pub(crate) fn set_charset(&mut self, encoding: Encoding, source: CharsetSource) {
        debug_assert!(
            self.charset.map_or(true, |(_, current)| source >= current),
            "charset source may only grow more authoritative"
        );
        self.charset = Some((encoding, source));
        if self.decoder.as_ref().map(Decoder::encoding) != Some(encoding) {
            self.decoder = Some(Decoder::new(encoding));
        }
    }

    /// Restart decoding from the first byte under a new charset.
    ///
    /// Discards the decoded buffer (a fresh `Input` instance, so stale spans
    /// cannot alias the new epoch) and rewinds the decode frontier.
    pub(crate) fn restart(&mut self, encoding: Encoding, source: CharsetSource) {
        self.charset = Some((encoding, source));
        self.decoder = Some(Decoder::new(encoding));
        self.raw_consumed = 0;
        self.input = Input::new();
    }

    /// Transfer the raw document buffer to the caller.
    ///
    /// The stream is unusable afterwards; callers enforce that only teardown
    /// follows.
    pub(crate) fn claim_buffer(&mut self) -> Vec<u8> {
        self.claimed = true;
        self.raw_consumed = 0;
        std::mem::take(&mut self.raw)
    }

    pub(crate) fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Run charset detection (if still pending) and decode buffered bytes.
    pub(crate) fn pump(&mut self, ctx: &mut DocumentParseContext) -> StreamProgress {
        if self.charset.is_none() {
            match detect(&self.raw, self.finished, self.declared) {
                Detection::Found {
                    encoding,
                    source,
                    skip,
                } => {
                    self.charset = Some((encoding, source));
                    self.decoder = Some(Decoder::new(encoding));
                    self.raw_consumed = skip;
                }
                Detection::NeedMoreData => return StreamProgress::NeedMoreData,
            }
        }

        let decoder = self
            .decoder
            .as_mut()
            .expect("decoder exists once charset is known");
        let before = self.input.buffer.len();
        let mut decode_errors = 0u64;
        let consumed = decoder.decode_to(
            &self.raw[self.raw_consumed..],
            self.finished,
            &mut self.input.buffer,
            &mut |_pos| decode_errors += 1,
        );
        self.raw_consumed += consumed;
        if decode_errors > 0 {
            ctx.counters.decode_errors = ctx.counters.decode_errors.saturating_add(decode_errors);
            ctx.report(
                ErrorOrigin::Input,
                ParseErrorCode::InvalidByteSequence,
                before,
            );
        }
        if self.input.buffer.len() > before {
            self.input.index_new_lines(before);
            StreamProgress::Decoded
        } else {
            StreamProgress::NeedMoreData
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_tracks_decoded_newlines() {
        let mut stream = InputStream::new(Some(Encoding::Utf8));
        let mut ctx = DocumentParseContext::new();
        stream.append(b"ab\ncd\r\nef");
        stream.finish();
        assert_eq!(stream.pump(&mut ctx), StreamProgress::Decoded);
        let input = stream.input();
        assert_eq!(input.as_str(), "ab\ncd\nef");
        assert_eq!(input.line_col(0), (1, 1));
        assert_eq!(input.line_col(4), (2, 2));
        assert_eq!(input.line_col(7), (3, 2));
    }

    #[test]
    fn detection_defers_then_defaults_tentative() {
        let mut stream = InputStream::new(None);
        let mut ctx = DocumentParseContext::new();
        stream.append(b"<p>hi</p>");
        assert_eq!(stream.pump(&mut ctx), StreamProgress::NeedMoreData);
        assert_eq!(stream.charset(), None);
        stream.finish();
        assert_eq!(stream.pump(&mut ctx), StreamProgress::Decoded);
        assert_eq!(
            stream.charset(),
            Some((Encoding::Windows1252, CharsetSource::Tentative))
        );
    }

    #[test]
    fn bom_is_consumed_not_decoded() {
        let mut stream = InputStream::new(None);
        let mut ctx = DocumentParseContext::new();
        stream.append(b"\xEF\xBB\xBFhi");
        stream.finish();
        assert_eq!(stream.pump(&mut ctx), StreamProgress::Decoded);
        assert_eq!(stream.input().as_str(), "hi");
        assert_eq!(
            stream.charset(),
            Some((Encoding::Utf8, CharsetSource::Certain))
        );
    }

    #[test]
    fn insert_lands_at_decode_frontier() {
        let mut stream = InputStream::new(Some(Encoding::Utf8));
        let mut ctx = DocumentParseContext::new();
        stream.append(b"abc");
        stream.pump(&mut ctx);
        stream.insert(b"XY");
        stream.append(b"def");
        stream.finish();
        stream.pump(&mut ctx);
        assert_eq!(stream.input().as_str(), "abcXYdef");
    }

    #[test]
    fn restart_discards_decoded_text_and_rewinds() {
        let mut stream = InputStream::new(None);
        let mut ctx = DocumentParseContext::new();
        stream.append("caf\u{E9}".as_bytes());
        stream.finish();
        stream.pump(&mut ctx);
        let first_id = stream.input().id();
        // Tentative windows-1252 read the UTF-8 accent as two chars.
        assert_eq!(stream.input().as_str(), "caf\u{C3}\u{A9}");
        stream.restart(Encoding::Utf8, CharsetSource::Confident);
        stream.pump(&mut ctx);
        assert_eq!(stream.input().as_str(), "caf\u{E9}");
        assert_ne!(stream.input().id(), first_id);
    }

    #[test]
    fn claim_buffer_returns_all_raw_bytes() {
        let mut stream = InputStream::new(Some(Encoding::Utf8));
        let mut ctx = DocumentParseContext::new();
        stream.append(b"abc");
        stream.pump(&mut ctx);
        stream.append(b"def");
        assert_eq!(stream.claim_buffer(), b"abcdef");
        assert!(stream.is_claimed());
    }
}
