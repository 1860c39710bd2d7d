//! Incremental decoders feeding the decoded input buffer.
//!
//! All decoders share the stream contract: consume as many whole characters
//! as the byte buffer allows, leave an incomplete trailing sequence for the
//! next chunk (unless the stream is finished), and replace malformed
//! sequences with U+FFFD while reporting a decode error.
//!
//! Newline normalization (CRLF -> LF, lone CR -> LF) happens here so the
//! tokenizer never sees a carriage return, with the CR state carried across
//! chunk boundaries.

use memchr::memchr;

use super::{Encoding, WINDOWS_1252_HIGH};

const REPLACEMENT: char = '\u{FFFD}';

/// Stateful decoder for one encoding.
#[derive(Debug)]
pub struct Decoder {
    encoding: Encoding,
    /// A CR ended the previous chunk; swallow an immediately following LF.
    pending_cr: bool,
}

impl Decoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending_cr: false,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decode a prefix of `bytes` into `out`, normalizing newlines.
    ///
    /// Returns the number of bytes consumed. `on_error` receives the decoded
    /// buffer offset of each malformed sequence.
    pub fn decode_to(
        &mut self,
        bytes: &[u8],
        finished: bool,
        out: &mut String,
        on_error: &mut dyn FnMut(usize),
    ) -> usize {
        match self.encoding {
            Encoding::Utf8 => self.decode_utf8(bytes, finished, out, on_error),
            Encoding::Utf16Le => self.decode_utf16(bytes, finished, out, on_error, true),
            Encoding::Utf16Be => self.decode_utf16(bytes, finished, out, on_error, false),
            Encoding::Windows1252 => self.decode_single_byte(bytes, out, |b| {
                if (0x80..=0x9F).contains(&b) {
                    WINDOWS_1252_HIGH[(b - 0x80) as usize]
                } else {
                    b as char
                }
            }),
            Encoding::Iso8859_15 => self.decode_single_byte(bytes, out, |b| match b {
                0xA4 => '\u{20AC}',
                0xA6 => '\u{0160}',
                0xA8 => '\u{0161}',
                0xB4 => '\u{017D}',
                0xB8 => '\u{017E}',
                0xBC => '\u{0152}',
                0xBD => '\u{0153}',
                0xBE => '\u{0178}',
                _ => b as char,
            }),
        }
    }

    fn decode_utf8(
        &mut self,
        bytes: &[u8],
        finished: bool,
        out: &mut String,
        on_error: &mut dyn FnMut(usize),
    ) -> usize {
        let mut consumed = 0;
        loop {
            let rest = &bytes[consumed..];
            if rest.is_empty() {
                return consumed;
            }
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.push_normalized(text, out);
                    return bytes.len();
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if valid > 0 {
                        // Unwrap justified by valid_up_to.
                        let text = std::str::from_utf8(&rest[..valid])
                            .expect("prefix below valid_up_to must be UTF-8");
                        self.push_normalized(text, out);
                        consumed += valid;
                    }
                    match err.error_len() {
                        Some(len) => {
                            on_error(out.len());
                            self.push_normalized_char(REPLACEMENT, out);
                            consumed += len;
                        }
                        None => {
                            // Incomplete tail sequence.
                            if finished {
                                on_error(out.len());
                                self.push_normalized_char(REPLACEMENT, out);
                                consumed = bytes.len();
                            }
                            return consumed;
                        }
                    }
                }
            }
        }
    }

    fn decode_utf16(
        &mut self,
        bytes: &[u8],
        finished: bool,
        out: &mut String,
        on_error: &mut dyn FnMut(usize),
        little_endian: bool,
    ) -> usize {
        let unit = |hi: u8, lo: u8| -> u16 {
            if little_endian {
                u16::from_le_bytes([hi, lo])
            } else {
                u16::from_be_bytes([hi, lo])
            }
        };

        let mut consumed = 0;
        while consumed + 2 <= bytes.len() {
            let w1 = unit(bytes[consumed], bytes[consumed + 1]);
            match w1 {
                0xD800..=0xDBFF => {
                    if consumed + 4 <= bytes.len() {
                        let w2 = unit(bytes[consumed + 2], bytes[consumed + 3]);
                        if (0xDC00..=0xDFFF).contains(&w2) {
                            let scalar = 0x10000
                                + ((u32::from(w1) - 0xD800) << 10)
                                + (u32::from(w2) - 0xDC00);
                            let ch = char::from_u32(scalar)
                                .expect("surrogate pair combines to a valid scalar");
                            self.push_normalized_char(ch, out);
                            consumed += 4;
                        } else {
                            // Unpaired lead surrogate; w2 is reprocessed.
                            on_error(out.len());
                            self.push_normalized_char(REPLACEMENT, out);
                            consumed += 2;
                        }
                    } else if finished {
                        on_error(out.len());
                        self.push_normalized_char(REPLACEMENT, out);
                        consumed += 2;
                    } else {
                        return consumed;
                    }
                }
                0xDC00..=0xDFFF => {
                    on_error(out.len());
                    self.push_normalized_char(REPLACEMENT, out);
                    consumed += 2;
                }
                _ => {
                    let ch = char::from_u32(u32::from(w1))
                        .expect("non-surrogate BMP unit is a valid scalar");
                    self.push_normalized_char(ch, out);
                    consumed += 2;
                }
            }
        }
        if finished && consumed < bytes.len() {
            // Odd trailing byte.
            on_error(out.len());
            self.push_normalized_char(REPLACEMENT, out);
            consumed = bytes.len();
        }
        consumed
    }

    fn decode_single_byte(
        &mut self,
        bytes: &[u8],
        out: &mut String,
        map: impl Fn(u8) -> char,
    ) -> usize {
        // ASCII run fast path; high bytes go through the table one at a time.
        let mut i = 0;
        while i < bytes.len() {
            let run_end = bytes[i..]
                .iter()
                .position(|&b| !b.is_ascii())
                .map_or(bytes.len(), |p| i + p);
            if run_end > i {
                let text = std::str::from_utf8(&bytes[i..run_end])
                    .expect("ASCII run must be UTF-8");
                self.push_normalized(text, out);
                i = run_end;
            }
            if i < bytes.len() {
                self.push_normalized_char(map(bytes[i]), out);
                i += 1;
            }
        }
        bytes.len()
    }

    fn push_normalized(&mut self, text: &str, out: &mut String) {
        if !self.pending_cr && memchr(b'\r', text.as_bytes()).is_none() {
            out.push_str(text);
            return;
        }
        for ch in text.chars() {
            self.push_normalized_char(ch, out);
        }
    }

    fn push_normalized_char(&mut self, ch: char, out: &mut String) {
        match ch {
            '\r' => {
                out.push('\n');
                self.pending_cr = true;
            }
            '\n' => {
                if self.pending_cr {
                    self.pending_cr = false;
                } else {
                    out.push('\n');
                }
            }
            _ => {
                self.pending_cr = false;
                out.push(ch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(encoding: Encoding, chunks: &[&[u8]]) -> (String, usize) {
        let mut decoder = Decoder::new(encoding);
        let mut out = String::new();
        let mut errors = 0usize;
        let mut buffered: Vec<u8> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            buffered.extend_from_slice(chunk);
            let finished = i + 1 == chunks.len();
            let consumed =
                decoder.decode_to(&buffered, finished, &mut out, &mut |_| errors += 1);
            buffered.drain(..consumed);
        }
        (out, errors)
    }

    #[test]
    fn utf8_split_multibyte_across_chunks() {
        let bytes = "héllo🙂".as_bytes();
        for split in 0..bytes.len() {
            let (out, errors) = decode_all(Encoding::Utf8, &[&bytes[..split], &bytes[split..]]);
            assert_eq!(out, "héllo🙂", "split at {split}");
            assert_eq!(errors, 0, "split at {split}");
        }
    }

    #[test]
    fn utf8_malformed_byte_becomes_replacement() {
        let (out, errors) = decode_all(Encoding::Utf8, &[b"a\xFFb"]);
        assert_eq!(out, "a\u{FFFD}b");
        assert_eq!(errors, 1);
    }

    #[test]
    fn utf8_truncated_tail_at_eof_is_an_error() {
        let (out, errors) = decode_all(Encoding::Utf8, &[b"ab\xE2\x82"]);
        assert_eq!(out, "ab\u{FFFD}");
        assert_eq!(errors, 1);
    }

    #[test]
    fn newline_normalization_is_chunk_stable() {
        for chunks in [
            vec![b"a\r\nb\rc".as_ref()],
            vec![b"a\r".as_ref(), b"\nb\rc".as_ref()],
            vec![b"a".as_ref(), b"\r".as_ref(), b"\n".as_ref(), b"b\rc".as_ref()],
        ] {
            let (out, _) = decode_all(Encoding::Utf8, &chunks);
            assert_eq!(out, "a\nb\nc");
        }
    }

    #[test]
    fn utf16le_with_surrogate_pair() {
        // "a🙂" little-endian: 0x0061, 0xD83D 0xDE42
        let bytes: &[u8] = &[0x61, 0x00, 0x3D, 0xD8, 0x42, 0xDE];
        for split in (0..=bytes.len()).step_by(1) {
            let (out, errors) =
                decode_all(Encoding::Utf16Le, &[&bytes[..split], &bytes[split..]]);
            assert_eq!(out, "a🙂", "split at {split}");
            assert_eq!(errors, 0);
        }
    }

    #[test]
    fn utf16_unpaired_surrogate_is_replaced() {
        let bytes: &[u8] = &[0x3D, 0xD8, 0x61, 0x00];
        let (out, errors) = decode_all(Encoding::Utf16Le, &[bytes]);
        assert_eq!(out, "\u{FFFD}a");
        assert_eq!(errors, 1);
    }

    #[test]
    fn windows_1252_high_bytes_map_through_table() {
        let (out, errors) = decode_all(Encoding::Windows1252, &[b"\x80 caf\xE9 \x93x\x94"]);
        assert_eq!(out, "\u{20AC} caf\u{E9} \u{201C}x\u{201D}");
        assert_eq!(errors, 0);
    }

    #[test]
    fn iso8859_15_differs_from_latin1_where_revised() {
        let (out, _) = decode_all(Encoding::Iso8859_15, &[b"\xA4\xBC\xBE\xE9"]);
        assert_eq!(out, "\u{20AC}\u{0152}\u{0178}\u{E9}");
    }
}
