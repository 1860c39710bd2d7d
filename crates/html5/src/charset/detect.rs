//! Encoding detection: BOM sniffing and the meta prescan.

use memchr::memchr;

use super::{resolve_label, CharsetSource, Encoding, LabelResolution};

/// Bytes inspected by the prescan before giving up.
const MAX_PRESCAN_LENGTH: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Detection {
    /// Charset established; `skip` leading bytes (a BOM) must not be decoded.
    Found {
        encoding: Encoding,
        source: CharsetSource,
        skip: usize,
    },
    /// Not enough bytes buffered to commit yet.
    NeedMoreData,
}

/// Run the detection ladder over the buffered document prefix.
///
/// Stages, most authoritative first: BOM (certain), caller declaration
/// (certain), meta prescan over the first 1024 bytes (confident), fallback
/// windows-1252 (tentative). Detection defers until the prescan window is
/// full or the stream is finished.
pub(crate) fn detect(bytes: &[u8], finished: bool, declared: Option<Encoding>) -> Detection {
    match parse_bom(bytes, finished) {
        BomResult::Found(encoding, skip) => {
            return Detection::Found {
                encoding,
                source: CharsetSource::Certain,
                skip,
            };
        }
        BomResult::NeedMoreData => return Detection::NeedMoreData,
        BomResult::Absent => {}
    }

    if let Some(encoding) = declared {
        return Detection::Found {
            encoding,
            source: CharsetSource::Certain,
            skip: 0,
        };
    }

    if bytes.len() < MAX_PRESCAN_LENGTH && !finished {
        return Detection::NeedMoreData;
    }

    if let Some(encoding) = prescan(bytes) {
        return Detection::Found {
            encoding,
            source: CharsetSource::Confident,
            skip: 0,
        };
    }

    Detection::Found {
        encoding: Encoding::Windows1252,
        source: CharsetSource::Tentative,
        skip: 0,
    }
}

enum BomResult {
    Found(Encoding, usize),
    Absent,
    NeedMoreData,
}

fn parse_bom(bytes: &[u8], finished: bool) -> BomResult {
    const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
    const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];
    const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

    if bytes.starts_with(UTF8_BOM) {
        return BomResult::Found(Encoding::Utf8, 3);
    }
    if bytes.starts_with(UTF16BE_BOM) {
        return BomResult::Found(Encoding::Utf16Be, 2);
    }
    if bytes.starts_with(UTF16LE_BOM) {
        return BomResult::Found(Encoding::Utf16Le, 2);
    }
    // A strict prefix of a BOM may still complete with the next chunk.
    if !finished
        && !bytes.is_empty()
        && (UTF8_BOM.starts_with(bytes) || UTF16BE_BOM.starts_with(bytes)
            || UTF16LE_BOM.starts_with(bytes))
    {
        return BomResult::NeedMoreData;
    }
    if bytes.is_empty() && !finished {
        return BomResult::NeedMoreData;
    }
    BomResult::Absent
}

/// Prescan a byte stream prefix for a meta-declared encoding.
///
/// Best-effort by construction: it runs over at most the first 1024 bytes and
/// assumes an ASCII-compatible encoding. UTF-16 results are coerced to UTF-8
/// (a document sniffed as UTF-16 through ASCII-visible markup cannot actually
/// be UTF-16).
pub(crate) fn prescan(bytes: &[u8]) -> Option<Encoding> {
    let bytes = &bytes[..bytes.len().min(MAX_PRESCAN_LENGTH)];
    let mut position = 0;

    while position < bytes.len() {
        let Some(rel) = memchr(b'<', &bytes[position..]) else {
            return None;
        };
        position += rel;

        if bytes[position..].starts_with(b"<!--") {
            // Skip over the comment, including one containing a fake meta.
            match find_subslice(&bytes[position + 2..], b"-->") {
                Some(p) => {
                    position += 2 + p + 3;
                    continue;
                }
                None => return None,
            }
        }

        if starts_with_meta(&bytes[position..]) {
            position += 6;
            if let Some(encoding) = prescan_meta_attributes(bytes, &mut position) {
                return Some(encoding);
            }
            continue;
        }

        if is_plain_tag_open(&bytes[position..]) {
            // Skip the tag name, then parse and discard the attributes so a
            // `>` inside a quoted value does not end the tag early.
            match bytes[position..]
                .iter()
                .position(|&b| b.is_ascii_whitespace() || b == b'>')
            {
                Some(p) => position += p,
                None => return None,
            }
            while get_attribute(bytes, &mut position).is_some() {}
            position += 1;
            continue;
        }

        if bytes[position..].starts_with(b"<!")
            || bytes[position..].starts_with(b"</")
            || bytes[position..].starts_with(b"<?")
        {
            match memchr(b'>', &bytes[position..]) {
                Some(p) => {
                    position += p + 1;
                    continue;
                }
                None => return None,
            }
        }

        position += 1;
    }

    None
}

fn starts_with_meta(bytes: &[u8]) -> bool {
    bytes.len() >= 6
        && bytes[..5].eq_ignore_ascii_case(b"<meta")
        && (bytes[5].is_ascii_whitespace() || bytes[5] == b'/')
}

fn is_plain_tag_open(bytes: &[u8]) -> bool {
    match bytes {
        [b'<', b'/', a, ..] => a.is_ascii_alphabetic(),
        [b'<', a, ..] => a.is_ascii_alphabetic(),
        _ => false,
    }
}

fn prescan_meta_attributes(bytes: &[u8], position: &mut usize) -> Option<Encoding> {
    let mut seen_http_equiv = false;
    let mut seen_content = false;
    let mut seen_charset = false;
    let mut got_pragma = false;
    let mut need_pragma: Option<bool> = None;
    let mut charset: Option<LabelResolution> = None;

    while let Some((name, value)) = get_attribute(bytes, position) {
        if name.eq_ignore_ascii_case(b"http-equiv") {
            if !seen_http_equiv {
                seen_http_equiv = true;
                if value.eq_ignore_ascii_case(b"content-type") {
                    got_pragma = true;
                }
            }
        } else if name.eq_ignore_ascii_case(b"content") {
            if !seen_content {
                seen_content = true;
                if charset.is_none() {
                    if let Some(resolution) = charset_from_content(value) {
                        charset = Some(resolution);
                        need_pragma = Some(true);
                    }
                }
            }
        } else if name.eq_ignore_ascii_case(b"charset") && !seen_charset {
            seen_charset = true;
            charset = resolve_label(value);
            need_pragma = Some(false);
        }
    }

    match (need_pragma, got_pragma) {
        (Some(false), _) | (Some(true), true) => match charset? {
            // A UTF-16 meta in ASCII-visible markup lies about itself.
            LabelResolution::Supported(Encoding::Utf16Be)
            | LabelResolution::Supported(Encoding::Utf16Le) => Some(Encoding::Utf8),
            LabelResolution::Supported(encoding) => Some(encoding),
            // Recognized but undecodable: ignore the sniff and stay on the
            // fallback rather than failing the whole parse.
            LabelResolution::Recognized(_) => None,
        },
        _ => None,
    }
}

/// Extract `charset=...` from a `content` attribute value.
fn charset_from_content(content: &[u8]) -> Option<LabelResolution> {
    resolve_label(meta_content_charset(content)?)
}

/// The raw label of a `charset=...` clause inside a `content` attribute.
///
/// Shared with the tree builder, which re-runs this extraction when a `meta`
/// element is actually inserted (the prescan only sees the first kilobyte).
pub(crate) fn meta_content_charset(content: &[u8]) -> Option<&[u8]> {
    let mut position = 0;
    loop {
        let rel = content[position..]
            .windows(7)
            .position(|w| w.eq_ignore_ascii_case(b"charset"))?;
        position += rel + 7;

        let rel = content[position..].iter().position(|b| !b.is_ascii_whitespace())?;
        position += rel;
        if content[position] != b'=' {
            continue;
        }
        position += 1;

        let rel = content[position..].iter().position(|b| !b.is_ascii_whitespace())?;
        position += rel;

        return match content[position] {
            quote @ (b'"' | b'\'') => {
                position += 1;
                let len = content[position..].iter().position(|&b| b == quote)?;
                Some(&content[position..position + len])
            }
            _ => {
                let len = content[position..]
                    .iter()
                    .position(|&b| b.is_ascii_whitespace() || b == b';')
                    .unwrap_or(content.len() - position);
                Some(&content[position..position + len])
            }
        };
    }
}

/// Parse one attribute at `position`; `None` at tag end or buffer end.
///
/// Returns subslices of `bytes`; callers must compare case-insensitively
/// since nothing is folded in place.
fn get_attribute<'a>(bytes: &'a [u8], position: &mut usize) -> Option<(&'a [u8], &'a [u8])> {
    match bytes[*position..]
        .iter()
        .position(|&b| !b.is_ascii_whitespace() && b != b'/')
    {
        Some(p) => *position += p,
        None => {
            *position = bytes.len();
            return None;
        }
    }
    if bytes[*position] == b'>' {
        return None;
    }

    let name_start = *position;
    while *position < bytes.len() {
        match bytes[*position] {
            b'=' if *position > name_start => break,
            b if b.is_ascii_whitespace() => break,
            b'/' | b'>' => {
                return Some((&bytes[name_start..*position], &[]));
            }
            _ => *position += 1,
        }
    }
    let name = &bytes[name_start..*position];

    match bytes[*position..].iter().position(|b| !b.is_ascii_whitespace()) {
        Some(p) => *position += p,
        None => {
            *position = bytes.len();
            return Some((name, &[]));
        }
    }
    if bytes[*position] != b'=' {
        return Some((name, &[]));
    }
    *position += 1;

    match bytes[*position..].iter().position(|b| !b.is_ascii_whitespace()) {
        Some(p) => *position += p,
        None => {
            *position = bytes.len();
            return Some((name, &[]));
        }
    }

    match bytes[*position] {
        quote @ (b'"' | b'\'') => {
            *position += 1;
            let value_start = *position;
            match bytes[*position..].iter().position(|&b| b == quote) {
                Some(p) => {
                    *position += p + 1;
                    Some((name, &bytes[value_start..*position - 1]))
                }
                // Unterminated quoted value: nothing usable in the window.
                None => {
                    *position = bytes.len();
                    None
                }
            }
        }
        b'>' => Some((name, &[])),
        _ => {
            let value_start = *position;
            match bytes[*position..]
                .iter()
                .position(|&b| b.is_ascii_whitespace() || b == b'>')
            {
                Some(p) => {
                    *position += p;
                    Some((name, &bytes[value_start..*position]))
                }
                None => {
                    *position = bytes.len();
                    None
                }
            }
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_wins_over_everything() {
        let detection = detect(b"\xEF\xBB\xBF<html>", true, Some(Encoding::Windows1252));
        assert_eq!(
            detection,
            Detection::Found {
                encoding: Encoding::Utf8,
                source: CharsetSource::Certain,
                skip: 3,
            }
        );
    }

    #[test]
    fn partial_bom_defers_until_more_data() {
        assert_eq!(detect(b"\xEF\xBB", false, None), Detection::NeedMoreData);
        // Once the stream ends the prefix is just mojibake content.
        assert!(matches!(
            detect(b"\xEF\xBB", true, None),
            Detection::Found {
                encoding: Encoding::Windows1252,
                source: CharsetSource::Tentative,
                ..
            }
        ));
    }

    #[test]
    fn declared_charset_is_certain() {
        assert_eq!(
            detect(b"<html>", true, Some(Encoding::Utf8)),
            Detection::Found {
                encoding: Encoding::Utf8,
                source: CharsetSource::Certain,
                skip: 0,
            }
        );
    }

    #[test]
    fn detection_waits_for_prescan_window() {
        assert_eq!(detect(b"<html><head>", false, None), Detection::NeedMoreData);
        assert!(matches!(
            detect(b"<html><head>", true, None),
            Detection::Found {
                source: CharsetSource::Tentative,
                ..
            }
        ));
    }

    #[test]
    fn prescan_finds_meta_charset() {
        assert_eq!(
            prescan(b"<html><head><meta charset=utf-8></head>"),
            Some(Encoding::Utf8)
        );
        assert_eq!(
            prescan(b"<META CHARSET=\"ISO-8859-15\">"),
            Some(Encoding::Iso8859_15)
        );
    }

    #[test]
    fn prescan_honors_content_type_pragma() {
        assert_eq!(
            prescan(b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\">"),
            Some(Encoding::Utf8)
        );
        // Without the pragma, a content attribute alone is not authoritative.
        assert_eq!(
            prescan(b"<meta content=\"text/html; charset=utf-8\">"),
            None
        );
    }

    #[test]
    fn prescan_skips_comments_and_other_tags() {
        assert_eq!(
            prescan(b"<!-- <meta charset=koi8-r> --><meta charset=utf-8>"),
            Some(Encoding::Utf8)
        );
        assert_eq!(
            prescan(b"<title a=\"<meta charset=utf-8>\"></title>"),
            None
        );
    }

    #[test]
    fn prescan_coerces_utf16_to_utf8() {
        assert_eq!(prescan(b"<meta charset=utf-16>"), Some(Encoding::Utf8));
    }

    #[test]
    fn prescan_first_charset_attribute_wins() {
        assert_eq!(
            prescan(b"<meta charset=utf-8 charset=windows-1252>"),
            Some(Encoding::Utf8)
        );
    }
}
