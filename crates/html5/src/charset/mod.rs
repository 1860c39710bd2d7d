//! Character encodings: labels, detection, and decoding.

mod detect;
mod decode;

pub use decode::Decoder;
pub(crate) use detect::{detect, meta_content_charset, prescan, Detection};

/// Character encodings the engine can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
    Iso8859_15,
}

impl Encoding {
    /// Canonical name, as reported by `read_charset` and `change_encoding`.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Windows1252 => "windows-1252",
            Encoding::Iso8859_15 => "ISO-8859-15",
        }
    }
}

/// How the current charset was established.
///
/// Ordering is significant: a later source may only replace an earlier one if
/// it is strictly more authoritative, and once `Confident` or `Certain` the
/// charset never changes for the remainder of the parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CharsetSource {
    Unknown,
    /// Fallback default; a meta sniff or an explicit change may replace it.
    Tentative,
    /// Determined by document content (meta sniff).
    Confident,
    /// Determined by BOM or caller declaration.
    Certain,
}

/// Outcome of resolving an encoding label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelResolution {
    /// A decoder exists for this encoding.
    Supported(Encoding),
    /// The label names a real encoding this build carries no decoder for.
    Recognized(&'static str),
}

/// Resolve an encoding label to an encoding.
///
/// Labels are matched ASCII-case-insensitively after trimming ASCII
/// whitespace, per the WHATWG label registry. Returns `None` for labels that
/// name no known encoding.
pub fn resolve_label(label: &[u8]) -> Option<LabelResolution> {
    let start = label.iter().position(|b| !b.is_ascii_whitespace())?;
    let end = label.iter().rposition(|b| !b.is_ascii_whitespace())? + 1;
    let label = &label[start..end];

    // Longest label in the registry is 19 bytes; fold into a stack buffer.
    let mut folded = [0u8; 24];
    if label.len() > folded.len() {
        return None;
    }
    for (dst, src) in folded.iter_mut().zip(label) {
        *dst = src.to_ascii_lowercase();
    }
    let label = &folded[..label.len()];

    let supported = |enc| Some(LabelResolution::Supported(enc));
    let recognized = |name| Some(LabelResolution::Recognized(name));

    match label {
        b"unicode-1-1-utf-8" | b"unicode11utf8" | b"unicode20utf8" | b"utf-8" | b"utf8"
        | b"x-unicode20utf8" => supported(Encoding::Utf8),

        b"unicodefffe" | b"utf-16be" => supported(Encoding::Utf16Be),
        b"csunicode" | b"iso-10646-ucs-2" | b"ucs-2" | b"unicode" | b"unicodefeff"
        | b"utf-16" | b"utf-16le" => supported(Encoding::Utf16Le),

        b"ansi_x3.4-1968" | b"ascii" | b"cp1252" | b"cp819" | b"csisolatin1" | b"ibm819"
        | b"iso-8859-1" | b"iso-ir-100" | b"iso8859-1" | b"iso88591" | b"iso_8859-1"
        | b"iso_8859-1:1987" | b"l1" | b"latin1" | b"us-ascii" | b"windows-1252"
        | b"x-cp1252" | b"x-user-defined" => supported(Encoding::Windows1252),

        b"csisolatin9" | b"iso-8859-15" | b"iso8859-15" | b"iso885915" | b"iso_8859-15"
        | b"l9" => supported(Encoding::Iso8859_15),

        b"csisolatin2" | b"iso-8859-2" | b"iso-ir-101" | b"iso8859-2" | b"iso88592"
        | b"iso_8859-2" | b"iso_8859-2:1987" | b"l2" | b"latin2" => recognized("ISO-8859-2"),
        b"csisolatin3" | b"iso-8859-3" | b"iso-ir-109" | b"iso8859-3" | b"iso88593"
        | b"iso_8859-3" | b"iso_8859-3:1988" | b"l3" | b"latin3" => recognized("ISO-8859-3"),
        b"csisolatin4" | b"iso-8859-4" | b"iso-ir-110" | b"iso8859-4" | b"iso88594"
        | b"iso_8859-4" | b"iso_8859-4:1988" | b"l4" | b"latin4" => recognized("ISO-8859-4"),
        b"csisolatincyrillic" | b"cyrillic" | b"iso-8859-5" | b"iso-ir-144" | b"iso8859-5"
        | b"iso88595" | b"iso_8859-5" | b"iso_8859-5:1988" => recognized("ISO-8859-5"),
        b"arabic" | b"asmo-708" | b"csiso88596e" | b"csiso88596i" | b"csisolatinarabic"
        | b"ecma-114" | b"iso-8859-6" | b"iso-8859-6-e" | b"iso-8859-6-i" | b"iso-ir-127"
        | b"iso8859-6" | b"iso88596" | b"iso_8859-6" | b"iso_8859-6:1987" => {
            recognized("ISO-8859-6")
        }
        b"csisolatingreek" | b"ecma-118" | b"elot_928" | b"greek" | b"greek8"
        | b"iso-8859-7" | b"iso-ir-126" | b"iso8859-7" | b"iso88597" | b"iso_8859-7"
        | b"iso_8859-7:1987" | b"sun_eu_greek" => recognized("ISO-8859-7"),
        b"csiso88598e" | b"csisolatinhebrew" | b"hebrew" | b"iso-8859-8" | b"iso-8859-8-e"
        | b"iso-ir-138" | b"iso8859-8" | b"iso88598" | b"iso_8859-8" | b"iso_8859-8:1988"
        | b"visual" => recognized("ISO-8859-8"),
        b"csiso88598i" | b"iso-8859-8-i" | b"logical" => recognized("ISO-8859-8-I"),
        b"csisolatin6" | b"iso-8859-10" | b"iso-ir-157" | b"iso8859-10" | b"iso885910"
        | b"l6" | b"latin6" => recognized("ISO-8859-10"),
        b"iso-8859-13" | b"iso8859-13" | b"iso885913" => recognized("ISO-8859-13"),
        b"iso-8859-14" | b"iso8859-14" | b"iso885914" => recognized("ISO-8859-14"),
        b"iso-8859-16" | b"iso_8859-16" => recognized("ISO-8859-16"),

        b"dos-874" | b"iso-8859-11" | b"iso8859-11" | b"iso885911" | b"tis-620"
        | b"windows-874" => recognized("windows-874"),
        b"cp1250" | b"windows-1250" | b"x-cp1250" => recognized("windows-1250"),
        b"cp1251" | b"windows-1251" | b"x-cp1251" => recognized("windows-1251"),
        b"cp1253" | b"windows-1253" | b"x-cp1253" => recognized("windows-1253"),
        b"cp1254" | b"csisolatin5" | b"iso-8859-9" | b"iso-ir-148" | b"iso8859-9"
        | b"iso88599" | b"iso_8859-9" | b"iso_8859-9:1989" | b"l5" | b"latin5"
        | b"windows-1254" | b"x-cp1254" => recognized("windows-1254"),
        b"cp1255" | b"windows-1255" | b"x-cp1255" => recognized("windows-1255"),
        b"cp1256" | b"windows-1256" | b"x-cp1256" => recognized("windows-1256"),
        b"cp1257" | b"windows-1257" | b"x-cp1257" => recognized("windows-1257"),
        b"cp1258" | b"windows-1258" | b"x-cp1258" => recognized("windows-1258"),

        _ => None,
    }
}

/// The windows-1252 mapping for bytes 0x80..=0x9F.
///
/// Shared between the windows-1252 decoder and the numeric character
/// reference override table. Entries that are C1 controls in windows-1252
/// stay C1 controls here.
pub(crate) static WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}',
    '\u{2021}', '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}',
    '\u{017D}', '\u{008F}', '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
    '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
    '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_case_insensitively_with_whitespace() {
        assert_eq!(
            resolve_label(b"  UTF-8 "),
            Some(LabelResolution::Supported(Encoding::Utf8))
        );
        assert_eq!(
            resolve_label(b"Latin1"),
            Some(LabelResolution::Supported(Encoding::Windows1252))
        );
        assert_eq!(
            resolve_label(b"utf-16"),
            Some(LabelResolution::Supported(Encoding::Utf16Le))
        );
    }

    #[test]
    fn recognized_labels_without_decoder_are_distinguished() {
        assert_eq!(
            resolve_label(b"koi8-r"),
            None,
            "labels outside the windows-*/iso-8859-*/utf families are unknown"
        );
        assert_eq!(
            resolve_label(b"windows-1251"),
            Some(LabelResolution::Recognized("windows-1251"))
        );
        assert_eq!(
            resolve_label(b"iso-8859-7"),
            Some(LabelResolution::Recognized("ISO-8859-7"))
        );
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert_eq!(resolve_label(b""), None);
        assert_eq!(resolve_label(b"   "), None);
        assert_eq!(resolve_label(b"not-a-charset"), None);
    }

    #[test]
    fn high_table_has_euro_and_controls_in_place() {
        assert_eq!(WINDOWS_1252_HIGH[0x00], '\u{20AC}');
        assert_eq!(WINDOWS_1252_HIGH[0x81 - 0x80], '\u{0081}');
        assert_eq!(WINDOWS_1252_HIGH[0x99 - 0x80], '\u{2122}');
        assert_eq!(WINDOWS_1252_HIGH[0x9F - 0x80], '\u{0178}');
    }
}
