//! Named and numeric character references.
//!
//! The named table is an explicitly bounded subset of the WHATWG registry:
//! complete for every legacy name that may appear without a terminating
//! semicolon, plus the Latin-1, Greek, punctuation, arrow, and math names in
//! common use. Multi-code-point expansions from the long tail of the registry
//! are not carried. Matching is longest-prefix with the semicolon-terminated
//! form preferred, exactly as the tokenizer's reference sub-machine requires.

use std::sync::OnceLock;

use crate::errors::ParseErrorCode;

/// One named reference: name (without `&` or `;`), expansion, and whether the
/// legacy semicolon-less form is allowed.
#[derive(Clone, Copy, Debug)]
struct Entity {
    name: &'static str,
    expansion: char,
    legacy: bool,
}

const fn legacy(name: &'static str, expansion: char) -> Entity {
    Entity {
        name,
        expansion,
        legacy: true,
    }
}

const fn strict(name: &'static str, expansion: char) -> Entity {
    Entity {
        name,
        expansion,
        legacy: false,
    }
}

/// Grouped by origin; canonical order is established once at first use.
static ENTITIES: &[Entity] = &[
    // Markup-significant and legacy uppercase aliases.
    legacy("amp", '&'),
    legacy("AMP", '&'),
    legacy("lt", '<'),
    legacy("LT", '<'),
    legacy("gt", '>'),
    legacy("GT", '>'),
    legacy("quot", '"'),
    legacy("QUOT", '"'),
    strict("apos", '\''),
    legacy("copy", '\u{A9}'),
    legacy("COPY", '\u{A9}'),
    legacy("reg", '\u{AE}'),
    legacy("REG", '\u{AE}'),
    // Latin-1 letters.
    legacy("AElig", '\u{C6}'),
    legacy("Aacute", '\u{C1}'),
    legacy("Acirc", '\u{C2}'),
    legacy("Agrave", '\u{C0}'),
    legacy("Aring", '\u{C5}'),
    legacy("Atilde", '\u{C3}'),
    legacy("Auml", '\u{C4}'),
    legacy("Ccedil", '\u{C7}'),
    legacy("ETH", '\u{D0}'),
    legacy("Eacute", '\u{C9}'),
    legacy("Ecirc", '\u{CA}'),
    legacy("Egrave", '\u{C8}'),
    legacy("Euml", '\u{CB}'),
    legacy("Iacute", '\u{CD}'),
    legacy("Icirc", '\u{CE}'),
    legacy("Igrave", '\u{CC}'),
    legacy("Iuml", '\u{CF}'),
    legacy("Ntilde", '\u{D1}'),
    legacy("Oacute", '\u{D3}'),
    legacy("Ocirc", '\u{D4}'),
    legacy("Ograve", '\u{D2}'),
    legacy("Oslash", '\u{D8}'),
    legacy("Otilde", '\u{D5}'),
    legacy("Ouml", '\u{D6}'),
    legacy("THORN", '\u{DE}'),
    legacy("Uacute", '\u{DA}'),
    legacy("Ucirc", '\u{DB}'),
    legacy("Ugrave", '\u{D9}'),
    legacy("Uuml", '\u{DC}'),
    legacy("Yacute", '\u{DD}'),
    legacy("aacute", '\u{E1}'),
    legacy("acirc", '\u{E2}'),
    legacy("aelig", '\u{E6}'),
    legacy("agrave", '\u{E0}'),
    legacy("aring", '\u{E5}'),
    legacy("atilde", '\u{E3}'),
    legacy("auml", '\u{E4}'),
    legacy("ccedil", '\u{E7}'),
    legacy("eacute", '\u{E9}'),
    legacy("ecirc", '\u{EA}'),
    legacy("egrave", '\u{E8}'),
    legacy("eth", '\u{F0}'),
    legacy("euml", '\u{EB}'),
    legacy("iacute", '\u{ED}'),
    legacy("icirc", '\u{EE}'),
    legacy("igrave", '\u{EC}'),
    legacy("iuml", '\u{EF}'),
    legacy("ntilde", '\u{F1}'),
    legacy("oacute", '\u{F3}'),
    legacy("ocirc", '\u{F4}'),
    legacy("ograve", '\u{F2}'),
    legacy("oslash", '\u{F8}'),
    legacy("otilde", '\u{F5}'),
    legacy("ouml", '\u{F6}'),
    legacy("szlig", '\u{DF}'),
    legacy("thorn", '\u{FE}'),
    legacy("uacute", '\u{FA}'),
    legacy("ucirc", '\u{FB}'),
    legacy("ugrave", '\u{F9}'),
    legacy("uuml", '\u{FC}'),
    legacy("yacute", '\u{FD}'),
    legacy("yuml", '\u{FF}'),
    // Latin-1 punctuation and symbols.
    legacy("nbsp", '\u{A0}'),
    legacy("iexcl", '\u{A1}'),
    legacy("cent", '\u{A2}'),
    legacy("pound", '\u{A3}'),
    legacy("curren", '\u{A4}'),
    legacy("yen", '\u{A5}'),
    legacy("brvbar", '\u{A6}'),
    legacy("sect", '\u{A7}'),
    legacy("uml", '\u{A8}'),
    legacy("ordf", '\u{AA}'),
    legacy("laquo", '\u{AB}'),
    legacy("not", '\u{AC}'),
    legacy("shy", '\u{AD}'),
    legacy("macr", '\u{AF}'),
    legacy("deg", '\u{B0}'),
    legacy("plusmn", '\u{B1}'),
    legacy("sup2", '\u{B2}'),
    legacy("sup3", '\u{B3}'),
    legacy("acute", '\u{B4}'),
    legacy("micro", '\u{B5}'),
    legacy("para", '\u{B6}'),
    legacy("middot", '\u{B7}'),
    legacy("cedil", '\u{B8}'),
    legacy("sup1", '\u{B9}'),
    legacy("ordm", '\u{BA}'),
    legacy("raquo", '\u{BB}'),
    legacy("frac14", '\u{BC}'),
    legacy("frac12", '\u{BD}'),
    legacy("frac34", '\u{BE}'),
    legacy("iquest", '\u{BF}'),
    legacy("times", '\u{D7}'),
    legacy("divide", '\u{F7}'),
    // Latin Extended and spacing modifiers.
    strict("OElig", '\u{152}'),
    strict("oelig", '\u{153}'),
    strict("Scaron", '\u{160}'),
    strict("scaron", '\u{161}'),
    strict("Yuml", '\u{178}'),
    strict("fnof", '\u{192}'),
    strict("circ", '\u{2C6}'),
    strict("tilde", '\u{2DC}'),
    // Greek.
    strict("Alpha", '\u{391}'),
    strict("Beta", '\u{392}'),
    strict("Gamma", '\u{393}'),
    strict("Delta", '\u{394}'),
    strict("Epsilon", '\u{395}'),
    strict("Zeta", '\u{396}'),
    strict("Eta", '\u{397}'),
    strict("Theta", '\u{398}'),
    strict("Iota", '\u{399}'),
    strict("Kappa", '\u{39A}'),
    strict("Lambda", '\u{39B}'),
    strict("Mu", '\u{39C}'),
    strict("Nu", '\u{39D}'),
    strict("Xi", '\u{39E}'),
    strict("Omicron", '\u{39F}'),
    strict("Pi", '\u{3A0}'),
    strict("Rho", '\u{3A1}'),
    strict("Sigma", '\u{3A3}'),
    strict("Tau", '\u{3A4}'),
    strict("Upsilon", '\u{3A5}'),
    strict("Phi", '\u{3A6}'),
    strict("Chi", '\u{3A7}'),
    strict("Psi", '\u{3A8}'),
    strict("Omega", '\u{3A9}'),
    strict("alpha", '\u{3B1}'),
    strict("beta", '\u{3B2}'),
    strict("gamma", '\u{3B3}'),
    strict("delta", '\u{3B4}'),
    strict("epsilon", '\u{3B5}'),
    strict("zeta", '\u{3B6}'),
    strict("eta", '\u{3B7}'),
    strict("theta", '\u{3B8}'),
    strict("iota", '\u{3B9}'),
    strict("kappa", '\u{3BA}'),
    strict("lambda", '\u{3BB}'),
    strict("mu", '\u{3BC}'),
    strict("nu", '\u{3BD}'),
    strict("xi", '\u{3BE}'),
    strict("omicron", '\u{3BF}'),
    strict("pi", '\u{3C0}'),
    strict("rho", '\u{3C1}'),
    strict("sigmaf", '\u{3C2}'),
    strict("sigma", '\u{3C3}'),
    strict("tau", '\u{3C4}'),
    strict("upsilon", '\u{3C5}'),
    strict("phi", '\u{3C6}'),
    strict("chi", '\u{3C7}'),
    strict("psi", '\u{3C8}'),
    strict("omega", '\u{3C9}'),
    strict("thetasym", '\u{3D1}'),
    strict("upsih", '\u{3D2}'),
    strict("piv", '\u{3D6}'),
    // General punctuation.
    strict("ensp", '\u{2002}'),
    strict("emsp", '\u{2003}'),
    strict("thinsp", '\u{2009}'),
    strict("zwnj", '\u{200C}'),
    strict("zwj", '\u{200D}'),
    strict("lrm", '\u{200E}'),
    strict("rlm", '\u{200F}'),
    strict("ndash", '\u{2013}'),
    strict("mdash", '\u{2014}'),
    strict("lsquo", '\u{2018}'),
    strict("rsquo", '\u{2019}'),
    strict("sbquo", '\u{201A}'),
    strict("ldquo", '\u{201C}'),
    strict("rdquo", '\u{201D}'),
    strict("bdquo", '\u{201E}'),
    strict("dagger", '\u{2020}'),
    strict("Dagger", '\u{2021}'),
    strict("bull", '\u{2022}'),
    strict("hellip", '\u{2026}'),
    strict("permil", '\u{2030}'),
    strict("prime", '\u{2032}'),
    strict("Prime", '\u{2033}'),
    strict("lsaquo", '\u{2039}'),
    strict("rsaquo", '\u{203A}'),
    strict("oline", '\u{203E}'),
    strict("frasl", '\u{2044}'),
    strict("euro", '\u{20AC}'),
    // Letterlike symbols.
    strict("image", '\u{2111}'),
    strict("weierp", '\u{2118}'),
    strict("real", '\u{211C}'),
    strict("trade", '\u{2122}'),
    strict("alefsym", '\u{2135}'),
    // Arrows.
    strict("larr", '\u{2190}'),
    strict("uarr", '\u{2191}'),
    strict("rarr", '\u{2192}'),
    strict("darr", '\u{2193}'),
    strict("harr", '\u{2194}'),
    strict("crarr", '\u{21B5}'),
    strict("lArr", '\u{21D0}'),
    strict("uArr", '\u{21D1}'),
    strict("rArr", '\u{21D2}'),
    strict("dArr", '\u{21D3}'),
    strict("hArr", '\u{21D4}'),
    // Mathematical operators.
    strict("forall", '\u{2200}'),
    strict("part", '\u{2202}'),
    strict("exist", '\u{2203}'),
    strict("empty", '\u{2205}'),
    strict("nabla", '\u{2207}'),
    strict("isin", '\u{2208}'),
    strict("notin", '\u{2209}'),
    strict("ni", '\u{220B}'),
    strict("prod", '\u{220F}'),
    strict("sum", '\u{2211}'),
    strict("minus", '\u{2212}'),
    strict("lowast", '\u{2217}'),
    strict("radic", '\u{221A}'),
    strict("prop", '\u{221D}'),
    strict("infin", '\u{221E}'),
    strict("ang", '\u{2220}'),
    strict("and", '\u{2227}'),
    strict("or", '\u{2228}'),
    strict("cap", '\u{2229}'),
    strict("cup", '\u{222A}'),
    strict("int", '\u{222B}'),
    strict("there4", '\u{2234}'),
    strict("sim", '\u{223C}'),
    strict("cong", '\u{2245}'),
    strict("asymp", '\u{2248}'),
    strict("ne", '\u{2260}'),
    strict("equiv", '\u{2261}'),
    strict("le", '\u{2264}'),
    strict("ge", '\u{2265}'),
    strict("sub", '\u{2282}'),
    strict("sup", '\u{2283}'),
    strict("nsub", '\u{2284}'),
    strict("sube", '\u{2286}'),
    strict("supe", '\u{2287}'),
    strict("oplus", '\u{2295}'),
    strict("otimes", '\u{2297}'),
    strict("perp", '\u{22A5}'),
    strict("sdot", '\u{22C5}'),
    // Miscellaneous technical.
    strict("lceil", '\u{2308}'),
    strict("rceil", '\u{2309}'),
    strict("lfloor", '\u{230A}'),
    strict("rfloor", '\u{230B}'),
    strict("lang", '\u{27E8}'),
    strict("rang", '\u{27E9}'),
    // Shapes and suits.
    strict("loz", '\u{25CA}'),
    strict("spades", '\u{2660}'),
    strict("clubs", '\u{2663}'),
    strict("hearts", '\u{2665}'),
    strict("diams", '\u{2666}'),
];

fn sorted_entities() -> &'static [Entity] {
    static SORTED: OnceLock<Vec<Entity>> = OnceLock::new();
    SORTED.get_or_init(|| {
        let mut entities = ENTITIES.to_vec();
        entities.sort_unstable_by(|a, b| a.name.cmp(b.name));
        debug_assert!(
            entities.windows(2).all(|w| w[0].name < w[1].name),
            "entity names must be unique"
        );
        entities
    })
}

/// Result of querying a candidate name (without `&`, without `;`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct NamedQuery {
    /// Exact entry; `.1` is true when the semicolon-less form is allowed.
    pub exact: Option<(char, bool)>,
    /// Some longer name starts with the candidate.
    pub can_extend: bool,
}

/// Longest-prefix query against the named-reference table.
pub(crate) fn query_named(candidate: &str) -> NamedQuery {
    if candidate.is_empty() {
        return NamedQuery {
            exact: None,
            can_extend: true,
        };
    }
    let entities = sorted_entities();
    let idx = entities.partition_point(|e| e.name < candidate);
    let mut result = NamedQuery::default();
    if let Some(entity) = entities.get(idx) {
        if entity.name == candidate {
            result.exact = Some((entity.expansion, entity.legacy));
            result.can_extend = entities
                .get(idx + 1)
                .is_some_and(|next| next.name.starts_with(candidate));
        } else {
            result.can_extend = entity.name.starts_with(candidate);
        }
    }
    result
}

/// Map a numeric character reference code point per HTML5.
///
/// Returns the character to emit and an optional parse error. The
/// windows-1252 override rewrites the 0x80..=0x9F range.
pub(crate) fn numeric_to_char(code: u32) -> (char, Option<ParseErrorCode>) {
    use crate::charset::WINDOWS_1252_HIGH;

    match code {
        0x00 => ('\u{FFFD}', Some(ParseErrorCode::NullCharacterReference)),
        0x80..=0x9F => (
            WINDOWS_1252_HIGH[(code - 0x80) as usize],
            Some(ParseErrorCode::ControlCharacterReference),
        ),
        0xD800..=0xDFFF => ('\u{FFFD}', Some(ParseErrorCode::SurrogateCharacterReference)),
        c if c > 0x10FFFF => (
            '\u{FFFD}',
            Some(ParseErrorCode::CharacterReferenceOutsideUnicodeRange),
        ),
        c => {
            let ch = char::from_u32(c).expect("non-surrogate in-range scalar");
            if (0xFDD0..=0xFDEF).contains(&c) || (c & 0xFFFE) == 0xFFFE {
                (ch, Some(ParseErrorCode::NoncharacterCharacterReference))
            } else if c < 0x20 && !matches!(c, 0x09 | 0x0A | 0x0C) || c == 0x7F {
                (ch, Some(ParseErrorCode::ControlCharacterReference))
            } else {
                (ch, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_prefix_queries() {
        let q = query_named("amp");
        assert_eq!(q.exact, Some(('&', true)));
        let q = query_named("am");
        assert!(q.can_extend);
        assert_eq!(q.exact, None);
        let q = query_named("zzz");
        assert!(!q.can_extend);
        assert_eq!(q.exact, None);
    }

    #[test]
    fn strict_names_reject_legacy_form() {
        let q = query_named("apos");
        assert_eq!(q.exact, Some(('\'', false)));
        let q = query_named("euro");
        assert_eq!(q.exact, Some(('\u{20AC}', false)));
    }

    #[test]
    fn exact_match_may_still_extend() {
        // "not" is an entity but so is "notin".
        let q = query_named("not");
        assert_eq!(q.exact, Some(('\u{AC}', true)));
        assert!(q.can_extend);
        // "sup" extends into "sup1", "sup2", "sup3", "supe".
        let q = query_named("sup");
        assert_eq!(q.exact, Some(('\u{2283}', false)));
        assert!(q.can_extend);
    }

    #[test]
    fn case_matters() {
        assert_eq!(query_named("Amp").exact, None);
        assert_eq!(query_named("AMP").exact, Some(('&', true)));
        assert_eq!(query_named("Sigma").exact, Some(('\u{3A3}', false)));
        assert_eq!(query_named("sigma").exact, Some(('\u{3C3}', false)));
    }

    #[test]
    fn numeric_override_table() {
        assert_eq!(numeric_to_char(0x20AC).0, '\u{20AC}');
        assert_eq!(
            numeric_to_char(0x80),
            (
                '\u{20AC}',
                Some(ParseErrorCode::ControlCharacterReference)
            )
        );
        assert_eq!(numeric_to_char(0x99).0, '\u{2122}');
        assert_eq!(
            numeric_to_char(0x00),
            ('\u{FFFD}', Some(ParseErrorCode::NullCharacterReference))
        );
        assert_eq!(
            numeric_to_char(0xD800).0,
            '\u{FFFD}',
        );
        assert_eq!(
            numeric_to_char(0x110000),
            (
                '\u{FFFD}',
                Some(ParseErrorCode::CharacterReferenceOutsideUnicodeRange)
            )
        );
        assert_eq!(numeric_to_char(0x41), ('A', None));
    }

    #[test]
    fn table_is_complete_for_legacy_duals() {
        // Every legacy name must also match when followed by a semicolon in
        // the tokenizer; here we just spot-check representative pairs.
        for name in ["amp", "lt", "gt", "quot", "nbsp", "ouml", "frac12"] {
            let q = query_named(name);
            assert!(
                matches!(q.exact, Some((_, true))),
                "{name} must allow the legacy form"
            );
        }
    }
}
