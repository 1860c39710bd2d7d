//! Quirks-mode determination from the DOCTYPE token.

use crate::sink::QuirksMode;

/// Public-id prefixes that force full quirks mode.
static QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

static QUIRKY_PUBLIC_EXACT: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

static QUIRKY_SYSTEM_EXACT: &[&str] =
    &["http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"];

/// Prefixes that force limited quirks, unconditionally.
static LIMITED_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

/// Prefixes that force quirks when the system id is missing, limited quirks
/// when it is present.
static SYSTEM_SENSITIVE_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

/// Compute the quirks mode for a DOCTYPE.
///
/// `name` is the lowercased doctype name; `None` fields were missing in the
/// source.
pub(crate) fn quirks_mode(
    force_quirks: bool,
    name: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
) -> QuirksMode {
    if force_quirks || name != Some("html") {
        return QuirksMode::Quirks;
    }
    let public = public_id.map(|s| s.to_ascii_lowercase());
    let system = system_id.map(|s| s.to_ascii_lowercase());

    if let Some(public) = public.as_deref() {
        if QUIRKY_PUBLIC_EXACT.contains(&public) {
            return QuirksMode::Quirks;
        }
        if QUIRKY_PUBLIC_PREFIXES.iter().any(|p| public.starts_with(p)) {
            return QuirksMode::Quirks;
        }
        if SYSTEM_SENSITIVE_PREFIXES.iter().any(|p| public.starts_with(p)) {
            return if system.is_some() {
                QuirksMode::LimitedQuirks
            } else {
                QuirksMode::Quirks
            };
        }
        if LIMITED_PUBLIC_PREFIXES.iter().any(|p| public.starts_with(p)) {
            return QuirksMode::LimitedQuirks;
        }
    }
    if let Some(system) = system.as_deref() {
        if QUIRKY_SYSTEM_EXACT.contains(&system) {
            return QuirksMode::Quirks;
        }
    }
    QuirksMode::NoQuirks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_doctype_is_no_quirks() {
        assert_eq!(
            quirks_mode(false, Some("html"), None, None),
            QuirksMode::NoQuirks
        );
    }

    #[test]
    fn missing_or_wrong_name_is_quirks() {
        assert_eq!(quirks_mode(false, None, None, None), QuirksMode::Quirks);
        assert_eq!(
            quirks_mode(false, Some("xhtml"), None, None),
            QuirksMode::Quirks
        );
        assert_eq!(
            quirks_mode(true, Some("html"), None, None),
            QuirksMode::Quirks
        );
    }

    #[test]
    fn html32_public_id_is_quirks() {
        assert_eq!(
            quirks_mode(
                false,
                Some("html"),
                Some("-//W3C//DTD HTML 3.2 Final//EN"),
                None
            ),
            QuirksMode::Quirks
        );
    }

    #[test]
    fn html401_transitional_depends_on_system_id() {
        let public = Some("-//W3C//DTD HTML 4.01 Transitional//EN");
        assert_eq!(
            quirks_mode(false, Some("html"), public, None),
            QuirksMode::Quirks
        );
        assert_eq!(
            quirks_mode(
                false,
                Some("html"),
                public,
                Some("http://www.w3.org/TR/html4/loose.dtd")
            ),
            QuirksMode::LimitedQuirks
        );
    }

    #[test]
    fn xhtml_transitional_is_limited_quirks() {
        assert_eq!(
            quirks_mode(
                false,
                Some("html"),
                Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),
                None
            ),
            QuirksMode::LimitedQuirks
        );
    }
}
