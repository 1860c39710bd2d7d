//! Element classifier: lowercased tag name to element kind plus metadata.
//!
//! The table is static and sorted; lookup is a binary search. Names absent
//! from the table classify as [`ElementType::Unknown`] with default metadata.

/// Element namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Ns {
    #[default]
    Html,
    MathMl,
    Svg,
}

impl Ns {
    pub fn uri(self) -> &'static str {
        match self {
            Ns::Html => "http://www.w3.org/1999/xhtml",
            Ns::MathMl => "http://www.w3.org/1998/Math/MathML",
            Ns::Svg => "http://www.w3.org/2000/svg",
        }
    }
}

/// Element kinds the tree builder treats specially.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    A, Address, AnnotationXml, Applet, Area, Article, Aside,
    B, Base, Basefont, Bgsound, Big, Blockquote, Body, Br, Button,
    Caption, Center, Code, Col, Colgroup, Command,
    Datagrid, Dd, Desc, Details, Dialog, Dir, Div, Dl, Dt,
    Em, Embed,
    Fieldset, Figcaption, Figure, Font, Footer, ForeignObject, Form, Frame,
    Frameset,
    H1, H2, H3, H4, H5, H6, Head, Header, Hr, Html,
    I, Iframe, Image, Img, Input, Isindex,
    Label, Li, Link, Listing,
    Main, Malignmark, Marquee, Math, Menu, Meta, Mglyph, Mi, Mn, Mo, Ms,
    Mtext,
    Nav, Nobr, Noembed, Noframes, Noscript,
    Object, Ol, Optgroup, Option, Output,
    P, Param, Plaintext, Pre,
    Rp, Rt, Ruby,
    S, Script, Section, Select, Small, Spacer, Span, Strike, Strong, Style,
    Sub, Summary, Sup, Svg,
    Table, Tbody, Td, Template, Textarea, Tfoot, Th, Thead, Title, Tr, Tt,
    U, Ul,
    Var,
    Wbr,
    Xmp,
    Unknown,
}

/// Sorted name table. Lookup key is the canonical lowercase name.
static ELEMENT_TYPES: &[(&str, ElementType)] = &[
    ("a", ElementType::A),
    ("address", ElementType::Address),
    ("annotation-xml", ElementType::AnnotationXml),
    ("applet", ElementType::Applet),
    ("area", ElementType::Area),
    ("article", ElementType::Article),
    ("aside", ElementType::Aside),
    ("b", ElementType::B),
    ("base", ElementType::Base),
    ("basefont", ElementType::Basefont),
    ("bgsound", ElementType::Bgsound),
    ("big", ElementType::Big),
    ("blockquote", ElementType::Blockquote),
    ("body", ElementType::Body),
    ("br", ElementType::Br),
    ("button", ElementType::Button),
    ("caption", ElementType::Caption),
    ("center", ElementType::Center),
    ("code", ElementType::Code),
    ("col", ElementType::Col),
    ("colgroup", ElementType::Colgroup),
    ("command", ElementType::Command),
    ("datagrid", ElementType::Datagrid),
    ("dd", ElementType::Dd),
    ("desc", ElementType::Desc),
    ("details", ElementType::Details),
    ("dialog", ElementType::Dialog),
    ("dir", ElementType::Dir),
    ("div", ElementType::Div),
    ("dl", ElementType::Dl),
    ("dt", ElementType::Dt),
    ("em", ElementType::Em),
    ("embed", ElementType::Embed),
    ("fieldset", ElementType::Fieldset),
    ("figcaption", ElementType::Figcaption),
    ("figure", ElementType::Figure),
    ("font", ElementType::Font),
    ("footer", ElementType::Footer),
    ("foreignobject", ElementType::ForeignObject),
    ("form", ElementType::Form),
    ("frame", ElementType::Frame),
    ("frameset", ElementType::Frameset),
    ("h1", ElementType::H1),
    ("h2", ElementType::H2),
    ("h3", ElementType::H3),
    ("h4", ElementType::H4),
    ("h5", ElementType::H5),
    ("h6", ElementType::H6),
    ("head", ElementType::Head),
    ("header", ElementType::Header),
    ("hr", ElementType::Hr),
    ("html", ElementType::Html),
    ("i", ElementType::I),
    ("iframe", ElementType::Iframe),
    ("image", ElementType::Image),
    ("img", ElementType::Img),
    ("input", ElementType::Input),
    ("isindex", ElementType::Isindex),
    ("label", ElementType::Label),
    ("li", ElementType::Li),
    ("link", ElementType::Link),
    ("listing", ElementType::Listing),
    ("main", ElementType::Main),
    ("malignmark", ElementType::Malignmark),
    ("marquee", ElementType::Marquee),
    ("math", ElementType::Math),
    ("menu", ElementType::Menu),
    ("meta", ElementType::Meta),
    ("mglyph", ElementType::Mglyph),
    ("mi", ElementType::Mi),
    ("mn", ElementType::Mn),
    ("mo", ElementType::Mo),
    ("ms", ElementType::Ms),
    ("mtext", ElementType::Mtext),
    ("nav", ElementType::Nav),
    ("nobr", ElementType::Nobr),
    ("noembed", ElementType::Noembed),
    ("noframes", ElementType::Noframes),
    ("noscript", ElementType::Noscript),
    ("object", ElementType::Object),
    ("ol", ElementType::Ol),
    ("optgroup", ElementType::Optgroup),
    ("option", ElementType::Option),
    ("output", ElementType::Output),
    ("p", ElementType::P),
    ("param", ElementType::Param),
    ("plaintext", ElementType::Plaintext),
    ("pre", ElementType::Pre),
    ("rp", ElementType::Rp),
    ("rt", ElementType::Rt),
    ("ruby", ElementType::Ruby),
    ("s", ElementType::S),
    ("script", ElementType::Script),
    ("section", ElementType::Section),
    ("select", ElementType::Select),
    ("small", ElementType::Small),
    ("spacer", ElementType::Spacer),
    ("span", ElementType::Span),
    ("strike", ElementType::Strike),
    ("strong", ElementType::Strong),
    ("style", ElementType::Style),
    ("sub", ElementType::Sub),
    ("summary", ElementType::Summary),
    ("sup", ElementType::Sup),
    ("svg", ElementType::Svg),
    ("table", ElementType::Table),
    ("tbody", ElementType::Tbody),
    ("td", ElementType::Td),
    ("template", ElementType::Template),
    ("textarea", ElementType::Textarea),
    ("tfoot", ElementType::Tfoot),
    ("th", ElementType::Th),
    ("thead", ElementType::Thead),
    ("title", ElementType::Title),
    ("tr", ElementType::Tr),
    ("tt", ElementType::Tt),
    ("u", ElementType::U),
    ("ul", ElementType::Ul),
    ("var", ElementType::Var),
    ("wbr", ElementType::Wbr),
    ("xmp", ElementType::Xmp),
];

/// Classify a lowercased tag name.
pub fn element_type(name: &str) -> ElementType {
    match ELEMENT_TYPES.binary_search_by(|(n, _)| (*n).cmp(name)) {
        Ok(idx) => ELEMENT_TYPES[idx].1,
        Err(_) => ElementType::Unknown,
    }
}

impl ElementType {
    /// WHATWG "special" category (includes the scoping elements).
    pub fn is_special(self) -> bool {
        use ElementType::*;
        matches!(
            self,
            Address | Applet | Area | Article | Aside | Base | Basefont
                | Bgsound | Blockquote | Body | Br | Button | Caption | Center
                | Col | Colgroup | Command | Datagrid | Dd | Details | Dialog
                | Dir | Div | Dl | Dt | Embed | Fieldset | Figcaption | Figure
                | Footer | Form | Frame | Frameset | H1 | H2 | H3 | H4 | H5
                | H6 | Head | Header | Hr | Html | Iframe | Image | Img
                | Input | Isindex | Li | Link | Listing | Main | Marquee
                | Menu | Meta | Nav | Noembed | Noframes | Noscript | Object
                | Ol | Optgroup | Option | P | Param | Plaintext | Pre
                | Script | Section | Select | Spacer | Style | Summary
                | Table | Tbody | Td | Template | Textarea | Tfoot | Th
                | Thead | Title | Tr | Ul | Wbr | Xmp
        )
    }

    /// Scope-establishing elements (a subset of the special category).
    pub fn is_scoping(self) -> bool {
        use ElementType::*;
        matches!(
            self,
            Applet | Button | Caption | Html | Marquee | Object | Table | Td
                | Th | Template
        )
    }

    /// Inline formatting elements tracked by the active formatting list.
    pub fn is_formatting(self) -> bool {
        use ElementType::*;
        matches!(
            self,
            A | B | Big | Code | Em | Font | I | Nobr | S | Small | Strike
                | Strong | Tt | U
        )
    }

    pub fn is_phrasing(self) -> bool {
        use ElementType::*;
        matches!(
            self,
            Label | Output | Rp | Rt | Ruby | Span | Sub | Sup | Var
        )
    }

    pub fn is_heading(self) -> bool {
        use ElementType::*;
        matches!(self, H1 | H2 | H3 | H4 | H5 | H6)
    }

    /// Elements that associate with the nearest open `form`.
    pub fn is_form_associatable(self) -> bool {
        use ElementType::*;
        matches!(
            self,
            Button | Fieldset | Img | Input | Label | Object | Output
                | Select | Textarea
        )
    }
}

/// MathML text integration point (per stack-frame namespace).
pub fn is_mathml_text_integration(ty: ElementType, ns: Ns) -> bool {
    use ElementType::*;
    ns == Ns::MathMl && matches!(ty, Mi | Mo | Mn | Ms | Mtext)
}

/// HTML integration point decidable from the element kind alone.
///
/// `annotation-xml` is also an HTML integration point when its `encoding`
/// attribute says so; the tree builder checks that at insertion time.
pub fn is_svg_html_integration(ty: ElementType, ns: Ns) -> bool {
    use ElementType::*;
    ns == Ns::Svg && matches!(ty, ForeignObject | Desc | Title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_table_is_sorted_and_unique() {
        for window in ELEMENT_TYPES.windows(2) {
            assert!(
                window[0].0 < window[1].0,
                "element table out of order at {:?} / {:?}",
                window[0].0,
                window[1].0
            );
        }
    }

    #[test]
    fn lookup_hits_and_misses() {
        assert_eq!(element_type("html"), ElementType::Html);
        assert_eq!(element_type("foreignobject"), ElementType::ForeignObject);
        assert_eq!(element_type("annotation-xml"), ElementType::AnnotationXml);
        assert_eq!(element_type("xmp"), ElementType::Xmp);
        assert_eq!(element_type("blink"), ElementType::Unknown);
        assert_eq!(element_type(""), ElementType::Unknown);
        // Lookup expects canonical lowercase; raw names are folded at intern.
        assert_eq!(element_type("DIV"), ElementType::Unknown);
    }

    #[test]
    fn category_flags_are_disjoint_where_required() {
        for (_, ty) in ELEMENT_TYPES {
            assert!(
                !(ty.is_formatting() && ty.is_special()),
                "{ty:?} cannot be both formatting and special"
            );
        }
        assert!(ElementType::Table.is_scoping());
        assert!(ElementType::Table.is_special());
        assert!(ElementType::B.is_formatting());
        assert!(ElementType::Span.is_phrasing());
        assert!(!ElementType::Unknown.is_special());
    }

    #[test]
    fn integration_points_are_namespace_qualified() {
        assert!(is_mathml_text_integration(ElementType::Mi, Ns::MathMl));
        assert!(!is_mathml_text_integration(ElementType::Mi, Ns::Html));
        assert!(is_svg_html_integration(ElementType::Title, Ns::Svg));
        assert!(!is_svg_html_integration(ElementType::Title, Ns::Html));
    }
}
