use super::{ContentModel, TokenStep, Tokenizer, TokenizerConfig};
use crate::context::DocumentParseContext;
use crate::input::Input;
use crate::token::{TextValue, Token};

/// Resolved, comparison-friendly token form. Adjacent text is coalesced so
/// chunking decisions cannot change the expected sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Tk {
    Doctype {
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
        force_quirks: bool,
    },
    Start {
        name: String,
        attrs: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    End(String),
    Comment(String),
    Text(String),
    Eof,
}

fn resolve_text(value: &TextValue, input: &Input) -> String {
    match value {
        TextValue::Span(span) => input.text(*span).to_string(),
        TextValue::Owned(s) => s.clone(),
    }
}

struct Harness {
    input: Input,
    ctx: DocumentParseContext,
    tokenizer: Tokenizer,
    tokens: Vec<Tk>,
}

impl Harness {
    fn new() -> Self {
        Self {
            input: Input::new(),
            ctx: DocumentParseContext::new(),
            tokenizer: Tokenizer::new(TokenizerConfig::default()),
            tokens: Vec::new(),
        }
    }

    fn collect(&mut self, token: Token) {
        let tk = match token {
            Token::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => Tk::Doctype {
                name: name.map(|id| self.ctx.atoms.resolve(id).to_string()),
                public_id,
                system_id,
                force_quirks,
            },
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => Tk::Start {
                name: self.ctx.atoms.resolve(name).to_string(),
                attrs: attributes
                    .iter()
                    .map(|attr| {
                        (
                            self.ctx.atoms.resolve(attr.name).to_string(),
                            attr.value.as_ref().map(|v| resolve_text(v, &self.input)),
                        )
                    })
                    .collect(),
                self_closing,
            },
            Token::EndTag { name } => Tk::End(self.ctx.atoms.resolve(name).to_string()),
            Token::Comment { text } => Tk::Comment(resolve_text(&text, &self.input)),
            Token::Text { text } => {
                let text = resolve_text(&text, &self.input);
                if let Some(Tk::Text(last)) = self.tokens.last_mut() {
                    last.push_str(&text);
                    return;
                }
                Tk::Text(text)
            }
            Token::Eof => Tk::Eof,
        };
        self.tokens.push(tk);
    }

    fn feed(&mut self, chunk: &str) {
        self.input.push_str(chunk);
        self.drain();
    }

    fn drain(&mut self) {
        loop {
            match self
                .tokenizer
                .next_token(&self.input, &mut self.ctx)
                .expect("tokenizer error")
            {
                TokenStep::Token(token) => self.collect(token),
                TokenStep::Starved | TokenStep::Drained => break,
            }
        }
    }

    fn finish(mut self) -> Vec<Tk> {
        self.tokenizer.finish();
        self.drain();
        self.tokens
    }
}

fn tokenize(chunks: &[&str]) -> Vec<Tk> {
    let mut harness = Harness::new();
    for chunk in chunks {
        harness.feed(chunk);
    }
    harness.finish()
}

fn start(name: &str, attrs: &[(&str, Option<&str>)]) -> Tk {
    Tk::Start {
        name: name.to_string(),
        attrs: attrs
            .iter()
            .map(|(n, v)| (n.to_string(), v.map(str::to_string)))
            .collect(),
        self_closing: false,
    }
}

fn text(s: &str) -> Tk {
    Tk::Text(s.to_string())
}

/// Every split of the input must yield the same token sequence as one chunk.
fn assert_chunk_invariant(source: &str) {
    let whole = tokenize(&[source]);
    for split in 1..source.len() {
        if !source.is_char_boundary(split) {
            continue;
        }
        let parts = tokenize(&[&source[..split], &source[split..]]);
        assert_eq!(parts, whole, "split at byte {split} of {source:?}");
    }
}

#[test]
fn plain_tags_and_text() {
    assert_eq!(
        tokenize(&["<p>hi</p>"]),
        vec![start("p", &[]), text("hi"), Tk::End("p".into()), Tk::Eof]
    );
}

#[test]
fn tag_names_fold_to_lowercase() {
    assert_eq!(
        tokenize(&["<DIV Class=Box>"]),
        vec![start("div", &[("class", Some("Box"))]), Tk::Eof]
    );
}

#[test]
fn attribute_forms() {
    assert_eq!(
        tokenize(&["<a x y=1 z='2' w=\"3\" v>"]),
        vec![
            start(
                "a",
                &[
                    ("x", None),
                    ("y", Some("1")),
                    ("z", Some("2")),
                    ("w", Some("3")),
                    ("v", None),
                ]
            ),
            Tk::Eof
        ]
    );
}

#[test]
fn duplicate_attributes_first_wins() {
    let tokens = tokenize(&["<a href=one HREF=two x=3>"]);
    assert_eq!(
        tokens,
        vec![
            start("a", &[("href", Some("one")), ("x", Some("3"))]),
            Tk::Eof
        ]
    );
}

#[test]
fn self_closing_flag() {
    assert_eq!(
        tokenize(&["<br/>"]),
        vec![
            Tk::Start {
                name: "br".into(),
                attrs: vec![],
                self_closing: true
            },
            Tk::Eof
        ]
    );
}

#[test]
fn end_tag_attributes_are_dropped() {
    let mut harness = Harness::new();
    harness.feed("</p class=x>");
    let tokens = harness.finish();
    assert_eq!(tokens, vec![Tk::End("p".into()), Tk::Eof]);
}

#[test]
fn missing_end_tag_name_is_skipped() {
    assert_eq!(tokenize(&["a</>b"]), vec![text("ab"), Tk::Eof]);
}

#[test]
fn bogus_markup_becomes_comment() {
    assert_eq!(
        tokenize(&["<?php x ?>"]),
        vec![Tk::Comment("?php x ?".into()), Tk::Eof]
    );
    assert_eq!(
        tokenize(&["</@junk>"]),
        vec![Tk::Comment("@junk".into()), Tk::Eof]
    );
}

#[test]
fn comment_variants() {
    assert_eq!(
        tokenize(&["<!--x-->"]),
        vec![Tk::Comment("x".into()), Tk::Eof]
    );
    assert_eq!(
        tokenize(&["<!-- a - b -- c -->"]),
        vec![Tk::Comment(" a - b -- c ".into()), Tk::Eof]
    );
    // Abrupt close.
    assert_eq!(tokenize(&["<!-->"]), vec![Tk::Comment(String::new()), Tk::Eof]);
    // Unterminated at EOF.
    assert_eq!(
        tokenize(&["<!--tail"]),
        vec![Tk::Comment("tail".into()), Tk::Eof]
    );
}

#[test]
fn doctype_forms() {
    assert_eq!(
        tokenize(&["<!DOCTYPE html>"]),
        vec![
            Tk::Doctype {
                name: Some("html".into()),
                public_id: None,
                system_id: None,
                force_quirks: false,
            },
            Tk::Eof
        ]
    );
    assert_eq!(
        tokenize(&["<!doctype HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" 'http://x'>"]),
        vec![
            Tk::Doctype {
                name: Some("html".into()),
                public_id: Some("-//W3C//DTD HTML 4.01//EN".into()),
                system_id: Some("http://x".into()),
                force_quirks: false,
            },
            Tk::Eof
        ]
    );
    assert_eq!(
        tokenize(&["<!DOCTYPE>"]),
        vec![
            Tk::Doctype {
                name: None,
                public_id: None,
                system_id: None,
                force_quirks: true,
            },
            Tk::Eof
        ]
    );
}

#[test]
fn named_character_references() {
    assert_eq!(tokenize(&["a &amp; b"]), vec![text("a & b"), Tk::Eof]);
    assert_eq!(tokenize(&["&notin;"]), vec![text("\u{2209}"), Tk::Eof]);
    // Longest match: "&not" is valid but "&notin;" is longer.
    assert_eq!(tokenize(&["&notit;"]), vec![text("\u{AC}it;"), Tk::Eof]);
    // Legacy form without semicolon decodes in data (with a parse error).
    assert_eq!(tokenize(&["&ampx"]), vec![text("&x"), Tk::Eof]);
    // Unknown name flows through the ambiguous-ampersand state.
    assert_eq!(
        tokenize(&["&noSuchThing;"]),
        vec![text("&noSuchThing;"), Tk::Eof]
    );
}

#[test]
fn legacy_reference_in_attribute_compat_rule() {
    // `&amp` followed by an alphanumeric inside an attribute stays raw.
    assert_eq!(
        tokenize(&["<a href=\"?x=1&ampy=2\">"]),
        vec![start("a", &[("href", Some("?x=1&ampy=2"))]), Tk::Eof]
    );
    // Followed by a delimiter it decodes.
    assert_eq!(
        tokenize(&["<a href=\"?x=1&amp&\">"]),
        vec![start("a", &[("href", Some("?x=1&&"))]), Tk::Eof]
    );
    // With the semicolon it always decodes.
    assert_eq!(
        tokenize(&["<a href=\"?x=1&amp;y=2\">"]),
        vec![start("a", &[("href", Some("?x=1&y=2"))]), Tk::Eof]
    );
}

#[test]
fn numeric_character_references() {
    assert_eq!(tokenize(&["&#65;&#x42;&#X63;"]), vec![text("ABc"), Tk::Eof]);
    // windows-1252 override range.
    assert_eq!(tokenize(&["&#150;"]), vec![text("\u{2013}"), Tk::Eof]);
    assert_eq!(tokenize(&["&#x80;"]), vec![text("\u{20AC}"), Tk::Eof]);
    // Out of range and null map to the replacement character.
    assert_eq!(tokenize(&["&#x110000;"]), vec![text("\u{FFFD}"), Tk::Eof]);
    assert_eq!(tokenize(&["&#0;"]), vec![text("\u{FFFD}"), Tk::Eof]);
    // Missing digits flush the raw input.
    assert_eq!(tokenize(&["&#x;"]), vec![text("&#x;"), Tk::Eof]);
    assert_eq!(tokenize(&["&#q"]), vec![text("&#q"), Tk::Eof]);
}

#[test]
fn null_byte_replacement_outside_script_data() {
    assert_eq!(tokenize(&["a\0b"]), vec![text("a\u{FFFD}b"), Tk::Eof]);
}

#[test]
fn rcdata_keeps_markup_as_text() {
    let mut harness = Harness::new();
    harness.feed("<title>");
    harness.tokenizer.set_content_model(ContentModel::Rcdata);
    harness.feed("a <b> &amp; c</title>d");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("title", &[]),
            text("a <b> & c"),
            Tk::End("title".into()),
            text("d"),
            Tk::Eof
        ]
    );
}

#[test]
fn rawtext_ignores_references() {
    let mut harness = Harness::new();
    harness.feed("<style>");
    harness.tokenizer.set_content_model(ContentModel::Cdata);
    harness.feed("a &amp; b</style>");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("style", &[]),
            text("a &amp; b"),
            Tk::End("style".into()),
            Tk::Eof
        ]
    );
}

#[test]
fn rcdata_end_tag_must_be_appropriate() {
    let mut harness = Harness::new();
    harness.feed("<textarea>");
    harness.tokenizer.set_content_model(ContentModel::Rcdata);
    harness.feed("a</div>b</textarea>");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("textarea", &[]),
            text("a</div>b"),
            Tk::End("textarea".into()),
            Tk::Eof
        ]
    );
}

#[test]
fn script_data_escape_hides_close_tag() {
    let mut harness = Harness::new();
    harness.feed("<script>");
    harness.tokenizer.set_content_model(ContentModel::ScriptData);
    harness.feed("var s = \"</scr\" + \"ipt>\";</script>");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("script", &[]),
            text("var s = \"</scr\" + \"ipt>\";"),
            Tk::End("script".into()),
            Tk::Eof
        ]
    );
}

#[test]
fn script_data_double_escape() {
    let mut harness = Harness::new();
    harness.feed("<script>");
    harness.tokenizer.set_content_model(ContentModel::ScriptData);
    harness.feed("<!--<script>x</script>--></script>");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("script", &[]),
            text("<!--<script>x</script>-->"),
            Tk::End("script".into()),
            Tk::Eof
        ]
    );
}

#[test]
fn script_data_preserves_null() {
    let mut harness = Harness::new();
    harness.feed("<script>");
    harness.tokenizer.set_content_model(ContentModel::ScriptData);
    harness.feed("a\0b</script>");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("script", &[]),
            text("a\0b"),
            Tk::End("script".into()),
            Tk::Eof
        ]
    );
}

#[test]
fn plaintext_swallows_everything() {
    let mut harness = Harness::new();
    harness.feed("<plaintext>");
    harness.tokenizer.set_content_model(ContentModel::Plaintext);
    harness.feed("a</plaintext><div>");
    let tokens = harness.finish();
    assert_eq!(
        tokens,
        vec![
            start("plaintext", &[]),
            text("a</plaintext><div>"),
            Tk::Eof
        ]
    );
}

#[test]
fn cdata_section_only_in_foreign_content() {
    let mut harness = Harness::new();
    harness.tokenizer.set_cdata_allowed(true);
    harness.feed("<![CDATA[x <b> ]] y]]>z");
    let tokens = harness.finish();
    assert_eq!(tokens, vec![text("x <b> ]] yz"), Tk::Eof]);

    // In HTML content it is a bogus comment.
    assert_eq!(
        tokenize(&["<![CDATA[x]]>"]),
        vec![Tk::Comment("[CDATA[x]]".into()), Tk::Eof]
    );
}

#[test]
fn eof_inside_tag_emits_nothing() {
    assert_eq!(tokenize(&["<div class="]), vec![Tk::Eof]);
    assert_eq!(tokenize(&["<div"]), vec![Tk::Eof]);
}

#[test]
fn lone_lt_and_invalid_tag_opens() {
    assert_eq!(tokenize(&["a<b"]), vec![text("a"), Tk::Eof]);
    assert_eq!(tokenize(&["a< b"]), vec![text("a< b"), Tk::Eof]);
    assert_eq!(tokenize(&["a<"]), vec![text("a<"), Tk::Eof]);
}

#[test]
fn chunk_boundary_invariance() {
    for source in [
        "<p class=\"a b\">x &amp; y</p>",
        "<!DOCTYPE html><html><body>t",
        "<!--c--><a href='q'>&notin;&notit;</a>",
        "a &am",
        "<div da",
        "&#x1F4A9;<br/>",
        "<![CDATA[no]]>",
    ] {
        assert_chunk_invariant(source);
    }
}

#[test]
fn chunk_boundary_invariance_in_script_data() {
    let source = "x<!--<script></script>-->y</script>";
    let whole = {
        let mut h = Harness::new();
        h.feed("<script>");
        h.tokenizer.set_content_model(ContentModel::ScriptData);
        h.feed(source);
        h.finish()
    };
    for split in 1..source.len() {
        let mut h = Harness::new();
        h.feed("<script>");
        h.tokenizer.set_content_model(ContentModel::ScriptData);
        h.feed(&source[..split]);
        h.feed(&source[split..]);
        let parts = h.finish();
        assert_eq!(parts, whole, "split at byte {split}");
    }
}

#[test]
fn stats_track_progress() {
    let mut harness = Harness::new();
    harness.feed("<p>x</p>");
    let consumed = harness.tokenizer.stats().bytes_consumed;
    assert_eq!(consumed, 8);
    assert!(harness.tokenizer.stats().tokens_emitted >= 3);
}
