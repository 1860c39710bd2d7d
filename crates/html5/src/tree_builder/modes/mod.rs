//! Insertion-mode handlers, grouped by family. Each handler processes one
//! token under its mode and returns true to have the token re-dispatched.

mod head;
mod in_body;
mod select;
mod table;

use std::sync::Arc;

use crate::context::DocumentParseContext;
use crate::elements::{ElementType, Ns};
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;
use crate::sink::{AttrNs, AttributeData, ElementData, TreeSink};
use crate::token::{Attribute, TextValue};
use crate::tree_builder::foreign::{
    adjust_foreign_attribute, adjust_mathml_attribute, adjust_svg_attribute,
    adjust_svg_tag_name,
};
use crate::tree_builder::stack::Frame;
use crate::tree_builder::{InsertionMode, Tok, TreeBuilder};

/// Whitespace in the tree-construction sense.
pub(super) fn is_parse_ws(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

pub(super) fn ws_prefix_len(text: &str) -> usize {
    text.len() - text.trim_start_matches(is_parse_ws).len()
}

pub(super) fn is_all_ws(text: &str) -> bool {
    text.chars().all(is_parse_ws)
}

impl<S: TreeSink> TreeBuilder<S> {
    // ---- text mode ---------------------------------------------------------

    /// "text": collecting raw text/RCDATA content for the element on top.
    pub(super) fn mode_text(
        &mut self,
        tok: &Tok<'_>,
        _input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                self.append_text(text, ctx)?;
                Ok(false)
            }
            Tok::End { kind, .. } => {
                let was_script = *kind == ElementType::Script
                    && self
                        .stack
                        .current()
                        .is_some_and(|f| f.kind == ElementType::Script);
                self.pop_and_release();
                self.mode = self.original_mode;
                if was_script && self.config.scripting {
                    self.outcome.pause = true;
                }
                Ok(false)
            }
            Tok::Eof => {
                self.err(ctx, ParseErrorCode::UnexpectedEof);
                self.pop_and_release();
                self.mode = self.original_mode;
                Ok(true)
            }
            _ => {
                debug_assert!(false, "tokenizer only yields text/end/EOF in raw content");
                Ok(false)
            }
        }
    }

    // ---- after body / frameset family -------------------------------------

    pub(super) fn mode_after_body(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) if is_all_ws(text) => self.mode_in_body(tok, input, ctx),
            Tok::Comment(text) => {
                // Comments after </body> attach to the root html element.
                let html = self
                    .stack
                    .get(0)
                    .map(|frame| frame.handle.clone())
                    .unwrap_or_else(|| self.document.clone());
                self.insert_comment(text, Some(html), ctx)?;
                Ok(false)
            }
            Tok::Doctype { .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(false)
            }
            Tok::Start {
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::End {
                kind: ElementType::Html,
                ..
            } => {
                self.mode = InsertionMode::AfterAfterBody;
                Ok(false)
            }
            Tok::Eof => {
                self.stop_parsing();
                Ok(false)
            }
            _ => {
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                self.mode = InsertionMode::InBody;
                Ok(true)
            }
        }
    }

    pub(super) fn mode_in_frameset(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                // Only whitespace survives inside a frameset.
                let ws: String = text.chars().filter(|c| is_parse_ws(*c)).collect();
                if ws.len() != text.len() {
                    self.err(ctx, ParseErrorCode::UnexpectedCharacter);
                }
                self.append_text(&ws, ctx)?;
                Ok(false)
            }
            Tok::Comment(text) => {
                self.insert_comment(text, None, ctx)?;
                Ok(false)
            }
            Tok::Doctype { .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(false)
            }
            Tok::Start {
                name,
                kind: kind @ ElementType::Frameset,
                attrs,
                self_closing,
            } => {
                self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                Ok(false)
            }
            Tok::Start {
                name,
                kind: kind @ ElementType::Frame,
                attrs,
                self_closing,
            } => {
                self.insert_html_element(*name, *kind, attrs, *self_closing, false, input, ctx)?;
                Ok(false)
            }
            Tok::Start {
                kind: ElementType::Noframes,
                ..
            } => self.mode_in_head(tok, input, ctx),
            Tok::Start {
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::End {
                kind: ElementType::Frameset,
                ..
            } => {
                if self
                    .stack
                    .current()
                    .is_some_and(|f| f.kind == ElementType::Html)
                {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.pop_and_release();
                let back_in_frameset = self
                    .stack
                    .current()
                    .is_some_and(|f| f.kind == ElementType::Frameset);
                if !back_in_frameset {
                    self.mode = InsertionMode::AfterFrameset;
                }
                Ok(false)
            }
            Tok::Eof => {
                if self
                    .stack
                    .current()
                    .is_some_and(|f| f.kind != ElementType::Html)
                {
                    self.err(ctx, ParseErrorCode::UnexpectedEof);
                }
                self.stop_parsing();
                Ok(false)
            }
            _ => {
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                Ok(false)
            }
        }
    }

    pub(super) fn mode_after_frameset(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                let ws: String = text.chars().filter(|c| is_parse_ws(*c)).collect();
                if ws.len() != text.len() {
                    self.err(ctx, ParseErrorCode::UnexpectedCharacter);
                }
                self.append_text(&ws, ctx)?;
                Ok(false)
            }
            Tok::Comment(text) => {
                self.insert_comment(text, None, ctx)?;
                Ok(false)
            }
            Tok::Start {
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::Start {
                kind: ElementType::Noframes,
                ..
            } => self.mode_in_head(tok, input, ctx),
            Tok::End {
                kind: ElementType::Html,
                ..
            } => {
                self.mode = InsertionMode::AfterAfterFrameset;
                Ok(false)
            }
            Tok::Eof => {
                self.stop_parsing();
                Ok(false)
            }
            _ => {
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                Ok(false)
            }
        }
    }

    pub(super) fn mode_after_after_body(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Comment(text) => {
                let document = self.document.clone();
                self.insert_comment(text, Some(document), ctx)?;
                Ok(false)
            }
            Tok::Doctype { .. } => self.mode_in_body(tok, input, ctx),
            Tok::Text(text) if is_all_ws(text) => self.mode_in_body(tok, input, ctx),
            Tok::Start {
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::Eof => {
                self.stop_parsing();
                Ok(false)
            }
            _ => {
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                self.mode = InsertionMode::InBody;
                Ok(true)
            }
        }
    }

    pub(super) fn mode_after_after_frameset(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Comment(text) => {
                let document = self.document.clone();
                self.insert_comment(text, Some(document), ctx)?;
                Ok(false)
            }
            Tok::Doctype { .. } => self.mode_in_body(tok, input, ctx),
            Tok::Text(text) if is_all_ws(text) => self.mode_in_body(tok, input, ctx),
            Tok::Start {
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::Start {
                kind: ElementType::Noframes,
                ..
            } => self.mode_in_head(tok, input, ctx),
            Tok::Eof => {
                self.stop_parsing();
                Ok(false)
            }
            _ => {
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                Ok(false)
            }
        }
    }

    // ---- foreign content ---------------------------------------------------

    /// Pre-dispatcher for tokens arriving while the current node is in a
    /// foreign (MathML/SVG) namespace.
    pub(super) fn foreign_content(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                if text.contains('\0') {
                    self.err(ctx, ParseErrorCode::UnexpectedNullCharacter);
                    let cleaned: String = text
                        .chars()
                        .map(|c| if c == '\0' { '\u{FFFD}' } else { c })
                        .collect();
                    self.append_text(&cleaned, ctx)?;
                } else {
                    self.append_text(text, ctx)?;
                }
                if !is_all_ws(text) {
                    self.frameset_ok = false;
                }
                Ok(false)
            }
            Tok::Comment(text) => {
                self.insert_comment(text, None, ctx)?;
                Ok(false)
            }
            Tok::Doctype { .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(false)
            }
            Tok::Start {
                name,
                kind,
                attrs,
                self_closing,
            } => {
                if foreign_breakout(*kind, attrs, ctx) {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    // Pop back to HTML content or an integration point.
                    loop {
                        let Some(current) = self.stack.current() else { break };
                        if current.ns == Ns::Html
                            || current.is_mathml_text_ip()
                            || current.is_html_ip()
                        {
                            break;
                        }
                        self.pop_and_release();
                    }
                    return Ok(true);
                }
                let ns = self
                    .stack
                    .current()
                    .map(|f| f.ns)
                    .unwrap_or(Ns::Html);
                self.insert_foreign_element(*name, *kind, ns, attrs, *self_closing, input, ctx)?;
                Ok(false)
            }
            Tok::End { name, kind } => {
                if *kind == ElementType::Script
                    && self
                        .stack
                        .current()
                        .is_some_and(|f| f.ns == Ns::Svg && f.kind == ElementType::Script)
                {
                    self.pop_and_release();
                    return Ok(false);
                }
                let top = self.stack.len() - 1;
                if self
                    .stack
                    .get(top)
                    .is_some_and(|f| f.name != *name)
                {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                }
                let mut idx = top;
                loop {
                    if idx == 0 {
                        return Ok(false);
                    }
                    let frame = self.stack.get(idx).expect("index in range");
                    if frame.name == *name {
                        while self.stack.len() > idx {
                            self.pop_and_release();
                        }
                        return Ok(false);
                    }
                    idx -= 1;
                    if self
                        .stack
                        .get(idx)
                        .is_some_and(|frame| frame.ns == Ns::Html)
                    {
                        // Fall through to the HTML rules for the current mode.
                        return self.dispatch_html(tok, input, ctx);
                    }
                }
            }
            Tok::Eof => unreachable!("EOF never routes through foreign content"),
        }
    }

    /// Insert an element in a foreign namespace, applying the MathML/SVG
    /// adjustment tables.
    pub(super) fn insert_foreign_element(
        &mut self,
        name: crate::atom::AtomId,
        kind: ElementType,
        ns: Ns,
        attrs: &[Attribute],
        self_closing: bool,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<(), Error> {
        let raw_name = ctx.atoms.resolve(name);
        let display_name: Arc<str> = match ns {
            Ns::Svg => match adjust_svg_tag_name(raw_name) {
                Some(adjusted) => Arc::from(adjusted),
                None => ctx.atoms.resolve_arc(name).unwrap_or_else(|| Arc::from("")),
            },
            _ => ctx.atoms.resolve_arc(name).unwrap_or_else(|| Arc::from("")),
        };

        let mut html_ip = false;
        let attributes: Vec<AttributeData> = attrs
            .iter()
            .map(|attr| {
                let attr_name = ctx.atoms.resolve(attr.name);
                let value = match attr.value.as_ref() {
                    Some(TextValue::Span(span)) => input.text(*span).to_string(),
                    Some(TextValue::Owned(s)) => s.clone(),
                    None => String::new(),
                };
                if ns == Ns::MathMl
                    && kind == ElementType::AnnotationXml
                    && attr_name == "encoding"
                    && (value.eq_ignore_ascii_case("text/html")
                        || value.eq_ignore_ascii_case("application/xhtml+xml"))
                {
                    html_ip = true;
                }
                if let Some((adjusted, attr_ns)) = adjust_foreign_attribute(attr_name) {
                    return AttributeData {
                        ns: attr_ns,
                        name: Arc::from(adjusted),
                        value,
                    };
                }
                let adjusted = match ns {
                    Ns::Svg => adjust_svg_attribute(attr_name),
                    Ns::MathMl => adjust_mathml_attribute(attr_name),
                    Ns::Html => None,
                };
                AttributeData {
                    ns: AttrNs::None,
                    name: adjusted
                        .map(Arc::from)
                        .or_else(|| ctx.atoms.resolve_arc(attr.name))
                        .unwrap_or_else(|| Arc::from("")),
                    value,
                }
            })
            .collect();

        let data = ElementData {
            ns,
            name: display_name,
            attributes,
            self_closing,
        };
        let handle = Self::sink_result(ctx, self.sink.create_element(&data))?;
        let pos = self.insertion_pos(ctx, None)?;
        self.insert_node_at(ctx, &pos, &handle)?;
        if self_closing {
            self.sink.unref_node(&handle);
        } else {
            self.stack.push(Frame {
                handle,
                name,
                kind,
                ns,
                html_ip,
            });
        }
        Ok(())
    }
}

/// Start tags that break out of foreign content back into HTML.
fn foreign_breakout(
    kind: ElementType,
    attrs: &[Attribute],
    ctx: &DocumentParseContext,
) -> bool {
    use ElementType::*;
    match kind {
        B | Big | Blockquote | Body | Br | Center | Code | Dd | Div | Dl | Dt | Em | Embed
        | H1 | H2 | H3 | H4 | H5 | H6 | Head | Hr | I | Img | Li | Listing | Menu | Meta
        | Nobr | Ol | P | Pre | Ruby | S | Small | Span | Strong | Strike | Sub | Sup
        | Table | Tt | U | Ul | Var => true,
        Font => attrs.iter().any(|attr| {
            matches!(ctx.atoms.resolve(attr.name), "color" | "face" | "size")
        }),
        _ => false,
    }
}
