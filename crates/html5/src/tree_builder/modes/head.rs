//! Insertion modes from "initial" through "after head".

use super::{is_all_ws, ws_prefix_len};
use crate::context::DocumentParseContext;
use crate::elements::ElementType;
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;
use crate::sink::{DoctypeData, QuirksMode, TreeSink};
use crate::token::{Attribute, TextValue};
use crate::tokenizer::ContentModel;
use crate::tree_builder::{quirks::quirks_mode, InsertionMode, Tok, TreeBuilder};

impl<S: TreeSink> TreeBuilder<S> {
    /// Report quirks mode to the sink, once, before the first element.
    fn establish_quirks(&mut self, mode: QuirksMode) {
        self.quirks = mode;
        self.sink.set_quirks_mode(mode);
    }

    pub(in crate::tree_builder) fn mode_initial(
        &mut self,
        tok: &Tok<'_>,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) if is_all_ws(text) => Ok(false),
            Tok::Comment(text) => {
                let document = self.document.clone();
                self.insert_comment(text, Some(document), ctx)?;
                Ok(false)
            }
            Tok::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => {
                let name_str = name.map(|id| ctx.atoms.resolve(id).to_string());
                let doctype = DoctypeData {
                    name: name_str.clone(),
                    public_id: public_id.map(str::to_string),
                    system_id: system_id.map(str::to_string),
                    force_quirks: *force_quirks,
                };
                let handle = Self::sink_result(ctx, self.sink.create_doctype(&doctype))?;
                let document = self.document.clone();
                Self::sink_result(ctx, self.sink.append_child(&document, &handle))?;
                self.sink.unref_node(&handle);

                let mode = quirks_mode(
                    *force_quirks,
                    name_str.as_deref(),
                    *public_id,
                    *system_id,
                );
                if mode != QuirksMode::NoQuirks {
                    self.err(ctx, ParseErrorCode::UnexpectedDoctype);
                }
                self.establish_quirks(mode);
                self.mode = InsertionMode::BeforeHtml;
                Ok(false)
            }
            _ => {
                // Missing DOCTYPE: full quirks.
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                self.establish_quirks(QuirksMode::Quirks);
                self.mode = InsertionMode::BeforeHtml;
                if let Tok::Text(text) = tok {
                    self.text_skip += ws_prefix_len(text);
                }
                Ok(true)
            }
        }
    }

    pub(in crate::tree_builder) fn mode_before_html(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Doctype { .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(false)
            }
            Tok::Comment(text) => {
                let document = self.document.clone();
                self.insert_comment(text, Some(document), ctx)?;
                Ok(false)
            }
            Tok::Text(text) if is_all_ws(text) => Ok(false),
            Tok::Start {
                name,
                kind: ElementType::Html,
                attrs,
                self_closing,
            } => {
                self.insert_html_element(
                    *name,
                    ElementType::Html,
                    attrs,
                    *self_closing,
                    true,
                    input,
                    ctx,
                )?;
                self.mode = InsertionMode::BeforeHead;
                Ok(false)
            }
            Tok::End { kind, .. }
                if !matches!(
                    kind,
                    ElementType::Head | ElementType::Body | ElementType::Html | ElementType::Br
                ) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            _ => {
                let name = ctx.atoms.intern("html")?;
                self.insert_html_element(name, ElementType::Html, &[], false, true, input, ctx)?;
                self.mode = InsertionMode::BeforeHead;
                if let Tok::Text(text) = tok {
                    self.text_skip += ws_prefix_len(text);
                }
                Ok(true)
            }
        }
    }

    pub(in crate::tree_builder) fn mode_before_head(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) if is_all_ws(text) => Ok(false),
            Tok::Comment(text) => {
                self.insert_comment(text, None, ctx)?;
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
            Tok::Start {
                name,
                kind: ElementType::Head,
                attrs,
                self_closing,
            } => {
                let handle = self.insert_html_element(
                    *name,
                    ElementType::Head,
                    attrs,
                    *self_closing,
                    true,
                    input,
                    ctx,
                )?;
                self.sink.ref_node(&handle);
                self.head = Some(handle);
                self.mode = InsertionMode::InHead;
                Ok(false)
            }
            Tok::End { kind, .. }
                if !matches!(
                    kind,
                    ElementType::Head | ElementType::Body | ElementType::Html | ElementType::Br
                ) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            _ => {
                let name = ctx.atoms.intern("head")?;
                let handle =
                    self.insert_html_element(name, ElementType::Head, &[], false, true, input, ctx)?;
                self.sink.ref_node(&handle);
                self.head = Some(handle);
                self.mode = InsertionMode::InHead;
                if let Tok::Text(text) = tok {
                    self.text_skip += ws_prefix_len(text);
                }
                Ok(true)
            }
        }
    }

    pub(in crate::tree_builder) fn mode_in_head(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                let ws = ws_prefix_len(text);
                if ws > 0 {
                    self.append_text(&text[..ws], ctx)?;
                }
                if ws == text.len() {
                    return Ok(false);
                }
                // Non-whitespace falls out of head.
                self.text_skip += ws;
                self.pop_and_release();
                self.mode = InsertionMode::AfterHead;
                Ok(true)
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
            } => match kind {
                ElementType::Html => self.mode_in_body(tok, input, ctx),
                ElementType::Base
                | ElementType::Basefont
                | ElementType::Bgsound
                | ElementType::Link => {
                    self.insert_html_element(*name, *kind, attrs, *self_closing, false, input, ctx)?;
                    Ok(false)
                }
                ElementType::Meta => {
                    self.insert_html_element(*name, *kind, attrs, *self_closing, false, input, ctx)?;
                    if let Some(label) = meta_encoding_label(attrs, input, ctx) {
                        self.outcome.encoding_change = Some(label);
                    }
                    Ok(false)
                }
                ElementType::Title => {
                    self.parse_raw_element(
                        *name,
                        *kind,
                        attrs,
                        *self_closing,
                        ContentModel::Rcdata,
                        input,
                        ctx,
                    )?;
                    Ok(false)
                }
                ElementType::Noscript if !self.config.scripting => {
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.mode = InsertionMode::InHeadNoscript;
                    Ok(false)
                }
                ElementType::Noscript | ElementType::Noframes | ElementType::Style => {
                    self.parse_raw_element(
                        *name,
                        *kind,
                        attrs,
                        *self_closing,
                        ContentModel::Cdata,
                        input,
                        ctx,
                    )?;
                    Ok(false)
                }
                ElementType::Script => {
                    self.parse_raw_element(
                        *name,
                        *kind,
                        attrs,
                        *self_closing,
                        ContentModel::ScriptData,
                        input,
                        ctx,
                    )?;
                    Ok(false)
                }
                ElementType::Template => {
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.formatting.push_marker();
                    self.frameset_ok = false;
                    Ok(false)
                }
                ElementType::Head => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    Ok(false)
                }
                _ => {
                    self.pop_and_release();
                    self.mode = InsertionMode::AfterHead;
                    Ok(true)
                }
            },
            Tok::End { kind, .. } => match kind {
                ElementType::Head => {
                    self.pop_and_release();
                    self.mode = InsertionMode::AfterHead;
                    Ok(false)
                }
                ElementType::Template => {
                    if !self.stack.any(|f| f.kind == ElementType::Template) {
                        self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                        return Ok(false);
                    }
                    self.generate_implied_end_tags(None);
                    self.pop_until_popped(ElementType::Template);
                    self.clear_formatting_to_marker();
                    Ok(false)
                }
                ElementType::Body | ElementType::Html | ElementType::Br => {
                    self.pop_and_release();
                    self.mode = InsertionMode::AfterHead;
                    Ok(true)
                }
                _ => {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(false)
                }
            },
            Tok::Eof => {
                self.pop_and_release();
                self.mode = InsertionMode::AfterHead;
                Ok(true)
            }
        }
    }

    pub(in crate::tree_builder) fn mode_in_head_noscript(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Doctype { .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedDoctype);
                Ok(false)
            }
            Tok::Start {
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::End {
                kind: ElementType::Noscript,
                ..
            } => {
                self.pop_and_release();
                self.mode = InsertionMode::InHead;
                Ok(false)
            }
            Tok::Text(text) if is_all_ws(text) => self.mode_in_head(tok, input, ctx),
            Tok::Comment(_) => self.mode_in_head(tok, input, ctx),
            Tok::Start { kind, .. }
                if matches!(
                    kind,
                    ElementType::Basefont
                        | ElementType::Bgsound
                        | ElementType::Link
                        | ElementType::Meta
                        | ElementType::Noframes
                        | ElementType::Style
                ) =>
            {
                self.mode_in_head(tok, input, ctx)
            }
            Tok::Start { kind, .. }
                if matches!(kind, ElementType::Head | ElementType::Noscript) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                Ok(false)
            }
            Tok::End { kind, .. } if *kind != ElementType::Br => {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            _ => {
                self.err(ctx, ParseErrorCode::UnexpectedToken);
                self.pop_and_release();
                self.mode = InsertionMode::InHead;
                Ok(true)
            }
        }
    }

    pub(in crate::tree_builder) fn mode_after_head(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                let ws = ws_prefix_len(text);
                if ws > 0 {
                    self.append_text(&text[..ws], ctx)?;
                }
                if ws == text.len() {
                    return Ok(false);
                }
                self.text_skip += ws;
                self.synthesize_body(input, ctx)?;
                Ok(true)
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
            } => match kind {
                ElementType::Html => self.mode_in_body(tok, input, ctx),
                ElementType::Body => {
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.frameset_ok = false;
                    self.mode = InsertionMode::InBody;
                    Ok(false)
                }
                ElementType::Frameset => {
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.mode = InsertionMode::InFrameset;
                    Ok(false)
                }
                ElementType::Base
                | ElementType::Basefont
                | ElementType::Bgsound
                | ElementType::Link
                | ElementType::Meta
                | ElementType::Noframes
                | ElementType::Script
                | ElementType::Style
                | ElementType::Template
                | ElementType::Title => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    let Some(head) = self.head.clone() else {
                        return Ok(false);
                    };
                    // Re-open the head element for this one token.
                    self.sink.ref_node(&head);
                    let head_name = ctx.atoms.intern("head")?;
                    self.stack.push(crate::tree_builder::stack::Frame {
                        handle: head.clone(),
                        name: head_name,
                        kind: ElementType::Head,
                        ns: crate::elements::Ns::Html,
                        html_ip: false,
                    });
                    let result = self.mode_in_head(tok, input, ctx)?;
                    if let Some(idx) = self.stack.index_of_handle(&head) {
                        let frame = self.stack.remove(idx);
                        self.sink.unref_node(&frame.handle);
                    }
                    Ok(result)
                }
                ElementType::Head => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    Ok(false)
                }
                _ => {
                    self.synthesize_body(input, ctx)?;
                    Ok(true)
                }
            },
            Tok::End { kind, .. } => match kind {
                ElementType::Template => self.mode_in_head(tok, input, ctx),
                ElementType::Body | ElementType::Html | ElementType::Br => {
                    self.synthesize_body(input, ctx)?;
                    Ok(true)
                }
                _ => {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(false)
                }
            },
            Tok::Eof => {
                self.synthesize_body(input, ctx)?;
                Ok(true)
            }
        }
    }

    fn synthesize_body(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<(), Error> {
        let name = ctx.atoms.intern("body")?;
        self.insert_html_element(name, ElementType::Body, &[], false, true, input, ctx)?;
        self.mode = InsertionMode::InBody;
        Ok(())
    }
}

/// Extract an encoding label from a `meta` tag's attributes: a `charset`
/// attribute, or a `content-type` pragma's `content` attribute.
fn meta_encoding_label(
    attrs: &[Attribute],
    input: &Input,
    ctx: &DocumentParseContext,
) -> Option<String> {
    let mut charset: Option<String> = None;
    let mut got_pragma = false;
    let mut content: Option<String> = None;
    for attr in attrs {
        let name = ctx.atoms.resolve(attr.name);
        let value = match attr.value.as_ref() {
            Some(TextValue::Span(span)) => input.text(*span).to_string(),
            Some(TextValue::Owned(s)) => s.clone(),
            None => String::new(),
        };
        match name {
            "charset" => charset = charset.or(Some(value)),
            "http-equiv" => got_pragma |= value.eq_ignore_ascii_case("content-type"),
            "content" => content = content.or(Some(value)),
            _ => {}
        }
    }
    charset.or_else(|| {
        if !got_pragma {
            return None;
        }
        let content = content?;
        crate::charset::meta_content_charset(content.as_bytes())
            .map(|label| String::from_utf8_lossy(label).into_owned())
    })
}
