//! The "in body" insertion mode, and the pieces of it other modes borrow.

use super::is_all_ws;
use crate::context::DocumentParseContext;
use crate::elements::{ElementType, Ns};
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;
use crate::sink::TreeSink;
use crate::token::Attribute;
use crate::tokenizer::ContentModel;
use crate::tree_builder::stack::Scope;
use crate::tree_builder::{InsertionMode, Tok, TreeBuilder};

impl<S: TreeSink> TreeBuilder<S> {
    pub(in crate::tree_builder) fn mode_in_body(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                self.reconstruct_formatting(ctx)?;
                self.append_text(text, ctx)?;
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
            } => self.in_body_start(*name, *kind, attrs, *self_closing, tok, input, ctx),
            Tok::End { name, kind } => self.in_body_end(*name, *kind, input, ctx),
            Tok::Eof => {
                let ok = !self.stack.any(|f| {
                    f.ns == Ns::Html
                        && !matches!(
                            f.kind,
                            ElementType::Dd
                                | ElementType::Dt
                                | ElementType::Li
                                | ElementType::Option
                                | ElementType::Optgroup
                                | ElementType::P
                                | ElementType::Tbody
                                | ElementType::Td
                                | ElementType::Tfoot
                                | ElementType::Th
                                | ElementType::Thead
                                | ElementType::Tr
                                | ElementType::Body
                                | ElementType::Html
                        )
                });
                if !ok {
                    self.err(ctx, ParseErrorCode::UnexpectedEof);
                }
                self.stop_parsing();
                Ok(false)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn in_body_start(
        &mut self,
        name: crate::atom::AtomId,
        kind: ElementType,
        attrs: &[Attribute],
        self_closing: bool,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match kind {
            Html => {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                if let Some(root) = self.stack.get(0).map(|f| f.handle.clone()) {
                    let resolved = self.resolve_attrs(attrs, input, ctx);
                    Self::sink_result(ctx, self.sink.add_attributes(&root, &resolved))?;
                }
                Ok(false)
            }
            Base | Basefont | Bgsound | Link | Meta | Noframes | Script | Style | Title
            | Template => self.mode_in_head(tok, input, ctx),
            Body => {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                let body = self.stack.get(1).filter(|f| f.kind == Body).map(|f| f.handle.clone());
                if let Some(body) = body {
                    self.frameset_ok = false;
                    let resolved = self.resolve_attrs(attrs, input, ctx);
                    Self::sink_result(ctx, self.sink.add_attributes(&body, &resolved))?;
                }
                Ok(false)
            }
            Frameset => {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                let body_ok = self.stack.get(1).is_some_and(|f| f.kind == Body);
                if !body_ok || !self.frameset_ok {
                    return Ok(false);
                }
                // Rip the body element out and replace it with the frameset.
                let body = self
                    .stack
                    .get(1)
                    .map(|f| f.handle.clone())
                    .expect("checked above");
                if let Some(parent) =
                    Self::sink_result(ctx, self.sink.get_parent(&body, false))?
                {
                    Self::sink_result(ctx, self.sink.remove_child(&parent, &body))?;
                }
                while self.stack.len() > 1 {
                    self.pop_and_release();
                }
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.mode = InsertionMode::InFrameset;
                Ok(false)
            }
            Address | Article | Aside | Blockquote | Center | Details | Dialog | Dir | Div
            | Dl | Fieldset | Figcaption | Figure | Footer | Header | Main | Menu | Nav | Ol
            | P | Section | Summary | Ul | Datagrid => {
                self.close_p_if_in_button_scope(ctx);
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
            H1 | H2 | H3 | H4 | H5 | H6 => {
                self.close_p_if_in_button_scope(ctx);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| f.ns == Ns::Html && f.kind.is_heading())
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                    self.pop_and_release();
                }
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
            Pre | Listing => {
                self.close_p_if_in_button_scope(ctx);
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.skip_newline = true;
                self.frameset_ok = false;
                Ok(false)
            }
            Form => {
                if self.form.is_some() {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    return Ok(false);
                }
                self.close_p_if_in_button_scope(ctx);
                let handle =
                    self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.sink.ref_node(&handle);
                self.form = Some(handle);
                Ok(false)
            }
            Li => {
                self.frameset_ok = false;
                for idx in (0..self.stack.len()).rev() {
                    let frame = self.stack.get(idx).expect("index in range");
                    if frame.ns == Ns::Html && frame.kind == Li {
                        self.generate_implied_end_tags(Some(Li));
                        if self
                            .stack
                            .current()
                            .is_some_and(|f| !(f.ns == Ns::Html && f.kind == Li))
                        {
                            self.err(ctx, ParseErrorCode::MisnestedTag);
                        }
                        self.pop_until_popped(Li);
                        break;
                    }
                    let stops = frame.ns == Ns::Html
                        && frame.kind.is_special()
                        && !matches!(frame.kind, Address | Div | P);
                    if stops || frame.ns != Ns::Html {
                        break;
                    }
                }
                self.close_p_if_in_button_scope(ctx);
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
            Dd | Dt => {
                self.frameset_ok = false;
                for idx in (0..self.stack.len()).rev() {
                    let frame = self.stack.get(idx).expect("index in range");
                    if frame.ns == Ns::Html && matches!(frame.kind, Dd | Dt) {
                        let found = frame.kind;
                        self.generate_implied_end_tags(Some(found));
                        if self
                            .stack
                            .current()
                            .is_some_and(|f| !(f.ns == Ns::Html && f.kind == found))
                        {
                            self.err(ctx, ParseErrorCode::MisnestedTag);
                        }
                        self.pop_until_popped(found);
                        break;
                    }
                    let stops = frame.ns == Ns::Html
                        && frame.kind.is_special()
                        && !matches!(frame.kind, Address | Div | P);
                    if stops || frame.ns != Ns::Html {
                        break;
                    }
                }
                self.close_p_if_in_button_scope(ctx);
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
            Plaintext => {
                self.close_p_if_in_button_scope(ctx);
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.outcome.content_model = Some(ContentModel::Plaintext);
                Ok(false)
            }
            Button => {
                if self.stack.has_in_scope(Button, Scope::Default) {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                    self.generate_implied_end_tags(None);
                    self.pop_until_popped(Button);
                }
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.frameset_ok = false;
                Ok(false)
            }
            A => {
                if self.formatting.find_last_before_marker(A).is_some() {
                    self.err(ctx, ParseErrorCode::ImproperlyNestedFormattingElement);
                    self.adoption_agency(A, name, ctx)?;
                    // A leftover entry means the agency bailed early; drop it
                    // by hand.
                    if let Some(idx) = self.formatting.find_last_before_marker(A) {
                        let entry = self.formatting.remove(idx);
                        if let Some(handle) = entry.handle().cloned() {
                            if let Some(stack_idx) = self.stack.index_of_handle(&handle) {
                                let frame = self.stack.remove(stack_idx);
                                self.sink.unref_node(&frame.handle);
                            }
                        }
                        self.release_formatting_entries(vec![entry]);
                    }
                }
                self.reconstruct_formatting(ctx)?;
                let handle =
                    self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.push_formatting_element(&handle, name, kind, attrs, input, ctx);
                Ok(false)
            }
            B | Big | Code | Em | Font | I | S | Small | Strike | Strong | Tt | U => {
                self.reconstruct_formatting(ctx)?;
                let handle =
                    self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.push_formatting_element(&handle, name, kind, attrs, input, ctx);
                Ok(false)
            }
            Nobr => {
                self.reconstruct_formatting(ctx)?;
                if self.stack.has_in_scope(Nobr, Scope::Default) {
                    self.err(ctx, ParseErrorCode::ImproperlyNestedFormattingElement);
                    self.adoption_agency(Nobr, name, ctx)?;
                    self.reconstruct_formatting(ctx)?;
                }
                let handle =
                    self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.push_formatting_element(&handle, name, kind, attrs, input, ctx);
                Ok(false)
            }
            Applet | Marquee | Object => {
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.formatting.push_marker();
                self.frameset_ok = false;
                Ok(false)
            }
            Table => {
                if self.quirks_mode() != crate::sink::QuirksMode::Quirks {
                    self.close_p_if_in_button_scope(ctx);
                }
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.frameset_ok = false;
                self.mode = InsertionMode::InTable;
                Ok(false)
            }
            Area | Br | Embed | Img | Wbr => {
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, false, input, ctx)?;
                self.frameset_ok = false;
                Ok(false)
            }
            Input => {
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, false, input, ctx)?;
                let hidden = attrs.iter().any(|attr| {
                    ctx.atoms.resolve(attr.name) == "type"
                        && matches!(
                            attr.value.as_ref(),
                            Some(v) if attr_value_eq_ci(v, input, "hidden")
                        )
                });
                if !hidden {
                    self.frameset_ok = false;
                }
                Ok(false)
            }
            Param => {
                self.insert_html_element(name, kind, attrs, self_closing, false, input, ctx)?;
                Ok(false)
            }
            Isindex => {
                // Legacy isindex is treated as an ordinary unknown-ish
                // element; no form expansion.
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, false, input, ctx)?;
                Ok(false)
            }
            Hr => {
                self.close_p_if_in_button_scope(ctx);
                self.insert_html_element(name, kind, attrs, self_closing, false, input, ctx)?;
                self.frameset_ok = false;
                Ok(false)
            }
            Image => {
                // Don't ask.
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                let img = ctx.atoms.intern("img")?;
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(img, Img, attrs, self_closing, false, input, ctx)?;
                self.frameset_ok = false;
                Ok(false)
            }
            Textarea => {
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.outcome.content_model = Some(ContentModel::Rcdata);
                self.original_mode = self.mode;
                self.mode = InsertionMode::Text;
                self.skip_newline = true;
                self.frameset_ok = false;
                Ok(false)
            }
            Xmp => {
                self.close_p_if_in_button_scope(ctx);
                self.reconstruct_formatting(ctx)?;
                self.frameset_ok = false;
                self.parse_raw_element(
                    name,
                    kind,
                    attrs,
                    self_closing,
                    ContentModel::Cdata,
                    input,
                    ctx,
                )?;
                Ok(false)
            }
            Iframe => {
                self.frameset_ok = false;
                self.parse_raw_element(
                    name,
                    kind,
                    attrs,
                    self_closing,
                    ContentModel::Cdata,
                    input,
                    ctx,
                )?;
                Ok(false)
            }
            Noembed => {
                self.parse_raw_element(
                    name,
                    kind,
                    attrs,
                    self_closing,
                    ContentModel::Cdata,
                    input,
                    ctx,
                )?;
                Ok(false)
            }
            Noscript if self.config.scripting => {
                self.parse_raw_element(
                    name,
                    kind,
                    attrs,
                    self_closing,
                    ContentModel::Cdata,
                    input,
                    ctx,
                )?;
                Ok(false)
            }
            Select => {
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                self.frameset_ok = false;
                self.mode = match self.mode {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                };
                Ok(false)
            }
            Optgroup | Option => {
                if self
                    .stack
                    .current()
                    .is_some_and(|f| f.ns == Ns::Html && f.kind == Option)
                {
                    self.pop_and_release();
                }
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
            Rp | Rt => {
                if self.stack.has_in_scope(Ruby, Scope::Default) {
                    self.generate_implied_end_tags(None);
                    if self
                        .stack
                        .current()
                        .is_some_and(|f| !(f.ns == Ns::Html && f.kind == Ruby))
                    {
                        self.err(ctx, ParseErrorCode::MisnestedTag);
                    }
                }
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
            Math => {
                self.reconstruct_formatting(ctx)?;
                self.insert_foreign_element(
                    name,
                    kind,
                    Ns::MathMl,
                    attrs,
                    self_closing,
                    input,
                    ctx,
                )?;
                Ok(false)
            }
            Svg => {
                self.reconstruct_formatting(ctx)?;
                self.insert_foreign_element(name, kind, Ns::Svg, attrs, self_closing, input, ctx)?;
                Ok(false)
            }
            Caption | Col | Colgroup | Frame | Head | Tbody | Td | Tfoot | Th | Thead | Tr => {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                Ok(false)
            }
            _ => {
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
                Ok(false)
            }
        }
    }

    fn in_body_end(
        &mut self,
        name: crate::atom::AtomId,
        kind: ElementType,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match kind {
            Body => {
                if !self.stack.has_in_scope(Body, Scope::Default) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.check_unclosed_at_body_end(ctx);
                self.mode = InsertionMode::AfterBody;
                Ok(false)
            }
            Html => {
                if !self.stack.has_in_scope(Body, Scope::Default) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.check_unclosed_at_body_end(ctx);
                self.mode = InsertionMode::AfterBody;
                Ok(true)
            }
            Address | Article | Aside | Blockquote | Button | Center | Details | Dialog | Dir
            | Div | Dl | Fieldset | Figcaption | Figure | Footer | Header | Listing | Main
            | Menu | Nav | Ol | Pre | Section | Summary | Ul | Datagrid => {
                if !self.stack.has_in_scope(kind, Scope::Default) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(None);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == kind))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until_popped(kind);
                Ok(false)
            }
            Form => {
                let node = self.form.take();
                if let Some(ref handle) = node {
                    self.sink.unref_node(handle);
                }
                let Some(handle) = node else {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                };
                if self
                    .stack
                    .find_in_scope_by(Scope::Default, |f| f.handle == handle)
                    .is_none()
                {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(None);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| f.handle != handle)
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                if let Some(idx) = self.stack.index_of_handle(&handle) {
                    let frame = self.stack.remove(idx);
                    self.sink.unref_node(&frame.handle);
                }
                Ok(false)
            }
            P => {
                if !self.stack.has_in_scope(P, Scope::Button) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    let p = ctx.atoms.intern("p")?;
                    self.insert_html_element(p, P, &[], false, true, input, ctx)?;
                }
                self.close_p_element(ctx);
                Ok(false)
            }
            Li => {
                if !self.stack.has_in_scope(Li, Scope::ListItem) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(Some(Li));
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == Li))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until_popped(Li);
                Ok(false)
            }
            Dd | Dt => {
                if !self.stack.has_in_scope(kind, Scope::Default) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(Some(kind));
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == kind))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until_popped(kind);
                Ok(false)
            }
            H1 | H2 | H3 | H4 | H5 | H6 => {
                let any_heading = self
                    .stack
                    .find_in_scope_by(Scope::Default, |f| {
                        f.ns == Ns::Html && f.kind.is_heading()
                    })
                    .is_some();
                if !any_heading {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(None);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == kind))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until_one_of_popped(&[H1, H2, H3, H4, H5, H6]);
                Ok(false)
            }
            A | B | Big | Code | Em | Font | I | Nobr | S | Small | Strike | Strong | Tt | U => {
                if self.adoption_agency(kind, name, ctx)? {
                    Ok(false)
                } else {
                    self.any_other_end_tag(name, ctx);
                    Ok(false)
                }
            }
            Applet | Marquee | Object => {
                if !self.stack.has_in_scope(kind, Scope::Default) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(None);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == kind))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until_popped(kind);
                self.clear_formatting_to_marker();
                Ok(false)
            }
            Br => {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                let br = ctx.atoms.intern("br")?;
                self.reconstruct_formatting(ctx)?;
                self.insert_html_element(br, Br, &[], false, false, input, ctx)?;
                self.frameset_ok = false;
                Ok(false)
            }
            Template => self.mode_in_head(
                &Tok::End {
                    name,
                    kind: Template,
                },
                input,
                ctx,
            ),
            _ => {
                self.any_other_end_tag(name, ctx);
                Ok(false)
            }
        }
    }

    /// The "any other end tag" steps of the in-body mode.
    pub(in crate::tree_builder) fn any_other_end_tag(
        &mut self,
        name: crate::atom::AtomId,
        ctx: &mut DocumentParseContext,
    ) {
        for idx in (0..self.stack.len()).rev() {
            let frame = self.stack.get(idx).expect("index in range");
            if frame.ns == Ns::Html && frame.name == name {
                self.generate_implied_end_tags_except_name(name);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.name == name))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                while let Some(popped) = self.stack.pop() {
                    let done = popped.ns == Ns::Html && popped.name == name;
                    self.sink.unref_node(&popped.handle);
                    if done {
                        break;
                    }
                }
                return;
            }
            if crate::tree_builder::frame_is_special(frame) {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                return;
            }
        }
        self.err(ctx, ParseErrorCode::UnexpectedEndTag);
    }

    /// Implied end tags, but keyed by name so unknown elements work too.
    fn generate_implied_end_tags_except_name(&mut self, name: crate::atom::AtomId) {
        loop {
            let Some(current) = self.stack.current() else {
                return;
            };
            if current.ns != Ns::Html || current.name == name {
                return;
            }
            let implied = matches!(
                current.kind,
                ElementType::Dd
                    | ElementType::Dt
                    | ElementType::Li
                    | ElementType::Option
                    | ElementType::Optgroup
                    | ElementType::P
                    | ElementType::Rp
                    | ElementType::Rt
            );
            if !implied {
                return;
            }
            self.pop_and_release();
        }
    }

    fn check_unclosed_at_body_end(&mut self, ctx: &mut DocumentParseContext) {
        let clean = !self.stack.any(|f| {
            f.ns == Ns::Html
                && !matches!(
                    f.kind,
                    ElementType::Dd
                        | ElementType::Dt
                        | ElementType::Li
                        | ElementType::Optgroup
                        | ElementType::Option
                        | ElementType::P
                        | ElementType::Rp
                        | ElementType::Rt
                        | ElementType::Tbody
                        | ElementType::Td
                        | ElementType::Tfoot
                        | ElementType::Th
                        | ElementType::Thead
                        | ElementType::Tr
                        | ElementType::Body
                        | ElementType::Html
                )
        });
        if !clean {
            self.err(ctx, ParseErrorCode::UnexpectedEndTag);
        }
    }
}

fn attr_value_eq_ci(
    value: &crate::token::TextValue,
    input: &Input,
    expected: &str,
) -> bool {
    let text = match value {
        crate::token::TextValue::Span(span) => input.text(*span),
        crate::token::TextValue::Owned(s) => s.as_str(),
    };
    text.eq_ignore_ascii_case(expected)
}
