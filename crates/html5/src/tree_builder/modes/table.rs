//! The table family of insertion modes.

use super::{is_all_ws, ws_prefix_len};
use crate::context::DocumentParseContext;
use crate::elements::{ElementType, Ns};
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;
use crate::sink::TreeSink;
use crate::token::TextValue;
use crate::tree_builder::stack::Scope;
use crate::tree_builder::{InsertionMode, Tok, TreeBuilder};

impl<S: TreeSink> TreeBuilder<S> {
    pub(in crate::tree_builder) fn mode_in_table(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match tok {
            Tok::Text(_) => {
                let current_is_table_part = self.stack.current().is_some_and(|f| {
                    f.ns == Ns::Html && matches!(f.kind, Table | Tbody | Tfoot | Thead | Tr)
                });
                if current_is_table_part {
                    self.pending_table_text.clear();
                    self.original_mode = self.mode;
                    self.mode = InsertionMode::InTableText;
                    Ok(true)
                } else {
                    self.foster_in_body(tok, input, ctx)
                }
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
                Caption => {
                    self.clear_stack_to_table_context();
                    self.formatting.push_marker();
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.mode = InsertionMode::InCaption;
                    Ok(false)
                }
                Colgroup => {
                    self.clear_stack_to_table_context();
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.mode = InsertionMode::InColumnGroup;
                    Ok(false)
                }
                Col => {
                    self.clear_stack_to_table_context();
                    let colgroup = ctx.atoms.intern("colgroup")?;
                    self.insert_html_element(colgroup, Colgroup, &[], false, true, input, ctx)?;
                    self.mode = InsertionMode::InColumnGroup;
                    Ok(true)
                }
                Tbody | Tfoot | Thead => {
                    self.clear_stack_to_table_context();
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.mode = InsertionMode::InTableBody;
                    Ok(false)
                }
                Td | Th | Tr => {
                    self.clear_stack_to_table_context();
                    let tbody = ctx.atoms.intern("tbody")?;
                    self.insert_html_element(tbody, Tbody, &[], false, true, input, ctx)?;
                    self.mode = InsertionMode::InTableBody;
                    Ok(true)
                }
                Table => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    if !self.stack.has_in_scope(Table, Scope::Table) {
                        return Ok(false);
                    }
                    self.pop_until_popped(Table);
                    self.reset_insertion_mode();
                    Ok(true)
                }
                Style | Script | Template => self.mode_in_head(tok, input, ctx),
                Input => {
                    let hidden = attrs.iter().any(|attr| {
                        if ctx.atoms.resolve(attr.name) != "type" {
                            return false;
                        }
                        match attr.value.as_ref() {
                            Some(TextValue::Span(span)) => {
                                input.text(*span).eq_ignore_ascii_case("hidden")
                            }
                            Some(TextValue::Owned(s)) => s.eq_ignore_ascii_case("hidden"),
                            None => false,
                        }
                    });
                    if !hidden {
                        return self.foster_in_body(tok, input, ctx);
                    }
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    self.insert_html_element(*name, *kind, attrs, *self_closing, false, input, ctx)?;
                    Ok(false)
                }
                Form => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    if self.form.is_some() {
                        return Ok(false);
                    }
                    let handle = self
                        .insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    self.sink.ref_node(&handle);
                    self.form = Some(handle);
                    self.pop_and_release();
                    Ok(false)
                }
                _ => self.foster_in_body(tok, input, ctx),
            },
            Tok::End { kind, .. } => match kind {
                Table => {
                    if !self.stack.has_in_scope(Table, Scope::Table) {
                        self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                        return Ok(false);
                    }
                    self.pop_until_popped(Table);
                    self.reset_insertion_mode();
                    Ok(false)
                }
                Body | Caption | Col | Colgroup | Html | Tbody | Td | Tfoot | Th | Thead | Tr => {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(false)
                }
                _ => self.foster_in_body(tok, input, ctx),
            },
            Tok::Eof => self.mode_in_body(tok, input, ctx),
        }
    }

    /// "Process using the rules for in body, with foster parenting enabled."
    fn foster_in_body(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        self.err(ctx, ParseErrorCode::UnexpectedToken);
        self.foster_parenting = true;
        let result = self.mode_in_body(tok, input, ctx);
        self.foster_parenting = false;
        result
    }

    pub(in crate::tree_builder) fn mode_in_table_text(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match tok {
            Tok::Text(text) => {
                self.pending_table_text.push_str(text);
                Ok(false)
            }
            _ => {
                let pending = std::mem::take(&mut self.pending_table_text);
                if is_all_ws(&pending) {
                    self.append_text(&pending, ctx)?;
                } else {
                    // Character data that does not belong in a table is
                    // foster-parented ahead of it.
                    self.err(ctx, ParseErrorCode::UnexpectedCharacter);
                    self.foster_parenting = true;
                    self.reconstruct_formatting(ctx)?;
                    self.append_text(&pending, ctx)?;
                    self.foster_parenting = false;
                    self.frameset_ok = false;
                }
                self.mode = self.original_mode;
                let _ = input;
                Ok(true)
            }
        }
    }

    pub(in crate::tree_builder) fn mode_in_caption(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        let close_caption = |builder: &mut Self, ctx: &mut DocumentParseContext| -> bool {
            if !builder.stack.has_in_scope(Caption, Scope::Table) {
                builder.err(ctx, ParseErrorCode::UnexpectedToken);
                return false;
            }
            builder.generate_implied_end_tags(None);
            if builder
                .stack
                .current()
                .is_some_and(|f| !(f.ns == Ns::Html && f.kind == Caption))
            {
                builder.err(ctx, ParseErrorCode::MisnestedTag);
            }
            builder.pop_until_popped(Caption);
            builder.clear_formatting_to_marker();
            builder.mode = InsertionMode::InTable;
            true
        };

        match tok {
            Tok::End { kind: Caption, .. } => {
                close_caption(self, ctx);
                Ok(false)
            }
            Tok::Start { kind, .. }
                if matches!(
                    kind,
                    Caption | Col | Colgroup | Tbody | Td | Tfoot | Th | Thead | Tr
                ) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                Ok(close_caption(self, ctx))
            }
            Tok::End { kind: Table, .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(close_caption(self, ctx))
            }
            Tok::End { kind, .. }
                if matches!(
                    kind,
                    Body | Col | Colgroup | Html | Tbody | Td | Tfoot | Th | Thead | Tr
                ) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            _ => self.mode_in_body(tok, input, ctx),
        }
    }

    pub(in crate::tree_builder) fn mode_in_column_group(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
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
                self.column_group_fallthrough(ctx)
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
                kind: ElementType::Html,
                ..
            } => self.mode_in_body(tok, input, ctx),
            Tok::Start {
                name,
                kind: Col,
                attrs,
                self_closing,
            } => {
                self.insert_html_element(*name, Col, attrs, *self_closing, false, input, ctx)?;
                Ok(false)
            }
            Tok::End { kind: Colgroup, .. } => {
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == Colgroup))
                {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.pop_and_release();
                self.mode = InsertionMode::InTable;
                Ok(false)
            }
            Tok::End { kind: Col, .. } => {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            Tok::Eof => self.mode_in_body(tok, input, ctx),
            _ => self.column_group_fallthrough(ctx),
        }
    }

    fn column_group_fallthrough(
        &mut self,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        if self
            .stack
            .current()
            .is_some_and(|f| !(f.ns == Ns::Html && f.kind == ElementType::Colgroup))
        {
            self.err(ctx, ParseErrorCode::UnexpectedToken);
            return Ok(false);
        }
        self.pop_and_release();
        self.mode = InsertionMode::InTable;
        Ok(true)
    }

    pub(in crate::tree_builder) fn mode_in_table_body(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match tok {
            Tok::Start {
                name,
                kind: Tr,
                attrs,
                self_closing,
            } => {
                self.clear_stack_to_table_body_context();
                self.insert_html_element(*name, Tr, attrs, *self_closing, true, input, ctx)?;
                self.mode = InsertionMode::InRow;
                Ok(false)
            }
            Tok::Start { kind, .. } if matches!(kind, Td | Th) => {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                self.clear_stack_to_table_body_context();
                let tr = ctx.atoms.intern("tr")?;
                self.insert_html_element(tr, Tr, &[], false, true, input, ctx)?;
                self.mode = InsertionMode::InRow;
                Ok(true)
            }
            Tok::End { kind, .. } if matches!(kind, Tbody | Tfoot | Thead) => {
                if !self.stack.has_in_scope(*kind, Scope::Table) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.clear_stack_to_table_body_context();
                self.pop_and_release();
                self.mode = InsertionMode::InTable;
                Ok(false)
            }
            Tok::Start { kind, .. }
                if matches!(kind, Caption | Col | Colgroup | Tbody | Tfoot | Thead) =>
            {
                self.table_body_exit(ctx)
            }
            Tok::End { kind: Table, .. } => self.table_body_exit(ctx),
            Tok::End { kind, .. }
                if matches!(kind, Body | Caption | Col | Colgroup | Html | Td | Th | Tr) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            _ => self.mode_in_table(tok, input, ctx),
        }
    }

    fn table_body_exit(&mut self, ctx: &mut DocumentParseContext) -> Result<bool, Error> {
        use ElementType::*;
        let has_section = self
            .stack
            .find_in_scope_by(Scope::Table, |f| {
                f.ns == Ns::Html && matches!(f.kind, Tbody | Tfoot | Thead)
            })
            .is_some();
        if !has_section {
            self.err(ctx, ParseErrorCode::UnexpectedToken);
            return Ok(false);
        }
        self.clear_stack_to_table_body_context();
        self.pop_and_release();
        self.mode = InsertionMode::InTable;
        Ok(true)
    }

    pub(in crate::tree_builder) fn mode_in_row(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match tok {
            Tok::Start {
                name,
                kind,
                attrs,
                self_closing,
            } if matches!(kind, Td | Th) => {
                self.clear_stack_to_table_row_context();
                self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                self.mode = InsertionMode::InCell;
                self.formatting.push_marker();
                Ok(false)
            }
            Tok::End { kind: Tr, .. } => {
                if !self.stack.has_in_scope(Tr, Scope::Table) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.clear_stack_to_table_row_context();
                self.pop_and_release();
                self.mode = InsertionMode::InTableBody;
                Ok(false)
            }
            Tok::Start { kind, .. }
                if matches!(kind, Caption | Col | Colgroup | Tbody | Tfoot | Thead | Tr) =>
            {
                self.row_exit(ctx)
            }
            Tok::End { kind: Table, .. } => self.row_exit(ctx),
            Tok::End { kind, .. } if matches!(kind, Tbody | Tfoot | Thead) => {
                if !self.stack.has_in_scope(*kind, Scope::Table) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                if !self.stack.has_in_scope(Tr, Scope::Table) {
                    return Ok(false);
                }
                self.clear_stack_to_table_row_context();
                self.pop_and_release();
                self.mode = InsertionMode::InTableBody;
                Ok(true)
            }
            Tok::End { kind, .. }
                if matches!(kind, Body | Caption | Col | Colgroup | Html | Td | Th) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            _ => self.mode_in_table(tok, input, ctx),
        }
    }

    fn row_exit(&mut self, ctx: &mut DocumentParseContext) -> Result<bool, Error> {
        use ElementType::*;
        if !self.stack.has_in_scope(Tr, Scope::Table) {
            self.err(ctx, ParseErrorCode::UnexpectedToken);
            return Ok(false);
        }
        self.clear_stack_to_table_row_context();
        self.pop_and_release();
        self.mode = InsertionMode::InTableBody;
        Ok(true)
    }

    pub(in crate::tree_builder) fn mode_in_cell(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match tok {
            Tok::End { kind, .. } if matches!(kind, Td | Th) => {
                if !self.stack.has_in_scope(*kind, Scope::Table) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.generate_implied_end_tags(None);
                if self
                    .stack
                    .current()
                    .is_some_and(|f| !(f.ns == Ns::Html && f.kind == *kind))
                {
                    self.err(ctx, ParseErrorCode::MisnestedTag);
                }
                self.pop_until_popped(*kind);
                self.clear_formatting_to_marker();
                self.mode = InsertionMode::InRow;
                Ok(false)
            }
            Tok::Start { kind, .. }
                if matches!(
                    kind,
                    Caption | Col | Colgroup | Tbody | Td | Tfoot | Th | Thead | Tr
                ) =>
            {
                if !self.has_open_cell() {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    return Ok(false);
                }
                self.close_cell(ctx);
                Ok(true)
            }
            Tok::End { kind, .. }
                if matches!(kind, Body | Caption | Col | Colgroup | Html) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                Ok(false)
            }
            Tok::End { kind, .. }
                if matches!(kind, Table | Tbody | Tfoot | Thead | Tr) =>
            {
                if !self.stack.has_in_scope(*kind, Scope::Table) {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    return Ok(false);
                }
                self.close_cell(ctx);
                Ok(true)
            }
            _ => self.mode_in_body(tok, input, ctx),
        }
    }

    fn has_open_cell(&self) -> bool {
        self.stack
            .find_in_scope_by(Scope::Table, |f| {
                f.ns == Ns::Html && matches!(f.kind, ElementType::Td | ElementType::Th)
            })
            .is_some()
    }

    /// Close the open `td` or `th` and return to the row.
    fn close_cell(&mut self, ctx: &mut DocumentParseContext) {
        use ElementType::*;
        self.generate_implied_end_tags(None);
        if self
            .stack
            .current()
            .is_some_and(|f| !(f.ns == Ns::Html && matches!(f.kind, Td | Th)))
        {
            self.err(ctx, ParseErrorCode::MisnestedTag);
        }
        self.pop_until_one_of_popped(&[Td, Th]);
        self.clear_formatting_to_marker();
        self.mode = InsertionMode::InRow;
    }
}
