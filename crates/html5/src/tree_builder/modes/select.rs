//! The "in select" and "in select in table" insertion modes.

use crate::context::DocumentParseContext;
use crate::elements::{ElementType, Ns};
use crate::errors::{Error, ParseErrorCode};
use crate::input::Input;
use crate::sink::TreeSink;
use crate::tree_builder::stack::Scope;
use crate::tree_builder::{Tok, TreeBuilder};

impl<S: TreeSink> TreeBuilder<S> {
    pub(in crate::tree_builder) fn mode_in_select(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match tok {
            Tok::Text(text) => {
                self.append_text(text, ctx)?;
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
            } => match kind {
                Html => self.mode_in_body(tok, input, ctx),
                Option => {
                    if self.current_is(Option) {
                        self.pop_and_release();
                    }
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    Ok(false)
                }
                Optgroup => {
                    if self.current_is(Option) {
                        self.pop_and_release();
                    }
                    if self.current_is(Optgroup) {
                        self.pop_and_release();
                    }
                    self.insert_html_element(*name, *kind, attrs, *self_closing, true, input, ctx)?;
                    Ok(false)
                }
                Select => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    if self.stack.has_in_scope(Select, Scope::Select) {
                        self.pop_until_popped(Select);
                        self.reset_insertion_mode();
                    }
                    Ok(false)
                }
                Input | Textarea => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    if !self.stack.has_in_scope(Select, Scope::Select) {
                        return Ok(false);
                    }
                    self.pop_until_popped(Select);
                    self.reset_insertion_mode();
                    Ok(true)
                }
                Script | Template => self.mode_in_head(tok, input, ctx),
                _ => {
                    self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                    Ok(false)
                }
            },
            Tok::End { kind, .. } => match kind {
                Optgroup => {
                    if self.current_is(Option)
                        && self
                            .stack
                            .previous()
                            .is_some_and(|f| f.ns == Ns::Html && f.kind == Optgroup)
                    {
                        self.pop_and_release();
                    }
                    if self.current_is(Optgroup) {
                        self.pop_and_release();
                    } else {
                        self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    }
                    Ok(false)
                }
                Option => {
                    if self.current_is(Option) {
                        self.pop_and_release();
                    } else {
                        self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    }
                    Ok(false)
                }
                Select => {
                    if !self.stack.has_in_scope(Select, Scope::Select) {
                        self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                        return Ok(false);
                    }
                    self.pop_until_popped(Select);
                    self.reset_insertion_mode();
                    Ok(false)
                }
                Template => self.mode_in_head(tok, input, ctx),
                _ => {
                    self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                    Ok(false)
                }
            },
            Tok::Eof => self.mode_in_body(tok, input, ctx),
        }
    }

    pub(in crate::tree_builder) fn mode_in_select_in_table(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        use ElementType::*;
        match tok {
            Tok::Start { kind, .. }
                if matches!(
                    kind,
                    Caption | Table | Tbody | Tfoot | Thead | Tr | Td | Th
                ) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedStartTag);
                self.pop_until_popped(Select);
                self.reset_insertion_mode();
                Ok(true)
            }
            Tok::End { kind, .. }
                if matches!(
                    kind,
                    Caption | Table | Tbody | Tfoot | Thead | Tr | Td | Th
                ) =>
            {
                self.err(ctx, ParseErrorCode::UnexpectedEndTag);
                if !self.stack.has_in_scope(*kind, Scope::Table) {
                    return Ok(false);
                }
                self.pop_until_popped(Select);
                self.reset_insertion_mode();
                Ok(true)
            }
            _ => self.mode_in_select(tok, input, ctx),
        }
    }

    fn current_is(&self, kind: ElementType) -> bool {
        self.stack
            .current()
            .is_some_and(|f| f.ns == Ns::Html && f.kind == kind)
    }
}
