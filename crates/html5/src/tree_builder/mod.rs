//! Tree construction: consumes tokens, maintains the stack of open elements
//! and the list of active formatting elements, and drives the tree sink.
//!
//! Dispatch model: a foreign-content pre-dispatcher runs first whenever the
//! current node is in a non-HTML namespace and the token is not an
//! integration-point escape; otherwise the current insertion mode's handler
//! runs. Handlers return a `reprocess` flag and the token is re-dispatched
//! against the (possibly changed) mode until the flag clears.
//!
//! Reference discipline: every sink node the builder retains (stack frames,
//! formatting-list entries, the head and form pointers) holds one sink
//! reference, released when the builder lets go. Creation calls return a
//! handle with one caller-owned reference; inserting it into the tree and
//! pushing it keeps that reference as the stack's, otherwise it is released
//! immediately after insertion.

use std::sync::Arc;

use crate::atom::AtomId;
use crate::context::DocumentParseContext;
use crate::elements::{ElementType, Ns};
use crate::errors::{Error, ErrorOrigin, ParseErrorCode, SinkError};
use crate::input::Input;
use crate::sink::{AttrNs, AttributeData, ElementData, QuirksMode, TreeSink};
use crate::token::{Attribute, TextValue, Token};
use crate::tokenizer::ContentModel;

mod foreign;
mod formatting;
mod modes;
mod quirks;
mod stack;

use formatting::{ActiveFormatting, CachedTag, Entry};
use stack::{Frame, OpenElements, Scope};

/// Tree-construction insertion modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertionMode {
    #[default]
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

/// Configuration for the tree builder.
#[derive(Clone, Debug, Default)]
pub struct TreeBuilderConfig {
    /// Scripting enabled: `noscript` parses as raw text and a completed
    /// `script` element pauses the parse at its insertion point.
    pub scripting: bool,
}

/// Effects of one token, applied by the parser before the next token.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenOutcome {
    pub(crate) content_model: Option<ContentModel>,
    pub(crate) cdata_allowed: bool,
    /// A meta tag declared this encoding label.
    pub(crate) encoding_change: Option<String>,
    /// A script element completed; the host may inject input before resuming.
    pub(crate) pause: bool,
    /// EOF fully processed; all held references are released.
    pub(crate) stopped: bool,
}

/// Resolved view of one token, precomputed for the dispatch/reprocess loop.
pub(crate) enum Tok<'t> {
    Doctype {
        name: Option<AtomId>,
        public_id: Option<&'t str>,
        system_id: Option<&'t str>,
        force_quirks: bool,
    },
    Start {
        name: AtomId,
        kind: ElementType,
        attrs: &'t [Attribute],
        self_closing: bool,
    },
    End {
        name: AtomId,
        kind: ElementType,
    },
    Comment(&'t str),
    Text(&'t str),
    Eof,
}

/// Insertion location: append to `parent`, or insert before `before`.
struct InsertPos<H> {
    parent: H,
    before: Option<H>,
}

/// The tree builder.
pub struct TreeBuilder<S: TreeSink> {
    sink: S,
    config: TreeBuilderConfig,
    document: S::Handle,
    mode: InsertionMode,
    original_mode: InsertionMode,
    stack: OpenElements<S::Handle>,
    formatting: ActiveFormatting<S::Handle>,
    head: Option<S::Handle>,
    form: Option<S::Handle>,
    frameset_ok: bool,
    foster_parenting: bool,
    quirks: QuirksMode,
    pending_table_text: String,
    /// Bytes of the current text token already consumed by a handler that
    /// split off a whitespace prefix before reprocessing.
    text_skip: usize,
    /// The next text token drops one leading newline (`pre`, `listing`,
    /// `textarea`).
    skip_newline: bool,
    outcome: TokenOutcome,
    stopped: bool,
}

impl<S: TreeSink> TreeBuilder<S> {
    pub fn new(config: TreeBuilderConfig, document: S::Handle, sink: S) -> Self {
        Self {
            sink,
            config,
            document,
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            stack: OpenElements::new(),
            formatting: ActiveFormatting::new(),
            head: None,
            form: None,
            frameset_ok: true,
            foster_parenting: false,
            quirks: QuirksMode::NoQuirks,
            pending_table_text: String::new(),
            text_skip: 0,
            skip_newline: false,
            outcome: TokenOutcome::default(),
            stopped: false,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks
    }

    pub(crate) fn max_open_elements_depth(&self) -> u32 {
        self.stack.max_depth()
    }

    pub(crate) fn max_active_formatting_depth(&self) -> u32 {
        self.formatting.max_depth()
    }

    /// Process one token; returns the effects to apply before the next one.
    pub(crate) fn push_token(
        &mut self,
        token: &Token,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<TokenOutcome, Error> {
        debug_assert!(!self.stopped, "no tokens after EOF");
        ctx.counters.tokens_processed = ctx.counters.tokens_processed.saturating_add(1);

        let tok = match token {
            Token::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => Tok::Doctype {
                name: *name,
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
                force_quirks: *force_quirks,
            },
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => Tok::Start {
                name: *name,
                kind: ctx.element_kind(*name),
                attrs: attributes,
                self_closing: *self_closing,
            },
            Token::EndTag { name } => Tok::End {
                name: *name,
                kind: ctx.element_kind(*name),
            },
            Token::Comment { text } => Tok::Comment(resolve_text(text, input)),
            Token::Text { text } => Tok::Text(resolve_text(text, input)),
            Token::Eof => Tok::Eof,
        };

        self.outcome = TokenOutcome::default();
        self.text_skip = 0;
        if std::mem::take(&mut self.skip_newline) {
            if let Tok::Text(text) = &tok {
                if text.starts_with('\n') {
                    self.text_skip = 1;
                }
            }
        }
        let mut chain = 0u32;
        loop {
            let reprocess = self.dispatch(&tok, input, ctx)?;
            if !reprocess {
                break;
            }
            chain += 1;
            assert!(chain < 64, "token reprocess chain must terminate");
        }

        self.outcome.cdata_allowed = self
            .stack
            .current()
            .is_some_and(|frame| frame.ns != Ns::Html);
        self.outcome.stopped = self.stopped;
        ctx.counters.max_open_elements_depth = ctx
            .counters
            .max_open_elements_depth
            .max(self.stack.max_depth());
        ctx.counters.max_active_formatting_depth = ctx
            .counters
            .max_active_formatting_depth
            .max(self.formatting.max_depth());
        Ok(std::mem::take(&mut self.outcome))
    }

    fn dispatch(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html5.tree_builder",
            "dispatch mode={:?} stack_depth={}",
            self.mode,
            self.stack.len()
        );
        // Apply any split a prior handler made on this text token.
        let shortened;
        let tok = match tok {
            Tok::Text(text) if self.text_skip > 0 => {
                shortened = Tok::Text(&text[self.text_skip.min(text.len())..]);
                &shortened
            }
            _ => tok,
        };
        if self.use_foreign_rules(tok) {
            return self.foreign_content(tok, input, ctx);
        }
        self.dispatch_html(tok, input, ctx)
    }

    /// Mode dispatch for HTML content; also the fallthrough target when the
    /// foreign pre-dispatcher defers to HTML rules.
    fn dispatch_html(
        &mut self,
        tok: &Tok<'_>,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        match self.mode {
            InsertionMode::Initial => self.mode_initial(tok, ctx),
            InsertionMode::BeforeHtml => self.mode_before_html(tok, input, ctx),
            InsertionMode::BeforeHead => self.mode_before_head(tok, input, ctx),
            InsertionMode::InHead => self.mode_in_head(tok, input, ctx),
            InsertionMode::InHeadNoscript => self.mode_in_head_noscript(tok, input, ctx),
            InsertionMode::AfterHead => self.mode_after_head(tok, input, ctx),
            InsertionMode::InBody => self.mode_in_body(tok, input, ctx),
            InsertionMode::Text => self.mode_text(tok, input, ctx),
            InsertionMode::InTable => self.mode_in_table(tok, input, ctx),
            InsertionMode::InTableText => self.mode_in_table_text(tok, input, ctx),
            InsertionMode::InCaption => self.mode_in_caption(tok, input, ctx),
            InsertionMode::InColumnGroup => self.mode_in_column_group(tok, input, ctx),
            InsertionMode::InTableBody => self.mode_in_table_body(tok, input, ctx),
            InsertionMode::InRow => self.mode_in_row(tok, input, ctx),
            InsertionMode::InCell => self.mode_in_cell(tok, input, ctx),
            InsertionMode::InSelect => self.mode_in_select(tok, input, ctx),
            InsertionMode::InSelectInTable => self.mode_in_select_in_table(tok, input, ctx),
            InsertionMode::AfterBody => self.mode_after_body(tok, input, ctx),
            InsertionMode::InFrameset => self.mode_in_frameset(tok, input, ctx),
            InsertionMode::AfterFrameset => self.mode_after_frameset(tok, input, ctx),
            InsertionMode::AfterAfterBody => self.mode_after_after_body(tok, input, ctx),
            InsertionMode::AfterAfterFrameset => self.mode_after_after_frameset(tok, input, ctx),
        }
    }

    // ---- foreign-content pre-dispatch --------------------------------------

    fn use_foreign_rules(&self, tok: &Tok<'_>) -> bool {
        let Some(current) = self.stack.current() else {
            return false;
        };
        if current.ns == Ns::Html {
            return false;
        }
        match tok {
            Tok::Eof => false,
            Tok::Start { kind, .. } => {
                if current.is_mathml_text_ip() {
                    matches!(kind, ElementType::Mglyph | ElementType::Malignmark)
                } else if current.kind == ElementType::AnnotationXml
                    && current.ns == Ns::MathMl
                    && *kind == ElementType::Svg
                {
                    false
                } else {
                    !current.is_html_ip()
                }
            }
            Tok::Text(_) | Tok::Comment(_) => {
                !(current.is_mathml_text_ip() || current.is_html_ip())
            }
            _ => true,
        }
    }

    // ---- common operations -------------------------------------------------

    fn err(&self, ctx: &mut DocumentParseContext, code: ParseErrorCode) {
        ctx.report(ErrorOrigin::TreeBuilder, code, 0);
    }

    fn sink_result<T>(
        ctx: &mut DocumentParseContext,
        result: Result<T, SinkError>,
    ) -> Result<T, Error> {
        ctx.counters.sink_calls = ctx.counters.sink_calls.saturating_add(1);
        result.map_err(Error::Sink)
    }

    fn current_handle(&self) -> S::Handle {
        self.stack
            .current()
            .map(|frame| frame.handle.clone())
            .unwrap_or_else(|| self.document.clone())
    }

    /// The appropriate place for inserting a node, honoring foster parenting.
    fn insertion_pos(
        &mut self,
        ctx: &mut DocumentParseContext,
        override_target: Option<S::Handle>,
    ) -> Result<InsertPos<S::Handle>, Error> {
        let target = override_target.unwrap_or_else(|| self.current_handle());
        if self.foster_parenting {
            // Foster parenting redirects only when the insertion target is a
            // table-family element.
            let target_frame = self
                .stack
                .index_of_handle(&target)
                .and_then(|idx| self.stack.get(idx));
            let target_is_tableish = target_frame.is_some_and(|frame| {
                frame.ns == Ns::Html
                    && matches!(
                        frame.kind,
                        ElementType::Table
                            | ElementType::Tbody
                            | ElementType::Tfoot
                            | ElementType::Thead
                            | ElementType::Tr
                    )
            });
            if target_is_tableish {
                if let Some(table_idx) = self
                    .stack
                    .rposition(|f| f.ns == Ns::Html && f.kind == ElementType::Table)
                {
                    let table = self.stack.get(table_idx).expect("index just found");
                    let table_handle = table.handle.clone();
                    let parent =
                        Self::sink_result(ctx, self.sink.get_parent(&table_handle, true))?;
                    if let Some(parent) = parent {
                        return Ok(InsertPos {
                            parent,
                            before: Some(table_handle),
                        });
                    }
                    let below = self
                        .stack
                        .get(table_idx - 1)
                        .expect("table is never the root frame");
                    return Ok(InsertPos {
                        parent: below.handle.clone(),
                        before: None,
                    });
                }
                let bottom = self.stack.get(0).expect("stack non-empty in table mode");
                return Ok(InsertPos {
                    parent: bottom.handle.clone(),
                    before: None,
                });
            }
        }
        Ok(InsertPos {
            parent: target,
            before: None,
        })
    }

    fn insert_node_at(
        &mut self,
        ctx: &mut DocumentParseContext,
        pos: &InsertPos<S::Handle>,
        node: &S::Handle,
    ) -> Result<(), Error> {
        match &pos.before {
            Some(reference) => Self::sink_result(
                ctx,
                self.sink.insert_before(&pos.parent, node, reference),
            ),
            None => Self::sink_result(ctx, self.sink.append_child(&pos.parent, node)),
        }
    }

    fn resolve_attrs(
        &self,
        attrs: &[Attribute],
        input: &Input,
        ctx: &DocumentParseContext,
    ) -> Vec<AttributeData> {
        attrs
            .iter()
            .map(|attr| AttributeData {
                ns: AttrNs::None,
                name: ctx
                    .atoms
                    .resolve_arc(attr.name)
                    .unwrap_or_else(|| Arc::from("")),
                value: resolve_attr_value(attr.value.as_ref(), input),
            })
            .collect()
    }

    /// Insert an HTML element for a start tag; returns its handle.
    fn insert_html_element(
        &mut self,
        name: AtomId,
        kind: ElementType,
        attrs: &[Attribute],
        self_closing: bool,
        push: bool,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<S::Handle, Error> {
        let data = ElementData {
            ns: Ns::Html,
            name: ctx.atoms.resolve_arc(name).unwrap_or_else(|| Arc::from("")),
            attributes: self.resolve_attrs(attrs, input, ctx),
            self_closing,
        };
        let handle = Self::sink_result(ctx, self.sink.create_element(&data))?;
        let pos = self.insertion_pos(ctx, None)?;
        self.insert_node_at(ctx, &pos, &handle)?;
        if kind.is_form_associatable() {
            if let Some(form) = self.form.clone() {
                Self::sink_result(ctx, self.sink.form_associate(&form, &handle))?;
            }
        }
        if push {
            self.stack.push(Frame {
                handle: handle.clone(),
                name,
                kind,
                ns: Ns::Html,
                html_ip: false,
            });
        } else {
            self.sink.unref_node(&handle);
        }
        Ok(handle)
    }

    fn insert_comment(
        &mut self,
        text: &str,
        target: Option<S::Handle>,
        ctx: &mut DocumentParseContext,
    ) -> Result<(), Error> {
        let handle = Self::sink_result(ctx, self.sink.create_comment(text))?;
        match target {
            Some(parent) => {
                Self::sink_result(ctx, self.sink.append_child(&parent, &handle))?;
            }
            None => {
                let pos = self.insertion_pos(ctx, None)?;
                self.insert_node_at(ctx, &pos, &handle)?;
            }
        }
        self.sink.unref_node(&handle);
        Ok(())
    }

    /// Append text at the appropriate place, via the sink's merge contract.
    fn append_text(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
    ) -> Result<(), Error> {
        if text.is_empty() {
            return Ok(());
        }
        let pos = self.insertion_pos(ctx, None)?;
        match &pos.before {
            Some(reference) => {
                Self::sink_result(
                    ctx,
                    self.sink.insert_text_before(&pos.parent, text, reference),
                )?;
            }
            None => {
                Self::sink_result(ctx, self.sink.append_text(&pos.parent, text))?;
            }
        }
        Ok(())
    }

    fn pop_and_release(&mut self) -> Option<ElementType> {
        let frame = self.stack.pop()?;
        self.sink.unref_node(&frame.handle);
        Some(frame.kind)
    }

    /// Pop until an HTML element of `kind` has been popped.
    fn pop_until_popped(&mut self, kind: ElementType) {
        while let Some(frame) = self.stack.pop() {
            let done = frame.ns == Ns::Html && frame.kind == kind;
            self.sink.unref_node(&frame.handle);
            if done {
                break;
            }
        }
    }

    fn pop_until_one_of_popped(&mut self, kinds: &[ElementType]) {
        while let Some(frame) = self.stack.pop() {
            let done = frame.ns == Ns::Html && kinds.contains(&frame.kind);
            self.sink.unref_node(&frame.handle);
            if done {
                break;
            }
        }
    }

    fn generate_implied_end_tags(&mut self, except: Option<ElementType>) {
        loop {
            let Some(current) = self.stack.current() else {
                return;
            };
            if current.ns != Ns::Html {
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
            if !implied || Some(current.kind) == except {
                return;
            }
            self.pop_and_release();
        }
    }

    /// Close a `p` element in button scope.
    fn close_p_element(&mut self, ctx: &mut DocumentParseContext) {
        self.generate_implied_end_tags(Some(ElementType::P));
        let ok = self
            .stack
            .current()
            .is_some_and(|f| f.ns == Ns::Html && f.kind == ElementType::P);
        if !ok {
            self.err(ctx, ParseErrorCode::MisnestedTag);
        }
        self.pop_until_popped(ElementType::P);
    }

    fn close_p_if_in_button_scope(&mut self, ctx: &mut DocumentParseContext) {
        if self.stack.has_in_scope(ElementType::P, Scope::Button) {
            self.close_p_element(ctx);
        }
    }

    fn clear_stack_to_table_context(&mut self) {
        while let Some(current) = self.stack.current() {
            if current.ns == Ns::Html
                && matches!(current.kind, ElementType::Table | ElementType::Html)
            {
                break;
            }
            self.pop_and_release();
        }
    }

    fn clear_stack_to_table_body_context(&mut self) {
        while let Some(current) = self.stack.current() {
            if current.ns == Ns::Html
                && matches!(
                    current.kind,
                    ElementType::Tbody
                        | ElementType::Tfoot
                        | ElementType::Thead
                        | ElementType::Html
                )
            {
                break;
            }
            self.pop_and_release();
        }
    }

    fn clear_stack_to_table_row_context(&mut self) {
        while let Some(current) = self.stack.current() {
            if current.ns == Ns::Html
                && matches!(current.kind, ElementType::Tr | ElementType::Html)
            {
                break;
            }
            self.pop_and_release();
        }
    }

    // ---- active formatting elements ---------------------------------------

    fn push_formatting_element(
        &mut self,
        handle: &S::Handle,
        name: AtomId,
        kind: ElementType,
        attrs: &[Attribute],
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) {
        let tag = CachedTag {
            name: ctx.atoms.resolve_arc(name).unwrap_or_else(|| Arc::from("")),
            attributes: self.resolve_attrs(attrs, input, ctx),
        };
        self.sink.ref_node(handle);
        let evicted = self.formatting.push_element(Entry::Element {
            handle: handle.clone(),
            name,
            kind,
            ns: Ns::Html,
            tag,
        });
        if let Some(Entry::Element { handle, .. }) = evicted {
            self.sink.unref_node(&handle);
        }
    }

    fn release_formatting_entries(&mut self, entries: Vec<Entry<S::Handle>>) {
        for entry in entries {
            if let Entry::Element { handle, .. } = entry {
                self.sink.unref_node(&handle);
            }
        }
    }

    fn clear_formatting_to_marker(&mut self) {
        let removed = self.formatting.clear_to_last_marker();
        self.release_formatting_entries(removed);
    }

    /// Reconstruct the active formatting elements, if any need it.
    fn reconstruct_formatting(&mut self, ctx: &mut DocumentParseContext) -> Result<(), Error> {
        if self.formatting.is_empty() {
            return Ok(());
        }
        let last_idx = self.formatting.len() - 1;
        match self.formatting.get(last_idx) {
            Some(Entry::Marker) => return Ok(()),
            Some(Entry::Element { handle, .. }) => {
                if self.stack.index_of_handle(handle).is_some() {
                    return Ok(());
                }
            }
            None => return Ok(()),
        }

        // Rewind to the earliest entry after the last marker that is no
        // longer open.
        let mut idx = last_idx;
        loop {
            if idx == 0 {
                break;
            }
            let prev = idx - 1;
            match self.formatting.get(prev) {
                Some(Entry::Marker) => break,
                Some(Entry::Element { handle, .. }) => {
                    if self.stack.index_of_handle(handle).is_some() {
                        break;
                    }
                    idx = prev;
                }
                None => break,
            }
        }

        // Advance: re-create each entry and update it in place.
        loop {
            let (old_handle, name, kind, tag) = match self.formatting.get(idx) {
                Some(Entry::Element {
                    handle,
                    name,
                    kind,
                    tag,
                    ..
                }) => (handle.clone(), *name, *kind, tag.clone()),
                _ => unreachable!("reconstruction window contains only elements"),
            };
            let data = ElementData {
                ns: Ns::Html,
                name: Arc::clone(&tag.name),
                attributes: tag.attributes.clone(),
                self_closing: false,
            };
            let new_handle = Self::sink_result(ctx, self.sink.create_element(&data))?;
            let pos = self.insertion_pos(ctx, None)?;
            self.insert_node_at(ctx, &pos, &new_handle)?;
            // Creation reference becomes the stack's hold; the list takes its
            // own.
            self.stack.push(Frame {
                handle: new_handle.clone(),
                name,
                kind,
                ns: Ns::Html,
                html_ip: false,
            });
            self.sink.ref_node(&new_handle);
            let old_entry = self.formatting.replace(
                idx,
                Entry::Element {
                    handle: new_handle,
                    name,
                    kind,
                    ns: Ns::Html,
                    tag,
                },
            );
            if let Entry::Element { .. } = old_entry {
                self.sink.unref_node(&old_handle);
            }
            if idx == last_idx {
                break;
            }
            idx += 1;
        }
        Ok(())
    }

    // ---- adoption agency ---------------------------------------------------

    /// The adoption agency algorithm. Returns false when the caller should
    /// fall through to the "any other end tag" steps.
    fn adoption_agency(
        &mut self,
        subject: ElementType,
        subject_name: AtomId,
        ctx: &mut DocumentParseContext,
    ) -> Result<bool, Error> {
        // Shortcut: current node is the subject and not in the list.
        if let Some(current) = self.stack.current() {
            if current.ns == Ns::Html
                && current.name == subject_name
                && self.formatting.index_of_handle(&current.handle).is_none()
            {
                self.pop_and_release();
                return Ok(true);
            }
        }

        for _ in 0..8 {
            let Some(fmt_idx) = self.formatting.find_last_before_marker(subject) else {
                return Ok(false);
            };
            let fmt_handle = match self.formatting.get(fmt_idx) {
                Some(Entry::Element { handle, .. }) => handle.clone(),
                _ => unreachable!("find_last_before_marker returns elements"),
            };

            let Some(fmt_stack_idx) = self.stack.index_of_handle(&fmt_handle) else {
                self.err(ctx, ParseErrorCode::ImproperlyNestedFormattingElement);
                let entry = self.formatting.remove(fmt_idx);
                self.release_formatting_entries(vec![entry]);
                return Ok(true);
            };
            if self
                .stack
                .find_in_scope_by(Scope::Default, |f| f.handle == fmt_handle)
                .is_none()
            {
                self.err(ctx, ParseErrorCode::ImproperlyNestedFormattingElement);
                return Ok(true);
            }
            if fmt_stack_idx != self.stack.len() - 1 {
                self.err(ctx, ParseErrorCode::MisnestedTag);
            }

            // Furthest block: lowest special element above the formatting
            // element.
            let furthest = (fmt_stack_idx + 1..self.stack.len()).find(|&i| {
                let frame = self.stack.get(i).expect("index in range");
                frame_is_special(frame)
            });
            let Some(fb_idx) = furthest else {
                // No furthest block: pop to and including the formatting
                // element, drop its list entry.
                while self.stack.len() > fmt_stack_idx {
                    self.pop_and_release();
                }
                let entry = self.formatting.remove(fmt_idx);
                self.release_formatting_entries(vec![entry]);
                return Ok(true);
            };

            let fb_handle = self
                .stack
                .get(fb_idx)
                .expect("furthest block in range")
                .handle
                .clone();
            let common_ancestor = self
                .stack
                .get(fmt_stack_idx - 1)
                .expect("formatting element is never the root frame")
                .handle
                .clone();

            let mut bookmark = fmt_idx;
            let mut node_idx = fb_idx;
            let mut last_node = fb_handle.clone();

            for inner in 1..=u32::MAX {
                node_idx -= 1;
                if node_idx == fmt_stack_idx {
                    break;
                }
                let node = self.stack.get(node_idx).expect("index in range");
                let node_handle = node.handle.clone();
                let node_list_idx = self.formatting.index_of_handle(&node_handle);

                if inner > 3 {
                    if let Some(list_idx) = node_list_idx {
                        let entry = self.formatting.remove(list_idx);
                        self.release_formatting_entries(vec![entry]);
                        if list_idx < bookmark {
                            bookmark -= 1;
                        }
                    }
                    let frame = self.stack.remove(node_idx);
                    self.sink.unref_node(&frame.handle);
                    continue;
                }
                let Some(list_idx) = node_list_idx else {
                    let frame = self.stack.remove(node_idx);
                    self.sink.unref_node(&frame.handle);
                    continue;
                };

                // Re-create the node and swap it into both structures.
                let new_node =
                    Self::sink_result(ctx, self.sink.clone_node(&node_handle, false))?;
                let (name, kind, tag) = match self.formatting.get(list_idx) {
                    Some(Entry::Element {
                        name, kind, tag, ..
                    }) => (*name, *kind, tag.clone()),
                    _ => unreachable!("list index points at an element"),
                };
                self.sink.ref_node(&new_node);
                let old_entry = self.formatting.replace(
                    list_idx,
                    Entry::Element {
                        handle: new_node.clone(),
                        name,
                        kind,
                        ns: Ns::Html,
                        tag,
                    },
                );
                self.release_formatting_entries(vec![old_entry]);
                let old_frame = self.stack.replace(
                    node_idx,
                    Frame {
                        handle: new_node.clone(),
                        name,
                        kind,
                        ns: Ns::Html,
                        html_ip: false,
                    },
                );
                self.sink.unref_node(&old_frame.handle);

                if last_node == fb_handle {
                    bookmark = list_idx + 1;
                }

                // Reparent last node under the fresh clone.
                if let Some(parent) =
                    Self::sink_result(ctx, self.sink.get_parent(&last_node, false))?
                {
                    Self::sink_result(ctx, self.sink.remove_child(&parent, &last_node))?;
                }
                Self::sink_result(ctx, self.sink.append_child(&new_node, &last_node))?;
                last_node = new_node;
            }

            // Place last node at the appropriate place for the common
            // ancestor (foster parenting applies under table ancestors).
            if let Some(parent) =
                Self::sink_result(ctx, self.sink.get_parent(&last_node, false))?
            {
                Self::sink_result(ctx, self.sink.remove_child(&parent, &last_node))?;
            }
            let was_foster = self.foster_parenting;
            self.foster_parenting = true;
            let pos = self.insertion_pos(ctx, Some(common_ancestor))?;
            self.foster_parenting = was_foster;
            self.insert_node_at(ctx, &pos, &last_node)?;

            // Fresh element for the formatting element; move the furthest
            // block's children into it.
            let new_fmt = Self::sink_result(ctx, self.sink.clone_node(&fmt_handle, false))?;
            Self::sink_result(ctx, self.sink.reparent_children(&fb_handle, &new_fmt))?;
            Self::sink_result(ctx, self.sink.append_child(&fb_handle, &new_fmt))?;

            let (name, kind, tag) = match self.formatting.get(fmt_idx) {
                Some(Entry::Element {
                    name, kind, tag, ..
                }) => (*name, *kind, tag.clone()),
                _ => unreachable!("formatting index still valid"),
            };
            let removed = self.formatting.remove(fmt_idx);
            self.release_formatting_entries(vec![removed]);
            let bookmark = if fmt_idx < bookmark {
                bookmark - 1
            } else {
                bookmark
            };
            self.sink.ref_node(&new_fmt);
            self.formatting.insert(
                bookmark,
                Entry::Element {
                    handle: new_fmt.clone(),
                    name,
                    kind,
                    ns: Ns::Html,
                    tag,
                },
            );

            // Stack: remove the old formatting frame, insert the new one
            // right above the furthest block.
            let old_fmt_frame = self.stack.remove(fmt_stack_idx);
            self.sink.unref_node(&old_fmt_frame.handle);
            let fb_idx_now = self
                .stack
                .index_of_handle(&fb_handle)
                .expect("furthest block still open");
            self.stack.insert(
                fb_idx_now + 1,
                Frame {
                    handle: new_fmt,
                    name,
                    kind,
                    ns: Ns::Html,
                    html_ip: false,
                },
            );
        }
        Ok(true)
    }

    // ---- mode resets and teardown -----------------------------------------

    fn reset_insertion_mode(&mut self) {
        for idx in (0..self.stack.len()).rev() {
            let frame = self.stack.get(idx).expect("index in range");
            let last = idx == 0;
            if frame.ns != Ns::Html {
                if last {
                    break;
                }
                continue;
            }
            match frame.kind {
                ElementType::Select => {
                    // Distinguish in-select from in-select-in-table.
                    let in_table = (0..idx).rev().any(|i| {
                        self.stack
                            .get(i)
                            .is_some_and(|f| f.ns == Ns::Html && f.kind == ElementType::Table)
                    });
                    self.mode = if in_table {
                        InsertionMode::InSelectInTable
                    } else {
                        InsertionMode::InSelect
                    };
                    return;
                }
                ElementType::Td | ElementType::Th if !last => {
                    self.mode = InsertionMode::InCell;
                    return;
                }
                ElementType::Tr => {
                    self.mode = InsertionMode::InRow;
                    return;
                }
                ElementType::Tbody | ElementType::Tfoot | ElementType::Thead => {
                    self.mode = InsertionMode::InTableBody;
                    return;
                }
                ElementType::Caption => {
                    self.mode = InsertionMode::InCaption;
                    return;
                }
                ElementType::Colgroup => {
                    self.mode = InsertionMode::InColumnGroup;
                    return;
                }
                ElementType::Table => {
                    self.mode = InsertionMode::InTable;
                    return;
                }
                ElementType::Head if !last => {
                    self.mode = InsertionMode::InHead;
                    return;
                }
                ElementType::Body => {
                    self.mode = InsertionMode::InBody;
                    return;
                }
                ElementType::Frameset => {
                    self.mode = InsertionMode::InFrameset;
                    return;
                }
                ElementType::Html => {
                    self.mode = if self.head.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    };
                    return;
                }
                _ => {}
            }
            if last {
                break;
            }
        }
        self.mode = InsertionMode::InBody;
    }

    /// EOF: release every reference the builder holds.
    fn stop_parsing(&mut self) {
        while self.pop_and_release().is_some() {}
        let entries = self.formatting.drain_all();
        self.release_formatting_entries(entries);
        if let Some(head) = self.head.take() {
            self.sink.unref_node(&head);
        }
        if let Some(form) = self.form.take() {
            self.sink.unref_node(&form);
        }
        self.stopped = true;
    }

    /// Release held references after a fatal error or before a restart.
    pub(crate) fn abort(&mut self) {
        if !self.stopped {
            self.stop_parsing();
        }
    }

    /// Return to the pristine pre-parse state (encoding restart).
    pub(crate) fn reset(&mut self) {
        self.abort();
        self.mode = InsertionMode::Initial;
        self.original_mode = InsertionMode::Initial;
        self.frameset_ok = true;
        self.foster_parenting = false;
        self.quirks = QuirksMode::NoQuirks;
        self.pending_table_text.clear();
        self.text_skip = 0;
        self.skip_newline = false;
        self.outcome = TokenOutcome::default();
        self.stopped = false;
    }

    // ---- raw-text helpers --------------------------------------------------

    /// Generic raw-text/RCDATA element algorithm.
    fn parse_raw_element(
        &mut self,
        name: AtomId,
        kind: ElementType,
        attrs: &[Attribute],
        self_closing: bool,
        model: ContentModel,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Result<(), Error> {
        self.insert_html_element(name, kind, attrs, self_closing, true, input, ctx)?;
        self.outcome.content_model = Some(model);
        self.original_mode = self.mode;
        self.mode = InsertionMode::Text;
        Ok(())
    }
}

fn frame_is_special<H>(frame: &Frame<H>) -> bool {
    match frame.ns {
        Ns::Html => frame.kind.is_special(),
        Ns::MathMl => matches!(
            frame.kind,
            ElementType::Mi
                | ElementType::Mo
                | ElementType::Mn
                | ElementType::Ms
                | ElementType::Mtext
                | ElementType::AnnotationXml
        ),
        Ns::Svg => matches!(
            frame.kind,
            ElementType::ForeignObject | ElementType::Desc | ElementType::Title
        ),
    }
}

fn resolve_text<'t>(text: &'t TextValue, input: &'t Input) -> &'t str {
    match text {
        TextValue::Span(span) => input.text(*span),
        TextValue::Owned(s) => s,
    }
}

fn resolve_attr_value(value: Option<&TextValue>, input: &Input) -> String {
    match value {
        Some(TextValue::Span(span)) => input.text(*span).to_string(),
        Some(TextValue::Owned(s)) => s.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests;
