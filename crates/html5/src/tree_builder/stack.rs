//! Stack of open elements.

use crate::atom::AtomId;
use crate::elements::{
    is_mathml_text_integration, is_svg_html_integration, ElementType, Ns,
};

/// One open element. `html_ip` is resolved at insertion time because
//  `annotation-xml` qualifies only with the right `encoding` attribute.
#[derive(Clone, Debug)]
pub(crate) struct Frame<H> {
    pub(crate) handle: H,
    pub(crate) name: AtomId,
    pub(crate) kind: ElementType,
    pub(crate) ns: Ns,
    pub(crate) html_ip: bool,
}

impl<H> Frame<H> {
    pub(crate) fn is_mathml_text_ip(&self) -> bool {
        is_mathml_text_integration(self.kind, self.ns)
    }

    pub(crate) fn is_html_ip(&self) -> bool {
        self.html_ip || is_svg_html_integration(self.kind, self.ns)
    }
}

/// Scope variants for element-in-scope queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Default,
    ListItem,
    Button,
    Table,
    Select,
}

fn is_scope_boundary(kind: ElementType, ns: Ns, scope: Scope) -> bool {
    use ElementType::*;
    let default_boundary = match ns {
        Ns::Html => matches!(
            kind,
            Applet | Caption | Html | Table | Td | Th | Marquee | Object | Template
        ),
        Ns::MathMl => matches!(kind, Mi | Mo | Mn | Ms | Mtext | AnnotationXml),
        Ns::Svg => matches!(kind, ForeignObject | Desc | Title),
    };
    match scope {
        Scope::Default => default_boundary,
        Scope::ListItem => default_boundary || (ns == Ns::Html && matches!(kind, Ol | Ul)),
        Scope::Button => default_boundary || (ns == Ns::Html && kind == Button),
        Scope::Table => ns == Ns::Html && matches!(kind, Html | Table | Template),
        // Select scope is inverted: everything except optgroup/option breaks it.
        Scope::Select => !(ns == Ns::Html && matches!(kind, Optgroup | Option)),
    }
}

/// The stack of open elements. Bottom is the root `html` element; top is the
/// current node. The builder owns the sink-reference discipline (acquire on
/// push, release after pop), so `pop` hands the frame back.
#[derive(Debug, Default)]
pub(crate) struct OpenElements<H> {
    items: Vec<Frame<H>>,
    max_depth: u32,
}

impl<H: Clone> OpenElements<H> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            max_depth: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push(&mut self, frame: Frame<H>) {
        self.items.push(frame);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame<H>> {
        self.items.pop()
    }

    pub(crate) fn current(&self) -> Option<&Frame<H>> {
        self.items.last()
    }

    /// The element just below the current node.
    pub(crate) fn previous(&self) -> Option<&Frame<H>> {
        self.items.len().checked_sub(2).map(|i| &self.items[i])
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Frame<H>> {
        self.items.get(index)
    }

    pub(crate) fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Topmost index whose frame satisfies the predicate.
    pub(crate) fn rposition(&self, pred: impl Fn(&Frame<H>) -> bool) -> Option<usize> {
        self.items.iter().rposition(|frame| pred(frame))
    }

    pub(crate) fn index_of_handle(&self, handle: &H) -> Option<usize>
    where
        H: PartialEq,
    {
        self.items.iter().rposition(|frame| &frame.handle == handle)
    }

    /// Remove the frame at `index`, returning it for reference release.
    pub(crate) fn remove(&mut self, index: usize) -> Frame<H> {
        self.items.remove(index)
    }

    pub(crate) fn insert(&mut self, index: usize, frame: Frame<H>) {
        self.items.insert(index, frame);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    pub(crate) fn replace(&mut self, index: usize, frame: Frame<H>) -> Frame<H> {
        std::mem::replace(&mut self.items[index], frame)
    }

    /// `element-in-scope` query for an HTML-namespace element kind.
    pub(crate) fn has_in_scope(&self, target: ElementType, scope: Scope) -> bool {
        self.find_in_scope(target, scope).is_some()
    }

    pub(crate) fn find_in_scope(&self, target: ElementType, scope: Scope) -> Option<usize> {
        self.find_in_scope_by(scope, |frame| frame.ns == Ns::Html && frame.kind == target)
    }

    /// Generalized scope probe; the predicate sees each frame top-down.
    pub(crate) fn find_in_scope_by(
        &self,
        scope: Scope,
        pred: impl Fn(&Frame<H>) -> bool,
    ) -> Option<usize> {
        for index in (0..self.items.len()).rev() {
            let frame = &self.items[index];
            if pred(frame) {
                return Some(index);
            }
            if is_scope_boundary(frame.kind, frame.ns, scope) {
                return None;
            }
        }
        None
    }

    /// Whether any frame satisfies the predicate (no scope boundary).
    pub(crate) fn any(&self, pred: impl Fn(&Frame<H>) -> bool) -> bool {
        self.items.iter().any(|frame| pred(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: ElementType, ns: Ns) -> Frame<u32> {
        static NEXT: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(1);
        Frame {
            handle: NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            name: AtomId(0),
            kind,
            ns,
            html_ip: false,
        }
    }

    #[test]
    fn scope_queries_respect_boundaries() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html, Ns::Html));
        stack.push(frame(ElementType::P, Ns::Html));
        assert!(stack.has_in_scope(ElementType::P, Scope::Default));

        stack.push(frame(ElementType::Table, Ns::Html));
        assert!(!stack.has_in_scope(ElementType::P, Scope::Default));
        // Table scope sees through everything but html/table/template.
        assert!(stack.has_in_scope(ElementType::Table, Scope::Table));
    }

    #[test]
    fn list_item_and_button_scopes_add_boundaries() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html, Ns::Html));
        stack.push(frame(ElementType::Li, Ns::Html));
        assert!(stack.has_in_scope(ElementType::Li, Scope::ListItem));
        stack.push(frame(ElementType::Ul, Ns::Html));
        assert!(!stack.has_in_scope(ElementType::Li, Scope::ListItem));

        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html, Ns::Html));
        stack.push(frame(ElementType::P, Ns::Html));
        stack.push(frame(ElementType::Button, Ns::Html));
        assert!(!stack.has_in_scope(ElementType::P, Scope::Button));
        assert!(stack.has_in_scope(ElementType::P, Scope::Default));
    }

    #[test]
    fn select_scope_is_inverted() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html, Ns::Html));
        stack.push(frame(ElementType::Select, Ns::Html));
        stack.push(frame(ElementType::Optgroup, Ns::Html));
        stack.push(frame(ElementType::Option, Ns::Html));
        assert!(stack.has_in_scope(ElementType::Select, Scope::Select));
        stack.push(frame(ElementType::Div, Ns::Html));
        assert!(!stack.has_in_scope(ElementType::Select, Scope::Select));
    }

    #[test]
    fn foreign_frames_break_default_scope() {
        let mut stack = OpenElements::new();
        stack.push(frame(ElementType::Html, Ns::Html));
        stack.push(frame(ElementType::P, Ns::Html));
        stack.push(frame(ElementType::ForeignObject, Ns::Svg));
        assert!(!stack.has_in_scope(ElementType::P, Scope::Default));
    }
}
