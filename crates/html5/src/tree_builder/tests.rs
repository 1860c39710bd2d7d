use super::{TreeBuilder, TreeBuilderConfig};
use crate::context::DocumentParseContext;
use crate::errors::SinkError;
use crate::input::Input;
use crate::sink::{AttributeData, DoctypeData, ElementData, QuirksMode, TreeSink};
use crate::token::{Attribute, TextValue, Token};

/// Minimal arena sink for in-crate builder tests (the richer reference sink
/// lives in the test-support crate, which integration tests use).
#[derive(Debug, Default)]
struct MiniSink {
    names: Vec<String>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    texts: Vec<Option<String>>,
    refs: Vec<i64>,
    quirks: Option<QuirksMode>,
}

impl MiniSink {
    fn new() -> Self {
        let mut sink = Self::default();
        sink.add("#document", None);
        // The document handle is client-owned; the engine holds no
        // reference to it.
        sink.refs[0] = 0;
        sink
    }

    fn add(&mut self, name: &str, text: Option<&str>) -> usize {
        self.names.push(name.to_string());
        self.parents.push(None);
        self.children.push(Vec::new());
        self.texts.push(text.map(str::to_string));
        self.refs.push(1);
        self.names.len() - 1
    }

    fn attach(&mut self, parent: usize, child: usize, before: Option<usize>) {
        if let Some(old) = self.parents[child] {
            self.children[old].retain(|&c| c != child);
        }
        self.parents[child] = Some(parent);
        match before {
            Some(reference) => {
                let idx = self.children[parent]
                    .iter()
                    .position(|&c| c == reference)
                    .expect("reference is a child");
                self.children[parent].insert(idx, child);
            }
            None => self.children[parent].push(child),
        }
    }

    fn child_names(&self, id: usize) -> Vec<&str> {
        self.children[id]
            .iter()
            .map(|&c| self.names[c].as_str())
            .collect()
    }
}

impl TreeSink for MiniSink {
    type Handle = usize;

    fn create_comment(&mut self, text: &str) -> Result<usize, SinkError> {
        Ok(self.add("#comment", Some(text)))
    }

    fn create_doctype(&mut self, _doctype: &DoctypeData) -> Result<usize, SinkError> {
        Ok(self.add("#doctype", None))
    }

    fn create_element(&mut self, element: &ElementData) -> Result<usize, SinkError> {
        Ok(self.add(&element.name, None))
    }

    fn create_text(&mut self, text: &str) -> Result<usize, SinkError> {
        Ok(self.add("#text", Some(text)))
    }

    fn ref_node(&mut self, node: &usize) {
        self.refs[*node] += 1;
    }

    fn unref_node(&mut self, node: &usize) {
        self.refs[*node] -= 1;
        assert!(self.refs[*node] >= 0, "unbalanced unref of node {node}");
    }

    fn append_child(&mut self, parent: &usize, child: &usize) -> Result<(), SinkError> {
        self.attach(*parent, *child, None);
        Ok(())
    }

    fn append_text(&mut self, parent: &usize, text: &str) -> Result<usize, SinkError> {
        if let Some(&last) = self.children[*parent].last() {
            if let Some(existing) = self.texts[last].as_mut() {
                if self.names[last] == "#text" {
                    existing.push_str(text);
                    return Ok(last);
                }
            }
        }
        let id = self.add("#text", Some(text));
        self.refs[id] = 0;
        self.attach(*parent, id, None);
        Ok(id)
    }

    fn insert_before(
        &mut self,
        parent: &usize,
        child: &usize,
        reference: &usize,
    ) -> Result<(), SinkError> {
        self.attach(*parent, *child, Some(*reference));
        Ok(())
    }

    fn insert_text_before(
        &mut self,
        parent: &usize,
        text: &str,
        reference: &usize,
    ) -> Result<usize, SinkError> {
        let idx = self.children[*parent]
            .iter()
            .position(|c| c == reference)
            .expect("reference is a child");
        if idx > 0 {
            let prev = self.children[*parent][idx - 1];
            if self.names[prev] == "#text" {
                self.texts[prev].as_mut().expect("text node").push_str(text);
                return Ok(prev);
            }
        }
        let id = self.add("#text", Some(text));
        self.refs[id] = 0;
        self.attach(*parent, id, Some(*reference));
        Ok(id)
    }

    fn remove_child(&mut self, parent: &usize, child: &usize) -> Result<(), SinkError> {
        self.children[*parent].retain(|c| c != child);
        self.parents[*child] = None;
        Ok(())
    }

    fn clone_node(&mut self, node: &usize, _deep: bool) -> Result<usize, SinkError> {
        let name = self.names[*node].clone();
        Ok(self.add(&name, None))
    }

    fn reparent_children(&mut self, from: &usize, to: &usize) -> Result<(), SinkError> {
        let moved = std::mem::take(&mut self.children[*from]);
        for &child in &moved {
            self.parents[child] = Some(*to);
        }
        self.children[*to].extend(moved);
        Ok(())
    }

    fn get_parent(&mut self, node: &usize, element_only: bool) -> Result<Option<usize>, SinkError> {
        Ok(self.parents[*node].filter(|&p| !element_only || !self.names[p].starts_with('#')))
    }

    fn has_children(&mut self, node: &usize) -> Result<bool, SinkError> {
        Ok(!self.children[*node].is_empty())
    }

    fn form_associate(&mut self, _form: &usize, _node: &usize) -> Result<(), SinkError> {
        Ok(())
    }

    fn add_attributes(&mut self, _node: &usize, _attrs: &[AttributeData]) -> Result<(), SinkError> {
        Ok(())
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks = Some(mode);
    }

    fn change_encoding(&mut self, _name: &'static str) -> Result<(), SinkError> {
        Ok(())
    }
}

struct Fixture {
    builder: TreeBuilder<MiniSink>,
    ctx: DocumentParseContext,
    input: Input,
}

impl Fixture {
    fn new() -> Self {
        Self {
            builder: TreeBuilder::new(TreeBuilderConfig::default(), 0, MiniSink::new()),
            ctx: DocumentParseContext::new(),
            input: Input::new(),
        }
    }

    fn start(&mut self, name: &str) {
        self.start_with(name, &[]);
    }

    fn start_with(&mut self, name: &str, attrs: &[(&str, &str)]) {
        let name = self.ctx.atoms.intern(name).expect("atom");
        let attributes = attrs
            .iter()
            .map(|(n, v)| Attribute {
                name: self.ctx.atoms.intern(n).expect("atom"),
                value: Some(TextValue::Owned((*v).to_string())),
            })
            .collect();
        let token = Token::StartTag {
            name,
            attributes,
            self_closing: false,
        };
        self.push(token);
    }

    fn end(&mut self, name: &str) {
        let name = self.ctx.atoms.intern(name).expect("atom");
        self.push(Token::EndTag { name });
    }

    fn text(&mut self, text: &str) {
        self.push(Token::Text {
            text: TextValue::Owned(text.to_string()),
        });
    }

    fn eof(&mut self) {
        self.push(Token::Eof);
    }

    fn push(&mut self, token: Token) {
        self.builder
            .push_token(&token, &self.input, &mut self.ctx)
            .expect("builder error");
    }

    fn sink(&self) -> &MiniSink {
        self.builder.sink()
    }

    fn find(&self, name: &str) -> usize {
        self.sink()
            .names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("no node named {name}"))
    }
}

#[test]
fn bare_text_synthesizes_document_skeleton() {
    let mut fx = Fixture::new();
    fx.text("hi");
    fx.eof();
    let sink = fx.sink();
    assert_eq!(sink.quirks, Some(QuirksMode::Quirks));
    assert_eq!(sink.child_names(0), vec!["html"]);
    let html = fx.find("html");
    assert_eq!(fx.sink().child_names(html), vec!["head", "body"]);
    let body = fx.find("body");
    assert_eq!(fx.sink().child_names(body), vec!["#text"]);
    for (id, refs) in fx.sink().refs.iter().enumerate() {
        // Creation references were either handed to the stack (and released
        // at EOF) or released after insertion.
        assert_eq!(*refs, 0, "node {id} leaked");
    }
}

#[test]
fn second_p_closes_first() {
    let mut fx = Fixture::new();
    fx.start("p");
    fx.text("x");
    fx.start("p");
    fx.text("y");
    fx.eof();
    let body = fx.find("body");
    assert_eq!(fx.sink().child_names(body), vec!["p", "p"]);
}

#[test]
fn implied_end_tags_close_list_items() {
    let mut fx = Fixture::new();
    fx.start("ul");
    fx.start("li");
    fx.text("one");
    fx.start("li");
    fx.text("two");
    fx.end("ul");
    fx.eof();
    let ul = fx.find("ul");
    assert_eq!(fx.sink().child_names(ul), vec!["li", "li"]);
}

#[test]
fn heading_end_tag_matches_any_open_heading() {
    let mut fx = Fixture::new();
    fx.start("h1");
    fx.text("t");
    fx.end("h3");
    fx.start("div");
    fx.eof();
    let body = fx.find("body");
    assert_eq!(fx.sink().child_names(body), vec!["h1", "div"]);
}

#[test]
fn formatting_reconstruction_after_block() {
    // <div><b>1</div>2: closing the div also pops the open b, but the
    // formatting entry survives and is reconstructed for "2".
    let mut fx = Fixture::new();
    fx.start("div");
    fx.start("b");
    fx.text("1");
    fx.end("div");
    fx.text("2");
    fx.eof();
    let body = fx.find("body");
    assert_eq!(fx.sink().child_names(body), vec!["div", "b"]);
    let div = fx.find("div");
    assert_eq!(fx.sink().child_names(div), vec!["b"]);
    // Both b elements exist: the original inside the div, the clone after.
    let b_count = fx
        .sink()
        .names
        .iter()
        .filter(|name| name.as_str() == "b")
        .count();
    assert_eq!(b_count, 2);
}

#[test]
fn quirks_mode_reported_before_first_element() {
    let mut fx = Fixture::new();
    let name = fx.ctx.atoms.intern("html").expect("atom");
    fx.push(Token::Doctype {
        name: Some(name),
        public_id: None,
        system_id: None,
        force_quirks: false,
    });
    assert_eq!(fx.sink().quirks, Some(QuirksMode::NoQuirks));
    fx.start("div");
    fx.eof();
    assert_eq!(fx.sink().quirks, Some(QuirksMode::NoQuirks));
}

#[test]
fn table_character_data_is_fostered() {
    let mut fx = Fixture::new();
    fx.start("table");
    fx.text("a");
    fx.start("tr");
    fx.start("td");
    fx.text("b");
    fx.eof();
    let body = fx.find("body");
    // "a" lands before the table; tbody is implied around the row.
    assert_eq!(fx.sink().child_names(body), vec!["#text", "table"]);
    let table = fx.find("table");
    assert_eq!(fx.sink().child_names(table), vec!["tbody"]);
    let tbody = fx.find("tbody");
    assert_eq!(fx.sink().child_names(tbody), vec!["tr"]);
    let td = fx.find("td");
    assert_eq!(fx.sink().child_names(td), vec!["#text"]);
}

#[test]
fn select_pops_stray_options() {
    let mut fx = Fixture::new();
    fx.start("select");
    fx.start("option");
    fx.text("one");
    fx.start("option");
    fx.text("two");
    fx.start("optgroup");
    fx.start("option");
    fx.end("select");
    fx.eof();
    let select = fx.find("select");
    assert_eq!(
        fx.sink().child_names(select),
        vec!["option", "option", "optgroup"]
    );
}

#[test]
fn stray_table_end_tags_are_ignored() {
    let mut fx = Fixture::new();
    fx.start("div");
    fx.end("table");
    fx.end("tr");
    fx.text("x");
    fx.eof();
    let div = fx.find("div");
    assert_eq!(fx.sink().child_names(div), vec!["#text"]);
}

#[test]
fn all_references_released_at_eof() {
    let mut fx = Fixture::new();
    fx.start("b");
    fx.start("i");
    fx.start("table");
    fx.start("tr");
    fx.start("td");
    fx.start("form");
    fx.start_with("input", &[("type", "text")]);
    fx.eof();
    for (id, refs) in fx.sink().refs.iter().enumerate() {
        assert_eq!(*refs, 0, "node {id} ({}) leaked", fx.sink().names[id]);
    }
}
