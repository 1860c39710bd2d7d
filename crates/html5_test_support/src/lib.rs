//! Reference tree sink and snapshot helpers for the engine test suites.
//!
//! The arena sink implements the full sink contract over an index-based node
//! arena, audits the engine's reference discipline (every acquire must be
//! released by the end of the parse), and records a call log so tests can
//! assert sink-call order, not just final tree shape.

use html5::{
    AttrNs, AttributeData, DoctypeData, ElementData, Ns, QuirksMode, SinkError, TreeSink,
};

pub mod snapshot;

/// Opaque node handle: an index into the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        ns: Ns,
        name: String,
        attributes: Vec<(Option<&'static str>, String, String)>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Engine-held references (the tree's own hold is not counted).
    pub refs: i64,
}

/// Arena-backed reference sink.
#[derive(Debug, Default)]
pub struct ArenaSink {
    pub nodes: Vec<Node>,
    pub quirks: Option<QuirksMode>,
    pub encoding_changes: Vec<&'static str>,
    pub form_associations: Vec<(usize, usize)>,
    /// Human-readable call log, in call order.
    pub log: Vec<String>,
    /// When set, the nth node creation fails with this code.
    pub fail_on_create: Option<(usize, u32)>,
    created: usize,
}

impl ArenaSink {
    /// A fresh sink whose node 0 is the document.
    pub fn new() -> Self {
        let mut sink = Self::default();
        sink.nodes.push(Node {
            data: NodeData::Document,
            parent: None,
            children: Vec::new(),
            refs: 0,
        });
        sink
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    fn label(&self, id: usize) -> String {
        match &self.nodes[id].data {
            NodeData::Document => "#document".to_string(),
            NodeData::Element { name, .. } => name.clone(),
            NodeData::Text(_) => "#text".to_string(),
            NodeData::Comment(_) => "#comment".to_string(),
            NodeData::Doctype { .. } => "#doctype".to_string(),
        }
    }

    fn new_node(&mut self, data: NodeData) -> Result<NodeId, SinkError> {
        if let Some((at, code)) = self.fail_on_create {
            if self.created == at {
                return Err(SinkError(code));
            }
        }
        self.created += 1;
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
            refs: 1,
        });
        Ok(NodeId(self.nodes.len() - 1))
    }

    fn detach(&mut self, child: usize) {
        if let Some(parent) = self.nodes[child].parent.take() {
            self.nodes[parent].children.retain(|&c| c != child);
        }
    }

    fn attach(&mut self, parent: usize, child: usize, before: Option<usize>) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        match before {
            Some(reference) => {
                let idx = self.nodes[parent]
                    .children
                    .iter()
                    .position(|&c| c == reference)
                    .expect("insertion reference must be a child of parent");
                self.nodes[parent].children.insert(idx, child);
            }
            None => self.nodes[parent].children.push(child),
        }
    }

    /// Every engine acquire must have been released.
    pub fn assert_refs_balanced(&self) {
        for (id, node) in self.nodes.iter().enumerate() {
            assert_eq!(
                node.refs, 0,
                "node {id} ({}) still holds {} engine reference(s)",
                self.label(id),
                node.refs
            );
        }
    }

    /// Child node ids of a parent.
    pub fn children_of(&self, id: NodeId) -> &[usize] {
        &self.nodes[id.0].children
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;

    fn create_comment(&mut self, text: &str) -> Result<NodeId, SinkError> {
        self.log.push(format!("create_comment({text})"));
        self.new_node(NodeData::Comment(text.to_string()))
    }

    fn create_doctype(&mut self, doctype: &DoctypeData) -> Result<NodeId, SinkError> {
        self.log.push(format!(
            "create_doctype({})",
            doctype.name.as_deref().unwrap_or("")
        ));
        self.new_node(NodeData::Doctype {
            name: doctype.name.clone(),
            public_id: doctype.public_id.clone(),
            system_id: doctype.system_id.clone(),
        })
    }

    fn create_element(&mut self, element: &ElementData) -> Result<NodeId, SinkError> {
        self.log.push(format!("create_element({})", element.name));
        let attributes = element
            .attributes
            .iter()
            .map(|attr| (attr.ns.uri(), attr.name.to_string(), attr.value.clone()))
            .collect();
        self.new_node(NodeData::Element {
            ns: element.ns,
            name: element.name.to_string(),
            attributes,
        })
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId, SinkError> {
        self.log.push(format!("create_text({text})"));
        self.new_node(NodeData::Text(text.to_string()))
    }

    fn ref_node(&mut self, node: &NodeId) {
        self.nodes[node.0].refs += 1;
    }

    fn unref_node(&mut self, node: &NodeId) {
        self.nodes[node.0].refs -= 1;
        assert!(
            self.nodes[node.0].refs >= 0,
            "unbalanced unref on node {} ({})",
            node.0,
            self.label(node.0)
        );
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), SinkError> {
        self.log
            .push(format!("append({}, {})", self.label(parent.0), self.label(child.0)));
        self.attach(parent.0, child.0, None);
        Ok(())
    }

    fn append_text(&mut self, parent: &NodeId, text: &str) -> Result<NodeId, SinkError> {
        self.log
            .push(format!("append_text({}, {text})", self.label(parent.0)));
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last].data {
                existing.push_str(text);
                return Ok(NodeId(last));
            }
        }
        // Fresh text node; the tree holds it, the engine does not.
        self.created += 1;
        self.nodes.push(Node {
            data: NodeData::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
            refs: 0,
        });
        let id = self.nodes.len() - 1;
        self.attach(parent.0, id, None);
        Ok(NodeId(id))
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: &NodeId,
    ) -> Result<(), SinkError> {
        self.log.push(format!(
            "insert_before({}, {}, {})",
            self.label(parent.0),
            self.label(child.0),
            self.label(reference.0)
        ));
        self.attach(parent.0, child.0, Some(reference.0));
        Ok(())
    }

    fn insert_text_before(
        &mut self,
        parent: &NodeId,
        text: &str,
        reference: &NodeId,
    ) -> Result<NodeId, SinkError> {
        self.log.push(format!(
            "insert_text_before({}, {text})",
            self.label(parent.0)
        ));
        let ref_idx = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference.0)
            .expect("insertion reference must be a child of parent");
        if ref_idx > 0 {
            let prev = self.nodes[parent.0].children[ref_idx - 1];
            if let NodeData::Text(existing) = &mut self.nodes[prev].data {
                existing.push_str(text);
                return Ok(NodeId(prev));
            }
        }
        self.created += 1;
        self.nodes.push(Node {
            data: NodeData::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
            refs: 0,
        });
        let id = self.nodes.len() - 1;
        self.attach(parent.0, id, Some(reference.0));
        Ok(NodeId(id))
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), SinkError> {
        self.log.push(format!(
            "remove_child({}, {})",
            self.label(parent.0),
            self.label(child.0)
        ));
        debug_assert_eq!(self.nodes[child.0].parent, Some(parent.0));
        self.detach(child.0);
        Ok(())
    }

    fn clone_node(&mut self, node: &NodeId, deep: bool) -> Result<NodeId, SinkError> {
        self.log.push(format!("clone_node({})", self.label(node.0)));
        assert!(!deep, "the engine only requests shallow clones");
        let data = self.nodes[node.0].data.clone();
        self.new_node(data)
    }

    fn reparent_children(&mut self, from: &NodeId, to: &NodeId) -> Result<(), SinkError> {
        self.log.push(format!(
            "reparent_children({}, {})",
            self.label(from.0),
            self.label(to.0)
        ));
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in &children {
            self.nodes[*child].parent = Some(to.0);
        }
        self.nodes[to.0].children.extend(children);
        Ok(())
    }

    fn get_parent(
        &mut self,
        node: &NodeId,
        element_only: bool,
    ) -> Result<Option<NodeId>, SinkError> {
        let parent = self.nodes[node.0].parent;
        Ok(parent.filter(|&p| {
            !element_only || matches!(self.nodes[p].data, NodeData::Element { .. })
        }).map(NodeId))
    }

    fn has_children(&mut self, node: &NodeId) -> Result<bool, SinkError> {
        Ok(!self.nodes[node.0].children.is_empty())
    }

    fn form_associate(&mut self, form: &NodeId, node: &NodeId) -> Result<(), SinkError> {
        self.form_associations.push((form.0, node.0));
        Ok(())
    }

    fn add_attributes(
        &mut self,
        node: &NodeId,
        attrs: &[AttributeData],
    ) -> Result<(), SinkError> {
        self.log
            .push(format!("add_attributes({})", self.label(node.0)));
        if let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data {
            for attr in attrs {
                let exists = attributes
                    .iter()
                    .any(|(ns, name, _)| *ns == attr.ns.uri() && *name == *attr.name);
                if !exists {
                    attributes.push((attr.ns.uri(), attr.name.to_string(), attr.value.clone()));
                }
            }
        }
        Ok(())
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.log.push(format!("set_quirks({mode:?})"));
        self.quirks = Some(mode);
    }

    fn change_encoding(&mut self, name: &'static str) -> Result<(), SinkError> {
        self.log.push(format!("change_encoding({name})"));
        self.encoding_changes.push(name);
        // Construction restarts from the top: drop the old tree.
        let document = Node {
            data: NodeData::Document,
            parent: None,
            children: Vec::new(),
            refs: 0,
        };
        self.nodes = vec![document];
        self.created = 0;
        Ok(())
    }
}

/// `AttrNs` lookup helper for sink-side assertions.
pub fn attr_ns_uri(ns: AttrNs) -> Option<&'static str> {
    ns.uri()
}
