//! The tree sink contract: the interface the engine drives with ordered
//! node-construction calls.
//!
//! The engine owns no DOM. Nodes are opaque handles minted by the sink; the
//! engine holds acquires on the handles it keeps (stack of open elements,
//! active formatting list) and releases them when it lets go. Everything the
//! engine passes across this boundary is copied out of its internal buffers
//! first, so handles and payloads never alias parser state.
//!
//! Every fallible operation returns a [`SinkError`] status; any failure is
//! fatal to the parse (the engine releases its references and latches into a
//! failed state).

use std::sync::Arc;

use crate::elements::Ns;
use crate::errors::SinkError;

/// Quirks mode determined from the DOCTYPE, reported once before the first
/// element is inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    #[default]
    NoQuirks,
}

/// Namespace of an adjusted foreign attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttrNs {
    #[default]
    None,
    XLink,
    Xml,
    XmlNs,
}

impl AttrNs {
    pub fn uri(self) -> Option<&'static str> {
        match self {
            AttrNs::None => None,
            AttrNs::XLink => Some("http://www.w3.org/1999/xlink"),
            AttrNs::Xml => Some("http://www.w3.org/XML/1998/namespace"),
            AttrNs::XmlNs => Some("http://www.w3.org/2000/xmlns/"),
        }
    }
}

/// An attribute as handed to the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeData {
    pub ns: AttrNs,
    pub name: Arc<str>,
    pub value: String,
}

/// Element creation payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub ns: Ns,
    pub name: Arc<str>,
    pub attributes: Vec<AttributeData>,
    pub self_closing: bool,
}

/// DOCTYPE creation payload. `None` fields were missing in the source (as
/// distinct from present-but-empty).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctypeData {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub force_quirks: bool,
}

/// Client-supplied tree sink.
///
/// Handles are opaque to the engine: cheap to clone, comparable so the engine
/// can locate them again, and reference-counted by the sink. The engine calls
/// `ref_node`/`unref_node` in balanced pairs around every handle it retains.
pub trait TreeSink {
    type Handle: Clone + PartialEq + Eq + std::fmt::Debug;

    fn create_comment(&mut self, text: &str) -> Result<Self::Handle, SinkError>;
    fn create_doctype(&mut self, doctype: &DoctypeData) -> Result<Self::Handle, SinkError>;
    fn create_element(&mut self, element: &ElementData) -> Result<Self::Handle, SinkError>;
    fn create_text(&mut self, text: &str) -> Result<Self::Handle, SinkError>;

    fn ref_node(&mut self, node: &Self::Handle);
    fn unref_node(&mut self, node: &Self::Handle);

    fn append_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<(), SinkError>;

    /// Append text under `parent`, merging into a trailing text node if one
    /// exists. Returns the node the text landed in (merged or fresh).
    fn append_text(&mut self, parent: &Self::Handle, text: &str)
        -> Result<Self::Handle, SinkError>;

    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        reference: &Self::Handle,
    ) -> Result<(), SinkError>;

    /// Insert text before `reference`, merging into the preceding sibling
    /// text node if one exists. Returns the node the text landed in.
    fn insert_text_before(
        &mut self,
        parent: &Self::Handle,
        text: &str,
        reference: &Self::Handle,
    ) -> Result<Self::Handle, SinkError>;

    fn remove_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<(), SinkError>;

    /// Shallow or deep copy of a node; returns the copy with one reference
    /// owned by the caller.
    fn clone_node(&mut self, node: &Self::Handle, deep: bool)
        -> Result<Self::Handle, SinkError>;

    /// Move every child of `from` to the end of `to`'s child list.
    fn reparent_children(
        &mut self,
        from: &Self::Handle,
        to: &Self::Handle,
    ) -> Result<(), SinkError>;

    /// Parent of `node`, or `None` at a root. With `element_only`, a
    /// non-element parent reports as `None`.
    fn get_parent(
        &mut self,
        node: &Self::Handle,
        element_only: bool,
    ) -> Result<Option<Self::Handle>, SinkError>;

    fn has_children(&mut self, node: &Self::Handle) -> Result<bool, SinkError>;

    /// Associate a form-owned control with its form element.
    fn form_associate(
        &mut self,
        form: &Self::Handle,
        node: &Self::Handle,
    ) -> Result<(), SinkError>;

    /// Add attributes the node does not already have (existing names win).
    fn add_attributes(
        &mut self,
        node: &Self::Handle,
        attrs: &[AttributeData],
    ) -> Result<(), SinkError>;

    fn set_quirks_mode(&mut self, mode: QuirksMode);

    /// The document's encoding changed (meta-driven restart); the sink should
    /// discard anything built so far, because construction restarts from the
    /// top of the document.
    fn change_encoding(&mut self, name: &'static str) -> Result<(), SinkError>;
}
