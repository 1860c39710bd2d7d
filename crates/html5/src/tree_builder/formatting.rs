//! List of active formatting elements.
//!
//! Entries cache the tag that created the element so reconstruction and the
//! Noah's Ark clause can work without consulting the sink. Sink references
//! are held for element entries and released by the builder when entries are
//! removed or replaced.

use std::sync::Arc;

use crate::atom::AtomId;
use crate::elements::{ElementType, Ns};
use crate::sink::AttributeData;

/// The tag that created a formatting element, kept for re-creation checks.
#[derive(Clone, Debug)]
pub(crate) struct CachedTag {
    pub(crate) name: Arc<str>,
    pub(crate) attributes: Vec<AttributeData>,
}

#[derive(Clone, Debug)]
pub(crate) enum Entry<H> {
    /// Inserted when entering `applet`/`object`/`marquee`/`td`/`th`/`caption`.
    Marker,
    Element {
        handle: H,
        name: AtomId,
        kind: ElementType,
        ns: Ns,
        tag: CachedTag,
    },
}

impl<H> Entry<H> {
    pub(crate) fn handle(&self) -> Option<&H> {
        match self {
            Entry::Marker => None,
            Entry::Element { handle, .. } => Some(handle),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ActiveFormatting<H> {
    items: Vec<Entry<H>>,
    max_depth: u32,
}

impl<H: Clone + PartialEq> ActiveFormatting<H> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            max_depth: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Entry<H>> {
        self.items.get(index)
    }

    pub(crate) fn push_marker(&mut self) {
        self.items.push(Entry::Marker);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    /// Push an element entry. Returns the entries evicted by the Noah's Ark
    /// clause (at most one) so the caller can release their references.
    pub(crate) fn push_element(&mut self, entry: Entry<H>) -> Option<Entry<H>> {
        let evicted = self.apply_noahs_ark(&entry);
        self.items.push(entry);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
        evicted
    }

    /// Noah's Ark: at most three entries with the same name, namespace, and
    /// attribute set between the end of the list and the last marker. The
    /// earliest duplicate is evicted.
    fn apply_noahs_ark(&mut self, incoming: &Entry<H>) -> Option<Entry<H>> {
        let Entry::Element {
            name: new_name,
            ns: new_ns,
            tag: new_tag,
            ..
        } = incoming
        else {
            return None;
        };
        let mut matches: Vec<usize> = Vec::new();
        for index in (0..self.items.len()).rev() {
            match &self.items[index] {
                Entry::Marker => break,
                Entry::Element { name, ns, tag, .. } => {
                    if name == new_name
                        && ns == new_ns
                        && same_attribute_set(&tag.attributes, &new_tag.attributes)
                    {
                        matches.push(index);
                    }
                }
            }
        }
        if matches.len() >= 3 {
            // `matches` is in top-down order; the last element is earliest.
            let earliest = *matches.last().expect("non-empty by length check");
            return Some(self.items.remove(earliest));
        }
        None
    }

    pub(crate) fn remove(&mut self, index: usize) -> Entry<H> {
        self.items.remove(index)
    }

    pub(crate) fn insert(&mut self, index: usize, entry: Entry<H>) {
        self.items.insert(index, entry);
        self.max_depth = self.max_depth.max(self.items.len() as u32);
    }

    pub(crate) fn replace(&mut self, index: usize, entry: Entry<H>) -> Entry<H> {
        std::mem::replace(&mut self.items[index], entry)
    }

    /// Index of the last element entry with this handle.
    pub(crate) fn index_of_handle(&self, handle: &H) -> Option<usize> {
        self.items
            .iter()
            .rposition(|entry| entry.handle() == Some(handle))
    }

    /// Last element entry matching `kind` between the end of the list and the
    /// last marker.
    pub(crate) fn find_last_before_marker(&self, kind: ElementType) -> Option<usize> {
        for index in (0..self.items.len()).rev() {
            match &self.items[index] {
                Entry::Marker => return None,
                Entry::Element { kind: k, ns, .. } if *k == kind && *ns == Ns::Html => {
                    return Some(index)
                }
                Entry::Element { .. } => {}
            }
        }
        None
    }

    /// Remove entries up to and including the last marker, returning the
    /// element entries for reference release.
    pub(crate) fn clear_to_last_marker(&mut self) -> Vec<Entry<H>> {
        let mut removed = Vec::new();
        while let Some(entry) = self.items.pop() {
            match entry {
                Entry::Marker => break,
                element => removed.push(element),
            }
        }
        removed
    }

    /// Drain everything (used at parse teardown).
    pub(crate) fn drain_all(&mut self) -> Vec<Entry<H>> {
        std::mem::take(&mut self.items)
    }

    pub(crate) fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

fn same_attribute_set(a: &[AttributeData], b: &[AttributeData]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|attr| {
        b.iter()
            .any(|other| attr.ns == other.ns && attr.name == other.name && attr.value == other.value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(handle: u32, name: u32) -> Entry<u32> {
        Entry::Element {
            handle,
            name: AtomId(name),
            kind: ElementType::B,
            ns: Ns::Html,
            tag: CachedTag {
                name: Arc::from("b"),
                attributes: Vec::new(),
            },
        }
    }

    #[test]
    fn noahs_ark_caps_identical_entries_at_three() {
        let mut list = ActiveFormatting::new();
        assert!(list.push_element(entry(1, 7)).is_none());
        assert!(list.push_element(entry(2, 7)).is_none());
        assert!(list.push_element(entry(3, 7)).is_none());
        let evicted = list.push_element(entry(4, 7)).expect("eviction");
        assert_eq!(evicted.handle(), Some(&1));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn marker_resets_noahs_ark_window() {
        let mut list = ActiveFormatting::new();
        list.push_element(entry(1, 7));
        list.push_element(entry(2, 7));
        list.push_element(entry(3, 7));
        list.push_marker();
        assert!(list.push_element(entry(4, 7)).is_none());
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn clear_to_last_marker_returns_elements() {
        let mut list = ActiveFormatting::new();
        list.push_element(entry(1, 7));
        list.push_marker();
        list.push_element(entry(2, 7));
        list.push_element(entry(3, 8));
        let removed = list.clear_to_last_marker();
        assert_eq!(removed.len(), 2);
        assert_eq!(list.len(), 1);
        assert!(list.find_last_before_marker(ElementType::B).is_none());
    }

    #[test]
    fn differing_attributes_defeat_noahs_ark() {
        let mut list = ActiveFormatting::new();
        list.push_element(entry(1, 7));
        list.push_element(entry(2, 7));
        list.push_element(entry(3, 7));
        let mut different = entry(4, 7);
        if let Entry::Element { tag, .. } = &mut different {
            tag.attributes.push(AttributeData {
                ns: crate::sink::AttrNs::None,
                name: Arc::from("href"),
                value: "x".to_string(),
            });
        }
        assert!(list.push_element(different).is_none());
        assert_eq!(list.len(), 4);
    }
}
