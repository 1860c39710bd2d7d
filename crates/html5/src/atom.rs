//! Atom table for canonicalized tag, attribute, and doctype names.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::Error;

/// Opaque atom identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Document-level atom table.
///
/// Invariant: ASCII letters are stored in canonical lowercase form so that
/// HTML-namespace name matching is a plain id comparison. Non-ASCII code
/// points are preserved as-is.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> Result<AtomId, Error> {
        let idx: u32 = self.atoms.len().try_into().map_err(|_| Error::Nomem)?;
        Ok(AtomId(idx))
    }

    /// Intern a name, applying ASCII-lowercase folding.
    pub fn intern(&mut self, name: &str) -> Result<AtomId, Error> {
        if !name.bytes().any(|b| b.is_ascii_uppercase()) {
            return self.intern_folded(name);
        }
        let folded = name.to_ascii_lowercase();
        self.intern_folded(&folded)
    }

    fn intern_folded(&mut self, name: &str) -> Result<AtomId, Error> {
        if let Some(id) = self.map.get(name) {
            return Ok(*id);
        }
        let atom = Arc::<str>::from(name);
        let id = self.next_id()?;
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        Ok(id)
    }

    pub fn resolve(&self, id: AtomId) -> &str {
        self.atoms
            .get(id.0 as usize)
            .map(|s| s.as_ref())
            .unwrap_or("")
    }

    /// Resolve an atom id to a cloned canonical `Arc<str>`.
    ///
    /// Lets downstream structures (sink element data, formatting-list tag
    /// caches) reuse the interned allocation.
    pub fn resolve_arc(&self, id: AtomId) -> Option<Arc<str>> {
        self.atoms.get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::AtomTable;

    #[test]
    fn intern_folds_ascii_case_to_one_atom() {
        let mut atoms = AtomTable::new();
        let a = atoms.intern("DIV").expect("atom");
        let b = atoms.intern("div").expect("atom");
        let c = atoms.intern("dIv").expect("atom");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(atoms.resolve(a), "div");
    }

    #[test]
    fn intern_preserves_non_ascii() {
        let mut atoms = AtomTable::new();
        let id = atoms.intern("äöü").expect("atom");
        assert_eq!(atoms.resolve(id), "äöü");
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let mut atoms = AtomTable::new();
        let a = atoms.intern("p").expect("atom");
        let b = atoms.intern("q").expect("atom");
        assert_ne!(a, b);
    }
}
