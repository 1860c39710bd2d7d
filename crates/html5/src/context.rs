//! Document-level parse context (shared resources).

use crate::atom::{AtomId, AtomTable};
use crate::elements::{element_type, ElementType};
use crate::errors::{ErrorOrigin, ErrorPolicy, ParseError, ParseErrorCode};

/// Cheap monotonic counters for instrumentation.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    pub tokens_processed: u64,
    pub parse_errors: u64,
    pub decode_errors: u64,
    pub sink_calls: u64,
    pub encoding_restarts: u64,
    pub max_open_elements_depth: u32,
    pub max_active_formatting_depth: u32,
}

/// Document-level parse context shared by the input stream, tokenizer, and
/// tree builder.
///
/// Owns document-lifetime resources: the atom table, the element-kind cache,
/// error storage, and metrics. One context per parse epoch; an encoding
/// restart replaces it wholesale.
#[derive(Debug, Default)]
pub struct DocumentParseContext {
    pub atoms: AtomTable,
    pub counters: Counters,
    pub error_policy: ErrorPolicy,
    errors: Vec<ParseError>,
    /// Element kind per atom id, filled lazily. Indexed by `AtomId`.
    kinds: Vec<Option<ElementType>>,
}

impl DocumentParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_policy(error_policy: ErrorPolicy) -> Self {
        Self {
            error_policy,
            ..Self::default()
        }
    }

    /// Classify an interned name, caching the result per atom.
    pub fn element_kind(&mut self, id: AtomId) -> ElementType {
        let idx = id.0 as usize;
        if idx >= self.kinds.len() {
            self.kinds.resize(self.atoms.len().max(idx + 1), None);
        }
        if let Some(kind) = self.kinds[idx] {
            return kind;
        }
        let kind = element_type(self.atoms.resolve(id));
        self.kinds[idx] = Some(kind);
        kind
    }

    /// Record a parse error subject to the error policy.
    pub fn report(&mut self, origin: ErrorOrigin, code: ParseErrorCode, position: usize) {
        if self.error_policy.track_counters {
            self.counters.parse_errors = self.counters.parse_errors.saturating_add(1);
        }
        if self.error_policy.track && self.errors.len() < self.error_policy.max_stored {
            self.errors.push(ParseError {
                origin,
                code,
                position,
            });
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html5",
            "parse error {code:?} from {origin:?} at byte {position}"
        );
    }

    /// Drain stored errors (for handler delivery).
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kind_is_cached_per_atom() {
        let mut ctx = DocumentParseContext::new();
        let id = ctx.atoms.intern("TABLE").expect("atom");
        assert_eq!(ctx.element_kind(id), ElementType::Table);
        assert_eq!(ctx.element_kind(id), ElementType::Table);
        let unknown = ctx.atoms.intern("blink").expect("atom");
        assert_eq!(ctx.element_kind(unknown), ElementType::Unknown);
    }

    #[test]
    fn error_storage_respects_policy_bound() {
        let mut ctx = DocumentParseContext::with_error_policy(ErrorPolicy {
            max_stored: 2,
            ..ErrorPolicy::default()
        });
        for i in 0..5 {
            ctx.report(
                ErrorOrigin::Tokenizer,
                ParseErrorCode::UnexpectedCharacter,
                i,
            );
        }
        assert_eq!(ctx.errors().len(), 2);
        assert_eq!(ctx.counters.parse_errors, 5);
    }
}
