//! Controlled vocabulary lookups.
//!
//! The resolver itself is an external collaborator; only its lookup contract
//! lives here, together with an in-memory resolver and [`resolve_term`], which
//! turns any lookup outcome into a [`VocabTerm`].

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::path::OtherHasher;

pub const UNKNOWN_TERM: &str = "Unknown term";

/// A concept of a controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub pref_label: String,
    pub definition: String,
}

impl Concept {
    pub fn new(pref_label: impl Into<String>, definition: impl Into<String>) -> Self {
        Self { pref_label: pref_label.into(), definition: definition.into() }
    }
}

/// Answers term lookups within a collection.
///
/// `Ok(None)` is the normal "not found" answer. An `Err` means the resolver
/// itself failed, e.g. a remote vocabulary service could not be reached.
pub trait VocabularyResolver {
    fn lookup(&self, term: &str, collection: &str) -> Result<Option<Concept>>;
}

/// A resolved (or placeholder) vocabulary term as it appears in metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VocabTerm {
    pub short: String,
    pub long: String,
    pub defn: String,
}

impl VocabTerm {
    /// The placeholder for a code that has no concept.
    pub fn unknown(code: &str) -> Self {
        Self { short: code.to_string(), long: code.to_string(), defn: UNKNOWN_TERM.to_string() }
    }
    pub fn is_unknown(&self) -> bool {
        self.defn == UNKNOWN_TERM
    }
}

impl From<Concept> for VocabTerm {
    fn from(concept: Concept) -> Self {
        Self { short: concept.pref_label.clone(), long: concept.pref_label, defn: concept.definition }
    }
}

/// Looks up `code` and never fails: a missing concept or a resolver failure
/// both yield the "Unknown term" placeholder.
pub fn resolve_term(resolver: &dyn VocabularyResolver, collection: &str, code: &str) -> VocabTerm {
    match resolver.lookup(code, collection) {
        Ok(Some(concept)) => concept.into(),
        Ok(None) => {
            debug!(code, collection, "no concept for term");
            VocabTerm::unknown(code)
        }
        Err(e) => {
            warn!(code, collection, error = %e, "vocabulary lookup failed");
            VocabTerm::unknown(code)
        }
    }
}

/// A vocabulary held in memory, keyed by collection and case-folded label.
#[derive(Debug, Default, Clone)]
pub struct StaticVocabulary {
    concepts: HashMap<(String, String), Concept, OtherHasher>,
}

impl StaticVocabulary {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, collection: &str, concept: Concept) {
        let key = (collection.to_string(), concept.pref_label.to_lowercase());
        self.concepts.insert(key, concept);
    }
    pub fn with(mut self, collection: &str, pref_label: &str, definition: &str) -> Self {
        self.insert(collection, Concept::new(pref_label, definition));
        self
    }
    pub fn len(&self) -> usize {
        self.concepts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

impl VocabularyResolver for StaticVocabulary {
    fn lookup(&self, term: &str, collection: &str) -> Result<Option<Concept>> {
        let key = (collection.to_string(), term.trim().to_lowercase());
        Ok(self.concepts.get(&key).cloned())
    }
}
