//! # Core Type Definitions
//!
//! This module contains the value types shared by every component of the store:
//! - Terms (`Uri`, `BlankNode`, `Literal`, `Term`) and the `Context` slot
//! - Internal identifiers (`NodeId`, `StatementId`) and quad positions (`Position`)
//! - Owned and borrowed quads (`Quad`, `QuadRef`)
//! - Error types (`StoreError`)
//!
//! ## Identity Rules
//!
//! - `Uri` and `Literal` compare by value.
//! - `BlankNode` compares by allocation identity only. Two blank nodes built
//!   with the same label are still distinct.
//! - `Quad` equality ignores the `inferred` flag.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use thiserror::Error;

// =============================================================================
// INTERNAL IDENTIFIERS
// =============================================================================

/// Identifier of a canonical node in a store's value identity table.
///
/// Only meaningful for the store that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Slot of this node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a statement inside a store.
///
/// Ids are handed out in increasing order, so ordering by id is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementId(pub u64);

/// One of the four slots of a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Subject,
    Predicate,
    Object,
    Context,
}

impl Position {
    /// All positions in quad order.
    pub const ALL: [Self; 4] = [Self::Subject, Self::Predicate, Self::Object, Self::Context];

    /// Slot of this position in per-node index arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Subject => 0,
            Self::Predicate => 1,
            Self::Object => 2,
            Self::Context => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Context => "context",
        })
    }
}

// =============================================================================
// TERMS
// =============================================================================

/// An already-parsed URI reference, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uri(String);

impl Uri {
    /// Create a URI from its string form. No syntax checks are made here.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

static NEXT_BLANK_NODE: AtomicU64 = AtomicU64::new(0);

/// A blank node. Equal only to itself (and its clones).
///
/// The optional label is carried for display and never takes part in
/// equality, ordering or hashing.
#[derive(Debug, Clone)]
pub struct BlankNode {
    id: u64,
    label: Option<Arc<str>>,
}

impl BlankNode {
    /// Allocate a fresh blank node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_BLANK_NODE.fetch_add(1, AtomicOrdering::Relaxed),
            label: None,
        }
    }

    /// Allocate a fresh blank node carrying a local label.
    #[must_use]
    pub fn labelled(label: &str) -> Self {
        Self {
            label: Some(Arc::from(label)),
            ..Self::new()
        }
    }

    /// Process-wide allocation number of this blank node.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The local label, if one was given.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BlankNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BlankNode {}

impl PartialOrd for BlankNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlankNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for BlankNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "_:{label}"),
            None => write!(f, "_:b{}", self.id),
        }
    }
}

/// A literal: a label with an optional datatype and an optional language tag.
///
/// Two literals are equal iff label, datatype and language all match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    label: String,
    datatype: Option<Uri>,
    language: Option<String>,
}

impl Literal {
    /// Create a literal from all three parts.
    #[must_use]
    pub fn new(label: impl Into<String>, datatype: Option<Uri>, language: Option<String>) -> Self {
        Self {
            label: label.into(),
            datatype,
            language,
        }
    }

    /// A literal with neither datatype nor language.
    #[must_use]
    pub fn plain(label: impl Into<String>) -> Self {
        Self::new(label, None, None)
    }

    /// A typed literal.
    #[must_use]
    pub fn typed(label: impl Into<String>, datatype: Uri) -> Self {
        Self::new(label, Some(datatype), None)
    }

    /// A language-tagged literal.
    #[must_use]
    pub fn lang_string(label: impl Into<String>, language: impl Into<String>) -> Self {
        Self::new(label, None, Some(language.into()))
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&Uri> {
        self.datatype.as_ref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.label.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                c => write!(f, "{c}")?,
            }
        }
        f.write_str("\"")?;
        if let Some(language) = &self.language {
            write!(f, "@{language}")?;
        }
        if let Some(datatype) = &self.datatype {
            write!(f, "^^{datatype}")?;
        }
        Ok(())
    }
}

/// An RDF value: URI, blank node or literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Uri(Uri),
    Blank(BlankNode),
    Literal(Literal),
}

impl Term {
    /// Shorthand for `Term::Uri(Uri::new(s))`.
    #[must_use]
    pub fn uri(s: impl Into<String>) -> Self {
        Self::Uri(Uri::new(s))
    }

    /// Allocate a fresh blank node term.
    #[must_use]
    pub fn blank() -> Self {
        Self::Blank(BlankNode::new())
    }

    /// Shorthand for a plain literal term.
    #[must_use]
    pub fn literal(label: impl Into<String>) -> Self {
        Self::Literal(Literal::plain(label))
    }

    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    #[must_use]
    pub const fn as_blank(&self) -> Option<&BlankNode> {
        match self {
            Self::Blank(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Uri> for Term {
    fn from(uri: Uri) -> Self {
        Self::Uri(uri)
    }
}

impl From<BlankNode> for Term {
    fn from(blank: BlankNode) -> Self {
        Self::Blank(blank)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(u) => u.fmt(f),
            Self::Blank(b) => b.fmt(f),
            Self::Literal(l) => l.fmt(f),
        }
    }
}

/// The fourth quad slot. `None` is the "no context" sentinel.
pub type Context = Option<Term>;

/// Render a context for messages and logs.
pub(crate) fn display_context(context: Option<&Term>) -> String {
    context.map_or_else(|| "(no context)".to_string(), Term::to_string)
}

// =============================================================================
// QUADS
// =============================================================================

/// An owned quad.
///
/// `inferred` is informational: it is ignored by equality, ordering and hashing.
#[derive(Debug, Clone)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub context: Context,
    pub inferred: bool,
}

impl Quad {
    /// Create an asserted quad with no context.
    #[must_use]
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: None,
            inferred: false,
        }
    }

    /// Place this quad in the given context.
    #[must_use]
    pub fn in_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Compare subject, predicate and object only.
    #[must_use]
    pub fn eq_ignore_context(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
    }

    /// True if subject or object is a blank node.
    #[must_use]
    pub const fn has_blank_node(&self) -> bool {
        self.subject.is_blank() || self.object.is_blank()
    }

    fn key(&self) -> (&Term, &Term, &Term, Option<&Term>) {
        (
            &self.subject,
            &self.predicate,
            &self.object,
            self.context.as_ref(),
        )
    }
}

impl PartialEq for Quad {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Quad {}

impl PartialOrd for Quad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quad {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Quad {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(context) = &self.context {
            write!(f, " {context}")?;
        }
        f.write_str(" .")
    }
}

/// A quad borrowed from a store.
#[derive(Debug, Clone, Copy)]
pub struct QuadRef<'a> {
    pub subject: &'a Term,
    pub predicate: &'a Term,
    pub object: &'a Term,
    pub context: Option<&'a Term>,
    pub inferred: bool,
}

impl QuadRef<'_> {
    /// Clone the terms into an owned quad.
    #[must_use]
    pub fn to_quad(&self) -> Quad {
        Quad {
            subject: self.subject.clone(),
            predicate: self.predicate.clone(),
            object: self.object.clone(),
            context: self.context.cloned(),
            inferred: self.inferred,
        }
    }
}

impl PartialEq for QuadRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
            && self.context == other.context
    }
}

impl Eq for QuadRef<'_> {}

impl From<QuadRef<'_>> for Quad {
    fn from(quad: QuadRef<'_>) -> Self {
        quad.to_quad()
    }
}

impl From<&Quad> for Quad {
    fn from(quad: &Quad) -> Self {
        quad.clone()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the store.
///
/// - Store operations that cannot fail return plain values
/// - View writes and single-value accessors return `Result<T, StoreError>`
/// - Graph equality reports "no match" as `Ok(false)`, never as an error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A component given to a view write contradicts the view's pattern.
    #[error("Incompatible statement: {position} {found} is outside the view pattern")]
    IncompatibleStatement { position: Position, found: String },

    /// A write lacks a component and the view does not fix it either.
    #[error("Incomplete statement: no {0} given and none fixed by the view")]
    IncompleteStatement(Position),

    /// A single-value accessor found more than one distinct value.
    #[error("Ambiguous single value: more than one distinct {0} matches")]
    AmbiguousSingleValue(Position),

    /// The index structures disagree with the master statement set.
    #[error("Index invariant violated: {0}")]
    InvariantViolation(String),

    /// Graph equality refused to search past the configured blank node ceiling.
    #[error("Blank node limit exceeded: {found} distinct blank nodes, limit is {limit}")]
    BlankNodeLimitExceeded { limit: usize, found: usize },

    /// A configuration value could not be parsed.
    #[error("Invalid option {name}: {value:?}")]
    InvalidOption { name: &'static str, value: String },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn blank_nodes_with_same_label_are_distinct() {
        let a = BlankNode::labelled("x");
        let b = BlankNode::labelled("x");

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.label(), Some("x"));
    }

    #[test]
    fn literal_equality_requires_all_parts() {
        let plain = Literal::plain("chat");
        let french = Literal::lang_string("chat", "fr");
        let typed = Literal::typed("chat", Uri::new("http://www.w3.org/2001/XMLSchema#string"));

        assert_ne!(plain, french);
        assert_ne!(plain, typed);
        assert_ne!(french, typed);
        assert_eq!(french, Literal::lang_string("chat", "fr"));
    }

    #[test]
    fn quad_equality_ignores_inferred_flag() {
        let asserted = Quad::new(Term::uri("a"), Term::uri("p"), Term::uri("b"));
        let mut inferred = asserted.clone();
        inferred.inferred = true;

        assert_eq!(asserted, inferred);

        let set: BTreeSet<_> = [asserted, inferred].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn eq_ignore_context_compares_three_slots() {
        let base = Quad::new(Term::uri("a"), Term::uri("p"), Term::uri("b"));
        let named = base.clone().in_context(Some(Term::uri("g")));

        assert_ne!(base, named);
        assert!(base.eq_ignore_context(&named));
    }

    #[test]
    fn display_renders_terms() {
        let quad = Quad::new(
            Term::uri("http://ex/a"),
            Term::uri("http://ex/p"),
            Term::Literal(Literal::lang_string("say \"hi\"", "en")),
        )
        .in_context(Some(Term::uri("http://ex/g")));

        assert_eq!(
            quad.to_string(),
            "<http://ex/a> <http://ex/p> \"say \\\"hi\\\"\"@en <http://ex/g> ."
        );
    }

    #[test]
    fn position_indices_are_dense() {
        let indices: Vec<_> = Position::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
