//! # Views
//!
//! Live, storage-free handles over a [`QuadIndex`]:
//! - [`Filtered`]: the statements matching a fixed [`Pattern`]
//! - [`View`]: a filter result, possibly the degenerate always-empty view
//! - [`TermSet`] / [`ContextSet`]: one column of a filtered view as a set
//!
//! A view holds its pattern and a handle `G` to the store. Reads need
//! `G: Deref<Target = QuadIndex>` (`&QuadIndex` works); writes need
//! `G: DerefMut` (`&mut QuadIndex` works). Nothing is cached, so every read
//! reflects the store as it is now.
//!
//! Writes through a view fill omitted components from the view's pattern and
//! reject components that contradict it. Removals go through the store, which
//! keeps all four indices in step and copies any index set still shared with
//! a live [`Cursor`].

use crate::index::{Cursor, Matches, QuadIndex};
use crate::pattern::Pattern;
use crate::types::display_context;
use crate::{Context, NodeId, Position, StoreError, Term};
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

/// The component to write: given if present, else fixed by the view.
fn complete<'t>(
    position: Position,
    given: Option<&'t Term>,
    fixed: Option<&'t Term>,
) -> Result<&'t Term, StoreError> {
    match (given, fixed) {
        (Some(g), Some(f)) if g != f => Err(StoreError::IncompatibleStatement {
            position,
            found: g.to_string(),
        }),
        (Some(t), _) | (None, Some(t)) => Ok(t),
        (None, None) => Err(StoreError::IncompleteStatement(position)),
    }
}

/// Contexts to write: the given list checked against the view, or the view's
/// own contexts when none are given.
fn contexts_for_add(pattern: &Pattern, given: &[Context]) -> Result<Vec<Context>, StoreError> {
    if given.is_empty() {
        return Ok(pattern.contexts.defaults_for_add());
    }
    if let Some(bad) = given.iter().find(|c| !pattern.contexts.matches(c.as_ref())) {
        return Err(StoreError::IncompatibleStatement {
            position: Position::Context,
            found: display_context(bad.as_ref()),
        });
    }
    Ok(given.to_vec())
}

// =============================================================================
// FILTERED VIEW
// =============================================================================

/// The statements of a store that match a pattern.
#[derive(Debug, Clone)]
pub struct Filtered<G> {
    graph: G,
    pattern: Pattern,
}

impl<G> Filtered<G> {
    pub(crate) fn new(graph: G, pattern: Pattern) -> Self {
        Self { graph, pattern }
    }

    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Give back the store handle.
    pub fn into_inner(self) -> G {
        self.graph
    }
}

impl<G: Deref<Target = QuadIndex>> Filtered<G> {
    /// The backing store.
    #[must_use]
    pub fn graph(&self) -> &QuadIndex {
        &self.graph
    }

    /// Statements in the view, in insertion order.
    #[must_use]
    pub fn iter(&self) -> Matches<'_> {
        self.graph.matching(&self.pattern)
    }

    /// Number of statements currently in the view. Scans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.graph.contains(&self.pattern)
    }

    /// True if a statement in the view also matches `pattern`.
    #[must_use]
    pub fn contains(&self, pattern: &Pattern) -> bool {
        self.pattern
            .intersect(pattern)
            .is_some_and(|p| self.graph.contains(&p))
    }

    /// Statements in the view that also match `pattern`.
    #[must_use]
    pub fn matching(&self, pattern: &Pattern) -> Matches<'_> {
        match self.pattern.intersect(pattern) {
            Some(p) => self.graph.matching(&p),
            None => Matches::empty(),
        }
    }

    /// A detached cursor over the view; see [`Cursor`].
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.graph.cursor(&self.pattern)
    }

    /// A read-only sub-view. Empty when `pattern` is disjoint from this view.
    #[must_use]
    pub fn filter(&self, pattern: &Pattern) -> View<&QuadIndex> {
        View::compose(&*self.graph, &self.pattern, pattern)
    }

    /// Consume this view into a sub-view over the same handle.
    pub fn into_filter(self, pattern: &Pattern) -> View<G> {
        View::compose(self.graph, &self.pattern, pattern)
    }

    #[must_use]
    pub fn subjects(&self) -> TermSet<&QuadIndex> {
        TermSet::new(&*self.graph, self.pattern.clone(), Position::Subject)
    }

    #[must_use]
    pub fn predicates(&self) -> TermSet<&QuadIndex> {
        TermSet::new(&*self.graph, self.pattern.clone(), Position::Predicate)
    }

    #[must_use]
    pub fn objects(&self) -> TermSet<&QuadIndex> {
        TermSet::new(&*self.graph, self.pattern.clone(), Position::Object)
    }

    #[must_use]
    pub fn contexts(&self) -> ContextSet<&QuadIndex> {
        ContextSet::new(&*self.graph, self.pattern.clone())
    }
}

impl<G: DerefMut<Target = QuadIndex>> Filtered<G> {
    /// Add a statement through the view.
    ///
    /// Omitted components default to the view's fixed values; given ones must
    /// agree with them. An empty `contexts` uses the view's contexts, or no
    /// context when the view accepts any.
    pub fn add(
        &mut self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        contexts: &[Context],
    ) -> Result<bool, StoreError> {
        let s = complete(Position::Subject, subject, self.pattern.subject.as_ref())?;
        let p = complete(Position::Predicate, predicate, self.pattern.predicate.as_ref())?;
        let o = complete(Position::Object, object, self.pattern.object.as_ref())?;
        let contexts = contexts_for_add(&self.pattern, contexts)?;
        Ok(self.graph.add(s, p, o, &contexts))
    }

    /// Remove the statements in the view that also match `pattern`.
    pub fn remove(&mut self, pattern: &Pattern) -> bool {
        match self.pattern.intersect(pattern) {
            Some(p) => self.graph.remove(&p),
            None => false,
        }
    }

    /// Remove every statement in the view.
    pub fn clear(&mut self) -> bool {
        self.graph.remove(&self.pattern)
    }

    /// Remove the statement last returned by `cursor`, if it lies in this view.
    ///
    /// A statement outside the view is left in place and the cursor keeps it
    /// as its current statement.
    pub fn remove_current(&mut self, cursor: &mut Cursor) -> bool {
        let in_view = cursor
            .current()
            .and_then(|id| self.graph.statement(id))
            .and_then(|statement| self.graph.quad_ref(statement))
            .is_some_and(|quad| self.pattern.matches(&quad));
        in_view && cursor.remove(&mut *self.graph)
    }

    /// A read/write sub-view. Empty when `pattern` is disjoint from this view.
    pub fn filter_mut(&mut self, pattern: &Pattern) -> View<&mut QuadIndex> {
        View::compose(&mut *self.graph, &self.pattern, pattern)
    }

    pub fn subjects_mut(&mut self) -> TermSet<&mut QuadIndex> {
        TermSet::new(&mut *self.graph, self.pattern.clone(), Position::Subject)
    }

    pub fn predicates_mut(&mut self) -> TermSet<&mut QuadIndex> {
        TermSet::new(&mut *self.graph, self.pattern.clone(), Position::Predicate)
    }

    pub fn objects_mut(&mut self) -> TermSet<&mut QuadIndex> {
        TermSet::new(&mut *self.graph, self.pattern.clone(), Position::Object)
    }

    pub fn contexts_mut(&mut self) -> ContextSet<&mut QuadIndex> {
        ContextSet::new(&mut *self.graph, self.pattern.clone())
    }
}

// =============================================================================
// VIEW (FILTERED OR EMPTY)
// =============================================================================

/// The result of filtering a view: a live filtered view, or the canonical
/// empty view when the patterns cannot overlap.
#[derive(Debug, Clone)]
pub enum View<G> {
    Empty,
    Filtered(Filtered<G>),
}

impl<G> View<G> {
    fn compose(graph: G, outer: &Pattern, inner: &Pattern) -> Self {
        match outer.intersect(inner) {
            Some(pattern) => Self::Filtered(Filtered::new(graph, pattern)),
            None => {
                tracing::trace!(?outer, ?inner, "disjoint filter, returning empty view");
                Self::Empty
            }
        }
    }

    /// True for the degenerate always-empty view.
    #[must_use]
    pub const fn is_empty_view(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The filtered view, unless this is the empty view.
    #[must_use]
    pub const fn as_filtered(&self) -> Option<&Filtered<G>> {
        match self {
            Self::Filtered(f) => Some(f),
            Self::Empty => None,
        }
    }

    pub fn as_filtered_mut(&mut self) -> Option<&mut Filtered<G>> {
        match self {
            Self::Filtered(f) => Some(f),
            Self::Empty => None,
        }
    }
}

impl<G: Deref<Target = QuadIndex>> View<G> {
    #[must_use]
    pub fn iter(&self) -> Matches<'_> {
        match self {
            Self::Filtered(f) => f.iter(),
            Self::Empty => Matches::empty(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Filtered(f) => f.is_empty(),
            Self::Empty => true,
        }
    }

    #[must_use]
    pub fn contains(&self, pattern: &Pattern) -> bool {
        match self {
            Self::Filtered(f) => f.contains(pattern),
            Self::Empty => false,
        }
    }

    #[must_use]
    pub fn matching(&self, pattern: &Pattern) -> Matches<'_> {
        match self {
            Self::Filtered(f) => f.matching(pattern),
            Self::Empty => Matches::empty(),
        }
    }

    #[must_use]
    pub fn filter(&self, pattern: &Pattern) -> View<&QuadIndex> {
        match self {
            Self::Filtered(f) => f.filter(pattern),
            Self::Empty => View::Empty,
        }
    }
}

impl<G: DerefMut<Target = QuadIndex>> View<G> {
    /// Add through the view. The empty view accepts nothing.
    pub fn add(
        &mut self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        contexts: &[Context],
    ) -> Result<bool, StoreError> {
        match self {
            Self::Filtered(f) => f.add(subject, predicate, object, contexts),
            Self::Empty => Err(reject_for_empty(subject, predicate, object, contexts)),
        }
    }

    pub fn remove(&mut self, pattern: &Pattern) -> bool {
        match self {
            Self::Filtered(f) => f.remove(pattern),
            Self::Empty => false,
        }
    }

    pub fn filter_mut(&mut self, pattern: &Pattern) -> View<&mut QuadIndex> {
        match self {
            Self::Filtered(f) => f.filter_mut(pattern),
            Self::Empty => View::Empty,
        }
    }
}

fn reject_for_empty(
    subject: Option<&Term>,
    predicate: Option<&Term>,
    object: Option<&Term>,
    contexts: &[Context],
) -> StoreError {
    let given = [
        (Position::Subject, subject),
        (Position::Predicate, predicate),
        (Position::Object, object),
    ]
    .into_iter()
    .find_map(|(position, term)| term.map(|t| (position, t.to_string())))
    .or_else(|| {
        contexts
            .first()
            .map(|c| (Position::Context, display_context(c.as_ref())))
    });

    match given {
        Some((position, found)) => StoreError::IncompatibleStatement { position, found },
        None => StoreError::IncompleteStatement(Position::Subject),
    }
}

// =============================================================================
// PROJECTIONS
// =============================================================================

/// Distinct nodes at `position` among the statements matching `pattern`,
/// in first-seen order.
fn distinct_nodes<'a>(
    index: &'a QuadIndex,
    pattern: &Pattern,
    position: Position,
) -> impl Iterator<Item = NodeId> + use<'a> {
    let mut seen = BTreeSet::new();
    index
        .matching_statements(pattern)
        .map(move |(_, statement)| statement.node(position))
        .filter(move |node| seen.insert(*node))
}

/// The distinct subjects, predicates or objects of a filtered view.
#[derive(Debug, Clone)]
pub struct TermSet<G> {
    graph: G,
    pattern: Pattern,
    position: Position,
}

impl<G> TermSet<G> {
    pub(crate) fn new(graph: G, pattern: Pattern, position: Position) -> Self {
        debug_assert!(position != Position::Context, "use ContextSet for contexts");
        Self {
            graph,
            pattern,
            position,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }
}

impl<G: Deref<Target = QuadIndex>> TermSet<G> {
    /// Distinct values, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Term> + '_ {
        let index: &QuadIndex = &self.graph;
        distinct_nodes(index, &self.pattern, self.position)
            .filter_map(move |node| index.node_table().term(node))
    }

    /// Number of distinct values. Scans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    #[must_use]
    pub fn contains(&self, term: &Term) -> bool {
        self.pattern
            .restrict_term(self.position, term)
            .is_some_and(|p| self.graph.contains(&p))
    }

    /// The only value, `None` if there is none.
    pub fn single(&self) -> Result<Option<Term>, StoreError> {
        let mut values = self.iter();
        let first = values.next().cloned();
        if values.next().is_some() {
            return Err(StoreError::AmbiguousSingleValue(self.position));
        }
        Ok(first)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Term> {
        self.iter().cloned().collect()
    }
}

impl<G: DerefMut<Target = QuadIndex>> TermSet<G> {
    /// Remove every statement of the view carrying `term` in this column.
    pub fn remove(&mut self, term: &Term) -> bool {
        match self.pattern.restrict_term(self.position, term) {
            Some(p) => self.graph.remove(&p),
            None => false,
        }
    }

    /// Add the statement formed by `term` and the view's other fixed components.
    pub fn add(&mut self, term: &Term) -> Result<bool, StoreError> {
        let position = self.position;
        let pattern = &self.pattern;
        let component = |at: Position| {
            let given = (at == position).then_some(term);
            complete(at, given, pattern.term(at))
        };
        let s = component(Position::Subject)?;
        let p = component(Position::Predicate)?;
        let o = component(Position::Object)?;
        let contexts = self.pattern.contexts.defaults_for_add();
        Ok(self.graph.add(s, p, o, &contexts))
    }
}

/// The distinct contexts of a filtered view. `None` items stand for "no context".
#[derive(Debug, Clone)]
pub struct ContextSet<G> {
    graph: G,
    pattern: Pattern,
}

impl<G> ContextSet<G> {
    pub(crate) fn new(graph: G, pattern: Pattern) -> Self {
        Self { graph, pattern }
    }
}

impl<G: Deref<Target = QuadIndex>> ContextSet<G> {
    /// Distinct contexts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Term>> + '_ {
        let index: &QuadIndex = &self.graph;
        distinct_nodes(index, &self.pattern, Position::Context)
            .filter_map(move |node| index.node_table().node(node).map(|n| n.term()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    #[must_use]
    pub fn contains(&self, context: Option<&Term>) -> bool {
        self.pattern
            .restrict_context(context)
            .is_some_and(|p| self.graph.contains(&p))
    }

    /// The only context, `None` if there is none.
    pub fn single(&self) -> Result<Option<Context>, StoreError> {
        let mut values = self.iter();
        let first = values.next().map(|c| c.cloned());
        if values.next().is_some() {
            return Err(StoreError::AmbiguousSingleValue(Position::Context));
        }
        Ok(first)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Context> {
        self.iter().map(|c| c.cloned()).collect()
    }
}

impl<G: DerefMut<Target = QuadIndex>> ContextSet<G> {
    /// Remove every statement of the view in `context`.
    pub fn remove(&mut self, context: Option<&Term>) -> bool {
        match self.pattern.restrict_context(context) {
            Some(p) => self.graph.remove(&p),
            None => false,
        }
    }

    /// Add the view's fixed triple in `context`.
    pub fn add(&mut self, context: Context) -> Result<bool, StoreError> {
        let s = complete(Position::Subject, None, self.pattern.subject.as_ref())?;
        let p = complete(Position::Predicate, None, self.pattern.predicate.as_ref())?;
        let o = complete(Position::Object, None, self.pattern.object.as_ref())?;
        let contexts = contexts_for_add(&self.pattern, std::slice::from_ref(&context))?;
        Ok(self.graph.add(s, p, o, &contexts))
    }
}

// =============================================================================
// TESTS
// =============================================================================
