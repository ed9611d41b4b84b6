//! # Quad Index
//!
//! The in-memory quad store.
//!
//! A [`QuadIndex`] owns the value identity table and the master statement set.
//! Every statement is cross-referenced from the occurrence sets of its four
//! nodes. After every public operation:
//!
//! 1. a statement is in the master set iff it is in all four of its nodes'
//!    occurrence sets (subject, predicate, object, context);
//! 2. no two stored statements are equal over their four nodes;
//! 3. every node referenced by a stored statement is registered in the table.
//!
//! Pattern matching picks the smallest candidate occurrence set among the
//! fixed components and filters it; with no fixed component it scans the
//! master set. All iteration follows insertion order.
//!
//! ## Context arguments
//!
//! `add` treats an empty context list as "one statement with no context".
//! `remove`, `contains`, `matching` and `clear` take a [`Pattern`] whose
//! [`ContextFilter::Any`] is the wildcard; [`ContextFilter::from_contexts`]
//! maps an argument list to it (empty list = any context).

use crate::node_table::{IdSet, NO_CONTEXT, NodeTable, insert_shared, remove_shared};
use crate::options::StoreOptions;
use crate::pattern::{ContextFilter, Pattern};
use crate::view::{ContextSet, Filtered, TermSet};
use crate::{Context, NodeId, Position, Quad, QuadRef, StatementId, StoreError, Term};
use std::collections::{BTreeMap, BTreeSet, btree_set};
use std::ops::Bound;
use std::sync::Arc;

// =============================================================================
// STATEMENT
// =============================================================================

/// A stored statement: four canonical nodes plus the inferred flag.
///
/// Equality and hashing cover the four nodes only.
#[derive(Debug, Clone, Copy)]
pub struct Statement {
    nodes: [NodeId; 4],
    inferred: bool,
}

impl Statement {
    #[must_use]
    pub const fn new(
        subject: NodeId,
        predicate: NodeId,
        object: NodeId,
        context: NodeId,
        inferred: bool,
    ) -> Self {
        Self {
            nodes: [subject, predicate, object, context],
            inferred,
        }
    }

    /// The node at `position`.
    #[must_use]
    pub const fn node(&self, position: Position) -> NodeId {
        self.nodes[position.index()]
    }

    #[must_use]
    pub const fn inferred(&self) -> bool {
        self.inferred
    }

    /// Compare subject, predicate and object nodes only.
    #[must_use]
    pub fn eq_ignore_context(&self, other: &Self) -> bool {
        self.nodes[..3] == other.nodes[..3]
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for Statement {}

impl std::hash::Hash for Statement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.nodes.hash(state);
    }
}

// =============================================================================
// QUERY PLAN
// =============================================================================

/// Which set a match scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanBase {
    All,
    Node(NodeId, Position),
}

/// A pattern resolved against one store's node table.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    fixed: [Option<NodeId>; 3],
    contexts: Option<Vec<NodeId>>,
    base: ScanBase,
}

impl Plan {
    pub(crate) fn accepts(&self, statement: &Statement) -> bool {
        let spo = [Position::Subject, Position::Predicate, Position::Object];
        spo.iter()
            .zip(self.fixed.iter())
            .all(|(pos, fixed)| fixed.is_none_or(|id| statement.node(*pos) == id))
            && self
                .contexts
                .as_ref()
                .is_none_or(|ids| ids.contains(&statement.node(Position::Context)))
    }
}

// =============================================================================
// QUAD INDEX
// =============================================================================

/// The quad store.
///
/// Cloning is cheap on the index side: occurrence sets are shared and copied
/// on the first write to either clone.
#[derive(Debug, Clone, Default)]
pub struct QuadIndex {
    nodes: NodeTable,
    statements: BTreeMap<StatementId, Statement>,
    /// Master set, in insertion order.
    all: Arc<IdSet>,
    next_statement_id: u64,
    options: StoreOptions,
}

impl QuadIndex {
    /// Create an empty store with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given options.
    #[must_use]
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// The options this store was built with.
    ///
    /// The store itself only reads `verify_invariants`. Pass the options to
    /// [`GraphMatcher::new`](crate::GraphMatcher::new) to compare graphs
    /// under the same blank node ceiling:
    /// `GraphMatcher::new(store.options()).equals(store.quads(), other.quads())`.
    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Number of stored statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Number of canonical nodes, including the no-context node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The value identity table.
    #[must_use]
    pub fn node_table(&self) -> &NodeTable {
        &self.nodes
    }

    /// Node of `term`, if the store has ever seen it.
    #[must_use]
    pub fn node_id(&self, term: &Term) -> Option<NodeId> {
        self.nodes.lookup(term)
    }

    /// Node of a context slot, if the store has ever seen it.
    #[must_use]
    pub fn context_id(&self, context: Option<&Term>) -> Option<NodeId> {
        self.nodes.lookup_context(context)
    }

    /// Look up a stored statement by id.
    #[must_use]
    pub fn statement(&self, id: StatementId) -> Option<&Statement> {
        self.statements.get(&id)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Add `(subject, predicate, object)` once per context.
    ///
    /// An empty `contexts` adds a single statement with no context.
    /// Returns true if anything was added.
    pub fn add(
        &mut self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        contexts: &[Context],
    ) -> bool {
        self.add_with_flag(subject, predicate, object, contexts, false)
    }

    /// Like [`add`](Self::add), marking new statements as inferred.
    ///
    /// Statements already present keep their flag.
    pub fn add_inferred(
        &mut self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        contexts: &[Context],
    ) -> bool {
        self.add_with_flag(subject, predicate, object, contexts, true)
    }

    /// Add an owned quad, keeping its inferred flag.
    pub fn insert(&mut self, quad: &Quad) -> bool {
        self.add_with_flag(
            &quad.subject,
            &quad.predicate,
            &quad.object,
            std::slice::from_ref(&quad.context),
            quad.inferred,
        )
    }

    fn add_with_flag(
        &mut self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        contexts: &[Context],
        inferred: bool,
    ) -> bool {
        let s = self.nodes.get_or_insert(subject);
        let p = self.nodes.get_or_insert(predicate);
        let o = self.nodes.get_or_insert(object);

        if contexts.is_empty() {
            return self.insert_statement(Statement::new(s, p, o, NO_CONTEXT, inferred));
        }

        let mut changed = false;
        for context in contexts {
            let c = self.nodes.get_or_insert_context(context.as_ref());
            changed |= self.insert_statement(Statement::new(s, p, o, c, inferred));
        }
        changed
    }

    /// Insert unless an equal statement exists; the duplicate probe scans the
    /// smallest of the four occurrence sets.
    fn insert_statement(&mut self, statement: Statement) -> bool {
        if self.find_statement(&statement).is_some() {
            return false;
        }

        let id = StatementId(self.next_statement_id);
        self.next_statement_id = self.next_statement_id.saturating_add(1);

        self.statements.insert(id, statement);
        insert_shared(&mut self.all, id);
        for position in Position::ALL {
            if let Some(node) = self.nodes.node_mut(statement.node(position)) {
                node.attach(position, id);
            }
        }

        tracing::trace!(statement = id.0, inferred = statement.inferred, "statement added");
        self.after_mutation(id);
        true
    }

    /// Id of the stored statement equal to `statement`, if any.
    fn find_statement(&self, statement: &Statement) -> Option<StatementId> {
        let position = Position::ALL
            .into_iter()
            .min_by_key(|pos| self.nodes.occurrence_count(statement.node(*pos), *pos))?;
        let node = self.nodes.node(statement.node(position))?;
        node.occurrences(position)
            .iter()
            .copied()
            .find(|id| self.statements.get(id) == Some(statement))
    }

    /// Remove one statement by id from the master set and all four indices.
    pub(crate) fn remove_statement(&mut self, id: StatementId) -> bool {
        let Some(statement) = self.statements.remove(&id) else {
            return false;
        };

        remove_shared(&mut self.all, id);
        for position in Position::ALL {
            if let Some(node) = self.nodes.node_mut(statement.node(position)) {
                node.detach(position, id);
            }
        }

        tracing::trace!(statement = id.0, "statement removed");
        self.after_mutation(id);
        true
    }

    /// Remove every statement matching `pattern`. Returns true if any was removed.
    pub fn remove(&mut self, pattern: &Pattern) -> bool {
        let ids = self.matching_ids(pattern);
        let mut removed = 0usize;
        for id in ids {
            if self.remove_statement(id) {
                removed += 1;
            }
        }
        if removed > 1 {
            tracing::debug!(removed, "bulk removal");
        }
        removed > 0
    }

    /// Remove everything in the given contexts; an empty list clears the store.
    pub fn clear(&mut self, contexts: &[Context]) -> bool {
        let pattern = Pattern::any().with_contexts(ContextFilter::from_contexts(contexts));
        let cleared = self.remove(&pattern);
        tracing::debug!(cleared, remaining = self.len(), "clear");
        cleared
    }

    // -------------------------------------------------------------------------
    // Query
    // -------------------------------------------------------------------------

    /// True if at least one statement matches `pattern`.
    #[must_use]
    pub fn contains(&self, pattern: &Pattern) -> bool {
        self.matching(pattern).next().is_some()
    }

    /// True if this exact quad is stored (its inferred flag is ignored).
    #[must_use]
    pub fn contains_quad(&self, quad: &Quad) -> bool {
        self.contains(
            &Pattern::spo(Some(&quad.subject), Some(&quad.predicate), Some(&quad.object))
                .in_context(quad.context.clone()),
        )
    }

    /// Lazily enumerate statements matching `pattern`, in insertion order.
    #[must_use]
    pub fn matching(&self, pattern: &Pattern) -> Matches<'_> {
        match self.plan(pattern) {
            Some(plan) => Matches {
                scan: Some(Scan {
                    index: self,
                    ids: self.base_set(plan.base).iter(),
                    plan,
                }),
            },
            None => Matches::empty(),
        }
    }

    /// All statements, in insertion order.
    #[must_use]
    pub fn quads(&self) -> Matches<'_> {
        self.matching(&Pattern::any())
    }

    /// Ids of statements matching `pattern`, in insertion order.
    #[must_use]
    pub fn matching_ids(&self, pattern: &Pattern) -> Vec<StatementId> {
        self.matching_statements(pattern).map(|(id, _)| id).collect()
    }

    /// Matching statements at node level.
    pub(crate) fn matching_statements<'a>(
        &'a self,
        pattern: &Pattern,
    ) -> impl Iterator<Item = (StatementId, &'a Statement)> + use<'a> {
        let scan = self
            .plan(pattern)
            .map(|plan| (self.base_set(plan.base).iter(), plan));
        scan.into_iter().flat_map(move |(ids, plan)| {
            ids.filter_map(move |id| {
                let statement = self.statements.get(id)?;
                plan.accepts(statement).then_some((*id, statement))
            })
        })
    }

    /// A detached cursor over `pattern`; see [`Cursor`].
    #[must_use]
    pub fn cursor(&self, pattern: &Pattern) -> Cursor {
        match self.plan(pattern) {
            Some(plan) => Cursor {
                base: self.base_snapshot(plan.base),
                plan: Some(plan),
                position: None,
                last: None,
            },
            None => Cursor::exhausted(),
        }
    }

    /// Resolve `pattern` against the node table. `None` if it cannot match.
    fn plan(&self, pattern: &Pattern) -> Option<Plan> {
        let mut fixed = [None; 3];
        let mut candidates: Vec<(NodeId, Position)> = Vec::new();

        for (slot, position) in [Position::Subject, Position::Predicate, Position::Object]
            .into_iter()
            .enumerate()
        {
            if let Some(term) = pattern.term(position) {
                let id = self.nodes.lookup(term)?;
                fixed[slot] = Some(id);
                candidates.push((id, position));
            }
        }

        let contexts = match pattern.contexts.accepted() {
            None => None,
            Some(accepted) => {
                let ids: Vec<NodeId> = accepted
                    .into_iter()
                    .filter_map(|c| self.nodes.lookup_context(c))
                    .collect();
                match ids.as_slice() {
                    [] => return None,
                    [only] => candidates.push((*only, Position::Context)),
                    _ => {}
                }
                Some(ids)
            }
        };

        let base = candidates
            .into_iter()
            .min_by_key(|(id, pos)| self.nodes.occurrence_count(*id, *pos))
            .map_or(ScanBase::All, |(id, pos)| ScanBase::Node(id, pos));

        Some(Plan {
            fixed,
            contexts,
            base,
        })
    }

    fn base_set(&self, base: ScanBase) -> &IdSet {
        match base {
            ScanBase::All => &self.all,
            ScanBase::Node(id, pos) => self
                .nodes
                .node(id)
                .map_or(&EMPTY_SET, |node| node.occurrences(pos)),
        }
    }

    fn base_snapshot(&self, base: ScanBase) -> Arc<IdSet> {
        match base {
            ScanBase::All => Arc::clone(&self.all),
            ScanBase::Node(id, pos) => self
                .nodes
                .node(id)
                .map_or_else(Arc::default, |node| node.snapshot(pos)),
        }
    }

    /// Resolve a stored statement to its terms.
    #[must_use]
    pub fn quad_ref(&self, statement: &Statement) -> Option<QuadRef<'_>> {
        let context = self.nodes.node(statement.node(Position::Context))?;
        Some(QuadRef {
            subject: self.nodes.term(statement.node(Position::Subject))?,
            predicate: self.nodes.term(statement.node(Position::Predicate))?,
            object: self.nodes.term(statement.node(Position::Object))?,
            context: context.term(),
            inferred: statement.inferred(),
        })
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    /// A read-only view of the statements matching `pattern`.
    #[must_use]
    pub fn filter(&self, pattern: Pattern) -> Filtered<&Self> {
        Filtered::new(self, pattern)
    }

    /// A read/write view of the statements matching `pattern`.
    pub fn filter_mut(&mut self, pattern: Pattern) -> Filtered<&mut Self> {
        Filtered::new(self, pattern)
    }

    #[must_use]
    pub fn subjects(&self) -> TermSet<&Self> {
        TermSet::new(self, Pattern::any(), Position::Subject)
    }

    #[must_use]
    pub fn predicates(&self) -> TermSet<&Self> {
        TermSet::new(self, Pattern::any(), Position::Predicate)
    }

    #[must_use]
    pub fn objects(&self) -> TermSet<&Self> {
        TermSet::new(self, Pattern::any(), Position::Object)
    }

    #[must_use]
    pub fn contexts(&self) -> ContextSet<&Self> {
        ContextSet::new(self, Pattern::any())
    }

    pub fn subjects_mut(&mut self) -> TermSet<&mut Self> {
        TermSet::new(self, Pattern::any(), Position::Subject)
    }

    pub fn predicates_mut(&mut self) -> TermSet<&mut Self> {
        TermSet::new(self, Pattern::any(), Position::Predicate)
    }

    pub fn objects_mut(&mut self) -> TermSet<&mut Self> {
        TermSet::new(self, Pattern::any(), Position::Object)
    }

    pub fn contexts_mut(&mut self) -> ContextSet<&mut Self> {
        ContextSet::new(self, Pattern::any())
    }

    /// The unique object of `(subject, predicate, ?)`.
    pub fn object_of(&self, subject: &Term, predicate: &Term) -> Result<Option<Term>, StoreError> {
        TermSet::new(
            self,
            Pattern::spo(Some(subject), Some(predicate), None),
            Position::Object,
        )
        .single()
    }

    /// The unique subject of `(?, predicate, object)`.
    pub fn subject_of(&self, predicate: &Term, object: &Term) -> Result<Option<Term>, StoreError> {
        TermSet::new(
            self,
            Pattern::spo(None, Some(predicate), Some(object)),
            Position::Subject,
        )
        .single()
    }

    // -------------------------------------------------------------------------
    // Invariants
    // -------------------------------------------------------------------------

    /// Verify all index invariants, reporting the first violation found.
    pub fn check_invariants(&self) -> Result<(), StoreError> {
        if !self.nodes.is_consistent() {
            return Err(StoreError::InvariantViolation(
                "node table lookup disagrees with arena".to_string(),
            ));
        }

        if self.all.len() != self.statements.len()
            || !self.all.iter().eq(self.statements.keys())
        {
            return Err(StoreError::InvariantViolation(
                "master set disagrees with statement storage".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for (id, statement) in &self.statements {
            if !seen.insert(statement.nodes) {
                return Err(StoreError::InvariantViolation(format!(
                    "statement {} is a duplicate",
                    id.0
                )));
            }
            self.check_statement(*id)?;
        }

        for (node_id, node) in self.nodes.iter() {
            for position in Position::ALL {
                for id in node.occurrences(position) {
                    let indexed = self
                        .statements
                        .get(id)
                        .is_some_and(|st| st.node(position) == node_id);
                    if !indexed {
                        return Err(StoreError::InvariantViolation(format!(
                            "node {} lists orphaned statement {} as {position}",
                            node_id.0, id.0
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Membership of one statement id across master set and node indices.
    fn check_statement(&self, id: StatementId) -> Result<(), StoreError> {
        let stored = self.statements.get(&id);
        if stored.is_some() != self.all.contains(&id) {
            return Err(StoreError::InvariantViolation(format!(
                "statement {} master membership mismatch",
                id.0
            )));
        }
        if let Some(statement) = stored {
            for position in Position::ALL {
                let indexed = self
                    .nodes
                    .node(statement.node(position))
                    .is_some_and(|node| node.occurrences(position).contains(&id));
                if !indexed {
                    return Err(StoreError::InvariantViolation(format!(
                        "statement {} missing from its {position} index",
                        id.0
                    )));
                }
            }
        }
        Ok(())
    }

    fn after_mutation(&self, id: StatementId) {
        debug_assert!(
            self.check_statement(id).is_ok(),
            "index invariant violated for statement {}",
            id.0
        );
        if self.options.verify_invariants {
            if let Err(e) = self.check_statement(id) {
                tracing::error!(error = %e, "index invariant violated");
            }
        }
    }
}

static EMPTY_SET: IdSet = BTreeSet::new();

impl Extend<Quad> for QuadIndex {
    fn extend<T: IntoIterator<Item = Quad>>(&mut self, iter: T) {
        for quad in iter {
            self.insert(&quad);
        }
    }
}

impl FromIterator<Quad> for QuadIndex {
    fn from_iter<T: IntoIterator<Item = Quad>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

// =============================================================================
// MATCH ITERATOR
// =============================================================================

/// Lazy iterator over the statements matching a pattern.
pub struct Matches<'a> {
    scan: Option<Scan<'a>>,
}

struct Scan<'a> {
    index: &'a QuadIndex,
    ids: btree_set::Iter<'a, StatementId>,
    plan: Plan,
}

impl Matches<'_> {
    /// An iterator that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { scan: None }
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = QuadRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let scan = self.scan.as_mut()?;
        let index = scan.index;
        for id in scan.ids.by_ref() {
            let Some(statement) = index.statements.get(id) else {
                continue;
            };
            if scan.plan.accepts(statement) {
                let quad = index.quad_ref(statement);
                debug_assert!(quad.is_some(), "statement {} has unresolvable nodes", id.0);
                if quad.is_some() {
                    return quad;
                }
            }
        }
        None
    }
}

// =============================================================================
// DETACHED CURSOR
// =============================================================================

/// A match cursor that does not borrow the store.
///
/// The cursor snapshots its scan-base set when created. The store may then be
/// mutated through any handle; the writer copies the set rather than touching
/// the snapshot. Statements removed after the snapshot are skipped, statements
/// added after it are not seen.
///
/// A cursor must only be used with the store that created it.
#[derive(Debug, Clone)]
pub struct Cursor {
    base: Arc<IdSet>,
    plan: Option<Plan>,
    position: Option<StatementId>,
    last: Option<StatementId>,
}

impl Cursor {
    fn exhausted() -> Self {
        Self {
            base: Arc::default(),
            plan: None,
            position: None,
            last: None,
        }
    }

    /// Advance to the next matching statement still present in `index`.
    pub fn next<'a>(&mut self, index: &'a QuadIndex) -> Option<QuadRef<'a>> {
        let plan = self.plan.as_ref()?;
        loop {
            let lower = self
                .position
                .map_or(Bound::Unbounded, Bound::Excluded);
            let id = *self.base.range((lower, Bound::Unbounded)).next()?;
            self.position = Some(id);

            let Some(statement) = index.statements.get(&id) else {
                continue;
            };
            if plan.accepts(statement) {
                self.last = Some(id);
                return index.quad_ref(statement);
            }
        }
    }

    /// Id of the statement last returned by [`next`](Self::next).
    #[must_use]
    pub fn current(&self) -> Option<StatementId> {
        self.last
    }

    /// Remove the statement last returned by [`next`](Self::next).
    pub fn remove(&mut self, index: &mut QuadIndex) -> bool {
        self.last
            .take()
            .is_some_and(|id| index.remove_statement(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Term {
        Term::uri(format!("http://ex/{s}"))
    }

    fn triples(index: &QuadIndex, pattern: &Pattern) -> Vec<(Term, Term, Term)> {
        index
            .matching(pattern)
            .map(|q| (q.subject.clone(), q.predicate.clone(), q.object.clone()))
            .collect()
    }

    #[test]
    fn add_is_idempotent() {
        let mut index = QuadIndex::new();
        assert!(index.add(&uri("a"), &uri("p"), &uri("b"), &[]));
        assert!(!index.add(&uri("a"), &uri("p"), &uri("b"), &[]));
        assert_eq!(index.len(), 1);
        index.check_invariants().expect("invariants");
    }

    #[test]
    fn add_once_per_context() {
        let mut index = QuadIndex::new();
        let g1 = Some(uri("g1"));
        let g2 = Some(uri("g2"));

        assert!(index.add(&uri("a"), &uri("p"), &uri("b"), &[g1.clone(), g2.clone()]));
        assert_eq!(index.len(), 2);
        assert!(!index.add(&uri("a"), &uri("p"), &uri("b"), &[g1]));
        assert!(index.add(&uri("a"), &uri("p"), &uri("b"), &[]));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn unknown_term_short_circuits() {
        let mut index = QuadIndex::new();
        index.add(&uri("a"), &uri("p"), &uri("b"), &[]);
        let nodes = index.node_count();

        assert!(!index.contains(&Pattern::any().with_subject(uri("missing"))));
        assert_eq!(index.node_count(), nodes);
    }

    #[test]
    fn plan_scans_smallest_set() {
        let mut index = QuadIndex::new();
        for i in 0..10 {
            index.add(&uri("hub"), &uri("p"), &uri(&format!("o{i}")), &[]);
        }
        index.add(&uri("rare"), &uri("p"), &uri("o3"), &[]);

        let pattern = Pattern::any().with_predicate(uri("p")).with_object(uri("o3"));
        let plan = index.plan(&pattern).expect("plan");
        let o3 = index.node_id(&uri("o3")).expect("o3");

        assert_eq!(plan.base, ScanBase::Node(o3, Position::Object));
        assert_eq!(triples(&index, &pattern).len(), 2);
    }

    #[test]
    fn wildcard_plan_scans_master_set() {
        let index = QuadIndex::new();
        let plan = index.plan(&Pattern::any()).expect("plan");
        assert_eq!(plan.base, ScanBase::All);
    }

    #[test]
    fn single_context_is_a_scan_candidate() {
        let mut index = QuadIndex::new();
        for i in 0..5 {
            index.add(&uri("s"), &uri("p"), &uri(&format!("o{i}")), &[]);
        }
        index.add(&uri("s"), &uri("p"), &uri("o0"), &[Some(uri("g"))]);

        let pattern = Pattern::any().with_subject(uri("s")).in_context(Some(uri("g")));
        let plan = index.plan(&pattern).expect("plan");
        let g = index.node_id(&uri("g")).expect("g");

        assert_eq!(plan.base, ScanBase::Node(g, Position::Context));
        assert_eq!(index.matching(&pattern).count(), 1);
    }

    #[test]
    fn removal_updates_every_index() {
        let mut index = QuadIndex::new();
        index.add(&uri("a"), &uri("p"), &uri("b"), &[Some(uri("g"))]);
        index.add(&uri("a"), &uri("p"), &uri("c"), &[]);

        assert!(index.remove(&Pattern::any().with_object(uri("b"))));
        index.check_invariants().expect("invariants");

        for term in [uri("a"), uri("p"), uri("b"), uri("g")] {
            let id = index.node_id(&term).expect("node survives removal");
            let node = index.node_table().node(id).expect("node");
            let total: usize = Position::ALL.iter().map(|p| node.occurrence_count(*p)).sum();
            let expected = usize::from(term != uri("b") && term != uri("g"));
            assert_eq!(total, expected, "{term}");
        }
    }

    #[test]
    fn clear_by_context() {
        let mut index = QuadIndex::new();
        index.add(&uri("a"), &uri("p"), &uri("b"), &[Some(uri("g"))]);
        index.add(&uri("a"), &uri("p"), &uri("c"), &[]);

        assert!(index.clear(&[Some(uri("g"))]));
        assert_eq!(index.len(), 1);
        assert!(!index.clear(&[Some(uri("g"))]));
        assert!(index.clear(&[]));
        assert!(index.is_empty());
    }

    #[test]
    fn inferred_flag_is_kept_but_not_identity() {
        let mut index = QuadIndex::new();
        assert!(index.add_inferred(&uri("a"), &uri("p"), &uri("b"), &[]));
        assert!(!index.add(&uri("a"), &uri("p"), &uri("b"), &[]));

        let quad = index.quads().next().expect("one quad");
        assert!(quad.inferred);
    }

    #[test]
    fn cursor_survives_removal_through_store() {
        let mut index = QuadIndex::new();
        for i in 0..4 {
            index.add(&uri("s"), &uri("p"), &uri(&format!("o{i}")), &[]);
        }

        let pattern = Pattern::any().with_subject(uri("s"));
        let mut cursor = index.cursor(&pattern);
        let first = cursor.next(&index).map(|q| q.object.clone());
        assert_eq!(first, Some(uri("o0")));

        // Remove a later statement while the cursor still holds its snapshot.
        assert!(index.remove(&Pattern::any().with_object(uri("o2"))));
        index.check_invariants().expect("invariants");

        let mut rest = Vec::new();
        while let Some(q) = cursor.next(&index) {
            rest.push(q.object.clone());
        }
        assert_eq!(rest, vec![uri("o1"), uri("o3")]);
    }

    #[test]
    fn cursor_remove_deletes_last_yielded() {
        let mut index = QuadIndex::new();
        index.add(&uri("a"), &uri("p"), &uri("b"), &[]);
        index.add(&uri("a"), &uri("p"), &uri("c"), &[]);

        let mut cursor = index.cursor(&Pattern::any());
        assert!(!cursor.remove(&mut index));
        assert!(cursor.next(&index).is_some());
        assert!(cursor.remove(&mut index));
        assert!(!cursor.remove(&mut index));
        assert!(cursor.next(&index).is_some());
        assert!(cursor.next(&index).is_none());

        assert_eq!(
            triples(&index, &Pattern::any()),
            vec![(uri("a"), uri("p"), uri("c"))]
        );
        index.check_invariants().expect("invariants");
    }

    #[test]
    fn collect_from_quads() {
        let quads = vec![
            Quad::new(uri("a"), uri("p"), uri("b")),
            Quad::new(uri("a"), uri("p"), uri("b")),
            Quad::new(uri("a"), uri("p"), uri("c")).in_context(Some(uri("g"))),
        ];
        let index: QuadIndex = quads.into_iter().collect();

        assert_eq!(index.len(), 2);
        let named = Quad::new(uri("a"), uri("p"), uri("c")).in_context(Some(uri("g")));
        assert!(index.contains_quad(&named));
        assert!(!index.contains_quad(&Quad::new(uri("a"), uri("p"), uri("c"))));
    }

    #[test]
    fn clone_shares_until_written() {
        let mut original = QuadIndex::new();
        original.add(&uri("a"), &uri("p"), &uri("b"), &[]);
        let snapshot = original.clone();

        original.remove(&Pattern::any());

        assert!(original.is_empty());
        assert_eq!(snapshot.len(), 1);
        snapshot.check_invariants().expect("snapshot invariants");
        original.check_invariants().expect("original invariants");
    }
}
