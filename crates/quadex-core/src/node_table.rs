//! # Value Identity Table
//!
//! Canonicalizes every distinct term to exactly one [`GraphNode`] per store.
//!
//! Nodes live in an arena addressed by [`NodeId`]. Slot 0 is reserved for the
//! "no context" sentinel, so every store can answer context-free lookups
//! without allocating. Nodes are never removed: a node whose occurrence sets
//! are all empty simply stays in the arena.
//!
//! Each node owns four occurrence sets, one per [`Position`]. The sets are
//! `Arc`-shared so that detached cursors can hold a snapshot while the store
//! keeps mutating; writers go through [`insert_shared`]/[`remove_shared`],
//! which copy a set only when a snapshot is still alive.

use crate::{NodeId, Position, StatementId, Term};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A set of statement ids, ordered by insertion.
pub type IdSet = BTreeSet<StatementId>;

/// The node reserved for the "no context" sentinel.
pub const NO_CONTEXT: NodeId = NodeId(0);

/// Insert into a possibly shared set, copying it first if a cursor shares it.
pub(crate) fn insert_shared(set: &mut Arc<IdSet>, id: StatementId) -> bool {
    if Arc::strong_count(set) > 1 {
        tracing::debug!(statement = id.0, len = set.len(), "copying shared index set before insert");
    }
    Arc::make_mut(set).insert(id)
}

/// Remove from a possibly shared set, copying it first if a cursor shares it.
pub(crate) fn remove_shared(set: &mut Arc<IdSet>, id: StatementId) -> bool {
    if !set.contains(&id) {
        return false;
    }
    if Arc::strong_count(set) > 1 {
        tracing::debug!(statement = id.0, len = set.len(), "copying shared index set before removal");
    }
    Arc::make_mut(set).remove(&id)
}

// =============================================================================
// GRAPH NODE
// =============================================================================

/// The canonical node of one term (or of the "no context" sentinel).
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// `None` only for the [`NO_CONTEXT`] node.
    term: Option<Term>,
    /// Statements using this node, indexed by [`Position::index`].
    occurrences: [Arc<IdSet>; 4],
}

impl GraphNode {
    fn new(term: Option<Term>) -> Self {
        Self {
            term,
            occurrences: Default::default(),
        }
    }

    /// The term this node stands for. `None` for the no-context node.
    #[must_use]
    pub fn term(&self) -> Option<&Term> {
        self.term.as_ref()
    }

    /// Statements using this node at `position`.
    #[must_use]
    pub fn occurrences(&self, position: Position) -> &IdSet {
        &self.occurrences[position.index()]
    }

    /// Number of statements using this node at `position`.
    #[must_use]
    pub fn occurrence_count(&self, position: Position) -> usize {
        self.occurrences[position.index()].len()
    }

    /// A shared snapshot of the occurrence set at `position`.
    pub(crate) fn snapshot(&self, position: Position) -> Arc<IdSet> {
        Arc::clone(&self.occurrences[position.index()])
    }

    pub(crate) fn attach(&mut self, position: Position, id: StatementId) -> bool {
        insert_shared(&mut self.occurrences[position.index()], id)
    }

    pub(crate) fn detach(&mut self, position: Position, id: StatementId) -> bool {
        remove_shared(&mut self.occurrences[position.index()], id)
    }
}

// =============================================================================
// NODE TABLE
// =============================================================================

/// Arena of canonical nodes plus the term-to-node lookup.
#[derive(Debug, Clone)]
pub struct NodeTable {
    nodes: Vec<GraphNode>,
    by_term: BTreeMap<Term, NodeId>,
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTable {
    /// A table holding only the no-context node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![GraphNode::new(None)],
            by_term: BTreeMap::new(),
        }
    }

    /// Number of nodes, including the no-context node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the no-context node is present from the start.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the node of `term` without inserting.
    #[must_use]
    pub fn lookup(&self, term: &Term) -> Option<NodeId> {
        self.by_term.get(term).copied()
    }

    /// Find the node of a context slot without inserting.
    #[must_use]
    pub fn lookup_context(&self, context: Option<&Term>) -> Option<NodeId> {
        match context {
            None => Some(NO_CONTEXT),
            Some(term) => self.lookup(term),
        }
    }

    /// Get the node of `term`, creating it on first use.
    pub fn get_or_insert(&mut self, term: &Term) -> NodeId {
        if let Some(&id) = self.by_term.get(term) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(GraphNode::new(Some(term.clone())));
        self.by_term.insert(term.clone(), id);
        id
    }

    /// Get the node of a context slot, creating it on first use.
    pub fn get_or_insert_context(&mut self, context: Option<&Term>) -> NodeId {
        match context {
            None => NO_CONTEXT,
            Some(term) => self.get_or_insert(term),
        }
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(id.index())
    }

    /// The term of a node. `None` for the no-context node or an unknown id.
    #[must_use]
    pub fn term(&self, id: NodeId) -> Option<&Term> {
        self.node(id).and_then(GraphNode::term)
    }

    /// Occurrence count of `id` at `position`, zero for unknown ids.
    #[must_use]
    pub fn occurrence_count(&self, id: NodeId, position: Position) -> usize {
        self.node(id).map_or(0, |n| n.occurrence_count(position))
    }

    /// Iterate all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u64), node))
    }

    /// True if every registered term maps back to a node holding that term.
    pub(crate) fn is_consistent(&self) -> bool {
        self.by_term
            .iter()
            .all(|(term, id)| self.term(*id) == Some(term))
            && self.by_term.len() + 1 == self.nodes.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_term_same_node() {
        let mut table = NodeTable::new();
        let a = table.get_or_insert(&Term::uri("http://ex/a"));
        let again = table.get_or_insert(&Term::uri("http://ex/a"));
        let b = table.get_or_insert(&Term::uri("http://ex/b"));

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(table.len(), 3);
        assert!(table.is_consistent());
    }

    #[test]
    fn no_context_is_preallocated() {
        let mut table = NodeTable::new();
        assert_eq!(table.lookup_context(None), Some(NO_CONTEXT));
        assert_eq!(table.get_or_insert_context(None), NO_CONTEXT);
        assert_eq!(table.term(NO_CONTEXT), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn lookup_does_not_insert() {
        let table = NodeTable::new();
        assert_eq!(table.lookup(&Term::uri("http://ex/missing")), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_blank_nodes_get_distinct_nodes() {
        let mut table = NodeTable::new();
        let x = Term::blank();
        let y = Term::blank();

        let nx = table.get_or_insert(&x);
        let ny = table.get_or_insert(&y);

        assert_ne!(nx, ny);
        assert_eq!(table.get_or_insert(&x.clone()), nx);
    }

    #[test]
    fn shared_set_is_copied_on_removal() {
        let mut set = Arc::new(IdSet::from([StatementId(1), StatementId(2)]));
        let snapshot = Arc::clone(&set);

        assert!(remove_shared(&mut set, StatementId(1)));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(set.len(), 1);
        assert!(!Arc::ptr_eq(&set, &snapshot));
    }

    #[test]
    fn unshared_set_is_mutated_in_place() {
        let mut set = Arc::new(IdSet::from([StatementId(1)]));
        let before = Arc::as_ptr(&set);

        assert!(insert_shared(&mut set, StatementId(2)));
        assert!(!remove_shared(&mut set, StatementId(9)));

        assert_eq!(Arc::as_ptr(&set), before);
        assert_eq!(set.len(), 2);
    }
}
