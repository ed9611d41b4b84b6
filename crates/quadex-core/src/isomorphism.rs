//! # Graph Equality
//!
//! Set equality and subset tests over quad collections, up to blank node
//! renaming.
//!
//! Algorithm:
//! 1. Deduplicate both inputs (order preserved). `equals` fails on a size
//!    mismatch, `is_subset` when the first graph is larger.
//! 2. Every ground statement of A (no blank subject or object) must be in B.
//! 3. The blank-involving statements of A are matched, in order, against
//!    the blank-involving statements of B by a depth-first search that
//!    builds an injective blank node mapping A -> B. Predicates and
//!    contexts compare by value.
//!
//! The search keeps its frames on an explicit stack, so deep graphs never
//! grow the call stack. It is still exponential in the worst case; a
//! [`GraphMatcher`] built from [`StoreOptions`] refuses inputs with more
//! distinct blank nodes than the configured ceiling.

use crate::options::StoreOptions;
use crate::{BlankNode, Quad, StoreError, Term};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Equals,
    Subset,
}

/// Graph comparison with an optional blank node ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphMatcher {
    max_blank_nodes: Option<usize>,
}

impl Default for GraphMatcher {
    fn default() -> Self {
        Self::new(&StoreOptions::default())
    }
}

impl GraphMatcher {
    #[must_use]
    pub fn new(options: &StoreOptions) -> Self {
        Self {
            max_blank_nodes: options.max_blank_nodes,
        }
    }

    /// A matcher without a blank node ceiling.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_blank_nodes: None,
        }
    }

    #[must_use]
    pub const fn max_blank_nodes(&self) -> Option<usize> {
        self.max_blank_nodes
    }

    /// True if `a` and `b` are the same set of statements up to blank node renaming.
    pub fn equals<A, B, QA, QB>(&self, a: A, b: B) -> Result<bool, StoreError>
    where
        A: IntoIterator<Item = QA>,
        B: IntoIterator<Item = QB>,
        QA: Into<Quad>,
        QB: Into<Quad>,
    {
        self.compare(dedupe(a), dedupe(b), Mode::Equals)
    }

    /// True if some renaming of the blank nodes of `a` makes it a subset of `b`.
    pub fn is_subset<A, B, QA, QB>(&self, a: A, b: B) -> Result<bool, StoreError>
    where
        A: IntoIterator<Item = QA>,
        B: IntoIterator<Item = QB>,
        QA: Into<Quad>,
        QB: Into<Quad>,
    {
        self.compare(dedupe(a), dedupe(b), Mode::Subset)
    }

    fn compare(&self, a: Vec<Quad>, b: Vec<Quad>, mode: Mode) -> Result<bool, StoreError> {
        let size_ok = match mode {
            Mode::Equals => a.len() == b.len(),
            Mode::Subset => a.len() <= b.len(),
        };
        if !size_ok {
            tracing::debug!(?mode, left = a.len(), right = b.len(), "graphs differ in size");
            return Ok(false);
        }

        let (pending, ground): (Vec<&Quad>, Vec<&Quad>) = a.iter().partition(|q| q.has_blank_node());
        let b_set: BTreeSet<&Quad> = b.iter().collect();
        if let Some(missing) = ground.iter().find(|q| !b_set.contains(*q)) {
            tracing::debug!(?mode, statement = %missing, "ground statement not matched");
            return Ok(false);
        }

        let found = count_blank_nodes(&pending);
        if let Some(limit) = self.max_blank_nodes {
            if found > limit {
                return Err(StoreError::BlankNodeLimitExceeded { limit, found });
            }
        }

        let targets: Vec<&Quad> = b.iter().filter(|q| q.has_blank_node()).collect();
        let verdict = search(&pending, &targets);
        tracing::debug!(
            ?mode,
            statements = a.len(),
            blank_nodes = found,
            verdict,
            "graph comparison finished"
        );
        Ok(verdict)
    }
}

/// [`GraphMatcher::equals`] without a blank node ceiling.
pub fn equals<A, B, QA, QB>(a: A, b: B) -> bool
where
    A: IntoIterator<Item = QA>,
    B: IntoIterator<Item = QB>,
    QA: Into<Quad>,
    QB: Into<Quad>,
{
    matches!(GraphMatcher::unbounded().equals(a, b), Ok(true))
}

/// [`GraphMatcher::is_subset`] without a blank node ceiling.
pub fn is_subset<A, B, QA, QB>(a: A, b: B) -> bool
where
    A: IntoIterator<Item = QA>,
    B: IntoIterator<Item = QB>,
    QA: Into<Quad>,
    QB: Into<Quad>,
{
    matches!(GraphMatcher::unbounded().is_subset(a, b), Ok(true))
}

fn dedupe<I, Q>(quads: I) -> Vec<Quad>
where
    I: IntoIterator<Item = Q>,
    Q: Into<Quad>,
{
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for quad in quads {
        let quad: Quad = quad.into();
        if seen.insert(quad.clone()) {
            unique.push(quad);
        }
    }
    unique
}

fn count_blank_nodes(quads: &[&Quad]) -> usize {
    quads
        .iter()
        .flat_map(|q| [q.subject.as_blank(), q.object.as_blank()])
        .flatten()
        .collect::<BTreeSet<_>>()
        .len()
}

// =============================================================================
// BLANK NODE MAPPING
// =============================================================================

/// Partial injective mapping from blank nodes of A to blank nodes of B.
#[derive(Debug, Default)]
struct BlankMapping<'q> {
    forward: BTreeMap<&'q BlankNode, &'q BlankNode>,
    targets: BTreeSet<&'q BlankNode>,
}

impl<'q> BlankMapping<'q> {
    /// Could `a` map to `b` without changing existing bindings?
    fn admits(&self, a: &Term, b: &Term) -> bool {
        match (a.as_blank(), b.as_blank()) {
            (Some(x), Some(y)) => match self.forward.get(x) {
                Some(mapped) => *mapped == y,
                None => !self.targets.contains(y),
            },
            (None, None) => a == b,
            _ => false,
        }
    }

    fn bind_term(&mut self, a: &'q Term, b: &'q Term, bound: &mut Vec<&'q BlankNode>) -> bool {
        match (a.as_blank(), b.as_blank()) {
            (Some(x), Some(y)) => match self.forward.get(x) {
                Some(mapped) => *mapped == y,
                None if self.targets.contains(y) => false,
                None => {
                    self.forward.insert(x, y);
                    self.targets.insert(y);
                    bound.push(x);
                    true
                }
            },
            (None, None) => a == b,
            _ => false,
        }
    }

    /// Bind subject then object of `a` to those of `b`. On success, returns
    /// the newly bound blank nodes of `a`; on failure the mapping is unchanged.
    fn bind(&mut self, a: &'q Quad, b: &'q Quad) -> Option<Vec<&'q BlankNode>> {
        let mut bound = Vec::new();
        let ok = self.bind_term(&a.subject, &b.subject, &mut bound)
            && self.bind_term(&a.object, &b.object, &mut bound);
        if ok {
            Some(bound)
        } else {
            self.unbind(&bound);
            None
        }
    }

    fn unbind(&mut self, bound: &[&'q BlankNode]) {
        for x in bound {
            if let Some(y) = self.forward.remove(x) {
                self.targets.remove(y);
            }
        }
    }

    fn candidates(&self, a: &Quad, targets: &[&'q Quad]) -> Vec<usize> {
        targets
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                a.predicate == b.predicate
                    && a.context == b.context
                    && self.admits(&a.subject, &b.subject)
                    && self.admits(&a.object, &b.object)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// One level of the depth-first search: the statement at this depth, the
/// B statements it may map to, and the bindings of the candidate being tried.
struct Frame<'q> {
    candidates: Vec<usize>,
    next: usize,
    bound: Vec<&'q BlankNode>,
}

impl Frame<'_> {
    fn new(candidates: Vec<usize>) -> Self {
        Self {
            candidates,
            next: 0,
            bound: Vec::new(),
        }
    }
}

fn search<'q>(pending: &[&'q Quad], targets: &[&'q Quad]) -> bool {
    let Some(first) = pending.first() else {
        return true;
    };

    let mut mapping = BlankMapping::default();
    let mut stack = vec![Frame::new(mapping.candidates(first, targets))];

    loop {
        let depth = stack.len();
        let Some(frame) = stack.last_mut() else {
            return false;
        };

        // Undo whatever the previous candidate at this depth bound.
        mapping.unbind(&frame.bound);
        frame.bound.clear();

        let Some(&candidate) = frame.candidates.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;

        let statement = pending[depth - 1];
        let Some(bound) = mapping.bind(statement, targets[candidate]) else {
            continue;
        };
        frame.bound = bound;

        match pending.get(depth) {
            None => return true,
            Some(next) => {
                let candidates = mapping.candidates(next, targets);
                stack.push(Frame::new(candidates));
            }
        }
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

    fn quad(s: &Term, p: &Term, o: &Term) -> Quad {
        Quad::new(s.clone(), p.clone(), o.clone())
    }

    #[test]
    fn identical_ground_graphs_are_equal() {
        let g = vec![
            quad(&uri("a"), &uri("p"), &uri("b")),
            quad(&uri("b"), &uri("p"), &Term::literal("x")),
        ];
        assert!(equals(g.clone(), g.iter().rev().cloned().collect::<Vec<_>>()));
    }

    #[test]
    fn ground_mismatch_is_unequal() {
        let a = vec![quad(&uri("a"), &uri("p"), &uri("b"))];
        let b = vec![quad(&uri("a"), &uri("p"), &uri("c"))];
        assert!(!equals(a, b));
    }

    #[test]
    fn blank_renaming_is_equal() {
        let (x, y) = (Term::blank(), Term::blank());
        let (x2, y2) = (Term::blank(), Term::blank());

        let a = vec![
            quad(&x, &uri("knows"), &y),
            quad(&y, &uri("name"), &Term::literal("Y")),
        ];
        let b = vec![
            quad(&y2, &uri("name"), &Term::literal("Y")),
            quad(&x2, &uri("knows"), &y2),
        ];
        assert!(equals(a, b));
    }

    #[test]
    fn duplicates_are_ignored() {
        let a = vec![
            quad(&uri("a"), &uri("p"), &uri("b")),
            quad(&uri("a"), &uri("p"), &uri("b")),
        ];
        let b = vec![quad(&uri("a"), &uri("p"), &uri("b"))];
        assert!(equals(a, b));
    }

    #[test]
    fn subset_of_larger_graph() {
        let g1 = vec![quad(&uri("a"), &uri("p"), &uri("b"))];
        let g2 = vec![
            quad(&uri("a"), &uri("p"), &uri("b")),
            quad(&uri("c"), &uri("p"), &uri("d")),
        ];
        assert!(is_subset(g1.clone(), g2.clone()));
        assert!(!is_subset(g2, g1));
    }

    #[test]
    fn self_loop_does_not_match_two_nodes() {
        let x = Term::blank();
        let (y, z) = (Term::blank(), Term::blank());

        let looped = vec![quad(&x, &uri("p"), &x)];
        let split = vec![quad(&y, &uri("p"), &z)];
        assert!(!equals(looped.clone(), split.clone()));
        assert!(!equals(split, looped));
    }

    #[test]
    fn self_loop_matches_self_loop() {
        let (x, y) = (Term::blank(), Term::blank());
        assert!(equals(
            vec![quad(&x, &uri("p"), &x)],
            vec![quad(&y, &uri("p"), &y)]
        ));
    }

    #[test]
    fn mapping_must_be_injective() {
        let (x, y) = (Term::blank(), Term::blank());
        let z = Term::blank();

        let a = vec![
            quad(&x, &uri("p"), &uri("o")),
            quad(&y, &uri("p"), &uri("o")),
        ];
        let b = vec![
            quad(&z, &uri("p"), &uri("o")),
            quad(&uri("s"), &uri("p"), &uri("o")),
        ];
        assert!(!is_subset(a, b));
    }

    #[test]
    fn backtracks_past_wrong_first_choice() {
        let (x1, x2) = (Term::blank(), Term::blank());
        let (y1, y2) = (Term::blank(), Term::blank());

        // x1 could map to y1 or y2 on the first statement; only y2 works.
        let a = vec![
            quad(&x1, &uri("p"), &uri("o")),
            quad(&x2, &uri("p"), &uri("o")),
            quad(&x1, &uri("q"), &uri("only")),
        ];
        let b = vec![
            quad(&y1, &uri("p"), &uri("o")),
            quad(&y2, &uri("p"), &uri("o")),
            quad(&y2, &uri("q"), &uri("only")),
        ];
        assert!(equals(a, b));
    }

    #[test]
    fn contexts_compare_by_value() {
        let (x, y) = (Term::blank(), Term::blank());
        let a = vec![quad(&x, &uri("p"), &uri("o")).in_context(Some(uri("g1")))];
        let b = vec![quad(&y, &uri("p"), &uri("o")).in_context(Some(uri("g2")))];
        assert!(!equals(a, b));
    }

    #[test]
    fn matcher_follows_store_options() {
        use crate::QuadIndex;

        let options = StoreOptions::default().with_max_blank_nodes(Some(1));
        let mut left = QuadIndex::with_options(options.clone());
        let mut right = QuadIndex::with_options(options);
        let (x, y) = (Term::blank(), Term::blank());
        left.add(&x, &uri("p"), &y, &[]);
        right.add(&Term::blank(), &uri("p"), &Term::blank(), &[]);

        let matcher = GraphMatcher::new(left.options());
        assert_eq!(matcher.max_blank_nodes(), Some(1));
        assert_eq!(
            matcher.equals(left.quads(), right.quads()),
            Err(StoreError::BlankNodeLimitExceeded { limit: 1, found: 2 })
        );
        assert!(equals(left.quads(), right.quads()));
    }

    #[test]
    fn ceiling_reports_limit() {
        let options = StoreOptions::default().with_max_blank_nodes(Some(1));
        let matcher = GraphMatcher::new(&options);
        let (x, y) = (Term::blank(), Term::blank());
        let g = vec![quad(&x, &uri("p"), &y)];

        assert_eq!(
            matcher.equals(g.clone(), g),
            Err(StoreError::BlankNodeLimitExceeded { limit: 1, found: 2 })
        );
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let blanks: Vec<Term> = (0..2_000).map(|_| Term::blank()).collect();
        let renamed: Vec<Term> = (0..2_000).map(|_| Term::blank()).collect();
        let chain = |nodes: &[Term]| -> Vec<Quad> {
            nodes
                .windows(2)
                .map(|w| quad(&w[0], &uri("next"), &w[1]))
                .collect()
        };

        assert!(equals(chain(&blanks), chain(&renamed)));
    }
}
