//! # Patterns
//!
//! Wildcard patterns over quads, shared by the quad index and every view.
//!
//! A [`Pattern`] fixes zero or more of subject, predicate and object, and
//! restricts contexts through a [`ContextFilter`]:
//!
//! | filter            | matches                                   |
//! |-------------------|-------------------------------------------|
//! | `Any`             | every context, including no context       |
//! | `In(vec![])`      | only statements with no context           |
//! | `In(vec![c, ..])` | statements whose context is one of the list |
//!
//! `None` inside an `In` list is the no-context sentinel.

use crate::{Context, Position, QuadRef, Term};

// =============================================================================
// CONTEXT FILTER
// =============================================================================

/// Context restriction of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContextFilter {
    /// Match any context, including no context.
    #[default]
    Any,
    /// Match statements whose context is in the list. An empty list matches
    /// only statements without a context.
    In(Vec<Context>),
}

impl ContextFilter {
    /// Only statements without a context.
    #[must_use]
    pub fn no_context() -> Self {
        Self::In(Vec::new())
    }

    /// Only statements in `context`.
    #[must_use]
    pub fn only(context: Context) -> Self {
        Self::In(vec![context])
    }

    /// Wildcard semantics of a context argument list: empty means any.
    #[must_use]
    pub fn from_contexts(contexts: &[Context]) -> Self {
        if contexts.is_empty() {
            Self::Any
        } else {
            Self::In(contexts.to_vec())
        }
    }

    /// The accepted contexts, with the empty list spelled out as no context.
    /// `None` for `Any`.
    #[must_use]
    pub fn accepted(&self) -> Option<Vec<Option<&Term>>> {
        match self {
            Self::Any => None,
            Self::In(list) if list.is_empty() => Some(vec![None]),
            Self::In(list) => {
                let mut accepted: Vec<Option<&Term>> = Vec::with_capacity(list.len());
                for context in list {
                    if !accepted.contains(&context.as_ref()) {
                        accepted.push(context.as_ref());
                    }
                }
                Some(accepted)
            }
        }
    }

    /// Contexts an `add` through a view with this filter should default to.
    #[must_use]
    pub fn defaults_for_add(&self) -> Vec<Context> {
        match self.accepted() {
            None => vec![None],
            Some(list) => list.into_iter().map(|c| c.cloned()).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, context: Option<&Term>) -> bool {
        match self {
            Self::Any => true,
            Self::In(list) if list.is_empty() => context.is_none(),
            Self::In(list) => list.iter().any(|c| c.as_ref() == context),
        }
    }

    /// Contexts matched by both filters. `None` when they are disjoint.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self.accepted(), other.accepted()) {
            (None, None) => Some(Self::Any),
            (None, Some(_)) => Some(other.clone()),
            (Some(_), None) => Some(self.clone()),
            (Some(mine), Some(theirs)) => {
                let common: Vec<Context> = mine
                    .into_iter()
                    .filter(|c| theirs.contains(c))
                    .map(|c| c.cloned())
                    .collect();
                if common.is_empty() {
                    None
                } else {
                    Some(Self::In(common))
                }
            }
        }
    }
}

// =============================================================================
// PATTERN
// =============================================================================

/// A quad pattern. Unset components are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    pub contexts: ContextFilter,
}

impl Pattern {
    /// The all-wildcard pattern.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Pattern from optional subject, predicate and object; any context.
    #[must_use]
    pub fn spo(subject: Option<&Term>, predicate: Option<&Term>, object: Option<&Term>) -> Self {
        Self {
            subject: subject.cloned(),
            predicate: predicate.cloned(),
            object: object.cloned(),
            contexts: ContextFilter::Any,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<Term>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<Term>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    #[must_use]
    pub fn with_contexts(mut self, contexts: ContextFilter) -> Self {
        self.contexts = contexts;
        self
    }

    /// Restrict to a single context (`None` for no context).
    #[must_use]
    pub fn in_context(self, context: Context) -> Self {
        self.with_contexts(ContextFilter::only(context))
    }

    /// The fixed term at a subject, predicate or object position.
    /// Always `None` for [`Position::Context`].
    #[must_use]
    pub fn term(&self, position: Position) -> Option<&Term> {
        match position {
            Position::Subject => self.subject.as_ref(),
            Position::Predicate => self.predicate.as_ref(),
            Position::Object => self.object.as_ref(),
            Position::Context => None,
        }
    }

    /// True if subject, predicate and object are all unset and any context matches.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none()
            && self.predicate.is_none()
            && self.object.is_none()
            && self.contexts == ContextFilter::Any
    }

    #[must_use]
    pub fn matches(&self, quad: &QuadRef<'_>) -> bool {
        fixed_matches(self.subject.as_ref(), quad.subject)
            && fixed_matches(self.predicate.as_ref(), quad.predicate)
            && fixed_matches(self.object.as_ref(), quad.object)
            && self.contexts.matches(quad.context)
    }

    /// Quads matched by both patterns. `None` when provably disjoint.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Some(Self {
            subject: intersect_fixed(self.subject.as_ref(), other.subject.as_ref())?,
            predicate: intersect_fixed(self.predicate.as_ref(), other.predicate.as_ref())?,
            object: intersect_fixed(self.object.as_ref(), other.object.as_ref())?,
            contexts: self.contexts.intersect(&other.contexts)?,
        })
    }

    /// This pattern further restricted to `term` at a subject, predicate or
    /// object position. `None` when the pattern already fixes another term there.
    #[must_use]
    pub fn restrict_term(&self, position: Position, term: &Term) -> Option<Self> {
        let mut restricted = self.clone();
        let slot = match position {
            Position::Subject => &mut restricted.subject,
            Position::Predicate => &mut restricted.predicate,
            Position::Object => &mut restricted.object,
            Position::Context => return self.restrict_context(Some(term)),
        };
        *slot = intersect_fixed(slot.as_ref(), Some(term))?;
        Some(restricted)
    }

    /// This pattern further restricted to one context.
    #[must_use]
    pub fn restrict_context(&self, context: Option<&Term>) -> Option<Self> {
        let contexts = self
            .contexts
            .intersect(&ContextFilter::only(context.cloned()))?;
        Some(Self {
            contexts,
            ..self.clone()
        })
    }
}

fn fixed_matches(fixed: Option<&Term>, term: &Term) -> bool {
    fixed.is_none_or(|f| f == term)
}

/// `Some(merged)` when compatible, `None` when both are fixed and differ.
fn intersect_fixed(a: Option<&Term>, b: Option<&Term>) -> Option<Option<Term>> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => None,
        (Some(x), _) | (None, Some(x)) => Some(Some(x.clone())),
        (None, None) => Some(None),
    }
}

// =============================================================================
// TESTS
// =============================================================================
