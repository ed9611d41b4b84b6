//! # quadex-core
//!
//! An in-memory quad store for RDF-style graphs.
//!
//! Statements are (subject, predicate, object, context) quads over URIs,
//! blank nodes and literals. The crate provides:
//! - a value identity table that gives every distinct term one shared node
//! - a quad index cross-referencing each statement from its four nodes
//! - wildcard pattern matching that scans the smallest candidate set
//! - live filtered views and projections that read and write through to
//!   the store
//! - graph equality and subset tests up to blank node renaming
//!
//! ## Architectural Constraints
//!
//! - Single-threaded, purely in memory; no persistence and no query language.
//! - Deterministic: every iteration follows insertion order.
//! - Terms arrive already parsed. Blank nodes are equal only to themselves.
//!
//! ```
//! use quadex_core::{Pattern, QuadIndex, Term};
//!
//! let mut store = QuadIndex::new();
//! let (alice, knows, bob) = (
//!     Term::uri("http://ex/alice"),
//!     Term::uri("http://ex/knows"),
//!     Term::uri("http://ex/bob"),
//! );
//! store.add(&alice, &knows, &bob, &[]);
//!
//! let view = store.filter(Pattern::any().with_subject(alice.clone()));
//! assert_eq!(view.objects().to_vec(), vec![bob]);
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod index;
pub mod isomorphism;
pub mod node_table;
pub mod options;
pub mod pattern;
pub mod primitives;
pub mod types;
pub mod view;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BlankNode, Context, Literal, NodeId, Position, Quad, QuadRef, StatementId, StoreError, Term,
    Uri,
};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use index::{Cursor, Matches, QuadIndex, Statement};
pub use isomorphism::{GraphMatcher, equals, is_subset};
pub use node_table::{GraphNode, NO_CONTEXT, NodeTable};
pub use options::StoreOptions;
pub use pattern::{ContextFilter, Pattern};
pub use view::{ContextSet, Filtered, TermSet, View};
