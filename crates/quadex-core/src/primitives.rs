//! # Store Primitives
//!
//! Hardcoded constants for the Quadex store.
//!
//! These values are compiled into the binary. Runtime overrides go through
//! [`crate::options::StoreOptions`].

/// Default ceiling on distinct blank nodes considered by graph equality.
///
/// - Matching is worst-case exponential in the number of blank nodes.
/// - Past this count the equality engine reports `BlankNodeLimitExceeded`
///   instead of searching.
pub const DEFAULT_MAX_BLANK_NODES: usize = 4096;

/// Environment variable overriding the blank node ceiling.
///
/// Accepts a positive integer, or `0`/`none` to disable the ceiling.
pub const ENV_MAX_BLANK_NODES: &str = "QUADEX_MAX_BLANK_NODES";

/// Environment variable forcing invariant checks after every mutation.
///
/// Accepts `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`.
pub const ENV_VERIFY_INVARIANTS: &str = "QUADEX_VERIFY_INVARIANTS";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_names_share_prefix() {
        assert!(ENV_MAX_BLANK_NODES.starts_with("QUADEX_"));
        assert!(ENV_VERIFY_INVARIANTS.starts_with("QUADEX_"));
    }

    #[test]
    fn default_ceiling_is_nonzero() {
        assert!(DEFAULT_MAX_BLANK_NODES > 0);
    }
}
