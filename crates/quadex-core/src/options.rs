//! # Store Options
//!
//! Runtime configuration for a [`crate::QuadIndex`] and the graph equality engine.
//!
//! Defaults come from [`crate::primitives`]. [`StoreOptions::from_env`] applies
//! `QUADEX_*` overrides; malformed values are logged and ignored so a bad
//! environment never prevents a store from being built.

use crate::StoreError;
use crate::primitives::{DEFAULT_MAX_BLANK_NODES, ENV_MAX_BLANK_NODES, ENV_VERIFY_INVARIANTS};
use serde::{Deserialize, Serialize};

/// Options shared by the store and the equality engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Ceiling on distinct blank nodes searched by graph equality.
    /// `None` disables the ceiling.
    pub max_blank_nodes: Option<usize>,

    /// Re-check index membership after every mutation, also in release builds.
    pub verify_invariants: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_blank_nodes: Some(DEFAULT_MAX_BLANK_NODES),
            verify_invariants: false,
        }
    }
}

impl StoreOptions {
    /// Defaults with overrides read from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults with overrides read through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(raw) = lookup(ENV_MAX_BLANK_NODES) {
            match Self::parse_max_blank_nodes(&raw) {
                Ok(limit) => options.max_blank_nodes = limit,
                Err(e) => tracing::warn!(error = %e, "ignoring {}", ENV_MAX_BLANK_NODES),
            }
        }

        if let Some(raw) = lookup(ENV_VERIFY_INVARIANTS) {
            match Self::parse_flag(ENV_VERIFY_INVARIANTS, &raw) {
                Ok(flag) => options.verify_invariants = flag,
                Err(e) => tracing::warn!(error = %e, "ignoring {}", ENV_VERIFY_INVARIANTS),
            }
        }

        options
    }

    /// Parse a blank node ceiling. `0` and `none` disable it.
    pub fn parse_max_blank_nodes(raw: &str) -> Result<Option<usize>, StoreError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(0) => Ok(None),
            Ok(limit) => Ok(Some(limit)),
            Err(_) => Err(StoreError::InvalidOption {
                name: ENV_MAX_BLANK_NODES,
                value: raw.to_string(),
            }),
        }
    }

    fn parse_flag(name: &'static str, raw: &str) -> Result<bool, StoreError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(StoreError::InvalidOption {
                name,
                value: raw.to_string(),
            }),
        }
    }

    /// Builder-style setter for the blank node ceiling.
    #[must_use]
    pub fn with_max_blank_nodes(mut self, limit: Option<usize>) -> Self {
        self.max_blank_nodes = limit;
        self
    }

    /// Builder-style setter for invariant verification.
    #[must_use]
    pub fn with_verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let options = StoreOptions::from_lookup(lookup_from(&[]));
        assert_eq!(options, StoreOptions::default());
        assert_eq!(options.max_blank_nodes, Some(DEFAULT_MAX_BLANK_NODES));
    }

    #[test]
    fn overrides_are_applied() {
        let options = StoreOptions::from_lookup(lookup_from(&[
            (ENV_MAX_BLANK_NODES, "12"),
            (ENV_VERIFY_INVARIANTS, "yes"),
        ]));
        assert_eq!(options.max_blank_nodes, Some(12));
        assert!(options.verify_invariants);
    }

    #[test]
    fn zero_or_none_disables_ceiling() {
        assert_eq!(StoreOptions::parse_max_blank_nodes("0").expect("parse"), None);
        assert_eq!(StoreOptions::parse_max_blank_nodes(" None ").expect("parse"), None);
    }

    #[test]
    fn malformed_override_is_ignored() {
        let options = StoreOptions::from_lookup(lookup_from(&[
            (ENV_MAX_BLANK_NODES, "lots"),
            (ENV_VERIFY_INVARIANTS, "maybe"),
        ]));
        assert_eq!(options, StoreOptions::default());
    }

    #[test]
    fn strict_parser_reports_invalid_option() {
        let result = StoreOptions::parse_max_blank_nodes("-3");
        assert!(matches!(
            result,
            Err(StoreError::InvalidOption { name, .. }) if name == ENV_MAX_BLANK_NODES
        ));
    }

    #[test]
    fn deserialize_fills_missing_fields() {
        let options: StoreOptions =
            serde_json::from_str(r#"{"verify_invariants": true}"#).expect("json");
        assert_eq!(options.max_blank_nodes, Some(DEFAULT_MAX_BLANK_NODES));
        assert!(options.verify_invariants);

        let json = serde_json::to_string(&options).expect("serialize");
        let back: StoreOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, options);
    }
}
