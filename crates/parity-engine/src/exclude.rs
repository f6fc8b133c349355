//! Path exclusion filter.
//!
//! Exclusion prefixes are written in schema-shape form (no indices, e.g.
//! `Result.Rooms.Offers.MinStay`). The filter normalizes the live traversal
//! path by stripping `[...]` annotations, then matches case-insensitively
//! against each prefix. Exclusion is subtree-scoped: excluding `A.B` also
//! excludes `A.B.C` and everything below it.

use parity_types::path;

/// A set of excluded subtree prefixes.
#[derive(Clone, Debug, Default)]
pub struct ExclusionSet {
    // Stored lowercased; matching is case-insensitive.
    prefixes: Vec<String>,
}

impl ExclusionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exclusion prefix.
    pub fn add(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into().trim().to_ascii_lowercase());
    }

    /// Returns `true` if no prefixes are configured.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Number of configured prefixes.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns `true` if any configured prefix contains only whitespace.
    pub(crate) fn has_blank(&self) -> bool {
        self.prefixes.iter().any(|p| p.is_empty())
    }

    /// Check a live traversal path against the set.
    ///
    /// Must be called before recursing into a field, so excluded subtrees
    /// incur no traversal cost.
    pub fn is_excluded(&self, raw_path: &str) -> bool {
        if self.prefixes.is_empty() {
            return false;
        }
        let normalized = path::normalize(raw_path).to_ascii_lowercase();
        self.prefixes.iter().any(|prefix| {
            normalized == *prefix
                || (normalized.len() > prefix.len()
                    && normalized.starts_with(prefix.as_str())
                    && normalized.as_bytes()[prefix.len()] == b'.')
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(prefixes: &[&str]) -> ExclusionSet {
        let mut s = ExclusionSet::new();
        for p in prefixes {
            s.add(*p);
        }
        s
    }

    #[test]
    fn empty_set_excludes_nothing() {
        let s = ExclusionSet::new();
        assert!(!s.is_excluded("Result.Rooms"));
    }

    #[test]
    fn exact_and_subtree_matches() {
        let s = set(&["Result.Rooms.Offers"]);
        assert!(s.is_excluded("Result.Rooms.Offers"));
        assert!(s.is_excluded("Result.Rooms.Offers.MinStay"));
        assert!(s.is_excluded("Result.Rooms.Offers.Price.Total"));
        assert!(!s.is_excluded("Result.Rooms"));
        // `.` boundary required: prefix must not match a longer sibling name.
        assert!(!s.is_excluded("Result.Rooms.OffersExtra"));
    }

    #[test]
    fn annotations_are_stripped_before_matching() {
        let s = set(&["Result.Rooms.Offers"]);
        assert!(s.is_excluded("Result.Rooms[2].Offers[uuid=abc]"));
        assert!(s.is_excluded("Result.Rooms[0].Offers[3].MinStay"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let s = set(&["Result.Rooms"]);
        assert!(s.is_excluded("result.ROOMS.offers"));
    }
}
