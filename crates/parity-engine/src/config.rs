//! Engine configuration.
//!
//! Everything the walker consults is declared here once, before any compare
//! call: exclusion prefixes, per-field skip markers, collection strategies,
//! and the rule set. The original tag-per-field approach becomes explicit
//! registration keyed by `(record type name, field name)`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::exclude::ExclusionSet;
use crate::rules::{Comparator, RuleSet};

/// How the elements of one collection field are matched before recursion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionStrategy {
    /// Match element `i` against element `i`. `label_field` only affects
    /// path annotations in the report, never matching.
    Positional { label_field: Option<String> },
    /// Match elements by the value of `key_field`, independent of order.
    IdentityKeyed { key_field: String },
}

/// Static configuration for a [`GraphComparer`](crate::GraphComparer).
///
/// Built once, shared across engine instances via `Arc`, never mutated
/// during a comparison.
#[derive(Debug)]
pub struct EngineConfig {
    /// Maximum recursion depth before a branch is abandoned with a
    /// `DepthExceeded` difference.
    pub max_depth: usize,
    exclusions: ExclusionSet,
    skip_fields: HashSet<(String, String)>,
    strategies: HashMap<(String, String), CollectionStrategy>,
    rules: RuleSet,
}

/// Depth guard default, matching the original comparison service.
pub const DEFAULT_MAX_DEPTH: usize = 300;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            exclusions: ExclusionSet::new(),
            skip_fields: HashSet::new(),
            strategies: HashMap::new(),
            rules: RuleSet::new(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the default depth limit and nothing else.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the recursion depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Exclude a subtree from comparison. The prefix is written in
    /// schema-shape form, without indices (`Result.Rooms.Offers.MinStay`).
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.exclusions.add(prefix);
        self
    }

    /// Mark one field of a type as excluded from validation.
    pub fn skip_field(mut self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        self.skip_fields.insert((type_name.into(), field.into()));
        self
    }

    /// Reconcile a collection field by identity key instead of position.
    pub fn keyed(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        key_field: impl Into<String>,
    ) -> Self {
        self.strategies.insert(
            (type_name.into(), field.into()),
            CollectionStrategy::IdentityKeyed {
                key_field: key_field.into(),
            },
        );
        self
    }

    /// Keep positional matching for a collection field but annotate element
    /// paths with the given field's value for readability.
    pub fn labeled(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        self.strategies.insert(
            (type_name.into(), field.into()),
            CollectionStrategy::Positional {
                label_field: Some(label_field.into()),
            },
        );
        self
    }

    /// Register a custom comparator for one field of a type.
    pub fn rule(
        mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        comparator: impl Comparator + 'static,
    ) -> Self {
        self.rules
            .add_field_rule(type_name, field, Arc::new(comparator));
        self
    }

    /// Register a custom comparator for every field of a type.
    pub fn rule_for_type(
        mut self,
        type_name: impl Into<String>,
        comparator: impl Comparator + 'static,
    ) -> Self {
        self.rules.add_type_rule(type_name, Arc::new(comparator));
        self
    }

    /// Check the configuration for empty selectors.
    pub fn validate(&self) -> EngineResult<()> {
        if self.exclusions.has_blank() {
            return Err(EngineError::BlankExclusion);
        }
        for (type_name, field) in &self.skip_fields {
            if type_name.is_empty() {
                return Err(EngineError::EmptyTypeName {
                    context: "skip marker",
                });
            }
            if field.is_empty() {
                return Err(EngineError::EmptyFieldName {
                    type_name: type_name.clone(),
                    context: "skip marker",
                });
            }
        }
        for ((type_name, field), strategy) in &self.strategies {
            if type_name.is_empty() {
                return Err(EngineError::EmptyTypeName {
                    context: "collection strategy",
                });
            }
            if field.is_empty() {
                return Err(EngineError::EmptyFieldName {
                    type_name: type_name.clone(),
                    context: "collection strategy",
                });
            }
            if let CollectionStrategy::IdentityKeyed { key_field } = strategy {
                if key_field.is_empty() {
                    return Err(EngineError::EmptyKeyField {
                        type_name: type_name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        let (blank_type, blank_field) = self.rules.has_blank_selector();
        if blank_type {
            return Err(EngineError::EmptyTypeName { context: "rule" });
        }
        if blank_field {
            return Err(EngineError::EmptyFieldName {
                type_name: String::new(),
                context: "rule",
            });
        }
        Ok(())
    }

    /// The configured exclusion filter.
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// The configured rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns `true` if the field carries an excluded-from-validation marker.
    pub fn is_skipped(&self, type_name: &str, field: &str) -> bool {
        self.skip_fields
            .contains(&(type_name.to_string(), field.to_string()))
    }

    /// The reconciliation strategy configured for a collection field, if any.
    pub fn strategy(&self, type_name: &str, field: &str) -> Option<&CollectionStrategy> {
        self.strategies
            .get(&(type_name.to_string(), field.to_string()))
    }
}
