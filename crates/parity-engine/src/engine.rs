//! The graph walker: the recursive engine that owns a single comparison pass.
//!
//! A [`GraphComparer`] holds the static configuration and the shared shape
//! cache, plus the mutable state of the pass in flight (the difference sink).
//! `compare` takes `&mut self`, so the no-concurrent-calls rule is enforced
//! at compile time; run parallel comparisons with one instance each, sharing
//! the `Arc<ShapeCache>`.

use std::sync::Arc;

use parity_types::{path, Difference, Record, Report, Value};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::rules::RuleOutcome;
use crate::shape::ShapeCache;

/// Compares a reference graph and a candidate graph in lockstep.
pub struct GraphComparer {
    config: Arc<EngineConfig>,
    shapes: Arc<ShapeCache>,
    differences: Vec<Difference>,
}

impl GraphComparer {
    /// Create an engine over a shared configuration and shape cache.
    ///
    /// Fails if the configuration carries empty selectors.
    pub fn new(config: Arc<EngineConfig>, shapes: Arc<ShapeCache>) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shapes,
            differences: Vec::new(),
        })
    }

    /// Create an engine with its own private shape cache.
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        Self::new(Arc::new(config), Arc::new(ShapeCache::new()))
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shape cache this engine populates.
    pub fn shapes(&self) -> &Arc<ShapeCache> {
        &self.shapes
    }

    /// Run one comparison pass and return the accumulated differences.
    ///
    /// The session state is reset on entry; the report is a pure function of
    /// the two graphs and the configuration in effect.
    pub fn compare(&mut self, reference: &Value, candidate: &Value) -> Report {
        self.differences.clear();
        debug!(
            reference = reference.kind_name(),
            candidate = candidate.kind_name(),
            "comparison started"
        );
        self.compare_values(reference, candidate, "", 0);
        let differences = std::mem::take(&mut self.differences);
        debug!(count = differences.len(), "comparison finished");
        Report { differences }
    }

    pub(crate) fn push(&mut self, difference: Difference) {
        self.differences.push(difference);
    }

    pub(crate) fn push_mismatch(&mut self, path: &str, reference: &Value, candidate: &Value) {
        self.differences
            .push(Difference::mismatch(path, reference.clone(), candidate.clone()));
    }

    /// Walk two records field by field.
    pub(crate) fn compare_records(
        &mut self,
        reference: &Record,
        candidate: &Record,
        path: &str,
        depth: usize,
    ) {
        if depth > self.config.max_depth {
            self.push(Difference::depth_exceeded(path, self.config.max_depth));
            return;
        }

        let ref_index = self.shapes.index_for(reference);
        let cand_index = self.shapes.index_for(candidate);

        for (field, ref_value) in &reference.fields {
            let current = path::join(path, field);
            if self.config.exclusions().is_excluded(&current) {
                continue;
            }
            if self.config.is_skipped(&reference.type_name, field) {
                continue;
            }

            // A field the candidate schema dropped is always a reportable
            // structural gap.
            let Some(position) = cand_index.position(field) else {
                self.push(Difference::missing_in_candidate(current, ref_value.clone()));
                continue;
            };
            let cand_value = &candidate.fields[position].1;

            if let Some(comparator) = self.config.rules().resolve(&reference.type_name, field) {
                let before = self.differences.len();
                match comparator.compare(ref_value, cand_value, &current, &mut self.differences) {
                    RuleOutcome::Equal => continue,
                    RuleOutcome::Unequal => {
                        if self.differences.len() == before {
                            self.push(Difference::custom_rule_failed(
                                current,
                                ref_value.clone(),
                                cand_value.clone(),
                            ));
                        }
                        continue;
                    }
                    RuleOutcome::NotApplicable => {
                        warn!(
                            rule = comparator.name(),
                            path = %current,
                            "rule not applicable, falling back to default dispatch"
                        );
                    }
                }
            }

            self.compare_field(
                ref_value,
                cand_value,
                &current,
                depth + 1,
                Some((reference.type_name.as_str(), field.as_str())),
            );
        }

        // Candidate-only fields: report structural additions, but not
        // optional-only fields the candidate left at their default.
        for (field, cand_value) in &candidate.fields {
            if ref_index.contains(field) {
                continue;
            }
            let current = path::join(path, field);
            if self.config.exclusions().is_excluded(&current) {
                continue;
            }
            if cand_value.is_default() {
                continue;
            }
            self.push(Difference::missing_in_reference(current, cand_value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_types::DifferenceKind;
    use rust_decimal::Decimal;

    use crate::config::EngineConfig;
    use crate::rules::{AliasedFields, AlwaysEqual, Comparator, RuleOutcome};

    fn engine(config: EngineConfig) -> GraphComparer {
        GraphComparer::with_config(config).unwrap()
    }

    fn default_engine() -> GraphComparer {
        engine(EngineConfig::new())
    }

    fn room(uuid: &str, price: i64) -> Value {
        Value::record(
            "Room",
            [
                ("uuid", Value::from(uuid)),
                ("Price", Value::Int(price)),
            ],
        )
    }

    fn response(rooms: Vec<Value>) -> Value {
        Value::record("Response", [("Rooms", Value::Sequence(rooms))])
    }

    #[test]
    fn equivalent_graphs_produce_empty_report() {
        let reference = response(vec![room("a", 100), room("b", 90)]);
        let candidate = reference.clone();
        let report = default_engine().compare(&reference, &candidate);
        assert!(report.is_match(), "unexpected differences: {:?}", report.differences);
    }

    #[test]
    fn null_pair_is_equal_and_one_sided_null_mismatches() {
        let mut engine = default_engine();
        assert!(engine.compare(&Value::Null, &Value::Null).is_match());

        let report = engine.compare(&Value::Null, &Value::Int(1));
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DifferenceKind::ValueMismatch);
        assert_eq!(report.differences[0].path, "");

        let report = engine.compare(&Value::Int(1), &Value::Null);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DifferenceKind::ValueMismatch);
    }

    #[test]
    fn field_mismatch_reports_dotted_path() {
        let reference = response(vec![room("a", 100)]);
        let candidate = response(vec![room("a", 95)]);
        let report = default_engine().compare(&reference, &candidate);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].path, "Rooms[uuid=a].Price");
        assert_eq!(report.differences[0].kind, DifferenceKind::ValueMismatch);
    }

    #[test]
    fn dropped_field_is_missing_in_candidate() {
        let reference = Value::record("R", [("Kept", Value::Int(1)), ("Dropped", Value::Int(2))]);
        let candidate = Value::record("R2", [("Kept", Value::Int(1))]);
        let report = default_engine().compare(&reference, &candidate);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].path, "Dropped");
        assert_eq!(report.differences[0].kind, DifferenceKind::MissingInCandidate);
    }

    #[test]
    fn candidate_only_field_suppressed_when_default() {
        let reference = Value::record("R", [("Kept", Value::Int(1))]);
        let candidate = Value::record(
            "R2",
            [
                ("Kept", Value::Int(1)),
                ("NewOptional", Value::Null),
                ("NewEmpty", Value::Sequence(Vec::new())),
                ("NewReal", Value::Int(7)),
            ],
        );
        let report = default_engine().compare(&reference, &candidate);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].path, "NewReal");
        assert_eq!(report.differences[0].kind, DifferenceKind::MissingInReference);
    }

    #[test]
    fn excluded_subtree_reports_nothing() {
        let reference = Value::record(
            "R",
            [(
                "Cache",
                Value::record("Cache", [("SetName", Value::from("x"))]),
            )],
        );
        let candidate = Value::record(
            "R2",
            [(
                "Cache",
                Value::record("Cache", [("SetName", Value::from("y"))]),
            )],
        );
        let report = engine(EngineConfig::new().exclude("Cache")).compare(&reference, &candidate);
        assert!(report.is_match());

        // Deeper prefix: only the subtree under it is silenced.
        let report = engine(EngineConfig::new().exclude("Cache.SetName"))
            .compare(&reference, &candidate);
        assert!(report.is_match());
    }

    #[test]
    fn exclusion_also_silences_candidate_only_pass() {
        let reference = Value::record("R", [("Kept", Value::Int(1))]);
        let candidate = Value::record("R2", [("Kept", Value::Int(1)), ("New", Value::Int(2))]);
        let report = engine(EngineConfig::new().exclude("New")).compare(&reference, &candidate);
        assert!(report.is_match());
    }

    #[test]
    fn skip_marker_bypasses_field() {
        let reference = Value::record("R", [("Volatile", Value::Int(1))]);
        let candidate = Value::record("R2", [("Volatile", Value::Int(999))]);
        let report =
            engine(EngineConfig::new().skip_field("R", "Volatile")).compare(&reference, &candidate);
        assert!(report.is_match());
    }

    #[test]
    fn custom_rule_preempts_default_dispatch() {
        // Without the rule the two AfterDiscount records produce default
        // differences; with it, only the rule's own record appears.
        let reference = Value::record(
            "Price",
            [
                ("Total", Value::Decimal(Decimal::new(10000, 2))),
                (
                    "AfterDiscount",
                    Value::record(
                        "AfterDiscount",
                        [("Total", Value::Decimal(Decimal::new(9000, 2)))],
                    ),
                ),
            ],
        );
        let candidate = Value::record(
            "Price",
            [
                ("Total", Value::Decimal(Decimal::new(10000, 2))),
                (
                    "AfterDiscount",
                    Value::record(
                        "AfterDiscount",
                        [("AfterTax", Value::Decimal(Decimal::new(8500, 2)))],
                    ),
                ),
            ],
        );

        let config = EngineConfig::new().rule(
            "Price",
            "AfterDiscount",
            AliasedFields::new([("Total", "AfterTax")]),
        );
        let report = engine(config).compare(&reference, &candidate);

        assert_eq!(report.len(), 1, "differences: {:?}", report.differences);
        assert_eq!(report.differences[0].path, "AfterDiscount.Total");
        assert_eq!(report.differences[0].kind, DifferenceKind::ValueMismatch);
        assert_eq!(
            report.differences[0].expected,
            Some(Value::Decimal(Decimal::new(9000, 2)))
        );
        assert_eq!(
            report.differences[0].actual,
            Some(Value::Decimal(Decimal::new(8500, 2)))
        );
    }

    #[test]
    fn type_wide_rule_applies_to_every_field() {
        let reference = Value::record("Noise", [("A", Value::Int(1)), ("B", Value::Int(2))]);
        let candidate = Value::record("Noise", [("A", Value::Int(9)), ("B", Value::Int(8))]);
        let report = engine(EngineConfig::new().rule_for_type("Noise", AlwaysEqual))
            .compare(&reference, &candidate);
        assert!(report.is_match());
    }

    #[test]
    fn silent_unequal_rule_yields_custom_rule_failed() {
        struct SilentUnequal;
        impl Comparator for SilentUnequal {
            fn name(&self) -> &'static str {
                "silent-unequal"
            }
            fn compare(
                &self,
                _: &Value,
                _: &Value,
                _: &str,
                _: &mut Vec<Difference>,
            ) -> RuleOutcome {
                RuleOutcome::Unequal
            }
        }

        let reference = Value::record("R", [("F", Value::Int(1))]);
        let candidate = Value::record("R", [("F", Value::Int(2))]);
        let report =
            engine(EngineConfig::new().rule("R", "F", SilentUnequal)).compare(&reference, &candidate);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DifferenceKind::CustomRuleFailed);
        assert_eq!(report.differences[0].path, "F");
    }

    #[test]
    fn inapplicable_rule_falls_back_to_default_dispatch() {
        // AliasedFields on a scalar field declines; default dispatch still
        // catches the mismatch.
        let reference = Value::record("R", [("F", Value::Int(1))]);
        let candidate = Value::record("R", [("F", Value::Int(2))]);
        let config =
            EngineConfig::new().rule("R", "F", AliasedFields::new([("Total", "AfterTax")]));
        let report = engine(config).compare(&reference, &candidate);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DifferenceKind::ValueMismatch);
        assert_eq!(report.differences[0].path, "F");
    }

    #[test]
    fn depth_guard_emits_one_difference_and_terminates() {
        fn chain(depth: usize) -> Value {
            let mut value = Value::Int(1);
            for _ in 0..depth {
                value = Value::record("Node", [("Next", value)]);
            }
            value
        }

        let reference = chain(40);
        let candidate = chain(40);
        let report = engine(EngineConfig::new().with_max_depth(10)).compare(&reference, &candidate);
        assert_eq!(report.len(), 1);
        assert_eq!(report.differences[0].kind, DifferenceKind::DepthExceeded);
        assert_eq!(report.count_of(DifferenceKind::DepthExceeded), 1);
    }

    #[test]
    fn sessions_do_not_leak_between_calls() {
        let mut engine = default_engine();
        let report = engine.compare(&Value::Int(1), &Value::Int(2));
        assert_eq!(report.len(), 1);

        let report = engine.compare(&Value::Int(1), &Value::Int(1));
        assert!(report.is_match());
    }

    #[test]
    fn shared_shape_cache_is_populated_once() {
        let config = Arc::new(EngineConfig::new());
        let shapes = Arc::new(ShapeCache::new());
        let reference = response(vec![room("a", 1)]);
        let candidate = response(vec![room("a", 1)]);

        let mut first = GraphComparer::new(Arc::clone(&config), Arc::clone(&shapes)).unwrap();
        assert!(first.compare(&reference, &candidate).is_match());
        let populated = shapes.len();
        assert!(populated >= 2); // Response + Room

        let mut second = GraphComparer::new(config, Arc::clone(&shapes)).unwrap();
        assert!(second.compare(&reference, &candidate).is_match());
        assert_eq!(shapes.len(), populated);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = EngineConfig::new().keyed("R", "Items", "");
        assert!(GraphComparer::with_config(config).is_err());
    }
}
