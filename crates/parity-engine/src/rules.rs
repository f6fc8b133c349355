//! Comparison rule registry and built-in comparators.
//!
//! A [`Comparator`] fully replaces default dispatch for the `(type, field)`
//! pairs it is registered on: it alone decides equality and alone emits
//! differences for that path. Rules express the known, intentional deviations
//! between the two schema generations -- renamed fields, monetary tolerances,
//! order-insensitive lists -- so only genuine regressions surface.

use std::fmt;
use std::sync::Arc;

use chrono::Duration as TimeDelta;
use parity_types::{Difference, Value};
use rust_decimal::Decimal;

/// What a comparator decided about one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The values are equivalent; nothing more to do for this path.
    Equal,
    /// The values deviate. The comparator should have emitted differences;
    /// if it did not, the walker records one `CustomRuleFailed`.
    Unequal,
    /// The comparator cannot judge these values (wrong shapes). The walker
    /// falls back to default dispatch for this field.
    NotApplicable,
}

/// A pluggable equality rule for one field or one whole type.
///
/// Implementations must handle null/null and null/non-null combinations
/// themselves; the walker does not pre-filter nulls before a rule runs.
pub trait Comparator: Send + Sync {
    /// Short name used in log lines when a rule declines to apply.
    fn name(&self) -> &'static str;

    /// Decide equality for one path, appending any differences to `sink`.
    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome;
}

/// Shared null handling for built-in comparators: both null is equal, one
/// null is a recorded mismatch, otherwise the comparator proceeds.
fn check_nulls(
    reference: &Value,
    candidate: &Value,
    path: &str,
    sink: &mut Vec<Difference>,
) -> Option<RuleOutcome> {
    match (reference, candidate) {
        (Value::Null, Value::Null) => Some(RuleOutcome::Equal),
        (Value::Null, _) | (_, Value::Null) => {
            sink.push(Difference::mismatch(path, reference.clone(), candidate.clone()));
            Some(RuleOutcome::Unequal)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

struct Rule {
    type_name: String,
    field: Option<String>,
    comparator: Arc<dyn Comparator>,
}

/// Registered comparison rules with two-level resolution.
///
/// Resolution precedence: exact `(type, field)` match, then field-agnostic
/// `(type, *)` match, else `None` and default dispatch applies. Registration
/// is a static configuration step performed before any compare call.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule for one field of a type.
    pub fn add_field_rule(
        &mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        comparator: Arc<dyn Comparator>,
    ) {
        self.rules.push(Rule {
            type_name: type_name.into(),
            field: Some(field.into()),
            comparator,
        });
    }

    /// Register a rule for every field of a type.
    pub fn add_type_rule(&mut self, type_name: impl Into<String>, comparator: Arc<dyn Comparator>) {
        self.rules.push(Rule {
            type_name: type_name.into(),
            field: None,
            comparator,
        });
    }

    /// Resolve the comparator for a `(type, field)` pair, if any.
    pub fn resolve(&self, type_name: &str, field: &str) -> Option<Arc<dyn Comparator>> {
        self.rules
            .iter()
            .find(|r| r.type_name == type_name && r.field.as_deref() == Some(field))
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|r| r.type_name == type_name && r.field.is_none())
            })
            .map(|r| Arc::clone(&r.comparator))
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule was registered with an empty type or field selector.
    pub(crate) fn has_blank_selector(&self) -> (bool, bool) {
        let blank_type = self.rules.iter().any(|r| r.type_name.is_empty());
        let blank_field = self
            .rules
            .iter()
            .any(|r| r.field.as_deref() == Some(""));
        (blank_type, blank_field)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for rule in &self.rules {
            match &rule.field {
                Some(field) => list.entry(&format_args!(
                    "{}.{} -> {}",
                    rule.type_name,
                    field,
                    rule.comparator.name()
                )),
                None => list.entry(&format_args!(
                    "{}.* -> {}",
                    rule.type_name,
                    rule.comparator.name()
                )),
            };
        }
        list.finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in comparators
// ---------------------------------------------------------------------------

/// Considers every pair of values equal. Registering it on a field is the
/// rule-level way to silence that field.
pub struct AlwaysEqual;

impl Comparator for AlwaysEqual {
    fn name(&self) -> &'static str {
        "always-equal"
    }

    fn compare(&self, _: &Value, _: &Value, _: &str, _: &mut Vec<Difference>) -> RuleOutcome {
        RuleOutcome::Equal
    }
}

/// Equal whenever either side is null; otherwise strict equality.
pub struct IgnoreNull;

impl Comparator for IgnoreNull {
    fn name(&self) -> &'static str {
        "ignore-null"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if matches!(reference, Value::Null) || matches!(candidate, Value::Null) {
            return RuleOutcome::Equal;
        }
        if reference == candidate {
            RuleOutcome::Equal
        } else {
            sink.push(Difference::mismatch(path, reference.clone(), candidate.clone()));
            RuleOutcome::Unequal
        }
    }
}

/// Case-insensitive text comparison; both sides are stringified first.
pub struct CaseInsensitiveText;

impl Comparator for CaseInsensitiveText {
    fn name(&self) -> &'static str {
        "case-insensitive-text"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if let Some(outcome) = check_nulls(reference, candidate, path, sink) {
            return outcome;
        }
        if reference.to_string().eq_ignore_ascii_case(&candidate.to_string()) {
            RuleOutcome::Equal
        } else {
            sink.push(Difference::mismatch(path, reference.clone(), candidate.clone()));
            RuleOutcome::Unequal
        }
    }
}

/// Compares instants by calendar date only, dropping the time component.
pub struct DateOnly;

impl DateOnly {
    fn date_of(value: &Value) -> Option<chrono::NaiveDate> {
        match value {
            Value::Instant(t) => Some(t.date_naive()),
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl Comparator for DateOnly {
    fn name(&self) -> &'static str {
        "date-only"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if let Some(outcome) = check_nulls(reference, candidate, path, sink) {
            return outcome;
        }
        let (Some(ref_date), Some(cand_date)) =
            (Self::date_of(reference), Self::date_of(candidate))
        else {
            return RuleOutcome::NotApplicable;
        };
        if ref_date == cand_date {
            RuleOutcome::Equal
        } else {
            sink.push(Difference::mismatch(
                path,
                Value::Date(ref_date),
                Value::Date(cand_date),
            ));
            RuleOutcome::Unequal
        }
    }
}

/// Numeric comparison within an absolute tolerance, after widening both
/// sides to decimals.
pub struct DecimalTolerance {
    tolerance: Decimal,
}

impl DecimalTolerance {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }
}

impl Comparator for DecimalTolerance {
    fn name(&self) -> &'static str {
        "decimal-tolerance"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if let Some(outcome) = check_nulls(reference, candidate, path, sink) {
            return outcome;
        }
        let (Some(ref_dec), Some(cand_dec)) = (reference.as_decimal(), candidate.as_decimal())
        else {
            return RuleOutcome::NotApplicable;
        };
        if (ref_dec - cand_dec).abs() <= self.tolerance {
            RuleOutcome::Equal
        } else {
            sink.push(Difference::mismatch(
                path,
                Value::Decimal(ref_dec),
                Value::Decimal(cand_dec),
            ));
            RuleOutcome::Unequal
        }
    }
}

/// Instant comparison within an absolute tolerance.
pub struct InstantTolerance {
    tolerance: TimeDelta,
}

impl InstantTolerance {
    pub fn new(tolerance: TimeDelta) -> Self {
        Self { tolerance }
    }

    pub fn seconds(seconds: i64) -> Self {
        Self::new(TimeDelta::seconds(seconds))
    }
}

impl Comparator for InstantTolerance {
    fn name(&self) -> &'static str {
        "instant-tolerance"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if let Some(outcome) = check_nulls(reference, candidate, path, sink) {
            return outcome;
        }
        let (Value::Instant(ref_instant), Value::Instant(cand_instant)) = (reference, candidate)
        else {
            return RuleOutcome::NotApplicable;
        };
        let delta = (*ref_instant - *cand_instant).abs();
        if delta <= self.tolerance {
            RuleOutcome::Equal
        } else {
            sink.push(Difference::mismatch(path, reference.clone(), candidate.clone()));
            RuleOutcome::Unequal
        }
    }
}

/// Multiset comparison for sequences: element order is ignored, counts are
/// not.
pub struct UnorderedSequence;

impl Comparator for UnorderedSequence {
    fn name(&self) -> &'static str {
        "unordered-sequence"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if let Some(outcome) = check_nulls(reference, candidate, path, sink) {
            return outcome;
        }
        let (Value::Sequence(ref_items), Value::Sequence(cand_items)) = (reference, candidate)
        else {
            return RuleOutcome::NotApplicable;
        };
        if ref_items.len() != cand_items.len() {
            sink.push(Difference::count_mismatch(
                parity_types::path::join(path, "Count"),
                ref_items.len(),
                cand_items.len(),
            ));
            return RuleOutcome::Unequal;
        }
        let mut remaining: Vec<&Value> = cand_items.iter().collect();
        let mut outcome = RuleOutcome::Equal;
        for item in ref_items {
            match remaining.iter().position(|cand| *cand == item) {
                Some(i) => {
                    remaining.swap_remove(i);
                }
                None => {
                    sink.push(Difference::new(
                        path,
                        Some(item.clone()),
                        None,
                        parity_types::DifferenceKind::ValueMismatch,
                    ));
                    outcome = RuleOutcome::Unequal;
                }
            }
        }
        outcome
    }
}

/// Serializes both sides to JSON and compares the rendered text. A blunt
/// instrument for opaque subtrees where structural walking adds no value.
pub struct CanonicalJson;

impl Comparator for CanonicalJson {
    fn name(&self) -> &'static str {
        "canonical-json"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        let (Ok(ref_json), Ok(cand_json)) = (
            serde_json::to_string(reference),
            serde_json::to_string(candidate),
        ) else {
            return RuleOutcome::NotApplicable;
        };
        if ref_json == cand_json {
            RuleOutcome::Equal
        } else {
            sink.push(Difference::mismatch(
                path,
                Value::Text(ref_json),
                Value::Text(cand_json),
            ));
            RuleOutcome::Unequal
        }
    }
}

/// Maps renamed scalar fields between the two record shapes.
///
/// Each `(reference_field, candidate_field)` pair is compared as a leaf;
/// differences are reported at the reference field's path, so reports stay
/// phrased in the reference schema's vocabulary.
pub struct AliasedFields {
    pairs: Vec<(String, String)>,
}

impl AliasedFields {
    pub fn new<R, C, I>(pairs: I) -> Self
    where
        R: Into<String>,
        C: Into<String>,
        I: IntoIterator<Item = (R, C)>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(r, c)| (r.into(), c.into()))
                .collect(),
        }
    }

    fn leaf_equal(reference: &Value, candidate: &Value) -> bool {
        if reference == candidate {
            return true;
        }
        match (reference.as_decimal(), candidate.as_decimal()) {
            (Some(r), Some(c)) => r == c,
            _ => false,
        }
    }
}

impl Comparator for AliasedFields {
    fn name(&self) -> &'static str {
        "aliased-fields"
    }

    fn compare(
        &self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        sink: &mut Vec<Difference>,
    ) -> RuleOutcome {
        if let Some(outcome) = check_nulls(reference, candidate, path, sink) {
            return outcome;
        }
        let (Value::Record(ref_rec), Value::Record(cand_rec)) = (reference, candidate) else {
            return RuleOutcome::NotApplicable;
        };
        let mut outcome = RuleOutcome::Equal;
        for (ref_field, cand_field) in &self.pairs {
            let field_path = parity_types::path::join(path, ref_field);
            match (ref_rec.field(ref_field), cand_rec.field(cand_field)) {
                (None, None) => {}
                (Some(ref_value), None) => {
                    sink.push(Difference::missing_in_candidate(field_path, ref_value.clone()));
                    outcome = RuleOutcome::Unequal;
                }
                (None, Some(cand_value)) => {
                    sink.push(Difference::missing_in_reference(field_path, cand_value.clone()));
                    outcome = RuleOutcome::Unequal;
                }
                (Some(ref_value), Some(cand_value)) => {
                    if !Self::leaf_equal(ref_value, cand_value) {
                        sink.push(Difference::mismatch(
                            field_path,
                            ref_value.clone(),
                            cand_value.clone(),
                        ));
                        outcome = RuleOutcome::Unequal;
                    }
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sink() -> Vec<Difference> {
        Vec::new()
    }

    #[test]
    fn resolution_prefers_exact_field_match() {
        let mut rules = RuleSet::new();
        rules.add_type_rule("Price", Arc::new(AlwaysEqual));
        rules.add_field_rule("Price", "Total", Arc::new(IgnoreNull));

        let exact = rules.resolve("Price", "Total").unwrap();
        assert_eq!(exact.name(), "ignore-null");

        let type_wide = rules.resolve("Price", "PerTick").unwrap();
        assert_eq!(type_wide.name(), "always-equal");

        assert!(rules.resolve("Room", "Total").is_none());
    }

    #[test]
    fn always_equal_never_emits() {
        let mut diffs = sink();
        let outcome = AlwaysEqual.compare(&Value::Int(1), &Value::Int(2), "A", &mut diffs);
        assert_eq!(outcome, RuleOutcome::Equal);
        assert!(diffs.is_empty());
    }

    #[test]
    fn ignore_null_swallows_one_sided_nulls() {
        let mut diffs = sink();
        assert_eq!(
            IgnoreNull.compare(&Value::Null, &Value::Int(2), "A", &mut diffs),
            RuleOutcome::Equal
        );
        assert_eq!(
            IgnoreNull.compare(&Value::Int(1), &Value::Int(2), "A", &mut diffs),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn case_insensitive_text_unifies_symbol_and_text() {
        let mut diffs = sink();
        let outcome = CaseInsensitiveText.compare(
            &Value::symbol("CONFIRMED"),
            &Value::Text("confirmed".into()),
            "Status",
            &mut diffs,
        );
        assert_eq!(outcome, RuleOutcome::Equal);
        assert!(diffs.is_empty());
    }

    #[test]
    fn date_only_drops_time_component() {
        let morning = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 5, 1, 22, 30, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();

        let mut diffs = sink();
        assert_eq!(
            DateOnly.compare(
                &Value::Instant(morning),
                &Value::Instant(evening),
                "From",
                &mut diffs
            ),
            RuleOutcome::Equal
        );
        assert_eq!(
            DateOnly.compare(
                &Value::Instant(morning),
                &Value::Instant(next_day),
                "From",
                &mut diffs
            ),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);

        // Non-date input declines instead of misjudging.
        assert_eq!(
            DateOnly.compare(&Value::Int(1), &Value::Int(1), "From", &mut sink()),
            RuleOutcome::NotApplicable
        );
    }

    #[test]
    fn decimal_tolerance_widens_representations() {
        let rule = DecimalTolerance::new(Decimal::new(1, 2)); // 0.01
        let mut diffs = sink();
        assert_eq!(
            rule.compare(
                &Value::Decimal(Decimal::new(10000, 2)),
                &Value::Int(100),
                "Total",
                &mut diffs
            ),
            RuleOutcome::Equal
        );
        assert_eq!(
            rule.compare(
                &Value::Decimal(Decimal::new(10000, 2)),
                &Value::Decimal(Decimal::new(10002, 2)),
                "Total",
                &mut diffs
            ),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn instant_tolerance_allows_clock_skew() {
        let rule = InstantTolerance::seconds(5);
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let close = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 4).unwrap();
        let far = Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap();

        let mut diffs = sink();
        assert_eq!(
            rule.compare(&Value::Instant(base), &Value::Instant(close), "At", &mut diffs),
            RuleOutcome::Equal
        );
        assert_eq!(
            rule.compare(&Value::Instant(base), &Value::Instant(far), "At", &mut diffs),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn unordered_sequence_ignores_order_not_counts() {
        let forward = Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let reversed = Value::Sequence(vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
        let short = Value::Sequence(vec![Value::Int(1), Value::Int(2)]);

        let mut diffs = sink();
        assert_eq!(
            UnorderedSequence.compare(&forward, &reversed, "Tags", &mut diffs),
            RuleOutcome::Equal
        );
        assert!(diffs.is_empty());

        assert_eq!(
            UnorderedSequence.compare(&forward, &short, "Tags", &mut diffs),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, parity_types::DifferenceKind::CountMismatch);
    }

    #[test]
    fn unordered_sequence_respects_multiplicity() {
        let doubled = Value::Sequence(vec![Value::Int(1), Value::Int(1)]);
        let mixed = Value::Sequence(vec![Value::Int(1), Value::Int(2)]);

        let mut diffs = sink();
        assert_eq!(
            UnorderedSequence.compare(&doubled, &mixed, "Tags", &mut diffs),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn canonical_json_compares_rendered_text() {
        let a = Value::record("Blob", [("x", Value::Int(1))]);
        let b = Value::record("OtherBlob", [("x", Value::Int(1))]);
        let c = Value::record("Blob", [("x", Value::Int(2))]);

        let mut diffs = sink();
        // Type names do not survive serialization; same shape means equal.
        assert_eq!(
            CanonicalJson.compare(&a, &b, "Extra", &mut diffs),
            RuleOutcome::Equal
        );
        assert_eq!(
            CanonicalJson.compare(&a, &c, "Extra", &mut diffs),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn aliased_fields_reports_under_reference_name() {
        let rule = AliasedFields::new([("Total", "AfterTax")]);
        let reference = Value::record("AfterDiscount", [("Total", Value::from(90.0))]);
        let candidate = Value::record("AfterDiscount", [("AfterTax", Value::from(85.0))]);

        let mut diffs = sink();
        assert_eq!(
            rule.compare(&reference, &candidate, "Price.AfterDiscount", &mut diffs),
            RuleOutcome::Unequal
        );
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "Price.AfterDiscount.Total");
    }

    #[test]
    fn aliased_fields_widens_numeric_aliases() {
        let rule = AliasedFields::new([("Total", "AfterTax")]);
        let reference = Value::record(
            "AfterDiscount",
            [("Total", Value::Decimal(Decimal::new(9000, 2)))],
        );
        let candidate = Value::record("AfterDiscount", [("AfterTax", Value::Int(90))]);

        let mut diffs = sink();
        assert_eq!(
            rule.compare(&reference, &candidate, "P", &mut diffs),
            RuleOutcome::Equal
        );
        assert!(diffs.is_empty());
    }

    #[test]
    fn aliased_fields_declines_non_records() {
        let rule = AliasedFields::new([("Total", "AfterTax")]);
        assert_eq!(
            rule.compare(&Value::Int(1), &Value::Int(2), "P", &mut sink()),
            RuleOutcome::NotApplicable
        );
    }
}
