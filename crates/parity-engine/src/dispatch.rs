//! Value dispatcher: classifies a pair of values and routes them to the
//! correct equality rule.
//!
//! The arm order is part of the contract -- first match wins. In particular,
//! the text arm sits before the scalar arms so that symbol-vs-text pairs
//! compare as strings, and composite arms sit before it so collections never
//! get stringified.

use parity_types::Value;

use crate::engine::GraphComparer;

impl GraphComparer {
    /// Compare two values with no field context (collection elements, map
    /// values, the top-level pair).
    pub(crate) fn compare_values(
        &mut self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        depth: usize,
    ) {
        self.compare_field(reference, candidate, path, depth, None);
    }

    /// Compare two values; `origin` is the `(type, field)` the pair came
    /// from, used to look up the collection strategy for sequence fields.
    pub(crate) fn compare_field(
        &mut self,
        reference: &Value,
        candidate: &Value,
        path: &str,
        depth: usize,
        origin: Option<(&str, &str)>,
    ) {
        match (reference, candidate) {
            (Value::Null, Value::Null) => {}
            (Value::Null, _) | (_, Value::Null) => {
                self.push_mismatch(path, reference, candidate);
            }
            (Value::Map(ref_entries), Value::Map(cand_entries)) => {
                self.compare_maps(ref_entries, cand_entries, path, depth);
            }
            (Value::Sequence(ref_items), Value::Sequence(cand_items)) => {
                self.compare_sequences(ref_items, cand_items, path, depth, origin);
            }
            // Enum-vs-enum, enum-vs-string, and string-vs-string all become
            // one text comparison.
            (a, b) if a.is_textual() || b.is_textual() => {
                if a.to_string() != b.to_string() {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            (Value::Instant(a), Value::Instant(b)) => {
                if a != b {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            (Value::Date(a), Value::Date(b)) => {
                if a != b {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            (Value::Duration(a), Value::Duration(b)) => {
                if a != b {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            // NaN on both sides is the same sentinel, not drift.
            (Value::Float(a), Value::Float(b)) if a.is_nan() && b.is_nan() => {}
            (a, b) if a.is_numeric() && b.is_numeric() => {
                if a != b && !widened_equal(a, b) {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            (Value::Bool(a), Value::Bool(b)) => {
                if a != b {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            (Value::Uuid(a), Value::Uuid(b)) => {
                if a != b {
                    self.push_mismatch(path, reference, candidate);
                }
            }
            (Value::Record(ref_rec), Value::Record(cand_rec)) => {
                self.compare_records(ref_rec, cand_rec, path, depth);
            }
            // Cross-kind leaves (date vs. instant, bool vs. uuid, record vs.
            // scalar) are incompatible.
            _ => self.push_mismatch(path, reference, candidate),
        }
    }
}

/// Cross-representation numeric equality after widening both sides.
fn widened_equal(a: &Value, b: &Value) -> bool {
    match (a.as_decimal(), b.as_decimal()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
