//! The difference taxonomy: typed deviation records and the comparison report.
//!
//! Mismatches are data, never errors. The engine appends [`Difference`]
//! records to a [`Report`] while it walks; an empty report means the two
//! graphs are semantically equivalent under the active configuration.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

/// Classification of a recorded deviation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DifferenceKind {
    /// Corresponding values differ.
    ValueMismatch,
    /// Present on the candidate, absent on the reference.
    MissingInReference,
    /// Present on the reference, absent on the candidate.
    MissingInCandidate,
    /// Collection or map lengths differ.
    CountMismatch,
    /// The recursion depth guard fired; the branch was abandoned.
    DepthExceeded,
    /// A custom rule reported inequality without emitting its own record.
    CustomRuleFailed,
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DifferenceKind::ValueMismatch => "value mismatch",
            DifferenceKind::MissingInReference => "missing in reference",
            DifferenceKind::MissingInCandidate => "missing in candidate",
            DifferenceKind::CountMismatch => "count mismatch",
            DifferenceKind::DepthExceeded => "depth exceeded",
            DifferenceKind::CustomRuleFailed => "custom rule failed",
        };
        write!(f, "{name}")
    }
}

/// One recorded deviation between corresponding paths of the two graphs.
///
/// `expected` is the reference side, `actual` the candidate side; `None`
/// means the side had nothing at this path. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Difference {
    pub path: String,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
    pub kind: DifferenceKind,
}

impl Difference {
    pub fn new(
        path: impl Into<String>,
        expected: Option<Value>,
        actual: Option<Value>,
        kind: DifferenceKind,
    ) -> Self {
        Self {
            path: path.into(),
            expected,
            actual,
            kind,
        }
    }

    /// Corresponding values differ.
    pub fn mismatch(path: impl Into<String>, expected: Value, actual: Value) -> Self {
        Self::new(path, Some(expected), Some(actual), DifferenceKind::ValueMismatch)
    }

    /// The reference has a value at this path, the candidate has nothing.
    pub fn missing_in_candidate(path: impl Into<String>, expected: Value) -> Self {
        Self::new(path, Some(expected), None, DifferenceKind::MissingInCandidate)
    }

    /// The candidate has a value at this path, the reference has nothing.
    pub fn missing_in_reference(path: impl Into<String>, actual: Value) -> Self {
        Self::new(path, None, Some(actual), DifferenceKind::MissingInReference)
    }

    /// Collection lengths differ.
    pub fn count_mismatch(path: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(
            path,
            Some(Value::UInt(expected as u64)),
            Some(Value::UInt(actual as u64)),
            DifferenceKind::CountMismatch,
        )
    }

    /// The depth guard fired at this path.
    pub fn depth_exceeded(path: impl Into<String>, limit: usize) -> Self {
        Self::new(
            path,
            Some(Value::Text(format!("max depth {limit} exceeded"))),
            None,
            DifferenceKind::DepthExceeded,
        )
    }

    /// A custom rule decided "unequal" but emitted nothing itself.
    pub fn custom_rule_failed(path: impl Into<String>, expected: Value, actual: Value) -> Self {
        Self::new(path, Some(expected), Some(actual), DifferenceKind::CustomRuleFailed)
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = self.expected.as_ref().map_or_else(
            || "<missing>".to_string(),
            |v| v.to_string(),
        );
        let actual = self.actual.as_ref().map_or_else(
            || "<missing>".to_string(),
            |v| v.to_string(),
        );
        write!(
            f,
            "{}: {} (expected {}, actual {})",
            self.path, self.kind, expected, actual
        )
    }
}

/// The outcome of one comparison pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    /// Every deviation found, in walk order.
    pub differences: Vec<Difference>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no differences were found.
    pub fn is_match(&self) -> bool {
        self.differences.is_empty()
    }

    /// Returns `true` if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Number of differences.
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// Number of differences of the given kind.
    pub fn count_of(&self, kind: DifferenceKind) -> usize {
        self.differences.iter().filter(|d| d.kind == kind).count()
    }

    /// Number of value mismatches.
    pub fn mismatches(&self) -> usize {
        self.count_of(DifferenceKind::ValueMismatch)
    }

    /// Number of structural gaps on the candidate side.
    pub fn missing_in_candidate(&self) -> usize {
        self.count_of(DifferenceKind::MissingInCandidate)
    }

    /// Number of structural gaps on the reference side.
    pub fn missing_in_reference(&self) -> usize {
        self.count_of(DifferenceKind::MissingInReference)
    }

    /// Iterate over the recorded differences.
    pub fn iter(&self) -> impl Iterator<Item = &Difference> {
        self.differences.iter()
    }
}
