//! Object-graph comparison engine for migration verification.
//!
//! Walks a reference graph and a candidate graph in lockstep and reports
//! every divergence as a typed [`Difference`](parity_types::Difference). The
//! walk is driven by an [`EngineConfig`]: exclusion prefixes, skip markers,
//! collection strategies, and custom comparison rules are all registered up
//! front, then an arbitrary number of [`GraphComparer`] instances can share
//! that configuration and a [`ShapeCache`] across threads.
//!
//! ```
//! use parity_engine::{EngineConfig, GraphComparer};
//! use parity_types::Value;
//!
//! let reference = Value::record("Booking", [("Nights", Value::Int(3))]);
//! let candidate = Value::record("Booking", [("Nights", Value::Int(4))]);
//!
//! let mut engine = GraphComparer::with_config(EngineConfig::new())?;
//! let report = engine.compare(&reference, &candidate);
//! assert_eq!(report.mismatches(), 1);
//! assert_eq!(report.differences[0].path, "Nights");
//! # Ok::<(), parity_engine::EngineError>(())
//! ```

pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
pub mod exclude;
mod reconcile;
pub mod rules;
pub mod shape;

pub use config::{CollectionStrategy, EngineConfig, DEFAULT_MAX_DEPTH};
pub use engine::GraphComparer;
pub use error::{EngineError, EngineResult};
pub use exclude::ExclusionSet;
pub use rules::{
    AliasedFields, AlwaysEqual, CanonicalJson, CaseInsensitiveText, Comparator, DateOnly,
    DecimalTolerance, IgnoreNull, InstantTolerance, RuleOutcome, RuleSet, UnorderedSequence,
};
pub use shape::{FieldIndex, ShapeCache};
