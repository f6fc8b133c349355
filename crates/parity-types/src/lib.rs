//! Foundation types for the parity engine.
//!
//! This crate provides the normalized value model, field-path helpers, and the
//! difference taxonomy used throughout the parity workspace. Both the
//! reference graph and the candidate graph are materialized into [`Value`]
//! trees before comparison, so the engine never inspects application types at
//! runtime.
//!
//! # Key Types
//!
//! - [`Value`] / [`Record`] -- Tagged-union value model both schemas are normalized into
//! - [`Difference`] / [`DifferenceKind`] -- One recorded deviation between corresponding paths
//! - [`Report`] -- The outcome of a single comparison pass

pub mod difference;
pub mod path;
pub mod value;

pub use difference::{Difference, DifferenceKind, Report};
pub use value::{Record, Value};
