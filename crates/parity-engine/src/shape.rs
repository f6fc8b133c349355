//! Type-shape cache.
//!
//! A record's shape (its field list and a by-name index) is a pure function
//! of its schema type, so it is computed once per type name and shared.
//! The cache is an explicitly owned object the caller creates and hands to
//! each engine instance via `Arc` -- never implicit global state. It is
//! populated lazily and never invalidated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use parity_types::Record;

/// Field list and by-name lookup for one record type.
#[derive(Clone, Debug)]
pub struct FieldIndex {
    order: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FieldIndex {
    fn build(record: &Record) -> Self {
        let order: Vec<String> = record.fields.iter().map(|(name, _)| name.clone()).collect();
        let positions = order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { order, positions }
    }

    /// Position of a field within the record's declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns `true` if the type declares the field.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Field names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the type declares no fields.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Read-mostly, concurrency-safe map of record type name to [`FieldIndex`].
///
/// One cache may be shared across any number of engine instances running in
/// parallel; entries are keyed by `Record::type_name`.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: RwLock<HashMap<String, Arc<FieldIndex>>>,
}

impl ShapeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The field index for a record's type, built on first encounter.
    pub fn index_for(&self, record: &Record) -> Arc<FieldIndex> {
        {
            let shapes = self.shapes.read().expect("shape cache lock poisoned");
            if let Some(index) = shapes.get(&record.type_name) {
                return Arc::clone(index);
            }
        }
        let mut shapes = self.shapes.write().expect("shape cache lock poisoned");
        // Another comparison may have populated the entry between the two locks.
        Arc::clone(
            shapes
                .entry(record.type_name.clone())
                .or_insert_with(|| Arc::new(FieldIndex::build(record))),
        )
    }

    /// Number of cached type shapes.
    pub fn len(&self) -> usize {
        self.shapes.read().expect("shape cache lock poisoned").len()
    }

    /// Returns `true` if no shapes have been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
