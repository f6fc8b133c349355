//! Collection reconciliation: matching the elements of two sequences (or the
//! entries of two maps) before recursing into them.
//!
//! Positional mode is the default and is order-sensitive. Identity-keyed
//! mode matches elements by a designated key field and is order-insensitive;
//! it is registered per collection field on the configuration.

use std::collections::BTreeMap;

use parity_types::{path, Difference, DifferenceKind, Value};

use crate::config::CollectionStrategy;
use crate::engine::GraphComparer;

/// Conventional identity-like field names used to annotate element paths
/// when no key field is configured. Leading underscores are ignored, as are
/// differences in case.
const CONVENTIONAL_ID_FIELDS: [&str; 4] = ["uuid", "id", "guid", "name"];

impl GraphComparer {
    /// Key-matched map comparison.
    pub(crate) fn compare_maps(
        &mut self,
        reference: &BTreeMap<String, Value>,
        candidate: &BTreeMap<String, Value>,
        path: &str,
        depth: usize,
    ) {
        // A key-count mismatch is reported alongside key-level detail, not
        // instead of it.
        if reference.len() != candidate.len() {
            self.push(Difference::count_mismatch(
                path::join(path, "Count"),
                reference.len(),
                candidate.len(),
            ));
        }
        for (key, ref_value) in reference {
            let key_path = format!("{path}[{key}]");
            match candidate.get(key) {
                Some(cand_value) => self.compare_values(ref_value, cand_value, &key_path, depth + 1),
                None => self.push(Difference::missing_in_candidate(key_path, ref_value.clone())),
            }
        }
        for (key, cand_value) in candidate {
            if !reference.contains_key(key) {
                self.push(Difference::missing_in_reference(
                    format!("{path}[{key}]"),
                    cand_value.clone(),
                ));
            }
        }
    }

    /// Route a sequence field to its configured reconciliation strategy.
    pub(crate) fn compare_sequences(
        &mut self,
        reference: &[Value],
        candidate: &[Value],
        path: &str,
        depth: usize,
        origin: Option<(&str, &str)>,
    ) {
        let strategy = origin
            .and_then(|(type_name, field)| self.config().strategy(type_name, field))
            .cloned();
        match strategy {
            Some(CollectionStrategy::IdentityKeyed { key_field }) => {
                self.reconcile_keyed(reference, candidate, path, depth, &key_field);
            }
            Some(CollectionStrategy::Positional { label_field }) => {
                self.reconcile_positional(reference, candidate, path, depth, label_field.as_deref());
            }
            None => self.reconcile_positional(reference, candidate, path, depth, None),
        }
    }

    fn reconcile_positional(
        &mut self,
        reference: &[Value],
        candidate: &[Value],
        path: &str,
        depth: usize,
        label_field: Option<&str>,
    ) {
        // Positional mode gives up on element detail when lengths differ:
        // every pairing past the gap would be noise.
        if reference.len() != candidate.len() {
            self.push(Difference::count_mismatch(
                path::join(path, "Count"),
                reference.len(),
                candidate.len(),
            ));
            return;
        }
        for (index, (ref_item, cand_item)) in reference.iter().zip(candidate).enumerate() {
            let item_path = display_path(path, ref_item, cand_item, index, label_field);
            self.compare_values(ref_item, cand_item, &item_path, depth + 1);
        }
    }

    fn reconcile_keyed(
        &mut self,
        reference: &[Value],
        candidate: &[Value],
        path: &str,
        depth: usize,
        key_field: &str,
    ) {
        // Preserved from the original service: raw lengths are checked even
        // in keyed mode, in addition to the key-level reconciliation below.
        if reference.len() != candidate.len() {
            self.push(Difference::count_mismatch(
                path::join(path, "Count"),
                reference.len(),
                candidate.len(),
            ));
        }

        let mut by_key: BTreeMap<String, &Value> = BTreeMap::new();
        let mut unkeyed_candidates = 0usize;
        for item in candidate {
            match element_key(item, key_field) {
                Some(key) => {
                    by_key.insert(key.to_string(), item);
                }
                None => unkeyed_candidates += 1,
            }
        }

        let mut unkeyed_references = 0usize;
        for item in reference {
            if matches!(item, Value::Null) {
                unkeyed_references += 1;
                continue;
            }
            let Some(key) = element_key(item, key_field) else {
                self.push(Difference::new(
                    path,
                    Some(Value::Text(format!("element missing key `{key_field}`"))),
                    None,
                    DifferenceKind::ValueMismatch,
                ));
                unkeyed_references += 1;
                continue;
            };
            let key = key.to_string();
            match by_key.remove(&key) {
                Some(cand_item) => {
                    let item_path = path::keyed(path, key_field, &key);
                    self.compare_values(item, cand_item, &item_path, depth + 1);
                }
                None => self.push(Difference::missing_in_candidate(
                    path::keyed(path, key_field, &key),
                    item.clone(),
                )),
            }
        }

        for (key, cand_item) in by_key {
            self.push(Difference::missing_in_reference(
                path::keyed(path, key_field, &key),
                cand_item.clone(),
            ));
        }

        if unkeyed_references != unkeyed_candidates {
            self.push(Difference::count_mismatch(
                path::join(path, "UnkeyedCount"),
                unkeyed_references,
                unkeyed_candidates,
            ));
        }
    }
}

/// The key value of a keyed-collection element, if it has a usable one.
/// Usable means present and scalar; composites and nulls cannot key.
fn element_key<'a>(item: &'a Value, key_field: &str) -> Option<&'a Value> {
    let value = match item {
        Value::Record(rec) => rec.field(key_field),
        Value::Map(entries) => entries.get(key_field),
        _ => None,
    }?;
    value.is_scalar().then_some(value)
}

/// A readable element path for positional mode: a configured label field,
/// else a conventional id-like field with a non-default value, else the
/// index. Annotation only -- matching stays strictly positional.
fn display_path(
    base: &str,
    ref_item: &Value,
    cand_item: &Value,
    index: usize,
    label_field: Option<&str>,
) -> String {
    let item = if matches!(ref_item, Value::Null) {
        cand_item
    } else {
        ref_item
    };
    if let Some((name, value)) = identity_label(item, label_field) {
        return path::keyed(base, name, value);
    }
    path::indexed(base, index)
}

fn identity_label<'a>(item: &'a Value, label_field: Option<&str>) -> Option<(&'a str, &'a Value)> {
    let Value::Record(rec) = item else {
        return None;
    };
    if let Some(field) = label_field {
        if let Some((name, value)) = rec
            .fields
            .iter()
            .find(|(name, _)| name == field)
        {
            if value.is_scalar() && !value.is_default() {
                return Some((name.as_str(), value));
            }
        }
    }
    for (name, value) in &rec.fields {
        let trimmed = name.trim_start_matches('_');
        if CONVENTIONAL_ID_FIELDS
            .iter()
            .any(|id| trimmed.eq_ignore_ascii_case(id))
            && value.is_scalar()
            && !value.is_default()
        {
            return Some((name.as_str(), value));
        }
    }
    None
}
