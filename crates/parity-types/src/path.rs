//! Dot-separated field paths and their annotations.
//!
//! Paths address a position in the walked graph (`Result.Rooms[2].Price`).
//! Sequence elements are annotated with `[index]` or `[keyField=value]`;
//! exclusion matching strips those annotations first via [`normalize`].

use std::fmt;

/// Append a field name to a base path.
pub fn join(base: &str, field: &str) -> String {
    if base.is_empty() {
        field.to_string()
    } else {
        format!("{base}.{field}")
    }
}

/// Annotate a path with a positional index: `base[3]`.
pub fn indexed(base: &str, index: usize) -> String {
    format!("{base}[{index}]")
}

/// Annotate a path with an identity value: `base[uuid=1f2e...]`.
pub fn keyed<K: fmt::Display>(base: &str, key_field: &str, key: K) -> String {
    format!("{base}[{key_field}={key}]")
}

/// Strip every bracketed annotation from a path.
///
/// `Result.Rooms[2].Offers[uuid=abc].Price` becomes
/// `Result.Rooms.Offers.Price`, the schema-shape form exclusion prefixes are
/// written in.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for ch in path.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}
