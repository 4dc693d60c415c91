//! Nested field extraction.
//!
//! Column ids may be dotted paths (`author.name`) into the remote record. The
//! storage format forbids `.` in keys, so extracted values are stored under the
//! id with every separator replaced by `-`.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{config::Column, record::RawRecord};

pub const PATH_SEPARATOR: char = '.';
pub const KEY_SEPARATOR: char = '-';

/// Key under which a column's value is cached in the reference value.
pub fn storage_key(column_id: &str) -> String {
    column_id.replace(PATH_SEPARATOR, &KEY_SEPARATOR.to_string())
}

/// Walk `path` left to right starting at `value`.
///
/// `None` when a step hits `null` or a missing key. A scalar met before the
/// path is exhausted is returned as-is.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split(PATH_SEPARATOR) {
        current = match current {
            Value::Null => return None,
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get(index)?,
                Err(_) => return Some(current),
            },
            scalar => return Some(scalar),
        };
    }
    match current {
        Value::Null => None,
        other => Some(other),
    }
}

pub(crate) fn resolve_in_map<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let (head, rest) = match path.split_once(PATH_SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let value = map.get(head)?;
    match rest {
        Some(rest) => resolve_path(value, rest),
        None if value.is_null() => None,
        None => Some(value),
    }
}

/// Build the cached `fields` map for a chosen record: one entry per column, in
/// column order. Columns that resolve to nothing are stored as `null`.
pub fn extract(record: &RawRecord, columns: &[Column]) -> IndexMap<String, Value> {
    columns
        .iter()
        .map(|column| {
            let value = record.resolve(&column.id).cloned().unwrap_or(Value::Null);
            (storage_key(&column.id), value)
        })
        .collect()
}
