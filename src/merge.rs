//! Override-safe merge of definition fields into document nodes.

use serde_yaml::{Mapping, Value};

use crate::types::{BusinessDefinition, FieldMapping};

/// Copy mapped fields from `source` into `target`.
///
/// A field is written only when the definition has the source field and the
/// target does not already have the target field. Presence is what counts:
/// an explicit `null` or `false` on the target is kept. New keys are appended
/// after existing ones.
///
/// Returns the number of fields written.
pub fn merge(
    target: &mut Mapping,
    source: &BusinessDefinition,
    mapping: &[FieldMapping],
) -> usize {
    let mut written = 0;
    for entry in mapping {
        if target.contains_key(entry.target) {
            continue;
        }
        if let Some(value) = source.get(entry.source) {
            target.insert(Value::from(entry.target), value.clone());
            written += 1;
        }
    }
    written
}
