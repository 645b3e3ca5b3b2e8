//! OpenAPI schema walker.
//!
//! Visits JSON-Schema style trees and merges the business definition named
//! by `x-business-definition` into the node that carries it.

use serde_yaml::Value;
use tracing::debug;

use crate::error::ResolveError;
use crate::merge::merge;
use crate::store::DefinitionSource;
use crate::types::{
    value_type_name, BUSINESS_DEFINITION_KEY, COMPOSITION_KEYWORDS, OPENAPI_MAPPING,
};

/// Resolve every business definition reference in an OpenAPI document.
///
/// Walks each schema under `components.schemas` and the `schema` of every
/// operation parameter under `paths`. Returns the number of fields merged.
///
/// # Errors
///
/// Propagates fatal errors from `source`, e.g. a malformed definition file.
pub fn resolve_openapi<S>(document: &mut Value, source: &mut S) -> Result<usize, ResolveError>
where
    S: DefinitionSource + ?Sized,
{
    let mut merged = 0;

    if let Some(schemas) = document
        .get_mut("components")
        .and_then(|c| c.get_mut("schemas"))
        .and_then(Value::as_mapping_mut)
    {
        for (name, schema) in schemas.iter_mut() {
            let path = format!("/components/schemas/{}", key_segment(name));
            merged += resolve_schema(schema, source, &path)?;
        }
    }

    if let Some(paths) = document.get_mut("paths").and_then(Value::as_mapping_mut) {
        for (route, item) in paths.iter_mut() {
            let Some(operations) = item.as_mapping_mut() else {
                continue;
            };
            for (method, operation) in operations.iter_mut() {
                // Path-level `parameters` is a list, not an operation; skipped here.
                let Some(parameters) = operation
                    .get_mut("parameters")
                    .and_then(Value::as_sequence_mut)
                else {
                    continue;
                };
                for (i, parameter) in parameters.iter_mut().enumerate() {
                    if let Some(schema) = parameter.get_mut("schema") {
                        let path = format!(
                            "/paths/{}/{}/parameters/{}/schema",
                            key_segment(route),
                            key_segment(method),
                            i
                        );
                        merged += resolve_schema(schema, source, &path)?;
                    }
                }
            }
        }
    }

    Ok(merged)
}

/// Resolve references in one schema node and everything below it.
///
/// `properties`, `items` and the `allOf`/`oneOf`/`anyOf` lists are
/// independent: a node carrying several of them has all of them walked.
/// Nodes that are not mappings are left alone.
pub fn resolve_schema<S>(node: &mut Value, source: &mut S, path: &str) -> Result<usize, ResolveError>
where
    S: DefinitionSource + ?Sized,
{
    let Some(map) = node.as_mapping_mut() else {
        return Ok(0);
    };
    let mut merged = 0;

    if let Some(reference) = map.get(BUSINESS_DEFINITION_KEY) {
        let resolution = source.resolve(reference, path)?;
        if let Some(definition) = resolution.definition() {
            let written = merge(map, definition, OPENAPI_MAPPING);
            debug!(location = path, fields = written, "merged business definition");
            merged += written;
        }
    }

    if let Some(properties) = map.get_mut("properties").and_then(Value::as_mapping_mut) {
        for (name, child) in properties.iter_mut() {
            let child_path = format!("{}/properties/{}", path, key_segment(name));
            merged += resolve_schema(child, source, &child_path)?;
        }
    }

    if let Some(items) = map.get_mut("items") {
        let child_path = format!("{}/items", path);
        merged += resolve_schema(items, source, &child_path)?;
    }

    for &keyword in COMPOSITION_KEYWORDS {
        if let Some(branches) = map.get_mut(keyword).and_then(Value::as_sequence_mut) {
            for (i, branch) in branches.iter_mut().enumerate() {
                let child_path = format!("{}/{}/{}", path, keyword, i);
                merged += resolve_schema(branch, source, &child_path)?;
            }
        }
    }

    Ok(merged)
}

/// Escape a key for use in a JSON Pointer (RFC 6901).
pub(crate) fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Pointer segment for a mapping key; scalar keys such as `200` use their
/// plain YAML form.
pub(crate) fn key_segment(key: &Value) -> String {
    match key {
        Value::String(s) => pointer_segment(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => value_type_name(other).to_string(),
    }
}
