//! ODCS data contract walker.
//!
//! Data contract properties link their business definitions through
//! `authoritativeDefinitions` records rather than an inline key. Properties
//! are a flat list per schema object; nested properties are not visited.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::ResolveError;
use crate::merge::merge;
use crate::store::DefinitionSource;
use crate::types::{AUTHORITATIVE_DEFINITIONS_KEY, BUSINESS_DEFINITION_LINK_TYPE, ODCS_MAPPING};

/// Resolve every business definition link in an ODCS data contract.
///
/// Returns the number of fields merged.
///
/// # Errors
///
/// Propagates fatal errors from `source`, e.g. a malformed definition file.
pub fn resolve_odcs<S>(document: &mut Value, source: &mut S) -> Result<usize, ResolveError>
where
    S: DefinitionSource + ?Sized,
{
    let Some(objects) = document.get_mut("schema").and_then(Value::as_sequence_mut) else {
        return Ok(0);
    };

    let mut merged = 0;
    for (i, object) in objects.iter_mut().enumerate() {
        let Some(properties) = object.get_mut("properties").and_then(Value::as_sequence_mut) else {
            continue;
        };
        for (j, property) in properties.iter_mut().enumerate() {
            if let Some(record) = property.as_mapping_mut() {
                let path = format!("/schema/{}/properties/{}", i, j);
                merged += resolve_property(record, source, &path)?;
            }
        }
    }
    Ok(merged)
}

/// Resolve the business definition links of one property record.
///
/// Only links with `type: businessDefinition` and a `url` are followed.
/// With several such links the first one to supply a field wins.
pub fn resolve_property<S>(
    property: &mut Mapping,
    source: &mut S,
    path: &str,
) -> Result<usize, ResolveError>
where
    S: DefinitionSource + ?Sized,
{
    let urls: Vec<(usize, Value)> = match property
        .get(AUTHORITATIVE_DEFINITIONS_KEY)
        .and_then(Value::as_sequence)
    {
        Some(links) => links
            .iter()
            .enumerate()
            .filter(|(_, link)| {
                link.get("type").and_then(Value::as_str) == Some(BUSINESS_DEFINITION_LINK_TYPE)
            })
            .filter_map(|(k, link)| link.get("url").map(|url| (k, url.clone())))
            .collect(),
        None => return Ok(0),
    };

    let mut merged = 0;
    for (k, url) in urls {
        let link_path = format!("{}/{}/{}/url", path, AUTHORITATIVE_DEFINITIONS_KEY, k);
        let resolution = source.resolve(&url, &link_path)?;
        if let Some(definition) = resolution.definition() {
            let written = merge(property, definition, ODCS_MAPPING);
            debug!(location = path, fields = written, "merged business definition");
            merged += written;
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BusinessDefinition, Resolution};
    use serde_json::json;

    fn yaml(value: serde_json::Value) -> Value {
        serde_yaml::to_value(value).unwrap()
    }

    fn record(value: serde_json::Value) -> Mapping {
        yaml(value).as_mapping().unwrap().clone()
    }

    /// Resolves every `file://` reference to the same definition.
    struct FixedSource {
        definition: Mapping,
        visited: Vec<String>,
    }

    impl FixedSource {
        fn new(definition: serde_json::Value) -> Self {
            Self {
                definition: record(definition),
                visited: Vec::new(),
            }
        }
    }

    impl DefinitionSource for FixedSource {
        fn resolve(&mut self, reference: &Value, _path: &str) -> Result<Resolution, ResolveError> {
            let reference = reference.as_str().unwrap_or_default().to_string();
            let resolved = reference.starts_with("file://");
            self.visited.push(reference);
            Ok(if resolved {
                Resolution::Resolved(BusinessDefinition::new(self.definition.clone()))
            } else {
                Resolution::UnsupportedScheme
            })
        }
    }

    fn order_id() -> serde_json::Value {
        json!({"title": "Order ID", "type": "string", "pii": false})
    }

    #[test]
    fn resolves_business_definition_link() {
        let mut source = FixedSource::new(order_id());
        let mut contract = yaml(json!({
            "schema": [{
                "name": "orders",
                "properties": [{
                    "name": "order_id",
                    "authoritativeDefinitions": [
                        {"type": "businessDefinition", "url": "file://defs/order_id.yaml"}
                    ]
                }]
            }]
        }));

        let merged = resolve_odcs(&mut contract, &mut source).unwrap();
        let property = &contract["schema"][0]["properties"][0];

        assert_eq!(merged, 2);
        assert_eq!(property["businessName"], "Order ID");
        assert_eq!(property["logicalType"], "string");
        assert!(property.get("criticalDataElement").is_none());
        assert!(property.get("pii").is_none());
    }

    #[test]
    fn only_business_definition_links_are_followed() {
        let mut source = FixedSource::new(order_id());
        let mut property = record(json!({
            "authoritativeDefinitions": [
                {"type": "canonicalUrl", "url": "file://defs/other.yaml"},
                {"type": "businessDefinition", "url": "file://defs/order_id.yaml"}
            ]
        }));

        resolve_property(&mut property, &mut source, "/p").unwrap();
        assert_eq!(source.visited, vec!["file://defs/order_id.yaml"]);
    }

    #[test]
    fn link_without_url_is_skipped() {
        let mut source = FixedSource::new(order_id());
        let mut property = record(json!({
            "authoritativeDefinitions": [{"type": "businessDefinition"}]
        }));

        assert_eq!(resolve_property(&mut property, &mut source, "/p").unwrap(), 0);
        assert!(source.visited.is_empty());
    }

    #[test]
    fn existing_property_fields_win() {
        let mut source = FixedSource::new(order_id());
        let mut property = record(json!({
            "logicalType": "integer",
            "authoritativeDefinitions": [
                {"type": "businessDefinition", "url": "file://defs/order_id.yaml"}
            ]
        }));

        resolve_property(&mut property, &mut source, "/p").unwrap();
        assert_eq!(property["logicalType"], "integer");
        assert_eq!(property["businessName"], "Order ID");
    }

    #[test]
    fn malformed_structure_is_skipped() {
        let mut source = FixedSource::new(order_id());
        let mut contract = yaml(json!({
            "schema": [
                "not an object",
                {"properties": {"not": "a list"}},
                {"properties": ["not a record", {"authoritativeDefinitions": "nope"}]}
            ]
        }));
        let before = contract.clone();

        assert_eq!(resolve_odcs(&mut contract, &mut source).unwrap(), 0);
        assert_eq!(contract, before);
    }

    #[test]
    fn contract_without_schema() {
        let mut source = FixedSource::new(order_id());
        let mut contract = yaml(json!({"apiVersion": "v3.0.2", "kind": "DataContract"}));
        assert_eq!(resolve_odcs(&mut contract, &mut source).unwrap(), 0);
    }
}
