//! Core types for business definition resolution.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Scheme prefix of a local business definition reference.
pub const FILE_SCHEME: &str = "file://";

/// Reference key on OpenAPI schema nodes.
pub const BUSINESS_DEFINITION_KEY: &str = "x-business-definition";

/// Link record list on ODCS properties.
pub const AUTHORITATIVE_DEFINITIONS_KEY: &str = "authoritativeDefinitions";

/// Link record `type` that marks a business definition.
pub const BUSINESS_DEFINITION_LINK_TYPE: &str = "businessDefinition";

/// JSON Schema composition keywords traversed by the OpenAPI walker.
pub const COMPOSITION_KEYWORDS: &[&str] = &["allOf", "oneOf", "anyOf"];

/// Returns the YAML type name for error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// One row of a field mapping table: copy `source` from the definition
/// into `target` on the document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub source: &'static str,
    pub target: &'static str,
}

const fn field(source: &'static str, target: &'static str) -> FieldMapping {
    FieldMapping { source, target }
}

/// Definition fields copied onto OpenAPI schema nodes.
pub const OPENAPI_MAPPING: &[FieldMapping] = &[
    field("type", "type"),
    field("description", "description"),
    field("examples", "examples"),
    field("enum", "enum"),
    field("pattern", "pattern"),
    field("classification", "x-classification"),
    field("pii", "x-pii"),
    field("criticalDataElement", "x-criticalDataElement"),
    field("title", "title"),
];

/// Definition fields copied onto ODCS property records.
pub const ODCS_MAPPING: &[FieldMapping] = &[
    field("title", "businessName"),
    field("type", "logicalType"),
    field("description", "description"),
    field("classification", "classification"),
    field("examples", "examples"),
    field("criticalDataElement", "criticalDataElement"),
];

/// Shape of a document that carries business definition references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// JSON-Schema composition tree with `x-business-definition` references.
    OpenApi,
    /// Data contract with `authoritativeDefinitions` link records.
    Odcs,
}

impl DocumentKind {
    /// Returns the field mapping applied to nodes of this document kind.
    pub fn mapping(&self) -> &'static [FieldMapping] {
        match self {
            DocumentKind::OpenApi => OPENAPI_MAPPING,
            DocumentKind::Odcs => ODCS_MAPPING,
        }
    }

    /// Guess the kind from top-level document keys.
    ///
    /// Returns `None` for documents that look like neither, such as
    /// business definition files.
    pub fn detect(document: &Value) -> Option<Self> {
        let map = document.as_mapping()?;
        if map.contains_key("openapi") || map.contains_key("swagger") {
            return Some(DocumentKind::OpenApi);
        }
        let is_contract = map.get("kind").and_then(Value::as_str) == Some("DataContract")
            || map.contains_key("apiVersion")
            || map.get("schema").map(Value::is_sequence).unwrap_or(false);
        is_contract.then_some(DocumentKind::Odcs)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::OpenApi => f.write_str("OpenAPI"),
            DocumentKind::Odcs => f.write_str("ODCS"),
        }
    }
}

/// A business definition record loaded from a file.
///
/// Holds every key of the file; only the keys named in a mapping table
/// are ever copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessDefinition {
    fields: Mapping,
}

impl BusinessDefinition {
    pub fn new(fields: Mapping) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Mapping {
        &self.fields
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The referenced file was loaded.
    Resolved(BusinessDefinition),
    /// The reference uses the local file scheme but the file is missing.
    NotFound { path: PathBuf },
    /// Not a local file reference; nothing to resolve.
    UnsupportedScheme,
}

impl Resolution {
    /// Returns the definition when resolution succeeded.
    pub fn definition(&self) -> Option<&BusinessDefinition> {
        match self {
            Resolution::Resolved(definition) => Some(definition),
            _ => None,
        }
    }
}

/// Options for a resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Reuse parsed definition files within one run instead of re-reading
    /// them for every reference. Off by default.
    pub cache_definitions: bool,
}

impl ResolveOptions {
    /// Create options with caching disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the per-run definition cache.
    pub fn cache_definitions(mut self, cache: bool) -> Self {
        self.cache_definitions = cache;
        self
    }
}
