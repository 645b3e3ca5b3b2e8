//! Business definition lookup.
//!
//! References are `file://` paths relative to the directory of the document
//! being processed. A missing file is reported and skipped; a file that
//! exists but can't be parsed aborts the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::loader::{parse, read_file, DocumentFormat};
use crate::types::{value_type_name, BusinessDefinition, Resolution, ResolveOptions, FILE_SCHEME};

/// Something the walkers can ask to resolve a reference.
///
/// `path` is the location of the reference inside the document being
/// walked (e.g. `/components/schemas/Order/properties/id`).
pub trait DefinitionSource {
    fn resolve(&mut self, reference: &Value, path: &str) -> Result<Resolution, ResolveError>;
}

/// Counters collected while resolving one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Reference sites visited.
    pub references: usize,
    /// References that loaded a definition.
    pub resolved: usize,
    /// References skipped because they are not `file://` references.
    pub unsupported: usize,
    /// Definition files that were referenced but don't exist.
    pub missing: Vec<PathBuf>,
}

/// Loads business definitions relative to a base directory.
#[derive(Debug)]
pub struct DefinitionStore {
    base_path: PathBuf,
    cache: Option<HashMap<PathBuf, BusinessDefinition>>,
    stats: ResolutionStats,
}

impl DefinitionStore {
    pub fn new(base_path: impl Into<PathBuf>, options: &ResolveOptions) -> Self {
        Self {
            base_path: base_path.into(),
            cache: options.cache_definitions.then(HashMap::new),
            stats: ResolutionStats::default(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    pub fn into_stats(self) -> ResolutionStats {
        self.stats
    }
}

impl DefinitionSource for DefinitionStore {
    fn resolve(&mut self, reference: &Value, path: &str) -> Result<Resolution, ResolveError> {
        self.stats.references += 1;

        let Some(relative) = local_reference(reference) else {
            self.stats.unsupported += 1;
            return Ok(Resolution::UnsupportedScheme);
        };
        let file = self.base_path.join(relative);

        if let Some(definition) = self.cache.as_ref().and_then(|c| c.get(&file)) {
            self.stats.resolved += 1;
            return Ok(Resolution::Resolved(definition.clone()));
        }

        if !file.exists() {
            warn!(location = path, "business definition not found: {}", file.display());
            self.stats.missing.push(file.clone());
            return Ok(Resolution::NotFound { path: file });
        }

        let definition = load_definition(&file)?;
        debug!(location = path, file = %file.display(), "loaded business definition");

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(file, definition.clone());
        }
        self.stats.resolved += 1;
        Ok(Resolution::Resolved(definition))
    }
}

/// Resolve a single reference against `base_path` without caching.
pub fn resolve_reference(reference: &str, base_path: &Path) -> Result<Resolution, ResolveError> {
    let mut store = DefinitionStore::new(base_path, &ResolveOptions::default());
    store.resolve(&Value::String(reference.to_string()), "")
}

/// Returns the relative path of a `file://` reference.
///
/// Anything else, including non-string values, is not a local reference.
pub fn local_reference(reference: &Value) -> Option<&str> {
    reference.as_str()?.strip_prefix(FILE_SCHEME)
}

/// Load and parse a business definition file.
///
/// An empty file is an empty definition. Any other non-mapping content is
/// an error.
pub fn load_definition(path: &Path) -> Result<BusinessDefinition, ResolveError> {
    let content = read_file(path)?;
    let invalid = |message: String| ResolveError::InvalidDefinition {
        path: path.to_path_buf(),
        message,
    };

    match parse(&content, DocumentFormat::from_path(path)).map_err(invalid)? {
        Value::Mapping(fields) => Ok(BusinessDefinition::new(fields)),
        Value::Null => Ok(BusinessDefinition::default()),
        other => Err(invalid(format!(
            "expected a mapping, got {}",
            value_type_name(&other)
        ))),
    }
}
