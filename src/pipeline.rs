//! Document pipeline: load, resolve, write.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::info;

use crate::error::ResolveError;
use crate::loader::{load_document, load_document_str, render_document, save_document, DocumentFormat};
use crate::odcs::resolve_odcs;
use crate::openapi::resolve_openapi;
use crate::store::{DefinitionSource, DefinitionStore, ResolutionStats};
use crate::types::{DocumentKind, ResolveOptions};

/// Summary of one processed document.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: DocumentKind,
    /// Fields copied from definitions onto the document.
    pub fields_merged: usize,
    pub stats: ResolutionStats,
}

/// Run the walker for `kind` over a loaded document.
pub fn resolve_document<S>(
    document: &mut Value,
    kind: DocumentKind,
    source: &mut S,
) -> Result<usize, ResolveError>
where
    S: DefinitionSource + ?Sized,
{
    match kind {
        DocumentKind::OpenApi => resolve_openapi(document, source),
        DocumentKind::Odcs => resolve_odcs(document, source),
    }
}

/// A document with its references resolved, not yet written.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub document: Value,
    pub format: DocumentFormat,
    pub kind: DocumentKind,
    pub fields_merged: usize,
    pub stats: ResolutionStats,
}

/// Load a document file and resolve its references in memory.
///
/// References are resolved relative to the directory of `input`. When
/// `kind` is `None` it is detected from the document.
///
/// # Errors
///
/// Returns `ResolveError` if the input can't be loaded, its kind can't be
/// detected, or a definition file is malformed.
pub fn resolve_file(
    input: &Path,
    kind: Option<DocumentKind>,
    options: &ResolveOptions,
) -> Result<ResolvedDocument, ResolveError> {
    let (mut document, format) = load_document(input)?;
    let kind = match kind.or_else(|| DocumentKind::detect(&document)) {
        Some(kind) => kind,
        None => {
            return Err(ResolveError::UnknownDocumentKind {
                path: input.to_path_buf(),
            })
        }
    };

    let mut store = DefinitionStore::new(base_path(input), options);
    let fields_merged = resolve_document(&mut document, kind, &mut store)?;

    Ok(ResolvedDocument {
        document,
        format,
        kind,
        fields_merged,
        stats: store.into_stats(),
    })
}

/// Resolve a document file and write the result to `output`.
///
/// The output uses the input's format. Nothing is written unless the whole
/// run succeeds; a reference to a missing definition file does not fail
/// the run.
///
/// # Errors
///
/// Same as [`resolve_file`], plus `ResolveError::WriteError` if the output
/// can't be written.
pub fn process(
    input: &Path,
    output: &Path,
    kind: Option<DocumentKind>,
    options: &ResolveOptions,
) -> Result<ProcessReport, ResolveError> {
    let resolved = resolve_file(input, kind, options)?;
    save_document(output, &resolved.document, resolved.format)?;

    let ResolvedDocument {
        kind,
        fields_merged,
        stats,
        ..
    } = resolved;
    info!(
        references = stats.references,
        resolved = stats.resolved,
        missing = stats.missing.len(),
        fields = fields_merged,
        "processed {} {} -> {}",
        kind,
        input.display(),
        output.display()
    );

    Ok(ProcessReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        kind,
        fields_merged,
        stats,
    })
}

/// Resolve an in-memory document and return the rendered result.
///
/// `base_path` is the directory references are resolved against.
pub fn process_str(
    content: &str,
    format: DocumentFormat,
    base_path: &Path,
    kind: DocumentKind,
    options: &ResolveOptions,
) -> Result<String, ResolveError> {
    let mut document = load_document_str(content, format)?;
    let mut store = DefinitionStore::new(base_path, options);
    resolve_document(&mut document, kind, &mut store)?;
    render_document(&document, format)
}

/// Directory that references in `input` are relative to.
pub fn base_path(input: &Path) -> &Path {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
