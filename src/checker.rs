//! Reference checking - dry-run audit of business definition references.
//!
//! Reports, without writing anything:
//! - document syntax errors
//! - references to definition files that don't exist
//! - definition files that can't be parsed
//! - references that don't use the `file://` scheme

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value;

use crate::error::ResolveError;
use crate::loader::load_document;
use crate::pipeline::{base_path, resolve_document};
use crate::store::{load_definition, local_reference, DefinitionSource};
use crate::types::{value_type_name, DocumentKind, Resolution};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from checking.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Location of the reference (e.g. "/components/schemas/Order/properties/id")
    pub path: String,
    pub message: String,
}

/// Result of checking a single document.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DocumentKind>,
    pub references: usize,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a checked document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of checking a directory or a single document.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl CheckResult {
    /// Returns true if no document has errors.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Check a document or every document under a directory.
///
/// In a directory, files that are neither OpenAPI nor ODCS documents are
/// skipped; they are usually the definition files themselves. If `strict`
/// is true, warnings count as failures.
pub fn check(path: &Path, strict: bool) -> CheckResult {
    let results: Vec<FileResult> = if path.is_file() {
        vec![check_file(path, path.parent().unwrap_or(Path::new("")))]
    } else {
        collect_document_files(path)
            .iter()
            .filter_map(|file| check_loaded(file, path, load(file)).ok())
            .collect()
    };

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    CheckResult {
        path: path.to_path_buf(),
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

/// Check a single document. An undetectable document kind is an error.
pub fn check_file(file: &Path, base: &Path) -> FileResult {
    check_loaded(file, base, load(file)).unwrap_or_else(|document| {
        let diagnostics = vec![Diagnostic {
            severity: Severity::Error,
            code: "E004".to_string(),
            file: file.to_path_buf(),
            path: "/".to_string(),
            message: format!(
                "unrecognized document kind ({}): expected an OpenAPI or ODCS document",
                value_type_name(&document)
            ),
        }];
        finish(display_path(file, base), None, 0, diagnostics)
    })
}

/// A document file as read from disk, before auditing.
enum Loaded {
    Broken(ResolveError),
    Unknown(Value),
    Document(Value, DocumentKind),
}

fn load(file: &Path) -> Loaded {
    match load_document(file) {
        Ok((document, _)) => match DocumentKind::detect(&document) {
            Some(kind) => Loaded::Document(document, kind),
            None => Loaded::Unknown(document),
        },
        Err(e) => Loaded::Broken(e),
    }
}

/// Audit a loaded document; hands back documents of unknown kind.
fn check_loaded(file: &Path, base: &Path, loaded: Loaded) -> Result<FileResult, Value> {
    let shown = display_path(file, base);

    let (mut document, kind) = match loaded {
        Loaded::Document(document, kind) => (document, kind),
        Loaded::Unknown(document) => return Err(document),
        Loaded::Broken(e) => {
            let diagnostics = vec![Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: file.to_path_buf(),
                path: "/".to_string(),
                message: format!("syntax error: {}", e),
            }];
            return Ok(finish(shown, None, 0, diagnostics));
        }
    };

    let mut audit = ReferenceAudit {
        file,
        base_path: base_path(file),
        references: 0,
        diagnostics: Vec::new(),
    };
    let aborted = walk_references(file, &mut document, kind, &mut audit);
    audit.diagnostics.extend(aborted);

    Ok(finish(shown, Some(kind), audit.references, audit.diagnostics))
}

/// Walk the reference sites of `document`; a walk that stops on an error
/// becomes an E003 diagnostic at the document root.
fn walk_references<S>(
    file: &Path,
    document: &mut Value,
    kind: DocumentKind,
    source: &mut S,
) -> Option<Diagnostic>
where
    S: DefinitionSource + ?Sized,
{
    let error = resolve_document(document, kind, source).err()?;
    Some(Diagnostic {
        severity: Severity::Error,
        code: "E003".to_string(),
        file: file.to_path_buf(),
        path: "/".to_string(),
        message: error.to_string(),
    })
}

fn finish(
    file: PathBuf,
    kind: Option<DocumentKind>,
    references: usize,
    diagnostics: Vec<Diagnostic>,
) -> FileResult {
    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file,
        kind,
        references,
        status,
        diagnostics,
    }
}

fn display_path(file: &Path, base: &Path) -> PathBuf {
    file.strip_prefix(base).unwrap_or(file).to_path_buf()
}

/// A definition source that records problems instead of failing.
///
/// Plugged into the same walkers as the pipeline so it visits exactly the
/// references a real run would resolve.
struct ReferenceAudit<'a> {
    file: &'a Path,
    base_path: &'a Path,
    references: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ReferenceAudit<'_> {
    fn report(&mut self, severity: Severity, code: &str, path: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path: path.to_string(),
            message,
        });
    }
}

impl DefinitionSource for ReferenceAudit<'_> {
    fn resolve(&mut self, reference: &Value, path: &str) -> Result<Resolution, ResolveError> {
        self.references += 1;

        let Some(relative) = local_reference(reference) else {
            let shown = match reference {
                Value::String(s) => s.clone(),
                other => value_type_name(other).to_string(),
            };
            self.report(
                Severity::Warning,
                "W001",
                path,
                format!("not a file:// reference, left unresolved: {}", shown),
            );
            return Ok(Resolution::UnsupportedScheme);
        };

        let definition_file = self.base_path.join(relative);
        if !definition_file.exists() {
            self.report(
                Severity::Error,
                "E002",
                path,
                format!("business definition not found: {}", relative),
            );
            return Ok(Resolution::NotFound {
                path: definition_file,
            });
        }

        match load_definition(&definition_file) {
            Ok(definition) => Ok(Resolution::Resolved(definition)),
            Err(e) => {
                self.report(Severity::Error, "E003", path, e.to_string());
                Ok(Resolution::NotFound {
                    path: definition_file,
                })
            }
        }
    }
}

/// Collect all .yaml, .yml and .json files under a directory.
fn collect_document_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if is_document_file(&path) {
            files.push(path);
        }
    }
}

fn is_document_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}
