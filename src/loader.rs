//! Document loading and saving.
//!
//! Documents are YAML or JSON, chosen by file extension, and are held in
//! memory as order-preserving `serde_yaml::Value` trees. JSON is a subset of
//! that model; YAML keeps its non-string keys and non-finite floats.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_yaml::Value;
use tempfile::Builder;

use crate::error::ResolveError;

/// Serialization format of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    ///
    /// `.json` is JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// or `ResolveError::InvalidDocument` if it can't be parsed.
pub fn load_document(path: &Path) -> Result<(Value, DocumentFormat), ResolveError> {
    let format = DocumentFormat::from_path(path);
    let content = read_file(path)?;
    let document =
        parse(&content, format).map_err(|message| ResolveError::InvalidDocument {
            path: path.to_path_buf(),
            message,
        })?;
    Ok((document, format))
}

/// Load a document from a string.
///
/// # Errors
///
/// Returns `ResolveError::InvalidDocument` if the string can't be parsed.
pub fn load_document_str(content: &str, format: DocumentFormat) -> Result<Value, ResolveError> {
    parse(content, format).map_err(|message| ResolveError::InvalidDocument {
        path: "<string>".into(),
        message,
    })
}

/// Read a file, distinguishing a missing file from other IO failures.
pub(crate) fn read_file(path: &Path) -> Result<String, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse document text. An empty YAML document is `null`.
pub(crate) fn parse(content: &str, format: DocumentFormat) -> Result<Value, String> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml if content.trim().is_empty() => Ok(Value::Null),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Render a document as text.
///
/// YAML is emitted in block style; JSON is pretty-printed with a trailing
/// newline. Key order is kept and non-ASCII text is written unescaped.
pub fn render_document(document: &Value, format: DocumentFormat) -> Result<String, ResolveError> {
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(document).map_err(|e| {
            ResolveError::Serialize {
                message: e.to_string(),
            }
        }),
        DocumentFormat::Json => serde_json::to_string_pretty(document)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ResolveError::Serialize {
                message: e.to_string(),
            }),
    }
}

/// Write a document to `path`.
///
/// The content goes to a temporary file next to `path` and is renamed into
/// place, so a failure never leaves a partial output behind. A new file gets
/// the same mode a plain write would give it; an existing file keeps its own.
///
/// # Errors
///
/// Returns `ResolveError::WriteError` if the destination directory is
/// missing or not writable.
pub fn save_document(
    path: &Path,
    document: &Value,
    format: DocumentFormat,
) -> Result<(), ResolveError> {
    let rendered = render_document(document, format)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_error = |source: std::io::Error| ResolveError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let existing = fs::metadata(path).ok().map(|m| m.permissions());

    let mut builder = Builder::new();
    builder.prefix(".bizdef");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the umask like any newly created file.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let mut file = builder.tempfile_in(dir).map_err(write_error)?;
    file.write_all(rendered.as_bytes()).map_err(write_error)?;
    if let Some(permissions) = existing {
        file.as_file().set_permissions(permissions).map_err(write_error)?;
    }
    file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
