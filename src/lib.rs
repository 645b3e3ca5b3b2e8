//! Business Definition Resolver
//!
//! Enriches OpenAPI and ODCS documents with fields from the business
//! definitions they reference, without overwriting anything the document
//! author already set.
//!
//! # Example
//!
//! ```
//! use bizdef_resolver::{resolve_schema, DefinitionStore, ResolveOptions};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::create_dir(dir.path().join("defs")).unwrap();
//! std::fs::write(
//!     dir.path().join("defs/order_id.yaml"),
//!     "title: Order ID\ntype: string\npii: false\n",
//! )
//! .unwrap();
//!
//! let mut schema: serde_yaml::Value = serde_yaml::from_str(
//!     "x-business-definition: file://defs/order_id.yaml\ntype: integer\n",
//! )
//! .unwrap();
//! let mut store = DefinitionStore::new(dir.path(), &ResolveOptions::default());
//! resolve_schema(&mut schema, &mut store, "").unwrap();
//!
//! // "type" was already set, so only the missing fields are added
//! assert_eq!(schema["type"], "integer");
//! assert_eq!(schema["title"], "Order ID");
//! assert_eq!(schema["x-pii"], false);
//! ```
//!
//! # References
//!
//! | Document | Reference site | Example |
//! |----------|----------------|---------|
//! | OpenAPI | `x-business-definition` on any schema node | `file://defs/order_id.yaml` |
//! | ODCS | `authoritativeDefinitions` entry with `type: businessDefinition` | `url: file://defs/order_id.yaml` |
//!
//! Paths are relative to the directory of the document. References with any
//! other scheme are left alone. A missing definition file is logged and
//! skipped; a malformed one fails the run.
//!
//! # Field Mapping
//!
//! | Definition | OpenAPI | ODCS |
//! |------------|---------|------|
//! | `title` | `title` | `businessName` |
//! | `type` | `type` | `logicalType` |
//! | `description` | `description` | `description` |
//! | `examples` | `examples` | `examples` |
//! | `enum` | `enum` | |
//! | `pattern` | `pattern` | |
//! | `classification` | `x-classification` | `classification` |
//! | `pii` | `x-pii` | |
//! | `criticalDataElement` | `x-criticalDataElement` | `criticalDataElement` |

mod checker;
mod error;
mod loader;
mod merge;
mod odcs;
mod openapi;
mod pipeline;
mod store;
mod types;

pub use checker::{check, check_file, CheckResult, Diagnostic, FileResult, FileStatus, Severity};
pub use error::ResolveError;
pub use loader::{load_document, load_document_str, render_document, save_document, DocumentFormat};
pub use merge::merge;
pub use odcs::{resolve_odcs, resolve_property};
pub use openapi::{resolve_openapi, resolve_schema};
pub use pipeline::{
    base_path, process, process_str, resolve_document, resolve_file, ProcessReport,
    ResolvedDocument,
};
pub use store::{
    load_definition, local_reference, resolve_reference, DefinitionSource, DefinitionStore,
    ResolutionStats,
};
pub use types::{
    BusinessDefinition, DocumentKind, FieldMapping, Resolution, ResolveOptions, ODCS_MAPPING,
    OPENAPI_MAPPING,
};
