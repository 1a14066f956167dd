//! Synchronizes the enums of closed codelist properties in JSON Schema
//! documents with the codelist CSV files they reference.

#![deny(unsafe_code)]

pub mod codelist;
pub mod csv;
pub mod error;
pub mod options;
pub mod reconcile;
pub mod schema;

pub use crate::codelist::{
    CodelistFileName, CodelistKind, CodelistMap, DirectoryCodelists, MergedCodelists,
    ResolvedScope, collect_codelists, merge_across_directories,
};
pub use crate::error::{CodelistError, Result};
pub use crate::options::{DEFAULT_SCHEMA_FILE, ReconcileOptions, RemovalMatch};
pub use crate::reconcile::{ReconcileReport, find_schema_files, reconcile};
pub use crate::schema::{ClosedProperty, apply_enum, find_closed_properties};
