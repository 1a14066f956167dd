//! Configuration options for a reconciliation run.

use serde::{Deserialize, Serialize};

/// Schema file name scanned when none is configured.
pub const DEFAULT_SCHEMA_FILE: &str = "release-schema.json";

/// How codes listed in a `-name.csv` file are matched against the codelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RemovalMatch {
    /// Remove only codes that are byte-for-byte equal.
    #[default]
    Exact,
    /// Remove codes that match ignoring case.
    CaseInsensitive,
}

impl RemovalMatch {
    /// Returns true if `code` is matched by the removal entry `removed`.
    pub fn matches(self, code: &str, removed: &str) -> bool {
        match self {
            Self::Exact => code == removed,
            Self::CaseInsensitive => code.to_lowercase() == removed.to_lowercase(),
        }
    }
}

/// Options controlling a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// File names treated as JSON Schema documents.
    pub schema_file_names: Vec<String>,

    /// Matching rule for removal files.
    pub removal_match: RemovalMatch,

    /// Compute and report without writing schema files.
    pub dry_run: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            schema_file_names: vec![DEFAULT_SCHEMA_FILE.to_string()],
            removal_match: RemovalMatch::default(),
            dry_run: false,
        }
    }
}

impl ReconcileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scanned schema file names. An empty list keeps the default.
    #[must_use]
    pub fn with_schema_file_names(mut self, names: Vec<String>) -> Self {
        if !names.is_empty() {
            self.schema_file_names = names;
        }
        self
    }

    #[must_use]
    pub fn with_removal_match(mut self, removal_match: RemovalMatch) -> Self {
        self.removal_match = removal_match;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns true if `file_name` names a schema document.
    pub fn is_schema_file(&self, file_name: &str) -> bool {
        self.schema_file_names.iter().any(|name| name == file_name)
    }
}
