//! End-to-end reconciliation of schema enums with codelists.
//!
//! A run reads every directory's codelists, layers them, then updates the
//! closed codelist properties of every schema file. All schema documents
//! are updated in memory first; nothing is written if any referenced
//! codelist is missing.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, info_span};

use crate::codelist::{
    CODELISTS_DIR, CodelistMap, MergedCodelists, collect_codelists, merge_across_directories,
};
use crate::error::{CodelistError, Result};
use crate::options::ReconcileOptions;
use crate::schema::{apply_enum, find_closed_properties};

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Schema files whose enums changed (written unless dry run).
    pub changed: Vec<PathBuf>,
    /// Schema files already up to date.
    pub unchanged: Vec<PathBuf>,
    /// Codelists on disk that no closed property references, sorted.
    pub unused: Vec<String>,
    /// Codelists defined independently with different codes, sorted.
    pub conflicts: Vec<String>,
    pub dry_run: bool,
}

impl ReconcileReport {
    /// Returns true if there is nothing to report.
    pub fn is_clean(&self) -> bool {
        self.unused.is_empty() && self.conflicts.is_empty()
    }

    /// Log conflicting and unused codelists at ERROR level.
    pub fn report(&self) {
        for name in &self.conflicts {
            error!("conflicting codelists: {name}");
        }
        if !self.unused.is_empty() {
            error!("unused codelists: {}", self.unused.join(", "));
        }
    }
}

struct SchemaDocument {
    path: PathBuf,
    document: Value,
    changed: bool,
}

/// Update closed codelist enums in the schemas of `directories`, in order.
///
/// A closed property takes its codes from its directory's scope, falling
/// back to the last scope that defines the codelist. Returns
/// [`CodelistError::MissingCodelists`] without writing anything when no
/// directory defines a referenced codelist.
pub fn reconcile(directories: &[PathBuf], options: &ReconcileOptions) -> Result<ReconcileReport> {
    let per_directory = directories
        .iter()
        .map(|directory| collect_codelists(directory))
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_across_directories(&per_directory, options.removal_match)?;
    let schema_files = directories
        .iter()
        .map(|directory| keyed_schema_files(directory, options))
        .collect::<Result<Vec<_>>>()?;
    let owners = schema_owners(&schema_files);

    let mut used = BTreeSet::new();
    let mut missing = BTreeSet::new();
    let mut documents = Vec::new();

    for (index, (scope, files)) in merged.scopes.iter().zip(schema_files).enumerate() {
        let span = info_span!("directory", directory = %scope.directory.display());
        let _guard = span.enter();
        debug!(
            schema_count = files.len(),
            codelist_count = scope.codelists.len(),
            "scanning directory"
        );
        for (key, path) in files {
            if owners.get(&key) != Some(&index) {
                debug!(path = %path.display(), "schema belongs to a later directory");
                continue;
            }
            let mut document = read_schema(&path)?;
            let changed = apply_scope(
                &mut document,
                &scope.codelists,
                &merged,
                &mut used,
                &mut missing,
            );
            documents.push(SchemaDocument {
                path,
                document,
                changed,
            });
        }
    }

    if !missing.is_empty() {
        return Err(CodelistError::MissingCodelists {
            names: missing.into_iter().collect(),
        });
    }

    let mut report = ReconcileReport {
        dry_run: options.dry_run,
        ..ReconcileReport::default()
    };
    let mut pending = Vec::new();
    for schema in documents {
        if schema.changed {
            info!(path = %schema.path.display(), dry_run = options.dry_run, "updated schema");
            report.changed.push(schema.path.clone());
            pending.push(schema);
        } else {
            report.unchanged.push(schema.path);
        }
    }
    if !options.dry_run {
        write_schemas(&pending)?;
    }

    report.unused = merged.on_disk.difference(&used).cloned().collect();
    report.conflicts = merged.conflicts.into_iter().collect();
    Ok(report)
}

/// Schema files of `directory`, each paired with its canonical path.
fn keyed_schema_files(
    directory: &Path,
    options: &ReconcileOptions,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    find_schema_files(directory, options)?
        .into_iter()
        .map(|path| {
            let key = std::fs::canonicalize(&path).map_err(|e| CodelistError::io(&path, e))?;
            Ok((key, path))
        })
        .collect()
}

/// Map each schema file to the last directory whose scan found it.
///
/// A directory nested inside another input directory is scanned by both;
/// the later one owns its files.
fn schema_owners(schema_files: &[Vec<(PathBuf, PathBuf)>]) -> BTreeMap<PathBuf, usize> {
    let mut owners = BTreeMap::new();
    for (index, files) in schema_files.iter().enumerate() {
        for (key, _) in files {
            owners.insert(key.clone(), index);
        }
    }
    owners
}

/// Apply one directory scope to a document, recording used and missing codelists.
fn apply_scope(
    document: &mut Value,
    codelists: &CodelistMap,
    merged: &MergedCodelists,
    used: &mut BTreeSet<String>,
    missing: &mut BTreeSet<String>,
) -> bool {
    let mut changed = false;
    for property in find_closed_properties(document) {
        used.insert(property.codelist.clone());
        let codes = codelists
            .get(&property.codelist)
            .or_else(|| merged.latest(&property.codelist));
        let Some(codes) = codes else {
            missing.insert(property.codelist);
            continue;
        };
        if let Some(node) = document.pointer_mut(&property.pointer) {
            changed |= apply_enum(node, codes, &property.types);
        }
    }
    changed
}

/// Find schema files under `directory`, sorted by path.
///
/// Hidden directories and `codelists/` folders are skipped.
pub fn find_schema_files(directory: &Path, options: &ReconcileOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    visit_directory(directory, options, &mut files)?;
    files.sort();
    Ok(files)
}

fn visit_directory(
    directory: &Path,
    options: &ReconcileOptions,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = std::fs::read_dir(directory).map_err(|e| CodelistError::io(directory, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CodelistError::io(directory, e))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_str().unwrap_or("");
        if path.is_dir() {
            if name.starts_with('.') || name == CODELISTS_DIR {
                continue;
            }
            visit_directory(&path, options, files)?;
        } else if options.is_schema_file(name) {
            files.push(path);
        }
    }
    Ok(())
}

fn read_schema(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| CodelistError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| CodelistError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every changed schema, or none if any cannot be staged.
///
/// Each document goes to a temporary file beside its target first; targets
/// are replaced only after all temporary files are written.
fn write_schemas(schemas: &[SchemaDocument]) -> Result<()> {
    let staged = schemas
        .iter()
        .map(|schema| stage_schema(&schema.path, &schema.document))
        .collect::<Result<Vec<_>>>()?;
    for (path, file) in staged {
        file.persist(path)
            .map_err(|e| CodelistError::io(path, e.error))?;
    }
    Ok(())
}

/// Serialize with two-space indentation, source key order and a trailing newline.
fn stage_schema<'a>(path: &'a Path, document: &Value) -> Result<(&'a Path, NamedTempFile)> {
    let mut text = serde_json::to_string_pretty(document).map_err(|source| CodelistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(parent).map_err(|e| CodelistError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| CodelistError::io(path, e))?;
    if let Ok(metadata) = std::fs::metadata(path) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| CodelistError::io(path, e))?;
    }
    Ok((path, file))
}
