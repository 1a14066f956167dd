//! Codelist discovery and layered resolution.
//!
//! Each input directory holds a `codelists/` folder of CSV files:
//!
//! - `name.csv` defines the codelist `name.csv`
//! - `+name.csv` appends codes to `name.csv`
//! - `-name.csv` removes codes from `name.csv`
//!
//! Directories are layered in input order. The scope of directory *k*
//! starts from the scope of directory *k-1*, replaces any codelist the
//! directory defines itself, then applies the directory's additions and
//! removals. Two directories defining the same name with different codes
//! is a conflict; modifying a name is not.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use crate::csv::read_codes;
use crate::error::{CodelistError, Result};
use crate::options::RemovalMatch;

/// Name of the folder holding codelist CSV files inside each directory.
pub const CODELISTS_DIR: &str = "codelists";

/// Codelist name (file name without prefix) to ordered codes.
pub type CodelistMap = BTreeMap<String, Vec<String>>;

/// Role of a codelist file, given by its file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodelistKind {
    /// `name.csv`
    Base,
    /// `+name.csv`
    Addition,
    /// `-name.csv`
    Removal,
}

/// A parsed codelist file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodelistFileName {
    /// Codelist name with any prefix stripped (e.g. `a.csv`).
    pub name: String,
    pub kind: CodelistKind,
}

impl CodelistFileName {
    /// Parse a file name such as `a.csv`, `+a.csv` or `-a.csv`.
    pub fn parse(file_name: &str) -> Result<Self> {
        let (kind, name) = if let Some(rest) = file_name.strip_prefix('+') {
            (CodelistKind::Addition, rest)
        } else if let Some(rest) = file_name.strip_prefix('-') {
            (CodelistKind::Removal, rest)
        } else {
            (CodelistKind::Base, file_name)
        };

        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        if stem.is_empty() || stem.starts_with(&['+', '-'][..]) {
            return Err(CodelistError::InvalidCodelistName {
                name: file_name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
}

/// Codelist files found in one directory, grouped by role.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCodelists {
    /// The input directory (not its `codelists/` folder).
    pub directory: PathBuf,
    pub base: CodelistMap,
    pub additions: CodelistMap,
    pub removals: CodelistMap,
}

impl DirectoryCodelists {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Every codelist name this directory touches, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.base
            .keys()
            .chain(self.additions.keys())
            .chain(self.removals.keys())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.additions.is_empty() && self.removals.is_empty()
    }

    fn apply_modifications(
        &self,
        state: &mut CodelistMap,
        removal_match: RemovalMatch,
    ) -> Result<()> {
        for (name, additions) in &self.additions {
            let codes = state
                .get_mut(name)
                .ok_or_else(|| CodelistError::MissingTarget { name: name.clone() })?;
            append_codes(codes, additions);
        }
        for (name, removals) in &self.removals {
            let codes = state
                .get_mut(name)
                .ok_or_else(|| CodelistError::MissingTarget { name: name.clone() })?;
            remove_codes(codes, removals, removal_match);
        }
        Ok(())
    }
}

/// Read the `codelists/` folder of `directory`.
///
/// A directory without a `codelists/` folder contributes no codelists.
pub fn collect_codelists(directory: &Path) -> Result<DirectoryCodelists> {
    if !directory.is_dir() {
        return Err(CodelistError::DirectoryNotFound {
            path: directory.to_path_buf(),
        });
    }

    let mut collected = DirectoryCodelists::new(directory);
    let folder = directory.join(CODELISTS_DIR);
    if !folder.is_dir() {
        debug!(directory = %directory.display(), "no codelists folder");
        return Ok(collected);
    }

    for path in list_csv_files(&folder)? {
        let file_name = path.file_name().and_then(|v| v.to_str()).unwrap_or("");
        let parsed = CodelistFileName::parse(file_name)?;
        let codes = read_codes(&path)?;
        trace!(file = %file_name, code_count = codes.len(), "read codelist");
        let target = match parsed.kind {
            CodelistKind::Base => &mut collected.base,
            CodelistKind::Addition => &mut collected.additions,
            CodelistKind::Removal => &mut collected.removals,
        };
        target.insert(parsed.name, codes);
    }

    debug!(
        directory = %directory.display(),
        base = collected.base.len(),
        additions = collected.additions.len(),
        removals = collected.removals.len(),
        "collected codelists"
    );
    Ok(collected)
}

/// Lists CSV files in a folder, sorted by file name.
fn list_csv_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|e| CodelistError::io(folder, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CodelistError::io(folder, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Append codes not already present, keeping their order.
pub fn append_codes(codes: &mut Vec<String>, additions: &[String]) {
    for code in additions {
        if !codes.contains(code) {
            codes.push(code.clone());
        }
    }
}

/// Remove every code matched by an entry of `removals`, keeping the order of the rest.
pub fn remove_codes(codes: &mut Vec<String>, removals: &[String], removal_match: RemovalMatch) {
    codes.retain(|code| !removals.iter().any(|removed| removal_match.matches(code, removed)));
}

/// The resolved codelists visible to schemas of one directory.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedScope {
    pub directory: PathBuf,
    pub codelists: CodelistMap,
}

/// Result of layering all directories.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergedCodelists {
    /// One scope per input directory, in input order.
    pub scopes: Vec<ResolvedScope>,
    /// Names defined independently with different codes.
    pub conflicts: BTreeSet<String>,
    /// Every codelist name found on disk.
    pub on_disk: BTreeSet<String>,
}

impl MergedCodelists {
    /// Codes of `name` in the last scope that defines it.
    pub fn latest(&self, name: &str) -> Option<&Vec<String>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.codelists.get(name))
    }
}

/// Layer per-directory codelists in the given order.
pub fn merge_across_directories(
    per_directory: &[DirectoryCodelists],
    removal_match: RemovalMatch,
) -> Result<MergedCodelists> {
    let mut merged = MergedCodelists::default();
    let mut state = CodelistMap::new();
    // Last independent definition of each name, before modifications.
    let mut definitions = CodelistMap::new();

    for directory in per_directory {
        for (name, codes) in &directory.base {
            if let Some(previous) = definitions.get(name) {
                if previous != codes {
                    debug!(
                        codelist = %name,
                        directory = %directory.directory.display(),
                        "codelist redefined with different codes"
                    );
                    merged.conflicts.insert(name.clone());
                }
            }
            definitions.insert(name.clone(), codes.clone());
            state.insert(name.clone(), codes.clone());
        }

        directory.apply_modifications(&mut state, removal_match)?;

        merged.on_disk.extend(directory.names());
        merged.scopes.push(ResolvedScope {
            directory: directory.directory.clone(),
            codelists: state.clone(),
        });
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn directory(
        name: &str,
        base: &[(&str, &[&str])],
        additions: &[(&str, &[&str])],
        removals: &[(&str, &[&str])],
    ) -> DirectoryCodelists {
        let to_map = |entries: &[(&str, &[&str])]| {
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), codes(v)))
                .collect::<CodelistMap>()
        };
        DirectoryCodelists {
            directory: PathBuf::from(name),
            base: to_map(base),
            additions: to_map(additions),
            removals: to_map(removals),
        }
    }

    #[test]
    fn parses_prefixes() {
        let base = CodelistFileName::parse("a.csv").unwrap();
        assert_eq!(base.name, "a.csv");
        assert_eq!(base.kind, CodelistKind::Base);

        let addition = CodelistFileName::parse("+a.csv").unwrap();
        assert_eq!(addition.name, "a.csv");
        assert_eq!(addition.kind, CodelistKind::Addition);

        let removal = CodelistFileName::parse("-a.csv").unwrap();
        assert_eq!(removal.name, "a.csv");
        assert_eq!(removal.kind, CodelistKind::Removal);
    }

    #[test]
    fn rejects_empty_and_doubled_prefixes() {
        assert!(CodelistFileName::parse("+.csv").is_err());
        assert!(CodelistFileName::parse("+-a.csv").is_err());
    }

    #[test]
    fn append_skips_existing_codes() {
        let mut list = codes(&["foo", "bar"]);
        append_codes(&mut list, &codes(&["bar", "baz", "baz"]));
        assert_eq!(list, codes(&["foo", "bar", "baz"]));
    }

    #[test]
    fn remove_keeps_order() {
        let mut list = codes(&["foo", "bar", "baz"]);
        remove_codes(&mut list, &codes(&["bar", "qux"]), RemovalMatch::Exact);
        assert_eq!(list, codes(&["foo", "baz"]));

        let mut list = codes(&["foo", "Bar"]);
        remove_codes(&mut list, &codes(&["bar"]), RemovalMatch::Exact);
        assert_eq!(list, codes(&["foo", "Bar"]));
        remove_codes(&mut list, &codes(&["bar"]), RemovalMatch::CaseInsensitive);
        assert_eq!(list, codes(&["foo"]));
    }

    #[test]
    fn resolves_single_directory() {
        let dir = directory(
            "d",
            &[("a.csv", &["foo", "bar"]), ("b.csv", &["foo", "bar"])],
            &[("a.csv", &["baz"])],
            &[("b.csv", &["foo"])],
        );
        let merged = merge_across_directories(&[dir], RemovalMatch::Exact).unwrap();
        let resolved = &merged.scopes[0].codelists;
        assert_eq!(resolved["a.csv"], codes(&["foo", "bar", "baz"]));
        assert_eq!(resolved["b.csv"], codes(&["bar"]));
    }

    #[test]
    fn modification_without_base_is_missing_target() {
        let dir = directory("d", &[("a.csv", &["foo"])], &[("e.csv", &["foo"])], &[]);
        let err = merge_across_directories(&[dir], RemovalMatch::Exact).unwrap_err();
        assert!(matches!(err, CodelistError::MissingTarget { ref name } if name == "e.csv"));
    }

    #[test]
    fn later_directory_modifies_earlier_definitions() {
        let first = directory(
            "d",
            &[("a.csv", &["foo", "bar"]), ("b.csv", &["foo", "bar"])],
            &[],
            &[],
        );
        let second = directory("e", &[], &[("a.csv", &["baz"])], &[("b.csv", &["bar"])]);

        let merged = merge_across_directories(&[first, second], RemovalMatch::Exact).unwrap();
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.scopes.len(), 2);

        let d = &merged.scopes[0].codelists;
        assert_eq!(d["a.csv"], codes(&["foo", "bar"]));
        assert_eq!(d["b.csv"], codes(&["foo", "bar"]));

        let e = &merged.scopes[1].codelists;
        assert_eq!(e["a.csv"], codes(&["foo", "bar", "baz"]));
        assert_eq!(e["b.csv"], codes(&["foo"]));
    }

    #[test]
    fn independent_definitions_conflict() {
        let first = directory("d", &[("a.csv", &["foo", "bar"]), ("b.csv", &["x"])], &[], &[]);
        let second = directory("e", &[("a.csv", &["baz"]), ("b.csv", &["x"])], &[], &[]);

        let merged = merge_across_directories(&[first, second], RemovalMatch::Exact).unwrap();
        assert_eq!(merged.conflicts.iter().collect::<Vec<_>>(), vec!["a.csv"]);
        assert_eq!(merged.scopes[0].codelists["a.csv"], codes(&["foo", "bar"]));
        assert_eq!(merged.scopes[1].codelists["a.csv"], codes(&["baz"]));
    }

    #[test]
    fn on_disk_includes_modified_names() {
        let first = directory("d", &[("a.csv", &["foo"])], &[], &[]);
        let second = directory("e", &[("c.csv", &["x"])], &[("a.csv", &["bar"])], &[]);
        let merged = merge_across_directories(&[first, second], RemovalMatch::Exact).unwrap();
        assert_eq!(
            merged.on_disk.iter().collect::<Vec<_>>(),
            vec!["a.csv", "c.csv"]
        );
        assert_eq!(merged.latest("c.csv"), Some(&codes(&["x"])));
    }

    #[test]
    fn latest_prefers_the_last_defining_scope() {
        let first = directory("d", &[("a.csv", &["foo"])], &[], &[]);
        let second = directory("e", &[("a.csv", &["bar"]), ("b.csv", &["x"])], &[], &[]);
        let merged = merge_across_directories(&[first, second], RemovalMatch::Exact).unwrap();
        assert_eq!(merged.latest("a.csv"), Some(&codes(&["bar"])));
        assert_eq!(merged.latest("b.csv"), Some(&codes(&["x"])));
        assert!(merged.latest("z.csv").is_none());
    }

    #[test]
    fn collects_from_codelists_folder() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join(CODELISTS_DIR);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("a.csv"), "Code\nfoo\nbar\n").unwrap();
        std::fs::write(folder.join("+a.csv"), "Code\nbaz\n").unwrap();
        std::fs::write(folder.join("-b.csv"), "Code,Description\nbar,bzz\n").unwrap();
        std::fs::write(folder.join("notes.txt"), "ignored").unwrap();

        let collected = collect_codelists(root.path()).unwrap();
        assert_eq!(collected.base["a.csv"], codes(&["foo", "bar"]));
        assert_eq!(collected.additions["a.csv"], codes(&["baz"]));
        assert_eq!(collected.removals["b.csv"], codes(&["bar"]));
        assert_eq!(collected.names().len(), 2);
    }

    #[test]
    fn missing_codelists_folder_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let collected = collect_codelists(root.path()).unwrap();
        assert!(collected.is_empty());

        let err = collect_codelists(&root.path().join("absent")).unwrap_err();
        assert!(matches!(err, CodelistError::DirectoryNotFound { .. }));
    }
}
