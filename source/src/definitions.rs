//! Sheet definition loading.
//!
//! Reads every `*.json` file in a definitions directory and normalizes it.
//! A file that fails to parse is logged and recorded, never fatal; a file
//! without a `type_name` is recorded as skipped. Only a missing directory
//! aborts loading.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sprite_catalog_core::{SheetDefinition, normalize_definition};
use tracing::{debug, warn};

use crate::error::{Result, SourceError};

/// A definition file that could not be parsed.
#[derive(Debug, Clone)]
pub struct FailedDefinition {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of loading a definitions directory.
#[derive(Debug, Default)]
pub struct DefinitionSet {
    /// Normalized definitions paired with their source file, in file-name
    /// order.
    pub definitions: Vec<(PathBuf, SheetDefinition)>,
    /// Files that parsed but had no usable `type_name`.
    pub skipped: Vec<PathBuf>,
    /// Files that could not be read or parsed.
    pub failed: Vec<FailedDefinition>,
}

impl DefinitionSet {
    /// Iterates over the normalized definitions.
    pub fn sheets(&self) -> impl Iterator<Item = &SheetDefinition> {
        self.definitions.iter().map(|(_, def)| def)
    }

    /// Number of files examined.
    pub fn file_count(&self) -> usize {
        self.definitions.len() + self.skipped.len() + self.failed.len()
    }
}

/// Loads and normalizes every `*.json` file directly inside `dir`.
///
/// # Errors
///
/// Returns [`SourceError::MissingDirectory`] if `dir` is not a directory, or
/// [`SourceError::IoError`] if the directory listing itself fails.
pub fn load_definitions(dir: impl AsRef<Path>) -> Result<DefinitionSet> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SourceError::MissingDirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension() == Some(OsStr::new("json")) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut set = DefinitionSet::default();
    for path in paths {
        match read_json(&path) {
            Ok(tree) => match normalize_definition(&tree) {
                Some(def) => set.definitions.push((path, def)),
                None => {
                    debug!(file = %path.display(), "no type_name, skipping");
                    set.skipped.push(path);
                }
            },
            Err(reason) => {
                warn!(file = %path.display(), %reason, "failed to parse definition");
                set.failed.push(FailedDefinition { path, reason });
            }
        }
    }

    Ok(set)
}

fn read_json(path: &Path) -> std::result::Result<Value, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_definitions(dir.path().join("missing")),
            Err(SourceError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "type_name").unwrap();
        let set = load_definitions(dir.path()).unwrap();
        assert_eq!(set.file_count(), 0);
    }
}
