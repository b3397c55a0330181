//! Directory walking and path listings.
//!
//! [`scan_tree`] feeds the asset scanner with root-relative, forward-slash
//! paths. [`list_paths`] and [`list_dirs`] back the listing utilities, which
//! tolerate missing roots.

use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, SourceError};

/// Returns every regular file under `root`, sorted, as root-relative paths
/// with `/` separators.
///
/// # Errors
///
/// Returns [`SourceError::MissingDirectory`] when `root` is not a directory,
/// or [`SourceError::IoError`] if any directory cannot be read.
pub fn scan_tree(root: impl AsRef<Path>) -> Result<Vec<String>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(SourceError::MissingDirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    walk(root, &mut |path| {
        if let Some(rel) = path.strip_prefix(root).ok().and_then(to_slash) {
            files.push(rel);
        }
    })?;
    files.sort();
    Ok(files)
}

/// Lists every file under the given roots, prefixed with its root.
///
/// Roots that do not exist are skipped with a warning.
pub fn list_paths(roots: &[PathBuf]) -> Result<Vec<String>> {
    let mut paths = BTreeSet::new();
    for root in existing_roots(roots) {
        walk(root, &mut |path| {
            paths.extend(to_slash(path));
        })?;
    }
    Ok(paths.into_iter().collect())
}

/// Lists the directories under the given roots that directly contain at
/// least one file.
///
/// Roots that do not exist are skipped with a warning.
pub fn list_dirs(roots: &[PathBuf]) -> Result<Vec<String>> {
    let mut dirs = BTreeSet::new();
    for root in existing_roots(roots) {
        walk(root, &mut |path| {
            dirs.extend(path.parent().and_then(to_slash));
        })?;
    }
    Ok(dirs.into_iter().collect())
}

/// Writes one entry per line.
pub fn write_listing(path: impl AsRef<Path>, lines: &[String]) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

fn existing_roots(roots: &[PathBuf]) -> impl Iterator<Item = &PathBuf> {
    roots.iter().filter(|root| {
        if root.is_dir() {
            info!(root = %root.display(), "scanning");
            true
        } else {
            warn!(root = %root.display(), "directory not found, skipping");
            false
        }
    })
}

fn walk(dir: &Path, visit: &mut dyn FnMut(&Path)) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, visit)?;
        } else if file_type.is_file() {
            visit(&path);
        }
    }
    Ok(())
}

/// `None` (with a warning) for paths that are not valid UTF-8, which would
/// otherwise collide after lossy conversion.
fn to_slash(path: &Path) -> Option<String> {
    match path.to_str() {
        Some(path) => Some(path.replace('\\', "/")),
        None => {
            warn!(path = %path.display(), "skipping non-UTF-8 path");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_scan_tree_returns_sorted_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "male/torso/walk/leather.png");
        touch(dir.path(), "body/walk/light.png");
        touch(dir.path(), "readme.txt");

        let files = scan_tree(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                "body/walk/light.png",
                "male/torso/walk/leather.png",
                "readme.txt",
            ]
        );
    }

    #[test]
    fn test_scan_tree_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_tree(&missing),
            Err(SourceError::MissingDirectory(p)) if p == missing
        ));
    }

    #[test]
    fn test_list_dirs_only_reports_dirs_with_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/b/c.png");
        fs::create_dir_all(dir.path().join("empty/inner")).unwrap();

        let dirs = list_dirs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(dirs, vec![to_slash(&dir.path().join("a/b")).unwrap()]);
    }

    #[test]
    fn test_listing_skips_missing_roots() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "x.png");
        let roots = vec![dir.path().join("missing"), dir.path().to_path_buf()];

        let paths = list_paths(&roots).unwrap();
        assert_eq!(paths, vec![to_slash(&dir.path().join("x.png")).unwrap()]);
    }

    #[test]
    fn test_write_listing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("paths.txt");
        write_listing(&out, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "a\nb\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "male/torso/walk/leather.png");
        let torso = dir.path().join("male/torso/walk");
        fs::write(torso.join(OsStr::from_bytes(b"bad\xff.png")), b"").unwrap();
        fs::write(torso.join(OsStr::from_bytes(b"bad\xfe.png")), b"").unwrap();

        assert_eq!(
            scan_tree(dir.path()).unwrap(),
            vec!["male/torso/walk/leather.png"]
        );
        let roots = vec![dir.path().to_path_buf()];
        assert_eq!(list_paths(&roots).unwrap().len(), 1);
        assert_eq!(list_dirs(&roots).unwrap().len(), 1);
    }
}
