//! Scope resolution: which `.sol` files a run covers.
//!
//! A scope is a `.sol` file, a directory (searched recursively), or a `.txt`
//! list of files and directories. Every path handed out is canonical, so two
//! spellings of the same file never count twice.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::source::SourceTexts;

/// Marker file of a Foundry project.
pub const FOUNDRY_MANIFEST: &str = "foundry.toml";

/// Foundry directories left out unless an explicit out-of-scope is given.
pub const FOUNDRY_EXCLUDED_DIRS: [&str; 3] = ["lib", "script", "test"];

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("scope path does not exist: {}", .0.display())]
    Missing(PathBuf),
    #[error("unsupported scope {} (expected .sol, directory, or .txt)", .0.display())]
    Unsupported(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolved scope, every list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeResult {
    pub included: Vec<PathBuf>,
    pub excluded: Vec<PathBuf>,
    /// `included` minus `excluded`: the files to index.
    pub files: Vec<PathBuf>,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ScopeError + '_ {
    move |source| ScopeError::Io { path: path.to_path_buf(), source }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Sorted `.sol` files for a `.sol` file, directory, or `.txt` list.
pub fn resolve_scope(scope: &Path) -> Result<Vec<PathBuf>, ScopeError> {
    if !scope.exists() {
        return Err(ScopeError::Missing(scope.to_path_buf()));
    }
    let path = fs::canonicalize(scope).map_err(io_err(scope))?;

    if path.is_dir() {
        return collect_sol_files(&path);
    }
    if has_extension(&path, "sol") {
        return Ok(vec![path]);
    }
    if has_extension(&path, "txt") {
        let mut files = BTreeSet::new();
        for item in read_path_list(&path)? {
            if item.is_dir() {
                files.extend(collect_sol_files(&item)?);
            } else if item.is_file() && has_extension(&item, "sol") {
                files.insert(fs::canonicalize(&item).map_err(io_err(&item))?);
            } else {
                debug!("scope list {}: skipping {}", path.display(), item.display());
            }
        }
        return Ok(files.into_iter().collect());
    }
    Err(ScopeError::Unsupported(path))
}

/// Entries of a `.txt` scope list. Blank lines and `#` comments are skipped;
/// relative entries resolve against the list's directory.
fn read_path_list(list: &Path) -> Result<Vec<PathBuf>, ScopeError> {
    let base = list.parent().unwrap_or_else(|| Path::new(""));
    let text = fs::read_to_string(list).map_err(io_err(list))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let entry = Path::new(line);
            if entry.is_absolute() {
                entry.to_path_buf()
            } else {
                base.join(entry)
            }
        })
        .collect())
}

/// Recursive `.sol` search. Symlinked directories are not followed.
fn collect_sol_files(root: &Path) -> Result<Vec<PathBuf>, ScopeError> {
    let mut files = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(io_err(&dir))? {
            let entry = entry.map_err(io_err(&dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(io_err(&path))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if has_extension(&path, "sol") && path.is_file() {
                files.insert(fs::canonicalize(&path).map_err(io_err(&path))?);
            }
        }
    }
    Ok(files.into_iter().collect())
}

/// Remove the files of `out_of_scope` (same forms as a scope) from `included`.
pub fn subtract_out_of_scope(
    included: &[PathBuf],
    out_of_scope: Option<&Path>,
) -> Result<ScopeResult, ScopeError> {
    let included: BTreeSet<PathBuf> = included.iter().cloned().collect();
    let excluded: BTreeSet<PathBuf> = match out_of_scope {
        Some(path) => resolve_scope(path)?.into_iter().collect(),
        None => BTreeSet::new(),
    };
    Ok(ScopeResult {
        files: included.difference(&excluded).cloned().collect(),
        included: included.into_iter().collect(),
        excluded: excluded.into_iter().collect(),
    })
}

/// Drop files under `lib/`, `script/` and `test/` when `scope` is a Foundry
/// project root. Dropped files move to `excluded`.
pub fn apply_foundry_excludes(result: &mut ScopeResult, scope: &Path) {
    if !scope.is_dir() || !scope.join(FOUNDRY_MANIFEST).is_file() {
        return;
    }
    let Ok(root) = fs::canonicalize(scope) else {
        return;
    };
    let dirs: Vec<PathBuf> = FOUNDRY_EXCLUDED_DIRS.iter().map(|d| root.join(d)).collect();
    let (dropped, kept): (Vec<PathBuf>, Vec<PathBuf>) =
        result.files.drain(..).partition(|f| dirs.iter().any(|d| f.starts_with(d)));
    if !dropped.is_empty() {
        debug!("foundry project: excluding {} file(s) under lib/, script/, test/", dropped.len());
    }
    result.files = kept;
    let mut excluded: BTreeSet<PathBuf> = result.excluded.drain(..).collect();
    excluded.extend(dropped);
    result.excluded = excluded.into_iter().collect();
}

/// Resolve `scope`, subtract `out_of_scope`, and apply the Foundry defaults
/// when no out-of-scope is given and `foundry_defaults` is set.
pub fn resolve_files(
    scope: &Path,
    out_of_scope: Option<&Path>,
    foundry_defaults: bool,
) -> Result<ScopeResult, ScopeError> {
    let included = resolve_scope(scope)?;
    let mut result = subtract_out_of_scope(&included, out_of_scope)?;
    if out_of_scope.is_none() && foundry_defaults {
        apply_foundry_excludes(&mut result, scope);
    }
    Ok(result)
}

/// The directory a run reports against: the scope itself, or the directory
/// holding a file scope.
pub fn scope_root(scope: &Path) -> Result<PathBuf, ScopeError> {
    if !scope.exists() {
        return Err(ScopeError::Missing(scope.to_path_buf()));
    }
    let path = fs::canonicalize(scope).map_err(io_err(scope))?;
    if path.is_file() {
        Ok(path.parent().map(Path::to_path_buf).unwrap_or(path))
    } else {
        Ok(path)
    }
}

/// Nearest ancestor directory (inclusive) holding `foundry.toml`; otherwise
/// the start directory itself.
pub fn find_foundry_root(start: &Path) -> PathBuf {
    let start_dir = if start.is_dir() {
        start
    } else {
        start.parent().unwrap_or(start)
    };
    start_dir
        .ancestors()
        .find(|dir| dir.join(FOUNDRY_MANIFEST).is_file())
        .unwrap_or(start_dir)
        .to_path_buf()
}

/// What the fallback tool is pointed at: a `.sol` or directory scope as is;
/// for a list, the project root around its first file.
pub fn fallback_entry(scope: &Path, files: &[PathBuf]) -> PathBuf {
    let scope = fs::canonicalize(scope).unwrap_or_else(|_| scope.to_path_buf());
    if scope.is_dir() || (scope.is_file() && has_extension(&scope, "sol")) {
        return scope;
    }
    match files.first() {
        Some(first) => find_foundry_root(first),
        None => scope.parent().map(Path::to_path_buf).unwrap_or(scope),
    }
}

/// Key used for a file across sources, trees and reports.
pub fn file_key(path: &Path) -> String {
    path.display().to_string()
}

/// Read every file's text, keyed by [`file_key`]. Invalid UTF-8 is replaced
/// lossily with a warning; offsets past the first bad byte may then drift.
pub fn load_sources(files: &[PathBuf]) -> Result<SourceTexts, ScopeError> {
    let mut sources = SourceTexts::new();
    for file in files {
        let bytes = fs::read(file).map_err(io_err(file))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("{} is not valid UTF-8; decoding lossily", file.display());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        sources.insert(file_key(file), text);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// SPDX-License-Identifier: MIT\n").unwrap();
    }

    #[test]
    fn directory_scope_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b/B.sol"));
        touch(&dir.path().join("A.sol"));
        touch(&dir.path().join("notes.md"));

        let files = resolve_scope(dir.path()).unwrap();
        let names: Vec<_> =
            files.iter().map(|f| f.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["A.sol", "B.sol"]);
        assert!(files.iter().all(|f| f.is_absolute()));
    }

    #[test]
    fn unsupported_and_missing_scopes_error() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.md");
        fs::write(&readme, "hi").unwrap();
        assert!(matches!(resolve_scope(&readme), Err(ScopeError::Unsupported(_))));
        assert!(matches!(resolve_scope(&dir.path().join("nope")), Err(ScopeError::Missing(_))));
    }

    #[test]
    fn foundry_root_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FOUNDRY_MANIFEST), "[profile.default]\n").unwrap();
        touch(&dir.path().join("src/deep/A.sol"));
        assert_eq!(find_foundry_root(&dir.path().join("src/deep/A.sol")), dir.path());

        let bare = tempfile::tempdir().unwrap();
        touch(&bare.path().join("x/A.sol"));
        assert_eq!(find_foundry_root(&bare.path().join("x/A.sol")), bare.path().join("x"));
    }

    #[test]
    fn file_scope_reports_against_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.sol");
        touch(&file);
        let root = scope_root(&file).unwrap();
        assert_eq!(root, fs::canonicalize(dir.path()).unwrap());
    }
}
