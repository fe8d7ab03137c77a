//! Directory walker shared by every scan and search.

use crate::error::{FsError, FsResult};
use crate::record::Skipped;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// How a walk should descend and what it should leave out.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Descend into subdirectories; otherwise only immediate children.
    pub recursive: bool,
    /// Paths matching any of these are skipped, directories with their subtree.
    pub exclude: Vec<glob::Pattern>,
}

impl WalkOptions {
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            exclude: Vec::new(),
        }
    }

    /// Parse exclusion globs, failing on the first invalid one.
    pub fn exclude_patterns(mut self, patterns: &[String]) -> FsResult<Self> {
        for pattern in patterns {
            self.exclude.push(glob::Pattern::new(pattern)?);
        }
        Ok(self)
    }

    fn excludes(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.exclude.iter().any(|p| p.matches(&path))
    }
}

/// Enumerate regular files under `root` in filesystem order.
///
/// The iterator is lazy; entries that cannot be read are yielded as
/// [`Skipped`] rather than ending the walk.
pub fn walk(
    root: &Path,
    options: &WalkOptions,
) -> FsResult<impl Iterator<Item = Result<PathBuf, Skipped>> + use<>> {
    ensure_dir(root)?;

    let mut walker = WalkDir::new(root).min_depth(1);
    if !options.recursive {
        walker = walker.max_depth(1);
    }
    let options = options.clone();
    let entries = walker
        .into_iter()
        .filter_entry(move |entry| !options.excludes(entry.path()))
        .filter_map(|entry| match entry {
            Ok(entry) => is_file(&entry).then(|| Ok(entry.into_path())),
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                Some(Err(Skipped::new(&path, err)))
            }
        });
    Ok(entries)
}

/// Fail unless `path` is an existing directory.
pub fn ensure_dir(path: &Path) -> FsResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(FsError::NotADirectory(path.to_path_buf())),
        Err(e) => Err(match FsError::at(path, e) {
            FsError::NotFound(p) => FsError::NotADirectory(p),
            other => other,
        }),
    }
}

// symlinks to files count, symlinked directories are not followed
fn is_file(entry: &DirEntry) -> bool {
    let ft = entry.file_type();
    ft.is_file() || (ft.is_symlink() && entry.path().is_file())
}

#[cfg(test)]
mod tests {
    use crate::error::FsError;
    use crate::walk::{WalkOptions, walk};
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), "top").unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/mid.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("sub/deeper/leaf.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    fn names(root: &Path, options: &WalkOptions) -> BTreeSet<String> {
        walk(root, options)
            .unwrap()
            .map(|p| {
                p.unwrap()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn recursive_yields_every_file() {
        let dir = tree();
        let found = names(dir.path(), &WalkOptions::new(true));
        let expected: BTreeSet<String> = ["top.txt", "sub/mid.rs", "sub/deeper/leaf.json"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn flat_yields_immediate_files_only() {
        let dir = tree();
        let found = names(dir.path(), &WalkOptions::new(false));
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["top.txt"]);
    }

    #[test]
    fn excluded_directory_is_pruned() {
        let dir = tree();
        let options = WalkOptions::new(true)
            .exclude_patterns(&["*/deeper".to_string()])
            .unwrap();
        let found = names(dir.path(), &options);
        assert!(found.contains("sub/mid.rs"));
        assert!(!found.iter().any(|n| n.contains("leaf")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = WalkOptions::new(true)
            .exclude_patterns(&["[".to_string()])
            .unwrap_err();
        assert!(matches!(err, FsError::Pattern(_)));
    }

    #[test]
    fn missing_root_fails() {
        let dir = tree();
        let result = walk(&dir.path().join("nope"), &WalkOptions::new(true));
        assert!(matches!(result, Err(FsError::NotADirectory(_))));
        let result = walk(&dir.path().join("top.txt"), &WalkOptions::new(true));
        assert!(matches!(result, Err(FsError::NotADirectory(_))));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_counts() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("top.txt"), dir.path().join("link.txt"))
            .unwrap();
        let found = names(dir.path(), &WalkOptions::new(false));
        assert!(found.contains("link.txt"));
    }
}
