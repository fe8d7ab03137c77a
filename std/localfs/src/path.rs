//! Path resolution for incoming tool arguments.
//!
//! Every path a tool receives passes through [`resolve_path`] before it
//! touches the filesystem. There is no access control here; the operating
//! system's permissions are the only boundary.

use crate::error::{FsError, FsResult};
use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied path string.
///
/// Steps:
/// 1. Reject paths containing null bytes
/// 2. Expand a leading `~` to the current user's home directory
/// 3. Lexically normalize `.` and `..` components (no symlink resolution,
///    the path does not need to exist)
pub fn resolve_path(path: &str) -> FsResult<PathBuf> {
    if path.contains('\0') {
        return Err(FsError::InvalidPath("path contains null byte".into()));
    }
    if path.trim().is_empty() {
        return Err(FsError::InvalidPath("path is empty".into()));
    }

    let expanded = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            let home = dirs::home_dir()
                .ok_or_else(|| FsError::InvalidPath("home directory unknown".into()))?;
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(path),
    };

    Ok(normalize(&expanded))
}

/// Collapse `.` and `..` without consulting the filesystem.
///
/// `..` at the root stays at the root; leading `..` on a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Final path component as an owned string, or the whole path if it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Lowercased extension without the dot, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
