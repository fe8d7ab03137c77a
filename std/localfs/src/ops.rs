//! Single-file reads and guarded mutations.
//!
//! Each operation is one filesystem call behind existence and overwrite
//! checks. Nothing here is transactional: a crash mid-write can leave a
//! truncated file.

use crate::classify::{Category, classify};
use crate::error::{FsError, FsResult};
use crate::path::file_name;
use crate::record::Skipped;
use crate::walk::ensure_dir;
use filetime::FileTime;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use tracing::info;

/// Contents of a text file.
#[derive(Debug, Serialize)]
pub struct TextContent {
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: u64,
}

/// Result of a write or append.
#[derive(Debug, Serialize)]
pub struct WriteOutcome {
    pub success: bool,
    pub path: String,
    pub name: String,
    pub size: u64,
    pub mode: WriteMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Write,
    Append,
}

/// Result of a copy or move.
#[derive(Debug, Serialize)]
pub struct Transfer {
    pub success: bool,
    pub source: String,
    pub destination: String,
    pub size: u64,
}

/// What a delete removed.
#[derive(Debug, Serialize)]
pub struct DeletedFile {
    pub path: String,
    pub name: String,
    pub size: u64,
}

/// A file entry in a directory listing.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub category: Category,
}

/// A subdirectory entry in a directory listing.
#[derive(Debug, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
}

/// Non-recursive listing of a directory.
#[derive(Debug, Default)]
pub struct Listing {
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirEntry>,
    pub skipped: Vec<Skipped>,
}

/// Read a textual file with lossy decoding.
///
/// With `max_lines`, at most that many lines are returned followed by a
/// truncation note when the file is longer. `None` or `0` reads everything.
pub fn read_text(path: &Path, max_lines: Option<usize>) -> FsResult<TextContent> {
    let meta = regular_file(path)?;
    if !classify(path).is_textual() {
        return Err(FsError::NotText(path.to_path_buf()));
    }

    let content = match max_lines.filter(|&n| n > 0) {
        None => String::from_utf8_lossy(&fs::read(path)?).into_owned(),
        Some(limit) => read_lines(path, limit)?,
    };

    Ok(TextContent {
        path: path.display().to_string(),
        name: file_name(path),
        content,
        size: meta.len(),
    })
}

fn read_lines(path: &Path, limit: usize) -> io::Result<String> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut content = String::new();
    let mut line = Vec::new();
    for _ in 0..limit {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(content);
        }
        content.push_str(&String::from_utf8_lossy(&line));
    }
    if !reader.fill_buf()?.is_empty() {
        content.push_str(&format!(
            "\n... (truncated, showing {limit} of {}+ lines)",
            limit + 1
        ));
    }
    Ok(content)
}

/// Write or append `content` to `path`, returning the resulting size.
pub fn write_text(path: &Path, content: &str, append: bool) -> FsResult<WriteOutcome> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| FsError::at(path, e))?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    let size = file.metadata()?.len();
    let mode = if append {
        WriteMode::Append
    } else {
        WriteMode::Write
    };
    info!(path = %path.display(), size, ?mode, "wrote file");
    Ok(WriteOutcome {
        success: true,
        path: path.display().to_string(),
        name: file_name(path),
        size,
        mode,
    })
}

/// Copy a regular file, carrying over permissions and timestamps.
pub fn copy(source: &Path, destination: &Path, overwrite: bool) -> FsResult<Transfer> {
    let meta = prepare_transfer(source, destination, overwrite)?;
    fs::copy(source, destination)?;
    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )?;
    info!(source = %source.display(), destination = %destination.display(), "copied file");
    transfer(source, destination)
}

/// Move a regular file, falling back to copy-and-delete across devices.
pub fn rename(source: &Path, destination: &Path, overwrite: bool) -> FsResult<Transfer> {
    prepare_transfer(source, destination, overwrite)?;
    match fs::rename(source, destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy(source, destination, true)?;
            fs::remove_file(source)?;
        }
        Err(e) => return Err(e.into()),
    }
    info!(source = %source.display(), destination = %destination.display(), "moved file");
    transfer(source, destination)
}

fn prepare_transfer(source: &Path, destination: &Path, overwrite: bool) -> FsResult<fs::Metadata> {
    let meta = regular_file(source)?;
    if !overwrite && fs::symlink_metadata(destination).is_ok() {
        return Err(FsError::AlreadyExists(destination.to_path_buf()));
    }
    if same_file(source, destination) {
        return Err(FsError::InvalidPath(format!(
            "source and destination are the same file: {}",
            source.display()
        )));
    }
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(meta)
}

// an absent destination can't alias the source
fn same_file(source: &Path, destination: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn transfer(source: &Path, destination: &Path) -> FsResult<Transfer> {
    Ok(Transfer {
        success: true,
        source: source.display().to_string(),
        destination: destination.display().to_string(),
        size: fs::metadata(destination)?.len(),
    })
}

/// Remove a regular file and report what was removed.
pub fn delete(path: &Path) -> FsResult<DeletedFile> {
    let meta = regular_file(path)?;
    let deleted = DeletedFile {
        path: path.display().to_string(),
        name: file_name(path),
        size: meta.len(),
    };
    fs::remove_file(path).map_err(|e| FsError::at(path, e))?;
    info!(path = %path.display(), "deleted file");
    Ok(deleted)
}

/// Create a directory and its parents. Succeeds if it already exists.
pub fn create_directory(path: &Path) -> FsResult<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// List the immediate entries of a directory, files classified and sized.
pub fn list_directory(path: &Path) -> FsResult<Listing> {
    ensure_dir(path)?;
    let mut listing = Listing::default();

    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                listing.skipped.push(Skipped::new(path, e));
                continue;
            }
        };
        let entry_path = entry.path();
        // follows symlinks, like the walker's file check
        let meta = match fs::metadata(&entry_path) {
            Ok(meta) => meta,
            Err(e) => {
                listing.skipped.push(Skipped::new(&entry_path, e));
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if meta.is_file() {
            listing.files.push(FileEntry {
                category: classify(&entry_path),
                name,
                path: entry_path.display().to_string(),
                size: meta.len(),
            });
        } else if meta.is_dir() {
            listing.directories.push(DirEntry {
                name,
                path: entry_path.display().to_string(),
            });
        }
    }
    Ok(listing)
}

fn regular_file(path: &Path) -> FsResult<fs::Metadata> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(meta),
        Ok(_) => Err(FsError::NotFound(path.to_path_buf())),
        Err(e) => Err(FsError::at(path, e)),
    }
}
