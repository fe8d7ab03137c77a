//! File metadata records and the extractor that builds them.

use crate::classify::{Category, classify, has_text_extension};
use crate::error::{FsError, FsResult};
use crate::path::file_name;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::SystemTime;

/// Maximum number of characters kept in a preview.
pub const PREVIEW_CHARS: usize = 1000;

/// Marker appended to a preview that hit [`PREVIEW_CHARS`].
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Snapshot of one file's metadata at extraction time.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_error: Option<String>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub hit: Option<MatchRecord>,
}

/// First content match within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Up to 50 characters either side of the match.
    pub context: String,
    /// 1-based line of the match.
    pub line: usize,
}

/// A path dropped from a best-effort result, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    pub path: String,
    pub reason: String,
}

impl Skipped {
    pub fn new(path: &Path, reason: impl ToString) -> Self {
        Self {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Items collected by a best-effort operation plus what was dropped on the way.
#[derive(Debug)]
pub struct Gathered<T> {
    pub items: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for Gathered<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Gathered<T> {
    pub fn skip(&mut self, skipped: Skipped) {
        tracing::debug!(path = %skipped.path, reason = %skipped.reason, "skipped");
        self.skipped.push(skipped);
    }
}

/// Convert a filesystem timestamp to UTC.
pub fn timestamp(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// Build a [`FileRecord`] for a regular file.
///
/// Size and timestamps come from one `stat`. Text-like files also get a
/// preview and line count; failures there land in `preview_error`.
pub fn extract(path: &Path) -> FsResult<FileRecord> {
    let meta = std::fs::metadata(path).map_err(|e| FsError::at(path, e))?;
    if !meta.is_file() {
        return Err(FsError::NotFound(path.to_path_buf()));
    }
    let category = classify(path);
    let mut record = base_record(path, &meta, category);

    if category.is_textual() && has_text_extension(path) {
        match preview(path) {
            Ok((text, lines)) => {
                record.preview = Some(text);
                record.line_count = Some(lines);
            }
            Err(e) => record.preview_error = Some(e.to_string()),
        }
    }
    Ok(record)
}

/// Record fields available from a stat alone.
pub fn base_record(path: &Path, meta: &Metadata, category: Category) -> FileRecord {
    let modified = timestamp(meta.modified());
    FileRecord {
        path: path.display().to_string(),
        name: file_name(path),
        size: meta.len(),
        created: timestamp(meta.created()).or(modified),
        modified,
        category,
        preview: None,
        line_count: None,
        preview_error: None,
        hit: None,
    }
}

fn preview(path: &Path) -> std::io::Result<(String, usize)> {
    // enough bytes for PREVIEW_CHARS + 1 characters of any width
    let limit = (PREVIEW_CHARS as u64 + 1) * 4;
    let mut head = Vec::new();
    File::open(path)?.take(limit).read_to_end(&mut head)?;
    let decoded = String::from_utf8_lossy(&head);

    let mut text: String = decoded.chars().take(PREVIEW_CHARS).collect();
    if decoded.chars().nth(PREVIEW_CHARS).is_some() {
        text.push_str(TRUNCATION_MARKER);
    }

    let lines = count_lines(BufReader::new(File::open(path)?))?;
    Ok((text, lines))
}

/// Count lines the way a line iterator would: a trailing partial line counts.
pub fn count_lines<R: BufRead>(mut reader: R) -> std::io::Result<usize> {
    let mut lines = 0;
    let mut last = None;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        lines += buf.iter().filter(|&&b| b == b'\n').count();
        last = buf.last().copied();
        let len = buf.len();
        reader.consume(len);
    }
    if last.is_some_and(|b| b != b'\n') {
        lines += 1;
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use crate::classify::Category;
    use crate::error::FsError;
    use crate::record::{PREVIEW_CHARS, TRUNCATION_MARKER, count_lines, extract};
    use std::fs;

    #[test]
    fn size_matches_stat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "line one\nline two\nline three").unwrap();
        let record = extract(&path).unwrap();
        assert_eq!(record.size, fs::metadata(&path).unwrap().len());
        assert_eq!(record.name, "notes.txt");
        assert_eq!(record.category, Category::Text);
        assert_eq!(record.line_count, Some(3));
        assert_eq!(record.preview.as_deref(), Some("line one\nline two\nline three"));
        assert!(record.modified.is_some());
        assert!(record.created.is_some());
    }

    #[test]
    fn long_preview_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        fs::write(&path, "é".repeat(PREVIEW_CHARS + 5)).unwrap();
        let preview = extract(&path).unwrap().preview.unwrap();
        assert!(preview.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            preview.chars().count(),
            PREVIEW_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn exact_cap_is_not_marked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exact.txt");
        fs::write(&path, "a".repeat(PREVIEW_CHARS)).unwrap();
        let preview = extract(&path).unwrap().preview.unwrap();
        assert_eq!(preview.len(), PREVIEW_CHARS);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        fs::write(&path, b"ok \xFF\xFE end\n").unwrap();
        let record = extract(&path).unwrap();
        let preview = record.preview.unwrap();
        assert!(preview.starts_with("ok "));
        assert!(preview.contains('\u{FFFD}'));
        assert_eq!(record.line_count, Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_preview_is_reported() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.txt");
        fs::write(&path, "secret").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&path).is_ok() {
            return;
        }
        let record = extract(&path).unwrap();
        assert_eq!(record.size, 6);
        assert!(record.preview.is_none());
        assert!(record.line_count.is_none());
        assert!(record.preview_error.is_some());
    }

    #[test]
    fn binary_categories_have_no_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.jpg");
        fs::write(&path, b"\xFF\xD8\xFF\xE0").unwrap();
        let record = extract(&path).unwrap();
        assert_eq!(record.category, Category::Image);
        assert!(record.preview.is_none());
        assert!(record.line_count.is_none());
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(extract(dir.path()), Err(FsError::NotFound(_))));
        assert!(matches!(
            extract(&dir.path().join("absent.txt")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn line_counting() {
        assert_eq!(count_lines(&b""[..]).unwrap(), 0);
        assert_eq!(count_lines(&b"a"[..]).unwrap(), 1);
        assert_eq!(count_lines(&b"a\n"[..]).unwrap(), 1);
        assert_eq!(count_lines(&b"a\nb"[..]).unwrap(), 2);
        assert_eq!(count_lines(&b"\n\n"[..]).unwrap(), 2);
    }

    #[test]
    fn match_serializes_under_match_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "x").unwrap();
        let mut record = extract(&path).unwrap();
        record.hit = Some(crate::record::MatchRecord {
            context: "x".into(),
            line: 1,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["match"]["line"], 1);
        assert_eq!(json["category"], "text");
    }
}
