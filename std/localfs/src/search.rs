//! Category scans, name search and content search over a [`walk`].

use crate::classify::{Category, classify, has_text_extension};
use crate::error::FsResult;
use crate::path::file_name;
use crate::record::{FileRecord, Gathered, MatchRecord, Skipped, extract};
use crate::walk::{WalkOptions, walk};
use std::path::Path;

/// Characters of context kept on each side of a content match.
pub const CONTEXT_CHARS: usize = 50;

/// Default cap for [`search_contents`].
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Extract every file under `root` whose category passes `filter`.
pub fn scan(
    root: &Path,
    options: &WalkOptions,
    filter: &[Category],
) -> FsResult<Gathered<FileRecord>> {
    collect(root, options, |path| classify(path).matches(filter))
}

/// Like [`scan`], keeping only files whose name contains `query`, ignoring case.
pub fn search_by_name(
    root: &Path,
    query: &str,
    options: &WalkOptions,
    filter: &[Category],
) -> FsResult<Gathered<FileRecord>> {
    let query = query.to_lowercase();
    collect(root, options, |path| {
        file_name(path).to_lowercase().contains(&query) && classify(path).matches(filter)
    })
}

fn collect(
    root: &Path,
    options: &WalkOptions,
    mut keep: impl FnMut(&Path) -> bool,
) -> FsResult<Gathered<FileRecord>> {
    let mut out = Gathered::default();
    for entry in walk(root, options)? {
        let path = match entry {
            Ok(path) => path,
            Err(skipped) => {
                out.skip(skipped);
                continue;
            }
        };
        if !keep(&path) {
            continue;
        }
        match extract(&path) {
            Ok(record) => out.items.push(record),
            Err(e) => out.skip(Skipped::new(&path, e)),
        }
    }
    Ok(out)
}

/// Find files whose text contains `query`, ignoring case.
///
/// Only the first match per file is reported. The walk stops as soon as
/// `max_results` files have matched.
pub fn search_contents(
    root: &Path,
    query: &str,
    options: &WalkOptions,
    filter: &[Category],
    max_results: usize,
) -> FsResult<Gathered<FileRecord>> {
    let mut out = Gathered::default();
    let needle = fold(query);

    for entry in walk(root, options)? {
        if out.items.len() >= max_results {
            break;
        }
        let path = match entry {
            Ok(path) => path,
            Err(skipped) => {
                out.skip(skipped);
                continue;
            }
        };
        let category = classify(&path);
        if !category.matches(filter) || !(category.is_textual() || has_text_extension(&path)) {
            continue;
        }

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                out.skip(Skipped::new(&path, e));
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let Some(hit) = find_first(&content, &needle) else {
            continue;
        };
        match extract(&path) {
            Ok(mut record) => {
                record.hit = Some(hit);
                out.items.push(record);
            }
            Err(e) => out.skip(Skipped::new(&path, e)),
        }
    }
    Ok(out)
}

// one char in, one char out, so char offsets stay aligned with the original
fn fold(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Locate the first case-insensitive occurrence of an already folded needle.
pub fn find_first(content: &str, needle: &str) -> Option<MatchRecord> {
    let folded = fold(content);
    let byte_index = folded.find(needle)?;
    let index = folded[..byte_index].chars().count();
    let needle_len = needle.chars().count();

    let start = index.saturating_sub(CONTEXT_CHARS);
    let end = index + needle_len + CONTEXT_CHARS;
    let context: String = content.chars().skip(start).take(end - start).collect();
    let line = content.chars().take(index).filter(|&c| c == '\n').count() + 1;

    Some(MatchRecord { context, line })
}

#[cfg(test)]
mod tests {
    use crate::classify::Category;
    use crate::search::{
        CONTEXT_CHARS, DEFAULT_MAX_RESULTS, find_first, scan, search_by_name, search_contents,
    };
    use crate::walk::WalkOptions;
    use std::collections::BTreeSet;
    use std::fs;

    fn scenario() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello world").unwrap();
        fs::write(dir.path().join("b.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("c.jpg"), b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00").unwrap();
        dir
    }

    fn names(records: &[crate::record::FileRecord]) -> BTreeSet<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn flat_scan_classifies_each_file() {
        let dir = scenario();
        let found = scan(dir.path(), &WalkOptions::new(false), &[]).unwrap();
        assert_eq!(found.items.len(), 3);
        let category = |name: &str| {
            found
                .items
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.category)
                .unwrap()
        };
        assert_eq!(category("a.txt"), Category::Text);
        assert_eq!(category("b.py"), Category::Code);
        assert_eq!(category("c.jpg"), Category::Image);
        assert!(found.skipped.is_empty());
    }

    #[test]
    fn filtered_scan_respects_filter() {
        let dir = scenario();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/d.rs"), "fn d() {}").unwrap();
        let filter = [Category::Code, Category::Image];
        let found = scan(dir.path(), &WalkOptions::new(true), &filter).unwrap();
        assert!(found.items.iter().all(|r| filter.contains(&r.category)));
        assert_eq!(
            names(&found.items),
            BTreeSet::from(["b.py", "c.jpg", "d.rs"].map(String::from))
        );
    }

    #[test]
    fn scan_of_missing_root_fails() {
        let dir = scenario();
        assert!(scan(&dir.path().join("gone"), &WalkOptions::new(true), &[]).is_err());
    }

    #[cfg(unix)]
    fn lock(path: &std::path::Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
        // permission bits do not bind a privileged user
        fs::read(path).is_err()
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_skipped_by_content_search() {
        let dir = scenario();
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, "hello world, but private").unwrap();
        if !lock(&locked) {
            return;
        }
        let found = search_contents(
            dir.path(),
            "world",
            &WalkOptions::new(true),
            &[],
            DEFAULT_MAX_RESULTS,
        )
        .unwrap();
        assert_eq!(names(&found.items), BTreeSet::from(["a.txt".to_string()]));
        assert_eq!(found.skipped.len(), 1);
        assert_eq!(found.skipped[0].path, locked.display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_keeps_its_scan_record() {
        let dir = scenario();
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, "private").unwrap();
        if !lock(&locked) {
            return;
        }
        let found = scan(dir.path(), &WalkOptions::new(false), &[]).unwrap();
        assert_eq!(found.items.len(), 4);
        let record = found.items.iter().find(|r| r.name == "locked.txt").unwrap();
        assert!(record.preview.is_none());
        assert!(record.preview_error.is_some());
        let readable = found.items.iter().find(|r| r.name == "a.txt").unwrap();
        assert_eq!(readable.preview.as_deref(), Some("hello world"));
    }

    #[test]
    fn name_search_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["test_one.txt", "MyTest.rs", "other.md", "TESTING.json"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let options = WalkOptions::new(true);
        let upper = search_by_name(dir.path(), "TEST", &options, &[]).unwrap();
        let lower = search_by_name(dir.path(), "test", &options, &[]).unwrap();
        assert_eq!(names(&upper.items), names(&lower.items));
        assert_eq!(upper.items.len(), 3);
    }

    #[test]
    fn name_search_without_hits_is_empty() {
        let dir = scenario();
        let found = search_by_name(dir.path(), "zzz", &WalkOptions::new(true), &[]).unwrap();
        assert!(found.items.is_empty());
    }

    #[test]
    fn content_search_finds_first_match() {
        let dir = scenario();
        let found = search_contents(
            dir.path(),
            "world",
            &WalkOptions::new(true),
            &[],
            DEFAULT_MAX_RESULTS,
        )
        .unwrap();
        assert_eq!(found.items.len(), 1);
        let record = &found.items[0];
        assert_eq!(record.name, "a.txt");
        let hit = record.hit.as_ref().unwrap();
        assert_eq!(hit.line, 1);
        assert!(hit.context.contains("hello world"));
    }

    #[test]
    fn content_search_stops_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("f{i}.txt")), "needle here").unwrap();
        }
        let found =
            search_contents(dir.path(), "NEEDLE", &WalkOptions::new(true), &[], 4).unwrap();
        assert_eq!(found.items.len(), 4);
    }

    #[test]
    fn content_search_honours_filter() {
        let dir = scenario();
        fs::write(dir.path().join("d.rs"), "// hello world").unwrap();
        let found = search_contents(
            dir.path(),
            "world",
            &WalkOptions::new(false),
            &[Category::Code],
            DEFAULT_MAX_RESULTS,
        )
        .unwrap();
        assert_eq!(names(&found.items), BTreeSet::from(["d.rs".to_string()]));
    }

    #[test]
    fn data_files_on_allow_list_are_searched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cfg.json"), r#"{"key": "Marker"}"#).unwrap();
        let found = search_contents(dir.path(), "marker", &WalkOptions::new(true), &[], 10)
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].category, Category::Data);
    }

    #[test]
    fn line_and_context_window() {
        let body = format!("{}\nsecond\nthe Target is here{}", "x".repeat(80), "y".repeat(80));
        let hit = find_first(&body, "target").unwrap();
        assert_eq!(hit.line, 3);
        assert!(hit.context.starts_with(&"x".repeat(CONTEXT_CHARS - 12)[..]));
        assert!(hit.context.contains("Target"));
        assert_eq!(hit.context.chars().count(), CONTEXT_CHARS * 2 + "target".len());
    }

    #[test]
    fn context_is_clipped_at_bounds() {
        let hit = find_first("Key", "key").unwrap();
        assert_eq!(hit.context, "Key");
        assert_eq!(hit.line, 1);
        assert!(find_first("nothing", "key").is_none());
    }

    #[test]
    fn binary_files_are_not_candidates() {
        let dir = scenario();
        let found = search_contents(dir.path(), "JFIF", &WalkOptions::new(true), &[], 10).unwrap();
        assert!(found.items.is_empty());
        let found = search_contents(dir.path(), "hi", &WalkOptions::new(true), &[], 10).unwrap();
        assert_eq!(names(&found.items), BTreeSet::from(["b.py".to_string()]));
    }
}
