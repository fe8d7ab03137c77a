//! Named collections and date grouping.
//!
//! A collection is a directory under [`DataRoots::collections`] holding a
//! `collection.json` manifest. The manifest is written once and never read
//! back or refreshed.

use crate::config::DataRoots;
use crate::error::{FsError, FsResult};
use crate::record::{FileRecord, Gathered, Skipped, extract};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of a collection's manifest.
pub const MANIFEST: &str = "collection.json";

/// Persisted manifest of a collection.
#[derive(Debug, Serialize)]
pub struct CollectionRecord {
    pub name: String,
    pub created: DateTime<Utc>,
    pub files: Vec<FileRecord>,
}

/// Summary returned after writing a collection.
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub collection: String,
    pub file_count: usize,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
}

/// Snapshot `paths` into a named collection. Paths that are not regular
/// files are skipped.
pub fn create_collection(
    roots: &DataRoots,
    name: &str,
    paths: &[PathBuf],
) -> FsResult<CollectionSummary> {
    validate_name(name)?;
    let dir = roots.collections.join(name);
    std::fs::create_dir_all(&dir)?;

    let mut gathered = Gathered::default();
    for path in paths {
        match extract(path) {
            Ok(record) => gathered.items.push(record),
            Err(e) => gathered.skip(Skipped::new(path, e)),
        }
    }

    let record = CollectionRecord {
        name: name.to_string(),
        created: Utc::now(),
        files: gathered.items,
    };
    let manifest = serde_json::to_string_pretty(&record)?;
    std::fs::write(dir.join(MANIFEST), manifest)?;
    info!(collection = name, files = record.files.len(), "created collection");

    Ok(CollectionSummary {
        collection: record.name,
        file_count: record.files.len(),
        path: dir.display().to_string(),
        skipped: gathered.skipped,
    })
}

fn validate_name(name: &str) -> FsResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name.contains(['/', '\\', '\0'])
        || Path::new(name).is_absolute()
    {
        return Err(FsError::InvalidPath(format!("invalid collection name: {name:?}")));
    }
    Ok(())
}

/// Files grouped by `YYYY-MM-DD` of their creation time.
#[derive(Debug, Default, Serialize)]
pub struct DateGroups {
    pub groups: BTreeMap<String, Vec<FileRecord>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
}

/// Group files by creation date, optionally creating one directory per date
/// under `output_dir`. Files are not moved. An empty list is rejected.
pub fn organize_by_date(paths: &[PathBuf], output_dir: Option<&Path>) -> FsResult<DateGroups> {
    if paths.is_empty() {
        return Err(FsError::InvalidPath("no files provided".into()));
    }
    let mut out = DateGroups::default();
    for path in paths {
        let record = match extract(path) {
            Ok(record) => record,
            Err(e) => {
                out.skipped.push(Skipped::new(path, e));
                continue;
            }
        };
        let Some(created) = record.created else {
            out.skipped.push(Skipped::new(path, "no creation time"));
            continue;
        };
        let date = created.format("%Y-%m-%d").to_string();
        if let Some(dir) = output_dir {
            if let Err(e) = std::fs::create_dir_all(dir.join(&date)) {
                out.skipped.push(Skipped::new(path, e));
                continue;
            }
        }
        out.groups.entry(date).or_default().push(record);
    }
    Ok(out)
}
