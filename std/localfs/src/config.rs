//! Server data directories.

use crate::error::FsResult;
use std::path::{Path, PathBuf};

/// Directory name used under the platform data directory.
pub const APP_DIR: &str = "wmcp-localfs";

/// Fixed layout under the server's data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRoots {
    pub base: PathBuf,
    pub media: PathBuf,
    pub cache: PathBuf,
    pub temp: PathBuf,
    pub documents: PathBuf,
    pub userdata: PathBuf,
    pub collections: PathBuf,
}

impl DataRoots {
    /// Lay out the data directories under `base`. Nothing is created yet.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            media: base.join("media"),
            cache: base.join("cache"),
            temp: base.join("temp"),
            documents: base.join("documents"),
            userdata: base.join("userdata"),
            collections: base.join("collections"),
            base,
        }
    }

    /// Default root: the platform local data directory, or `./data`.
    pub fn default_base() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// Create every directory in the layout.
    pub fn ensure(&self) -> FsResult<()> {
        for dir in self.all() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn all(&self) -> [&Path; 7] {
        [
            self.base.as_path(),
            self.media.as_path(),
            self.cache.as_path(),
            self.temp.as_path(),
            self.documents.as_path(),
            self.userdata.as_path(),
            self.collections.as_path(),
        ]
    }
}

impl Default for DataRoots {
    fn default() -> Self {
        Self::new(Self::default_base())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DataRoots;

    #[test]
    fn layout_is_under_base() {
        let roots = DataRoots::new("/srv/data");
        assert_eq!(roots.collections, std::path::Path::new("/srv/data/collections"));
        assert_eq!(roots.media, std::path::Path::new("/srv/data/media"));
    }

    #[test]
    fn ensure_creates_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let roots = DataRoots::new(tmp.path().join("data"));
        roots.ensure().unwrap();
        roots.ensure().unwrap();
        for dir in ["media", "cache", "temp", "documents", "userdata", "collections"] {
            assert!(roots.base.join(dir).is_dir(), "{dir}");
        }
    }
}
