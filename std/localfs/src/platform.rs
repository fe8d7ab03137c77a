//! Host platform capabilities: user folders, drives and system details.
//!
//! Each supported OS has one [`Platform`] implementation. [`current`] picks
//! the right one once at startup; nothing else branches on the target OS.

use crate::error::{FsError, FsResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One mounted drive.
#[derive(Debug, Clone, Serialize)]
pub struct DriveInfo {
    pub path: String,
    #[serde(rename = "type")]
    pub drive_type: String,
}

/// Basic facts about the host.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub system: String,
    pub family: String,
    pub arch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_home: Option<String>,
    pub temp_dir: String,
    pub server_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<BTreeMap<String, String>>,
}

/// Platform-specific directory and device discovery.
pub trait Platform: Send + Sync + fmt::Debug {
    /// Short platform name.
    fn name(&self) -> &'static str;

    /// Well-known user folders that exist on this host, by display name.
    fn user_directories(&self) -> BTreeMap<String, PathBuf>;

    /// Mounted drives. Only meaningful where drives are lettered.
    fn drives(&self) -> FsResult<Vec<DriveInfo>> {
        Err(FsError::Unsupported(format!(
            "drive listing is only available on Windows, not {}",
            self.name()
        )))
    }

    fn system_info(&self) -> SystemInfo {
        base_system_info()
    }
}

/// The implementation for the OS this binary was built for.
pub fn current() -> Arc<dyn Platform> {
    if cfg!(target_os = "windows") {
        Arc::new(Windows)
    } else if cfg!(target_os = "macos") {
        Arc::new(MacOs)
    } else {
        Arc::new(Xdg)
    }
}

/// Windows: profile folders, drive letters and selected environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows;

/// macOS: the standard home folder layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacOs;

/// Linux and other Unix systems following the XDG user-dirs convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xdg;

const WINDOWS_ENV: &[&str] = &[
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "TEMP",
    "HOMEPATH",
    "HOMEDRIVE",
    "PROGRAMFILES",
    "PROGRAMFILES(X86)",
    "PROGRAMDATA",
    "WINDIR",
    "SYSTEMROOT",
];

impl Platform for Windows {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn user_directories(&self) -> BTreeMap<String, PathBuf> {
        existing([
            ("Desktop", dirs::desktop_dir()),
            ("Documents", dirs::document_dir()),
            ("Pictures", dirs::picture_dir()),
            ("Videos", dirs::video_dir()),
            ("Music", dirs::audio_dir()),
            ("Downloads", dirs::download_dir()),
            ("AppData", dirs::data_dir()),
            ("Templates", dirs::template_dir()),
            ("3D Objects", home_join("3D Objects")),
        ])
    }

    fn drives(&self) -> FsResult<Vec<DriveInfo>> {
        let drives = (b'A'..=b'Z')
            .map(|letter| format!("{}:\\", letter as char))
            .filter(|root| Path::new(root).is_dir())
            .map(|path| DriveInfo {
                drive_type: drive_type(&path).into(),
                path,
            })
            .collect();
        Ok(drives)
    }

    fn system_info(&self) -> SystemInfo {
        let environment = WINDOWS_ENV
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        SystemInfo {
            environment: Some(environment),
            ..base_system_info()
        }
    }
}

// letters below C are conventionally floppy or removable media
fn drive_type(root: &str) -> &'static str {
    if root.starts_with('A') || root.starts_with('B') {
        "Removable"
    } else {
        "Fixed"
    }
}

impl Platform for MacOs {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn user_directories(&self) -> BTreeMap<String, PathBuf> {
        existing([
            ("Desktop", home_join("Desktop")),
            ("Documents", home_join("Documents")),
            ("Pictures", home_join("Pictures")),
            ("Movies", home_join("Movies")),
            ("Music", home_join("Music")),
            ("Downloads", home_join("Downloads")),
            ("Applications", home_join("Applications")),
            ("Library", home_join("Library")),
        ])
    }
}

impl Platform for Xdg {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn user_directories(&self) -> BTreeMap<String, PathBuf> {
        existing([
            ("Desktop", dirs::desktop_dir().or_else(|| home_join("Desktop"))),
            ("Documents", dirs::document_dir().or_else(|| home_join("Documents"))),
            ("Pictures", dirs::picture_dir().or_else(|| home_join("Pictures"))),
            ("Videos", dirs::video_dir().or_else(|| home_join("Videos"))),
            ("Music", dirs::audio_dir().or_else(|| home_join("Music"))),
            ("Downloads", dirs::download_dir().or_else(|| home_join("Downloads"))),
            ("Templates", dirs::template_dir().or_else(|| home_join("Templates"))),
            ("Public", dirs::public_dir().or_else(|| home_join("Public"))),
        ])
    }
}

fn home_join(name: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(name))
}

/// Keep only entries that resolve to an existing directory.
fn existing<const N: usize>(entries: [(&str, Option<PathBuf>); N]) -> BTreeMap<String, PathBuf> {
    entries
        .into_iter()
        .filter_map(|(name, path)| path.filter(|p| p.is_dir()).map(|p| (name.to_string(), p)))
        .collect()
}

fn base_system_info() -> SystemInfo {
    SystemInfo {
        system: std::env::consts::OS.to_string(),
        family: std::env::consts::FAMILY.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        hostname: hostname(),
        cpus: std::thread::available_parallelism().ok().map(|n| n.get()),
        user_home: dirs::home_dir().map(|p| p.display().to_string()),
        temp_dir: std::env::temp_dir().display().to_string(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        environment: None,
    }
}

fn hostname() -> Option<String> {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
