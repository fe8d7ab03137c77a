//! Coarse file-type classification.
//!
//! [`classify`] works from the path alone: declared media type first, then a
//! static extension table. [`sniff`] additionally inspects the first bytes of
//! the file and is only used by the media inspection tools.

use crate::path::extension;
use mime_guess::mime;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Coarse category of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Audio,
    Text,
    Code,
    Document,
    Spreadsheet,
    Presentation,
    Data,
    Archive,
    Executable,
    Unknown,
}

impl Category {
    /// Categories whose files are read as text for previews and content search.
    pub fn is_textual(self) -> bool {
        matches!(self, Category::Text | Category::Code | Category::Document)
    }

    /// Whether this category passes an optional filter. Empty means all.
    pub fn matches(self, filter: &[Category]) -> bool {
        filter.is_empty() || filter.contains(&self)
    }
}

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "flv", "webm"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a"];
const DOCUMENT_EXTS: &[&str] = &["pdf", "txt", "md", "rtf", "doc", "docx"];
const CODE_EXTS: &[&str] = &[
    "py", "js", "html", "css", "java", "cpp", "c", "h", "cs", "php", "rb", "go", "rs", "ts",
];
const DATA_EXTS: &[&str] = &["csv", "json", "xml", "yaml", "yml", "sql", "db", "sqlite"];
const ARCHIVE_EXTS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2"];
const EXECUTABLE_EXTS: &[&str] = &["exe", "msi", "bat", "sh", "app", "dmg"];
const SPREADSHEET_EXTS: &[&str] = &["xls", "xlsx"];
const PRESENTATION_EXTS: &[&str] = &["ppt", "pptx"];

/// Extensions whose contents are read as text regardless of category.
pub const TEXT_EXTS: &[&str] = &[
    "txt", "md", "csv", "json", "xml", "html", "css", "js", "py", "java", "c", "cpp", "h", "cs",
    "php", "rb", "go", "rs", "ts",
];

/// Whether the path's extension is on the text allow-list.
pub fn has_text_extension(path: &Path) -> bool {
    extension(path).is_some_and(|ext| TEXT_EXTS.contains(&ext.as_str()))
}

/// Classify a path by its name.
pub fn classify(path: &Path) -> Category {
    let ext = extension(path);
    let ext = ext.as_deref();

    // mime tables call most sources text/x-*, and .ts an MPEG stream
    if ext.is_some_and(|e| CODE_EXTS.contains(&e)) {
        return Category::Code;
    }

    if let Some(category) = mime_guess::from_path(path).first().and_then(|m| from_mime(&m)) {
        return category;
    }

    ext.map(from_extension).unwrap_or(Category::Unknown)
}

fn from_mime(m: &mime::Mime) -> Option<Category> {
    let top = m.type_();
    if top == mime::IMAGE {
        return Some(Category::Image);
    }
    if top == mime::VIDEO {
        return Some(Category::Video);
    }
    if top == mime::AUDIO {
        return Some(Category::Audio);
    }
    if top == mime::TEXT {
        return Some(Category::Text);
    }
    let essence = m.essence_str();
    if essence == "application/pdf"
        || essence == "application/msword"
        || essence.starts_with("application/vnd.openxmlformats-officedocument.wordprocessingml")
    {
        return Some(Category::Document);
    }
    if essence.starts_with("application/vnd.ms-excel")
        || essence.starts_with("application/vnd.openxmlformats-officedocument.spreadsheetml")
    {
        return Some(Category::Spreadsheet);
    }
    if essence.starts_with("application/vnd.ms-powerpoint")
        || essence.starts_with("application/vnd.openxmlformats-officedocument.presentationml")
    {
        return Some(Category::Presentation);
    }
    None
}

fn from_extension(ext: &str) -> Category {
    let tables: [(&[&str], Category); 10] = [
        (IMAGE_EXTS, Category::Image),
        (VIDEO_EXTS, Category::Video),
        (AUDIO_EXTS, Category::Audio),
        (DOCUMENT_EXTS, Category::Document),
        (CODE_EXTS, Category::Code),
        (DATA_EXTS, Category::Data),
        (ARCHIVE_EXTS, Category::Archive),
        (EXECUTABLE_EXTS, Category::Executable),
        (SPREADSHEET_EXTS, Category::Spreadsheet),
        (PRESENTATION_EXTS, Category::Presentation),
    ];
    tables
        .iter()
        .find(|(exts, _)| exts.contains(&ext))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Unknown)
}

/// Known magic-number prefixes. RIFF containers are resolved separately.
const SIGNATURES: &[(&[u8], Category)] = &[
    (b"\xFF\xD8\xFF", Category::Image),
    (b"\x89PNG\r\n\x1A\n", Category::Image),
    (b"GIF8", Category::Image),
    (b"BM", Category::Image),
    (b"II*\x00", Category::Image),
    (b"MM\x00*", Category::Image),
    (b"\x00\x00\x00\x18ftyp", Category::Video),
    (b"\x00\x00\x00\x1Cftyp", Category::Video),
    (b"\x00\x00\x00\x20ftyp", Category::Video),
    (b"\x00\x00\x01\xBA", Category::Video),
    (b"\x00\x00\x01\xB3", Category::Video),
    (b"ID3", Category::Audio),
    (b"\xFF\xFB", Category::Audio),
    (b"\xFF\xF3", Category::Audio),
    (b"\xFF\xF2", Category::Audio),
    (b"OggS", Category::Audio),
    (b"fLaC", Category::Audio),
];

/// Size of the header read by [`sniff`].
pub const HEADER_LEN: u64 = 16;

/// Classify a file by its leading bytes, falling back to media extensions.
///
/// Returns only `image`, `video`, `audio` or `unknown`.
pub fn sniff(path: &Path) -> Category {
    if let Some(category) = read_header(path).as_deref().and_then(from_signature) {
        return category;
    }
    match extension(path).as_deref() {
        Some(e) if IMAGE_EXTS.contains(&e) => Category::Image,
        Some(e) if VIDEO_EXTS.contains(&e) => Category::Video,
        Some(e) if AUDIO_EXTS.contains(&e) => Category::Audio,
        _ => Category::Unknown,
    }
}

fn read_header(path: &Path) -> Option<Vec<u8>> {
    let file = std::fs::File::open(path).ok()?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    file.take(HEADER_LEN).read_to_end(&mut header).ok()?;
    Some(header)
}

/// Match a file header against the signature table.
pub fn from_signature(header: &[u8]) -> Option<Category> {
    if header.starts_with(b"RIFF") {
        return match header.get(8..12) {
            Some(b"WAVE") => Some(Category::Audio),
            Some(b"AVI ") => Some(Category::Video),
            Some(b"WEBP") => Some(Category::Image),
            _ => Some(Category::Audio),
        };
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| header.starts_with(magic))
        .map(|(_, category)| *category)
}
