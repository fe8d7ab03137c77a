//! Tool implementations for the local filesystem MCP server.

use crate::LocalFsServer;
use crate::classify::Category;
use crate::collection::{create_collection, organize_by_date};
use crate::config::DataRoots;
use crate::error::FsResult;
use crate::media::{MediaBackend, THUMBNAIL_SIZE, inspect, thumbnail};
use crate::ops::{self, DirEntry, FileEntry};
use crate::path::resolve_path;
use crate::platform::{DriveInfo, Platform};
use crate::record::{FileRecord, Skipped, extract};
use crate::search::{DEFAULT_MAX_RESULTS, scan, search_by_name, search_contents};
use crate::walk::WalkOptions;
use rmcp::{
    handler::server::wrapper::Parameters,
    schemars::{self, JsonSchema},
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

/// Parameters for scanning a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScanDirectoryParams {
    /// Directory to scan.
    pub path: String,
    /// Descend into subdirectories (default true).
    pub recursive: Option<bool>,
    /// Only return files in these categories.
    pub file_types: Option<Vec<Category>>,
    /// Glob patterns to exclude from the walk.
    pub exclude_patterns: Option<Vec<String>>,
}

/// Parameters for tools that take a single path.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PathParams {
    /// Path to the file or directory.
    pub path: String,
}

/// Parameters for name and content search.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Directory to search in.
    pub path: String,
    /// Case-insensitive text to look for.
    pub query: String,
    /// Descend into subdirectories (default true).
    pub recursive: Option<bool>,
    /// Only consider files in these categories.
    pub file_types: Option<Vec<Category>>,
    /// Glob patterns to exclude from the walk.
    pub exclude_patterns: Option<Vec<String>>,
}

/// Parameters for content search.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchContentsParams {
    /// Directory to search in.
    pub path: String,
    /// Case-insensitive text to look for.
    pub query: String,
    /// Descend into subdirectories (default true).
    pub recursive: Option<bool>,
    /// Only consider files in these categories.
    pub file_types: Option<Vec<Category>>,
    /// Stop after this many matching files (default 100).
    pub max_results: Option<usize>,
    /// Glob patterns to exclude from the walk.
    pub exclude_patterns: Option<Vec<String>>,
}

/// Parameters for reading a text file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadTextFileParams {
    /// Path to the file to read.
    pub path: String,
    /// Return at most this many lines.
    pub max_lines: Option<usize>,
}

/// Parameters for writing a text file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteTextFileParams {
    /// Path to the file to write.
    pub path: String,
    /// UTF-8 content to write.
    pub content: String,
    /// Append instead of replacing (default false).
    pub append: Option<bool>,
}

/// Parameters for copying or moving a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TransferParams {
    /// Source file.
    pub source: String,
    /// Destination path.
    pub destination: String,
    /// Replace an existing destination (default false).
    pub overwrite: Option<bool>,
}

/// Parameters for creating a collection.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCollectionParams {
    /// Collection name. Used as a directory name.
    pub name: String,
    /// Files to record in the collection.
    pub file_paths: Vec<String>,
}

/// Parameters for generating a thumbnail.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateThumbnailParams {
    /// Image or video file.
    pub path: String,
    /// Where to write the JPEG. Defaults to `<stem>_thumb.jpg` beside the source.
    pub output_path: Option<String>,
    /// Maximum width in pixels (default 128).
    pub width: Option<u32>,
    /// Maximum height in pixels (default 128).
    pub height: Option<u32>,
}

/// Parameters for grouping files by date.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrganizeByDateParams {
    /// Files to group.
    pub file_paths: Vec<String>,
    /// Create one `YYYY-MM-DD` directory per group here.
    pub output_dir: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    directory: String,
    file_count: usize,
    files: Vec<FileRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<Skipped>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    directory: String,
    query: String,
    match_count: usize,
    matches: Vec<FileRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<Skipped>,
}

#[derive(Debug, Serialize)]
struct ListDirectoryResponse {
    path: String,
    files: Vec<FileEntry>,
    directories: Vec<DirEntry>,
    file_count: usize,
    directory_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<Skipped>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
    deleted_file: ops::DeletedFile,
}

#[derive(Debug, Serialize)]
struct CreateDirectoryResponse {
    success: bool,
    path: String,
}

#[derive(Debug, Serialize)]
struct UserDirectoriesResponse {
    directories: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Serialize)]
struct DrivesResponse {
    drives: Vec<DriveInfo>,
}

#[tool_router]
impl LocalFsServer {
    /// Create a server over the given data roots, platform and media backend.
    pub fn new(
        roots: DataRoots,
        platform: Arc<dyn Platform>,
        media: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            roots,
            platform,
            media,
            tool_router: Self::tool_router(),
        }
    }

    /// Scan a directory and return metadata for every file.
    #[tool(
        description = "Scan a directory and return metadata (size, timestamps, category, text preview) for each file, optionally filtered by category"
    )]
    async fn scan_directory(
        &self,
        Parameters(params): Parameters<ScanDirectoryParams>,
    ) -> Result<String, String> {
        let root = resolve(&params.path)?;
        let options = walk_options(params.recursive, params.exclude_patterns)?;
        let filter = params.file_types.unwrap_or_default();
        blocking(move || {
            let found = scan(&root, &options, &filter)?;
            Ok(ScanResponse {
                directory: root.display().to_string(),
                file_count: found.items.len(),
                files: found.items,
                skipped: found.skipped,
            })
        })
        .await
    }

    /// Metadata for a single file.
    #[tool(description = "Get detailed metadata for a single file")]
    async fn get_file_metadata(
        &self,
        Parameters(params): Parameters<PathParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        blocking(move || extract(&path)).await
    }

    /// Find files whose name contains the query.
    #[tool(description = "Search for files whose name contains the query, ignoring case")]
    async fn search_files(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<String, String> {
        let root = resolve(&params.path)?;
        let options = walk_options(params.recursive, params.exclude_patterns)?;
        let filter = params.file_types.unwrap_or_default();
        let query = params.query;
        blocking(move || {
            let found = search_by_name(&root, &query, &options, &filter)?;
            Ok(search_response(&root, query, found.items, found.skipped))
        })
        .await
    }

    /// Find text files whose contents contain the query.
    #[tool(
        description = "Search inside text and code files for the query, ignoring case. Reports the first match per file with surrounding context"
    )]
    async fn search_file_contents(
        &self,
        Parameters(params): Parameters<SearchContentsParams>,
    ) -> Result<String, String> {
        let root = resolve(&params.path)?;
        let options = walk_options(params.recursive, params.exclude_patterns)?;
        let filter = params.file_types.unwrap_or_default();
        let max_results = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let query = params.query;
        blocking(move || {
            let found = search_contents(&root, &query, &options, &filter, max_results)?;
            Ok(search_response(&root, query, found.items, found.skipped))
        })
        .await
    }

    /// Read a text file.
    #[tool(description = "Read a text, code or document file, optionally limited to the first lines")]
    async fn read_text_file(
        &self,
        Parameters(params): Parameters<ReadTextFileParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        let max_lines = params.max_lines;
        blocking(move || ops::read_text(&path, max_lines)).await
    }

    /// Write or append text to a file.
    #[tool(description = "Create or overwrite a text file, or append to it")]
    async fn write_text_file(
        &self,
        Parameters(params): Parameters<WriteTextFileParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        let append = params.append.unwrap_or(false);
        let content = params.content;
        blocking(move || ops::write_text(&path, &content, append)).await
    }

    /// Copy a file.
    #[tool(description = "Copy a file, creating destination directories as needed")]
    async fn copy_file(
        &self,
        Parameters(params): Parameters<TransferParams>,
    ) -> Result<String, String> {
        let source = resolve(&params.source)?;
        let destination = resolve(&params.destination)?;
        let overwrite = params.overwrite.unwrap_or(false);
        blocking(move || ops::copy(&source, &destination, overwrite)).await
    }

    /// Move or rename a file.
    #[tool(description = "Move or rename a file, creating destination directories as needed")]
    async fn move_file(
        &self,
        Parameters(params): Parameters<TransferParams>,
    ) -> Result<String, String> {
        let source = resolve(&params.source)?;
        let destination = resolve(&params.destination)?;
        let overwrite = params.overwrite.unwrap_or(false);
        blocking(move || ops::rename(&source, &destination, overwrite)).await
    }

    /// Delete a file.
    #[tool(description = "Delete a single file")]
    async fn delete_file(
        &self,
        Parameters(params): Parameters<PathParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        blocking(move || {
            Ok(DeleteResponse {
                success: true,
                deleted_file: ops::delete(&path)?,
            })
        })
        .await
    }

    /// Create a directory and its parents.
    #[tool(description = "Create a directory and any missing parents. Succeeds if it already exists")]
    async fn create_directory(
        &self,
        Parameters(params): Parameters<PathParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        blocking(move || {
            ops::create_directory(&path)?;
            Ok(CreateDirectoryResponse {
                success: true,
                path: path.display().to_string(),
            })
        })
        .await
    }

    /// List the immediate children of a directory.
    #[tool(description = "List the files and subdirectories directly inside a directory")]
    async fn list_directory(
        &self,
        Parameters(params): Parameters<PathParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        blocking(move || {
            let listing = ops::list_directory(&path)?;
            Ok(ListDirectoryResponse {
                path: path.display().to_string(),
                file_count: listing.files.len(),
                directory_count: listing.directories.len(),
                files: listing.files,
                directories: listing.directories,
                skipped: listing.skipped,
            })
        })
        .await
    }

    /// Record a set of files as a named collection.
    #[tool(
        description = "Save metadata for a set of files as a named collection under the server data directory"
    )]
    async fn create_collection(
        &self,
        Parameters(params): Parameters<CreateCollectionParams>,
    ) -> Result<String, String> {
        let paths = resolve_all(&params.file_paths)?;
        let roots = self.roots.clone();
        let name = params.name;
        blocking(move || create_collection(&roots, &name, &paths)).await
    }

    /// Well-known user folders.
    #[tool(description = "List the well-known user folders (Desktop, Documents, Downloads, ...) that exist")]
    async fn list_user_directories(&self) -> Result<String, String> {
        let platform = Arc::clone(&self.platform);
        blocking(move || {
            Ok(UserDirectoriesResponse {
                directories: platform.user_directories(),
            })
        })
        .await
    }

    /// Mounted drives.
    #[tool(description = "List mounted drives. Only available on Windows")]
    async fn list_drives(&self) -> Result<String, String> {
        let platform = Arc::clone(&self.platform);
        blocking(move || {
            Ok(DrivesResponse {
                drives: platform.drives()?,
            })
        })
        .await
    }

    /// Host details.
    #[tool(description = "Get basic information about the host system")]
    async fn get_system_info(&self) -> Result<String, String> {
        let platform = Arc::clone(&self.platform);
        blocking(move || Ok(serde_json::json!({ "system_info": platform.system_info() }))).await
    }

    /// Detailed image, video or audio properties.
    #[tool(
        description = "Get detailed properties of an image, video or audio file: dimensions, codecs, duration and container tags"
    )]
    async fn get_media_metadata(
        &self,
        Parameters(params): Parameters<PathParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        let media = Arc::clone(&self.media);
        blocking(move || inspect(&path, media.as_ref())).await
    }

    /// Write a small JPEG preview of an image or video.
    #[tool(description = "Generate a JPEG thumbnail for an image or video file")]
    async fn generate_thumbnail(
        &self,
        Parameters(params): Parameters<GenerateThumbnailParams>,
    ) -> Result<String, String> {
        let path = resolve(&params.path)?;
        let output = params.output_path.as_deref().map(resolve).transpose()?;
        let width = params.width.unwrap_or(THUMBNAIL_SIZE);
        let height = params.height.unwrap_or(THUMBNAIL_SIZE);
        let media = Arc::clone(&self.media);
        blocking(move || thumbnail(&path, output.as_deref(), width, height, media.as_ref())).await
    }

    /// Group files by their creation date.
    #[tool(
        description = "Group files by creation date (YYYY-MM-DD), optionally creating a directory per date. Files are not moved"
    )]
    async fn organize_by_date(
        &self,
        Parameters(params): Parameters<OrganizeByDateParams>,
    ) -> Result<String, String> {
        let paths = resolve_all(&params.file_paths)?;
        let output = params.output_dir.as_deref().map(resolve).transpose()?;
        blocking(move || organize_by_date(&paths, output.as_deref())).await
    }
}

/// `{"error": "<message>"}`, the payload of every failed tool call.
fn error_payload(err: impl Display) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

fn resolve(raw: &str) -> Result<PathBuf, String> {
    resolve_path(raw).map_err(error_payload)
}

fn resolve_all(raw: &[String]) -> Result<Vec<PathBuf>, String> {
    raw.iter().map(|p| resolve(p)).collect()
}

fn walk_options(
    recursive: Option<bool>,
    exclude: Option<Vec<String>>,
) -> Result<WalkOptions, String> {
    WalkOptions::new(recursive.unwrap_or(true))
        .exclude_patterns(&exclude.unwrap_or_default())
        .map_err(error_payload)
}

fn search_response(
    root: &std::path::Path,
    query: String,
    matches: Vec<FileRecord>,
    skipped: Vec<Skipped>,
) -> SearchResponse {
    SearchResponse {
        directory: root.display().to_string(),
        query,
        match_count: matches.len(),
        matches,
        skipped,
    }
}

/// Run filesystem work off the async runtime and render the result as JSON.
async fn blocking<T, F>(work: F) -> Result<String, String>
where
    F: FnOnce() -> FsResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => serde_json::to_string_pretty(&value).map_err(error_payload),
        Ok(Err(e)) => Err(error_payload(e)),
        Err(e) => Err(error_payload(e)),
    }
}
