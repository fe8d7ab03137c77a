//! Media inspection and thumbnails.
//!
//! Images are decoded in-process with `image`. Audio and video go through a
//! [`MediaBackend`], by default the `ffprobe` and `ffmpeg` executables.

use crate::classify::{Category, sniff};
use crate::error::{FsError, FsResult};
use crate::path::extension;
use crate::record::{FileRecord, extract};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

/// Default thumbnail bounding box.
pub const THUMBNAIL_SIZE: u32 = 128;

const THUMBNAIL_IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];
const THUMBNAIL_VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "flv", "webm"];

/// Raw `ffprobe -print_format json -show_format -show_streams` output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    pub format: Option<ProbeFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
    pub r_frame_rate: Option<String>,
    pub channels: Option<u32>,
    pub sample_rate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    pub format_name: Option<String>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// External tooling for audio and video.
pub trait MediaBackend: Send + Sync + fmt::Debug {
    /// Probe container and stream details.
    fn probe(&self, path: &Path) -> FsResult<ProbeOutput>;

    /// Write one frame taken at `at_secs`, scaled to `width`x`height`, to `output`.
    fn extract_frame(
        &self,
        path: &Path,
        at_secs: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> FsResult<()>;
}

/// [`MediaBackend`] that shells out to ffprobe and ffmpeg.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    pub ffprobe: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".into(),
            ffmpeg: "ffmpeg".into(),
        }
    }
}

impl Ffmpeg {
    fn run(&self, program: &Path, command: &mut Command) -> FsResult<Output> {
        let tool = program.display().to_string();
        debug!(?command, "running media tool");
        let output = command.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FsError::Unsupported(format!("{tool} is not installed")),
            _ => FsError::Io(e),
        })?;
        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(%tool, status = %output.status, "media tool failed");
            return Err(FsError::Tool {
                tool,
                message: if message.is_empty() {
                    output.status.to_string()
                } else {
                    message
                },
            });
        }
        Ok(output)
    }
}

impl MediaBackend for Ffmpeg {
    fn probe(&self, path: &Path) -> FsResult<ProbeOutput> {
        let output = self.run(
            &self.ffprobe,
            Command::new(&self.ffprobe)
                .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
                .arg(path),
        )?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn extract_frame(
        &self,
        path: &Path,
        at_secs: f64,
        width: u32,
        height: u32,
        output: &Path,
    ) -> FsResult<()> {
        self.run(
            &self.ffmpeg,
            Command::new(&self.ffmpeg)
                .args(["-y", "-v", "error", "-ss"])
                .arg(format!("{at_secs:.3}"))
                .arg("-i")
                .arg(path)
                .arg("-vf")
                .arg(format!("scale={width}:{height}"))
                .args(["-frames:v", "1"])
                .arg(output),
        )?;
        Ok(())
    }
}

/// Decoded image properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoStream {
    pub codec: Option<String>,
    pub width: u32,
    pub height: u32,
    pub duration: Option<f64>,
    pub bit_rate: Option<u64>,
    pub fps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioStream {
    pub codec: Option<String>,
    pub channels: u32,
    pub sample_rate: Option<u32>,
    pub bit_rate: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    pub name: Option<String>,
    pub duration: Option<f64>,
    pub bit_rate: Option<u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Everything known about a media file.
#[derive(Debug, Serialize)]
pub struct MediaReport {
    pub file: FileRecord,
    /// Category from the file signature.
    pub detected: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoStream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioStream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    /// Extraction failure that left the details above empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_error: Option<String>,
}

/// Inspect an image, video or audio file.
pub fn inspect(path: &Path, backend: &dyn MediaBackend) -> FsResult<MediaReport> {
    let file = extract(path)?;
    let detected = sniff(path);
    let mut report = MediaReport {
        file,
        detected,
        image: None,
        video: None,
        audio: None,
        container: None,
        media_error: None,
    };

    match detected {
        Category::Image => match image_details(path) {
            Ok(details) => report.image = Some(details),
            Err(e) => report.media_error = Some(e.to_string()),
        },
        Category::Video | Category::Audio => match backend.probe(path) {
            Ok(probe) => {
                let summary = summarize(&probe);
                report.video = summary.video;
                report.audio = summary.audio;
                report.container = summary.container;
            }
            Err(e) => report.media_error = Some(e.to_string()),
        },
        _ => {
            return Err(FsError::Unsupported(format!(
                "not a recognised media file: {}",
                path.display()
            )));
        }
    }
    Ok(report)
}

fn image_details(path: &Path) -> FsResult<ImageDetails> {
    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().map(|f| format!("{f:?}").to_uppercase());
    let (width, height) = reader.into_dimensions()?;
    Ok(ImageDetails {
        format,
        width,
        height,
    })
}

/// Streams and container picked out of a probe.
#[derive(Debug, Default, PartialEq)]
pub struct ProbeSummary {
    pub video: Option<VideoStream>,
    pub audio: Option<AudioStream>,
    pub container: Option<Container>,
}

/// Reduce probe output to the first video stream, first audio stream and container.
pub fn summarize(probe: &ProbeOutput) -> ProbeSummary {
    let of_type = |kind: &str| {
        probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(kind))
    };

    let video = of_type("video").map(|s| VideoStream {
        codec: s.codec_name.clone(),
        width: s.width.unwrap_or(0),
        height: s.height.unwrap_or(0),
        duration: parse(&s.duration),
        bit_rate: parse(&s.bit_rate),
        fps: s.r_frame_rate.as_deref().and_then(parse_rate),
    });
    let audio = of_type("audio").map(|s| AudioStream {
        codec: s.codec_name.clone(),
        channels: s.channels.unwrap_or(0),
        sample_rate: parse(&s.sample_rate),
        bit_rate: parse(&s.bit_rate),
    });
    let container = probe.format.as_ref().map(|f| Container {
        name: f.format_name.clone(),
        duration: parse(&f.duration),
        bit_rate: parse(&f.bit_rate),
        tags: f.tags.clone(),
    });

    ProbeSummary {
        video,
        audio,
        container,
    }
}

fn parse<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

/// Parse an ffprobe rational such as `30000/1001`.
pub fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    (den != 0.0).then(|| num / den)
}

/// Result of thumbnail generation.
#[derive(Debug, Serialize)]
pub struct Thumbnail {
    pub success: bool,
    pub thumbnail_path: String,
    pub original_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_time: Option<f64>,
}

/// Write a JPEG thumbnail that fits within `width`x`height`.
///
/// Without `output`, the thumbnail goes next to the source as `<stem>_thumb.jpg`.
/// Video frames are taken at one second or a tenth of the duration,
/// whichever is earlier.
pub fn thumbnail(
    path: &Path,
    output: Option<&Path>,
    width: u32,
    height: u32,
    backend: &dyn MediaBackend,
) -> FsResult<Thumbnail> {
    if !path.is_file() {
        return Err(FsError::NotFound(path.to_path_buf()));
    }
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(path));
    let ext = extension(path).unwrap_or_default();

    let frame_time = if THUMBNAIL_IMAGE_EXTS.contains(&ext.as_str()) {
        image::open(path)?
            .thumbnail(width, height)
            .to_rgb8()
            .save_with_format(&output, image::ImageFormat::Jpeg)?;
        None
    } else if THUMBNAIL_VIDEO_EXTS.contains(&ext.as_str()) {
        let duration = backend
            .probe(path)?
            .format
            .as_ref()
            .and_then(|f| parse::<f64>(&f.duration))
            .unwrap_or(0.0);
        let at = (duration * 0.1).min(1.0);
        backend.extract_frame(path, at, width, height, &output)?;
        Some(at)
    } else {
        return Err(FsError::Unsupported(format!(
            "thumbnails are not supported for .{ext} files"
        )));
    };

    Ok(Thumbnail {
        success: true,
        thumbnail_path: output.display().to_string(),
        original_path: path.display().to_string(),
        frame_time,
    })
}

fn default_output(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_thumb.jpg"))
}
