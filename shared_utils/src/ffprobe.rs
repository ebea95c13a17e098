//! FFprobe wrapper module
//!
//! Rotation, duration and video stream info for a single input file.

use crate::errors::{CutterError, Result};
use crate::logging::log_external_tool;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    pub format_name: String,
    pub duration: Option<f64>,
    pub video_codec: Option<String>,
    /// Kept verbatim: it is handed back to ffmpeg as `-b:v`.
    pub video_bit_rate: Option<String>,
    pub width: u32,
    pub height: u32,
    pub rotate_tag: Option<i32>,
    pub side_data_rotation: Option<i32>,
    pub has_audio: bool,
}

impl ProbeResult {
    /// Rotation from the JSON description alone: tag first, then side data.
    pub fn rotation(&self) -> Option<i32> {
        self.rotate_tag.or(self.side_data_rotation)
    }
}

// ═══════════════════════════════════════════════════════════════
// JSON model (only the fields we read)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    format_name: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    bit_rate: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    tags: Option<FfprobeTags>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    #[serde(default)]
    rotate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeSideData {
    #[serde(default)]
    rotation: Option<f64>,
    #[serde(default)]
    displaymatrix: Option<String>,
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        CutterError::FFprobeError(format!("Invalid path encoding: {}", path.display()))
    })
}

fn run_ffprobe(args: &[&str]) -> Result<String> {
    debug!(args = ?args, "Running ffprobe");
    let start = Instant::now();
    let output = Command::new("ffprobe").args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CutterError::ToolNotFound("ffprobe".to_string())
        } else {
            CutterError::Io(e)
        }
    })?;
    log_external_tool(
        "ffprobe",
        args,
        &String::from_utf8_lossy(&output.stderr),
        output.status.code(),
        start.elapsed(),
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CutterError::FFprobeError(if stderr.trim().is_empty() {
            format!("exit code {:?}", output.status.code())
        } else {
            stderr.trim().to_string()
        }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Full JSON probe of format and streams.
pub fn probe_video(path: &Path) -> Result<ProbeResult> {
    if !path.is_file() {
        return Err(CutterError::FFprobeError(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let json = run_ffprobe(&[
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
        "--",
        path_arg(path)?,
    ])?;

    parse_probe_json(&json)
}

pub fn parse_probe_json(json: &str) -> Result<ProbeResult> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| CutterError::FFprobeError(e.to_string()))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let rotate_tag = video
        .and_then(|s| s.tags.as_ref())
        .and_then(|t| t.rotate.as_deref())
        .and_then(parse_rotate_tag);

    let side_data_rotation = video.and_then(|s| {
        s.side_data_list.iter().find_map(|sd| {
            sd.rotation
                .map(|r| r.round() as i32)
                .or_else(|| sd.displaymatrix.as_deref().and_then(parse_display_matrix))
        })
    });

    Ok(ProbeResult {
        format_name: parsed
            .format
            .format_name
            .unwrap_or_else(|| "unknown".to_string()),
        duration: parsed
            .format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok()),
        video_codec: video.and_then(|s| s.codec_name.clone()),
        video_bit_rate: video.and_then(|s| s.bit_rate.clone()),
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
        rotate_tag,
        side_data_rotation,
        has_audio,
    })
}

/// Container duration, as reported by `format=duration`.
pub fn get_duration(path: &Path) -> Result<Duration> {
    let output = run_ffprobe(&[
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
        "--",
        path_arg(path)?,
    ])?;

    parse_duration_output(&output).ok_or_else(|| {
        CutterError::FFprobeError("Could not determine video duration".to_string())
    })
}

pub fn parse_duration_output(output: &str) -> Option<Duration> {
    let secs: f64 = output.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

// ═══════════════════════════════════════════════════════════════
// Rotation
// ═══════════════════════════════════════════════════════════════

/// Rotation of the first video stream in degrees; 0 when unknown.
///
/// Tries the `rotate` tag, then the display matrix, then the side-data
/// `rotation` field of the JSON probe. Failures are logged, never returned.
pub fn probe_rotation(path: &Path) -> i32 {
    match try_probe_rotation(path) {
        Ok(Some(rotation)) => rotation,
        Ok(None) => 0,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Error reading video rotation");
            0
        }
    }
}

/// Like [`probe_rotation`] but hands ffprobe failures back to the caller.
pub fn try_probe_rotation(path: &Path) -> Result<Option<i32>> {
    let path_str = path_arg(path)?;

    let tag = run_ffprobe(&[
        "-v",
        "quiet",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream_tags=rotate",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
        "--",
        path_str,
    ])?;
    if let Some(rotation) = parse_rotate_tag(&tag) {
        debug!(rotation, "Rotation from rotate tag");
        return Ok(Some(rotation));
    }

    let matrix = run_ffprobe(&[
        "-v",
        "quiet",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream_side_data=displaymatrix",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
        "--",
        path_str,
    ])?;
    if let Some(rotation) = parse_display_matrix(&matrix) {
        debug!(rotation, "Rotation from display matrix");
        return Ok(Some(rotation));
    }

    Ok(probe_video(path)?.side_data_rotation)
}

pub fn parse_rotate_tag(output: &str) -> Option<i32> {
    output.trim().parse::<i32>().ok()
}

/// Angle encoded by a 3×3 display matrix, `round(atan2(m[3], m[0]))`.
///
/// Accepts ffprobe's text dump, where each row is prefixed with a row offset
/// such as `00000000:`. Returns `None` when fewer than nine values are found.
pub fn parse_display_matrix(output: &str) -> Option<i32> {
    let values: Vec<f64> = output
        .lines()
        .flat_map(|line| {
            let body = match line.split_once(':') {
                Some((prefix, rest)) if is_row_offset(prefix) => rest,
                _ => line,
            };
            body.split_whitespace()
                .filter_map(|tok| tok.parse::<f64>().ok())
                .collect::<Vec<_>>()
        })
        .collect();

    if values.len() < 9 {
        return None;
    }

    let (m00, m10) = (values[0], values[3]);
    if m00 == 0.0 && m10 == 0.0 {
        return None;
    }
    Some(m10.atan2(m00).to_degrees().round() as i32)
}

fn is_row_offset(prefix: &str) -> bool {
    let p = prefix.trim();
    !p.is_empty() && p.chars().all(|c| c.is_ascii_hexdigit())
}

/// Maps any angle into `[0, 360)`.
pub fn normalize_rotation(degrees: i32) -> u16 {
    degrees.rem_euclid(360) as u16
}
