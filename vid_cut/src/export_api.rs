//! Export API Module
//!
//! Straight-line procedures behind the CLI subcommands:
//! - `check`: external tool availability
//! - `probe`: rotation, duration and stream info of one file
//! - `export`: open, apply in/out + transform, build the ffmpeg command, run it

use anyhow::{bail, Context, Result};
use serde::Serialize;
use shared_utils::command::{build_export_args, ExportCommand};
use shared_utils::errors::CutterError;
use shared_utils::export_log::{self, ExportLog, DEFAULT_EXPORT_LOG};
use shared_utils::ffmpeg_process::{run_export, ExportOutcome, ExportRun};
use shared_utils::ffprobe::{self, normalize_rotation, ProbeResult};
use shared_utils::path_validator::validate_export_paths;
use shared_utils::progress::{create_spinner, ExportProgress};
use shared_utils::session::{default_output_path, EditSession};
use shared_utils::tools::{ToolAvailability, INSTALL_HINT};
use shared_utils::transform::Transform;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SUCCESS_MESSAGE: &str = "Video exported successfully!";
pub const FAILURE_MESSAGE: &str =
    "Error exporting video. Please check if FFmpeg is installed correctly.";

/// Settings of one `export` run, built from CLI flags.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// `None` → `<stem>_exported.<ext>` next to the input.
    pub output: Option<PathBuf>,
    pub in_point: Option<Duration>,
    pub out_point: Option<Duration>,
    pub transform: Transform,
    pub use_nvenc: bool,
    pub dry_run: bool,
    pub export_log: PathBuf,
    pub verbose: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: None,
            in_point: None,
            out_point: None,
            transform: Transform::Normal,
            use_nvenc: true,
            dry_run: false,
            export_log: PathBuf::from(DEFAULT_EXPORT_LOG),
            verbose: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// check
// ═══════════════════════════════════════════════════════════════

/// Detects tools and records the NVENC result in the export log.
pub fn check_tools(export_log_path: &Path) -> ToolAvailability {
    let tools = ToolAvailability::detect().clone();
    record_tool_notes(export_log_path, &tools);
    tools
}

fn record_tool_notes(export_log_path: &Path, tools: &ToolAvailability) {
    note(
        export_log_path,
        &format!("NVENC Support: {}", tools.nvenc_status()),
    );
    if tools.nvenc {
        note(
            export_log_path,
            "Hardware acceleration will be used for video encoding.",
        );
    }
}

fn note(path: &Path, message: &str) {
    if let Err(e) = export_log::append_note(path, message) {
        warn!(path = %path.display(), error = %e, "Failed to append to export log");
    }
}

// ═══════════════════════════════════════════════════════════════
// probe
// ═══════════════════════════════════════════════════════════════

/// What `probe` reports about a file.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub path: PathBuf,
    /// As found in metadata, possibly negative.
    pub rotation: i32,
    /// `rotation` mapped into `[0, 360)`.
    pub rotation_normalized: u16,
    pub duration_secs: Option<f64>,
    pub info: Option<ProbeResult>,
}

pub fn probe_file(input: &Path, export_log_path: &Path) -> Result<ProbeReport> {
    if !input.is_file() {
        bail!(CutterError::InvalidPath(format!(
            "File not found: {}",
            input.display()
        )));
    }

    let spinner = create_spinner("ffprobe", "Reading metadata...");
    let rotation = match ffprobe::try_probe_rotation(input) {
        Ok(rotation) => rotation.unwrap_or(0),
        Err(e) => {
            warn!(path = %input.display(), error = %e, "Error reading video rotation");
            note(
                export_log_path,
                &format!("Error reading video rotation: {}", e),
            );
            0
        }
    };
    note(
        export_log_path,
        &format!("Initial rotation from metadata: {} degrees", rotation),
    );

    let duration = match ffprobe::get_duration(input) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(path = %input.display(), error = %e, "Could not read duration");
            None
        }
    };

    let info = match ffprobe::probe_video(input) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(path = %input.display(), error = %e, "Could not read stream info");
            None
        }
    };

    spinner.finish_and_clear();

    Ok(ProbeReport {
        path: input.to_path_buf(),
        rotation,
        rotation_normalized: normalize_rotation(rotation),
        duration_secs: duration.map(|d| d.as_secs_f64()).or_else(|| {
            info.as_ref()
                .and_then(|i| i.duration)
                .filter(|secs| Duration::try_from_secs_f64(*secs).is_ok())
        }),
        info,
    })
}

// ═══════════════════════════════════════════════════════════════
// export
// ═══════════════════════════════════════════════════════════════

/// Input opened for editing.
#[derive(Debug, Clone)]
pub struct OpenedVideo {
    pub session: EditSession,
    pub info: Option<ProbeResult>,
}

impl OpenedVideo {
    pub fn from_probe(report: ProbeReport) -> Self {
        let session = EditSession::new(&report.path)
            .with_initial_rotation(report.rotation)
            .with_media_duration(
                report
                    .duration_secs
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            );
        Self {
            session,
            info: report.info,
        }
    }

    /// Applies in/out points and the transform from `config`.
    pub fn apply(&mut self, config: &ExportConfig) {
        if let Some(t) = config.in_point {
            self.session.mark_in(t);
        }
        if let Some(t) = config.out_point {
            self.session.mark_out(t);
        }
        self.session.set_transform(config.transform);
    }

    /// Progress denominator; zero when the media duration is unknown.
    pub fn expected_duration(&self) -> Duration {
        match self.session.media_duration {
            Some(total) => self.session.expected_output_duration(total),
            None => Duration::ZERO,
        }
    }
}

#[derive(Debug)]
pub enum ExportReport {
    DryRun {
        output: PathBuf,
        command: ExportCommand,
        opened: OpenedVideo,
    },
    Finished {
        output: PathBuf,
        command: ExportCommand,
        outcome: ExportOutcome,
    },
}

/// Plans the export without running anything but ffprobe.
pub fn plan_export(
    input: &Path,
    config: &ExportConfig,
    tools: &ToolAvailability,
) -> Result<(OpenedVideo, PathBuf, ExportCommand)> {
    let output = config
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));
    validate_export_paths(input, &output)?;

    let mut opened = OpenedVideo::from_probe(probe_file(input, &config.export_log)?);
    opened.apply(config);

    let tools = if config.use_nvenc {
        tools.clone()
    } else {
        tools.without_nvenc()
    };
    let command = build_export_args(&opened.session, &output, opened.info.as_ref(), &tools)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        transform = %opened.session.transform,
        encoder = %command.encoder,
        "Export planned"
    );
    debug!(command = %command.command_line(), "FFmpeg arguments");

    Ok((opened, output, command))
}

/// Full export: plan, then run ffmpeg with progress and the export log.
pub fn export_video(input: &Path, config: &ExportConfig) -> Result<ExportReport> {
    let tools = check_tools(&config.export_log);
    if !tools.can_export() {
        let missing = if tools.ffmpeg { "ffprobe" } else { "ffmpeg" };
        return Err(anyhow::Error::new(CutterError::ToolNotFound(missing.to_string()))
            .context(INSTALL_HINT));
    }

    let (opened, output, command) = plan_export(input, config, &tools)?;

    if config.dry_run {
        return Ok(ExportReport::DryRun {
            output,
            command,
            opened,
        });
    }

    let log = ExportLog::create(&config.export_log, input, &output, &command.command_line())
        .context("Failed to start export log")?;

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let progress = ExportProgress::new(&file_name);
    if config.verbose {
        progress.println(&format!("   {}", command.command_line()));
    }

    let run = ExportRun::new(opened.expected_duration()).with_log(&log);
    let result = run_export(&command.args, &run, |update| progress.update(update));

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.finish(false);
            return Err(e.context(FAILURE_MESSAGE));
        }
    };
    progress.finish(outcome.success);

    Ok(ExportReport::Finished {
        output,
        command,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn report(path: &str, rotation: i32, duration: Option<f64>) -> ProbeReport {
        ProbeReport {
            path: PathBuf::from(path),
            rotation,
            rotation_normalized: normalize_rotation(rotation),
            duration_secs: duration,
            info: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert!(config.use_nvenc);
        assert!(!config.dry_run);
        assert_eq!(config.export_log, PathBuf::from("ffmpeg-output.log"));
        assert_eq!(config.transform, Transform::Normal);
    }

    #[test]
    fn test_opened_video_carries_probe() {
        let opened = OpenedVideo::from_probe(report("clip.mp4", -90, Some(12.5)));
        assert_eq!(opened.session.initial_rotation, -90);
        assert_eq!(
            opened.session.media_duration,
            Some(Duration::from_millis(12_500))
        );
    }

    #[test]
    fn test_out_of_range_duration_is_unknown() {
        let opened = OpenedVideo::from_probe(report("clip.mp4", 0, Some(1e30)));
        assert_eq!(opened.session.media_duration, None);
        assert_eq!(opened.expected_duration(), Duration::ZERO);
    }

    #[test]
    fn test_apply_and_expected_duration() {
        let mut opened = OpenedVideo::from_probe(report("clip.mp4", 0, Some(60.0)));
        opened.apply(&ExportConfig {
            in_point: Some(Duration::from_secs(10)),
            out_point: Some(Duration::from_secs(25)),
            transform: Transform::Mirror,
            ..ExportConfig::default()
        });
        assert!(opened.session.has_edits());
        assert_eq!(opened.session.transform, Transform::Mirror);
        assert_eq!(opened.expected_duration(), Duration::from_secs(15));
    }

    #[test]
    fn test_in_point_only_runs_to_end() {
        let mut opened = OpenedVideo::from_probe(report("clip.mp4", 0, Some(60.0)));
        opened.apply(&ExportConfig {
            in_point: Some(Duration::from_secs(45)),
            ..ExportConfig::default()
        });
        assert_eq!(opened.expected_duration(), Duration::from_secs(15));
    }

    #[test]
    fn test_unknown_duration_gives_zero() {
        let mut opened = OpenedVideo::from_probe(report("clip.mp4", 0, None));
        opened.apply(&ExportConfig {
            out_point: Some(Duration::from_secs(5)),
            ..ExportConfig::default()
        });
        assert_eq!(opened.expected_duration(), Duration::ZERO);
    }

    #[test]
    fn test_probe_missing_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join(DEFAULT_EXPORT_LOG);
        let err = probe_file(&dir.path().join("missing.mp4"), &log).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_probe_unreadable_file_logs_rotation_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("notes.mp4");
        fs::write(&input, b"not a video").unwrap();
        let log = dir.path().join(DEFAULT_EXPORT_LOG);

        let report = probe_file(&input, &log).unwrap();
        assert_eq!(report.rotation, 0);
        assert_eq!(report.duration_secs, None);

        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("Error reading video rotation: "));
        assert!(content.contains("Initial rotation from metadata: 0 degrees"));
    }

    #[test]
    fn test_tool_notes_mention_hardware_acceleration() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join(DEFAULT_EXPORT_LOG);
        let listing = " V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)\n";

        record_tool_notes(&log, &ToolAvailability::from_listing(Some(listing), true));
        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("NVENC Support: Available"));
        assert!(content.contains("Hardware acceleration will be used for video encoding."));
    }

    #[test]
    fn test_tool_notes_without_nvenc() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join(DEFAULT_EXPORT_LOG);

        record_tool_notes(&log, &ToolAvailability::from_listing(Some(""), true));
        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("NVENC Support: Not Available"));
        assert!(!content.contains("Hardware acceleration"));
    }

    #[test]
    fn test_plan_rejects_same_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"x").unwrap();

        let config = ExportConfig {
            output: Some(input.clone()),
            transform: Transform::Rotate90,
            export_log: dir.path().join(DEFAULT_EXPORT_LOG),
            ..ExportConfig::default()
        };
        let tools = ToolAvailability::from_listing(Some(""), true);
        let err = plan_export(&input, &config, &tools).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CutterError>(),
            Some(CutterError::PathConflict(_))
        ));
    }

    #[test]
    fn test_plan_rejects_unsupported_container() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("clip.mp4");
        fs::write(&input, b"x").unwrap();

        let config = ExportConfig {
            output: Some(dir.path().join("clip.gif")),
            export_log: dir.path().join(DEFAULT_EXPORT_LOG),
            ..ExportConfig::default()
        };
        let tools = ToolAvailability::from_listing(Some(""), true);
        let err = plan_export(&input, &config, &tools).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CutterError>(),
            Some(CutterError::UnsupportedContainer(_))
        ));
    }
}
