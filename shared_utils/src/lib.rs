//! Shared Utilities for vid_cut
//!
//! Everything the cutter does apart from argument parsing:
//! - FFprobe wrapper (rotation, duration, stream info)
//! - External tools and NVENC detection
//! - Timecodes, transforms and the in/out edit session
//! - ffmpeg export command builder
//! - ffmpeg process runner with progress parsing and Ctrl-C handling
//! - Export log file, tracing setup, terminal progress

pub mod errors;
pub mod timecode;
pub mod transform;
pub mod ffprobe;
pub mod tools;
pub mod session;
pub mod command;
pub mod path_validator;
pub mod export_log;
pub mod ffmpeg_process;
pub mod progress;
pub mod logging;

pub use errors::{CutterError, Result};
pub use timecode::{format_display, format_timecode, parse_timecode};
pub use transform::Transform;
pub use ffprobe::{get_duration, normalize_rotation, probe_rotation, probe_video, ProbeResult};
pub use tools::{ToolAvailability, INSTALL_HINT};
pub use session::{default_output_path, EditSession, TrimRange};
pub use command::{build_export_args, render_command_line, EncoderChoice, ExportCommand};
pub use path_validator::{validate_export_paths, SUPPORTED_CONTAINERS};
pub use export_log::{ExportLog, DEFAULT_EXPORT_LOG};
pub use ffmpeg_process::{
    format_ffmpeg_error, install_ctrlc_handler, run_export, ExportOutcome, ExportRun,
    FfmpegProgressParser, ProgressUpdate,
};
pub use progress::{create_spinner, format_duration, ExportProgress};
pub use logging::{init_logging, LogConfig};
