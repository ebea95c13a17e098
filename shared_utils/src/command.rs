//! Export command builder.
//!
//! Turns an [`EditSession`] into the argument vector for one ffmpeg run.
//! Arguments are passed straight to the process, so no shell quoting is
//! involved; [`render_command_line`] only exists for logs and `--dry-run`.

use crate::errors::{CutterError, Result};
use crate::ffprobe::ProbeResult;
use crate::session::EditSession;
use crate::timecode::format_timecode;
use crate::tools::ToolAvailability;
use std::fmt;
use std::path::Path;

/// NVENC quality settings shared by every hardware encode.
const NVENC_ARGS: [&str; 6] = ["-preset", "p7", "-rc", "vbr", "-cq", "19"];

/// How the video stream gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderChoice {
    /// No transform: every stream is copied.
    Copy,
    /// Hardware encode; `high_profile` for sources that are neither h264 nor hevc.
    Nvenc {
        encoder: &'static str,
        high_profile: bool,
    },
    /// Software encode with the source codec.
    Software { codec: String },
    /// Source codec unknown, ffmpeg picks.
    Default,
}

impl EncoderChoice {
    pub fn select(transform_applied: bool, source_codec: Option<&str>, nvenc: bool) -> Self {
        if !transform_applied {
            return EncoderChoice::Copy;
        }
        if nvenc {
            return match source_codec {
                Some("h264") => EncoderChoice::Nvenc {
                    encoder: "h264_nvenc",
                    high_profile: false,
                },
                Some("hevc") => EncoderChoice::Nvenc {
                    encoder: "hevc_nvenc",
                    high_profile: false,
                },
                _ => EncoderChoice::Nvenc {
                    encoder: "h264_nvenc",
                    high_profile: true,
                },
            };
        }
        match source_codec {
            Some(codec) => EncoderChoice::Software {
                codec: codec.to_string(),
            },
            None => EncoderChoice::Default,
        }
    }

    fn push_args(&self, args: &mut Vec<String>) {
        match self {
            EncoderChoice::Copy => push(args, &["-c", "copy"]),
            EncoderChoice::Nvenc {
                encoder,
                high_profile,
            } => {
                push(args, &["-c:a", "copy", "-c:v", *encoder]);
                push(args, &NVENC_ARGS);
                if *high_profile {
                    push(args, &["-profile:v", "high"]);
                }
            }
            EncoderChoice::Software { codec } => {
                push(args, &["-c:a", "copy", "-c:v", codec.as_str()]);
            }
            EncoderChoice::Default => push(args, &["-c:a", "copy"]),
        }
    }
}

impl fmt::Display for EncoderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderChoice::Copy => write!(f, "stream copy"),
            EncoderChoice::Nvenc {
                encoder,
                high_profile: true,
            } => write!(f, "{} (NVENC, high profile)", encoder),
            EncoderChoice::Nvenc { encoder, .. } => write!(f, "{} (NVENC)", encoder),
            EncoderChoice::Software { codec } => write!(f, "{} (software)", codec),
            EncoderChoice::Default => write!(f, "ffmpeg default encoder"),
        }
    }
}

/// Built command: argument vector plus the encoder decision behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCommand {
    pub args: Vec<String>,
    pub encoder: EncoderChoice,
}

impl ExportCommand {
    pub fn command_line(&self) -> String {
        render_command_line(&self.args)
    }
}

fn push(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|s| s.to_string()));
}

fn utf8_path<'a>(path: &'a Path, what: &str) -> Result<&'a str> {
    path.to_str().ok_or_else(|| {
        CutterError::InvalidPath(format!(
            "{} path is not valid UTF-8: {}",
            what,
            path.display()
        ))
    })
}

/// ffmpeg arguments for exporting `session` to `output`.
///
/// `info` is the JSON probe of the input; only its video codec and bit rate
/// are used, and only when a transform forces a re-encode.
pub fn build_export_args(
    session: &EditSession,
    output: &Path,
    info: Option<&ProbeResult>,
    tools: &ToolAvailability,
) -> Result<ExportCommand> {
    session.validate_for_export()?;

    let mut args = Vec::new();
    push(&mut args, &["-y", "-i", utf8_path(&session.input, "input")?]);

    if let Some(range) = session.trim_range()? {
        if let Some(start) = range.start {
            push(&mut args, &["-ss", format_timecode(start).as_str()]);
        }
        if let Some(length) = range.length {
            push(&mut args, &["-t", format_timecode(length).as_str()]);
        }
    }

    if let Some(filter) = session.transform.video_filter() {
        push(&mut args, &["-vf", filter]);
    }

    let transform_applied = !session.transform.is_identity();
    let encoder = EncoderChoice::select(
        transform_applied,
        info.and_then(|i| i.video_codec.as_deref()),
        tools.nvenc,
    );
    encoder.push_args(&mut args);

    if transform_applied {
        if let Some(bit_rate) = info.and_then(|i| i.video_bit_rate.as_deref()) {
            push(
                &mut args,
                &["-b:v", bit_rate, "-maxrate", bit_rate, "-bufsize", bit_rate],
            );
        }
    }

    args.push(utf8_path(output, "output")?.to_string());

    Ok(ExportCommand { args, encoder })
}

/// `ffmpeg ...` with arguments quoted where a shell would need it.
pub fn render_command_line(args: &[String]) -> String {
    let mut line = String::from("ffmpeg");
    for arg in args {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line
}

fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
