//! Plain-text `ffmpeg-output.log` written next to the working directory.
//!
//! Each export truncates the file and records the command, every line ffmpeg
//! printed, and the exit code. Probe/check notes are appended.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_EXPORT_LOG: &str = "ffmpeg-output.log";

const RULE: &str = "----------------------------------------";

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Log of a single export run. Safe to share between the stdout and stderr
/// reader threads.
pub struct ExportLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl ExportLog {
    /// Truncates `path` and writes the run header.
    pub fn create(path: &Path, input: &Path, output: &Path, command_line: &str) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export log: {}", path.display()))?;
        let log = Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        };

        log.write_lines(&[
            format!("FFmpeg Export Log - {}", timestamp()),
            format!("Input file: {}", input.display()),
            format!("Output file: {}", output.display()),
            format!("FFmpeg arguments: {}", command_line),
            String::new(),
            "FFmpeg Output:".to_string(),
            RULE.to_string(),
        ])?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stderr_line(&self, line: &str) -> Result<()> {
        self.write_lines(&[format!("[stderr] {}", line)])
    }

    pub fn stdout_line(&self, line: &str) -> Result<()> {
        self.write_lines(&[format!("[stdout] {}", line)])
    }

    /// Footer with the exit code; `None` when ffmpeg was killed by a signal.
    pub fn finish(&self, exit_code: Option<i32>) -> Result<()> {
        let code = exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none (terminated)".to_string());
        self.write_lines(&[
            String::new(),
            RULE.to_string(),
            format!("Process exit code: {}", code),
            format!("Export completed at: {}", timestamp()),
        ])
    }

    fn write_lines(&self, lines: &[String]) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("Export log writer poisoned"))?;
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Appends one line to the log without truncating it.
pub fn append_note(path: &Path, message: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open export log: {}", path.display()))?;
    writeln!(file, "{}", message)?;
    Ok(())
}
