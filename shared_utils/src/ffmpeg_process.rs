//! FFmpeg process management for exports.
//!
//! ## Pipes
//!
//! ffmpeg writes its stats line to stderr and may also print to stdout. If
//! only one pipe is read and the other fills its OS buffer (64KB), ffmpeg
//! blocks and the export hangs. stdout is therefore drained on its own
//! thread while the caller reads stderr for progress.
//!
//! ## Line endings
//!
//! The stats line is rewritten in place with `\r`, so [`for_each_line`]
//! treats `\r`, `\n` and `\r\n` all as terminators.
//!
//! ```ignore
//! use shared_utils::ffmpeg_process::{run_export, ExportRun};
//!
//! let outcome = run_export(&args, &ExportRun::new(duration), |p| {
//!     println!("Processing: {:.1}%", p.percent);
//! })?;
//! ```

use crate::export_log::ExportLog;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

// ═══════════════════════════════════════════════════════════════
// FfmpegProcess - child process with stdout drained in the background
// ═══════════════════════════════════════════════════════════════

pub struct FfmpegProcess {
    child: Arc<Mutex<Child>>,
    stderr: Option<ChildStderr>,
    stdout_thread: Option<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
}

/// Kills a running [`FfmpegProcess`] from another thread.
#[derive(Clone)]
pub struct CancelHandle {
    child: Arc<Mutex<Child>>,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        match self.child.lock() {
            Ok(mut child) => {
                if let Err(e) = child.kill() {
                    debug!(error = %e, "FFmpeg already exited");
                }
            }
            Err(_) => warn!("FFmpeg process lock poisoned, cannot cancel"),
        }
    }
}

impl FfmpegProcess {
    /// Starts the process. Every stdout line is handed to `on_stdout` on a
    /// background thread; stderr is left for [`FfmpegProcess::take_stderr`].
    pub fn spawn<F>(cmd: &mut Command, mut on_stdout: F) -> Result<Self>
    where
        F: FnMut(&str) + Send + 'static,
    {
        info!(command = ?cmd, "Executing FFmpeg command");

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().context("Failed to spawn FFmpeg process")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture FFmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture FFmpeg stderr"))?;

        let stdout_thread = thread::spawn(move || {
            if let Err(e) = for_each_line(stdout, |line| on_stdout(line)) {
                debug!(error = %e, "FFmpeg stdout reader stopped");
            }
        });

        Ok(Self {
            child: Arc::new(Mutex::new(child)),
            stderr: Some(stderr),
            stdout_thread: Some(stdout_thread),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            child: Arc::clone(&self.child),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Waits for exit and for the stdout thread to finish.
    pub fn wait(mut self) -> Result<ExitStatus> {
        let status = self
            .child
            .lock()
            .map_err(|_| anyhow::anyhow!("FFmpeg process lock poisoned"))?
            .wait()
            .context("Failed to wait for FFmpeg")?;
        if let Some(handle) = self.stdout_thread.take() {
            if handle.join().is_err() {
                warn!("FFmpeg stdout reader panicked");
            }
        }
        Ok(status)
    }
}

/// Calls `f` for every non-empty line, splitting on `\r` and `\n`.
pub fn for_each_line<R: Read>(reader: R, mut f: impl FnMut(&str)) -> std::io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line: Vec<u8> = Vec::new();

    loop {
        let (consumed, eof) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                (0, true)
            } else {
                for &b in buf {
                    if b == b'\r' || b == b'\n' {
                        if !line.is_empty() {
                            f(&String::from_utf8_lossy(&line));
                            line.clear();
                        }
                    } else {
                        line.push(b);
                    }
                }
                (buf.len(), false)
            }
        };
        if eof {
            break;
        }
        reader.consume(consumed);
    }

    if !line.is_empty() {
        f(&String::from_utf8_lossy(&line));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// Ctrl-C: kill whichever export is running
// ═══════════════════════════════════════════════════════════════

static ACTIVE_EXPORT: Mutex<Option<CancelHandle>> = Mutex::new(None);
static CTRLC_INSTALLED: OnceLock<()> = OnceLock::new();

/// Registers a Ctrl-C handler that kills the running export, if any.
/// Safe to call more than once.
pub fn install_ctrlc_handler() {
    CTRLC_INSTALLED.get_or_init(|| {
        let result = ctrlc::set_handler(|| {
            let active = ACTIVE_EXPORT.lock().ok().and_then(|slot| slot.clone());
            match active {
                Some(handle) => {
                    eprintln!("\n⚠️  Interrupted, stopping FFmpeg...");
                    handle.cancel();
                }
                None => std::process::exit(130),
            }
        });
        if let Err(e) = result {
            warn!(error = %e, "Could not install Ctrl-C handler");
        }
    });
}

fn set_active_export(handle: Option<CancelHandle>) {
    if let Ok(mut slot) = ACTIVE_EXPORT.lock() {
        *slot = handle;
    }
}

// ═══════════════════════════════════════════════════════════════
// FfmpegProgressParser - stats line parsing
// ═══════════════════════════════════════════════════════════════

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})").expect("time regex pattern is invalid")
    })
}

fn frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"frame=\s*(\d+)").expect("frame regex pattern is invalid"))
}

fn fps_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"fps=\s*(\d+(?:\.\d+)?)").expect("fps regex pattern is invalid"))
}

fn speed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"speed=\s*(\d+(?:\.\d+)?)x").expect("speed regex pattern is invalid")
    })
}

/// Encoded position from a stats line, `time=hh:mm:ss.cc`.
pub fn parse_progress_time(line: &str) -> Option<Duration> {
    let caps = time_re().captures(line)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    let (hours, minutes, seconds, hundredths) = (field(1)?, field(2)?, field(3)?, field(4)?);
    Some(Duration::from_millis(
        hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + hundredths * 10,
    ))
}

/// One progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub position: Duration,
    /// 0.0 - 100.0
    pub percent: f64,
}

impl ProgressUpdate {
    pub fn status_text(&self) -> String {
        format!("Processing: {:.1}%", self.percent)
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegProgressParser {
    total_duration: Duration,
    current_time: Duration,
    current_frame: u64,
    current_fps: f64,
    current_speed: f64,
}

impl FfmpegProgressParser {
    /// `total_duration` is the length of the segment being written.
    pub fn with_duration(total_duration: Duration) -> Self {
        Self {
            total_duration,
            current_time: Duration::ZERO,
            current_frame: 0,
            current_fps: 0.0,
            current_speed: 0.0,
        }
    }

    /// Updates counters from a stats line. Returns a progress update when the
    /// line carries `time=` and the total duration is known.
    pub fn parse_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        if let Some(frame) = capture_number::<u64>(frame_re(), line) {
            self.current_frame = frame;
        }
        if let Some(fps) = capture_number::<f64>(fps_re(), line) {
            self.current_fps = fps;
        }
        if let Some(speed) = capture_number::<f64>(speed_re(), line) {
            self.current_speed = speed;
        }

        let position = parse_progress_time(line)?;
        self.current_time = position;
        self.percent().map(|percent| ProgressUpdate { position, percent })
    }

    fn percent(&self) -> Option<f64> {
        let total_ms = self.total_duration.as_secs_f64() * 1000.0;
        if total_ms <= 0.0 {
            return None;
        }
        let current_ms = self.current_time.as_secs_f64() * 1000.0;
        Some((current_ms / total_ms * 100.0).clamp(0.0, 100.0))
    }

    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn current_fps(&self) -> f64 {
        self.current_fps
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }
}

fn capture_number<T: std::str::FromStr>(re: &Regex, line: &str) -> Option<T> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

// ═══════════════════════════════════════════════════════════════
// Export run
// ═══════════════════════════════════════════════════════════════

/// Inputs of one export besides the argument vector.
pub struct ExportRun<'a> {
    /// Progress denominator: length of the exported segment.
    pub expected_duration: Duration,
    pub log: Option<&'a ExportLog>,
    /// Last stderr lines kept for the error report.
    pub stderr_tail_lines: usize,
}

impl<'a> ExportRun<'a> {
    pub fn new(expected_duration: Duration) -> Self {
        Self {
            expected_duration,
            log: None,
            stderr_tail_lines: 40,
        }
    }

    pub fn with_log(mut self, log: &'a ExportLog) -> Self {
        self.log = Some(log);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub cancelled: bool,
    pub stderr_tail: String,
    pub elapsed: Duration,
    pub last_progress: Option<ProgressUpdate>,
}

impl ExportOutcome {
    pub fn status_text(&self) -> &'static str {
        if self.success {
            "Export Complete"
        } else {
            "Export Failed"
        }
    }

    /// Error report for a failed run.
    pub fn error_report(&self, command: &str) -> FfmpegError {
        FfmpegError {
            command: command.to_string(),
            stderr: self.stderr_tail.clone(),
            exit_code: self.exit_code,
            suggestion: get_error_suggestion(&self.stderr_tail),
        }
    }
}

/// Runs `ffmpeg <args>`, logging every output line and reporting progress.
///
/// A non-zero exit is not an `Err`: it is reported through
/// [`ExportOutcome::success`]. `Err` means ffmpeg could not be run at all.
pub fn run_export<F>(args: &[String], run: &ExportRun<'_>, on_progress: F) -> Result<ExportOutcome>
where
    F: FnMut(&ProgressUpdate),
{
    run_export_with("ffmpeg", args, run, on_progress)
}

pub(crate) fn run_export_with<F>(
    program: &str,
    args: &[String],
    run: &ExportRun<'_>,
    mut on_progress: F,
) -> Result<ExportOutcome>
where
    F: FnMut(&ProgressUpdate),
{
    let start = Instant::now();
    let mut cmd = Command::new(program);
    cmd.args(args);

    // The stdout thread outlives this borrow, so it collects lines and the
    // log is written from here once the process is done.
    let stdout_lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stdout_lines);
    let mut process = FfmpegProcess::spawn(&mut cmd, move |line| {
        debug!(line, "[stdout]");
        if let Ok(mut lines) = sink.lock() {
            lines.push(line.to_string());
        }
    })?;

    let stderr = match process.take_stderr() {
        Some(stderr) => stderr,
        None => {
            process.cancel_handle().cancel();
            if let Err(e) = process.wait() {
                debug!(error = %e, "FFmpeg wait after cancel failed");
            }
            anyhow::bail!("Failed to capture FFmpeg stderr");
        }
    };
    set_active_export(Some(process.cancel_handle()));

    let mut parser = FfmpegProgressParser::with_duration(run.expected_duration);
    let mut tail: VecDeque<String> = VecDeque::with_capacity(run.stderr_tail_lines + 1);
    let mut last_progress = None;

    let read_result = for_each_line(stderr, |line| {
        if let Some(log) = run.log {
            if let Err(e) = log.stderr_line(line) {
                warn!(error = %e, "Failed to write export log");
            }
        }
        if let Some(update) = parser.parse_line(line) {
            on_progress(&update);
            last_progress = Some(update);
        } else {
            debug!(line, "[stderr]");
        }
        tail.push_back(line.to_string());
        if tail.len() > run.stderr_tail_lines {
            tail.pop_front();
        }
    });
    if let Err(e) = read_result {
        warn!(error = %e, "FFmpeg stderr reader stopped early");
    }

    let cancelled_flag = process.cancel_handle();
    let status = process.wait();
    set_active_export(None);
    let status = status?;
    let cancelled = cancelled_flag.is_cancelled();

    if let Some(log) = run.log {
        if let Ok(lines) = stdout_lines.lock() {
            for line in lines.iter() {
                if let Err(e) = log.stdout_line(line) {
                    warn!(error = %e, "Failed to write export log");
                }
            }
        }
        if let Err(e) = log.finish(status.code()) {
            warn!(error = %e, "Failed to finish export log");
        }
    }

    let outcome = ExportOutcome {
        exit_code: status.code(),
        success: status.success() && !cancelled,
        cancelled,
        stderr_tail: Vec::from(tail).join("\n"),
        elapsed: start.elapsed(),
        last_progress,
    };

    if outcome.success {
        info!(
            exit_code = outcome.exit_code,
            elapsed_secs = outcome.elapsed.as_secs_f64(),
            "FFmpeg process completed successfully"
        );
    } else {
        error!(
            exit_code = outcome.exit_code,
            cancelled = outcome.cancelled,
            error_line = %format_ffmpeg_error(&outcome.stderr_tail),
            "FFmpeg process failed"
        );
    }

    Ok(outcome)
}

// ═══════════════════════════════════════════════════════════════
// Error reporting
// ═══════════════════════════════════════════════════════════════

/// Most relevant line of ffmpeg's stderr.
///
/// Prefers the last line mentioning `Error`/`error`, then the last line that
/// is not a stats line, then `"Unknown FFmpeg error"`.
pub fn format_ffmpeg_error(stderr: &str) -> String {
    if let Some(error_line) = stderr
        .lines()
        .rev()
        .find(|line| line.contains("Error") || line.contains("error"))
    {
        return error_line.trim().to_string();
    }

    stderr
        .lines()
        .rev()
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && !trimmed.starts_with("frame=")
                && !trimmed.starts_with("fps=")
                && !trimmed.starts_with("size=")
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown FFmpeg error".to_string())
}

#[derive(Debug, Clone)]
pub struct FfmpegError {
    pub command: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for FfmpegError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "❌ FFMPEG ERROR")?;
        writeln!(f, "   Command: {}", self.command)?;
        if let Some(code) = self.exit_code {
            writeln!(f, "   Exit code: {}", code)?;
        }
        writeln!(f, "   Error: {}", format_ffmpeg_error(&self.stderr))?;
        if let Some(ref suggestion) = self.suggestion {
            writeln!(f, "   💡 Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for FfmpegError {}

/// Hint for common failure patterns.
pub fn get_error_suggestion(stderr: &str) -> Option<String> {
    let patterns = [
        ("No such file or directory", "Check that the input path is correct"),
        ("Invalid data found", "The input may be corrupted or not a video"),
        ("Unknown encoder", "The source codec has no encoder in this FFmpeg build, try --no-nvenc or another container"),
        ("No NVENC capable devices found", "NVENC is listed but no NVIDIA GPU is usable, retry with --no-nvenc"),
        ("Permission denied", "Check read/write permissions of the input and output"),
        ("moov atom not found", "The MP4 is incomplete (interrupted recording?)"),
        ("Could not find tag for codec", "The output container cannot hold this codec, pick mkv"),
        ("Too many packets buffered", "Add -max_muxing_queue_size or export to mkv"),
    ];

    patterns
        .iter()
        .find(|(pattern, _)| stderr.contains(pattern))
        .map(|(_, suggestion)| suggestion.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_progress_time() {
        assert_eq!(
            parse_progress_time("frame=  100 fps=25.0 q=28.0 size=    1024kB time=00:01:02.34 bitrate=2097.2kbits/s speed=1.5x"),
            Some(Duration::from_millis(62_340))
        );
        assert_eq!(
            parse_progress_time("time=01:00:00.99"),
            Some(Duration::from_millis(3_600_990))
        );
        assert_eq!(parse_progress_time("time=N/A"), None);
        assert_eq!(parse_progress_time("Stream mapping:"), None);
    }

    #[test]
    fn test_progress_parser_percent() {
        let mut parser = FfmpegProgressParser::with_duration(Duration::from_secs(120));
        let update = parser.parse_line("time=00:01:00.00").unwrap();
        assert_eq!(update.percent, 50.0);
        assert_eq!(update.status_text(), "Processing: 50.0%");
        assert_eq!(parser.current_time(), Duration::from_secs(60));
    }

    #[test]
    fn test_progress_parser_clamps_overshoot() {
        let mut parser = FfmpegProgressParser::with_duration(Duration::from_secs(10));
        let update = parser.parse_line("time=00:00:12.00").unwrap();
        assert_eq!(update.percent, 100.0);
    }

    #[test]
    fn test_progress_parser_zero_duration() {
        let mut parser = FfmpegProgressParser::with_duration(Duration::ZERO);
        assert_eq!(parser.parse_line("time=00:00:01.00"), None);
        assert_eq!(parser.current_time(), Duration::from_secs(1));
    }

    #[test]
    fn test_progress_parser_stats_fields() {
        let mut parser = FfmpegProgressParser::with_duration(Duration::from_secs(100));
        parser.parse_line(
            "frame= 1234 fps= 29.97 q=-1.0 size=   10240kB time=00:00:41.17 bitrate=2037.6kbits/s speed=1.25x",
        );
        assert_eq!(parser.current_frame(), 1234);
        assert!((parser.current_fps() - 29.97).abs() < 0.001);
        assert!((parser.current_speed() - 1.25).abs() < 0.001);
    }

    #[test]
    fn test_for_each_line_splits_cr_and_lf() {
        let input = b"Input #0\r\nframe=1 time=00:00:01.00\rframe=2 time=00:00:02.00\rdone\nlast";
        let mut lines = Vec::new();
        for_each_line(&input[..], |l| lines.push(l.to_string())).unwrap();
        assert_eq!(
            lines,
            vec![
                "Input #0",
                "frame=1 time=00:00:01.00",
                "frame=2 time=00:00:02.00",
                "done",
                "last"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_drains_stdout_and_cancels() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo first; echo second; exec sleep 5"]);

        let mut process = FfmpegProcess::spawn(&mut cmd, move |line| {
            sink.lock().unwrap().push(line.to_string());
        })
        .unwrap();
        assert!(process.take_stderr().is_some());
        assert!(process.take_stderr().is_none());

        std::thread::sleep(Duration::from_millis(200));
        let handle = process.cancel_handle();
        handle.cancel();
        assert!(handle.is_cancelled());

        let status = process.wait().unwrap();
        assert!(!status.success());
        assert_eq!(*lines.lock().unwrap(), vec!["first", "second"]);
    }

    #[cfg(unix)]
    fn sh_script(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[cfg(unix)]
    #[test]
    fn test_run_export_logs_and_reports_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_path = dir.path().join("ffmpeg-output.log");
        let log = ExportLog::create(
            &log_path,
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            "ffmpeg -y -i in.mp4 out.mp4",
        )
        .unwrap();

        let args = sh_script(
            "printf 'frame=1 time=00:00:05.00\\rframe=2 time=00:00:10.00\\rout.mp4: Error opening output\\n' >&2; \
             echo muxing; exit 1",
        );
        let run = ExportRun::new(Duration::from_secs(20)).with_log(&log);
        let mut percents = Vec::new();
        let outcome = run_export_with("sh", &args, &run, |p| percents.push(p.percent)).unwrap();

        assert_eq!(outcome.exit_code, Some(1));
        assert!(!outcome.success);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.status_text(), "Export Failed");
        assert_eq!(percents, vec![25.0, 50.0]);
        let last = outcome.last_progress.unwrap();
        assert_eq!(last.position, Duration::from_secs(10));
        assert!(outcome.stderr_tail.ends_with("out.mp4: Error opening output"));
        assert_eq!(
            format_ffmpeg_error(&outcome.stderr_tail),
            "out.mp4: Error opening output"
        );

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("[stderr] frame=1 time=00:00:05.00"));
        assert!(content.contains("[stderr] frame=2 time=00:00:10.00"));
        assert!(content.contains("[stdout] muxing"));
        assert!(content.contains("Process exit code: 1"));
        let stderr_at = content.find("[stderr] out.mp4").unwrap();
        let footer_at = content.find("Process exit code").unwrap();
        assert!(stderr_at < footer_at);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_export_keeps_stderr_tail() {
        let args = sh_script("for i in 1 2 3 4 5; do echo line$i >&2; done");
        let mut run = ExportRun::new(Duration::ZERO);
        run.stderr_tail_lines = 2;
        let outcome = run_export_with("sh", &args, &run, |_| {}).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.stderr_tail, "line4\nline5");
        assert!(outcome.last_progress.is_none());
    }

    #[test]
    fn test_run_export_missing_program() {
        let run = ExportRun::new(Duration::ZERO);
        let result = run_export_with("vid-cut-no-such-program", &[], &run, |_| {});
        assert!(result.is_err());
    }

    #[test]
    fn test_format_ffmpeg_error_with_error_line() {
        let stderr = "frame=  100 fps=25.0 time=00:00:04.00\n[h264_nvenc @ 0x55] Error: no capable devices\n";
        let error = format_ffmpeg_error(stderr);
        assert!(error.contains("no capable devices"));
    }

    #[test]
    fn test_format_ffmpeg_error_no_error_line() {
        let stderr = "frame=  100 fps=25.0 q=28.0 size=    1024kB time=00:00:04.00\nConversion failed!\n";
        assert_eq!(format_ffmpeg_error(stderr), "Conversion failed!");
    }

    #[test]
    fn test_format_ffmpeg_error_empty() {
        assert_eq!(format_ffmpeg_error(""), "Unknown FFmpeg error");
    }

    #[test]
    fn test_error_suggestion() {
        assert!(get_error_suggestion("in.mp4: No such file or directory").is_some());
        assert!(get_error_suggestion("all good").is_none());
    }

    #[test]
    fn test_outcome_error_report() {
        let outcome = ExportOutcome {
            exit_code: Some(1),
            success: false,
            cancelled: false,
            stderr_tail: "moov atom not found".to_string(),
            elapsed: Duration::from_secs(1),
            last_progress: None,
        };
        assert_eq!(outcome.status_text(), "Export Failed");
        let report = outcome.error_report("ffmpeg -i in.mp4 out.mp4");
        assert_eq!(report.exit_code, Some(1));
        assert!(report.suggestion.is_some());
        assert!(report.to_string().contains("Exit code: 1"));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Percent matches position / duration for any in-range time.
        #[test]
        fn prop_progress_parser_time_accuracy(
            hours in 0u64..24,
            minutes in 0u64..60,
            seconds in 0u64..60,
            hundredths in 0u64..100,
            total_secs in 1u64..86_400
        ) {
            let mut parser = FfmpegProgressParser::with_duration(Duration::from_secs(total_secs));
            let line = format!("size=  1kB time={:02}:{:02}:{:02}.{:02} bitrate=1k", hours, minutes, seconds, hundredths);
            let update = parser.parse_line(&line).unwrap();

            let current_ms = (hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + hundredths * 10) as f64;
            let expected = (current_ms / (total_secs as f64 * 1000.0) * 100.0).min(100.0);
            prop_assert!((update.percent - expected).abs() < 1e-6,
                "Expected {}, got {}", expected, update.percent);
            prop_assert!((0.0..=100.0).contains(&update.percent));
        }

        /// Non-empty stderr always yields a non-empty error line.
        #[test]
        fn prop_format_error_non_empty(content in "[a-zA-Z0-9 ]{1,100}") {
            prop_assert!(!format_ffmpeg_error(&content).is_empty());
        }
    }
}
