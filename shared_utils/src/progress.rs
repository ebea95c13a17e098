//! Terminal progress for exports.
//!
//! One bar per export, driven by [`ProgressUpdate`]s from the ffmpeg runner.
//! Hidden in quiet mode and when stderr is not a terminal, so redirected
//! output stays clean.

use crate::ffmpeg_process::ProgressUpdate;
use crate::timecode::format_display;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub mod progress_style {
    /// Filled, current, empty: ████████▓░░░░░░░
    pub const PROGRESS_CHARS: &str = "█▓░";

    /// Braille spinner.
    pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

    /// `{msg}` carries the one-decimal percentage.
    pub const EXPORT_TEMPLATE: &str =
        "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {msg} • ⏱️ {elapsed_precise} (ETA: {eta})";

    pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix:.cyan.bold} • {msg}";
}

/// Bar resolution: one step per 0.1%.
const BAR_STEPS: u64 = 1000;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

pub fn enable_quiet_mode() {
    QUIET_MODE.store(true, Ordering::Relaxed);
}

pub fn is_quiet_mode() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

fn should_draw() -> bool {
    !is_quiet_mode() && std::io::stderr().is_terminal()
}

/// Progress bar of one export.
pub struct ExportProgress {
    bar: ProgressBar,
}

impl ExportProgress {
    pub fn new(prefix: &str) -> Self {
        let bar = ProgressBar::new(BAR_STEPS);

        if should_draw() {
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(progress_style::EXPORT_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars(progress_style::PROGRESS_CHARS)
                    .tick_chars(progress_style::SPINNER_CHARS),
            );
            bar.set_prefix(prefix.to_string());
            bar.set_message("Preparing...");
            bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }

        Self { bar }
    }

    pub fn update(&self, update: &ProgressUpdate) {
        self.bar.set_position(percent_to_steps(update.percent));
        self.bar.set_message(format!(
            "{} ({})",
            update.status_text(),
            format_display(update.position)
        ));
    }

    pub fn finish(&self, success: bool) {
        if success {
            self.bar.set_position(BAR_STEPS);
            self.bar.finish_with_message("✅ Export Complete");
        } else {
            self.bar.abandon_with_message("❌ Export Failed");
        }
    }

    /// Prints above the bar without tearing it.
    pub fn println(&self, msg: &str) {
        if self.bar.is_hidden() {
            eprintln!("{}", msg);
        } else {
            self.bar.println(msg);
        }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

fn percent_to_steps(percent: f64) -> u64 {
    ((percent.clamp(0.0, 100.0) / 100.0) * BAR_STEPS as f64).round() as u64
}

/// Spinner for short waits (probing, tool detection).
pub fn create_spinner(prefix: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();

    if should_draw() {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template(progress_style::SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(progress_style::SPINNER_CHARS),
        );
        spinner.set_prefix(prefix.to_string());
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
    } else {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    }
    spinner
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs >= 10 {
        format!("{}s", secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
