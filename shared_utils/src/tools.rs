//! External tool detection - ffmpeg, ffprobe and NVENC encoders.
//!
//! ```rust,ignore
//! use shared_utils::tools::ToolAvailability;
//!
//! let tools = ToolAvailability::detect();
//! if tools.nvenc {
//!     println!("Using NVENC: {:?}", tools.nvenc_encoders);
//! }
//! ```

use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Shown when ffmpeg or ffprobe cannot be started.
pub const INSTALL_HINT: &str = "FFmpeg is not installed or not available in the system PATH. \
Video export functionality will be disabled.\n\n\
To install FFmpeg:\n\
1. Download FFmpeg from https://ffmpeg.org/download.html\n\
2. Add FFmpeg to your system PATH\n\
3. Restart the application";

static TOOLS: OnceLock<ToolAvailability> = OnceLock::new();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    pub ffmpeg: bool,
    pub ffprobe: bool,
    /// `h264_nvenc` or `hevc_nvenc` is listed by `ffmpeg -encoders`.
    pub nvenc: bool,
    pub nvenc_encoders: Vec<String>,
}

impl ToolAvailability {
    /// Cached detection, run once per process.
    pub fn detect() -> &'static ToolAvailability {
        TOOLS.get_or_init(Self::detect_fresh)
    }

    /// Detection without the cache.
    pub fn detect_fresh() -> ToolAvailability {
        let listing = match Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-encoders")
            .output()
        {
            Ok(out) => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
            Err(e) => {
                warn!(error = %e, "ffmpeg could not be started");
                None
            }
        };

        let ffprobe = match Command::new("ffprobe").arg("-version").output() {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "ffprobe could not be started");
                false
            }
        };

        let result = Self::from_listing(listing.as_deref(), ffprobe);
        info!(
            ffmpeg = result.ffmpeg,
            ffprobe = result.ffprobe,
            nvenc = result.nvenc,
            encoders = ?result.nvenc_encoders,
            "NVENC Support: {}",
            result.nvenc_status()
        );
        result
    }

    /// Builds the availability report from an `ffmpeg -encoders` listing
    /// (`None` when ffmpeg did not start) and the ffprobe probe result.
    pub fn from_listing(listing: Option<&str>, ffprobe: bool) -> ToolAvailability {
        let ffmpeg = listing.is_some();
        let nvenc_encoders = match listing {
            Some(l) if ffprobe => parse_nvenc_encoders(l),
            _ => Vec::new(),
        };
        let nvenc = nvenc_encoders
            .iter()
            .any(|e| e == "h264_nvenc" || e == "hevc_nvenc");

        ToolAvailability {
            ffmpeg,
            ffprobe,
            nvenc,
            nvenc_encoders,
        }
    }

    pub fn can_export(&self) -> bool {
        self.ffmpeg && self.ffprobe
    }

    pub fn nvenc_status(&self) -> &'static str {
        if self.nvenc {
            "Available"
        } else {
            "Not Available"
        }
    }

    /// Same report with NVENC switched off (`--no-nvenc`).
    pub fn without_nvenc(&self) -> ToolAvailability {
        ToolAvailability {
            nvenc: false,
            nvenc_encoders: Vec::new(),
            ..self.clone()
        }
    }
}

/// Resolved location of `tool` in PATH, for the `check` report.
pub fn tool_path(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}

/// Every `*_nvenc` encoder name in an `ffmpeg -encoders` listing.
///
/// Listing rows look like ` V....D h264_nvenc           NVIDIA NVENC H.264 encoder`.
pub fn parse_nvenc_encoders(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            let name = fields.next()?;
            if flags.len() == 6 && name.ends_with("_nvenc") {
                Some(name.to_string())
            } else {
                None
            }
        })
        .collect()
}
