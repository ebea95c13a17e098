//! vid-cut - trim, rotate and mirror videos through ffmpeg
//!
//! ```rust,ignore
//! use vid_cut::{export_video, ExportConfig};
//! use shared_utils::Transform;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let config = ExportConfig {
//!     in_point: Some(Duration::from_secs(5)),
//!     transform: Transform::Rotate90,
//!     ..ExportConfig::default()
//! };
//! export_video(Path::new("clip.mp4"), &config)?;
//! ```

pub mod export_api;

pub use export_api::{
    check_tools, export_video, plan_export, probe_file, ExportConfig, ExportReport, OpenedVideo,
    ProbeReport, FAILURE_MESSAGE, SUCCESS_MESSAGE,
};
