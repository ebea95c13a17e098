//! Path Validation Module
//!
//! Checks run on the input/output pair before ffmpeg is started. ffmpeg is
//! invoked with `-y`, so an output that resolves to the input would destroy
//! the source.

use crate::errors::{CutterError, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Containers offered for export, besides the input's own.
pub const SUPPORTED_CONTAINERS: &[&str] = &["mp4", "avi", "mkv"];

/// Path as `&str`; ffmpeg arguments are built from UTF-8 strings.
pub fn path_to_str_safe(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        warn!(path = %path.display(), "Path contains non-UTF-8 characters");
        CutterError::InvalidPath(format!(
            "Path contains non-UTF-8 characters: {}",
            path.display()
        ))
    })
}

/// Input must be an existing, UTF-8 named regular file.
pub fn validate_input(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(CutterError::InvalidPath("Empty path provided".to_string()));
    }
    path_to_str_safe(path)?;
    if !path.exists() {
        return Err(CutterError::InvalidPath(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(CutterError::InvalidPath(format!(
            "Not a file (is it a directory?): {}",
            path.display()
        )));
    }
    Ok(())
}

/// Output extension must be mp4/avi/mkv or match the input's.
pub fn validate_output_container(input: &Path, output: &Path) -> Result<()> {
    path_to_str_safe(output)?;
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let input_ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    if SUPPORTED_CONTAINERS.contains(&ext.as_str()) || input_ext.as_deref() == Some(ext.as_str())
    {
        Ok(())
    } else {
        Err(CutterError::UnsupportedContainer(ext))
    }
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_relative() {
        std::env::current_dir().unwrap_or_default().join(path)
    } else {
        path.to_path_buf()
    }
}

/// Rejects an output that resolves to the input file.
pub fn check_input_output_conflict(input: &Path, output: &Path) -> Result<()> {
    if resolve(input) == resolve(output) {
        return Err(CutterError::PathConflict(input.to_path_buf()));
    }
    Ok(())
}

/// All pre-export path checks.
pub fn validate_export_paths(input: &Path, output: &Path) -> Result<()> {
    validate_input(input)?;
    validate_output_container(input, output)?;
    check_input_output_conflict(input, output)
}

// ============================================================================
// Tests
// ============================================================================
