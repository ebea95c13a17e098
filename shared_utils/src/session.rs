//! Edit session: the input file plus the in/out points and transform the
//! user picked for it.

use crate::errors::{CutterError, Result};
use crate::timecode::{format_point, format_timecode};
use crate::transform::Transform;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Kept segment of the input: seek offset and optional length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimRange {
    pub start: Option<Duration>,
    pub length: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub input: PathBuf,
    pub in_point: Option<Duration>,
    pub out_point: Option<Duration>,
    pub transform: Transform,
    /// Rotation read from metadata when the file was opened.
    pub initial_rotation: i32,
    /// Container duration, when probed.
    pub media_duration: Option<Duration>,
}

impl EditSession {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            in_point: None,
            out_point: None,
            transform: Transform::Normal,
            initial_rotation: 0,
            media_duration: None,
        }
    }

    pub fn with_initial_rotation(mut self, rotation: i32) -> Self {
        self.initial_rotation = rotation;
        self
    }

    pub fn with_media_duration(mut self, duration: Option<Duration>) -> Self {
        self.media_duration = duration;
        self
    }

    pub fn mark_in(&mut self, at: Duration) {
        self.in_point = Some(at);
    }

    pub fn mark_out(&mut self, at: Duration) {
        self.out_point = Some(at);
    }

    pub fn clear_in(&mut self) {
        self.in_point = None;
    }

    pub fn clear_out(&mut self) {
        self.out_point = None;
    }

    /// Replaces the previous transform; `Normal` resets it.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn has_edits(&self) -> bool {
        self.in_point.is_some() || self.out_point.is_some() || !self.transform.is_identity()
    }

    /// Validated trim range, `None` when neither point is set.
    pub fn trim_range(&self) -> Result<Option<TrimRange>> {
        if self.in_point.is_none() && self.out_point.is_none() {
            return Ok(None);
        }

        if let Some(total) = self.media_duration {
            for (label, point) in [("in", self.in_point), ("out", self.out_point)] {
                if let Some(p) = point {
                    if p > total {
                        return Err(CutterError::InvalidRange(format!(
                            "{} point {} is past the end of the video ({})",
                            label,
                            format_timecode(p),
                            format_timecode(total)
                        )));
                    }
                }
            }
        }

        let length = match self.out_point {
            Some(out) => {
                let start = self.in_point.unwrap_or(Duration::ZERO);
                if out <= start {
                    return Err(CutterError::InvalidRange(format!(
                        "out point {} must be after in point {}",
                        format_timecode(out),
                        format_timecode(start)
                    )));
                }
                Some(out - start)
            }
            None => None,
        };

        Ok(Some(TrimRange {
            start: self.in_point,
            length,
        }))
    }

    /// Fails with [`CutterError::NoEdits`] or an invalid range.
    pub fn validate_for_export(&self) -> Result<()> {
        if !self.has_edits() {
            return Err(CutterError::NoEdits);
        }
        self.trim_range()?;
        Ok(())
    }

    /// `<dir>/<stem>_exported.<ext>` next to the input.
    pub fn default_output_path(&self) -> PathBuf {
        default_output_path(&self.input)
    }

    /// Length of the exported segment given the full media duration.
    pub fn expected_output_duration(&self, total: Duration) -> Duration {
        let start = self.in_point.unwrap_or(Duration::ZERO).min(total);
        let end = self.out_point.unwrap_or(total).min(total);
        end.saturating_sub(start)
    }

    /// `In: hh:mm:ss` / `Out: hh:mm:ss` status lines.
    pub fn point_summary(&self) -> (String, String) {
        (
            format_point("In", self.in_point),
            format_point("Out", self.out_point),
        )
    }
}

pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}_exported.{}", stem, ext.to_string_lossy()),
        None => format!("{}_exported", stem),
    };
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_new_session_has_no_edits() {
        let session = EditSession::new("clip.mp4");
        assert!(!session.has_edits());
        assert!(matches!(
            session.validate_for_export(),
            Err(CutterError::NoEdits)
        ));
    }

    #[test]
    fn test_transform_alone_counts_as_edit() {
        let mut session = EditSession::new("clip.mp4");
        session.set_transform(Transform::Mirror);
        assert!(session.has_edits());
        assert!(session.validate_for_export().is_ok());
        assert_eq!(session.trim_range().unwrap(), None);

        session.set_transform(Transform::Normal);
        assert!(!session.has_edits());
    }

    #[test]
    fn test_trim_range_in_and_out() {
        let mut session = EditSession::new("clip.mp4");
        session.mark_in(secs(10));
        session.mark_out(secs(25));
        assert_eq!(
            session.trim_range().unwrap(),
            Some(TrimRange {
                start: Some(secs(10)),
                length: Some(secs(15)),
            })
        );
    }

    #[test]
    fn test_trim_range_out_only_measures_from_zero() {
        let mut session = EditSession::new("clip.mp4");
        session.mark_out(secs(30));
        assert_eq!(
            session.trim_range().unwrap(),
            Some(TrimRange {
                start: None,
                length: Some(secs(30)),
            })
        );
    }

    #[test]
    fn test_trim_range_in_only() {
        let mut session = EditSession::new("clip.mp4");
        session.mark_in(secs(5));
        assert_eq!(
            session.trim_range().unwrap(),
            Some(TrimRange {
                start: Some(secs(5)),
                length: None,
            })
        );
    }

    #[test]
    fn test_out_before_in_is_rejected() {
        let mut session = EditSession::new("clip.mp4");
        session.mark_in(secs(20));
        session.mark_out(secs(20));
        assert!(matches!(
            session.trim_range(),
            Err(CutterError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_points_past_end_are_rejected() {
        let mut session = EditSession::new("clip.mp4").with_media_duration(Some(secs(60)));
        session.mark_out(secs(61));
        assert!(session.trim_range().is_err());
        session.mark_out(secs(60));
        assert!(session.trim_range().is_ok());
    }

    #[test]
    fn test_clear_points() {
        let mut session = EditSession::new("clip.mp4");
        session.mark_in(secs(1));
        session.mark_out(secs(2));
        session.clear_in();
        session.clear_out();
        assert!(!session.has_edits());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/videos/holiday.mov")),
            PathBuf::from("/videos/holiday_exported.mov")
        );
        assert_eq!(
            default_output_path(Path::new("noext")),
            PathBuf::from("noext_exported")
        );
    }

    #[test]
    fn test_expected_output_duration() {
        let mut session = EditSession::new("clip.mp4");
        assert_eq!(session.expected_output_duration(secs(100)), secs(100));
        session.mark_in(secs(30));
        assert_eq!(session.expected_output_duration(secs(100)), secs(70));
        session.mark_out(secs(50));
        assert_eq!(session.expected_output_duration(secs(100)), secs(20));
    }

    #[test]
    fn test_point_summary() {
        let mut session = EditSession::new("clip.mp4");
        session.mark_in(secs(61));
        let (in_text, out_text) = session.point_summary();
        assert_eq!(in_text, "In: 00:01:01");
        assert_eq!(out_text, "Out: --:--:--");
    }
}
