//! Rotation / mirror transforms applied on export.
//!
//! Rotations are counter-clockwise, the same convention as the `rotate`
//! metadata tag. Only one transform is active at a time.

use crate::errors::CutterError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transform {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
    Mirror,
    MirrorRotate90,
    MirrorRotate180,
    MirrorRotate270,
}

impl Transform {
    pub const ALL: [Transform; 8] = [
        Transform::Normal,
        Transform::Rotate90,
        Transform::Rotate180,
        Transform::Rotate270,
        Transform::Mirror,
        Transform::MirrorRotate90,
        Transform::MirrorRotate180,
        Transform::MirrorRotate270,
    ];

    /// Value for ffmpeg's `-vf`. `None` for [`Transform::Normal`].
    pub fn video_filter(self) -> Option<&'static str> {
        match self {
            Transform::Normal => None,
            Transform::Rotate90 => Some("transpose=2"),
            Transform::Rotate180 => Some("transpose=2,transpose=2"),
            Transform::Rotate270 => Some("transpose=1"),
            Transform::Mirror => Some("hflip"),
            Transform::MirrorRotate90 => Some("hflip,transpose=2"),
            Transform::MirrorRotate180 => Some("hflip,transpose=2,transpose=2"),
            Transform::MirrorRotate270 => Some("hflip,transpose=1"),
        }
    }

    pub fn is_identity(self) -> bool {
        self == Transform::Normal
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            Transform::Mirror
                | Transform::MirrorRotate90
                | Transform::MirrorRotate180
                | Transform::MirrorRotate270
        )
    }

    /// Counter-clockwise rotation in degrees.
    pub fn rotation_degrees(self) -> i32 {
        match self {
            Transform::Normal | Transform::Mirror => 0,
            Transform::Rotate90 | Transform::MirrorRotate90 => 90,
            Transform::Rotate180 | Transform::MirrorRotate180 => 180,
            Transform::Rotate270 | Transform::MirrorRotate270 => 270,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transform::Normal => "normal",
            Transform::Rotate90 => "rotate90",
            Transform::Rotate180 => "rotate180",
            Transform::Rotate270 => "rotate270",
            Transform::Mirror => "mirror",
            Transform::MirrorRotate90 => "mirror-rotate90",
            Transform::MirrorRotate180 => "mirror-rotate180",
            Transform::MirrorRotate270 => "mirror-rotate270",
        }
    }

    /// Orientation a viewer sees once the metadata rotation and this
    /// transform are both applied: `(mirrored, clockwise degrees in [0, 360))`.
    ///
    /// Composition order is metadata rotation, then mirror, then the
    /// transform's rotation. Both rotations are counter-clockwise, hence the
    /// negation into clockwise screen degrees.
    pub fn preview_rotation(self, initial_rotation: i32) -> (bool, u16) {
        let clockwise = -initial_rotation - self.rotation_degrees();
        (self.is_mirrored(), crate::ffprobe::normalize_rotation(clockwise))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transform {
    type Err = CutterError;

    /// Accepts kebab-case (`mirror-rotate90`), camelCase (`mirrorRotate90`)
    /// and snake_case names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "normal" | "none" => Ok(Transform::Normal),
            "rotate90" => Ok(Transform::Rotate90),
            "rotate180" => Ok(Transform::Rotate180),
            "rotate270" => Ok(Transform::Rotate270),
            "mirror" => Ok(Transform::Mirror),
            "mirrorrotate90" => Ok(Transform::MirrorRotate90),
            "mirrorrotate180" => Ok(Transform::MirrorRotate180),
            "mirrorrotate270" => Ok(Transform::MirrorRotate270),
            _ => Err(CutterError::UnknownTransform(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_filters() {
        let cases: &[(Transform, Option<&str>)] = &[
            (Transform::Normal, None),
            (Transform::Rotate90, Some("transpose=2")),
            (Transform::Rotate180, Some("transpose=2,transpose=2")),
            (Transform::Rotate270, Some("transpose=1")),
            (Transform::Mirror, Some("hflip")),
            (Transform::MirrorRotate90, Some("hflip,transpose=2")),
            (Transform::MirrorRotate180, Some("hflip,transpose=2,transpose=2")),
            (Transform::MirrorRotate270, Some("hflip,transpose=1")),
        ];
        for (t, expected) in cases {
            assert_eq!(t.video_filter(), *expected, "filter for {}", t);
        }
    }

    #[test]
    fn test_only_normal_is_identity() {
        for t in Transform::ALL {
            assert_eq!(t.is_identity(), t == Transform::Normal);
            assert_eq!(t.is_identity(), t.video_filter().is_none());
        }
    }

    #[test]
    fn test_from_str_accepts_all_spellings() {
        assert_eq!("mirror-rotate90".parse::<Transform>().unwrap(), Transform::MirrorRotate90);
        assert_eq!("mirrorRotate180".parse::<Transform>().unwrap(), Transform::MirrorRotate180);
        assert_eq!("MIRROR_ROTATE270".parse::<Transform>().unwrap(), Transform::MirrorRotate270);
        assert_eq!("rotate90".parse::<Transform>().unwrap(), Transform::Rotate90);
        assert!("rotate45".parse::<Transform>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for t in Transform::ALL {
            assert_eq!(t.to_string().parse::<Transform>().unwrap(), t);
        }
    }

    #[test]
    fn test_preview_rotation() {
        assert_eq!(Transform::Normal.preview_rotation(0), (false, 0));
        // Metadata 90 CCW displays as 270 clockwise.
        assert_eq!(Transform::Normal.preview_rotation(90), (false, 270));
        assert_eq!(Transform::Rotate90.preview_rotation(90), (false, 180));
        assert_eq!(Transform::MirrorRotate270.preview_rotation(0), (true, 90));
        assert_eq!(Transform::Mirror.preview_rotation(-90), (true, 90));
    }
}
