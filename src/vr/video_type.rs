//! Projection classification from the uploaded file name.

use serde::Serialize;
use std::fmt;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    #[default]
    Flat,
    SideBySide3D,
    Spherical360,
    Spherical360Stereo,
}

impl VideoType {
    /// Classify by case-insensitive substring. `360_3d` is checked before
    /// `3d`, which it contains.
    ///
    /// Pass the file name, not the full key: the key's timestamp digits can
    /// contain `360`.
    pub fn classify(file_name: &str) -> Self {
        let name = file_name.to_lowercase();
        if name.contains("360_3d") {
            VideoType::Spherical360Stereo
        } else if name.contains("3d") || name.contains("sbs") {
            VideoType::SideBySide3D
        } else if name.contains("360") {
            VideoType::Spherical360
        } else {
            VideoType::Flat
        }
    }

    /// Rendered onto the skybox rather than a screen.
    pub fn is_spherical(self) -> bool {
        matches!(
            self,
            VideoType::Spherical360 | VideoType::Spherical360Stereo
        )
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VideoType::Flat => "flat",
            VideoType::SideBySide3D => "side-by-side 3D",
            VideoType::Spherical360 => "360",
            VideoType::Spherical360Stereo => "360 3D",
        };
        f.write_str(label)
    }
}
