//! Video surface handles
//!
//! Each participant's capture camera renders into a texture owned by the
//! session layer. The roster never touches pixels; it only passes a
//! [`VideoSurfaceHandle`] from the participant's source to the slot's render
//! target.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::identity::ParticipantId;

/// Pixel format of a captured video surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColorFormat {
    #[default]
    Argb32,
    Rgba32,
    Rgb565,
}

impl Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argb32 => write!(f, "ARGB32"),
            Self::Rgba32 => write!(f, "RGBA32"),
            Self::Rgb565 => write!(f, "RGB565"),
        }
    }
}

/// Shape of the render texture a participant's capture camera draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceDescriptor {
    pub width: u32,
    pub height: u32,
    pub depth_bits: u32,
    pub format: ColorFormat,
}

impl Default for SurfaceDescriptor {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            depth_bits: 32,
            format: ColorFormat::Argb32,
        }
    }
}

impl SurfaceDescriptor {
    /// Name given to the surface owned by `owner`
    pub fn label_for(&self, owner: ParticipantId) -> String {
        format!(
            "Player_{}_VideoFeed_RT_{}x{}_{}",
            owner, self.width, self.height, self.format
        )
    }

    /// Build a handle for `owner`'s surface with the given engine id
    pub fn handle_for(&self, owner: ParticipantId, id: u64) -> VideoSurfaceHandle {
        VideoSurfaceHandle {
            id,
            label: self.label_for(owner),
            width: self.width,
            height: self.height,
        }
    }
}

/// Opaque reference to an externally owned, playable video surface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSurfaceHandle {
    /// Engine-side texture id
    pub id: u64,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

impl Display for VideoSurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptor_label() {
        let descriptor = SurfaceDescriptor::default();
        assert_eq!(
            descriptor.label_for(ParticipantId(5)),
            "Player_5_VideoFeed_RT_256x256_ARGB32"
        );
    }

    #[test]
    fn test_handle_carries_descriptor_size() {
        let descriptor = SurfaceDescriptor {
            width: 640,
            height: 480,
            ..Default::default()
        };
        let handle = descriptor.handle_for(ParticipantId(2), 99);
        assert_eq!(handle.id, 99);
        assert_eq!((handle.width, handle.height), (640, 480));
        assert!(handle.to_string().ends_with("#99"));
    }
}
