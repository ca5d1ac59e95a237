pub mod accelerated;
pub mod cpu;
pub mod shaders;
pub mod software;
#[cfg(feature = "gpu")]
pub mod wgpu;

use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::tiling::resolve::PathKind;

/// A rendered frame, tightly packed RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba8 {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRgba8 {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha bytes, for encoders.
    pub fn into_straight(mut self) -> Vec<u8> {
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.data);
        }
        self.data
    }
}

/// Which code path produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawPath {
    Simple,
    General,
    Software,
}

impl From<PathKind> for DrawPath {
    fn from(kind: PathKind) -> Self {
        match kind {
            PathKind::Simple => DrawPath::Simple,
            PathKind::General => DrawPath::General,
        }
    }
}

/// Why a surface drew nothing this frame. All of these clear up by themselves once the
/// texture or the surface state changes; callers just render again next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NoTexture,
    NotLoaded,
    /// Empty frame, or a frame reaching outside its base texture.
    InvalidFrame,
    /// Zero-sized surface or a tile transform that collapses the pattern.
    Degenerate,
}

/// Result of one render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn(DrawPath),
    Skipped(SkipReason),
}

impl DrawOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, DrawOutcome::Drawn(_))
    }
}
