pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Packed `0xRRGGBB` tint. White leaves the texture untouched.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Tint(pub u32);

impl Tint {
    /// No tint.
    pub const WHITE: Tint = Tint(0xFF_FF_FF);

    /// Build from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    pub fn is_white(self) -> bool {
        self.0 & 0xFF_FF_FF == 0xFF_FF_FF
    }

    /// Split into `[r, g, b]` bytes.
    pub fn rgb8(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        ]
    }

    /// Split into normalized `[r, g, b]` floats.
    pub fn rgb_f32(self) -> [f32; 3] {
        let [r, g, b] = self.rgb8();
        [
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        ]
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How a tiled surface is composited over what is already drawn.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
}

/// Blend mode as handed to a device, after accounting for the texture's alpha convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceBlend {
    pub mode: BlendMode,
    /// `true` when source colors are already multiplied by alpha.
    pub premultiplied: bool,
}

impl DeviceBlend {
    /// Factors are chosen by the device (`blend_state` in the wgpu backend): straight sources
    /// are weighted by `SrcAlpha` there, premultiplied ones by `One`.
    pub fn new(mode: BlendMode, premultiplied: bool) -> Self {
        Self {
            mode,
            premultiplied,
        }
    }
}

/// Hardware sampler addressing for a base texture.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    MirroredRepeat,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
