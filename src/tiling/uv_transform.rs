use crate::foundation::core::{Affine, Vec2};
use crate::texture::frame::{Texture, TextureKey};

/// Default inward shrink of the clamp rectangle, in texels.
pub const DEFAULT_CLAMP_MARGIN: f64 = 0.5;

/// Maps the unit square onto a texture's frame inside its base texture and keeps a clamp
/// rectangle that stops sampling from bleeding into neighbouring atlas frames.
///
/// Derived values are only valid after [`UvTransform::update`] ran for the current texture
/// state; [`UvTransform::is_stale`] reports when they are out of date.
#[derive(Clone, Debug)]
pub struct UvTransform {
    texture: Option<Texture>,
    clamp_margin: f64,
    clamp_offset: f64,
    map_coord: Affine,
    clamp_frame: [f64; 4],
    clamp_offset_uv: Vec2,
    last_key: Option<TextureKey>,
    revision: u64,
}

impl UvTransform {
    pub fn new(texture: Option<Texture>) -> Self {
        Self {
            texture,
            clamp_margin: DEFAULT_CLAMP_MARGIN,
            clamp_offset: 0.0,
            map_coord: Affine::IDENTITY,
            clamp_frame: [0.0, 0.0, 1.0, 1.0],
            clamp_offset_uv: Vec2::ZERO,
            last_key: None,
            revision: 0,
        }
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Mutable access for frame edits; the texture's version change makes this transform stale.
    pub fn texture_mut(&mut self) -> Option<&mut Texture> {
        self.texture.as_mut()
    }

    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }

    pub fn clamp_margin(&self) -> f64 {
        self.clamp_margin
    }

    /// Change the margin and recompute immediately, even when the value did not change.
    ///
    /// A negative margin grows the region, which suits transparent trimmed atlas frames.
    pub fn set_clamp_margin(&mut self, margin: f64) {
        self.clamp_margin = margin;
        self.update(true);
    }

    /// Texel offset applied to the clamp rectangle and the wrap origin.
    pub fn clamp_offset(&self) -> f64 {
        self.clamp_offset
    }

    pub fn set_clamp_offset(&mut self, offset: f64) {
        self.clamp_offset = offset;
        self.update(true);
    }

    pub fn map_coord(&self) -> Affine {
        self.map_coord
    }

    /// `[x0, y0, x1, y1]` in normalized base-texture space.
    pub fn clamp_frame(&self) -> [f64; 4] {
        self.clamp_frame
    }

    pub fn clamp_offset_uv(&self) -> Vec2 {
        self.clamp_offset_uv
    }

    /// Number of recomputations so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_stale(&self) -> bool {
        match &self.texture {
            Some(tex) => self.last_key != Some(tex.key()),
            None => false,
        }
    }

    /// Recompute the mapping when the texture changed since the last update, or when `force`d.
    ///
    /// Returns `true` when values were recomputed. Textures that are not ready are left alone.
    pub fn update(&mut self, force: bool) -> bool {
        let Some(tex) = self.texture.as_ref() else {
            return false;
        };
        if !tex.is_valid() {
            return false;
        }
        let key = tex.key();
        if !force && self.last_key == Some(key) {
            return false;
        }
        self.last_key = Some(key);

        let corners = tex.corners();
        let mut map_coord = Affine::new([
            corners.p1.x - corners.p0.x,
            corners.p1.y - corners.p0.y,
            corners.p3.x - corners.p0.x,
            corners.p3.y - corners.p0.y,
            corners.p0.x,
            corners.p0.y,
        ]);
        if let Some(trim) = tex.trim() {
            let orig = tex.orig();
            let trim_map = Affine::new([
                orig.width / trim.width(),
                0.0,
                0.0,
                orig.height / trim.height(),
                -trim.x0 / trim.width(),
                -trim.y0 / trim.height(),
            ]);
            map_coord = map_coord * trim_map;
        }
        self.map_coord = map_coord;

        let base = tex.base();
        let frame = tex.frame();
        let margin = self.clamp_margin / base.resolution();
        let offset = self.clamp_offset;
        let (bw, bh) = (base.width(), base.height());
        self.clamp_frame = [
            (frame.x0 + margin + offset) / bw,
            (frame.y0 + margin + offset) / bh,
            (frame.x1 - margin + offset) / bw,
            (frame.y1 - margin + offset) / bh,
        ];
        self.clamp_offset_uv = Vec2::new(
            offset / f64::from(base.real_width()),
            offset / f64::from(base.real_height()),
        );
        self.revision += 1;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/uv_transform.rs"]
mod tests;
