use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Affine, BlendMode, Point, Rect, Size, Tint, Vec2};
use crate::foundation::error::TilingResult;
use crate::texture::base::{BaseTexture, TexturePixels};
use crate::texture::cache::TextureCache;
use crate::texture::frame::Texture;
use crate::tiling::tile_transform::TileTransform;
use crate::tiling::uv_transform::UvTransform;

/// Side length used by [`TiledSurface::with_default_size`].
pub const DEFAULT_SURFACE_SIZE: f64 = 100.0;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`TiledSurface`], used by renderers to key per-surface caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// A rectangle of `width x height` filled with a repeating texture.
///
/// `width` and `height` size the surface directly; they are not a scale of some underlying
/// geometry, so changing them never stretches the pattern. The tile pattern moves and scales
/// through [`TiledSurface::tile_transform`], in texture-pixel units.
///
/// `world_transform` and `world_alpha` are written by the host every frame before rendering.
#[derive(Debug)]
pub struct TiledSurface {
    id: SurfaceId,
    pub width: f64,
    pub height: f64,
    /// Origin of the surface, as a fraction of its size.
    pub anchor: Vec2,
    pub tint: Tint,
    pub blend_mode: BlendMode,
    pub tile_transform: TileTransform,
    pub uv_transform: UvTransform,
    /// Whether the anchor also shifts the pattern origin.
    pub uv_respect_anchor: bool,
    pub world_transform: Affine,
    pub world_alpha: f32,
    /// Software tile pattern; typed by the renderer that filled it and dropped with the surface.
    tile_cache: RefCell<Option<Box<dyn Any>>>,
}

impl TiledSurface {
    pub fn new(texture: Texture, width: f64, height: f64) -> Self {
        let mut uv_transform = UvTransform::new(Some(texture));
        uv_transform.update(false);
        Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            width,
            height,
            anchor: Vec2::ZERO,
            tint: Tint::WHITE,
            blend_mode: BlendMode::Normal,
            tile_transform: TileTransform::new(),
            uv_transform,
            uv_respect_anchor: false,
            world_transform: Affine::IDENTITY,
            world_alpha: 1.0,
            tile_cache: RefCell::new(None),
        }
    }

    pub fn with_default_size(texture: Texture) -> Self {
        Self::new(texture, DEFAULT_SURFACE_SIZE, DEFAULT_SURFACE_SIZE)
    }

    /// Surface showing the frame `id` of `cache`. Unknown ids are a hard error.
    pub fn from_frame(cache: &TextureCache, id: &str, width: f64, height: f64) -> TilingResult<Self> {
        let texture = cache.get(id)?;
        Ok(Self::new(texture, width, height))
    }

    /// Surface showing an encoded image (PNG, JPEG, ...) in full.
    pub fn from_image_bytes(bytes: &[u8], width: f64, height: f64) -> TilingResult<Self> {
        let pixels = TexturePixels::decode(bytes)?;
        let base = Rc::new(BaseTexture::new(pixels));
        Ok(Self::new(Texture::new(base), width, height))
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.uv_transform.texture()
    }

    /// Swap the texture and resynchronize the UV mapping.
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.uv_transform.set_texture(texture);
        self.uv_transform.update(true);
    }

    pub fn tile_scale(&self) -> Vec2 {
        self.tile_transform.scale()
    }

    pub fn set_tile_scale(&mut self, scale: Vec2) {
        self.tile_transform.set_scale(scale);
    }

    pub fn tile_position(&self) -> Vec2 {
        self.tile_transform.position()
    }

    pub fn set_tile_position(&mut self, position: Vec2) {
        self.tile_transform.set_position(position);
    }

    pub fn clamp_margin(&self) -> f64 {
        self.uv_transform.clamp_margin()
    }

    pub fn set_clamp_margin(&mut self, margin: f64) {
        self.uv_transform.set_clamp_margin(margin);
    }

    /// Drop the cached software pattern; the next software draw rebuilds it.
    pub fn clear_tile_cache(&self) {
        self.tile_cache.borrow_mut().take();
    }

    pub(crate) fn tile_cache_slot(&self) -> &RefCell<Option<Box<dyn Any>>> {
        &self.tile_cache
    }

    /// Local-space rectangle, straight from size and anchor.
    pub fn local_bounds(&self) -> Rect {
        let x0 = -self.width * self.anchor.x;
        let y0 = -self.height * self.anchor.y;
        Rect::new(x0, y0, x0 + self.width, y0 + self.height)
    }

    /// Axis-aligned bounds in world space.
    pub fn bounds(&self) -> Rect {
        self.world_transform.transform_rect_bbox(self.local_bounds())
    }

    /// Hit test in world space. Edges at the anchor side count, the far edges do not.
    pub fn contains_point(&self, point: Point) -> bool {
        if self.world_transform.determinant() == 0.0 {
            return false;
        }
        let local = self.world_transform.inverse() * point;
        let r = self.local_bounds();
        local.x >= r.x0 && local.x < r.x1 && local.y >= r.y0 && local.y < r.y1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/surface.rs"]
mod tests;
