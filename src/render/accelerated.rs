//! Shader-based renderer: one textured quad per surface.
//!
//! Draw order per call is fixed: quad upload, shader bind, texture bind, uniforms, blend, draw.
//! The device behind [`GpuDevice`] can be a real GPU (see `render::wgpu`) or a recorder in tests.

use crate::foundation::core::{Affine, DeviceBlend, Vec2};
use crate::foundation::error::TilingResult;
use crate::foundation::math::premultiply_tint_to_rgba;
use crate::render::{DrawOutcome, SkipReason};
use crate::texture::base::BaseTexture;
use crate::texture::frame::Texture;
use crate::tiling::resolve::{PathKind, ShadingPath, is_simple_candidate, resolve, select_path};
use crate::tiling::surface::TiledSurface;

/// Two triangles over the four quad vertices.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Quad vertex data: four `(x, y)` positions in surface-local pixels and four `(u, v)` pairs,
/// in the order top-left, top-right, bottom-right, bottom-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub positions: [f32; 8],
    pub uvs: [f32; 8],
}

impl Quad {
    /// Geometry for a `width x height` surface around `anchor`.
    ///
    /// With `uv_respect_anchor` the UVs shift with the anchor so the pattern origin stays on it;
    /// otherwise they cover the unit square.
    pub fn build(width: f64, height: f64, anchor: Vec2, uv_respect_anchor: bool) -> Self {
        let x0 = (width * -anchor.x) as f32;
        let y0 = (height * -anchor.y) as f32;
        let x1 = (width * (1.0 - anchor.x)) as f32;
        let y1 = (height * (1.0 - anchor.y)) as f32;

        let (u0, v0, u1, v1) = if uv_respect_anchor {
            (
                -anchor.x as f32,
                -anchor.y as f32,
                (1.0 - anchor.x) as f32,
                (1.0 - anchor.y) as f32,
            )
        } else {
            (0.0, 0.0, 1.0, 1.0)
        };

        Self {
            positions: [x0, y0, x1, y0, x1, y1, x0, y1],
            uvs: [u0, v0, u1, v0, u1, v1, u0, v1],
        }
    }
}

/// Per-draw uniform values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilingUniforms {
    /// Quad UV to sample coordinate (simple path) or to tile space (general path).
    pub transform: Affine,
    /// The surface's world transform.
    pub translation: Affine,
    /// Tint times alpha, premultiplied when the texture is.
    pub color: [f32; 4],
    pub shading: ShadingPath,
    /// Slot returned by [`GpuDevice::bind_texture`].
    pub sampler: u32,
}

/// What the accelerated renderer needs from a drawing device.
pub trait GpuDevice {
    /// `true` once the base texture has a device-side resource.
    fn is_texture_resident(&self, base: &BaseTexture) -> bool;

    fn upload_quad(&mut self, quad: &Quad);

    fn bind_shader(&mut self, kind: PathKind);

    /// Make the texture's base sampleable and return its sampler slot.
    fn bind_texture(&mut self, texture: &Texture) -> TilingResult<u32>;

    fn set_uniforms(&mut self, uniforms: &TilingUniforms);

    fn set_blend_mode(&mut self, blend: DeviceBlend);

    /// Draw the uploaded quad with [`QUAD_INDICES`].
    fn draw_quad(&mut self) -> TilingResult<()>;
}

/// Pick the fragment variant for `texture` on `device`.
///
/// A simple-path candidate that is not resident yet gets its base texture upgraded to a
/// repeating wrap mode here, so the upload that follows creates a repeating sampler.
pub fn choose_path<D: GpuDevice + ?Sized>(device: &D, texture: &Texture) -> PathKind {
    let base = texture.base();
    let candidate = is_simple_candidate(texture);
    let resident = device.is_texture_resident(base);
    let kind = select_path(candidate, resident, base.wrap_mode());
    if candidate && !resident {
        base.ensure_repeat_capable();
    }
    kind
}

/// Reason a surface cannot be drawn with its current texture, if any.
pub(crate) fn readiness(surface: &TiledSurface) -> Option<SkipReason> {
    let Some(texture) = surface.texture() else {
        return Some(SkipReason::NoTexture);
    };
    if !texture.base().has_loaded() {
        return Some(SkipReason::NotLoaded);
    }
    if !texture.is_valid() {
        return Some(SkipReason::InvalidFrame);
    }
    None
}

/// Draws tiled surfaces through a [`GpuDevice`].
#[derive(Debug)]
pub struct TilingRenderer<D> {
    device: D,
}

impl<D: GpuDevice> TilingRenderer<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Draw one surface. Textures that are not ready skip the draw without error.
    #[tracing::instrument(skip_all, fields(surface = surface.id().0))]
    pub fn render(&mut self, surface: &mut TiledSurface) -> TilingResult<DrawOutcome> {
        if let Some(reason) = readiness(surface) {
            tracing::trace!(?reason, "skipping draw");
            return Ok(DrawOutcome::Skipped(reason));
        }

        let local = surface.tile_transform.local_transform();
        surface.uv_transform.update(false);

        let size = surface.size();
        let quad = Quad::build(
            surface.width,
            surface.height,
            surface.anchor,
            surface.uv_respect_anchor,
        );
        let Some(texture) = surface.uv_transform.texture() else {
            return Ok(DrawOutcome::Skipped(SkipReason::NoTexture));
        };

        let kind = choose_path(&self.device, texture);
        let Some(resolved) = resolve(local, texture, &surface.uv_transform, size, kind) else {
            tracing::trace!(reason = ?SkipReason::Degenerate, "skipping draw");
            return Ok(DrawOutcome::Skipped(SkipReason::Degenerate));
        };
        tracing::debug!(path = ?kind, "selected shading path");

        let premultiplied = texture.base().premultiplied_alpha();

        self.device.upload_quad(&quad);
        self.device.bind_shader(kind);
        let sampler = self.device.bind_texture(texture)?;
        self.device.set_uniforms(&TilingUniforms {
            transform: resolved.transform,
            translation: surface.world_transform,
            color: premultiply_tint_to_rgba(surface.tint, surface.world_alpha, premultiplied),
            shading: resolved.path,
            sampler,
        });
        self.device
            .set_blend_mode(DeviceBlend::new(surface.blend_mode, premultiplied));
        self.device.draw_quad()?;

        Ok(DrawOutcome::Drawn(kind.into()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/accelerated.rs"]
mod tests;
