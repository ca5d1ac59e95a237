//! Raster fallback: paint a cached repeating pattern through a 2D canvas.
//!
//! The frame is cut out of its base texture once into a scratch image (rotated back and placed
//! at its trim offset), optionally tinted, then turned into a repeating pattern. That pattern is
//! reused across frames until the texture or the tint changes.

use std::cell::Ref;
use std::f64::consts::FRAC_PI_2;

use crate::foundation::core::{Affine, BlendMode, Rect, Size, Tint, Vec2};
use crate::foundation::error::TilingResult;
use crate::render::accelerated::readiness;
use crate::render::{DrawOutcome, DrawPath, SkipReason};
use crate::texture::base::TexturePixels;
use crate::texture::frame::{Texture, TextureKey};
use crate::tiling::surface::TiledSurface;

/// What the software renderer needs from a 2D drawing surface.
///
/// Transforms follow the usual canvas convention: [`Canvas2d::transform`] post-multiplies the
/// current matrix, so it acts in the space set up by earlier calls.
pub trait Canvas2d {
    /// Offscreen image the frame is extracted into.
    type Image;
    /// Repeating fill built from an image. Kept on the surface between draws.
    type Pattern: 'static;

    /// Transparent `width x height` image, in device pixels.
    fn create_image(&mut self, width: u32, height: u32) -> TilingResult<Self::Image>;

    /// Copy `blit.src` of `source` onto `blit.dst` of `target`, with `blit.pre` applied to the
    /// target's coordinate space first.
    fn draw_image(
        &mut self,
        target: &mut Self::Image,
        source: &TexturePixels,
        blit: &FrameBlit,
    ) -> TilingResult<()>;

    /// Tinted copy of `image` (color channels multiplied, alpha kept).
    fn tint_image(&mut self, image: &Self::Image, tint: Tint) -> TilingResult<Self::Image>;

    fn create_pattern(&mut self, image: Self::Image) -> TilingResult<Self::Pattern>;

    fn set_transform(&mut self, transform: Affine);

    fn transform(&mut self, transform: Affine);

    fn set_global_alpha(&mut self, alpha: f32);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn set_fill_pattern(&mut self, pattern: &Self::Pattern);

    fn fill_rect(&mut self, rect: Rect) -> TilingResult<()>;
}

/// How one frame is copied out of its base texture. All values are in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBlit {
    /// Scratch image size: the untrimmed frame.
    pub canvas: Size,
    /// Region of the base texture, as stored.
    pub src: Rect,
    /// Destination in the scratch image's space after `pre`.
    pub dst: Rect,
    /// Identity, or a quarter turn back for frames stored rotated.
    pub pre: Affine,
}

/// Plan the extraction of `texture` at `base_resolution`.
pub fn frame_blit(texture: &Texture, base_resolution: f64) -> FrameBlit {
    let res = base_resolution;
    let frame = texture.frame();
    let orig = texture.orig();
    let src = Rect::new(frame.x0 * res, frame.y0 * res, frame.x1 * res, frame.y1 * res);

    let trim = texture
        .trim()
        .unwrap_or_else(|| Rect::new(0.0, 0.0, orig.width, orig.height));
    let (dx, dy) = (trim.x0 * res, trim.y0 * res);
    let (dw, dh) = (trim.width() * res, trim.height() * res);

    let canvas = Size::new(orig.width * res, orig.height * res);
    if texture.is_rotated() {
        FrameBlit {
            canvas,
            src,
            dst: Rect::new(-dy, dx, -dy + dh, dx + dw),
            pre: Affine::rotate(-FRAC_PI_2) * Affine::translate((-dh, 0.0)),
        }
    } else {
        FrameBlit {
            canvas,
            src,
            dst: Rect::new(dx, dy, dx + dw, dy + dh),
            pre: Affine::IDENTITY,
        }
    }
}

/// Phase of the repeating pattern, in device pixels.
///
/// Uses a truncating remainder, so negative positions give negative phases; either way the
/// phase only ever differs by whole tiles for positions a whole tile apart.
pub fn tile_phase(position: Vec2, scale: Vec2, orig: Size, base_resolution: f64) -> Vec2 {
    Vec2::new(
        ((position.x / scale.x) % orig.width) * base_resolution,
        ((position.y / scale.y) % orig.height) * base_resolution,
    )
}

/// Final translate and rectangle of the pattern fill, in pattern space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillPlan {
    pub translate: Vec2,
    pub rect: Rect,
}

/// Where to fill for a surface with the given phase.
///
/// When the anchor shifts the pattern too, the phase translate happens first and the anchor
/// offset moves only the rectangle. Otherwise both go into the translate and the rectangle
/// starts at minus the phase.
pub fn fill_plan(surface: &TiledSurface, phase: Vec2, base_resolution: f64) -> FillPlan {
    let res = base_resolution;
    let scale = surface.tile_scale();
    let anchor_x = surface.anchor.x * -surface.width * res;
    let anchor_y = surface.anchor.y * -surface.height * res;
    let size = Size::new(
        surface.width / scale.x * res,
        surface.height / scale.y * res,
    );

    if surface.uv_respect_anchor {
        FillPlan {
            translate: phase,
            rect: Rect::from_origin_size((-phase.x + anchor_x, -phase.y + anchor_y), size),
        }
    } else {
        FillPlan {
            translate: Vec2::new(phase.x + anchor_x, phase.y + anchor_y),
            rect: Rect::from_origin_size((-phase.x, -phase.y), size),
        }
    }
}

/// Identity of a built pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub texture: TextureKey,
    pub tint: Tint,
}

/// Cached pattern of one surface, stored on the [`TiledSurface`] itself.
#[derive(Debug)]
pub struct TileCache<P> {
    key: PatternKey,
    pattern: P,
    rebuilds: u64,
}

impl<P> TileCache<P> {
    pub fn key(&self) -> PatternKey {
        self.key
    }

    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    /// How many times the pattern was built, first build included.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRendererOpts {
    /// Device pixels per logical pixel of the destination canvas.
    pub resolution: f64,
}

impl Default for CanvasRendererOpts {
    fn default() -> Self {
        Self { resolution: 1.0 }
    }
}

impl CanvasRendererOpts {
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Draws tiled surfaces through a [`Canvas2d`].
///
/// Patterns are cached on each surface, so they are released together with it.
pub struct CanvasRenderer<C: Canvas2d> {
    canvas: C,
    opts: CanvasRendererOpts,
}

impl<C: Canvas2d> CanvasRenderer<C> {
    pub fn new(canvas: C, opts: CanvasRendererOpts) -> Self {
        Self { canvas, opts }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    pub fn opts(&self) -> CanvasRendererOpts {
        self.opts
    }

    /// The pattern this renderer's canvas type cached on `surface`, if any.
    pub fn cache<'s>(&self, surface: &'s TiledSurface) -> Option<Ref<'s, TileCache<C::Pattern>>> {
        Ref::filter_map(surface.tile_cache_slot().borrow(), |slot| {
            slot.as_ref()?.downcast_ref::<TileCache<C::Pattern>>()
        })
        .ok()
    }

    /// Draw one surface. Textures that are not ready skip the draw without error.
    #[tracing::instrument(skip_all, fields(surface = surface.id().0))]
    pub fn render(&mut self, surface: &TiledSurface) -> TilingResult<DrawOutcome> {
        if let Some(reason) = readiness(surface) {
            tracing::trace!(?reason, "skipping draw");
            return Ok(DrawOutcome::Skipped(reason));
        }
        let Some(texture) = surface.texture() else {
            return Ok(DrawOutcome::Skipped(SkipReason::NoTexture));
        };
        let base = texture.base();
        let base_res = base.resolution();
        let scale = surface.tile_scale();
        let phase = tile_phase(surface.tile_position(), scale, texture.orig(), base_res);
        if surface.width == 0.0 || surface.height == 0.0 || !phase.is_finite() {
            tracing::trace!(reason = ?SkipReason::Degenerate, "skipping draw");
            return Ok(DrawOutcome::Skipped(SkipReason::Degenerate));
        }

        let key = PatternKey {
            texture: texture.key(),
            tint: surface.tint,
        };
        let previous = self.cache(surface).map(|c| (c.key, c.rebuilds));
        if previous.map(|(k, _)| k) != Some(key) {
            let Some(pixels) = base.pixels() else {
                return Ok(DrawOutcome::Skipped(SkipReason::NotLoaded));
            };
            let pattern = self.build_pattern(texture, &pixels, surface.tint)?;
            let rebuilds = previous.map_or(0, |(_, n)| n) + 1;
            tracing::debug!(rebuilds, tint = surface.tint.0, "rebuilt tile pattern");
            *surface.tile_cache_slot().borrow_mut() = Some(Box::new(TileCache {
                key,
                pattern,
                rebuilds,
            }));
        }
        let Some(cache) = self.cache(surface) else {
            return Ok(DrawOutcome::Skipped(SkipReason::NotLoaded));
        };

        let res = self.opts.resolution;
        self.canvas
            .set_transform(Affine::scale(res) * surface.world_transform);
        self.canvas.set_global_alpha(surface.world_alpha);
        self.canvas.set_blend_mode(surface.blend_mode);
        self.canvas.set_fill_pattern(&cache.pattern);

        // Pattern space scale stays a separate step from the world transform above.
        self.canvas.transform(Affine::scale_non_uniform(
            scale.x / base_res,
            scale.y / base_res,
        ));
        let plan = fill_plan(surface, phase, base_res);
        self.canvas.transform(Affine::translate(plan.translate));
        self.canvas.fill_rect(plan.rect)?;

        Ok(DrawOutcome::Drawn(DrawPath::Software))
    }

    fn build_pattern(
        &mut self,
        texture: &Texture,
        pixels: &TexturePixels,
        tint: Tint,
    ) -> TilingResult<C::Pattern> {
        let blit = frame_blit(texture, texture.base().resolution());
        let width = blit.canvas.width.round().max(1.0) as u32;
        let height = blit.canvas.height.round().max(1.0) as u32;

        let mut image = self.canvas.create_image(width, height)?;
        self.canvas.draw_image(&mut image, pixels, &blit)?;
        if !tint.is_white() {
            image = self.canvas.tint_image(&image, tint)?;
        }
        self.canvas.create_pattern(image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/software.rs"]
mod tests;
