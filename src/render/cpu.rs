use std::sync::Arc;

use crate::foundation::core::{Affine, BlendMode, Rect, Tint};
use crate::foundation::error::{TilingError, TilingResult};
use crate::foundation::math::tint_premul_rgba8_in_place;
use crate::render::FrameRgba8;
use crate::render::software::{Canvas2d, FrameBlit};
use crate::texture::base::TexturePixels;

/// [`Canvas2d`] on the `vello_cpu` rasterizer.
///
/// Fills are recorded into one render context and rasterized by [`VelloCanvas::finish`].
pub struct VelloCanvas {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    transform: Affine,
    alpha: f32,
    blend: BlendMode,
    pattern: Option<vello_cpu::Image>,
    clear: Option<[u8; 4]>,
}

impl std::fmt::Debug for VelloCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VelloCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transform", &self.transform)
            .field("alpha", &self.alpha)
            .field("blend", &self.blend)
            .finish_non_exhaustive()
    }
}

impl VelloCanvas {
    pub fn new(width: u32, height: u32) -> TilingResult<Self> {
        let (width, height) = pixmap_size(width, height)?;
        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            transform: Affine::IDENTITY,
            alpha: 1.0,
            blend: BlendMode::Normal,
            pattern: None,
            clear: None,
        })
    }

    /// Straight-alpha background, filled before anything else so fills blend against it.
    pub fn with_clear_rgba(mut self, rgba: [u8; 4]) -> Self {
        self.clear = Some(rgba);
        self.fill_clear();
        self
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Rasterize everything filled so far and start a new, empty frame.
    pub fn finish(&mut self) -> FrameRgba8 {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        self.ctx.reset();
        self.fill_clear();
        FrameRgba8 {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn fill_clear(&mut self) {
        let Some([r, g, b, a]) = self.clear else {
            return;
        };
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
    }
}

impl Canvas2d for VelloCanvas {
    type Image = vello_cpu::Pixmap;
    type Pattern = vello_cpu::Image;

    fn create_image(&mut self, width: u32, height: u32) -> TilingResult<vello_cpu::Pixmap> {
        let (w, h) = pixmap_size(width, height)?;
        Ok(vello_cpu::Pixmap::new(w, h))
    }

    fn draw_image(
        &mut self,
        target: &mut vello_cpu::Pixmap,
        source: &TexturePixels,
        blit: &FrameBlit,
    ) -> TilingResult<()> {
        let (src, dst) = (blit.src, blit.dst);
        if src.width() <= 0.0 || src.height() <= 0.0 {
            return Err(TilingError::validation("frame blit has an empty source rect"));
        }
        let source = premul_pixels_to_pixmap(source)?;

        // Texture space to scratch space: src rect onto dst rect.
        let paint_transform = Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / src.width(), dst.height() / src.height())
            * Affine::translate((-src.x0, -src.y0));

        let mut ctx = vello_cpu::RenderContext::new(target.width(), target.height());
        ctx.set_transform(affine_to_cpu(blit.pre));
        ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(source)),
            sampler: vello_cpu::peniko::ImageSampler {
                x_extend: vello_cpu::peniko::Extend::Pad,
                y_extend: vello_cpu::peniko::Extend::Pad,
                quality: vello_cpu::peniko::ImageQuality::Low,
                ..vello_cpu::peniko::ImageSampler::default()
            },
        });
        ctx.set_paint_transform(affine_to_cpu(paint_transform));
        ctx.fill_rect(&rect_to_cpu(dst));
        ctx.flush();
        ctx.render_to_pixmap(target);
        Ok(())
    }

    fn tint_image(
        &mut self,
        image: &vello_cpu::Pixmap,
        tint: Tint,
    ) -> TilingResult<vello_cpu::Pixmap> {
        let mut out = vello_cpu::Pixmap::new(image.width(), image.height());
        out.data_as_u8_slice_mut()
            .copy_from_slice(image.data_as_u8_slice());
        tint_premul_rgba8_in_place(out.data_as_u8_slice_mut(), tint);
        Ok(out)
    }

    fn create_pattern(&mut self, image: vello_cpu::Pixmap) -> TilingResult<vello_cpu::Image> {
        Ok(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(image)),
            sampler: vello_cpu::peniko::ImageSampler {
                x_extend: vello_cpu::peniko::Extend::Repeat,
                y_extend: vello_cpu::peniko::Extend::Repeat,
                quality: vello_cpu::peniko::ImageQuality::Low,
                ..vello_cpu::peniko::ImageSampler::default()
            },
        })
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn transform(&mut self, transform: Affine) {
        self.transform *= transform;
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn set_fill_pattern(&mut self, pattern: &vello_cpu::Image) {
        self.pattern = Some(pattern.clone());
    }

    fn fill_rect(&mut self, rect: Rect) -> TilingResult<()> {
        let pattern = self
            .pattern
            .clone()
            .ok_or_else(|| TilingError::backend("fill_rect called without a fill pattern"))?;

        self.ctx.set_transform(affine_to_cpu(self.transform));
        self.ctx.set_paint(pattern);
        // The pattern is anchored at the origin of the current user space.
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        if self.alpha < 1.0 {
            // Blend and opacity apply together when the layer is composited.
            self.ctx
                .set_blend_mode(vello_cpu::peniko::BlendMode::default());
            self.ctx
                .push_layer(None, Some(blend_to_cpu(self.blend)), Some(self.alpha), None, None);
            self.ctx.fill_rect(&rect_to_cpu(rect));
            self.ctx.pop_layer();
        } else {
            self.ctx.set_blend_mode(blend_to_cpu(self.blend));
            self.ctx.fill_rect(&rect_to_cpu(rect));
            self.ctx
                .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        }
        Ok(())
    }
}

fn pixmap_size(width: u32, height: u32) -> TilingResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TilingError::backend("canvas width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TilingError::backend("canvas height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(TilingError::validation("canvas must be at least 1x1"));
    }
    Ok((w, h))
}

fn premul_pixels_to_pixmap(pixels: &TexturePixels) -> TilingResult<vello_cpu::Pixmap> {
    let (w, h) = pixmap_size(pixels.width, pixels.height)?;
    let mut may_have_opacities = false;
    let mut out = Vec::with_capacity(pixels.width as usize * pixels.height as usize);
    for px in pixels.rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        out.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        out,
        w,
        h,
        may_have_opacities,
    ))
}

fn blend_to_cpu(mode: BlendMode) -> vello_cpu::peniko::BlendMode {
    use vello_cpu::peniko::{Compose, Mix};
    match mode {
        BlendMode::Normal => vello_cpu::peniko::BlendMode::new(Mix::Normal, Compose::SrcOver),
        BlendMode::Add => vello_cpu::peniko::BlendMode::new(Mix::Normal, Compose::Plus),
        BlendMode::Multiply => vello_cpu::peniko::BlendMode::new(Mix::Multiply, Compose::SrcOver),
        BlendMode::Screen => vello_cpu::peniko::BlendMode::new(Mix::Screen, Compose::SrcOver),
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
