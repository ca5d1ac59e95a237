//! JSON description of a single tiled surface on a canvas, as consumed by the `tessera` CLI.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context as _;

use crate::foundation::core::{Affine, BlendMode, Tint, Vec2};
use crate::foundation::error::{TilingError, TilingResult};
use crate::render::cpu::VelloCanvas;
use crate::render::software::{CanvasRenderer, CanvasRendererOpts};
use crate::render::{DrawOutcome, FrameRgba8};
use crate::texture::base::{BaseTexture, TexturePixels};
use crate::texture::cache::AtlasFrame;
use crate::texture::frame::Texture;
use crate::tiling::surface::TiledSurface;
use crate::tiling::uv_transform::DEFAULT_CLAMP_MARGIN;

/// Renderer selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Software pattern fill on `vello_cpu`.
    #[default]
    Cpu,
    /// Shader path on `wgpu`; needs the `gpu` feature.
    Gpu,
}

/// Use one frame of a sprite sheet instead of the whole image.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtlasConfig {
    pub frame: AtlasFrame,
    #[serde(default = "one")]
    pub resolution: f64,
}

/// Placement of the surface on the canvas: `translate * rotate * scale`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    #[serde(default)]
    pub translate: [f64; 2],
    #[serde(default = "unit2")]
    pub scale: [f64; 2],
    /// Radians.
    #[serde(default)]
    pub rotation: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            translate: [0.0, 0.0],
            scale: unit2(),
            rotation: 0.0,
        }
    }
}

impl WorldConfig {
    pub fn transform(&self) -> Affine {
        Affine::translate((self.translate[0], self.translate[1]))
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale[0], self.scale[1])
    }
}

/// One tiled surface drawn onto an otherwise empty canvas.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Image path, relative to the config file.
    pub texture: PathBuf,
    #[serde(default)]
    pub atlas: Option<AtlasConfig>,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub anchor: [f64; 2],
    #[serde(default = "unit2")]
    pub tile_scale: [f64; 2],
    #[serde(default)]
    pub tile_position: [f64; 2],
    #[serde(default)]
    pub tile_rotation: f64,
    #[serde(default)]
    pub tint: Tint,
    #[serde(default = "one_f32")]
    pub alpha: f32,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub uv_respect_anchor: bool,
    #[serde(default = "default_clamp_margin")]
    pub clamp_margin: f64,
    #[serde(default)]
    pub world: WorldConfig,
    /// Output size in device pixels.
    pub canvas: [u32; 2],
    /// Device pixels per logical pixel.
    #[serde(default = "one")]
    pub resolution: f64,
    /// Background, straight alpha. Transparent when absent.
    #[serde(default)]
    pub clear_rgba: Option<[u8; 4]>,
}

impl SurfaceConfig {
    pub fn validate(&self) -> TilingResult<()> {
        if !(self.width.is_finite() && self.height.is_finite()) || self.width < 0.0 || self.height < 0.0
        {
            return Err(TilingError::validation(
                "surface width/height must be finite and non-negative",
            ));
        }
        if self.canvas[0] == 0 || self.canvas[1] == 0 {
            return Err(TilingError::validation("canvas must be at least 1x1"));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(TilingError::validation("resolution must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(TilingError::validation("alpha must be in [0, 1]"));
        }
        if let Some(atlas) = &self.atlas
            && !(atlas.resolution.is_finite() && atlas.resolution > 0.0)
        {
            return Err(TilingError::validation("atlas resolution must be > 0"));
        }
        Ok(())
    }

    /// Read the texture relative to `base_dir` and decode it.
    pub fn load_texture(&self, base_dir: &Path) -> TilingResult<Texture> {
        let path = base_dir.join(&self.texture);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read texture '{}'", path.display()))?;
        let pixels = TexturePixels::decode(&bytes)?;
        Ok(match &self.atlas {
            Some(atlas) => {
                let base = Rc::new(BaseTexture::new(pixels).with_resolution(atlas.resolution));
                atlas.frame.to_texture(base)
            }
            None => Texture::new(Rc::new(BaseTexture::new(pixels))),
        })
    }

    /// Surface described by this config, showing `texture`.
    pub fn build_surface(&self, texture: Texture) -> TiledSurface {
        let mut surface = TiledSurface::new(texture, self.width, self.height);
        surface.anchor = Vec2::new(self.anchor[0], self.anchor[1]);
        surface.tint = self.tint;
        surface.blend_mode = self.blend_mode;
        surface.uv_respect_anchor = self.uv_respect_anchor;
        surface.world_transform = self.world.transform();
        surface.world_alpha = self.alpha;
        surface.set_tile_scale(Vec2::new(self.tile_scale[0], self.tile_scale[1]));
        surface.set_tile_position(Vec2::new(self.tile_position[0], self.tile_position[1]));
        surface.tile_transform.set_rotation(self.tile_rotation);
        surface.set_clamp_margin(self.clamp_margin);
        surface
    }
}

/// Load, build and draw a config with the chosen backend.
#[tracing::instrument(skip_all, fields(backend = ?backend))]
pub fn render_config(
    config: &SurfaceConfig,
    base_dir: &Path,
    backend: Backend,
) -> TilingResult<(FrameRgba8, DrawOutcome)> {
    config.validate()?;
    let texture = config.load_texture(base_dir)?;
    let mut surface = config.build_surface(texture);
    let [width, height] = config.canvas;

    match backend {
        Backend::Cpu => {
            let mut canvas = VelloCanvas::new(width, height)?;
            if let Some(clear) = config.clear_rgba {
                canvas = canvas.with_clear_rgba(clear);
            }
            let mut renderer = CanvasRenderer::new(
                canvas,
                CanvasRendererOpts::default().with_resolution(config.resolution),
            );
            let outcome = renderer.render(&surface)?;
            Ok((renderer.canvas_mut().finish(), outcome))
        }
        Backend::Gpu => render_gpu(config, &mut surface),
    }
}

#[cfg(feature = "gpu")]
fn render_gpu(
    config: &SurfaceConfig,
    surface: &mut TiledSurface,
) -> TilingResult<(FrameRgba8, DrawOutcome)> {
    use crate::render::accelerated::TilingRenderer;
    use crate::render::wgpu::{WgpuDevice, WgpuDeviceOpts};

    let [width, height] = config.canvas;
    let mut opts = WgpuDeviceOpts::default()
        .with_size(width, height)
        .with_resolution(config.resolution);
    if let Some(clear) = config.clear_rgba {
        opts = opts.with_clear_rgba(clear);
    }
    let mut renderer = TilingRenderer::new(WgpuDevice::new(opts)?);
    let outcome = renderer.render(surface)?;
    let frame = renderer.device_mut().readback_rgba8()?;
    Ok((frame, outcome))
}

#[cfg(not(feature = "gpu"))]
fn render_gpu(
    _config: &SurfaceConfig,
    _surface: &mut TiledSurface,
) -> TilingResult<(FrameRgba8, DrawOutcome)> {
    Err(TilingError::backend(
        "the gpu backend needs tessera built with the `gpu` feature",
    ))
}

fn one() -> f64 {
    1.0
}

fn one_f32() -> f32 {
    1.0
}

fn unit2() -> [f64; 2] {
    [1.0, 1.0]
}

fn default_clamp_margin() -> f64 {
    DEFAULT_CLAMP_MARGIN
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
