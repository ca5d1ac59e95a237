//! Tessera renders a texture repeated across a rectangle ("tiled surfaces").
//!
//! A [`TiledSurface`] has its own width, height and anchor plus an independent tile transform
//! (scale, offset, rotation in texture pixels). Two renderers draw it:
//!
//! 1. **Accelerated**: [`TilingRenderer`] issues one quad per surface through a [`GpuDevice`],
//!    choosing a hardware-wrap fragment variant for untrimmed power-of-two textures and an
//!    atlas-aware modulo-and-clamp variant for everything else. With the `gpu` feature,
//!    `WgpuDevice` runs it on `wgpu`.
//! 2. **Software**: [`CanvasRenderer`] extracts the atlas frame once into a repeating pattern,
//!    caches it per surface, and fills through a [`Canvas2d`]. [`VelloCanvas`] provides one on
//!    `vello_cpu`.
//!
//! Textures come from [`BaseTexture`] sources shared between any number of [`Texture`] frames,
//! optionally loaded from sprite sheets into a [`TextureCache`].
//!
//! Textures that are still loading never produce errors: renderers return
//! [`DrawOutcome::Skipped`] and the caller renders again next frame.
#![forbid(unsafe_code)]

mod config;
mod foundation;
mod render;
mod texture;
mod tiling;

pub use config::{AtlasConfig, Backend, SurfaceConfig, WorldConfig, render_config};
pub use foundation::core::{
    Affine, BlendMode, DeviceBlend, Point, Rect, Size, Tint, Vec2, WrapMode,
};
pub use foundation::error::{TilingError, TilingResult};
pub use foundation::math::premultiply_tint_to_rgba;
pub use render::accelerated::{
    GpuDevice, QUAD_INDICES, Quad, TilingRenderer, TilingUniforms, choose_path,
};
pub use render::cpu::VelloCanvas;
pub use render::shaders::{
    COMMON_WGSL, GENERAL_FRAGMENT_WGSL, SIMPLE_FRAGMENT_WGSL, general_fragment_coord,
    shader_source,
};
pub use render::software::{
    Canvas2d, CanvasRenderer, CanvasRendererOpts, FillPlan, FrameBlit, PatternKey, TileCache,
    fill_plan, frame_blit, tile_phase,
};
#[cfg(feature = "gpu")]
pub use render::wgpu::{WgpuDevice, WgpuDeviceOpts};
pub use render::{DrawOutcome, DrawPath, FrameRgba8, SkipReason};
pub use texture::base::{BaseTexture, BaseTextureId, TexturePixels};
pub use texture::cache::{AtlasFrame, FrameRect, FrameSize, TextureCache};
pub use texture::frame::{FrameCorners, Texture, TextureKey};
pub use tiling::resolve::{
    PathKind, ResolvedCoords, ShadingPath, is_simple_candidate, resolve, select_path,
    tile_to_uv_matrix,
};
pub use tiling::surface::{DEFAULT_SURFACE_SIZE, SurfaceId, TiledSurface};
pub use tiling::tile_transform::TileTransform;
pub use tiling::uv_transform::{DEFAULT_CLAMP_MARGIN, UvTransform};
