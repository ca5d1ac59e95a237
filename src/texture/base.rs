use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use crate::foundation::core::WrapMode;
use crate::foundation::error::{TilingError, TilingResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

static NEXT_TEXTURE_UID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_texture_uid() -> u64 {
    NEXT_TEXTURE_UID.fetch_add(1, Ordering::Relaxed)
}

/// Premultiplied RGBA8 pixels, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TexturePixels {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl TexturePixels {
    /// Wrap bytes that are already premultiplied.
    pub fn from_premul_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> TilingResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if bytes.len() != expected {
            return Err(TilingError::validation(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height}",
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(bytes),
        })
    }

    /// Premultiply straight-alpha bytes and wrap them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut bytes: Vec<u8>) -> TilingResult<Self> {
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul_rgba8(width, height, bytes)
    }

    /// Decode encoded image bytes (PNG, JPEG, ...).
    pub fn decode(bytes: &[u8]) -> TilingResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode texture image")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_straight_rgba8(width, height, rgba.into_raw())
    }

    /// Undo premultiplication, for consumers that sample straight alpha.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

/// Identity of a [`BaseTexture`], stable for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseTextureId(pub u64);

/// A source image shared by any number of [`crate::Texture`] frames.
///
/// Sizes are reported in logical units (`real pixels / resolution`). The wrap mode lives in a
/// [`Cell`] because tiled surfaces sharing the texture may upgrade it to [`WrapMode::Repeat`]
/// while rendering; see [`BaseTexture::ensure_repeat_capable`].
#[derive(Debug)]
pub struct BaseTexture {
    id: BaseTextureId,
    resolution: f64,
    premultiplied_alpha: bool,
    wrap_mode: Cell<WrapMode>,
    source: RefCell<Option<TexturePixels>>,
    version: Cell<u64>,
}

impl BaseTexture {
    /// A loaded base texture at resolution 1.
    pub fn new(pixels: TexturePixels) -> Self {
        let base = Self::pending(1.0);
        base.load(pixels);
        base
    }

    /// A base texture whose pixels arrive later through [`BaseTexture::load`].
    pub fn pending(resolution: f64) -> Self {
        Self {
            id: BaseTextureId(next_texture_uid()),
            resolution: if resolution > 0.0 { resolution } else { 1.0 },
            premultiplied_alpha: true,
            wrap_mode: Cell::new(WrapMode::Clamp),
            source: RefCell::new(None),
            version: Cell::new(0),
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        if resolution > 0.0 {
            self.resolution = resolution;
        }
        self
    }

    pub fn with_premultiplied_alpha(mut self, premultiplied: bool) -> Self {
        self.premultiplied_alpha = premultiplied;
        self
    }

    pub fn with_wrap_mode(self, mode: WrapMode) -> Self {
        self.wrap_mode.set(mode);
        self
    }

    /// Install (or replace) the source pixels. Every frame of this texture observes a new version.
    pub fn load(&self, pixels: TexturePixels) {
        *self.source.borrow_mut() = Some(pixels);
        self.version.set(self.version.get() + 1);
    }

    pub fn id(&self) -> BaseTextureId {
        self.id
    }

    pub fn has_loaded(&self) -> bool {
        self.source
            .borrow()
            .as_ref()
            .is_some_and(|p| p.width > 0 && p.height > 0)
    }

    pub fn pixels(&self) -> Option<TexturePixels> {
        self.source.borrow().clone()
    }

    pub fn real_width(&self) -> u32 {
        self.source.borrow().as_ref().map_or(0, |p| p.width)
    }

    pub fn real_height(&self) -> u32 {
        self.source.borrow().as_ref().map_or(0, |p| p.height)
    }

    pub fn width(&self) -> f64 {
        f64::from(self.real_width()) / self.resolution
    }

    pub fn height(&self) -> f64 {
        f64::from(self.real_height()) / self.resolution
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    /// `true` when both pixel dimensions are powers of two.
    pub fn is_power_of_two(&self) -> bool {
        self.has_loaded() && self.real_width().is_power_of_two() && self.real_height().is_power_of_two()
    }

    /// Bumped whenever the source pixels change.
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode.get()
    }

    pub fn set_wrap_mode(&self, mode: WrapMode) {
        self.wrap_mode.set(mode);
    }

    /// Upgrade a clamp-only texture to [`WrapMode::Repeat`] so hardware wrapping can tile it.
    ///
    /// Idempotent. Returns `true` only when the mode actually changed. Other users of this base
    /// texture observe the new mode.
    pub fn ensure_repeat_capable(&self) -> bool {
        if self.wrap_mode.get() != WrapMode::Clamp {
            return false;
        }
        self.wrap_mode.set(WrapMode::Repeat);
        tracing::debug!(base = self.id.0, "upgraded base texture wrap mode to repeat");
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/texture/base.rs"]
mod tests;
