use std::rc::Rc;

use crate::foundation::core::{Point, Rect, Size};
use crate::texture::base::{BaseTexture, next_texture_uid};

/// Identity plus version of a [`Texture`]. Two equal keys always describe the same texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub uid: u64,
    pub version: u64,
}

/// Corners of a frame in normalized base-texture space.
///
/// `p0` is where the frame's top-left texel lives, `p1` its top-right, `p3` its bottom-left.
/// For a frame stored rotated in the atlas these are not the region's own top-left/right corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCorners {
    pub p0: Point,
    pub p1: Point,
    pub p3: Point,
}

/// A view onto a region of a shared [`BaseTexture`]: one packed atlas frame, or the whole image.
///
/// - `frame` is the occupied region of the base texture, in base units. For rotated frames it
///   is the region as stored, so its width corresponds to the displayed height.
/// - `orig` is the untrimmed display size.
/// - `trim` places the stored pixels inside `orig` when transparent borders were cropped.
#[derive(Debug)]
pub struct Texture {
    uid: u64,
    base: Rc<BaseTexture>,
    frame: Option<Rect>,
    orig: Option<Size>,
    trim: Option<Rect>,
    rotated: bool,
    update_id: u64,
}

impl Clone for Texture {
    /// Clones get a fresh identity so that mutating one copy never aliases cached state of the other.
    fn clone(&self) -> Self {
        Self {
            uid: next_texture_uid(),
            base: Rc::clone(&self.base),
            frame: self.frame,
            orig: self.orig,
            trim: self.trim,
            rotated: self.rotated,
            update_id: self.update_id,
        }
    }
}

impl Texture {
    /// A texture covering the whole base texture, whatever its size once loaded.
    pub fn new(base: Rc<BaseTexture>) -> Self {
        Self {
            uid: next_texture_uid(),
            base,
            frame: None,
            orig: None,
            trim: None,
            rotated: false,
            update_id: 0,
        }
    }

    /// A texture limited to `frame` of the base texture.
    pub fn from_frame(base: Rc<BaseTexture>, frame: Rect) -> Self {
        let mut tex = Self::new(base);
        tex.frame = Some(frame);
        tex
    }

    pub fn with_orig(mut self, orig: Size) -> Self {
        self.orig = Some(orig);
        self
    }

    pub fn with_trim(mut self, trim: Rect) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn with_rotation(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    pub fn base(&self) -> &Rc<BaseTexture> {
        &self.base
    }

    pub fn frame(&self) -> Rect {
        self.frame
            .unwrap_or_else(|| Rect::new(0.0, 0.0, self.base.width(), self.base.height()))
    }

    /// Point this texture at another region. Bumps the version.
    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = Some(frame);
        self.update_id += 1;
    }

    /// Change trimming/rotation metadata. Bumps the version.
    pub fn set_layout(&mut self, orig: Option<Size>, trim: Option<Rect>, rotated: bool) {
        self.orig = orig;
        self.trim = trim;
        self.rotated = rotated;
        self.update_id += 1;
    }

    pub fn orig(&self) -> Size {
        if let Some(orig) = self.orig {
            return orig;
        }
        let f = self.frame();
        if self.rotated {
            Size::new(f.height(), f.width())
        } else {
            Size::new(f.width(), f.height())
        }
    }

    pub fn trim(&self) -> Option<Rect> {
        self.trim
    }

    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    /// Display width (untrimmed).
    pub fn width(&self) -> f64 {
        self.orig().width
    }

    /// Display height (untrimmed).
    pub fn height(&self) -> f64 {
        self.orig().height
    }

    /// Ready to sample: source loaded and a non-empty frame inside the base texture.
    pub fn is_valid(&self) -> bool {
        if !self.base.has_loaded() {
            return false;
        }
        let f = self.frame();
        f.width() > 0.0
            && f.height() > 0.0
            && f.x0 >= 0.0
            && f.y0 >= 0.0
            && f.x1 <= self.base.width() + 1e-9
            && f.y1 <= self.base.height() + 1e-9
    }

    /// `true` when the frame spans the entire base texture.
    pub fn covers_base(&self) -> bool {
        let f = self.frame();
        f.width() == self.base.width() && f.height() == self.base.height()
    }

    /// Monotonic counter that changes whenever the frame layout or the source pixels change.
    pub fn version(&self) -> u64 {
        self.update_id + self.base.version()
    }

    pub fn key(&self) -> TextureKey {
        TextureKey {
            uid: self.uid,
            version: self.version(),
        }
    }

    pub fn corners(&self) -> FrameCorners {
        let f = self.frame();
        let tw = self.base.width();
        let th = self.base.height();
        let (left, top) = (f.x0 / tw, f.y0 / th);
        let (right, bottom) = (f.x1 / tw, f.y1 / th);
        if self.rotated {
            FrameCorners {
                p0: Point::new(right, top),
                p1: Point::new(right, bottom),
                p3: Point::new(left, top),
            }
        } else {
            FrameCorners {
                p0: Point::new(left, top),
                p1: Point::new(right, top),
                p3: Point::new(left, bottom),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/texture/frame.rs"]
mod tests;
