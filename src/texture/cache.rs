use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::foundation::core::{Rect, Size};
use crate::foundation::error::{TilingError, TilingResult};
use crate::texture::base::BaseTexture;
use crate::texture::frame::Texture;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameSize {
    pub w: f64,
    pub h: f64,
}

/// One packed frame of a sprite sheet, in the common JSON-hash sheet layout.
///
/// `frame.w`/`frame.h` are the displayed size; a rotated frame occupies `h x w` in the sheet.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AtlasFrame {
    pub frame: FrameRect,
    #[serde(default)]
    pub rotated: bool,
    #[serde(default)]
    pub trimmed: bool,
    #[serde(default)]
    pub sprite_source_size: Option<FrameRect>,
    #[serde(default)]
    pub source_size: Option<FrameSize>,
}

impl AtlasFrame {
    /// Build the [`Texture`] this frame describes on `base`. Sheet units are real pixels.
    pub fn to_texture(&self, base: Rc<BaseTexture>) -> Texture {
        let res = base.resolution();
        let r = self.frame;

        let (src_w, src_h) = match (self.trimmed, self.source_size) {
            (true, Some(s)) => (s.w, s.h),
            _ => (r.w, r.h),
        };
        let orig = Size::new(src_w.floor() / res, src_h.floor() / res);

        let (fw, fh) = if self.rotated { (r.h, r.w) } else { (r.w, r.h) };
        let frame = Rect::new(
            r.x.floor() / res,
            r.y.floor() / res,
            (r.x.floor() + fw.floor()) / res,
            (r.y.floor() + fh.floor()) / res,
        );

        let mut tex = Texture::from_frame(base, frame)
            .with_orig(orig)
            .with_rotation(self.rotated);
        if let (true, Some(sss)) = (self.trimmed, self.sprite_source_size) {
            tex = tex.with_trim(Rect::new(
                sss.x / res,
                sss.y / res,
                (sss.x + r.w) / res,
                (sss.y + r.h) / res,
            ));
        }
        tex
    }
}

/// Named textures, usually the frames of loaded sprite sheets.
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HashMap<String, Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, texture: Texture) {
        self.textures.insert(id.into(), texture);
    }

    /// Register every frame of a sheet packed into `base`.
    pub fn add_sheet(&mut self, base: &Rc<BaseTexture>, frames: &BTreeMap<String, AtlasFrame>) {
        for (id, frame) in frames {
            self.insert(id.clone(), frame.to_texture(Rc::clone(base)));
        }
        tracing::debug!(base = base.id().0, frames = frames.len(), "registered sheet frames");
    }

    pub fn contains(&self, id: &str) -> bool {
        self.textures.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Look up a frame. An unknown id is a configuration error, not a loading race.
    pub fn get(&self, id: &str) -> TilingResult<Texture> {
        self.textures
            .get(id)
            .cloned()
            .ok_or_else(|| TilingError::unknown_frame(id))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/texture/cache.rs"]
mod tests;
