//! Coordinate resolution for the shader path.
//!
//! Tile transforms are authored in texture pixels while the quad carries unit UVs scaled to the
//! surface size. [`tile_to_uv_matrix`] bridges both spaces in one step; its inverse maps a
//! destination UV back into repeating tile space, which is what the vertex stage consumes.

use crate::foundation::core::{Affine, Size, Vec2, WrapMode};
use crate::texture::frame::Texture;
use crate::tiling::uv_transform::UvTransform;

/// Which fragment variant draws a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Hardware wrapping on an untrimmed power-of-two texture.
    Simple,
    /// Per-fragment modulo and clamp inside an atlas frame.
    General,
}

/// Path choice plus the data its fragment variant needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShadingPath {
    Simple,
    General {
        map_coord: Affine,
        clamp_frame: [f64; 4],
        clamp_offset: Vec2,
    },
}

impl ShadingPath {
    pub fn kind(&self) -> PathKind {
        match self {
            ShadingPath::Simple => PathKind::Simple,
            ShadingPath::General { .. } => PathKind::General,
        }
    }
}

/// Final per-draw coordinate data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedCoords {
    /// Vertex UV to sample coordinate (simple) or to repeating tile space (general).
    pub transform: Affine,
    pub path: ShadingPath,
}

/// Tile transform expressed in surface UV units, before inversion.
pub fn tile_to_uv_matrix(local: Affine, texture: Size, surface: Size) -> Affine {
    let [a, b, c, d, tx, ty] = local.as_coeffs();
    let (w, h) = (texture.width, texture.height);
    let (sw, sh) = (surface.width, surface.height);
    Affine::new([
        a * w / sw,
        b * w / sh,
        c * h / sw,
        d * h / sh,
        tx / sw,
        ty / sh,
    ])
}

/// `true` when hardware wrapping could tile the texture: power-of-two base, frame covering it.
pub fn is_simple_candidate(texture: &Texture) -> bool {
    texture.base().is_power_of_two() && texture.covers_base()
}

/// Pure path predicate.
///
/// A candidate that has no device resource yet takes the simple path (its wrap mode will be
/// upgraded before upload). A resident candidate keeps the simple path only if its wrap mode
/// already allows repetition.
pub fn select_path(candidate: bool, resident: bool, wrap_mode: WrapMode) -> PathKind {
    if !candidate {
        return PathKind::General;
    }
    if !resident || wrap_mode != WrapMode::Clamp {
        PathKind::Simple
    } else {
        PathKind::General
    }
}

/// Resolve the per-draw transform for `kind`. `uv` must be up to date for the texture.
///
/// Returns `None` when the surface or tile transform is degenerate and nothing can be sampled.
pub fn resolve(
    local: Affine,
    texture: &Texture,
    uv: &UvTransform,
    surface: Size,
    kind: PathKind,
) -> Option<ResolvedCoords> {
    let inverse = tile_to_uv_matrix(local, Size::new(texture.width(), texture.height()), surface)
        .inverse();
    if !inverse.is_finite() {
        return None;
    }
    Some(match kind {
        PathKind::Simple => ResolvedCoords {
            transform: uv.map_coord() * inverse,
            path: ShadingPath::Simple,
        },
        PathKind::General => ResolvedCoords {
            transform: inverse,
            path: ShadingPath::General {
                map_coord: uv.map_coord(),
                clamp_frame: uv.clamp_frame(),
                clamp_offset: uv.clamp_offset_uv(),
            },
        },
    })
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/resolve.rs"]
mod tests;
