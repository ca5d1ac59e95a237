use crate::foundation::core::{Affine, Vec2};

/// Scale, position, rotation and skew of the tile pattern, in texture-pixel units.
///
/// Independent of the surface's own world transform. The local matrix is cached and only
/// recomputed after a setter marked it dirty.
#[derive(Clone, Debug)]
pub struct TileTransform {
    scale: Vec2,
    position: Vec2,
    pivot: Vec2,
    rotation: f64,
    skew: Vec2,
    local: Affine,
    dirty: bool,
}

impl Default for TileTransform {
    fn default() -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            position: Vec2::ZERO,
            pivot: Vec2::ZERO,
            rotation: 0.0,
            skew: Vec2::ZERO,
            local: Affine::IDENTITY,
            dirty: false,
        }
    }
}

impl TileTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.dirty = true;
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn set_pivot(&mut self, pivot: Vec2) {
        self.pivot = pivot;
        self.dirty = true;
    }

    /// Rotation in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Skew in radians, `x` shears along y and `y` along x.
    pub fn skew(&self) -> Vec2 {
        self.skew
    }

    pub fn set_skew(&mut self, skew: Vec2) {
        self.skew = skew;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute the cached matrix if a field changed since the last call.
    pub fn update_local_transform(&mut self) {
        if !self.dirty {
            return;
        }
        let cx = (self.rotation + self.skew.y).cos();
        let sx = (self.rotation + self.skew.y).sin();
        let cy = -(self.rotation - self.skew.x).sin();
        let sy = (self.rotation - self.skew.x).cos();

        let a = cx * self.scale.x;
        let b = sx * self.scale.x;
        let c = cy * self.scale.y;
        let d = sy * self.scale.y;
        let tx = self.position.x - (self.pivot.x * a + self.pivot.y * c);
        let ty = self.position.y - (self.pivot.x * b + self.pivot.y * d);

        self.local = Affine::new([a, b, c, d, tx, ty]);
        self.dirty = false;
    }

    /// The tile matrix, recomputed on read when stale.
    pub fn local_transform(&mut self) -> Affine {
        self.update_local_transform();
        self.local
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiling/tile_transform.rs"]
mod tests;
