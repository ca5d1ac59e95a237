//! Shader programs for the accelerated path.
//!
//! Both variants share one vertex stage and one uniform block; they differ only in how the
//! fragment stage turns the interpolated tile coordinate into a sample position.

use crate::foundation::core::{Affine, Point, Vec2};
use crate::tiling::resolve::PathKind;

/// Uniform block, vertex stage and bindings shared by both variants.
///
/// `mat3x3<f32>` columns are padded to 16 bytes in uniform storage; the host side mirrors that
/// with `[[f32; 4]; 3]`.
pub const COMMON_WGSL: &str = r#"
struct Globals {
    projection: mat3x3<f32>,
    translation: mat3x3<f32>,
    uv_transform: mat3x3<f32>,
    map_coord: mat3x3<f32>,
    clamp_frame: vec4<f32>,
    clamp_offset: vec4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: Globals;
@group(0) @binding(1) var tex: texture_2d<f32>;
@group(0) @binding(2) var samp: sampler;

struct VsIn {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
};

@vertex
fn vs_main(in: VsIn) -> VsOut {
    var out: VsOut;
    let p = u.projection * u.translation * vec3<f32>(in.position, 1.0);
    out.clip = vec4<f32>(p.xy, 0.0, 1.0);
    out.tex_coord = (u.uv_transform * vec3<f32>(in.uv, 1.0)).xy;
    return out;
}
"#;

/// Hardware wrapping does the repeat.
pub const SIMPLE_FRAGMENT_WGSL: &str = r#"
@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let texel = textureSample(tex, samp, in.tex_coord);
    return texel * u.color;
}
"#;

/// Wrap into the unit square, map into the atlas frame, clamp inside it.
///
/// WGSL `%` truncates toward zero, so the floored modulo is spelled out.
pub const GENERAL_FRAGMENT_WGSL: &str = r#"
fn wrap_unit(v: vec2<f32>) -> vec2<f32> {
    return v - floor(v);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    var coord = wrap_unit(in.tex_coord - u.clamp_offset.xy) + u.clamp_offset.xy;
    coord = (u.map_coord * vec3<f32>(coord, 1.0)).xy;
    coord = clamp(coord, u.clamp_frame.xy, u.clamp_frame.zw);
    let texel = textureSample(tex, samp, coord);
    return texel * u.color;
}
"#;

/// Full WGSL module for one path.
pub fn shader_source(kind: PathKind) -> String {
    let fragment = match kind {
        PathKind::Simple => SIMPLE_FRAGMENT_WGSL,
        PathKind::General => GENERAL_FRAGMENT_WGSL,
    };
    format!("{COMMON_WGSL}{fragment}")
}

/// CPU mirror of the general fragment's coordinate math, for tests and diagnostics.
pub fn general_fragment_coord(
    tex_coord: Point,
    map_coord: Affine,
    clamp_frame: [f64; 4],
    clamp_offset: Vec2,
) -> Point {
    let wrapped = Point::new(
        wrap_unit(tex_coord.x - clamp_offset.x) + clamp_offset.x,
        wrap_unit(tex_coord.y - clamp_offset.y) + clamp_offset.y,
    );
    let mapped = map_coord * wrapped;
    // max/min rather than f64::clamp: a frame narrower than twice the margin inverts the bounds.
    Point::new(
        mapped.x.max(clamp_frame[0]).min(clamp_frame[2]),
        mapped.y.max(clamp_frame[1]).min(clamp_frame[3]),
    )
}

fn wrap_unit(v: f64) -> f64 {
    v - v.floor()
}

#[cfg(test)]
#[path = "../../tests/unit/render/shaders.rs"]
mod tests;
