use crate::foundation::core::Tint;

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[0..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Multiply the color channels of premultiplied pixels by a tint, keeping alpha.
pub(crate) fn tint_premul_rgba8_in_place(rgba: &mut [u8], tint: Tint) {
    let [tr, tg, tb] = tint.rgb8();
    for px in rgba.chunks_exact_mut(4) {
        px[0] = mul_div255_u8(u16::from(px[0]), u16::from(tr));
        px[1] = mul_div255_u8(u16::from(px[1]), u16::from(tg));
        px[2] = mul_div255_u8(u16::from(px[2]), u16::from(tb));
    }
}

/// Shader color for a tint at the given alpha.
///
/// When the sampled texture is premultiplied the color channels are scaled by alpha too, so the
/// `sample * color` product stays premultiplied.
pub fn premultiply_tint_to_rgba(tint: Tint, alpha: f32, premultiply: bool) -> [f32; 4] {
    let [r, g, b] = tint.rgb_f32();
    if premultiply {
        [r * alpha, g * alpha, b * alpha, alpha]
    } else {
        [r, g, b, alpha]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
