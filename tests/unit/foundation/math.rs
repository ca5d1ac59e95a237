use super::*;

#[test]
fn premultiply_zeroes_color_of_transparent_pixels() {
    let mut px = vec![200u8, 100, 50, 0, 255, 128, 0, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[0, 0, 0, 0]);
    assert_eq!(
        &px[4..8],
        &[
            mul_div255_u8(255, 128),
            mul_div255_u8(128, 128),
            0,
            128
        ]
    );
}

#[test]
fn tint_color_scales_channels_only_for_premultiplied_textures() {
    let red = Tint(0xFF_00_00);
    assert_eq!(premultiply_tint_to_rgba(red, 0.5, true), [0.5, 0.0, 0.0, 0.5]);
    assert_eq!(premultiply_tint_to_rgba(red, 0.5, false), [1.0, 0.0, 0.0, 0.5]);
}

#[test]
fn unpremultiply_restores_straight_channels() {
    let mut px = vec![64u8, 32, 0, 128, 10, 20, 30, 255, 9, 9, 9, 0];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[128, 64, 0, 128]);
    assert_eq!(&px[4..8], &[10, 20, 30, 255]);
    assert_eq!(&px[8..12], &[9, 9, 9, 0]);
}

#[test]
fn tint_multiplies_color_and_keeps_alpha() {
    let mut px = vec![255u8, 255, 255, 255, 128, 128, 128, 128];
    tint_premul_rgba8_in_place(&mut px, Tint(0xFF_80_00));
    assert_eq!(&px[0..4], &[255, 128, 0, 255]);
    assert_eq!(&px[4..8], &[128, 64, 0, 128]);
}
