use super::*;

#[test]
fn tint_channels_round_trip_through_packing() {
    let t = Tint::from_rgb8(0x12, 0x34, 0x56);
    assert_eq!(t, Tint(0x12_34_56));
    assert_eq!(t.rgb8(), [0x12, 0x34, 0x56]);
}

#[test]
fn only_full_white_counts_as_untinted() {
    assert!(Tint::WHITE.is_white());
    assert!(Tint::default().is_white());
    assert!(!Tint(0xFF_00_00).is_white());
    assert!(!Tint(0xFF_FF_FE).is_white());
}

#[test]
fn tint_floats_are_normalized() {
    let [r, g, b] = Tint(0xFF_80_00).rgb_f32();
    assert_eq!(r, 1.0);
    assert!((g - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(b, 0.0);
}

#[test]
fn blend_and_wrap_modes_use_snake_case_names() {
    let m: BlendMode = serde_json::from_str("\"multiply\"").unwrap();
    assert_eq!(m, BlendMode::Multiply);
    let w: WrapMode = serde_json::from_str("\"mirrored_repeat\"").unwrap();
    assert_eq!(w, WrapMode::MirroredRepeat);
    assert_eq!(WrapMode::default(), WrapMode::Clamp);
}
