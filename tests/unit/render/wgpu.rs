use super::*;

#[test]
fn globals_match_the_wgsl_block_size() {
    assert_eq!(GLOBALS_SIZE, 240);
    assert_eq!(std::mem::size_of::<Vertex>() as u64, VERTEX_STRIDE);
}

#[test]
fn affine_becomes_padded_columns() {
    let m = affine_to_mat3(Affine::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    assert_eq!(m[0], [1.0, 2.0, 0.0, 0.0]);
    assert_eq!(m[1], [3.0, 4.0, 0.0, 0.0]);
    assert_eq!(m[2], [5.0, 6.0, 1.0, 0.0]);
}

#[test]
fn rows_align_to_copy_alignment() {
    assert_eq!(align_to(4, 256), 256);
    assert_eq!(align_to(256, 256), 256);
    assert_eq!(align_to(260, 256), 512);
}

#[test]
fn straight_sources_are_weighted_by_alpha() {
    let premul = blend_state(DeviceBlend::new(BlendMode::Normal, true));
    assert_eq!(premul, wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING);

    let straight = blend_state(DeviceBlend::new(BlendMode::Normal, false));
    assert_eq!(straight.color.src_factor, wgpu::BlendFactor::SrcAlpha);

    let add = blend_state(DeviceBlend::new(BlendMode::Add, true));
    assert_eq!(add.color.dst_factor, wgpu::BlendFactor::One);
}

#[test]
fn straight_alpha_weighting_applies_to_every_additive_mode() {
    for mode in [BlendMode::Normal, BlendMode::Add] {
        let state = blend_state(DeviceBlend::new(mode, false));
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha, "{mode:?}");
        let state = blend_state(DeviceBlend::new(mode, true));
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::One, "{mode:?}");
    }
}

#[test]
fn wrap_modes_map_to_address_modes() {
    assert_eq!(address_mode(WrapMode::Clamp), wgpu::AddressMode::ClampToEdge);
    assert_eq!(address_mode(WrapMode::Repeat), wgpu::AddressMode::Repeat);
    assert_eq!(
        address_mode(WrapMode::MirroredRepeat),
        wgpu::AddressMode::MirrorRepeat
    );
}

#[test]
fn empty_target_is_rejected_before_touching_the_adapter() {
    let err = WgpuDevice::new(WgpuDeviceOpts::default().with_size(0, 4)).unwrap_err();
    assert!(matches!(err, TilingError::Validation(_)));
}

#[test]
fn fresh_target_reads_back_the_clear_color() {
    let opts = WgpuDeviceOpts::default()
        .with_size(3, 2)
        .with_clear_rgba([255, 0, 0, 255]);
    let mut device = match WgpuDevice::new(opts) {
        Ok(d) => d,
        Err(e) if e.to_string().contains("no gpu adapter available") => return,
        Err(e) => panic!("unexpected gpu error: {e}"),
    };
    let frame = device.readback_rgba8().unwrap();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert_eq!(frame.data.len(), 3 * 2 * 4);
    assert_eq!(frame.pixel(2, 1), Some([255, 0, 0, 255]));
}
