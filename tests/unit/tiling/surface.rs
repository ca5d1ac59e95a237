use std::io::Cursor;

use super::*;
use crate::foundation::error::TilingError;

fn solid_texture(width: u32, height: u32) -> Texture {
    let px = TexturePixels::from_premul_rgba8(width, height, vec![255; (width * height * 4) as usize])
        .unwrap();
    Texture::new(Rc::new(BaseTexture::new(px)))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 128]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[test]
fn new_surface_has_synchronized_uv_mapping() {
    let s = TiledSurface::new(solid_texture(4, 4), 40.0, 20.0);
    assert!(!s.uv_transform.is_stale());
    assert_eq!(s.size(), Size::new(40.0, 20.0));
    assert_eq!(s.tint, Tint::WHITE);
    assert_eq!(s.world_alpha, 1.0);
}

#[test]
fn default_size_is_one_hundred_square() {
    let s = TiledSurface::with_default_size(solid_texture(2, 2));
    assert_eq!(s.width, 100.0);
    assert_eq!(s.height, 100.0);
}

#[test]
fn surfaces_get_distinct_ids() {
    let a = TiledSurface::with_default_size(solid_texture(2, 2));
    let b = TiledSurface::with_default_size(solid_texture(2, 2));
    assert_ne!(a.id(), b.id());
}

#[test]
fn unknown_frame_id_is_a_hard_error() {
    let cache = TextureCache::new();
    let err = TiledSurface::from_frame(&cache, "missing.png", 10.0, 10.0).unwrap_err();
    assert!(matches!(err, TilingError::UnknownFrame(ref id) if id == "missing.png"));
}

#[test]
fn known_frame_id_builds_a_surface() {
    let mut cache = TextureCache::new();
    cache.insert("tile", solid_texture(8, 8));
    let s = TiledSurface::from_frame(&cache, "tile", 16.0, 16.0).unwrap();
    assert_eq!(s.texture().unwrap().width(), 8.0);
}

#[test]
fn image_bytes_are_decoded_and_premultiplied() {
    let s = TiledSurface::from_image_bytes(&png_bytes(3, 2), 30.0, 30.0).unwrap();
    let base = s.texture().unwrap().base();
    assert_eq!((base.real_width(), base.real_height()), (3, 2));
    let px = base.pixels().unwrap();
    assert_eq!(px.rgba8_premul[3], 128);
    assert!(px.rgba8_premul[0] < 10);
}

#[test]
fn garbage_image_bytes_fail() {
    assert!(TiledSurface::from_image_bytes(b"not an image", 1.0, 1.0).is_err());
}

#[test]
fn set_texture_resyncs_and_clears() {
    let mut s = TiledSurface::with_default_size(solid_texture(2, 2));
    let rev = s.uv_transform.revision();
    s.set_texture(Some(solid_texture(4, 4)));
    assert!(!s.uv_transform.is_stale());
    assert!(s.uv_transform.revision() > rev);

    s.set_texture(None);
    assert!(s.texture().is_none());
}

#[test]
fn tile_accessors_route_to_the_tile_transform() {
    let mut s = TiledSurface::with_default_size(solid_texture(2, 2));
    s.set_tile_scale(Vec2::new(2.0, 0.5));
    s.set_tile_position(Vec2::new(3.0, 4.0));
    assert_eq!(s.tile_scale(), Vec2::new(2.0, 0.5));
    assert_eq!(s.tile_position(), Vec2::new(3.0, 4.0));
    assert!(s.tile_transform.is_dirty());
}

#[test]
fn clamp_margin_accessors_route_to_the_uv_transform() {
    let mut s = TiledSurface::with_default_size(solid_texture(2, 2));
    s.set_clamp_margin(0.0);
    assert_eq!(s.clamp_margin(), 0.0);
    assert_eq!(s.uv_transform.clamp_frame(), [0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn local_bounds_follow_the_anchor() {
    let mut s = TiledSurface::new(solid_texture(2, 2), 40.0, 20.0);
    assert_eq!(s.local_bounds(), Rect::new(0.0, 0.0, 40.0, 20.0));
    s.anchor = Vec2::new(0.5, 1.0);
    assert_eq!(s.local_bounds(), Rect::new(-20.0, -20.0, 20.0, 0.0));
}

#[test]
fn world_bounds_apply_the_world_transform() {
    let mut s = TiledSurface::new(solid_texture(2, 2), 40.0, 20.0);
    s.world_transform = Affine::translate((100.0, 50.0)) * Affine::scale(2.0);
    assert_eq!(s.bounds(), Rect::new(100.0, 50.0, 180.0, 90.0));
}

#[test]
fn contains_point_is_half_open() {
    let mut s = TiledSurface::new(solid_texture(2, 2), 10.0, 10.0);
    s.anchor = Vec2::new(0.5, 0.5);
    s.world_transform = Affine::translate((100.0, 100.0));

    assert!(s.contains_point(Point::new(95.0, 95.0)));
    assert!(s.contains_point(Point::new(104.9, 104.9)));
    assert!(!s.contains_point(Point::new(105.0, 100.0)));
    assert!(!s.contains_point(Point::new(100.0, 105.0)));
    assert!(!s.contains_point(Point::new(94.9, 100.0)));
}

#[test]
fn collapsed_world_transform_contains_nothing() {
    let mut s = TiledSurface::new(solid_texture(2, 2), 10.0, 10.0);
    s.world_transform = Affine::scale(0.0);
    assert!(!s.contains_point(Point::new(0.0, 0.0)));
}
