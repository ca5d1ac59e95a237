use std::collections::HashSet;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};

use super::*;
use crate::foundation::core::{BlendMode, Tint, WrapMode};
use crate::render::DrawPath;
use crate::texture::base::{BaseTextureId, TexturePixels};

#[derive(Default)]
struct MockDevice {
    resident: HashSet<BaseTextureId>,
    calls: Vec<&'static str>,
    shader: Option<PathKind>,
    quad: Option<Quad>,
    uniforms: Option<TilingUniforms>,
    blend: Option<DeviceBlend>,
}

impl GpuDevice for MockDevice {
    fn is_texture_resident(&self, base: &BaseTexture) -> bool {
        self.resident.contains(&base.id())
    }

    fn upload_quad(&mut self, quad: &Quad) {
        self.calls.push("upload_quad");
        self.quad = Some(*quad);
    }

    fn bind_shader(&mut self, kind: PathKind) {
        self.calls.push("bind_shader");
        self.shader = Some(kind);
    }

    fn bind_texture(&mut self, texture: &Texture) -> TilingResult<u32> {
        self.calls.push("bind_texture");
        self.resident.insert(texture.base().id());
        Ok(3)
    }

    fn set_uniforms(&mut self, uniforms: &TilingUniforms) {
        self.calls.push("set_uniforms");
        self.uniforms = Some(*uniforms);
    }

    fn set_blend_mode(&mut self, blend: DeviceBlend) {
        self.calls.push("set_blend_mode");
        self.blend = Some(blend);
    }

    fn draw_quad(&mut self) -> TilingResult<()> {
        self.calls.push("draw_quad");
        Ok(())
    }
}

fn base(width: u32, height: u32) -> Rc<BaseTexture> {
    let px = TexturePixels::from_premul_rgba8(width, height, vec![255; (width * height * 4) as usize])
        .unwrap();
    Rc::new(BaseTexture::new(px))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn quad_follows_size_and_anchor() {
    let q = Quad::build(100.0, 50.0, Vec2::new(0.5, 1.0), false);
    assert_eq!(
        q.positions,
        [-50.0, -50.0, 50.0, -50.0, 50.0, 0.0, -50.0, 0.0]
    );
    assert_eq!(q.uvs, [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
}

#[test]
fn quad_uvs_shift_with_anchor_when_respected() {
    let q = Quad::build(100.0, 50.0, Vec2::new(0.25, 0.5), true);
    assert_eq!(q.uvs, [-0.25, -0.5, 0.75, -0.5, 0.75, 0.5, -0.25, 0.5]);
}

#[test]
fn draw_calls_happen_in_order() {
    let mut surface = TiledSurface::new(Texture::new(base(64, 64)), 256.0, 128.0);
    let mut renderer = TilingRenderer::new(MockDevice::default());

    let out = renderer.render(&mut surface).unwrap();
    assert_eq!(out, DrawOutcome::Drawn(DrawPath::Simple));
    assert_eq!(
        renderer.device().calls,
        vec![
            "upload_quad",
            "bind_shader",
            "bind_texture",
            "set_uniforms",
            "set_blend_mode",
            "draw_quad"
        ]
    );
    assert_eq!(renderer.device().uniforms.unwrap().sampler, 3);
}

#[test]
fn full_power_of_two_texture_takes_simple_path_with_inverse_scale() {
    let tex = Texture::new(base(64, 64));
    let shared = Rc::clone(tex.base());
    let mut surface = TiledSurface::new(tex, 256.0, 128.0);
    let mut renderer = TilingRenderer::new(MockDevice::default());

    renderer.render(&mut surface).unwrap();
    let dev = renderer.device();
    assert_eq!(dev.shader, Some(PathKind::Simple));
    let u = dev.uniforms.unwrap();
    assert_eq!(u.shading, ShadingPath::Simple);
    let c = u.transform.as_coeffs();
    assert!(close(c[0], 256.0 / 64.0));
    assert!(close(c[3], 128.0 / 64.0));

    // First use upgraded the shared base texture.
    assert_eq!(shared.wrap_mode(), WrapMode::Repeat);
}

#[test]
fn trimmed_atlas_frame_takes_general_path() {
    let tex = Texture::from_frame(base(128, 128), Rect::new(2.0, 2.0, 32.0, 42.0))
        .with_orig(Size::new(32.0, 42.0))
        .with_trim(Rect::new(1.0, 1.0, 31.0, 41.0));
    let shared = Rc::clone(tex.base());
    let mut surface = TiledSurface::new(tex, 100.0, 100.0);
    let mut renderer = TilingRenderer::new(MockDevice::default());

    let out = renderer.render(&mut surface).unwrap();
    assert_eq!(out, DrawOutcome::Drawn(DrawPath::General));
    match renderer.device().uniforms.unwrap().shading {
        ShadingPath::General { clamp_frame, .. } => {
            assert!(clamp_frame[0] > 0.0 && clamp_frame[1] > 0.0);
            assert!(clamp_frame[2] < 1.0 && clamp_frame[3] < 1.0);
        }
        ShadingPath::Simple => panic!("expected general path"),
    }
    assert_eq!(shared.wrap_mode(), WrapMode::Clamp);
}

#[test]
fn resident_clamp_texture_falls_back_to_general_path() {
    let tex = Texture::new(base(32, 32));
    let mut device = MockDevice::default();
    device.resident.insert(tex.base().id());
    let mut surface = TiledSurface::new(tex, 64.0, 64.0);
    let mut renderer = TilingRenderer::new(device);

    let out = renderer.render(&mut surface).unwrap();
    assert_eq!(out, DrawOutcome::Drawn(DrawPath::General));
    assert_eq!(
        surface.texture().unwrap().base().wrap_mode(),
        WrapMode::Clamp
    );
}

#[test]
fn path_table_over_power_of_two_and_full_frame() {
    let cases = [
        (base(64, 64), None, PathKind::Simple),
        (base(64, 64), Some(Rect::new(0.0, 0.0, 32.0, 32.0)), PathKind::General),
        (base(48, 64), None, PathKind::General),
        (base(48, 64), Some(Rect::new(0.0, 0.0, 24.0, 32.0)), PathKind::General),
    ];
    for (b, frame, expected) in cases {
        let tex = match frame {
            Some(f) => Texture::from_frame(b, f),
            None => Texture::new(b),
        };
        assert_eq!(choose_path(&MockDevice::default(), &tex), expected);
    }
}

#[test]
fn wrap_upgrade_is_visible_to_other_surfaces_sharing_the_base() {
    let shared = base(16, 16);
    let mut first = TiledSurface::new(Texture::new(Rc::clone(&shared)), 32.0, 32.0);
    let mut second = TiledSurface::new(Texture::new(Rc::clone(&shared)), 32.0, 32.0);
    let mut renderer = TilingRenderer::new(MockDevice::default());

    renderer.render(&mut first).unwrap();
    // Now resident and already repeating: the second surface stays on the simple path.
    assert_eq!(
        renderer.render(&mut second).unwrap(),
        DrawOutcome::Drawn(DrawPath::Simple)
    );
}

#[test]
fn color_is_premultiplied_tint_times_world_alpha() {
    let mut surface = TiledSurface::new(Texture::new(base(4, 4)), 8.0, 8.0);
    surface.tint = Tint(0xFF0000);
    surface.world_alpha = 0.5;
    surface.blend_mode = BlendMode::Add;
    let mut renderer = TilingRenderer::new(MockDevice::default());
    renderer.render(&mut surface).unwrap();

    let dev = renderer.device();
    assert_eq!(dev.uniforms.unwrap().color, [0.5, 0.0, 0.0, 0.5]);
    assert_eq!(
        dev.blend,
Some(DeviceBlend::new(BlendMode::Add, true))
    );
}

#[test]
fn straight_alpha_texture_keeps_color_unscaled() {
    let px = TexturePixels::from_premul_rgba8(4, 4, vec![255; 64]).unwrap();
    let b = Rc::new(BaseTexture::new(px).with_premultiplied_alpha(false));
    let mut surface = TiledSurface::new(Texture::new(b), 8.0, 8.0);
    surface.world_alpha = 0.25;
    let mut renderer = TilingRenderer::new(MockDevice::default());
    renderer.render(&mut surface).unwrap();

    let dev = renderer.device();
    assert_eq!(dev.uniforms.unwrap().color, [1.0, 1.0, 1.0, 0.25]);
    assert!(!dev.blend.unwrap().premultiplied);
}

#[test]
fn world_transform_is_forwarded() {
    let mut surface = TiledSurface::new(Texture::new(base(4, 4)), 8.0, 8.0);
    surface.world_transform = Affine::translate((5.0, 6.0));
    let mut renderer = TilingRenderer::new(MockDevice::default());
    renderer.render(&mut surface).unwrap();
    assert_eq!(
        renderer.device().uniforms.unwrap().translation,
        Affine::translate((5.0, 6.0))
    );
}

#[test]
fn tile_position_shifts_the_transform() {
    let mut surface = TiledSurface::new(Texture::new(base(64, 64)), 256.0, 128.0);
    surface.set_tile_position(Vec2::new(16.0, 0.0));
    let mut renderer = TilingRenderer::new(MockDevice::default());
    renderer.render(&mut surface).unwrap();

    let t = renderer.device().uniforms.unwrap().transform;
    let p = t * Point::new(16.0 / 256.0, 0.0);
    assert!(close(p.x, 0.0));
}

#[test]
fn missing_or_pending_textures_skip_silently() {
    let mut renderer = TilingRenderer::new(MockDevice::default());

    let mut pending = TiledSurface::new(Texture::new(Rc::new(BaseTexture::pending(1.0))), 8.0, 8.0);
    assert_eq!(
        renderer.render(&mut pending).unwrap(),
        DrawOutcome::Skipped(SkipReason::NotLoaded)
    );

    let mut empty = TiledSurface::new(Texture::new(base(4, 4)), 8.0, 8.0);
    empty.set_texture(None);
    assert_eq!(
        renderer.render(&mut empty).unwrap(),
        DrawOutcome::Skipped(SkipReason::NoTexture)
    );

    let mut outside = TiledSurface::new(
        Texture::from_frame(base(4, 4), Rect::new(2.0, 2.0, 8.0, 8.0)),
        8.0,
        8.0,
    );
    assert_eq!(
        renderer.render(&mut outside).unwrap(),
        DrawOutcome::Skipped(SkipReason::InvalidFrame)
    );

    assert!(renderer.device().calls.is_empty());
}

#[test]
fn pending_texture_draws_once_loaded() {
    let pending = Rc::new(BaseTexture::pending(1.0));
    let mut surface = TiledSurface::new(Texture::new(Rc::clone(&pending)), 8.0, 8.0);
    let mut renderer = TilingRenderer::new(MockDevice::default());
    assert!(!renderer.render(&mut surface).unwrap().is_drawn());

    pending.load(TexturePixels::from_premul_rgba8(2, 2, vec![255; 16]).unwrap());
    assert!(renderer.render(&mut surface).unwrap().is_drawn());
    assert!(!surface.uv_transform.is_stale());
}

#[test]
fn zero_sized_surface_is_degenerate() {
    let mut surface = TiledSurface::new(Texture::new(base(4, 4)), 0.0, 8.0);
    let mut renderer = TilingRenderer::new(MockDevice::default());
    assert_eq!(
        renderer.render(&mut surface).unwrap(),
        DrawOutcome::Skipped(SkipReason::Degenerate)
    );
    assert!(renderer.device().calls.is_empty());
}
