use std::path::PathBuf;
use std::rc::Rc;

use tessera::{
    Affine, BaseTexture, CanvasRenderer, CanvasRendererOpts, FrameRgba8, Texture,
    TexturePixels, TiledSurface, Tint, Vec2, VelloCanvas,
};

const CANVAS: u32 = 512;

fn parse_backend() -> anyhow::Result<&'static str> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("cpu") | None => Ok("cpu"),
        Some("gpu") => Ok("gpu"),
        Some(other) => anyhow::bail!("unknown backend '{other}', expected 'cpu' or 'gpu'"),
    }
}

/// 32x32 two-color checker with 8px cells.
fn checker_texture() -> anyhow::Result<Texture> {
    let mut bytes = Vec::with_capacity(32 * 32 * 4);
    for y in 0..32u32 {
        for x in 0..32u32 {
            let light = ((x / 8) + (y / 8)) % 2 == 0;
            bytes.extend_from_slice(if light {
                &[235, 225, 200, 255]
            } else {
                &[60, 70, 95, 255]
            });
        }
    }
    let pixels = TexturePixels::from_straight_rgba8(32, 32, bytes)?;
    Ok(Texture::new(Rc::new(BaseTexture::new(pixels))))
}

fn build_surface() -> anyhow::Result<TiledSurface> {
    let mut surface = TiledSurface::new(checker_texture()?, 360.0, 240.0);
    surface.anchor = Vec2::new(0.5, 0.5);
    surface.tint = Tint::from_rgb8(255, 220, 180);
    surface.world_transform = Affine::translate((256.0, 256.0)) * Affine::rotate(0.2);
    surface.set_tile_scale(Vec2::new(1.5, 1.5));
    surface.set_tile_position(Vec2::new(10.0, 4.0));
    surface.tile_transform.set_rotation(0.3);
    Ok(surface)
}

fn render_cpu(surface: &TiledSurface) -> anyhow::Result<FrameRgba8> {
    let canvas = VelloCanvas::new(CANVAS, CANVAS)?.with_clear_rgba([18, 20, 28, 255]);
    let mut renderer = CanvasRenderer::new(canvas, CanvasRendererOpts::default());
    let outcome = renderer.render(surface)?;
    tracing::info!(?outcome, "software render");
    Ok(renderer.canvas_mut().finish())
}

#[cfg(feature = "gpu")]
fn render_gpu(surface: &mut TiledSurface) -> anyhow::Result<FrameRgba8> {
    let opts = tessera::WgpuDeviceOpts::default()
        .with_size(CANVAS, CANVAS)
        .with_clear_rgba([18, 20, 28, 255]);
    let mut renderer = tessera::TilingRenderer::new(tessera::WgpuDevice::new(opts)?);
    let outcome = renderer.render(surface)?;
    tracing::info!(?outcome, "shader render");
    Ok(renderer.device_mut().readback_rgba8()?)
}

#[cfg(not(feature = "gpu"))]
fn render_gpu(_surface: &mut TiledSurface) -> anyhow::Result<FrameRgba8> {
    anyhow::bail!("rebuild with `--features gpu` to use the gpu backend")
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = try_main() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let backend = parse_backend()?;
    let mut surface = build_surface()?;
    let frame = match backend {
        "gpu" => render_gpu(&mut surface)?,
        _ => render_cpu(&surface)?,
    };

    let out_dir = PathBuf::from("target").join("demos");
    std::fs::create_dir_all(&out_dir)?;
    let out_path = out_dir.join(format!("tiles_{backend}.png"));
    let (width, height) = (frame.width, frame.height);
    image::save_buffer_with_format(
        &out_path,
        &frame.into_straight(),
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;
    eprintln!("wrote {}", out_path.display());
    Ok(())
}
