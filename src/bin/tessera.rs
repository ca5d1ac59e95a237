use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one tiled surface as a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input surface JSON. Texture paths resolve relative to it.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
    Gpu,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn read_config_json(path: &Path) -> anyhow::Result<tessera::SurfaceConfig> {
    let f = File::open(path).with_context(|| format!("open surface config '{}'", path.display()))?;
    let r = BufReader::new(f);
    let config: tessera::SurfaceConfig =
        serde_json::from_reader(r).with_context(|| "parse surface config JSON")?;
    Ok(config)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = read_config_json(&args.in_path)?;
    let backend = match args.backend {
        BackendChoice::Cpu => tessera::Backend::Cpu,
        BackendChoice::Gpu => tessera::Backend::Gpu,
    };

    let base_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let (frame, outcome) = tessera::render_config(&config, base_dir, backend)?;
    if let tessera::DrawOutcome::Skipped(reason) = outcome {
        eprintln!("surface skipped: {reason:?}");
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let (width, height) = (frame.width, frame.height);
    image::save_buffer_with_format(
        &args.out,
        &frame.into_straight(),
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
