use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flipreel", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a project as an animated WebP or GIF.
    Export(ExportArgs),
    /// Render one timeline instant as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory; the file is named `Anim-{W}x{H}-{quality}.{ext}`.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = FormatChoice::Webp)]
    format: FormatChoice,

    /// Override the project's quality (1..=100).
    #[arg(long)]
    quality: Option<u8>,

    /// Override the project's byte budget (0 = unlimited).
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Render instants on a rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Worker count for `--parallel` (defaults to rayon's choice).
    #[arg(long)]
    threads: Option<usize>,

    /// Rasterize every instant even when an identical one was already rendered.
    #[arg(long)]
    no_elision: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Instant index in playback order (0-based).
    #[arg(long)]
    instant: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Webp,
    Gif,
}

impl From<FormatChoice> for flipreel::OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Webp => Self::Webp,
            FormatChoice::Gif => Self::Gif,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_project(path: &Path) -> anyhow::Result<flipreel::LoadedProject> {
    let project = flipreel::Project::from_path(path)
        .with_context(|| format!("read project '{}'", path.display()))?;
    Ok(project.load()?)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut loaded = load_project(&args.in_path)?;
    if let Some(q) = args.quality {
        loaded.settings.quality = q;
    }
    if let Some(max) = args.max_file_size {
        loaded.settings.max_file_size = max;
    }

    let opts = flipreel::ExportOpts {
        format: args.format.into(),
        threading: flipreel::RenderThreading {
            parallel: args.parallel,
            threads: args.threads,
            static_frame_elision: !args.no_elision,
        },
    };
    let artifact = flipreel::export_animation(
        &loaded.frames,
        &loaded.settings,
        loaded.font.as_ref(),
        &opts,
    )?;
    let path = artifact.write_to_dir(&args.out_dir)?;

    if !artifact.budget_met {
        eprintln!(
            "warning: {} bytes exceeds the {} byte budget after {} attempts",
            artifact.bytes.len(),
            loaded.settings.max_file_size,
            artifact.attempts
        );
    }
    eprintln!("wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let loaded = load_project(&args.in_path)?;
    let plan = flipreel::plan_timeline(&loaded.frames, &loaded.settings)?;
    let instant = plan.get(args.instant).with_context(|| {
        format!(
            "instant {} out of range ({} instants)",
            args.instant,
            plan.len()
        )
    })?;

    let compositor =
        flipreel::FrameCompositor::new(&loaded.frames, &loaded.settings, loaded.font.as_ref())?;
    let mut surface = flipreel::RenderSurface::new(compositor.canvas())?;
    let rgba = compositor.render(&mut surface, instant.frame, instant.blend)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let canvas = compositor.canvas();
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        canvas.width,
        canvas.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
