use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "tilescale",
    version,
    about = "Upscale an image with tiled parallel processing."
)]
struct Cli {
    /// Path to the input image.
    input: PathBuf,

    /// Path to the output image (format chosen by extension).
    output: PathBuf,

    /// Scale factor.
    #[arg(long, value_parser = clap::value_parser!(u32).range(2..=4))]
    scale: Option<u32>,

    /// Tile edge length for large images. 0 disables tiling.
    #[arg(long)]
    tile_size: Option<u32>,

    /// Resampling filter used by the CPU transform.
    #[arg(long, value_enum, default_value_t = FilterChoice::Lanczos3)]
    filter: FilterChoice,

    /// Worker threads for tile processing (default: all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// JSON pipeline config; explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hide progress bars and only log warnings.
    #[arg(long, short)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterChoice {
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<FilterChoice> for tilescale::TransformKind {
    fn from(choice: FilterChoice) -> Self {
        match choice {
            FilterChoice::Nearest => Self::Nearest,
            FilterChoice::Triangle => Self::Triangle,
            FilterChoice::CatmullRom => Self::CatmullRom,
            FilterChoice::Lanczos3 => Self::Lanczos3,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let config = build_config(&cli)?;
    let transform = tilescale::create_transform(cli.filter.into(), config.scale)?;

    eprintln!(
        "Upscaling {} with scale factor {}...",
        cli.input.display(),
        config.scale
    );
    let stats = tilescale::upscale_image(&cli.input, &cli.output, transform.as_ref(), &config)
        .with_context(|| format!("upscale '{}'", cli.input.display()))?;

    eprintln!(
        "Upscaling completed in {:.2} seconds",
        stats.elapsed.as_secs_f64()
    );
    eprintln!(
        "Processing speed: {:.2} MP/s input, {:.2} MP/s output",
        stats.input_megapixels_per_sec(),
        stats.output_megapixels_per_sec()
    );
    eprintln!(
        "Output image size: {}x{} pixels",
        stats.output_width, stats.output_height
    );
    if stats.tiles_degraded > 0 {
        eprintln!(
            "warning: {} of {} tiles could not be combined and were left blank",
            stats.tiles_degraded, stats.tiles_total
        );
    }
    eprintln!("wrote {}", cli.output.display());
    Ok(())
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_config(path: &Path) -> anyhow::Result<tilescale::PipelineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    let config = tilescale::PipelineConfig::from_json_str(&text)
        .with_context(|| format!("parse config '{}'", path.display()))?;
    Ok(config)
}

fn build_config(cli: &Cli) -> anyhow::Result<tilescale::PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => tilescale::PipelineConfig::default(),
    };
    if let Some(scale) = cli.scale {
        config.scale = tilescale::Scale::new(scale)?;
    }
    if let Some(tile_size) = cli.tile_size {
        config.tile_size = tile_size;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    if cli.quiet {
        config.show_progress = false;
    }
    config.validate()?;
    Ok(config)
}
