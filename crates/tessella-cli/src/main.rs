mod args;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tessella_core::{FrameBuffer, TessellaConfig};
use tessella_encode::GifEncoder;
use tessella_render::{load_animation, load_image, FrameSequenceAssembler, MosaicJob};

use crate::args::MosaicArgs;

#[derive(Parser)]
#[command(
    name = "tessella",
    version,
    about = "tessella: animated mosaic GIF generator",
    long_about = "Tiles a small looping animation across the frames of a larger one, \
                  tinting every tile with the color of the region it covers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a mosaic animation to a GIF
    Render {
        #[command(flatten)]
        args: MosaicArgs,
    },

    /// Compute loop synchronization and grid layout, print them as JSON
    Plan {
        #[command(flatten)]
        args: MosaicArgs,
    },

    /// Show version and default settings
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render { args } => cmd_render(&args),
        Commands::Plan { args } => cmd_plan(&args),
        Commands::Info => cmd_info(),
    }
}

fn build_job(config: &TessellaConfig) -> Result<MosaicJob> {
    let assets = &config.assets;
    let input = load_animation(Path::new(&assets.input))
        .with_context(|| format!("failed to load input animation {}", assets.input))?;
    let tile = load_animation(Path::new(&assets.tile))
        .with_context(|| format!("failed to load tile animation {}", assets.tile))?;
    let offset_texture: Option<FrameBuffer> = assets
        .offset_texture
        .as_deref()
        .map(|path| {
            load_image(Path::new(path))
                .with_context(|| format!("failed to load offset texture {}", path))
        })
        .transpose()?;

    MosaicJob::from_assets(input, tile, offset_texture, &config.mosaic)
        .context("failed to prepare mosaic job")
}

fn cmd_render(args: &MosaicArgs) -> Result<()> {
    let start = Instant::now();
    let config = args.resolve()?;
    let job = build_job(&config)?;

    let assembler = FrameSequenceAssembler::new(job);
    let sequence = assembler.assemble().context("mosaic rendering failed")?;
    let render_time = start.elapsed();

    let output = Path::new(&config.assets.output);
    GifEncoder::encode(&sequence.frames, sequence.framerate, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let sync = &sequence.sync;
    println!("✓ Mosaic written to {}", output.display());
    println!(
        "   Grid:      {}x{} tiles ({} px cells), canvas {}",
        sequence.layout.tile_columns,
        sequence.layout.tile_rows,
        sequence.layout.tile_size,
        sequence.layout.canvas_size
    );
    println!(
        "   Loops:     input x{}, tile x{} (stretch {:.2}%{})",
        sync.repetitions_a(),
        sync.repetitions_b(),
        sync.stretch().to_f64() * 100.0,
        if sync.converged { "" } else { ", above tolerance" }
    );
    println!(
        "   Frames:    {} @ {:.3} fps",
        sequence.frame_count(),
        sequence.fps()
    );
    println!("   Hash:      {}", sequence.content_hash());
    println!(
        "   Time:      {:.2}s render, {:.2}s total",
        render_time.as_secs_f64(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn cmd_plan(args: &MosaicArgs) -> Result<()> {
    let config = args.resolve()?;
    let job = build_job(&config)?;
    let plan = FrameSequenceAssembler::new(job)
        .plan()
        .context("failed to plan mosaic")?;
    let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
    println!("{}", json);
    Ok(())
}

fn cmd_info() -> Result<()> {
    let defaults = TessellaConfig::default();
    println!("tessella animated mosaic generator");
    println!("   Version:        {}", env!("CARGO_PKG_VERSION"));
    println!("   Encoder:        GIF (looping, transparent)");
    println!("   Input:          {}", defaults.assets.input);
    println!("   Tile:           {}", defaults.assets.tile);
    println!("   Output:         {}", defaults.assets.output);
    println!("   Columns:        {}", defaults.mosaic.tile_columns);
    println!(
        "   Max stretch:    {}",
        defaults.mosaic.max_framerate_stretch
    );
    println!("   Max loops:      {}", defaults.mosaic.max_repetitions);
    println!(
        "   Offset strength: {}",
        defaults.mosaic.tile_animation_offset_strength
    );
    println!(
        "   Config file:    {}",
        tessella_core::config::DEFAULT_CONFIG_FILE
    );
    Ok(())
}
