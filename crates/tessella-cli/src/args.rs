use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use tessella_core::config::DEFAULT_CONFIG_FILE;
use tessella_core::TessellaConfig;

/// Mosaic options shared by `render` and `plan`. Unset flags fall back to
/// the config file, then to the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct MosaicArgs {
    /// Input animation (GIF) supplying the tile colors
    #[arg(short, long)]
    pub input: Option<String>,

    /// Tile animation (GIF) drawn in every cell
    #[arg(short, long)]
    pub tile: Option<String>,

    /// Output GIF path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Luminance texture driving per-tile animation offsets
    #[arg(long)]
    pub offset_texture: Option<String>,

    /// Number of mosaic tiles across the output width
    #[arg(short = 'r', long = "columns")]
    pub tile_columns: Option<u32>,

    /// Framerate of the input animation (detected when not set)
    #[arg(long)]
    pub input_framerate: Option<f64>,

    /// Framerate of the tile animation (detected when not set)
    #[arg(long)]
    pub tile_framerate: Option<f64>,

    /// Maximum relative framerate stretch, e.g. 0.1 for 10%
    #[arg(short = 's', long = "max-stretch")]
    pub max_framerate_stretch: Option<f64>,

    /// Maximum loops of the input animation
    #[arg(long)]
    pub max_repetitions: Option<u32>,

    /// Strength of the offset texture
    #[arg(long = "offset-strength")]
    pub offset_strength: Option<f64>,

    /// Column render workers (default: one per tile column)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Config file (default: ./tessella.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl MosaicArgs {
    /// Load the config file and overlay the flags that were given.
    pub fn resolve(&self) -> Result<TessellaConfig> {
        let mut config = load_config(self.config.as_deref())?;
        self.apply(&mut config);
        config
            .mosaic
            .validate()
            .context("invalid mosaic settings")?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut TessellaConfig) {
        let assets = &mut config.assets;
        if let Some(input) = &self.input {
            assets.input = input.clone();
        }
        if let Some(tile) = &self.tile {
            assets.tile = tile.clone();
        }
        if let Some(output) = &self.output {
            assets.output = output.clone();
        }
        if self.offset_texture.is_some() {
            assets.offset_texture = self.offset_texture.clone();
        }

        let mosaic = &mut config.mosaic;
        if let Some(columns) = self.tile_columns {
            mosaic.tile_columns = columns;
        }
        if self.input_framerate.is_some() {
            mosaic.input_framerate = self.input_framerate;
        }
        if self.tile_framerate.is_some() {
            mosaic.tile_framerate = self.tile_framerate;
        }
        if let Some(stretch) = self.max_framerate_stretch {
            mosaic.max_framerate_stretch = stretch;
        }
        if let Some(reps) = self.max_repetitions {
            mosaic.max_repetitions = reps;
        }
        if let Some(strength) = self.offset_strength {
            mosaic.tile_animation_offset_strength = strength;
        }
        if self.workers.is_some() {
            mosaic.workers = self.workers;
        }
    }
}

/// An explicit path must exist; the default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<TessellaConfig> {
    match path {
        Some(path) => TessellaConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                tracing::info!("Using config {}", default.display());
                TessellaConfig::load_from_file(default)
                    .with_context(|| format!("failed to load config {}", default.display()))
            } else {
                Ok(TessellaConfig::default())
            }
        }
    }
}
