use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{TessellaError, TessellaResult};
use crate::sync::SyncOptions;

pub const DEFAULT_CONFIG_FILE: &str = "tessella.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    pub input: String,
    pub tile: String,
    pub output: String,
    /// Optional luminance texture driving per-tile animation offsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_texture: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            input: "img/inputTexture.gif".to_string(),
            tile: "img/mosaicTexture.gif".to_string(),
            output: "output.gif".to_string(),
            offset_texture: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MosaicSettings {
    /// Number of tiles across the output width.
    pub tile_columns: u32,
    /// Overrides the framerate detected from the input animation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_framerate: Option<f64>,
    /// Overrides the framerate detected from the tile animation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_framerate: Option<f64>,
    /// Accepted relative duration mismatch between the two loops.
    pub max_framerate_stretch: f64,
    pub max_repetitions: u32,
    pub tile_animation_offset_strength: f64,
    /// Column workers; defaults to one per tile column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for MosaicSettings {
    fn default() -> Self {
        Self {
            tile_columns: 25,
            input_framerate: None,
            tile_framerate: None,
            max_framerate_stretch: 0.1,
            max_repetitions: 10,
            tile_animation_offset_strength: 1.0,
            workers: None,
        }
    }
}

impl MosaicSettings {
    /// Check ranges before any asset is touched.
    pub fn validate(&self) -> TessellaResult<()> {
        if self.tile_columns == 0 {
            return Err(TessellaError::Config("tile_columns must be >= 1".into()));
        }
        for (name, fps) in [
            ("input_framerate", self.input_framerate),
            ("tile_framerate", self.tile_framerate),
        ] {
            if let Some(fps) = fps {
                if !(fps.is_finite() && fps > 0.0) {
                    return Err(TessellaError::Config(format!(
                        "{} must be positive, got {}",
                        name, fps
                    )));
                }
            }
        }
        if !(self.max_framerate_stretch > 0.0 && self.max_framerate_stretch < 1.0) {
            return Err(TessellaError::Config(format!(
                "max_framerate_stretch must lie in (0, 1), got {}",
                self.max_framerate_stretch
            )));
        }
        if self.max_repetitions == 0 {
            return Err(TessellaError::Config("max_repetitions must be >= 1".into()));
        }
        if !self.tile_animation_offset_strength.is_finite() {
            return Err(TessellaError::Config(
                "tile_animation_offset_strength must be finite".into(),
            ));
        }
        if self.workers == Some(0) {
            return Err(TessellaError::Config("workers must be >= 1 when set".into()));
        }
        Ok(())
    }

    pub fn sync_options(&self) -> TessellaResult<SyncOptions> {
        SyncOptions::new(self.max_framerate_stretch, self.max_repetitions)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TessellaConfig {
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub mosaic: MosaicSettings,
}

impl TessellaConfig {
    pub fn load_from_file(path: &Path) -> TessellaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| TessellaError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(contents: &str) -> TessellaResult<Self> {
        toml::from_str(contents).map_err(|e| TessellaError::Config(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> TessellaResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| TessellaError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TessellaConfig::default();
        assert_eq!(config.mosaic.tile_columns, 25);
        assert_eq!(config.mosaic.max_repetitions, 10);
        assert!((config.mosaic.max_framerate_stretch - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.assets.output, "output.gif");
        assert!(config.mosaic.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TessellaConfig::from_toml_str(
            r#"
            [assets]
            input = "in.gif"

            [mosaic]
            tile_columns = 8
            tile_framerate = 12.5
            "#,
        )
        .unwrap();
        assert_eq!(config.assets.input, "in.gif");
        assert_eq!(config.assets.tile, "img/mosaicTexture.gif");
        assert_eq!(config.mosaic.tile_columns, 8);
        assert_eq!(config.mosaic.tile_framerate, Some(12.5));
        assert_eq!(config.mosaic.max_repetitions, 10);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TessellaConfig::from_toml_str("[mosaic]\ntile_columns = \"many\"").unwrap_err();
        assert!(matches!(err, TessellaError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut settings = MosaicSettings {
            max_framerate_stretch: 1.5,
            ..MosaicSettings::default()
        };
        assert!(settings.validate().is_err());
        settings.max_framerate_stretch = 0.1;
        settings.tile_framerate = Some(0.0);
        assert!(settings.validate().is_err());
        settings.tile_framerate = None;
        settings.workers = Some(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join("tessella_config_roundtrip.toml");
        let mut config = TessellaConfig::default();
        config.mosaic.tile_columns = 12;
        config.assets.offset_texture = Some("offset.png".into());
        config.save_to_file(&path).unwrap();
        let loaded = TessellaConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.mosaic.tile_columns, 12);
        assert_eq!(loaded.assets.offset_texture.as_deref(), Some("offset.png"));
        let _ = std::fs::remove_file(&path);
    }
}
