use serde::Serialize;

use tessella_core::hash::{self, ContentHash};
use tessella_core::{
    synchronize, Animation, FrameBuffer, MosaicLayout, MosaicSettings, PixelSize, Rational,
    SyncOptions, SynchronizationResult, TessellaError, TessellaResult,
};

use crate::loader::LoadedAnimation;
use crate::tile::{FrameRequest, TileOffset, TileRenderer};

/// Decoded frames of one animation with a resolved framerate.
#[derive(Debug, Clone)]
pub struct AnimationSource {
    pub frames: Vec<FrameBuffer>,
    pub framerate: Rational,
}

impl AnimationSource {
    pub fn new(frames: Vec<FrameBuffer>, framerate: Rational) -> TessellaResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| TessellaError::invalid("animation has no frames"))?;
        let size = first.size();
        if let Some(index) = frames.iter().position(|f| f.size() != size) {
            return Err(TessellaError::invalid(format!(
                "frame {} is {}, expected {}",
                index,
                frames[index].size(),
                size
            )));
        }
        if !framerate.is_positive() {
            return Err(TessellaError::invalid(format!(
                "framerate must be positive, got {}",
                framerate
            )));
        }
        Ok(Self { frames, framerate })
    }

    /// Resolve the framerate of a loaded animation, preferring `explicit`.
    pub fn from_loaded(loaded: LoadedAnimation, explicit: Option<f64>) -> TessellaResult<Self> {
        let framerate = loaded.resolve_framerate(explicit)?;
        Self::new(loaded.frames, framerate)
    }

    pub fn frame_size(&self) -> PixelSize {
        self.frames
            .first()
            .map(FrameBuffer::size)
            .unwrap_or_default()
    }

    pub fn animation(&self) -> TessellaResult<Animation> {
        let frame_count = u32::try_from(self.frames.len())
            .map_err(|_| TessellaError::invalid("too many frames"))?;
        Animation::new(frame_count, self.framerate)
    }
}

/// All inputs of one mosaic run.
#[derive(Debug, Clone)]
pub struct MosaicJob {
    /// Animation A: supplies the color of every tile.
    pub input: AnimationSource,
    /// Animation B: the texture drawn in every tile.
    pub tile: AnimationSource,
    /// Optional luma texture for per-tile phase offsets; same size as the input.
    pub offset_texture: Option<FrameBuffer>,
    pub tile_columns: u32,
    pub sync: SyncOptions,
    pub offset_strength: f64,
    pub workers: Option<usize>,
}

impl MosaicJob {
    /// Build a job from decoded assets and validated settings.
    pub fn from_assets(
        input: LoadedAnimation,
        tile: LoadedAnimation,
        offset_texture: Option<FrameBuffer>,
        settings: &MosaicSettings,
    ) -> TessellaResult<Self> {
        settings.validate()?;
        Ok(Self {
            input: AnimationSource::from_loaded(input, settings.input_framerate)?,
            tile: AnimationSource::from_loaded(tile, settings.tile_framerate)?,
            offset_texture,
            tile_columns: settings.tile_columns,
            sync: settings.sync_options()?,
            offset_strength: settings.tile_animation_offset_strength,
            workers: settings.workers,
        })
    }

    fn tile_offset(&self) -> TileOffset<'_> {
        match &self.offset_texture {
            Some(texture) => TileOffset::Texture {
                texture,
                strength: self.offset_strength,
            },
            None => TileOffset::FixedGradient,
        }
    }
}

/// Timing and geometry of a run, computed before any pixel is rendered.
#[derive(Debug, Clone, Serialize)]
pub struct MosaicPlan {
    pub sync: SynchronizationResult,
    pub layout: MosaicLayout,
}

/// The rendered output, in playback order.
#[derive(Debug, Clone)]
pub struct MosaicSequence {
    pub frames: Vec<FrameBuffer>,
    pub framerate: Rational,
    pub sync: SynchronizationResult,
    pub layout: MosaicLayout,
}

impl MosaicSequence {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn fps(&self) -> f64 {
        self.framerate.to_f64()
    }

    /// Hash of every frame's dimensions and pixels. Equal inputs give equal
    /// hashes, whatever the worker count.
    pub fn content_hash(&self) -> ContentHash {
        hash::hash_frames(&self.frames)
    }

    pub fn frame_hash(&self, index: usize) -> Option<ContentHash> {
        self.frames.get(index).map(hash::hash_frame)
    }
}

/// Drives synchronization, layout and per-frame rendering for one job.
pub struct FrameSequenceAssembler {
    job: MosaicJob,
}

impl FrameSequenceAssembler {
    pub fn new(job: MosaicJob) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &MosaicJob {
        &self.job
    }

    /// Synchronize both loops and lay out the grid.
    pub fn plan(&self) -> TessellaResult<MosaicPlan> {
        let job = &self.job;
        let sync = synchronize(
            &job.input.animation()?,
            &job.tile.animation()?,
            &job.sync,
        )?;
        let layout = MosaicLayout::compute(
            job.tile_columns,
            job.input.frame_size(),
            job.tile.frame_size(),
        )?;

        tracing::info!(
            "Mosaic layout: {}x{} tiles of {}, canvas {}",
            layout.tile_columns,
            layout.tile_rows,
            layout.tile_size,
            layout.canvas_size
        );
        tracing::info!(
            "Output timeline: {} frames at {:.3} fps",
            sync.frame_count(),
            sync.output_framerate.to_f64()
        );

        Ok(MosaicPlan { sync, layout })
    }

    /// Render every frame of the synchronized timeline.
    pub fn assemble(&self) -> TessellaResult<MosaicSequence> {
        let job = &self.job;
        let MosaicPlan { sync, layout } = self.plan()?;
        let renderer = TileRenderer::new(layout, job.workers)?;
        let offset = job.tile_offset();

        let total = sync.timeline.len();
        let mut frames = Vec::with_capacity(total);
        for (index, pair) in sync.timeline.iter().enumerate() {
            let input = job.input.frames.get(pair.a as usize).ok_or_else(|| {
                TessellaError::Render(format!("input frame {} out of range", pair.a))
            })?;
            let request = FrameRequest {
                input,
                tile_frames: &job.tile.frames,
                offset,
                output_offset: pair.b as f64,
            };
            frames.push(renderer.render_frame(&request)?);
            tracing::debug!(
                "Rendered frame {}/{} (input {}, tile phase {})",
                index + 1,
                total,
                pair.a,
                pair.b
            );
        }

        tracing::info!("Assembled {} mosaic frames", frames.len());

        Ok(MosaicSequence {
            frames,
            framerate: sync.output_framerate,
            layout: renderer.layout().clone(),
            sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessella_core::Color;

    fn frames(count: u8, width: u32, height: u32) -> Vec<FrameBuffer> {
        (0..count)
            .map(|i| FrameBuffer::solid(width, height, &Color::rgb(40 * i, 255 - 40 * i, 90)))
            .collect()
    }

    fn job() -> MosaicJob {
        MosaicJob {
            input: AnimationSource::new(frames(2, 20, 10), Rational::from_integer(10)).unwrap(),
            tile: AnimationSource::new(frames(3, 4, 4), Rational::from_integer(15)).unwrap(),
            offset_texture: None,
            tile_columns: 5,
            sync: SyncOptions::default(),
            offset_strength: 1.0,
            workers: None,
        }
    }

    #[test]
    fn test_plan() {
        let plan = FrameSequenceAssembler::new(job()).plan().unwrap();
        assert_eq!(plan.sync.repetitions_a(), 1);
        assert_eq!(plan.sync.repetitions_b(), 1);
        assert_eq!(plan.sync.frame_count(), 3);
        assert_eq!(plan.sync.output_framerate, Rational::from_integer(15));
        assert_eq!(plan.layout.canvas_size, PixelSize::new(20, 10));
        assert_eq!(plan.layout.tile_rows, 2);
        assert_eq!(plan.layout.tile_size, PixelSize::new(4, 5));
    }

    #[test]
    fn test_assemble() {
        let sequence = FrameSequenceAssembler::new(job()).assemble().unwrap();
        assert_eq!(sequence.frame_count(), 3);
        assert_eq!(sequence.framerate, Rational::from_integer(15));
        assert!((sequence.fps() - 15.0).abs() < 1e-12);
        assert!(sequence
            .frames
            .iter()
            .all(|f| f.size() == PixelSize::new(20, 10)));
        assert!(sequence.frame_hash(2).is_some());
        assert!(sequence.frame_hash(3).is_none());
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let a = FrameSequenceAssembler::new(job()).assemble().unwrap();
        let mut single = job();
        single.workers = Some(1);
        let b = FrameSequenceAssembler::new(single).assemble().unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_offset_texture_path() {
        let mut with_texture = job();
        with_texture.offset_texture = Some(FrameBuffer::solid(20, 10, &Color::WHITE));
        with_texture.offset_strength = 0.5;
        let sequence = FrameSequenceAssembler::new(with_texture).assemble().unwrap();
        assert_eq!(sequence.frame_count(), 3);

        let mut wrong_size = job();
        wrong_size.offset_texture = Some(FrameBuffer::solid(4, 4, &Color::WHITE));
        assert!(matches!(
            FrameSequenceAssembler::new(wrong_size).assemble(),
            Err(TessellaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_degenerate_layout_fails_plan() {
        let mut tall_tiles = job();
        tall_tiles.tile = AnimationSource::new(frames(3, 4, 40), Rational::from_integer(15)).unwrap();
        assert!(matches!(
            FrameSequenceAssembler::new(tall_tiles).plan(),
            Err(TessellaError::DegenerateLayout(_))
        ));
    }

    #[test]
    fn test_animation_source_validation() {
        assert!(AnimationSource::new(Vec::new(), Rational::ONE).is_err());
        assert!(AnimationSource::new(frames(1, 2, 2), Rational::ZERO).is_err());
        let mut mixed = frames(2, 2, 2);
        mixed.push(FrameBuffer::new(3, 2));
        assert!(AnimationSource::new(mixed, Rational::ONE).is_err());
    }

    #[test]
    fn test_from_assets_resolves_framerates() {
        let input = LoadedAnimation {
            frames: frames(2, 20, 10),
            detected_framerate: Some(Rational::from_integer(10)),
        };
        let tile = LoadedAnimation {
            frames: frames(3, 4, 4),
            detected_framerate: None,
        };
        let settings = MosaicSettings {
            tile_columns: 5,
            tile_framerate: Some(15.0),
            ..MosaicSettings::default()
        };
        let job = MosaicJob::from_assets(input.clone(), tile.clone(), None, &settings).unwrap();
        assert_eq!(job.input.framerate, Rational::from_integer(10));
        assert_eq!(job.tile.framerate, Rational::from_integer(15));
        assert_eq!(job.sync.max_repetitions, 10);

        let missing = MosaicSettings {
            tile_columns: 5,
            ..MosaicSettings::default()
        };
        assert!(MosaicJob::from_assets(input, tile, None, &missing).is_err());
    }
}
