//! Tile rendering.
//!
//! Each output frame is built column by column: every column strip is
//! rendered on the worker pool into its own buffer, and the strips are
//! pasted into the canvas once all of them are back.

use rayon::prelude::*;

use tessella_core::{
    Color, FrameBuffer, MosaicLayout, PixelSize, TessellaError, TessellaResult, Tile,
};

use crate::sampler::{average_color, average_luma};

/// Where each tile's animation phase comes from.
#[derive(Debug, Clone, Copy)]
pub enum TileOffset<'a> {
    /// Diagonal wave: `(column + (rows - row)) mod frameCount`.
    FixedGradient,
    /// Mean luma of `texture` under the tile, scaled to the frame count.
    Texture {
        texture: &'a FrameBuffer,
        strength: f64,
    },
}

/// Everything needed to render one output frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
    pub input: &'a FrameBuffer,
    pub tile_frames: &'a [FrameBuffer],
    pub offset: TileOffset<'a>,
    /// Global tile phase added to every tile's own offset.
    pub output_offset: f64,
}

impl FrameRequest<'_> {
    pub fn tile_frame_count(&self) -> usize {
        self.tile_frames.len()
    }

    /// Check the request against the layout it will be rendered with.
    pub fn validate(&self, layout: &MosaicLayout) -> TessellaResult<()> {
        let first = self
            .tile_frames
            .first()
            .ok_or_else(|| TessellaError::invalid("tile animation has no frames"))?;
        let tile_size = first.size();
        if let Some((index, frame)) = self
            .tile_frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.size() != tile_size)
        {
            return Err(TessellaError::invalid(format!(
                "tile frame {} is {}, expected {}",
                index,
                frame.size(),
                tile_size
            )));
        }
        if tile_size.width != layout.tile_size.width || tile_size.height > layout.tile_size.height
        {
            return Err(TessellaError::invalid(format!(
                "tile frames are {}, layout cells are {}",
                tile_size, layout.tile_size
            )));
        }
        if self.input.size() != layout.input_size {
            return Err(TessellaError::invalid(format!(
                "input frame is {}, layout was computed for {}",
                self.input.size(),
                layout.input_size
            )));
        }
        if let TileOffset::Texture { texture, strength } = self.offset {
            if texture.size() != layout.input_size {
                return Err(TessellaError::invalid(format!(
                    "offset texture is {}, expected the input size {}",
                    texture.size(),
                    layout.input_size
                )));
            }
            if !strength.is_finite() {
                return Err(TessellaError::invalid("offset strength must be finite"));
            }
        }
        if !self.output_offset.is_finite() {
            return Err(TessellaError::invalid("output offset must be finite"));
        }
        Ok(())
    }
}

/// One rendered column of the canvas.
#[derive(Debug, Clone)]
pub struct ColumnStrip {
    pub column: u32,
    /// Left edge of the strip on the canvas.
    pub x_offset: u32,
    pub buffer: FrameBuffer,
}

/// Animation phase of a tile, before the global output offset is added.
pub fn frame_offset(
    layout: &MosaicLayout,
    tile: &Tile,
    offset: &TileOffset<'_>,
    frame_count: usize,
) -> TessellaResult<f64> {
    match *offset {
        TileOffset::FixedGradient => {
            let diagonal = tile.grid.column as u64 + (layout.tile_rows - tile.grid.row) as u64;
            Ok((diagonal % frame_count as u64) as f64)
        }
        TileOffset::Texture { texture, strength } => {
            let region = layout.to_input_space(&tile.bounds);
            let mean = average_luma(texture, &region)?;
            Ok(mean as f64 / 255.0 * frame_count as f64 * strength)
        }
    }
}

/// Round half-to-even and wrap into `[0, frame_count)`.
pub fn select_frame(phase: f64, frame_count: usize) -> usize {
    let rounded = phase.round_ties_even() as i64;
    rounded.rem_euclid(frame_count as i64) as usize
}

/// Tint one tile frame with `color` into a cell-sized patch.
///
/// Color channels become `color * luma(tile) / 255`; alpha is the tile's.
/// Cell pixels the tile frame does not cover stay transparent.
pub fn tint_tile(tile_frame: &FrameBuffer, cell: PixelSize, color: Color) -> FrameBuffer {
    let mut patch = FrameBuffer::new(cell.width, cell.height);
    let w = tile_frame.width.min(cell.width);
    let h = tile_frame.height.min(cell.height);

    for y in 0..h {
        let src = tile_frame.row(y);
        for x in 0..w {
            let i = x as usize * 4;
            let px = &src[i..i + 4];
            let lum = tessella_core::color::luma(px[0], px[1], px[2]);
            patch.set_pixel(x, y, color.scale_by(lum).with_alpha(px[3]).to_rgba8());
        }
    }
    patch
}

/// Render every tile of one column into a full-height strip.
pub fn render_column(
    layout: &MosaicLayout,
    column: u32,
    request: &FrameRequest<'_>,
) -> TessellaResult<ColumnStrip> {
    let frame_count = request.tile_frame_count();
    let mut strip = FrameBuffer::new(layout.tile_size.width, layout.canvas_size.height);

    for tile in layout.column(column) {
        let phase = frame_offset(layout, tile, &request.offset, frame_count)?;
        let frame = select_frame(phase + request.output_offset, frame_count);

        let region = layout.to_input_space(&tile.bounds);
        let color = average_color(request.input, &region)?;

        let patch = tint_tile(&request.tile_frames[frame], tile.bounds.size(), color);
        strip.paste(&patch, 0, tile.bounds.y0);
    }

    Ok(ColumnStrip {
        column,
        x_offset: column * layout.tile_size.width,
        buffer: strip,
    })
}

fn build_thread_pool(workers: usize) -> TessellaResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("tessella-column-{}", i))
        .build()
        .map_err(|e| TessellaError::Render(format!("failed to build rayon thread pool: {}", e)))
}

/// Renders mosaic frames for a fixed layout on a reusable worker pool.
pub struct TileRenderer {
    layout: MosaicLayout,
    pool: rayon::ThreadPool,
    workers: usize,
}

impl TileRenderer {
    /// `workers` defaults to one per tile column.
    pub fn new(layout: MosaicLayout, workers: Option<usize>) -> TessellaResult<Self> {
        let workers = match workers {
            Some(0) => {
                return Err(TessellaError::invalid("worker count must be >= 1 when set"));
            }
            Some(n) => n,
            None => layout.tile_columns as usize,
        };
        let pool = build_thread_pool(workers)?;
        tracing::debug!(
            "Tile renderer ready: {} columns on {} worker(s)",
            layout.tile_columns,
            workers
        );
        Ok(Self {
            layout,
            pool,
            workers,
        })
    }

    pub fn layout(&self) -> &MosaicLayout {
        &self.layout
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Render one full output frame.
    pub fn render_frame(&self, request: &FrameRequest<'_>) -> TessellaResult<FrameBuffer> {
        request.validate(&self.layout)?;

        let layout = &self.layout;
        let strips = self.pool.install(|| {
            (0..layout.tile_columns)
                .into_par_iter()
                .map(|column| render_column(layout, column, request))
                .collect::<TessellaResult<Vec<_>>>()
        })?;

        let mut canvas = FrameBuffer::new(layout.canvas_size.width, layout.canvas_size.height);
        for strip in &strips {
            canvas.paste(&strip.buffer, strip.x_offset, 0);
        }
        Ok(canvas)
    }
}
