use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::gif::Repeat;
use image::{Delay, Frame, RgbaImage};

use tessella_core::{FrameBuffer, Rational, TessellaError, TessellaResult};

/// Display time of one frame at `fps`, kept exact when it fits.
pub fn frame_delay(fps: Rational) -> TessellaResult<Delay> {
    let ms = Rational::from_integer(1000)
        .checked_div(fps)
        .filter(Rational::is_positive)
        .ok_or_else(|| TessellaError::Encode(format!("framerate {} is not positive", fps)))?;
    match (u32::try_from(ms.numer()), u32::try_from(ms.denom())) {
        (Ok(numer), Ok(denom)) => Ok(Delay::from_numer_denom_ms(numer, denom)),
        _ => Ok(Delay::from_numer_denom_ms(ms.to_f64().round() as u32, 1)),
    }
}

/// Looping animated GIF encoder using the `image` crate.
///
/// Every frame replaces the previous one and pixels with zero alpha are
/// written with the palette's transparent index.
pub struct GifEncoder;

impl GifEncoder {
    /// Encode `frames` to a GIF file at `output_path`, looping forever.
    pub fn encode(frames: &[FrameBuffer], fps: Rational, output_path: &Path) -> TessellaResult<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(output_path)
            .map_err(|e| TessellaError::Encode(format!("failed to create GIF file: {}", e)))?;
        Self::encode_to_writer(frames, fps, BufWriter::new(file))?;

        tracing::info!(
            "Encoded {} frames to GIF at {} ({}x{} @ {:.3}fps)",
            frames.len(),
            output_path.display(),
            frames[0].width,
            frames[0].height,
            fps.to_f64(),
        );
        Ok(())
    }

    /// Encode `frames` into any writer.
    pub fn encode_to_writer<W: Write>(
        frames: &[FrameBuffer],
        fps: Rational,
        writer: W,
    ) -> TessellaResult<()> {
        let first = frames
            .first()
            .ok_or_else(|| TessellaError::Encode("no frames to encode for GIF".into()))?;
        let (width, height) = (first.width, first.height);
        let delay = frame_delay(fps)?;

        let mut encoder = image::codecs::gif::GifEncoder::new_with_speed(writer, 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| TessellaError::Encode(format!("failed to set GIF repeat: {}", e)))?;

        for (i, frame) in frames.iter().enumerate() {
            if frame.width != width || frame.height != height {
                return Err(TessellaError::Encode(format!(
                    "frame {} has dimensions {}x{}, expected {}x{}",
                    i, frame.width, frame.height, width, height
                )));
            }

            let buffer = RgbaImage::from_raw(width, height, frame.data.clone()).ok_or_else(|| {
                TessellaError::Encode(format!("invalid frame data at frame {}", i))
            })?;
            encoder
                .encode_frame(Frame::from_parts(buffer, 0, 0, delay))
                .map_err(|e| {
                    TessellaError::Encode(format!("failed to encode GIF frame {}: {}", i, e))
                })?;
        }

        Ok(())
    }
}
