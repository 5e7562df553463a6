//! Asset loading.
//! Decodes GIF animations (every frame, composited to full canvas) and
//! still images (PNG, JPEG, ...) into FrameBuffers.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, RgbaImage};

use tessella_core::{FrameBuffer, PixelSize, Rational, TessellaError, TessellaResult};

/// Decoded frames of one source animation.
#[derive(Debug, Clone)]
pub struct LoadedAnimation {
    pub frames: Vec<FrameBuffer>,
    /// Framerate detected from the container's frame delays, if any.
    pub detected_framerate: Option<Rational>,
}

impl LoadedAnimation {
    /// Wrap a single still image.
    pub fn still(frame: FrameBuffer) -> Self {
        Self {
            frames: vec![frame],
            detected_framerate: None,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Size of the first frame.
    pub fn frame_size(&self) -> Option<PixelSize> {
        self.frames.first().map(FrameBuffer::size)
    }

    /// An explicit framerate wins over the detected one.
    pub fn resolve_framerate(&self, explicit: Option<f64>) -> TessellaResult<Rational> {
        match explicit {
            Some(fps) => Rational::from_f64(fps)
                .filter(Rational::is_positive)
                .ok_or_else(|| TessellaError::invalid(format!("framerate {} is not positive", fps))),
            None => self.detected_framerate.ok_or_else(|| {
                TessellaError::invalid(
                    "framerate could not be detected from frame delays; set it explicitly",
                )
            }),
        }
    }
}

/// Framerate implied by the shortest positive frame delay.
///
/// Delays are `(numerator, denominator)` milliseconds; zero delays are ignored.
pub fn detect_framerate(delays_ms: &[(u32, u32)]) -> Option<Rational> {
    delays_ms
        .iter()
        .filter(|(numer, denom)| *numer > 0 && *denom > 0)
        .map(|&(numer, denom)| Rational::new(numer as i128, denom as i128))
        .min()
        .map(|min_delay| Rational::from_integer(1000) / min_delay)
}

fn frame_from_rgba(rgba: RgbaImage) -> TessellaResult<FrameBuffer> {
    let (width, height) = rgba.dimensions();
    FrameBuffer::from_raw(width, height, rgba.into_raw())
}

/// Load an image file and convert its first frame to a FrameBuffer.
pub fn load_image(path: &Path) -> TessellaResult<FrameBuffer> {
    let img = image::open(path).map_err(|e| {
        TessellaError::asset(
            format!("failed to load image '{}': {}", path.display(), e),
            path,
        )
    })?;
    frame_from_rgba(img.to_rgba8())
}

/// Load an animation file. Non-GIF images load as a single still frame.
pub fn load_animation(path: &Path) -> TessellaResult<LoadedAnimation> {
    let bytes = std::fs::read(path).map_err(|e| {
        TessellaError::asset(
            format!("failed to read '{}': {}", path.display(), e),
            path,
        )
    })?;
    let animation = decode_animation(&bytes).map_err(|e| match e {
        TessellaError::Asset { message, .. } => TessellaError::asset(message, path),
        other => other,
    })?;

    tracing::info!(
        "Loaded {} frame(s) from {} ({}, detected framerate: {})",
        animation.frame_count(),
        path.display(),
        animation
            .frame_size()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        animation
            .detected_framerate
            .map(|fps| format!("{:.3} fps", fps.to_f64()))
            .unwrap_or_else(|| "none".to_string()),
    );

    Ok(animation)
}

/// Decode an animation from raw bytes (e.g., an embedded asset).
pub fn decode_animation(data: &[u8]) -> TessellaResult<LoadedAnimation> {
    let format = image::guess_format(data)
        .map_err(|e| TessellaError::asset(format!("unrecognized image data: {}", e), "<memory>"))?;

    if format != ImageFormat::Gif {
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| TessellaError::asset(format!("failed to decode image: {}", e), "<memory>"))?;
        return Ok(LoadedAnimation::still(frame_from_rgba(img.to_rgba8())?));
    }

    let decoder = GifDecoder::new(Cursor::new(data))
        .map_err(|e| TessellaError::asset(format!("failed to open GIF: {}", e), "<memory>"))?;
    let gif_frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| TessellaError::asset(format!("failed to decode GIF frames: {}", e), "<memory>"))?;

    if gif_frames.is_empty() {
        return Err(TessellaError::asset("GIF contains no frames", "<memory>"));
    }

    let delays: Vec<(u32, u32)> = gif_frames
        .iter()
        .map(|f| f.delay().numer_denom_ms())
        .collect();
    let frames = gif_frames
        .into_iter()
        .map(|f| frame_from_rgba(f.into_buffer()))
        .collect::<TessellaResult<Vec<_>>>()?;

    Ok(LoadedAnimation {
        frames,
        detected_framerate: detect_framerate(&delays),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, Frame, Rgba};

    fn gif_bytes(delays_ms: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.set_repeat(Repeat::Infinite).unwrap();
            for (i, delay) in delays_ms.iter().enumerate() {
                let shade = (i as u8).wrapping_mul(60);
                let buffer = RgbaImage::from_pixel(4, 3, Rgba([shade, 0, 255 - shade, 255]));
                let frame = Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(*delay, 1));
                encoder.encode_frame(frame).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(Path::new("/nonexistent/image.png"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_animation_missing_file_is_asset_error() {
        let err = load_animation(Path::new("/nonexistent/anim.gif")).unwrap_err();
        assert!(matches!(err, TessellaError::Asset { .. }));
    }

    #[test]
    fn test_detect_framerate_uses_shortest_delay() {
        assert_eq!(
            detect_framerate(&[(100, 1), (50, 1), (70, 1)]),
            Some(Rational::from_integer(20))
        );
        assert_eq!(
            detect_framerate(&[(70, 1)]),
            Some(Rational::new(100, 7))
        );
    }

    #[test]
    fn test_detect_framerate_ignores_zero_delays() {
        assert_eq!(
            detect_framerate(&[(0, 1), (40, 1)]),
            Some(Rational::from_integer(25))
        );
        assert_eq!(detect_framerate(&[(0, 1), (0, 1)]), None);
        assert_eq!(detect_framerate(&[]), None);
    }

    #[test]
    fn test_decode_gif_frames_and_framerate() {
        let anim = decode_animation(&gif_bytes(&[100, 50, 100])).unwrap();
        assert_eq!(anim.frame_count(), 3);
        assert_eq!(anim.frame_size(), Some(PixelSize::new(4, 3)));
        assert_eq!(anim.detected_framerate, Some(Rational::from_integer(20)));
        assert_eq!(anim.frames[0].get_pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_decode_still_png() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let anim = decode_animation(&png).unwrap();
        assert_eq!(anim.frame_count(), 1);
        assert_eq!(anim.detected_framerate, None);
        assert_eq!(anim.frames[0].get_pixel(1, 1), Some([1, 2, 3, 255]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_animation(b"definitely not an image").is_err());
    }

    #[test]
    fn test_resolve_framerate() {
        let anim = LoadedAnimation {
            frames: vec![FrameBuffer::new(1, 1)],
            detected_framerate: Some(Rational::from_integer(20)),
        };
        assert_eq!(anim.resolve_framerate(None).unwrap(), Rational::from_integer(20));
        assert_eq!(anim.resolve_framerate(Some(12.5)).unwrap(), Rational::new(25, 2));
        assert!(anim.resolve_framerate(Some(-1.0)).is_err());

        let still = LoadedAnimation::still(FrameBuffer::new(1, 1));
        assert!(matches!(
            still.resolve_framerate(None),
            Err(TessellaError::InvalidInput(_))
        ));
    }
}
