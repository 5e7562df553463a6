//! Region statistics over frame buffers.

use tessella_core::color::luma;
use tessella_core::{Color, FrameBuffer, PixelRect, TessellaError, TessellaResult};

/// `sum / count` rounded half-to-even, in integer arithmetic.
fn mean_half_even(sum: u64, count: u64) -> u8 {
    let q = sum / count;
    let r = sum % count;
    let rounded = match (2 * r).cmp(&count) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    };
    rounded.min(255) as u8
}

fn checked_region(frame: &FrameBuffer, region: &PixelRect) -> TessellaResult<PixelRect> {
    let clipped = region.clamp_to(frame.size());
    if clipped.is_empty() {
        return Err(TessellaError::Render(format!(
            "sample region {} lies outside the {} frame",
            region,
            frame.size()
        )));
    }
    Ok(clipped)
}

/// Per-channel mean of the pixels inside `region`, alpha included.
pub fn average_color(frame: &FrameBuffer, region: &PixelRect) -> TessellaResult<Color> {
    let region = checked_region(frame, region)?;
    let mut sums = [0u64; 4];

    for y in region.y0..region.y1 {
        let row = frame.row(y);
        let span = &row[region.x0 as usize * 4..region.x1 as usize * 4];
        for px in span.chunks_exact(4) {
            for (sum, &c) in sums.iter_mut().zip(px) {
                *sum += c as u64;
            }
        }
    }

    let count = region.size().area();
    Ok(Color::rgba(
        mean_half_even(sums[0], count),
        mean_half_even(sums[1], count),
        mean_half_even(sums[2], count),
        mean_half_even(sums[3], count),
    ))
}

/// Mean luma of the pixels inside `region`, alpha ignored.
pub fn average_luma(frame: &FrameBuffer, region: &PixelRect) -> TessellaResult<u8> {
    let region = checked_region(frame, region)?;
    let mut sum = 0u64;

    for y in region.y0..region.y1 {
        let row = frame.row(y);
        let span = &row[region.x0 as usize * 4..region.x1 as usize * 4];
        sum += span
            .chunks_exact(4)
            .map(|px| luma(px[0], px[1], px[2]) as u64)
            .sum::<u64>();
    }

    Ok(mean_half_even(sum, region.size().area()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_half_even() {
        assert_eq!(mean_half_even(10, 4), 2); // 2.5
        assert_eq!(mean_half_even(14, 4), 4); // 3.5
        assert_eq!(mean_half_even(11, 4), 3); // 2.75
        assert_eq!(mean_half_even(9, 4), 2); // 2.25
        assert_eq!(mean_half_even(255 * 9, 9), 255);
    }

    #[test]
    fn test_average_color_solid() {
        let frame = FrameBuffer::solid(6, 4, &Color::rgba(10, 20, 30, 40));
        let c = average_color(&frame, &PixelRect::new(1, 1, 5, 3)).unwrap();
        assert_eq!(c, Color::rgba(10, 20, 30, 40));
    }

    #[test]
    fn test_average_color_mixed_region() {
        let mut frame = FrameBuffer::solid(2, 1, &Color::rgb(0, 0, 0));
        frame.set_pixel(1, 0, [255, 5, 2, 255]);
        let c = average_color(&frame, &PixelRect::new(0, 0, 2, 1)).unwrap();
        // 127.5 -> 128, 2.5 -> 2, 1.0 -> 1
        assert_eq!(c, Color::rgba(128, 2, 1, 255));
    }

    #[test]
    fn test_average_color_only_reads_region() {
        let mut frame = FrameBuffer::solid(4, 4, &Color::WHITE);
        frame.set_pixel(0, 0, [0, 0, 0, 0]);
        let c = average_color(&frame, &PixelRect::new(1, 1, 4, 4)).unwrap();
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn test_region_is_clipped_to_frame() {
        let frame = FrameBuffer::solid(3, 3, &Color::RED);
        let c = average_color(&frame, &PixelRect::new(2, 2, 10, 10)).unwrap();
        assert_eq!(c, Color::RED);
    }

    #[test]
    fn test_empty_region_fails() {
        let frame = FrameBuffer::solid(3, 3, &Color::RED);
        assert!(matches!(
            average_color(&frame, &PixelRect::new(5, 5, 8, 8)),
            Err(TessellaError::Render(_))
        ));
        assert!(average_luma(&frame, &PixelRect::new(1, 1, 1, 2)).is_err());
    }

    #[test]
    fn test_average_luma() {
        let mut frame = FrameBuffer::solid(2, 1, &Color::WHITE);
        frame.set_pixel(1, 0, [0, 0, 0, 0]);
        // (255 + 0) / 2 = 127.5 -> 128
        assert_eq!(average_luma(&frame, &PixelRect::new(0, 0, 2, 1)).unwrap(), 128);
        let red = FrameBuffer::solid(2, 2, &Color::RED);
        assert_eq!(average_luma(&red, &PixelRect::new(0, 0, 2, 2)).unwrap(), 76);
    }
}
