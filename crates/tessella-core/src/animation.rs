use serde::Serialize;

use crate::error::{TessellaError, TessellaResult};
use crate::rational::Rational;

/// Timing of one looping frame sequence.
///
/// `repetitions` is zero for a freshly described source animation and is
/// assigned by the synchronizer through [`Animation::looped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Animation {
    frame_count: u32,
    framerate: Rational,
    repetitions: u32,
}

impl Animation {
    /// Describe a source animation.
    pub fn new(frame_count: u32, framerate: Rational) -> TessellaResult<Self> {
        if frame_count < 1 {
            return Err(TessellaError::invalid(
                "animation must have at least one frame",
            ));
        }
        if !framerate.is_positive() {
            return Err(TessellaError::invalid(format!(
                "animation framerate must be positive, got {}",
                framerate
            )));
        }
        Ok(Self {
            frame_count,
            framerate,
            repetitions: 0,
        })
    }

    /// Same as [`Animation::new`] for a real-valued framerate.
    pub fn from_fps(frame_count: u32, fps: f64) -> TessellaResult<Self> {
        let framerate = Rational::from_f64(fps)
            .ok_or_else(|| TessellaError::invalid(format!("unusable framerate {}", fps)))?;
        Self::new(frame_count, framerate)
    }

    /// A copy that plays `repetitions` times at `framerate`.
    pub fn looped(&self, repetitions: u32, framerate: Rational) -> TessellaResult<Self> {
        let mut looped = Self::new(self.frame_count, framerate)?;
        looped.repetitions = repetitions;
        Ok(looped)
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn framerate(&self) -> Rational {
        self.framerate
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Length of one loop in seconds.
    pub fn duration(&self) -> Rational {
        Rational::from(self.frame_count) / self.framerate
    }

    /// Length of all repetitions in seconds.
    pub fn looped_duration(&self) -> Rational {
        self.duration() * Rational::from(self.repetitions)
    }

    /// Native frames played across all repetitions.
    pub fn repetition_frames(&self) -> u64 {
        self.frame_count as u64 * self.repetitions as u64
    }

    /// Index of the frame showing at `time` seconds, wrapping around the loop.
    pub fn frame_at(&self, time: Rational) -> u32 {
        let elapsed_frames = (time * self.framerate).floor();
        elapsed_frames.rem_euclid(self.frame_count as i128) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_is_exact() {
        for (frames, num, den) in [(10u32, 10i128, 1i128), (7, 100, 7), (33, 2997, 100)] {
            let fps = Rational::new(num, den);
            let anim = Animation::new(frames, fps).unwrap();
            assert_eq!(anim.duration(), Rational::from(frames) / fps);
        }
        let anim = Animation::new(15, Rational::from_integer(10)).unwrap();
        assert_eq!(anim.duration(), Rational::new(3, 2));
    }

    #[test]
    fn test_rejects_invalid_timing() {
        assert!(matches!(
            Animation::new(0, Rational::ONE),
            Err(TessellaError::InvalidInput(_))
        ));
        assert!(matches!(
            Animation::new(3, Rational::ZERO),
            Err(TessellaError::InvalidInput(_))
        ));
        assert!(Animation::new(3, Rational::from_integer(-5)).is_err());
        assert!(Animation::from_fps(3, f64::INFINITY).is_err());
    }

    #[test]
    fn test_looped_duration() {
        let anim = Animation::new(10, Rational::from_integer(10)).unwrap();
        assert_eq!(anim.repetitions(), 0);
        assert_eq!(anim.looped_duration(), Rational::ZERO);
        let looped = anim.looped(3, anim.framerate()).unwrap();
        assert_eq!(looped.looped_duration(), Rational::from_integer(3));
        assert_eq!(looped.repetition_frames(), 30);
    }

    #[test]
    fn test_frame_at_wraps() {
        let anim = Animation::new(4, Rational::from_integer(10)).unwrap();
        assert_eq!(anim.frame_at(Rational::ZERO), 0);
        assert_eq!(anim.frame_at(Rational::new(3, 10)), 3);
        assert_eq!(anim.frame_at(Rational::new(4, 10)), 0);
        assert_eq!(anim.frame_at(Rational::new(19, 20)), 1);
    }

    #[test]
    fn test_frame_at_negative_time_stays_in_range() {
        let anim = Animation::new(4, Rational::from_integer(10)).unwrap();
        assert_eq!(anim.frame_at(Rational::new(-1, 10)), 3);
    }
}
