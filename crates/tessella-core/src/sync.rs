//! Reconciles two independently timed loops onto one output timeline.
//!
//! The search looks for repetition counts that make both looped durations
//! (nearly) equal, absorbs the residual stretch into animation B's playback
//! speed, and then samples both loops at a shared output framerate.

use serde::Serialize;

use crate::animation::Animation;
use crate::error::{TessellaError, TessellaResult};
use crate::rational::Rational;

/// Tolerances for the repetition search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncOptions {
    /// Accepted relative duration mismatch, in `(0, 1)`.
    pub max_stretch: Rational,
    /// Upper bound for animation A's repetition count.
    pub max_repetitions: u32,
}

impl SyncOptions {
    pub fn new(max_stretch: f64, max_repetitions: u32) -> TessellaResult<Self> {
        let max_stretch = Rational::from_f64(max_stretch).ok_or_else(|| {
            TessellaError::invalid(format!("unusable max stretch {}", max_stretch))
        })?;
        Ok(Self {
            max_stretch,
            max_repetitions,
        })
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_stretch: Rational::new(1, 10),
            max_repetitions: 10,
        }
    }
}

/// One evaluated point of the repetition search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepetitionCandidate {
    pub repetitions_a: u32,
    pub repetitions_b: u32,
    /// `loopedDurationB / loopedDurationA` before any framerate adjustment.
    pub difference: Rational,
}

impl RepetitionCandidate {
    /// Relative timing distortion, `|difference - 1|`.
    pub fn stretch(&self) -> Rational {
        (self.difference - Rational::ONE).abs()
    }
}

/// A pair of native frame indices shown together in one output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FramePair {
    pub a: u32,
    pub b: u32,
}

/// Outcome of [`synchronize`].
#[derive(Debug, Clone, Serialize)]
pub struct SynchronizationResult {
    pub candidate: RepetitionCandidate,
    /// Animation A as looped in the output.
    pub looped_a: Animation,
    /// Animation B as looped in the output, framerate already adjusted.
    pub looped_b: Animation,
    pub output_framerate: Rational,
    /// Whether a candidate met the stretch tolerance.
    pub converged: bool,
    pub timeline: Vec<FramePair>,
}

impl SynchronizationResult {
    pub fn repetitions_a(&self) -> u32 {
        self.candidate.repetitions_a
    }

    pub fn repetitions_b(&self) -> u32 {
        self.candidate.repetitions_b
    }

    /// Ratio applied to animation B's native framerate.
    pub fn framerate_adjustment_b(&self) -> Rational {
        self.candidate.difference
    }

    /// Achieved relative timing distortion.
    pub fn stretch(&self) -> Rational {
        self.candidate.stretch()
    }

    pub fn frame_count(&self) -> usize {
        self.timeline.len()
    }
}

/// Evaluate repetition counts `1..=max_repetitions` for A and return every
/// candidate recorded before the search stopped.
///
/// B's count is `durationA * repsA / durationB` rounded half-to-even and
/// clamped to at least one. The search stops at the first candidate whose
/// stretch is strictly below `max_stretch`.
pub fn search_repetitions(
    duration_a: Rational,
    duration_b: Rational,
    options: &SyncOptions,
) -> Vec<RepetitionCandidate> {
    let mut candidates = Vec::with_capacity(options.max_repetitions as usize);

    for repetitions_a in 1..=options.max_repetitions {
        let looped_a = duration_a * Rational::from(repetitions_a);
        let ideal_b = looped_a / duration_b;
        let repetitions_b = ideal_b.round_half_even().clamp(1, u32::MAX as i128) as u32;
        let difference = (duration_b * Rational::from(repetitions_b)) / looped_a;

        let candidate = RepetitionCandidate {
            repetitions_a,
            repetitions_b,
            difference,
        };
        candidates.push(candidate);

        if candidate.stretch() < options.max_stretch {
            break;
        }
    }

    candidates
}

/// Pick the candidate with the smallest stretch; ties keep the earliest.
pub fn best_candidate(candidates: &[RepetitionCandidate]) -> Option<RepetitionCandidate> {
    candidates
        .iter()
        .copied()
        .reduce(|best, c| if c.stretch() < best.stretch() { c } else { best })
}

/// Synchronize two looping animations onto one sampled timeline.
pub fn synchronize(
    a: &Animation,
    b: &Animation,
    options: &SyncOptions,
) -> TessellaResult<SynchronizationResult> {
    if options.max_stretch <= Rational::ZERO || options.max_stretch >= Rational::ONE {
        return Err(TessellaError::invalid(format!(
            "max stretch must lie in (0, 1), got {}",
            options.max_stretch
        )));
    }

    let candidates = search_repetitions(a.duration(), b.duration(), options);
    let candidate = best_candidate(&candidates).ok_or_else(|| {
        TessellaError::NoConvergence(format!(
            "no repetition candidate within {} repetitions",
            options.max_repetitions
        ))
    })?;
    let converged = candidate.stretch() < options.max_stretch;

    if converged {
        tracing::info!(
            "Synchronized loops: A x{} / B x{} (stretch {:.4})",
            candidate.repetitions_a,
            candidate.repetitions_b,
            candidate.stretch().to_f64(),
        );
    } else {
        tracing::warn!(
            "No repetition count within tolerance {}; using A x{} / B x{} (stretch {:.4})",
            options.max_stretch.to_f64(),
            candidate.repetitions_a,
            candidate.repetitions_b,
            candidate.stretch().to_f64(),
        );
    }

    let looped_a = a.looped(candidate.repetitions_a, a.framerate())?;
    let looped_b = b.looped(
        candidate.repetitions_b,
        b.framerate() * candidate.difference,
    )?;

    let frame_count = looped_a
        .repetition_frames()
        .max(looped_b.repetition_frames());
    let output_framerate = looped_a.framerate().max(looped_b.framerate());

    let timeline = (0..frame_count)
        .map(|f| {
            let time = Rational::from(f) / output_framerate;
            FramePair {
                a: looped_a.frame_at(time),
                b: looped_b.frame_at(time),
            }
        })
        .collect();

    Ok(SynchronizationResult {
        candidate,
        looped_a,
        looped_b,
        output_framerate,
        converged,
        timeline,
    })
}
