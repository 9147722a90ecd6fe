use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShiftError;

/// A single audio sample (32-bit float, range -1.0 to 1.0).
pub type Sample = f32;

/// Number of semitones per octave.
pub const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// Mono audio buffer plus its sample rate.
///
/// The buffer is moved into each pipeline stage and a new one is handed back,
/// so no two stages ever alias the same samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Mono sample data.
    pub data: Vec<Sample>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a mono buffer. Validation happens when the buffer is shifted.
    pub fn new(data: Vec<Sample>, sample_rate: u32) -> Self {
        Self { data, sample_rate }
    }

    /// Number of samples in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer contains no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.data.len() as f64 / self.sample_rate as f64
    }

    /// Consumes the buffer, returning the raw samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.data
    }
}

/// Pitch-shifting algorithm.
///
/// `PhaseVocoder` keeps the duration; `ResampleRatio` behaves like a
/// playback-speed change and alters both pitch and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Time-scale modification followed by resampling back to the input length.
    #[default]
    PhaseVocoder,
    /// Resample by the inverse pitch ratio only.
    ResampleRatio,
}

impl Algorithm {
    /// Canonical selector name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::PhaseVocoder => "phase-vocoder",
            Algorithm::ResampleRatio => "resample",
        }
    }

    /// Whether the algorithm keeps the output length equal to the input length.
    pub fn preserves_duration(&self) -> bool {
        matches!(self, Algorithm::PhaseVocoder)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phase-vocoder" | "phase_vocoder" | "pv" | "vocoder" => Ok(Algorithm::PhaseVocoder),
            "resample" | "resample-ratio" | "resample_ratio" | "speed" => {
                Ok(Algorithm::ResampleRatio)
            }
            other => Err(ShiftError::UnsupportedParameters(format!(
                "unknown algorithm '{}' (use phase-vocoder or resample)",
                other
            ))),
        }
    }
}

/// A single pitch-shift request: how far to move and, optionally, which
/// algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchShiftRequest {
    /// Shift in semitones: 0 = no-op, negative lowers, positive raises.
    pub semitones: f64,
    /// Algorithm override. `None` defers to `ShiftConfig::algorithm`.
    pub algorithm: Option<Algorithm>,
}

impl PitchShiftRequest {
    /// Creates a request that uses the configured algorithm.
    pub fn new(semitones: f64) -> Self {
        Self {
            semitones,
            algorithm: None,
        }
    }

    /// Overrides the configured algorithm for this request.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// The algorithm this request runs with, given the configured default.
    #[inline]
    pub fn algorithm_or(&self, configured: Algorithm) -> Algorithm {
        self.algorithm.unwrap_or(configured)
    }

    /// Frequency ratio for this request, `2^(semitones / 12)`.
    #[inline]
    pub fn pitch_ratio(&self) -> f64 {
        pitch_ratio(self.semitones)
    }

    /// Returns true if the request leaves the signal unchanged.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.semitones == 0.0
    }
}

/// Converts a semitone shift into a frequency ratio.
#[inline]
pub fn pitch_ratio(semitones: f64) -> f64 {
    2.0f64.powf(semitones / SEMITONES_PER_OCTAVE)
}
