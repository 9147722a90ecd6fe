//! Pitch engine: validation, algorithm dispatch, and the per-call state
//! machine.
//!
//! ```text
//! Idle -> Validating -> PhaseVocoderPath | ResampleOnlyPath -> Complete
//!             \______________________\__________________/
//!                                     -> Failed(reason)
//! ```

use crate::config::{ResamplerKind, ShiftConfig};
use crate::core::resample::{rational_ratio, resample_linear, PolyphaseResampler};
use crate::core::types::{Algorithm, AudioBuffer, PitchShiftRequest};
use crate::error::ShiftError;
use crate::stretch::params;
use crate::stretch::phase_vocoder::PhaseVocoder;

/// Minimum RMS threshold to avoid division by zero during normalization.
const NORMALIZE_RMS_FLOOR: f32 = 1e-8;

/// Where the engine is in processing the current buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Checking buffer, request and configuration.
    Validating,
    /// Stretching with the phase vocoder, then resampling back.
    PhaseVocoderPath,
    /// Resampling only.
    ResampleOnlyPath,
    /// The last call produced output.
    Complete,
    /// The last call failed; no output was produced.
    Failed(ShiftError),
}

impl EngineState {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Validating => "validating",
            EngineState::PhaseVocoderPath => "phase-vocoder",
            EngineState::ResampleOnlyPath => "resample-only",
            EngineState::Complete => "complete",
            EngineState::Failed(_) => "failed",
        }
    }

    /// Returns true for `Complete` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Complete | EngineState::Failed(_))
    }
}

/// Pitch-shifting engine.
///
/// Holds only its configuration and the state of the most recent call. All
/// transform buffers and phase state are allocated inside each call, so
/// separate engines can run on separate threads without interfering.
#[derive(Debug, Clone)]
pub struct PitchEngine {
    config: ShiftConfig,
    state: EngineState,
}

impl PitchEngine {
    /// Creates an engine, rejecting unusable configurations up front.
    pub fn new(config: ShiftConfig) -> Result<Self, ShiftError> {
        params::validate_config(&config)?;
        Ok(Self {
            config,
            state: EngineState::Idle,
        })
    }

    /// The engine's configuration.
    #[inline]
    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    /// State reached by the most recent call.
    #[inline]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    fn transition(&mut self, next: EngineState) {
        tracing::trace!(from = self.state.label(), to = next.label(), "engine state");
        self.state = next;
    }

    /// Shifts `buffer` as described by `request`.
    ///
    /// The buffer is consumed; on success a new buffer at the same sample
    /// rate is returned. On failure nothing is returned and the engine is
    /// left in [`EngineState::Failed`].
    pub fn process(
        &mut self,
        buffer: AudioBuffer,
        request: &PitchShiftRequest,
    ) -> Result<AudioBuffer, ShiftError> {
        self.transition(EngineState::Idle);
        match self.run(buffer, request) {
            Ok(output) => {
                self.transition(EngineState::Complete);
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(error = %err, "pitch shift failed");
                self.transition(EngineState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn run(
        &mut self,
        buffer: AudioBuffer,
        request: &PitchShiftRequest,
    ) -> Result<AudioBuffer, ShiftError> {
        self.transition(EngineState::Validating);
        params::validate_all(&buffer, request, &self.config)?;

        let sample_rate = buffer.sample_rate;
        let input = buffer.into_samples();

        if request.is_identity() {
            tracing::debug!("zero semitone shift, returning input unchanged");
            return Ok(AudioBuffer::new(input, sample_rate));
        }

        let pitch_ratio = request.pitch_ratio();
        let algorithm = request.algorithm_or(self.config.algorithm);
        tracing::debug!(
            semitones = request.semitones,
            pitch_ratio,
            algorithm = %algorithm,
            samples = input.len(),
            sample_rate,
            "shifting pitch"
        );

        let mut output = match algorithm {
            Algorithm::PhaseVocoder => {
                self.transition(EngineState::PhaseVocoderPath);
                self.shift_phase_vocoder(&input, pitch_ratio)?
            }
            Algorithm::ResampleRatio => {
                self.transition(EngineState::ResampleOnlyPath);
                shift_resample_ratio(&input, pitch_ratio)
            }
        };

        if self.config.normalize {
            normalize_rms(&mut output, compute_rms(&input));
        }

        Ok(AudioBuffer::new(output, sample_rate))
    }

    /// Stretch by `pitch_ratio` in time, then resample back to the input
    /// length so only the pitch moves.
    fn shift_phase_vocoder(&self, input: &[f32], pitch_ratio: f64) -> Result<Vec<f32>, ShiftError> {
        let rate = 1.0 / pitch_ratio;
        let vocoder = PhaseVocoder::new(self.config.n_fft, self.config.hop_length)
            .with_strict_numerics(self.config.strict_numerics);
        let stretched = vocoder.time_stretch(input, rate)?;

        let mut output = match self.config.resampler {
            ResamplerKind::Polyphase => {
                let (up, down) = rational_ratio(rate);
                tracing::trace!(up, down, "resampling stretched signal");
                PolyphaseResampler::new(up, down).process(&stretched)
            }
            ResamplerKind::Linear => resample_linear(&stretched, input.len()),
        };
        output.resize(input.len(), 0.0);
        Ok(output)
    }
}

/// Resample by the inverse pitch ratio; both pitch and duration change.
fn shift_resample_ratio(input: &[f32], pitch_ratio: f64) -> Vec<f32> {
    let (up, down) = resample_ratio(pitch_ratio);
    tracing::trace!(up, down, "resample-only shift");
    PolyphaseResampler::new(up, down).process(input)
}

/// Reduced `(up, down)` fraction the resample-only path uses for a given
/// pitch ratio. The output holds `ceil(len * up / down)` samples.
pub fn resample_ratio(pitch_ratio: f64) -> (u64, u64) {
    rational_ratio(1.0 / pitch_ratio)
}

/// Computes the RMS (root mean square) of a signal.
#[inline]
pub(crate) fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Scales output so its RMS matches `target_rms`, if the output has sufficient energy.
#[inline]
fn normalize_rms(output: &mut [f32], target_rms: f32) {
    let output_rms = compute_rms(output);
    if output_rms < NORMALIZE_RMS_FLOOR || target_rms < NORMALIZE_RMS_FLOOR {
        return;
    }
    let gain = target_rms / output_rms;
    for s in output.iter_mut() {
        *s *= gain;
    }
}
