//! Phase vocoder time-scale modification.
//!
//! Magnitudes are taken from the (interpolated) analysis frames while the
//! phase of every bin is re-accumulated from its measured instantaneous
//! frequency, so the signal can be sped up or slowed down without moving
//! its pitch.

use rustfft::num_complex::Complex;
use std::f64::consts::PI;

use crate::core::fft::{SpectrumTransform, COMPLEX_ZERO};
use crate::core::window::hann_window;
use crate::error::ShiftError;
use crate::stretch::stft::{num_frames, Framer, OverlapAdd};

const TWO_PI: f64 = 2.0 * PI;

/// Magnitude below which a bin counts as silent.
const SILENCE_FLOOR: f32 = 1e-10;

/// Per-bin running synthesis phase.
///
/// Carried across every output frame of one stretch call and never shared
/// between calls. Stored in double precision and kept wrapped so that long
/// buffers do not lose phase resolution.
#[derive(Debug, Clone)]
pub struct PhaseAccumulator {
    phases: Vec<f64>,
}

impl PhaseAccumulator {
    /// Creates a zeroed accumulator for `num_bins` bins.
    pub fn new(num_bins: usize) -> Self {
        Self {
            phases: vec![0.0; num_bins],
        }
    }

    /// Re-seeds every bin from the phase of `spectrum`.
    pub fn reset(&mut self, spectrum: &[Complex<f32>]) {
        for (acc, c) in self.phases.iter_mut().zip(spectrum.iter()) {
            let phase = c.arg() as f64;
            *acc = if phase.is_finite() { phase } else { 0.0 };
        }
    }

    /// Advances one bin by `increment` radians.
    #[inline]
    pub fn advance(&mut self, bin: usize, increment: f64) {
        self.phases[bin] = wrap_phase(self.phases[bin] + increment);
    }

    /// Clears one bin.
    #[inline]
    pub fn zero(&mut self, bin: usize) {
        self.phases[bin] = 0.0;
    }

    /// Current phase of each bin, in (-PI, PI].
    #[inline]
    pub fn phases(&self) -> &[f64] {
        &self.phases
    }
}

/// Sliding pair of analysis spectra at frames `index` and `index + 1`.
///
/// Frames are computed on demand as the read position moves forward, so the
/// full STFT is never materialized. Frames past the end read as silence.
struct SpectrumCursor<'a> {
    framer: Framer<'a>,
    transform: SpectrumTransform,
    scratch: Vec<f32>,
    index: usize,
    current: Vec<Complex<f32>>,
    next: Vec<Complex<f32>>,
}

impl<'a> SpectrumCursor<'a> {
    fn new(framer: Framer<'a>) -> Self {
        let transform = SpectrumTransform::new(framer.frame_size());
        let num_bins = transform.num_bins();
        let mut cursor = Self {
            framer,
            transform,
            scratch: vec![0.0; framer.frame_size()],
            index: 0,
            current: vec![COMPLEX_ZERO; num_bins],
            next: vec![COMPLEX_ZERO; num_bins],
        };
        cursor.load(0, true);
        cursor.load(1, false);
        cursor
    }

    fn load(&mut self, frame: usize, into_current: bool) {
        let target = if into_current {
            &mut self.current
        } else {
            &mut self.next
        };
        if frame >= self.framer.num_frames() {
            target.fill(COMPLEX_ZERO);
            return;
        }
        self.framer.frame_into(frame, &mut self.scratch);
        self.transform.forward(&self.scratch, target);
    }

    /// Moves the pair forward so that `current` is frame `index`.
    fn seek(&mut self, index: usize) {
        if index == self.index {
            return;
        }
        if index == self.index + 1 {
            std::mem::swap(&mut self.current, &mut self.next);
            self.load(index + 1, false);
        } else {
            self.load(index, true);
            self.load(index + 1, false);
        }
        self.index = index;
    }
}

/// Phase vocoder for time-scale modification of a mono signal.
#[derive(Debug, Clone)]
pub struct PhaseVocoder {
    fft_size: usize,
    hop: usize,
    window: Vec<f32>,
    /// Pre-computed expected phase advance per bin over one hop.
    expected_phase_advance: Vec<f64>,
    strict_numerics: bool,
}

impl PhaseVocoder {
    /// Creates a phase vocoder with the given frame size and hop.
    pub fn new(fft_size: usize, hop: usize) -> Self {
        let num_bins = fft_size / 2 + 1;
        let expected_phase_advance = (0..num_bins)
            .map(|bin| TWO_PI * hop as f64 * bin as f64 / fft_size as f64)
            .collect();

        Self {
            fft_size,
            hop,
            window: hann_window(fft_size),
            expected_phase_advance,
            strict_numerics: false,
        }
    }

    /// Fail on non-finite spectra instead of zeroing the offending bins.
    pub fn with_strict_numerics(mut self, strict: bool) -> Self {
        self.strict_numerics = strict;
        self
    }

    /// Returns the FFT size.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Returns the hop size (analysis and synthesis).
    #[inline]
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Length of the output produced for `input_len` samples at `rate`.
    #[inline]
    pub fn stretched_len(input_len: usize, rate: f64) -> usize {
        (input_len as f64 / rate).round() as usize
    }

    /// Time-scales `input` by `rate` while preserving pitch.
    ///
    /// `rate > 1.0` speeds the signal up (shorter output), `rate < 1.0`
    /// slows it down. The output holds `round(len / rate)` samples.
    pub fn time_stretch(&self, input: &[f32], rate: f64) -> Result<Vec<f32>, ShiftError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ShiftError::UnsupportedParameters(format!(
                "time-stretch rate must be positive and finite, got {}",
                rate
            )));
        }
        if input.len() < self.fft_size {
            return Err(ShiftError::UnsupportedParameters(format!(
                "input of {} samples is shorter than the {}-sample FFT window",
                input.len(),
                self.fft_size
            )));
        }

        let framer = Framer::new(input, &self.window, self.hop);
        let num_input_frames = num_frames(input.len(), self.hop);
        let num_output_frames = (num_input_frames as f64 / rate).ceil() as usize;
        let output_len = Self::stretched_len(input.len(), rate);

        tracing::trace!(
            rate,
            num_input_frames,
            num_output_frames,
            output_len,
            "phase vocoder time stretch"
        );

        let mut cursor = SpectrumCursor::new(framer);
        let num_bins = self.fft_size / 2 + 1;
        let mut accumulator = PhaseAccumulator::new(num_bins);
        accumulator.reset(&cursor.current);

        let mut synth_transform = SpectrumTransform::new(self.fft_size);
        let mut spectrum = vec![COMPLEX_ZERO; num_bins];
        let mut frame = vec![0.0f32; self.fft_size];
        let mut ola = OverlapAdd::new(&self.window, self.hop, num_output_frames);
        let mut repaired = 0usize;

        for t in 0..num_output_frames {
            let position = t as f64 * rate;
            let index = position.floor() as usize;
            let alpha = (position - index as f64) as f32;
            cursor.seek(index);

            repaired += self.synthesize_frame(
                &cursor.current,
                &cursor.next,
                alpha,
                &mut accumulator,
                &mut spectrum,
            )?;

            synth_transform.inverse(&spectrum, &mut frame);
            ola.add_frame(t, &frame);
        }

        if repaired > 0 {
            tracing::warn!(
                repaired_bins = repaired,
                "non-finite spectral bins replaced with silence"
            );
        }

        Ok(ola.finish(output_len))
    }

    /// Builds one output spectrum from the analysis pair around the read
    /// position and advances the accumulator by one synthesis hop.
    ///
    /// Returns the number of bins that had to be zeroed.
    fn synthesize_frame(
        &self,
        current: &[Complex<f32>],
        next: &[Complex<f32>],
        alpha: f32,
        accumulator: &mut PhaseAccumulator,
        out: &mut [Complex<f32>],
    ) -> Result<usize, ShiftError> {
        let hop = self.hop as f64;
        let synthesis_hop = self.hop as f64;
        let mut repaired = 0usize;

        for bin in 0..out.len() {
            let (a, b) = (current[bin], next[bin]);
            let mag_a = a.norm();
            let mag_b = b.norm();
            let magnitude = (1.0 - alpha) * mag_a + alpha * mag_b;
            let phase = accumulator.phases()[bin];

            if !(magnitude.is_finite() && phase.is_finite() && a.arg().is_finite() && b.arg().is_finite()) {
                if self.strict_numerics {
                    return Err(ShiftError::NumericalFailure(format!(
                        "non-finite spectrum at bin {}",
                        bin
                    )));
                }
                out[bin] = COMPLEX_ZERO;
                accumulator.zero(bin);
                repaired += 1;
                continue;
            }

            out[bin] = Complex::from_polar(magnitude, phase as f32);

            let expected = self.expected_phase_advance[bin];
            let deviation = if mag_a < SILENCE_FLOOR && mag_b < SILENCE_FLOOR {
                0.0
            } else {
                wrap_phase(b.arg() as f64 - a.arg() as f64 - expected)
            };
            let true_frequency = (expected + deviation) / hop;
            accumulator.advance(bin, true_frequency * synthesis_hop);
        }

        Ok(repaired)
    }
}

/// Wraps a phase value into (-PI, PI].
#[inline]
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase - TWO_PI * (phase / TWO_PI).round();
    if wrapped <= -PI {
        wrapped + TWO_PI
    } else {
        wrapped
    }
}
