//! Real-frame spectrum transform and FFT constants shared across the crate.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Zero-valued complex number, used for FFT buffer initialization.
pub const COMPLEX_ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Minimum window sum (as a fraction of max) to prevent amplification
/// in low-overlap regions during overlap-add normalization.
pub const WINDOW_SUM_FLOOR_RATIO: f32 = 0.1;

/// Absolute floor for window sum normalization to prevent division by zero.
pub const WINDOW_SUM_EPSILON: f32 = 1e-6;

/// Forward/inverse transform between a real `n_fft` frame and its
/// `n_fft / 2 + 1` non-negative frequency bins.
///
/// Holds its own plans and scratch buffer; create one per shift operation.
pub struct SpectrumTransform {
    fft_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl SpectrumTransform {
    /// Plans forward and inverse transforms of size `fft_size`.
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft_size,
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
            buffer: vec![COMPLEX_ZERO; fft_size],
        }
    }

    /// Returns the FFT size.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of non-negative frequency bins, `fft_size / 2 + 1`.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Transforms a real frame into `spectrum` (length `num_bins()`).
    pub fn forward(&mut self, frame: &[f32], spectrum: &mut [Complex<f32>]) {
        debug_assert_eq!(frame.len(), self.fft_size);
        debug_assert_eq!(spectrum.len(), self.num_bins());
        for (slot, &sample) in self.buffer.iter_mut().zip(frame.iter()) {
            *slot = Complex::new(sample, 0.0);
        }
        self.forward.process(&mut self.buffer);
        spectrum.copy_from_slice(&self.buffer[..spectrum.len()]);
    }

    /// Rebuilds the Hermitian spectrum from `spectrum` and writes the real
    /// frame (scaled by `1 / fft_size`) into `frame`.
    pub fn inverse(&mut self, spectrum: &[Complex<f32>], frame: &mut [f32]) {
        let num_bins = self.num_bins();
        debug_assert_eq!(spectrum.len(), num_bins);
        debug_assert_eq!(frame.len(), self.fft_size);

        self.buffer[..num_bins].copy_from_slice(spectrum);
        // DC and Nyquist must be real for a real output
        self.buffer[0].im = 0.0;
        if self.fft_size % 2 == 0 {
            self.buffer[num_bins - 1].im = 0.0;
        }
        for bin in 1..self.fft_size - num_bins + 1 {
            self.buffer[self.fft_size - bin] = self.buffer[bin].conj();
        }

        self.inverse.process(&mut self.buffer);

        let norm = 1.0 / self.fft_size as f32;
        for (out, c) in frame.iter_mut().zip(self.buffer.iter()) {
            *out = c.re * norm;
        }
    }
}
