//! Spectral measurements for checking shifted audio: averaged magnitude
//! spectrum, dominant frequency, and RMS level.

use rustfft::num_complex::Complex;

use crate::core::fft::{SpectrumTransform, COMPLEX_ZERO};
use crate::core::window::hann_window;

/// Frequency resolution of an `fft_size`-point spectrum, in Hz per bin.
#[inline]
pub fn bin_resolution(sample_rate: u32, fft_size: usize) -> f64 {
    sample_rate as f64 / fft_size as f64
}

/// Averages the magnitude spectrum over half-overlapping Hann frames.
///
/// Returns `fft_size / 2 + 1` bins, or an empty vector when the signal is
/// shorter than one frame.
pub fn average_spectrum(samples: &[f32], fft_size: usize) -> Vec<f32> {
    if fft_size == 0 || samples.len() < fft_size {
        return vec![];
    }

    let window = hann_window(fft_size);
    let mut transform = SpectrumTransform::new(fft_size);
    let num_bins = transform.num_bins();
    let mut frame = vec![0.0f32; fft_size];
    let mut spectrum: Vec<Complex<f32>> = vec![COMPLEX_ZERO; num_bins];
    let mut average = vec![0.0f32; num_bins];

    let hop = (fft_size / 2).max(1);
    let mut count = 0usize;
    let mut start = 0usize;
    while start + fft_size <= samples.len() {
        for (slot, (&s, &w)) in frame
            .iter_mut()
            .zip(samples[start..start + fft_size].iter().zip(window.iter()))
        {
            *slot = s * w;
        }
        transform.forward(&frame, &mut spectrum);
        for (acc, c) in average.iter_mut().zip(spectrum.iter()) {
            *acc += c.norm();
        }
        count += 1;
        start += hop;
    }

    let scale = 1.0 / count as f32;
    average.iter_mut().for_each(|m| *m *= scale);
    average
}

/// Index of the strongest bin in the averaged spectrum, ignoring DC.
pub fn peak_bin(samples: &[f32], fft_size: usize) -> Option<usize> {
    let spectrum = average_spectrum(samples, fft_size);
    spectrum
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .filter(|(_, &mag)| mag > 0.0)
        .map(|(bin, _)| bin)
}

/// Frequency (Hz) of the dominant spectral peak, resolved to one bin.
///
/// Returns 0.0 for silence or signals shorter than `fft_size`.
pub fn dominant_frequency(samples: &[f32], sample_rate: u32, fft_size: usize) -> f64 {
    peak_bin(samples, fft_size)
        .map(|bin| bin as f64 * bin_resolution(sample_rate, fft_size))
        .unwrap_or(0.0)
}

/// Root-mean-square level of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    crate::engine::compute_rms(samples)
}
