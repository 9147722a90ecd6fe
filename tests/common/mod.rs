#![allow(dead_code)]

use std::f32::consts::PI;

/// Mono sine at `amp` peak amplitude.
pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

/// Sum of harmonics with 1/k amplitude, roughly voice-like.
pub fn gen_harmonic(f0: f32, harmonics: usize, sr: u32, n: usize) -> Vec<f32> {
    let norm: f32 = (1..=harmonics).map(|k| 1.0 / k as f32).sum();
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            (1..=harmonics)
                .map(|k| (2.0 * PI * f0 * k as f32 * t).sin() / k as f32)
                .sum::<f32>()
                * 0.5
                / norm
        })
        .collect()
}

pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// Single-bin DFT magnitude at `freq_hz`, normalized by length.
pub fn energy_at_freq(signal: &[f32], sr: u32, freq_hz: f32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz as f64 * i as f64 / sr as f64;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}

pub fn assert_finite(signal: &[f32], label: &str) {
    for (i, &s) in signal.iter().enumerate() {
        assert!(s.is_finite(), "{}: sample {} is not finite ({})", label, i, s);
    }
}

/// Trims `margin` samples from both ends, where framing edge effects live.
pub fn interior(signal: &[f32], margin: usize) -> &[f32] {
    if signal.len() <= 2 * margin {
        return signal;
    }
    &signal[margin..signal.len() - margin]
}
