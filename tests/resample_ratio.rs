//! Resample-only shifting: output length, ratio approximation, and
//! sample-rate conversion helpers.

mod common;

use common::{assert_finite, gen_sine, rms};
use voxshift::analysis::frequency::{bin_resolution, dominant_frequency};
use voxshift::core::resample::{
    rational_ratio, resample_rate, resampled_len, PolyphaseResampler, MAX_RESAMPLE_FACTOR,
};
use voxshift::engine::resample_ratio;
use voxshift::{pitch_ratio, shift_pitch, Algorithm};

#[test]
fn test_output_length_matches_ratio() {
    let input = gen_sine(440.0, 16000, 16000, 0.5);
    for semitones in [-24.0, -12.0, -7.5, -3.0, -1.0, 1.0, 3.0, 6.25, 12.0, 24.0] {
        let (output, _) = shift_pitch(&input, 16000, semitones, Algorithm::ResampleRatio).unwrap();
        let (up, down) = resample_ratio(pitch_ratio(semitones));
        assert_eq!(
            output.len(),
            resampled_len(input.len(), up, down),
            "{} st ({} / {})",
            semitones,
            up,
            down
        );
        assert_finite(&output, "resample sweep");
    }
}

#[test]
fn test_minus_three_semitone_fraction() {
    // 2^(3/12) ~= 1.189207; 44/37 is the last convergent within the factor bound
    let (up, down) = resample_ratio(pitch_ratio(-3.0));
    assert_eq!((up, down), (44, 37));
    let approx = up as f64 / down as f64;
    assert!((approx - 2f64.powf(0.25)).abs() < 1e-4, "{}/{} = {}", up, down, approx);
    assert_eq!(resampled_len(16000, up, down), 19028);
}

#[test]
fn test_octaves_are_exact() {
    assert_eq!(resample_ratio(pitch_ratio(-12.0)), (2, 1));
    assert_eq!(resample_ratio(pitch_ratio(12.0)), (1, 2));
    assert_eq!(resample_ratio(pitch_ratio(-24.0)), (4, 1));
}

#[test]
fn test_fractions_are_reduced_and_bounded() {
    for tenths in -240..=240 {
        let semitones = tenths as f64 / 10.0;
        let target = 1.0 / pitch_ratio(semitones);
        let (up, down) = rational_ratio(target);
        assert!(up >= 1 && down >= 1);
        assert!(up.max(down) <= MAX_RESAMPLE_FACTOR);
        let approx = up as f64 / down as f64;
        assert!(
            (approx / target - 1.0).abs() < 1e-3,
            "{} st: {}/{} vs {}",
            semitones,
            up,
            down,
            target
        );
    }
}

#[test]
fn test_deterministic() {
    let input = gen_sine(523.25, 22050, 20000, 0.4);
    let (a, _) = shift_pitch(&input, 22050, -4.0, Algorithm::ResampleRatio).unwrap();
    let (b, _) = shift_pitch(&input, 22050, -4.0, Algorithm::ResampleRatio).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_resampler_preserves_level() {
    let input = gen_sine(200.0, 16000, 16000, 0.5);
    for (up, down) in [(3u64, 2u64), (2, 3), (160, 147)] {
        let output = PolyphaseResampler::new(up, down).process(&input);
        assert_eq!(output.len(), resampled_len(input.len(), up, down));
        let margin = output.len() / 10;
        let ratio = rms(&output[margin..output.len() - margin]) / rms(&input);
        assert!((ratio - 1.0).abs() < 0.05, "{}/{}: RMS ratio {:.3}", up, down, ratio);
    }
}

#[test]
fn test_resample_rate_for_speech() {
    // 44.1 kHz recording brought down to a 16 kHz speech rate
    let input = gen_sine(440.0, 44100, 44100, 0.5);
    let output = resample_rate(&input, 44100, 16000);
    assert_eq!(output.len(), resampled_len(44100, 160, 441));
    assert_eq!(output.len(), 16000);

    let found = dominant_frequency(&output, 16000, 2048);
    assert!((found - 440.0).abs() <= bin_resolution(16000, 2048));
}

#[test]
fn test_resample_rate_same_rate_is_copy() {
    let input = gen_sine(440.0, 16000, 1000, 0.5);
    assert_eq!(resample_rate(&input, 16000, 16000), input);
}
