#![forbid(unsafe_code)]
//! Pure Rust pitch shifting for recorded speech.
//!
//! `voxshift` moves the pitch of a mono voice recording by a number of
//! semitones while keeping its duration and cadence, e.g. lowering a voice
//! by a few semitones for listeners with high-frequency hearing loss.
//!
//! Two algorithms are available:
//!
//! - [`Algorithm::PhaseVocoder`] (default): phase-vocoder time-scale
//!   modification followed by polyphase resampling back to the original
//!   length. Duration is preserved exactly.
//! - [`Algorithm::ResampleRatio`]: polyphase resampling by the inverse pitch
//!   ratio only. Fast, but behaves like a playback-speed change: lowering
//!   the pitch also lengthens the audio.
//!
//! # Quick Start
//!
//! ```
//! use voxshift::Algorithm;
//!
//! // 1 second of 440 Hz sine at 16 kHz
//! let input: Vec<f32> = (0..16000)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
//!     .collect();
//!
//! let (output, rate) = voxshift::shift_pitch(&input, 16000, -3.0, Algorithm::PhaseVocoder).unwrap();
//! assert_eq!(output.len(), input.len());
//! assert_eq!(rate, 16000);
//! ```
//!
//! # Configuration
//!
//! ```
//! use voxshift::{AudioBuffer, PitchShiftRequest, Profile, ShiftConfig};
//!
//! let buffer = AudioBuffer::new(vec![0.0; 8000], 16000);
//! let config = ShiftConfig::from_profile(Profile::LowMemory).with_normalize(true);
//! let output = voxshift::shift_pitch_buffer(buffer, &PitchShiftRequest::new(-4.0), &config).unwrap();
//! assert_eq!(output.len(), 8000);
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod stretch;

use std::path::Path;

pub use config::{Profile, ResamplerKind, ShiftConfig};
pub use core::types::{pitch_ratio, Algorithm, AudioBuffer, PitchShiftRequest, Sample};
pub use engine::{EngineState, PitchEngine};
pub use error::ShiftError;
pub use io::wav::WavEncoding;

/// Shifts the pitch of a mono buffer using the default configuration.
///
/// Returns the shifted samples together with the sample rate to encode them
/// at, which is always `sample_rate`. With [`Algorithm::PhaseVocoder`] the
/// output has the same length as the input; with
/// [`Algorithm::ResampleRatio`] the length changes by the inverse pitch
/// ratio.
///
/// # Errors
///
/// - [`ShiftError::InvalidInput`] for an empty buffer, a zero sample rate,
///   or non-finite samples.
/// - [`ShiftError::UnsupportedParameters`] if `semitones` is outside ±24 or
///   the buffer is shorter than one 2048-sample FFT frame.
///
/// # Example
///
/// ```
/// use voxshift::{Algorithm, ShiftError};
///
/// let err = voxshift::shift_pitch(&[0.0; 4096], 16000, 100.0, Algorithm::PhaseVocoder);
/// assert!(matches!(err, Err(ShiftError::UnsupportedParameters(_))));
/// ```
pub fn shift_pitch(
    samples: &[f32],
    sample_rate: u32,
    semitones: f64,
    algorithm: Algorithm,
) -> Result<(Vec<f32>, u32), ShiftError> {
    let request = PitchShiftRequest::new(semitones).with_algorithm(algorithm);
    let buffer = AudioBuffer::new(samples.to_vec(), sample_rate);
    let output = shift_pitch_buffer(buffer, &request, &ShiftConfig::default())?;
    let rate = output.sample_rate;
    Ok((output.into_samples(), rate))
}

/// Shifts the pitch of an [`AudioBuffer`], taking ownership of it.
///
/// # Errors
///
/// See [`shift_pitch`]; additionally returns
/// [`ShiftError::UnsupportedParameters`] for an unusable `config`, and
/// [`ShiftError::NumericalFailure`] when `config.strict_numerics` is set and
/// the spectra turn non-finite.
pub fn shift_pitch_buffer(
    buffer: AudioBuffer,
    request: &PitchShiftRequest,
    config: &ShiftConfig,
) -> Result<AudioBuffer, ShiftError> {
    PitchEngine::new(config.clone())?.process(buffer, request)
}

/// Reads a WAV file, shifts its pitch, and writes the result.
///
/// Multi-channel input is downmixed to mono. The output keeps the input's
/// sample rate.
///
/// # Errors
///
/// Returns [`ShiftError::Io`] if the files cannot be read or written,
/// [`ShiftError::InvalidFormat`] if the input is not a readable WAV file,
/// or any error of [`shift_pitch_buffer`].
pub fn shift_pitch_wav_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    request: &PitchShiftRequest,
    config: &ShiftConfig,
    encoding: WavEncoding,
) -> Result<AudioBuffer, ShiftError> {
    let buffer = io::wav::read_wav_file(input_path)?;
    let result = shift_pitch_buffer(buffer, request, config)?;
    io::wav::write_wav_file(output_path, &result, encoding)?;
    Ok(result)
}
