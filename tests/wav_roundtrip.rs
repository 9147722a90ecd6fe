//! WAV round-trip integration tests.
//!
//! Generate a tone, write it to disk, shift it through the file API, and
//! read the result back.

mod common;

use common::gen_sine;
use voxshift::analysis::frequency::{bin_resolution, dominant_frequency};
use voxshift::io::wav::{read_wav_file, write_wav, write_wav_file};
use voxshift::{
    shift_pitch_wav_file, Algorithm, AudioBuffer, PitchShiftRequest, ShiftConfig, ShiftError,
    WavEncoding,
};

#[test]
fn test_file_shift_keeps_duration_and_rate() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("voice.wav");
    let output_path = dir.path().join("voice_pitched.wav");

    let input = AudioBuffer::new(gen_sine(440.0, 16000, 16000, 0.5), 16000);
    write_wav_file(&input_path, &input, WavEncoding::Pcm16).unwrap();

    let returned = shift_pitch_wav_file(
        &input_path,
        &output_path,
        &PitchShiftRequest::new(-3.0),
        &ShiftConfig::default(),
        WavEncoding::Pcm16,
    )
    .unwrap();

    let written = read_wav_file(&output_path).unwrap();
    assert_eq!(written.sample_rate, 16000);
    assert_eq!(written.len(), 16000);
    assert_eq!(returned.len(), written.len());

    let found = dominant_frequency(&written.data, 16000, 2048);
    assert!(
        (found - 369.99).abs() <= bin_resolution(16000, 2048),
        "written file peaks at {:.1} Hz",
        found
    );
}

#[test]
fn test_float_output_matches_returned_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");

    let input = AudioBuffer::new(gen_sine(300.0, 22050, 11025, 0.5), 22050);
    write_wav_file(&input_path, &input, WavEncoding::Float32).unwrap();

    let request = PitchShiftRequest::new(-12.0).with_algorithm(Algorithm::ResampleRatio);
    let returned = shift_pitch_wav_file(
        &input_path,
        &output_path,
        &request,
        &ShiftConfig::default(),
        WavEncoding::Float32,
    )
    .unwrap();

    let written = read_wav_file(&output_path).unwrap();
    assert_eq!(written, returned);
    assert_eq!(written.len(), 22050);
}

#[test]
fn test_stereo_file_is_shifted_as_mono() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("stereo.wav");
    let output_path = dir.path().join("mono.wav");

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&input_path, spec).unwrap();
    for s in gen_sine(440.0, 16000, 8000, 0.5) {
        let v = (s * i16::MAX as f32) as i16;
        writer.write_sample(v).unwrap();
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();

    shift_pitch_wav_file(
        &input_path,
        &output_path,
        &PitchShiftRequest::new(2.0),
        &ShiftConfig::default(),
        WavEncoding::Pcm16,
    )
    .unwrap();

    let reader = hound::WavReader::open(&output_path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 8000);
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = shift_pitch_wav_file(
        dir.path().join("nope.wav"),
        dir.path().join("out.wav"),
        &PitchShiftRequest::new(-3.0),
        &ShiftConfig::default(),
        WavEncoding::Pcm16,
    );
    assert!(matches!(result, Err(ShiftError::Io(_))));
}

#[test]
fn test_non_wav_input_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("memo.m4a");
    // ftyp box header of an MPEG-4 audio file
    std::fs::write(&input_path, b"\x00\x00\x00\x20ftypM4A \x00\x00\x00\x00M4A mp42isom").unwrap();

    let result = shift_pitch_wav_file(
        &input_path,
        dir.path().join("out.wav"),
        &PitchShiftRequest::new(-3.0),
        &ShiftConfig::default(),
        WavEncoding::Pcm16,
    );
    assert!(matches!(result, Err(ShiftError::InvalidFormat(_))));
}

#[test]
fn test_failed_shift_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("short.wav");
    let output_path = dir.path().join("out.wav");

    let input = AudioBuffer::new(gen_sine(440.0, 16000, 500, 0.5), 16000);
    std::fs::write(&input_path, write_wav(&input, WavEncoding::Pcm16).unwrap()).unwrap();

    let result = shift_pitch_wav_file(
        &input_path,
        &output_path,
        &PitchShiftRequest::new(-3.0),
        &ShiftConfig::default(),
        WavEncoding::Pcm16,
    );
    assert!(matches!(result, Err(ShiftError::UnsupportedParameters(_))));
    assert!(!output_path.exists());
}
