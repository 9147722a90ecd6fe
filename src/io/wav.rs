//! WAV decoding/encoding for the command-line front end, built on hound.
//!
//! Multi-channel input is averaged down to mono on read; output is always
//! mono.

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::core::types::{AudioBuffer, Sample};
use crate::error::ShiftError;

/// Output sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavEncoding {
    /// 16-bit signed PCM.
    #[default]
    Pcm16,
    /// 32-bit IEEE float.
    Float32,
}

impl WavEncoding {
    fn spec(&self, sample_rate: u32) -> WavSpec {
        match self {
            WavEncoding::Pcm16 => WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            WavEncoding::Float32 => WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            },
        }
    }
}

/// Decodes a WAV stream, downmixing to mono.
fn decode<R: Read>(reader: WavReader<R>) -> Result<AudioBuffer, ShiftError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(ShiftError::InvalidFormat(
            "WAV header declares zero channels".to_string(),
        ));
    }

    let interleaved: Vec<Sample> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(ShiftError::InvalidFormat(format!(
                    "unsupported PCM bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let data = if channels == 1 {
        interleaved
    } else {
        downmix(&interleaved, channels)
    };

    tracing::debug!(
        samples = data.len(),
        sample_rate = spec.sample_rate,
        channels,
        bits = spec.bits_per_sample,
        "decoded WAV"
    );

    Ok(AudioBuffer::new(data, spec.sample_rate))
}

/// Averages interleaved channels into one.
fn downmix(interleaved: &[Sample], channels: usize) -> Vec<Sample> {
    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

fn encode<W: Write + Seek>(
    writer: W,
    buffer: &AudioBuffer,
    encoding: WavEncoding,
) -> Result<(), ShiftError> {
    let mut writer = WavWriter::new(writer, encoding.spec(buffer.sample_rate))?;
    match encoding {
        WavEncoding::Pcm16 => {
            for &s in &buffer.data {
                let clamped = s.clamp(-1.0, 1.0);
                writer.write_sample((clamped * i16::MAX as f32).round() as i16)?;
            }
        }
        WavEncoding::Float32 => {
            for &s in &buffer.data {
                writer.write_sample(s)?;
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Reads a WAV file from a byte slice.
pub fn read_wav(data: &[u8]) -> Result<AudioBuffer, ShiftError> {
    decode(WavReader::new(Cursor::new(data))?)
}

/// Reads a WAV file from disk.
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<AudioBuffer, ShiftError> {
    decode(WavReader::open(path)?)
}

/// Encodes a mono buffer as WAV bytes.
pub fn write_wav(buffer: &AudioBuffer, encoding: WavEncoding) -> Result<Vec<u8>, ShiftError> {
    let mut cursor = Cursor::new(Vec::new());
    encode(&mut cursor, buffer, encoding)?;
    Ok(cursor.into_inner())
}

/// Writes a mono buffer to a WAV file.
pub fn write_wav_file(
    path: impl AsRef<Path>,
    buffer: &AudioBuffer,
    encoding: WavEncoding,
) -> Result<(), ShiftError> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    encode(file, buffer, encoding)
}
