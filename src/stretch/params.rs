//! Validation of buffers, requests, and configuration before any transform
//! work begins.

use crate::config::ShiftConfig;
use crate::core::types::{AudioBuffer, PitchShiftRequest};
use crate::error::ShiftError;

/// Smallest FFT size the phase vocoder accepts.
pub const MIN_FFT_SIZE: usize = 4;

/// Largest `max_semitones` a configuration may declare (four octaves).
pub const SEMITONES_LIMIT: f64 = 48.0;

/// Checks the buffer itself: non-empty, positive rate, finite samples.
pub fn validate_buffer(buffer: &AudioBuffer) -> Result<(), ShiftError> {
    if buffer.is_empty() {
        return Err(ShiftError::InvalidInput("audio buffer is empty".to_string()));
    }
    if buffer.sample_rate == 0 {
        return Err(ShiftError::InvalidInput(
            "sample rate must be greater than 0".to_string(),
        ));
    }
    if let Some(pos) = buffer.data.iter().position(|s| !s.is_finite()) {
        return Err(ShiftError::InvalidInput(format!(
            "sample {} is not finite ({})",
            pos, buffer.data[pos]
        )));
    }
    Ok(())
}

/// Checks that the framing and bound settings are usable.
pub fn validate_config(config: &ShiftConfig) -> Result<(), ShiftError> {
    if config.n_fft < MIN_FFT_SIZE {
        return Err(ShiftError::UnsupportedParameters(format!(
            "n_fft must be at least {}, got {}",
            MIN_FFT_SIZE, config.n_fft
        )));
    }
    if config.hop_length == 0 || config.hop_length >= config.n_fft {
        return Err(ShiftError::UnsupportedParameters(format!(
            "hop_length must be in 1..{}, got {}",
            config.n_fft, config.hop_length
        )));
    }
    if !config.max_semitones.is_finite()
        || config.max_semitones <= 0.0
        || config.max_semitones > SEMITONES_LIMIT
    {
        return Err(ShiftError::UnsupportedParameters(format!(
            "max_semitones must be in (0, {}], got {}",
            SEMITONES_LIMIT, config.max_semitones
        )));
    }
    Ok(())
}

/// Checks the semitone shift against the configured bound.
pub fn validate_request(
    request: &PitchShiftRequest,
    config: &ShiftConfig,
) -> Result<(), ShiftError> {
    if !request.semitones.is_finite() {
        return Err(ShiftError::UnsupportedParameters(format!(
            "semitone shift must be finite, got {}",
            request.semitones
        )));
    }
    if request.semitones.abs() > config.max_semitones {
        return Err(ShiftError::UnsupportedParameters(format!(
            "semitone shift {} outside ±{}",
            request.semitones, config.max_semitones
        )));
    }
    Ok(())
}

/// Checks that the buffer holds at least one full analysis frame.
pub fn validate_frame_fit(buffer: &AudioBuffer, config: &ShiftConfig) -> Result<(), ShiftError> {
    if buffer.len() < config.n_fft {
        return Err(ShiftError::UnsupportedParameters(format!(
            "FFT window of {} samples is larger than the {}-sample buffer",
            config.n_fft,
            buffer.len()
        )));
    }
    Ok(())
}

/// Runs every check in order: input, configuration, request, frame fit.
pub fn validate_all(
    buffer: &AudioBuffer,
    request: &PitchShiftRequest,
    config: &ShiftConfig,
) -> Result<(), ShiftError> {
    validate_buffer(buffer)?;
    validate_config(config)?;
    validate_request(request, config)?;
    validate_frame_fit(buffer, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: usize) -> AudioBuffer {
        AudioBuffer::new(vec![0.1; len], 16000)
    }

    #[test]
    fn test_empty_buffer_is_invalid_input() {
        let err = validate_buffer(&AudioBuffer::new(vec![], 16000)).unwrap_err();
        assert!(matches!(err, ShiftError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_rate_is_invalid_input() {
        let err = validate_buffer(&AudioBuffer::new(vec![0.0; 10], 0)).unwrap_err();
        assert!(matches!(err, ShiftError::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_sample_is_invalid_input() {
        let mut data = vec![0.0f32; 10];
        data[7] = f32::INFINITY;
        let err = validate_buffer(&AudioBuffer::new(data, 16000)).unwrap_err();
        assert!(matches!(err, ShiftError::InvalidInput(msg) if msg.contains("sample 7")));
    }

    #[test]
    fn test_semitone_bounds() {
        let config = ShiftConfig::default();
        assert!(validate_request(&PitchShiftRequest::new(24.0), &config).is_ok());
        assert!(validate_request(&PitchShiftRequest::new(-24.0), &config).is_ok());
        for bad in [24.01, -100.0, 100.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                validate_request(&PitchShiftRequest::new(bad), &config),
                Err(ShiftError::UnsupportedParameters(_))
            ));
        }
    }

    #[test]
    fn test_config_checks() {
        assert!(validate_config(&ShiftConfig::default()).is_ok());
        assert!(validate_config(&ShiftConfig::default().with_n_fft(2)).is_err());
        assert!(validate_config(&ShiftConfig::default().with_hop_length(0)).is_err());
        assert!(validate_config(&ShiftConfig::default().with_hop_length(2048)).is_err());
        assert!(validate_config(&ShiftConfig::default().with_max_semitones(f64::NAN)).is_err());
        assert!(validate_config(&ShiftConfig::default().with_max_semitones(60.0)).is_err());
    }

    #[test]
    fn test_frame_fit() {
        let config = ShiftConfig::default();
        assert!(validate_frame_fit(&buffer(2048), &config).is_ok());
        assert!(matches!(
            validate_frame_fit(&buffer(2047), &config),
            Err(ShiftError::UnsupportedParameters(_))
        ));
    }

    #[test]
    fn test_validate_all_orders_checks() {
        // Empty buffer wins over an out-of-range shift
        let err = validate_all(
            &AudioBuffer::new(vec![], 16000),
            &PitchShiftRequest::new(100.0),
            &ShiftConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ShiftError::InvalidInput(_)));

        // Out-of-range shift wins over a short buffer
        let err = validate_all(
            &buffer(10),
            &PitchShiftRequest::new(100.0),
            &ShiftConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ShiftError::UnsupportedParameters(msg) if msg.contains("semitone")));
    }
}
