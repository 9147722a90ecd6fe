//! Engine configuration: framing, bounds, resampler choice, and the
//! presets that mirror how the tool is deployed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::Algorithm;
use crate::error::ShiftError;

/// Default FFT size.
pub const DEFAULT_N_FFT: usize = 2048;
/// Default hop, a quarter of the FFT size.
pub const DEFAULT_HOP_LENGTH: usize = DEFAULT_N_FFT / 4;
/// Default bound on the absolute semitone shift.
pub const DEFAULT_MAX_SEMITONES: f64 = 24.0;

/// Resampler used to bring the stretched signal back to the input length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResamplerKind {
    /// Band-limited polyphase FIR.
    #[default]
    Polyphase,
    /// Linear interpolation, no anti-aliasing.
    Linear,
}

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// 2048/512 framing with polyphase resampling. Best quality.
    Studio,
    /// 512/128 framing with linear resampling, for small servers and
    /// 16 kHz speech.
    LowMemory,
}

impl Profile {
    /// Canonical preset name.
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Studio => "studio",
            Profile::LowMemory => "low-memory",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "studio" | "hq" => Ok(Profile::Studio),
            "low-memory" | "low_memory" | "lowmem" | "web" => Ok(Profile::LowMemory),
            other => Err(ShiftError::Config(format!(
                "unknown profile '{}' (use studio or low-memory)",
                other
            ))),
        }
    }
}

/// Parameters controlling a pitch-shift operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    /// FFT window size in samples (default: 2048).
    pub n_fft: usize,
    /// Hop between analysis frames (default: n_fft / 4).
    pub hop_length: usize,
    /// Largest accepted |semitones| (default: 24).
    pub max_semitones: f64,
    /// Algorithm used when a request does not override it.
    pub algorithm: Algorithm,
    /// Resampler for the final step of the phase-vocoder path.
    pub resampler: ResamplerKind,
    /// Scale the output so its RMS matches the input.
    pub normalize: bool,
    /// Abort on non-finite spectra instead of zeroing the bad bins.
    pub strict_numerics: bool,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            n_fft: DEFAULT_N_FFT,
            hop_length: DEFAULT_HOP_LENGTH,
            max_semitones: DEFAULT_MAX_SEMITONES,
            algorithm: Algorithm::default(),
            resampler: ResamplerKind::default(),
            normalize: false,
            strict_numerics: false,
        }
    }
}

impl fmt::Display for ShiftConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_fft={}, hop={}, max_semitones={}, algorithm={}, resampler={:?}, normalize={}, strict_numerics={}",
            self.n_fft,
            self.hop_length,
            self.max_semitones,
            self.algorithm,
            self.resampler,
            self.normalize,
            self.strict_numerics
        )
    }
}

impl ShiftConfig {
    /// Creates a config from a preset.
    pub fn from_profile(profile: Profile) -> Self {
        let base = Self::default();
        match profile {
            Profile::Studio => base,
            Profile::LowMemory => Self {
                n_fft: 512,
                hop_length: 128,
                resampler: ResamplerKind::Linear,
                ..base
            },
        }
    }

    /// Set the FFT size. The hop follows at a quarter of it.
    pub fn with_n_fft(mut self, n_fft: usize) -> Self {
        self.n_fft = n_fft;
        self.hop_length = (n_fft / 4).max(1);
        self
    }

    /// Set the hop length.
    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }

    /// Set the semitone bound.
    pub fn with_max_semitones(mut self, max_semitones: f64) -> Self {
        self.max_semitones = max_semitones;
        self
    }

    /// Set the default algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the resampler.
    pub fn with_resampler(mut self, resampler: ResamplerKind) -> Self {
        self.resampler = resampler;
        self
    }

    /// Enable or disable RMS normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Enable or disable strict numerics.
    pub fn with_strict_numerics(mut self, strict: bool) -> Self {
        self.strict_numerics = strict;
        self
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// A `profile = "..."` key selects the base preset the other keys
    /// override.
    pub fn from_toml_str(text: &str) -> Result<Self, ShiftError> {
        let value: toml::Table = toml::from_str(text)?;
        let base = match value.get("profile") {
            Some(toml::Value::String(name)) => Self::from_profile(name.parse()?),
            Some(other) => {
                return Err(ShiftError::Config(format!(
                    "profile must be a string, got {}",
                    other.type_str()
                )))
            }
            None => Self::default(),
        };

        let mut merged = match toml::Value::try_from(&base) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => toml::Table::new(),
            Err(e) => return Err(ShiftError::Config(e.to_string())),
        };
        let mut overrides = value;
        overrides.remove("profile");
        merged.extend(overrides);

        let config: Self = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShiftError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}
