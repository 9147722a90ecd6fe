pub mod params;
pub mod phase_vocoder;
pub mod stft;

pub use phase_vocoder::{PhaseAccumulator, PhaseVocoder};
pub use stft::{Framer, OverlapAdd};
