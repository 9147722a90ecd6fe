//! Core types, window functions, spectrum transform, and resampling.

pub mod fft;
pub mod resample;
pub mod types;
pub mod window;

pub use types::*;
pub use window::{hann_window, kaiser_window};
