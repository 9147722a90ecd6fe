//! Spectral measurements used to verify and report on shifted audio.

pub mod frequency;
