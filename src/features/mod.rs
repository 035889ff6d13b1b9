//! Feature extraction modules
//!
//! This module contains the analysis stages of the pipeline:
//! - Windowed spectral analysis (STFT magnitudes)
//! - Peak extraction
//! - Landmark pairing and hashing

pub mod landmarks;
pub mod peaks;
pub mod spectral;
