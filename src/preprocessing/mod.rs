//! Input preprocessing
//!
//! This module prepares caller audio for analysis:
//! - Sample conditioning (validation, `i16` normalization)
//! - Channel mixing (multi-channel to mono)

pub mod channel_mixer;
pub mod conditioner;

pub use conditioner::{condition_i16_samples, condition_samples, SampleBuffer};
