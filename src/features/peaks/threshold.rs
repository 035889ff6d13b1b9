//! Adaptive noise-floor threshold for peak picking
//!
//! A single absolute threshold either drowns quiet passages or lets noise
//! through in loud ones. The threshold here follows the frame's own energy:
//!
//! `threshold = max(min_magnitude, mean * mean_factor, max * 10^(floor_db / 20))`

/// Per-frame threshold parameters
#[derive(Debug, Clone, Copy)]
pub struct ThresholdParams {
    /// Absolute magnitude floor
    pub min_magnitude: f32,
    /// Multiplier applied to the frame mean
    pub mean_factor: f32,
    /// Floor relative to the frame maximum, in dB (negative)
    pub relative_floor_db: f32,
}

/// Convert a dB ratio to a linear amplitude factor
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Compute the noise-floor threshold for one frame of magnitudes
///
/// An empty frame yields `min_magnitude`.
pub fn frame_threshold(magnitudes: &[f32], params: &ThresholdParams) -> f32 {
    if magnitudes.is_empty() {
        return params.min_magnitude;
    }

    let sum: f32 = magnitudes.iter().sum();
    let mean = sum / magnitudes.len() as f32;
    let max = magnitudes.iter().copied().fold(0.0f32, f32::max);

    params
        .min_magnitude
        .max(mean * params.mean_factor)
        .max(max * db_to_linear(params.relative_floor_db))
}
