//! Tapering windows for the spectral analyzer

/// Symmetric Hann window of `size` coefficients
///
/// `w[k] = 0.5 * (1 - cos(2πk / (N - 1)))`. A size of 1 yields `[1.0]`.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }

    let denom = (size - 1) as f32;
    (0..size)
        .map(|k| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * k as f32 / denom).cos()))
        .collect()
}
