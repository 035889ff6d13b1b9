//! Sample conditioning
//!
//! Validates the caller's buffer and declared sample count before any
//! analysis runs. Conditioning never resamples and never changes gain: audio
//! at the wrong sample rate is a caller error.
//!
//! # Example
//!
//! ```
//! use stratum_fingerprint::preprocessing::conditioner::condition_samples;
//! use stratum_fingerprint::FingerprintConfig;
//!
//! let config = FingerprintConfig::default();
//! let samples = vec![0.0f32; 2048];
//! let buffer = condition_samples(&samples, 2048, &config)?;
//! assert_eq!(buffer.len(), 2048);
//! # Ok::<(), stratum_fingerprint::FingerprintError>(())
//! ```

use std::borrow::Cow;

use crate::config::FingerprintConfig;
use crate::error::FingerprintError;

/// Validated mono samples at the configured sample rate
#[derive(Debug, Clone)]
pub struct SampleBuffer<'a> {
    samples: Cow<'a, [f32]>,
    sample_rate: u32,
}

impl<'a> SampleBuffer<'a> {
    /// Samples covered by the request
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate the samples are assumed to be at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a conditioned buffer
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Validate `f32` samples and borrow the first `sample_count` of them
///
/// # Arguments
///
/// * `samples` - Mono samples, nominally in [-1.0, 1.0]
/// * `sample_count` - Number of samples the caller declares as valid
/// * `config` - Pipeline configuration (supplies the minimum window)
///
/// # Errors
///
/// - `InvalidInput` if `sample_count` is zero, negative, larger than the
///   buffer, or smaller than `config.fft_size`
/// - `CorruptSamples` if any covered sample is NaN or infinite
pub fn condition_samples<'a>(
    samples: &'a [f32],
    sample_count: i64,
    config: &FingerprintConfig,
) -> Result<SampleBuffer<'a>, FingerprintError> {
    let count = checked_count(samples.len(), sample_count, config)?;
    let samples = &samples[..count];
    check_finite(samples)?;

    log::debug!(
        "Conditioned {} samples ({:.2}s at {} Hz)",
        count,
        count as f32 / config.sample_rate as f32,
        config.sample_rate
    );

    Ok(SampleBuffer {
        samples: Cow::Borrowed(samples),
        sample_rate: config.sample_rate,
    })
}

/// Normalize signed 16-bit PCM into [-1.0, 1.0] and validate it
///
/// Samples are divided by `i16::MAX`, so `i16::MIN` maps slightly below -1.0.
///
/// # Errors
///
/// Same count checks as [`condition_samples`]. Integer input cannot be
/// non-finite, so `CorruptSamples` is never returned.
pub fn condition_i16_samples(
    samples: &[i16],
    sample_count: i64,
    config: &FingerprintConfig,
) -> Result<SampleBuffer<'static>, FingerprintError> {
    let count = checked_count(samples.len(), sample_count, config)?;
    let normalized: Vec<f32> = samples[..count]
        .iter()
        .map(|&s| s as f32 / i16::MAX as f32)
        .collect();

    log::debug!("Normalized {} i16 samples to f32", count);

    Ok(SampleBuffer {
        samples: Cow::Owned(normalized),
        sample_rate: config.sample_rate,
    })
}

fn checked_count(
    available: usize,
    sample_count: i64,
    config: &FingerprintConfig,
) -> Result<usize, FingerprintError> {
    if sample_count <= 0 {
        return Err(FingerprintError::InvalidInput(format!(
            "Sample count must be positive, got {}",
            sample_count
        )));
    }

    let count = usize::try_from(sample_count).map_err(|_| {
        FingerprintError::InvalidInput(format!(
            "Sample count {} does not fit in memory",
            sample_count
        ))
    })?;

    if count > available {
        return Err(FingerprintError::InvalidInput(format!(
            "Sample count {} exceeds buffer length {}",
            count, available
        )));
    }

    if count < config.fft_size {
        return Err(FingerprintError::InvalidInput(format!(
            "Need at least {} samples for one analysis window, got {}",
            config.fft_size, count
        )));
    }

    Ok(count)
}

fn check_finite(samples: &[f32]) -> Result<(), FingerprintError> {
    match samples.iter().position(|s| !s.is_finite()) {
        Some(index) => Err(FingerprintError::CorruptSamples(format!(
            "Non-finite sample {} at index {}",
            samples[index], index
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FingerprintConfig {
        FingerprintConfig::default()
    }

    #[test]
    fn test_accepts_minimum_window() {
        let samples = vec![0.0f32; 1024];
        let buffer = condition_samples(&samples, 1024, &config()).unwrap();
        assert_eq!(buffer.len(), 1024);
        assert_eq!(buffer.sample_rate(), 11025);
        assert!(matches!(buffer.samples, Cow::Borrowed(_)));
    }

    #[test]
    fn test_uses_declared_prefix() {
        let samples = vec![0.25f32; 4096];
        let buffer = condition_samples(&samples, 2000, &config()).unwrap();
        assert_eq!(buffer.len(), 2000);
    }

    #[test]
    fn test_rejects_zero_and_negative_count() {
        let samples = vec![0.0f32; 4096];
        for count in [0, -1, i64::MIN] {
            let result = condition_samples(&samples, count, &config());
            assert!(
                matches!(result, Err(FingerprintError::InvalidInput(_))),
                "count {} should be rejected",
                count
            );
        }
    }

    #[test]
    fn test_rejects_undersized_and_oversized_count() {
        let samples = vec![0.0f32; 4096];
        assert!(matches!(
            condition_samples(&samples, 1023, &config()),
            Err(FingerprintError::InvalidInput(_))
        ));
        assert!(matches!(
            condition_samples(&samples, 4097, &config()),
            Err(FingerprintError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut samples = vec![0.0f32; 2048];
        samples[700] = f32::NAN;
        let err = condition_samples(&samples, 2048, &config()).unwrap_err();
        assert!(matches!(err, FingerprintError::CorruptSamples(_)));
        assert!(err.to_string().contains("700"));

        samples[700] = f32::INFINITY;
        assert!(matches!(
            condition_samples(&samples, 2048, &config()),
            Err(FingerprintError::CorruptSamples(_))
        ));
    }

    #[test]
    fn test_non_finite_outside_count_is_ignored() {
        let mut samples = vec![0.0f32; 2048];
        samples[2000] = f32::NAN;
        assert!(condition_samples(&samples, 1500, &config()).is_ok());
    }

    #[test]
    fn test_i16_normalization() {
        let mut samples = vec![0i16; 1024];
        samples[0] = i16::MAX;
        samples[1] = -16384;
        let buffer = condition_i16_samples(&samples, 1024, &config()).unwrap();
        assert!((buffer.samples()[0] - 1.0).abs() < 1e-6);
        assert!((buffer.samples()[1] + 0.5).abs() < 1e-3);
        assert_eq!(buffer.samples()[2], 0.0);
    }
}
