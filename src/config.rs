//! Configuration parameters for fingerprint generation
//!
//! Every field except `parallel` changes the produced codes. Fingerprints
//! generated under different parameter sets carry different format versions
//! and must never be compared with each other.

use crate::error::FingerprintError;
use serde::{Deserialize, Serialize};

/// Format version of codes produced with the default analysis parameters
pub const FORMAT_VERSION: u8 = 1;

/// Maximum total hash width in bits (each hash is packed into 3 bytes)
pub const MAX_HASH_BITS: u32 = 24;

/// Fingerprint configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    // Input
    /// Sample rate the caller must supply audio at (default: 11025)
    /// Audio at any other rate is a caller error; nothing is resampled.
    pub sample_rate: u32,

    // Spectral analysis
    /// Transform window length in samples (default: 1024)
    /// Also the minimum number of samples a request must contain.
    pub fft_size: usize,

    /// Hop between consecutive windows in samples (default: 256, 75% overlap)
    pub hop_size: usize,

    // Peak extraction
    /// Lowest frequency bin considered for peaks (default: 2)
    /// Skips DC and sub-audio rumble.
    pub min_bin: usize,

    /// Half-width of the local-maximum neighborhood in bins (default: 3)
    pub neighborhood_radius: usize,

    /// Maximum peaks retained per frame (default: 5)
    pub max_peaks_per_frame: usize,

    /// Absolute magnitude floor (default: 0.05)
    pub min_magnitude: f32,

    /// A peak must exceed the frame's mean magnitude times this (default: 3.0)
    pub mean_factor: f32,

    /// A peak must be within this many dB of the frame maximum (default: -30.0)
    pub relative_floor_db: f32,

    // Landmark pairing
    /// Smallest anchor-to-target frame distance (default: 1)
    pub min_frame_delta: usize,

    /// Largest anchor-to-target frame distance (default: 31)
    pub max_frame_delta: usize,

    /// Largest absolute anchor-to-target bin distance (default: 63)
    pub max_bin_delta: usize,

    /// Maximum targets paired with one anchor (default: 8)
    pub fan_out: usize,

    // Hash layout
    /// Bits used for the quantized anchor bin (default: 8)
    pub anchor_bits: u32,

    /// Bits used for the quantized bin delta (default: 7)
    pub bin_delta_bits: u32,

    /// Bits used for the quantized frame delta (default: 5)
    pub frame_delta_bits: u32,

    // Execution
    /// Run per-window transforms on the rayon pool (default: false)
    /// Output is identical either way.
    pub parallel: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            sample_rate: 11025,
            fft_size: 1024,
            hop_size: 256,
            min_bin: 2,
            neighborhood_radius: 3,
            max_peaks_per_frame: 5,
            min_magnitude: 0.05,
            mean_factor: 3.0,
            relative_floor_db: -30.0,
            min_frame_delta: 1,
            max_frame_delta: 31,
            max_bin_delta: 63,
            fan_out: 8,
            anchor_bits: 8,
            bin_delta_bits: 7,
            frame_delta_bits: 5,
            parallel: false,
        }
    }
}

impl FingerprintConfig {
    /// Number of magnitude bins per spectral frame
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Total hash width in bits
    pub fn hash_bits(&self) -> u32 {
        self.anchor_bits + self.bin_delta_bits + self.frame_delta_bits
    }

    /// Frequency resolution of one bin in Hz
    pub fn bin_resolution_hz(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Number of full windows that fit into `num_samples`
    pub fn frame_count(&self, num_samples: usize) -> usize {
        if num_samples < self.fft_size || self.hop_size == 0 {
            return 0;
        }
        (num_samples - self.fft_size) / self.hop_size + 1
    }

    /// Format version written into every code header
    ///
    /// The default analysis parameters map to [`FORMAT_VERSION`]. Any other
    /// parameter set maps to a derived version in `0x80..=0xFF`.
    pub fn format_version(&self) -> u8 {
        let defaults = FingerprintConfig {
            parallel: self.parallel,
            ..FingerprintConfig::default()
        };
        if *self == defaults {
            return FORMAT_VERSION;
        }
        0x80 | (self.parameter_digest() & 0x7f) as u8
    }

    /// FNV-1a over every output-affecting parameter
    fn parameter_digest(&self) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let words: [u64; 16] = [
            self.sample_rate as u64,
            self.fft_size as u64,
            self.hop_size as u64,
            self.min_bin as u64,
            self.neighborhood_radius as u64,
            self.max_peaks_per_frame as u64,
            self.min_magnitude.to_bits() as u64,
            self.mean_factor.to_bits() as u64,
            self.relative_floor_db.to_bits() as u64,
            self.min_frame_delta as u64,
            self.max_frame_delta as u64,
            self.max_bin_delta as u64,
            self.fan_out as u64,
            self.anchor_bits as u64,
            self.bin_delta_bits as u64,
            self.frame_delta_bits as u64,
        ];

        let mut hash = FNV_OFFSET;
        for byte in words.iter().flat_map(|w| w.to_le_bytes()) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    /// Check that the parameters describe a usable pipeline
    ///
    /// # Errors
    ///
    /// Returns `FingerprintError::InvalidInput` naming the first bad parameter.
    pub fn validate(&self) -> Result<(), FingerprintError> {
        let invalid = |msg: String| Err(FingerprintError::InvalidInput(msg));

        if self.sample_rate == 0 {
            return invalid("Sample rate must be > 0".to_string());
        }
        if self.fft_size < 4 || self.fft_size % 2 != 0 {
            return invalid(format!(
                "FFT size must be an even number >= 4, got {}",
                self.fft_size
            ));
        }
        if self.hop_size == 0 || self.hop_size > self.fft_size {
            return invalid(format!(
                "Hop size must be in [1, {}], got {}",
                self.fft_size, self.hop_size
            ));
        }
        if self.min_bin >= self.num_bins() - 1 {
            return invalid(format!(
                "Minimum bin {} leaves no searchable spectrum ({} bins)",
                self.min_bin,
                self.num_bins()
            ));
        }
        if self.max_peaks_per_frame == 0 {
            return invalid("At least one peak per frame must be retained".to_string());
        }
        if !self.min_magnitude.is_finite()
            || !self.mean_factor.is_finite()
            || !self.relative_floor_db.is_finite()
        {
            return invalid("Peak thresholds must be finite".to_string());
        }
        if self.min_frame_delta == 0 {
            return invalid("Minimum frame delta must be >= 1".to_string());
        }
        if self.min_frame_delta > self.max_frame_delta {
            return invalid(format!(
                "Invalid frame delta range: min={}, max={}",
                self.min_frame_delta, self.max_frame_delta
            ));
        }
        if self.fan_out == 0 {
            return invalid("Fan-out must be > 0".to_string());
        }
        if self.anchor_bits == 0 || self.bin_delta_bits == 0 || self.frame_delta_bits == 0 {
            return invalid("Hash field widths must be > 0".to_string());
        }
        if self.hash_bits() > MAX_HASH_BITS {
            return invalid(format!(
                "Hash width {} exceeds {} bits",
                self.hash_bits(),
                MAX_HASH_BITS
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FingerprintConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_bins(), 513);
        assert_eq!(config.hash_bits(), 20);
    }

    #[test]
    fn test_default_format_version() {
        assert_eq!(FingerprintConfig::default().format_version(), FORMAT_VERSION);

        // Execution mode does not change the output format
        let parallel = FingerprintConfig {
            parallel: true,
            ..FingerprintConfig::default()
        };
        assert_eq!(parallel.format_version(), FORMAT_VERSION);
    }

    #[test]
    fn test_custom_config_gets_derived_version() {
        let config = FingerprintConfig {
            fan_out: 4,
            ..FingerprintConfig::default()
        };
        let version = config.format_version();
        assert!(version >= 0x80, "derived version should be >= 0x80, got {}", version);
        assert_eq!(version, config.clone().format_version());
    }

    #[test]
    fn test_frame_count() {
        let config = FingerprintConfig::default();
        assert_eq!(config.frame_count(0), 0);
        assert_eq!(config.frame_count(1023), 0);
        assert_eq!(config.frame_count(1024), 1);
        assert_eq!(config.frame_count(1024 + 255), 1);
        assert_eq!(config.frame_count(1024 + 256), 2);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let bad = [
            FingerprintConfig { fft_size: 1023, ..Default::default() },
            FingerprintConfig { hop_size: 0, ..Default::default() },
            FingerprintConfig { hop_size: 2048, ..Default::default() },
            FingerprintConfig { max_peaks_per_frame: 0, ..Default::default() },
            FingerprintConfig { min_frame_delta: 0, ..Default::default() },
            FingerprintConfig { min_frame_delta: 10, max_frame_delta: 5, ..Default::default() },
            FingerprintConfig { fan_out: 0, ..Default::default() },
            FingerprintConfig { anchor_bits: 16, ..Default::default() },
            FingerprintConfig { min_bin: 600, ..Default::default() },
            FingerprintConfig { mean_factor: f32::NAN, ..Default::default() },
        ];

        for config in bad.iter() {
            assert!(
                matches!(config.validate(), Err(FingerprintError::InvalidInput(_))),
                "config should be rejected: {:?}",
                config
            );
        }
    }
}
