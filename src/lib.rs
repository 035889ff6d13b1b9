//! # Stratum Fingerprint
//!
//! Landmark-based acoustic fingerprinting: turns a buffer of mono PCM samples
//! into a compact printable code that survives moderate noise, lossy
//! compression and small time/pitch perturbations.
//!
//! ## Features
//!
//! - **Spectral Analysis**: Hann-windowed STFT with configurable overlap, sequential or on the rayon pool
//! - **Peak Extraction**: Local maxima above an energy-adaptive noise floor, capped per frame
//! - **Landmark Hashing**: Anchor/target peak pairs quantized into fixed-width hashes
//! - **Compact Codes**: Delta-packed entries in URL-safe base64 behind a version/duration header
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_fingerprint::{generate_fingerprint, FingerprintConfig};
//!
//! // Mono f32 samples at 11025 Hz, normalized to [-1.0, 1.0]
//! let samples: Vec<f32> = vec![]; // Your audio data
//!
//! let code = generate_fingerprint(&samples, samples.len() as i64, &FingerprintConfig::default())?;
//! println!("{} landmarks: {}", code.len(), code);
//! # Ok::<(), stratum_fingerprint::FingerprintError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Samples → Conditioner → Spectral Analyzer → Peak Extractor → Landmark Hasher → Code Assembler
//! ```
//!
//! Each stage lives in its own module and can be driven on its own; see
//! [`Fingerprinter`] for the composed pipeline.
//!
//! ## Compatibility
//!
//! Every analysis parameter in [`FingerprintConfig`] affects the output, and
//! the code header records a format version derived from them. Codes with
//! different versions are never comparable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod fingerprinter;
pub mod preprocessing;

// Re-export main types
pub use analysis::metadata::FingerprintMetadata;
pub use analysis::result::{CodeEntry, FingerprintCode, FingerprintResult};
pub use config::{FingerprintConfig, FORMAT_VERSION};
pub use error::FingerprintError;
pub use fingerprinter::Fingerprinter;

/// Main fingerprint function
///
/// Validates the input, runs the full pipeline and returns the assembled code.
///
/// # Arguments
///
/// * `samples` - Mono audio samples at `config.sample_rate`, normalized to [-1.0, 1.0]
/// * `sample_count` - Number of leading samples to fingerprint
/// * `config` - Fingerprint configuration
///
/// # Errors
///
/// - `InvalidInput` if `sample_count` is zero, negative, larger than the
///   buffer, or shorter than one analysis window, or if `config` is invalid
/// - `CorruptSamples` if a sample is NaN or infinite
///
/// # Example
///
/// ```
/// use stratum_fingerprint::{generate_fingerprint, FingerprintConfig};
///
/// let samples = vec![0.0f32; 1024]; // one window of silence
/// let code = generate_fingerprint(&samples, 1024, &FingerprintConfig::default())?;
/// assert!(code.is_empty());
/// assert_eq!(code.to_code_string(), "0100000001");
/// # Ok::<(), stratum_fingerprint::FingerprintError>(())
/// ```
pub fn generate_fingerprint(
    samples: &[f32],
    sample_count: i64,
    config: &FingerprintConfig,
) -> Result<FingerprintCode, FingerprintError> {
    Fingerprinter::new(config.clone())?.generate(samples, sample_count)
}

/// Fingerprint signed 16-bit PCM
///
/// Samples are normalized by `i16::MAX` before analysis; otherwise identical
/// to [`generate_fingerprint`].
pub fn generate_fingerprint_i16(
    samples: &[i16],
    sample_count: i64,
    config: &FingerprintConfig,
) -> Result<FingerprintCode, FingerprintError> {
    Fingerprinter::new(config.clone())?.generate_i16(samples, sample_count)
}

/// Fingerprint with the default configuration and return the printable code
///
/// # Errors
///
/// Same as [`generate_fingerprint`].
pub fn code_string(samples: &[f32], sample_count: i64) -> Result<String, FingerprintError> {
    generate_fingerprint(samples, sample_count, &FingerprintConfig::default())
        .map(|code| code.to_code_string())
}
