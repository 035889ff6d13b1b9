//! Fingerprint generation metadata

use serde::{Deserialize, Serialize};

/// Statistics gathered while generating one fingerprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Spectral frames analyzed
    pub frame_count: usize,

    /// Peaks retained across all frames
    pub peak_count: usize,

    /// Landmarks hashed (before deduplication)
    pub landmark_count: usize,

    /// Entries in the final code (after deduplication)
    pub entry_count: usize,

    /// Format version written to the code header
    pub format_version: u8,

    /// Whether the analyzer ran on the rayon pool
    pub parallel: bool,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Library version
    pub algorithm_version: String,
}
