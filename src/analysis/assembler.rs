//! Fingerprint code assembly
//!
//! Collects `(time offset, hash)` pairs from the landmark stream, removes
//! exact duplicates and orders them by time offset (ties by hash). Assembly
//! performs no analysis; it fails only when a bound that earlier stages
//! guarantee turns out to be broken.
//!
//! # Example
//!
//! ```
//! use stratum_fingerprint::analysis::assembler::assemble;
//! use stratum_fingerprint::FingerprintConfig;
//!
//! let config = FingerprintConfig::default();
//! let code = assemble(Vec::new(), 1, &config)?;
//! assert!(code.is_empty());
//! assert_eq!(code.to_code_string(), "0100000001");
//! # Ok::<(), stratum_fingerprint::FingerprintError>(())
//! ```

use super::result::{CodeEntry, FingerprintCode};
use crate::config::FingerprintConfig;
use crate::error::FingerprintError;
use crate::features::landmarks::Landmark;

/// Incremental code builder
#[derive(Debug, Clone)]
pub struct CodeAssembler {
    version: u8,
    max_hash: u32,
    max_entries_per_frame: usize,
    entries: Vec<CodeEntry>,
    landmark_count: usize,
}

impl CodeAssembler {
    /// Create an assembler for codes produced under `config`
    pub fn new(config: &FingerprintConfig) -> Self {
        let max_hash = ((1u64 << config.hash_bits().min(32)) - 1) as u32;
        Self {
            version: config.format_version(),
            max_hash,
            max_entries_per_frame: config.max_peaks_per_frame.saturating_mul(config.fan_out),
            entries: Vec::new(),
            landmark_count: 0,
        }
    }

    /// Add one landmark
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariantViolation` if the hash exceeds the
    /// configured width.
    pub fn push(&mut self, landmark: &Landmark) -> Result<(), FingerprintError> {
        if landmark.hash > self.max_hash {
            return Err(FingerprintError::InternalInvariantViolation(format!(
                "Landmark hash {:#x} exceeds configured maximum {:#x}",
                landmark.hash, self.max_hash
            )));
        }

        self.entries.push(CodeEntry {
            time_offset: landmark.time_offset,
            hash: landmark.hash,
        });
        self.landmark_count += 1;
        Ok(())
    }

    /// Landmarks pushed so far (duplicates included)
    pub fn landmark_count(&self) -> usize {
        self.landmark_count
    }

    /// Sort, deduplicate and seal the code
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariantViolation` if the entry count exceeds what
    /// `duration_frames` frames can produce, or the duration overflows the
    /// header field.
    pub fn finish(mut self, duration_frames: usize) -> Result<FingerprintCode, FingerprintError> {
        self.entries.sort_unstable();
        self.entries.dedup();

        let bound = duration_frames.saturating_mul(self.max_entries_per_frame);
        if self.entries.len() > bound {
            return Err(FingerprintError::InternalInvariantViolation(format!(
                "{} entries exceed the bound of {} for {} frames",
                self.entries.len(),
                bound,
                duration_frames
            )));
        }

        let duration = u32::try_from(duration_frames).map_err(|_| {
            FingerprintError::InternalInvariantViolation(format!(
                "Duration of {} frames does not fit the header",
                duration_frames
            ))
        })?;

        if self.entries.is_empty() {
            log::warn!(
                "No landmarks in {} frames; emitting an empty fingerprint",
                duration_frames
            );
        }

        log::debug!(
            "Assembled {} unique entries from {} landmarks",
            self.entries.len(),
            self.landmark_count
        );

        FingerprintCode::from_sorted_entries(self.version, duration, self.entries)
    }
}

/// Assemble a complete landmark stream in one call
pub fn assemble<I>(
    landmarks: I,
    duration_frames: usize,
    config: &FingerprintConfig,
) -> Result<FingerprintCode, FingerprintError>
where
    I: IntoIterator<Item = Landmark>,
{
    let mut assembler = CodeAssembler::new(config);
    for landmark in landmarks {
        assembler.push(&landmark)?;
    }
    assembler.finish(duration_frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::peaks::Peak;

    fn landmark(time_offset: u32, hash: u32) -> Landmark {
        let peak = Peak {
            frame_index: time_offset as usize,
            bin: 10,
            magnitude: 1.0,
        };
        Landmark {
            anchor: peak,
            target: Peak {
                frame_index: peak.frame_index + 1,
                ..peak
            },
            hash,
            time_offset,
        }
    }

    #[test]
    fn test_sorts_and_dedups() {
        let config = FingerprintConfig::default();
        let input = vec![
            landmark(5, 2),
            landmark(1, 9),
            landmark(5, 1),
            landmark(1, 9),
            landmark(1, 3),
        ];

        let code = assemble(input, 10, &config).unwrap();
        let entries: Vec<(u32, u32)> = code
            .entries()
            .iter()
            .map(|e| (e.time_offset, e.hash))
            .collect();
        assert_eq!(entries, vec![(1, 3), (1, 9), (5, 1), (5, 2)]);
        assert_eq!(code.duration_frames(), 10);
        assert_eq!(code.version(), 1);
    }

    #[test]
    fn test_counts_landmarks_before_dedup() {
        let config = FingerprintConfig::default();
        let mut assembler = CodeAssembler::new(&config);
        for _ in 0..3 {
            assembler.push(&landmark(0, 7)).unwrap();
        }
        assert_eq!(assembler.landmark_count(), 3);
        assert_eq!(assembler.finish(1).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_stream_is_valid() {
        let config = FingerprintConfig::default();
        let code = assemble(Vec::new(), 0, &config).unwrap();
        assert!(code.is_empty());
        assert_eq!(code.to_code_string(), "0100000000");
    }

    #[test]
    fn test_rejects_oversized_hash() {
        let config = FingerprintConfig::default();
        let result = assemble(vec![landmark(0, 1 << 20)], 1, &config);
        assert!(matches!(
            result,
            Err(FingerprintError::InternalInvariantViolation(_))
        ));
    }

    #[test]
    fn test_rejects_entries_beyond_duration_bound() {
        let config = FingerprintConfig {
            max_peaks_per_frame: 1,
            fan_out: 1,
            ..FingerprintConfig::default()
        };
        let result = assemble(vec![landmark(0, 1), landmark(0, 2)], 1, &config);
        assert!(matches!(
            result,
            Err(FingerprintError::InternalInvariantViolation(_))
        ));
    }
}
