//! Fingerprint result types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::encoding;
use super::metadata::FingerprintMetadata;
use crate::error::FingerprintError;

/// One `(time offset, hash)` entry of a fingerprint
///
/// Ordered by time offset, then hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodeEntry {
    /// Anchor frame index (plus request start offset)
    pub time_offset: u32,

    /// Quantized landmark hash
    pub hash: u32,
}

/// Assembled fingerprint: sorted, duplicate-free landmark entries plus header
///
/// Immutable once built. [`FingerprintCode::to_code_string`] gives the
/// printable form; [`FingerprintCode::parse`] reads it back.
///
/// Deserialization goes through [`FingerprintCode::from_sorted_entries`], so
/// a persisted code is checked the same way as a freshly assembled one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFingerprintCode")]
pub struct FingerprintCode {
    version: u8,
    duration_frames: u32,
    entries: Vec<CodeEntry>,
}

/// Unchecked serde shape of [`FingerprintCode`]
#[derive(Deserialize)]
struct RawFingerprintCode {
    version: u8,
    duration_frames: u32,
    entries: Vec<CodeEntry>,
}

impl TryFrom<RawFingerprintCode> for FingerprintCode {
    type Error = FingerprintError;

    fn try_from(raw: RawFingerprintCode) -> Result<Self, Self::Error> {
        Self::from_sorted_entries(raw.version, raw.duration_frames, raw.entries)
            .map_err(|e| FingerprintError::MalformedCode(e.to_string()))
    }
}

impl FingerprintCode {
    /// Build a code from entries that are already sorted and unique
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariantViolation` if `entries` is not strictly
    /// increasing in `(time_offset, hash)` or a hash exceeds 24 bits.
    pub fn from_sorted_entries(
        version: u8,
        duration_frames: u32,
        entries: Vec<CodeEntry>,
    ) -> Result<Self, FingerprintError> {
        if let Some(pair) = entries.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(FingerprintError::InternalInvariantViolation(format!(
                "Entries not strictly ordered: {:?} before {:?}",
                pair[0], pair[1]
            )));
        }
        if let Some(entry) = entries.iter().find(|e| e.hash > encoding::MAX_ENCODED_HASH) {
            return Err(FingerprintError::InternalInvariantViolation(format!(
                "Hash {:#x} does not fit the encoded width",
                entry.hash
            )));
        }

        Ok(Self {
            version,
            duration_frames,
            entries,
        })
    }

    /// Format version of the configuration that produced the code
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Number of analysis frames in the source audio
    pub fn duration_frames(&self) -> u32 {
        self.duration_frames
    }

    /// Sorted, unique landmark entries
    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no landmark survived (valid for silent or very short audio)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entry hashes in entry order
    pub fn hashes(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|entry| entry.hash)
    }

    /// Printable form: `<version><duration><payload>`
    pub fn to_code_string(&self) -> String {
        encoding::encode(self)
    }

    /// Decode a printable code
    ///
    /// # Errors
    ///
    /// Returns `MalformedCode` if the header, the alphabet, or the packed
    /// entries are invalid.
    pub fn parse(code: &str) -> Result<Self, FingerprintError> {
        encoding::decode(code)
    }
}

impl fmt::Display for FingerprintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code_string())
    }
}

impl FromStr for FingerprintCode {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Fingerprint plus diagnostics about how it was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintResult {
    /// The assembled fingerprint
    pub code: FingerprintCode,

    /// Pipeline statistics
    pub metadata: FingerprintMetadata,
}
