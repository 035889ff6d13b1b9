//! Hash quantization and packing
//!
//! A landmark hash packs three quantized fields, most significant first:
//!
//! ```text
//! | anchor bin level | bin delta level | frame delta level |
//! |   anchor_bits    | bin_delta_bits  | frame_delta_bits  |
//! ```
//!
//! The bin delta is shifted by `max_bin_delta` and the frame delta by
//! `min_frame_delta` so both start at zero before quantization.

use crate::config::FingerprintConfig;

/// Reduce `value` in `[0, range)` to one of `2^bits` levels
///
/// `level = value * 2^bits / range`, clamped to the top level. When the range
/// has fewer values than there are levels, distinct values stay distinct.
pub fn quantize(value: usize, range: usize, bits: u32) -> u32 {
    let levels = 1u64 << bits;
    if range == 0 {
        return 0;
    }
    let level = (value as u64 * levels) / range as u64;
    level.min(levels - 1) as u32
}

/// Quantized fields of one hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashFields {
    /// Quantized anchor bin
    pub anchor: u32,
    /// Quantized (shifted) bin delta
    pub bin_delta: u32,
    /// Quantized (shifted) frame delta
    pub frame_delta: u32,
}

/// Bit layout and value ranges of landmark hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashLayout {
    num_bins: usize,
    max_bin_delta: usize,
    min_frame_delta: usize,
    max_frame_delta: usize,
    anchor_bits: u32,
    bin_delta_bits: u32,
    frame_delta_bits: u32,
}

impl HashLayout {
    /// Layout for the given configuration
    pub fn new(config: &FingerprintConfig) -> Self {
        Self {
            num_bins: config.num_bins(),
            max_bin_delta: config.max_bin_delta,
            min_frame_delta: config.min_frame_delta,
            max_frame_delta: config.max_frame_delta,
            anchor_bits: config.anchor_bits,
            bin_delta_bits: config.bin_delta_bits,
            frame_delta_bits: config.frame_delta_bits,
        }
    }

    /// Total width in bits
    pub fn bits(&self) -> u32 {
        self.anchor_bits + self.bin_delta_bits + self.frame_delta_bits
    }

    /// Largest representable hash
    pub fn max_hash(&self) -> u32 {
        ((1u64 << self.bits()) - 1) as u32
    }

    /// Quantize an anchor/target relationship
    ///
    /// Callers guarantee `|bin_delta| <= max_bin_delta` and
    /// `min_frame_delta <= frame_delta <= max_frame_delta`.
    pub fn fields(&self, anchor_bin: usize, bin_delta: isize, frame_delta: usize) -> HashFields {
        let shifted_bin_delta = (bin_delta + self.max_bin_delta as isize).max(0) as usize;
        let shifted_frame_delta = frame_delta.saturating_sub(self.min_frame_delta);

        HashFields {
            anchor: quantize(anchor_bin, self.num_bins, self.anchor_bits),
            bin_delta: quantize(
                shifted_bin_delta,
                2 * self.max_bin_delta + 1,
                self.bin_delta_bits,
            ),
            frame_delta: quantize(
                shifted_frame_delta,
                self.max_frame_delta - self.min_frame_delta + 1,
                self.frame_delta_bits,
            ),
        }
    }

    /// Pack quantized fields into one hash
    pub fn pack(&self, fields: HashFields) -> u32 {
        (fields.anchor << (self.bin_delta_bits + self.frame_delta_bits))
            | (fields.bin_delta << self.frame_delta_bits)
            | fields.frame_delta
    }

    /// Split a hash back into its fields
    pub fn unpack(&self, hash: u32) -> HashFields {
        let mask = |bits: u32| ((1u64 << bits) - 1) as u32;
        HashFields {
            anchor: (hash >> (self.bin_delta_bits + self.frame_delta_bits)) & mask(self.anchor_bits),
            bin_delta: (hash >> self.frame_delta_bits) & mask(self.bin_delta_bits),
            frame_delta: hash & mask(self.frame_delta_bits),
        }
    }

    /// Quantize and pack in one step
    pub fn hash(&self, anchor_bin: usize, bin_delta: isize, frame_delta: usize) -> u32 {
        self.pack(self.fields(anchor_bin, bin_delta, frame_delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_levels() {
        // 513 bins into 256 levels: roughly two bins per level
        assert_eq!(quantize(0, 513, 8), 0);
        assert_eq!(quantize(1, 513, 8), 0);
        assert_eq!(quantize(2, 513, 8), 0);
        assert_eq!(quantize(3, 513, 8), 1);
        assert_eq!(quantize(512, 513, 8), 255);

        // Fewer values than levels: identity-preserving
        for v in 0..31 {
            assert_eq!(quantize(v, 31, 5), v as u32);
        }
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(1000, 10, 4), 15);
        assert_eq!(quantize(5, 0, 4), 0);
    }

    #[test]
    fn test_default_layout_width() {
        let layout = HashLayout::new(&FingerprintConfig::default());
        assert_eq!(layout.bits(), 20);
        assert_eq!(layout.max_hash(), (1 << 20) - 1);
    }

    #[test]
    fn test_field_extremes_fit() {
        let layout = HashLayout::new(&FingerprintConfig::default());
        let high = layout.hash(512, 63, 31);
        let low = layout.hash(0, -63, 1);
        assert!(high <= layout.max_hash());
        assert_eq!(low, 0);
        assert_eq!(layout.unpack(high), layout.fields(512, 63, 31));
    }

    #[test]
    fn test_unpack_inverts_pack() {
        let layout = HashLayout::new(&FingerprintConfig::default());
        let fields = layout.fields(200, -5, 12);
        assert_eq!(layout.unpack(layout.pack(fields)), fields);
        assert_eq!(fields.frame_delta, 11);
    }

    #[test]
    fn test_relative_encoding_is_shift_invariant_in_time() {
        let layout = HashLayout::new(&FingerprintConfig::default());
        // Same relationship, same hash: absolute time never enters the hash
        assert_eq!(layout.hash(100, 10, 4), layout.hash(100, 10, 4));
        assert_ne!(layout.hash(100, 10, 4), layout.hash(100, 10, 5));
        assert_ne!(layout.hash(100, 10, 4), layout.hash(100, -10, 4));
    }
}
