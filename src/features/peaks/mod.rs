//! Spectral peak extraction
//!
//! Finds the most salient energy concentrations of each spectral frame.
//!
//! # Algorithm
//!
//! 1. Compute the frame's adaptive threshold (see [`threshold`])
//! 2. Keep bins in `[min_bin, num_bins - 1)` that are strictly greater than
//!    every other bin within `neighborhood_radius` and exceed the threshold
//! 3. Order by magnitude (highest first, equal magnitude: lower bin first)
//!    and retain at most `max_peaks_per_frame`
//! 4. Re-sort the retained peaks by bin
//!
//! Capping the peaks per frame keeps the pairing stage linear in duration and
//! stops near-identical inputs from diverging on spurious detail.

pub mod threshold;

use std::cmp::Ordering;

use crate::config::FingerprintConfig;
use crate::features::spectral::SpectralFrame;
use threshold::{frame_threshold, ThresholdParams};

/// A locally dominant frequency bin within one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Frame the peak belongs to
    pub frame_index: usize,
    /// Frequency bin
    pub bin: usize,
    /// Spectral magnitude at the bin
    pub magnitude: f32,
}

/// Peaks of a single frame, sorted by bin ascending
#[derive(Debug, Clone, PartialEq)]
pub struct FramePeaks {
    /// Frame the peaks belong to
    pub frame_index: usize,
    /// Retained peaks (possibly empty)
    pub peaks: Vec<Peak>,
}

/// Per-frame peak picker
#[derive(Debug, Clone)]
pub struct PeakExtractor {
    min_bin: usize,
    radius: usize,
    max_peaks: usize,
    threshold: ThresholdParams,
}

impl PeakExtractor {
    /// Create an extractor from the pipeline configuration
    pub fn new(config: &FingerprintConfig) -> Self {
        Self {
            min_bin: config.min_bin,
            radius: config.neighborhood_radius,
            max_peaks: config.max_peaks_per_frame,
            threshold: ThresholdParams {
                min_magnitude: config.min_magnitude,
                mean_factor: config.mean_factor,
                relative_floor_db: config.relative_floor_db,
            },
        }
    }

    /// Maximum number of peaks a single frame can yield
    pub fn max_peaks_per_frame(&self) -> usize {
        self.max_peaks
    }

    /// Extract the retained peaks of one frame
    pub fn extract(&self, frame: &SpectralFrame) -> FramePeaks {
        let magnitudes = &frame.magnitudes;
        let threshold = frame_threshold(magnitudes, &self.threshold);

        let mut candidates: Vec<Peak> = local_maxima(magnitudes, self.min_bin, self.radius)
            .filter(|&bin| magnitudes[bin] > threshold)
            .map(|bin| Peak {
                frame_index: frame.frame_index,
                bin,
                magnitude: magnitudes[bin],
            })
            .collect();

        candidates.sort_by(strongest_first);
        candidates.truncate(self.max_peaks);
        candidates.sort_by_key(|peak| peak.bin);

        log::trace!(
            "Frame {}: {} peaks above threshold {:.4}",
            frame.frame_index,
            candidates.len(),
            threshold
        );

        FramePeaks {
            frame_index: frame.frame_index,
            peaks: candidates,
        }
    }

    /// Lazily extract peaks from a frame sequence
    pub fn peaks<I>(&self, frames: I) -> PeakFrames<'_, I::IntoIter>
    where
        I: IntoIterator<Item = SpectralFrame>,
    {
        PeakFrames {
            extractor: self,
            frames: frames.into_iter(),
        }
    }
}

/// Magnitude descending, then bin ascending
fn strongest_first(a: &Peak, b: &Peak) -> Ordering {
    b.magnitude
        .partial_cmp(&a.magnitude)
        .unwrap_or(Ordering::Equal)
        .then(a.bin.cmp(&b.bin))
}

/// Bins in `[min_bin, len - 1)` strictly greater than all neighbors within `radius`
fn local_maxima(magnitudes: &[f32], min_bin: usize, radius: usize) -> impl Iterator<Item = usize> + '_ {
    let upper = magnitudes.len().saturating_sub(1);
    (min_bin..upper).filter(move |&bin| {
        let value = magnitudes[bin];
        let lo = bin.saturating_sub(radius);
        let hi = (bin + radius).min(magnitudes.len() - 1);
        (lo..=hi).all(|other| other == bin || magnitudes[other] < value)
    })
}

/// Lazy adapter yielding one [`FramePeaks`] per spectral frame
pub struct PeakFrames<'a, I> {
    extractor: &'a PeakExtractor,
    frames: I,
}

impl<I> Iterator for PeakFrames<'_, I>
where
    I: Iterator<Item = SpectralFrame>,
{
    type Item = FramePeaks;

    fn next(&mut self) -> Option<FramePeaks> {
        let frame = self.frames.next()?;
        Some(self.extractor.extract(&frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(max_peaks: usize) -> PeakExtractor {
        let config = FingerprintConfig {
            max_peaks_per_frame: max_peaks,
            min_bin: 1,
            neighborhood_radius: 2,
            min_magnitude: 0.1,
            mean_factor: 1.0,
            relative_floor_db: -40.0,
            ..FingerprintConfig::default()
        };
        PeakExtractor::new(&config)
    }

    fn frame(magnitudes: Vec<f32>) -> SpectralFrame {
        SpectralFrame {
            frame_index: 7,
            magnitudes,
        }
    }

    #[test]
    fn test_finds_isolated_peaks() {
        let mut magnitudes = vec![0.0f32; 32];
        magnitudes[5] = 4.0;
        magnitudes[6] = 1.0;
        magnitudes[20] = 3.0;

        let result = extractor(5).extract(&frame(magnitudes));
        assert_eq!(result.frame_index, 7);
        let bins: Vec<usize> = result.peaks.iter().map(|p| p.bin).collect();
        assert_eq!(bins, vec![5, 20]);
        assert!(result.peaks.iter().all(|p| p.frame_index == 7));
    }

    #[test]
    fn test_neighborhood_suppresses_shoulders() {
        // Bin 11 is a local maximum of its immediate neighbors but bin 10 is
        // within the radius and larger.
        let mut magnitudes = vec![0.0f32; 32];
        magnitudes[10] = 5.0;
        magnitudes[11] = 0.0;
        magnitudes[12] = 4.0;

        let result = extractor(5).extract(&frame(magnitudes));
        let bins: Vec<usize> = result.peaks.iter().map(|p| p.bin).collect();
        assert_eq!(bins, vec![10]);
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        let mut magnitudes = vec![0.0f32; 32];
        magnitudes[10] = 5.0;
        magnitudes[11] = 5.0;

        let result = extractor(5).extract(&frame(magnitudes));
        assert!(result.peaks.is_empty());
    }

    #[test]
    fn test_retains_strongest_with_bin_tie_break() {
        let mut magnitudes = vec![0.0f32; 64];
        magnitudes[5] = 2.0;
        magnitudes[15] = 9.0;
        magnitudes[25] = 2.0;
        magnitudes[35] = 2.0;
        magnitudes[45] = 8.0;

        let result = extractor(3).extract(&frame(magnitudes));
        let bins: Vec<usize> = result.peaks.iter().map(|p| p.bin).collect();
        // 15 and 45 are strongest; among the 2.0 ties the lowest bin wins
        assert_eq!(bins, vec![5, 15, 45]);
    }

    #[test]
    fn test_silent_frame_has_no_peaks() {
        let result = extractor(5).extract(&frame(vec![0.0f32; 513]));
        assert!(result.peaks.is_empty());
    }

    #[test]
    fn test_ignores_edges() {
        let mut magnitudes = vec![0.0f32; 16];
        magnitudes[0] = 10.0;
        magnitudes[15] = 10.0;
        let result = extractor(5).extract(&frame(magnitudes));
        assert!(result.peaks.is_empty());
    }

    #[test]
    fn test_lazy_adapter_yields_one_entry_per_frame() {
        let frames = (0..4).map(|i| {
            let mut magnitudes = vec![0.0f32; 32];
            magnitudes[4 + i] = 1.0;
            SpectralFrame {
                frame_index: i,
                magnitudes,
            }
        });

        let extractor = extractor(5);
        let peaks: Vec<FramePeaks> = extractor.peaks(frames).collect();
        assert_eq!(peaks.len(), 4);
        for (i, frame_peaks) in peaks.iter().enumerate() {
            assert_eq!(frame_peaks.frame_index, i);
            assert_eq!(frame_peaks.peaks.len(), 1);
            assert_eq!(frame_peaks.peaks[0].bin, 4 + i);
        }
    }
}
