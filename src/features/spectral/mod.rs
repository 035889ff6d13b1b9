//! Windowed spectral analysis
//!
//! Splits the sample buffer into overlapping Hann-tapered windows and turns
//! each one into a magnitude spectrum of `fft_size / 2 + 1` bins.
//!
//! # Algorithm
//!
//! 1. Window `i` covers samples `[i * hop, i * hop + fft_size)`; trailing
//!    partial windows are dropped
//! 2. Multiply by the Hann taper to reduce edge leakage
//! 3. Forward FFT, keep `|X[k]|` for `k` in `[0, fft_size / 2]`
//!
//! Frames come out lazily in increasing time order through
//! [`SpectralFrames`], which reuses one working buffer for every window.
//! [`SpectralAnalyzer::analyze_parallel`] computes the same frames on the
//! rayon pool.
//!
//! # Example
//!
//! ```
//! use stratum_fingerprint::features::spectral::SpectralAnalyzer;
//! use stratum_fingerprint::preprocessing::condition_samples;
//! use stratum_fingerprint::FingerprintConfig;
//!
//! let config = FingerprintConfig::default();
//! let samples = vec![0.0f32; 4096];
//! let buffer = condition_samples(&samples, 4096, &config)?;
//!
//! let analyzer = SpectralAnalyzer::new(&config);
//! let frames: Vec<_> = analyzer.frames(&buffer).collect();
//! assert_eq!(frames.len(), 13);
//! assert_eq!(frames[0].magnitudes.len(), 513);
//! # Ok::<(), stratum_fingerprint::FingerprintError>(())
//! ```

pub mod window;

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::config::FingerprintConfig;
use crate::preprocessing::SampleBuffer;

/// Magnitude spectrum of one analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrame {
    /// Position of the window in hops from the start of the buffer
    pub frame_index: usize,

    /// Non-negative magnitudes indexed by frequency bin
    pub magnitudes: Vec<f32>,
}

impl SpectralFrame {
    /// Number of frequency bins
    pub fn num_bins(&self) -> usize {
        self.magnitudes.len()
    }
}

/// Planned FFT plus taper, shared by every window of every request
#[derive(Clone)]
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Arc<[f32]>,
    fft_size: usize,
    hop_size: usize,
}

impl fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("fft_size", &self.fft_size)
            .field("hop_size", &self.hop_size)
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Plan the transform for `config.fft_size` / `config.hop_size`
    pub fn new(config: &FingerprintConfig) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(config.fft_size);

        Self {
            fft,
            window: window::hann_window(config.fft_size).into(),
            fft_size: config.fft_size,
            hop_size: config.hop_size,
        }
    }

    /// Number of magnitude bins per frame
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Number of frames a buffer of `num_samples` produces
    pub fn frame_count(&self, num_samples: usize) -> usize {
        if num_samples < self.fft_size {
            return 0;
        }
        (num_samples - self.fft_size) / self.hop_size + 1
    }

    /// Lazy frame sequence over `buffer`
    pub fn frames<'a>(&'a self, buffer: &'a SampleBuffer<'_>) -> SpectralFrames<'a> {
        SpectralFrames::new(self, buffer.samples())
    }

    /// Compute every frame on the rayon pool, returned in time order
    ///
    /// Each worker owns its scratch buffers, so the result is identical to
    /// collecting [`SpectralAnalyzer::frames`].
    pub fn analyze_parallel(&self, buffer: &SampleBuffer<'_>) -> Vec<SpectralFrame> {
        let samples = buffer.samples();
        let count = self.frame_count(samples.len());

        log::debug!(
            "Analyzing {} frames in parallel (fft={}, hop={})",
            count,
            self.fft_size,
            self.hop_size
        );

        let mut frames: Vec<SpectralFrame> = (0..count)
            .into_par_iter()
            .map_init(
                || self.scratch_buffers(),
                |(work, scratch), frame_index| {
                    self.transform_window(samples, frame_index, work, scratch)
                },
            )
            .collect();

        // Completion order must never leak into the output
        frames.sort_by_key(|frame| frame.frame_index);
        frames
    }

    fn scratch_buffers(&self) -> (Vec<Complex<f32>>, Vec<Complex<f32>>) {
        let zero = Complex::new(0.0, 0.0);
        (
            vec![zero; self.fft_size],
            vec![zero; self.fft.get_inplace_scratch_len()],
        )
    }

    fn transform_window(
        &self,
        samples: &[f32],
        frame_index: usize,
        work: &mut [Complex<f32>],
        scratch: &mut [Complex<f32>],
    ) -> SpectralFrame {
        let start = frame_index * self.hop_size;
        let segment = &samples[start..start + self.fft_size];

        for (slot, (&sample, &w)) in work.iter_mut().zip(segment.iter().zip(self.window.iter())) {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft.process_with_scratch(work, scratch);

        let magnitudes = work[..self.num_bins()].iter().map(|c| c.norm()).collect();

        SpectralFrame {
            frame_index,
            magnitudes,
        }
    }
}

/// Lazy, restartable sequence of [`SpectralFrame`]s in increasing time order
pub struct SpectralFrames<'a> {
    analyzer: &'a SpectralAnalyzer,
    samples: &'a [f32],
    next_index: usize,
    count: usize,
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl<'a> SpectralFrames<'a> {
    fn new(analyzer: &'a SpectralAnalyzer, samples: &'a [f32]) -> Self {
        let (work, scratch) = analyzer.scratch_buffers();
        Self {
            analyzer,
            samples,
            next_index: 0,
            count: analyzer.frame_count(samples.len()),
            work,
            scratch,
        }
    }

    /// Rewind to the first frame, keeping the working buffers
    pub fn reset(&mut self) {
        self.next_index = 0;
    }

    /// Total number of frames in the sequence
    pub fn frame_count(&self) -> usize {
        self.count
    }
}

impl Iterator for SpectralFrames<'_> {
    type Item = SpectralFrame;

    fn next(&mut self) -> Option<SpectralFrame> {
        if self.next_index >= self.count {
            return None;
        }

        let frame = self.analyzer.transform_window(
            self.samples,
            self.next_index,
            &mut self.work,
            &mut self.scratch,
        );
        self.next_index += 1;
        log::trace!("Spectral frame {} computed", frame.frame_index);
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SpectralFrames<'_> {}
