//! Pipeline driver
//!
//! [`Fingerprinter`] owns the planned FFT and the stage parameters for one
//! configuration and runs requests through
//! conditioner → analyzer → extractor → hasher → assembler.
//!
//! Requests share nothing mutable, so one `Fingerprinter` can serve any
//! number of threads.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::analysis::assembler::CodeAssembler;
use crate::analysis::metadata::FingerprintMetadata;
use crate::analysis::result::{FingerprintCode, FingerprintResult};
use crate::config::FingerprintConfig;
use crate::error::FingerprintError;
use crate::features::landmarks::LandmarkHasher;
use crate::features::peaks::PeakExtractor;
use crate::features::spectral::{SpectralAnalyzer, SpectralFrame};
use crate::preprocessing::{condition_i16_samples, condition_samples, SampleBuffer};

/// Reusable fingerprint generator for one configuration
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    config: FingerprintConfig,
    analyzer: SpectralAnalyzer,
    extractor: PeakExtractor,
    hasher: LandmarkHasher,
}

impl Fingerprinter {
    /// Validate `config` and plan the transform
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is inconsistent.
    pub fn new(config: FingerprintConfig) -> Result<Self, FingerprintError> {
        config.validate()?;

        log::debug!(
            "Fingerprinter: fft={}, hop={}, {} peaks/frame, fan-out {}, {}-bit hashes, version {:#04x}",
            config.fft_size,
            config.hop_size,
            config.max_peaks_per_frame,
            config.fan_out,
            config.hash_bits(),
            config.format_version()
        );

        Ok(Self {
            analyzer: SpectralAnalyzer::new(&config),
            extractor: PeakExtractor::new(&config),
            hasher: LandmarkHasher::new(&config),
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Fingerprint the first `sample_count` samples of `samples`
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a non-positive, oversized or undersized count,
    /// `CorruptSamples` for non-finite samples.
    pub fn generate(
        &self,
        samples: &[f32],
        sample_count: i64,
    ) -> Result<FingerprintCode, FingerprintError> {
        Ok(self.generate_detailed(samples, sample_count)?.code)
    }

    /// Like [`Fingerprinter::generate`], also returning pipeline statistics
    pub fn generate_detailed(
        &self,
        samples: &[f32],
        sample_count: i64,
    ) -> Result<FingerprintResult, FingerprintError> {
        let buffer = condition_samples(samples, sample_count, &self.config)?;
        self.run(&buffer, 0, None)
    }

    /// Fingerprint signed 16-bit PCM (normalized by `i16::MAX`)
    pub fn generate_i16(
        &self,
        samples: &[i16],
        sample_count: i64,
    ) -> Result<FingerprintCode, FingerprintError> {
        let buffer = condition_i16_samples(samples, sample_count, &self.config)?;
        Ok(self.run(&buffer, 0, None)?.code)
    }

    /// Fingerprint audio that starts `start_offset_secs` into a longer recording
    ///
    /// Every time offset is shifted by the offset expressed in frames; hashes
    /// are unaffected.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the offset is negative or non-finite, or if the
    /// shifted time offset of the last frame would not fit in 32 bits, plus
    /// the errors of [`Fingerprinter::generate`].
    pub fn generate_with_offset(
        &self,
        samples: &[f32],
        sample_count: i64,
        start_offset_secs: f32,
    ) -> Result<FingerprintCode, FingerprintError> {
        let buffer = condition_samples(samples, sample_count, &self.config)?;
        let offset_frames = self.offset_frames(start_offset_secs, buffer.len())?;
        Ok(self.run(&buffer, offset_frames, None)?.code)
    }

    /// Fingerprint with cooperative cancellation
    ///
    /// `cancel` is polled between frames. Once it reads `true` the partial
    /// work is discarded.
    ///
    /// # Errors
    ///
    /// `Cancelled` if cancellation was observed, plus the errors of
    /// [`Fingerprinter::generate`].
    pub fn generate_cancellable(
        &self,
        samples: &[f32],
        sample_count: i64,
        cancel: &AtomicBool,
    ) -> Result<FingerprintCode, FingerprintError> {
        let buffer = condition_samples(samples, sample_count, &self.config)?;
        Ok(self.run(&buffer, 0, Some(cancel))?.code)
    }

    fn offset_frames(
        &self,
        start_offset_secs: f32,
        num_samples: usize,
    ) -> Result<u32, FingerprintError> {
        if !start_offset_secs.is_finite() || start_offset_secs < 0.0 {
            return Err(FingerprintError::InvalidInput(format!(
                "Start offset must be a finite, non-negative number of seconds, got {}",
                start_offset_secs
            )));
        }

        let frames = (start_offset_secs as f64 * self.config.sample_rate as f64
            / self.config.hop_size as f64)
            .round();

        // Every anchor frame must keep a distinct time offset
        let last_frame = self.analyzer.frame_count(num_samples).saturating_sub(1) as f64;
        if frames + last_frame > u32::MAX as f64 {
            return Err(FingerprintError::InvalidInput(format!(
                "Start offset of {}s ({} frames) pushes the last of {} frames past the 32-bit time range",
                start_offset_secs,
                frames,
                last_frame as u64 + 1
            )));
        }
        Ok(frames as u32)
    }

    fn run<'a>(
        &'a self,
        buffer: &'a SampleBuffer<'_>,
        start_offset_frames: u32,
        cancel: Option<&AtomicBool>,
    ) -> Result<FingerprintResult, FingerprintError> {
        let start_time = Instant::now();
        let is_cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

        let duration_frames = self.analyzer.frame_count(buffer.len());
        log::debug!(
            "Fingerprinting {} samples ({} frames, offset {} frames)",
            buffer.len(),
            duration_frames,
            start_offset_frames
        );

        let frames: Box<dyn Iterator<Item = SpectralFrame> + 'a> = if self.config.parallel {
            if is_cancelled() {
                return Err(FingerprintError::Cancelled);
            }
            Box::new(self.analyzer.analyze_parallel(buffer).into_iter())
        } else {
            Box::new(self.analyzer.frames(buffer))
        };

        let stopped = Cell::new(false);
        let peak_count = Cell::new(0usize);

        let frames = frames.map_while(|frame| {
            if is_cancelled() {
                stopped.set(true);
                None
            } else {
                Some(frame)
            }
        });
        let peaks = self
            .extractor
            .peaks(frames)
            .inspect(|frame_peaks| peak_count.set(peak_count.get() + frame_peaks.peaks.len()));

        let hasher = self.hasher.clone().with_start_offset(start_offset_frames);
        let mut assembler = CodeAssembler::new(&self.config);
        for landmark in hasher.landmarks(peaks) {
            assembler.push(&landmark)?;
        }

        if stopped.get() {
            log::debug!("Cancellation observed; discarding partial fingerprint");
            return Err(FingerprintError::Cancelled);
        }

        let landmark_count = assembler.landmark_count();
        let code = assembler.finish(duration_frames)?;

        let metadata = FingerprintMetadata {
            duration_seconds: buffer.duration_seconds(),
            sample_rate: buffer.sample_rate(),
            frame_count: duration_frames,
            peak_count: peak_count.get(),
            landmark_count,
            entry_count: code.len(),
            format_version: code.version(),
            parallel: self.config.parallel,
            processing_time_ms: start_time.elapsed().as_secs_f32() * 1000.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        log::debug!(
            "Fingerprint done: {} peaks, {} landmarks, {} entries in {:.2} ms",
            metadata.peak_count,
            metadata.landmark_count,
            metadata.entry_count,
            metadata.processing_time_ms
        );

        Ok(FingerprintResult { code, metadata })
    }
}
