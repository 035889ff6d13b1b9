//! Landmark hashing
//!
//! Pairs each peak (the anchor) with peaks in a bounded forward window of
//! frames and a bounded frequency band, and quantizes every pair into a
//! fixed-width hash. Only the relationship between the two peaks enters the
//! hash; the anchor's frame index becomes the landmark's time offset.
//!
//! # Pairing rules
//!
//! - Targets lie in frames `anchor + min_frame_delta ..= anchor + max_frame_delta`
//!   (`min_frame_delta >= 1`, so never the same frame and never backwards)
//! - `|target.bin - anchor.bin| <= max_bin_delta`
//! - Candidates are visited in (frame, bin) order and at most `fan_out`
//!   targets are paired with one anchor
//!
//! [`Landmarks`] is lazy: it holds at most `max_frame_delta + 1` frames of
//! peaks and emits an anchor frame as soon as every frame that could contain
//! its targets has arrived.

pub mod quantize;

use std::collections::VecDeque;

use crate::config::FingerprintConfig;
use crate::features::peaks::{FramePeaks, Peak};
use quantize::HashLayout;

/// A quantized anchor/target relationship
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// Earlier peak of the pair
    pub anchor: Peak,
    /// Later peak of the pair
    pub target: Peak,
    /// Packed quantized relationship
    pub hash: u32,
    /// Anchor frame index plus the request's start offset
    pub time_offset: u32,
}

/// Pairs peaks and hashes the pairs
#[derive(Debug, Clone)]
pub struct LandmarkHasher {
    layout: HashLayout,
    min_frame_delta: usize,
    max_frame_delta: usize,
    max_bin_delta: usize,
    fan_out: usize,
    start_offset: u32,
}

impl LandmarkHasher {
    /// Create a hasher from the pipeline configuration
    pub fn new(config: &FingerprintConfig) -> Self {
        Self {
            layout: HashLayout::new(config),
            min_frame_delta: config.min_frame_delta,
            max_frame_delta: config.max_frame_delta,
            max_bin_delta: config.max_bin_delta,
            fan_out: config.fan_out,
            start_offset: 0,
        }
    }

    /// Shift every emitted time offset by `frames`
    pub fn with_start_offset(mut self, frames: u32) -> Self {
        self.start_offset = frames;
        self
    }

    /// Hash layout in use
    pub fn layout(&self) -> &HashLayout {
        &self.layout
    }

    /// Pair every peak of `anchor_frame` with targets from `following`
    ///
    /// `following` must hold later frames in increasing order; frames outside
    /// the pairing window are skipped.
    pub fn pair_frame<'f, F>(&self, anchor_frame: &FramePeaks, following: F) -> Vec<Landmark>
    where
        F: IntoIterator<Item = &'f FramePeaks> + Clone,
    {
        let mut landmarks = Vec::new();
        let time_offset = (anchor_frame.frame_index as u32).saturating_add(self.start_offset);

        for anchor in &anchor_frame.peaks {
            let targets = following
                .clone()
                .into_iter()
                .filter(|frame| {
                    let delta = frame.frame_index.saturating_sub(anchor_frame.frame_index);
                    frame.frame_index > anchor_frame.frame_index
                        && delta >= self.min_frame_delta
                        && delta <= self.max_frame_delta
                })
                .flat_map(|frame| frame.peaks.iter())
                .filter(|target| target.bin.abs_diff(anchor.bin) <= self.max_bin_delta)
                .take(self.fan_out);

            for target in targets {
                let bin_delta = target.bin as isize - anchor.bin as isize;
                let frame_delta = target.frame_index - anchor.frame_index;
                landmarks.push(Landmark {
                    anchor: *anchor,
                    target: *target,
                    hash: self.layout.hash(anchor.bin, bin_delta, frame_delta),
                    time_offset,
                });
            }
        }

        landmarks
    }

    /// Lazily hash a sequence of per-frame peaks (in increasing frame order)
    pub fn landmarks<I>(&self, peaks: I) -> Landmarks<'_, I::IntoIter>
    where
        I: IntoIterator<Item = FramePeaks>,
    {
        Landmarks {
            hasher: self,
            peaks: peaks.into_iter(),
            window: VecDeque::with_capacity(self.max_frame_delta + 1),
            pending: Vec::new().into_iter(),
            exhausted: false,
        }
    }
}

/// Lazy landmark stream over per-frame peaks
pub struct Landmarks<'a, I> {
    hasher: &'a LandmarkHasher,
    peaks: I,
    window: VecDeque<FramePeaks>,
    pending: std::vec::IntoIter<Landmark>,
    exhausted: bool,
}

impl<I> Landmarks<'_, I> {
    fn front_ready(&self) -> bool {
        match (self.window.front(), self.window.back()) {
            (Some(front), Some(back)) => {
                self.exhausted
                    || back.frame_index >= front.frame_index + self.hasher.max_frame_delta
            }
            _ => false,
        }
    }
}

impl<I> Iterator for Landmarks<'_, I>
where
    I: Iterator<Item = FramePeaks>,
{
    type Item = Landmark;

    fn next(&mut self) -> Option<Landmark> {
        loop {
            if let Some(landmark) = self.pending.next() {
                return Some(landmark);
            }

            if self.front_ready() {
                if let Some(anchor_frame) = self.window.pop_front() {
                    self.pending = self
                        .hasher
                        .pair_frame(&anchor_frame, self.window.iter())
                        .into_iter();
                }
                continue;
            }

            if self.exhausted {
                return None;
            }

            match self.peaks.next() {
                Some(frame_peaks) => self.window.push_back(frame_peaks),
                None => self.exhausted = true,
            }
        }
    }
}
