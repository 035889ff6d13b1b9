//! Channel mixing utilities (multi-channel to mono conversion)
//!
//! The fingerprint pipeline only accepts mono audio. Hosts that hold stereo
//! or interleaved multi-channel PCM use these helpers first.

use crate::error::FingerprintError;

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMixMode {
    /// Simple average: (L + R) / 2
    Mono,
    /// Keep the louder channel per sample
    Dominant,
    /// Left channel only
    Left,
    /// Right channel only
    Right,
}

/// Convert stereo to mono
///
/// # Arguments
///
/// * `left` - Left channel samples
/// * `right` - Right channel samples
/// * `mode` - Mixing mode
///
/// # Errors
///
/// Returns `InvalidInput` if the channels differ in length.
pub fn stereo_to_mono(
    left: &[f32],
    right: &[f32],
    mode: ChannelMixMode,
) -> Result<Vec<f32>, FingerprintError> {
    if left.len() != right.len() {
        return Err(FingerprintError::InvalidInput(format!(
            "Channel length mismatch: left={}, right={}",
            left.len(),
            right.len()
        )));
    }

    log::debug!("Mixing {} stereo frames using {:?}", left.len(), mode);

    let mono = match mode {
        ChannelMixMode::Mono => left
            .iter()
            .zip(right)
            .map(|(&l, &r)| (l + r) * 0.5)
            .collect(),
        ChannelMixMode::Dominant => left
            .iter()
            .zip(right)
            .map(|(&l, &r)| if l.abs() >= r.abs() { l } else { r })
            .collect(),
        ChannelMixMode::Left => left.to_vec(),
        ChannelMixMode::Right => right.to_vec(),
    };

    Ok(mono)
}

/// Average interleaved multi-channel samples down to mono
///
/// A trailing incomplete frame is dropped.
///
/// # Errors
///
/// Returns `InvalidInput` if `channels` is zero.
pub fn interleaved_to_mono(samples: &[f32], channels: usize) -> Result<Vec<f32>, FingerprintError> {
    if channels == 0 {
        return Err(FingerprintError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }

    if channels == 1 {
        return Ok(samples.to_vec());
    }

    let scale = 1.0 / channels as f32;
    Ok(samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}
