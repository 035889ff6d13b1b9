//! Example: Fingerprint a single WAV file
//!
//! Usage:
//!   cargo run --release --example fingerprint_file -- [--offset SECONDS] <file.wav>
//!
//! The pipeline does not resample. Files at a rate other than 11025 Hz are
//! fingerprinted at their own rate and carry a non-default format version.

use std::env;

use stratum_fingerprint::preprocessing::channel_mixer::interleaved_to_mono;
use stratum_fingerprint::{FingerprintConfig, Fingerprinter};

fn load_wav(path: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let mono = interleaved_to_mono(&samples, spec.channels as usize)?;
    Ok((mono, spec.sample_rate))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut offset_secs = 0.0f32;
    if args.first().map(String::as_str) == Some("--offset") {
        args.remove(0);
        if args.is_empty() {
            return Err("--offset requires a value".into());
        }
        offset_secs = args.remove(0).parse()?;
    }

    let path = args
        .first()
        .ok_or("Usage: fingerprint_file [--offset SECONDS] <file.wav>")?;

    let (samples, sample_rate) = load_wav(path)?;
    let config = FingerprintConfig {
        sample_rate,
        ..FingerprintConfig::default()
    };
    if sample_rate != FingerprintConfig::default().sample_rate {
        eprintln!(
            "Note: {} Hz input; codes are only comparable with other {} Hz codes",
            sample_rate, sample_rate
        );
    }

    let fingerprinter = Fingerprinter::new(config)?;
    let count = samples.len() as i64;

    if offset_secs > 0.0 {
        let code = fingerprinter.generate_with_offset(&samples, count, offset_secs)?;
        println!("{}", code);
        return Ok(());
    }

    let result = fingerprinter.generate_detailed(&samples, count)?;

    println!("{}", result.code);
    eprintln!("Fingerprint Results:");
    eprintln!("  Duration: {:.2} s ({} frames)", result.metadata.duration_seconds, result.metadata.frame_count);
    eprintln!("  Peaks: {}", result.metadata.peak_count);
    eprintln!(
        "  Landmarks: {} ({} unique entries)",
        result.metadata.landmark_count, result.metadata.entry_count
    );
    eprintln!("  Format version: {:#04x}", result.metadata.format_version);
    eprintln!("  Processing time: {:.2} ms", result.metadata.processing_time_ms);

    Ok(())
}
