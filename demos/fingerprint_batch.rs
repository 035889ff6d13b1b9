//! Example: Fingerprint multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example fingerprint_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files (batch-level). Each file runs the sequential analyzer.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.
//! - Files are fingerprinted at their native sample rate; no resampling happens.

use std::env;
use std::fs::File;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use stratum_fingerprint::preprocessing::channel_mixer::interleaved_to_mono;
use stratum_fingerprint::{FingerprintConfig, Fingerprinter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

fn decode_audio_file(path: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error + Send + Sync>> {
    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = std::path::Path::new(path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or("No supported audio tracks found")?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or("Track has no sample rate")?;
    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels = 1usize;
    let mut interleaved: Vec<f32> = Vec::new();

    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(symphonia::core::errors::Error::DecodeError(_)) => {
                // Skip decode errors (can happen with corrupted packets).
                continue;
            }
            Err(e) => return Err(Box::new(e)),
        }
    }

    Ok((interleaved_to_mono(&interleaved, channels)?, sample_rate))
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

#[derive(Serialize)]
struct ItemOut {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time_ms: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ItemOut {
    fn failed(file: String, error: String) -> Self {
        Self {
            file,
            code: None,
            entries: None,
            processing_time_ms: None,
            error: Some(error),
        }
    }
}

fn fingerprint_path(path: &str) -> ItemOut {
    let (samples, sample_rate) = match decode_audio_file(path) {
        Ok(decoded) => decoded,
        Err(e) => return ItemOut::failed(path.to_string(), format!("decode failed: {e}")),
    };

    let config = FingerprintConfig {
        sample_rate,
        ..FingerprintConfig::default()
    };

    let result = Fingerprinter::new(config)
        .and_then(|fp| fp.generate_detailed(&samples, samples.len() as i64));

    match result {
        Ok(res) => ItemOut {
            file: path.to_string(),
            code: Some(res.code.to_code_string()),
            entries: Some(res.metadata.entry_count),
            processing_time_ms: Some(res.metadata.processing_time_ms),
            error: None,
        },
        Err(e) => ItemOut::failed(path.to_string(), format!("fingerprint failed: {e}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                if args.is_empty() {
                    return Err("--jobs requires a value".into());
                }
                let v = args.remove(0).parse::<usize>()?;
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: fingerprint_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| paths.par_iter().map(|p| fingerprint_path(p)).collect());

    for (idx, o) in outs.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(o)?);
            continue;
        }
        match (&o.code, &o.error) {
            (Some(code), _) => println!(
                "[{}/{}] {}: {} entries, {:.2}ms\n  {}",
                idx + 1,
                outs.len(),
                o.file,
                o.entries.unwrap_or(0),
                o.processing_time_ms.unwrap_or(0.0),
                code
            ),
            (None, error) => println!(
                "[{}/{}] {}: ERROR: {}",
                idx + 1,
                outs.len(),
                o.file,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    let ok = outs.iter().filter(|o| o.code.is_some()).count();
    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok,
        outs.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}
