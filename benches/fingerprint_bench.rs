//! Performance benchmarks for fingerprint generation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stratum_fingerprint::features::peaks::PeakExtractor;
use stratum_fingerprint::features::spectral::SpectralAnalyzer;
use stratum_fingerprint::preprocessing::condition_samples;
use stratum_fingerprint::{generate_fingerprint, FingerprintConfig};

const SAMPLE_RATE: usize = 11025;

/// Two detuned partials whose pitch steps every 200 ms
fn synthetic_audio(seconds: usize) -> Vec<f32> {
    (0..SAMPLE_RATE * seconds)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = 220.0 + 110.0 * ((i / (SAMPLE_RATE / 5)) % 9) as f32;
            0.4 * (2.0 * std::f32::consts::PI * freq * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * freq * 2.01 * t).sin()
        })
        .collect()
}

fn bench_generate_fingerprint(c: &mut Criterion) {
    // 30 seconds at 11025 Hz
    let samples = synthetic_audio(30);
    let count = samples.len() as i64;

    let mut group = c.benchmark_group("generate_fingerprint_30s");
    for parallel in [false, true] {
        let config = FingerprintConfig {
            parallel,
            ..FingerprintConfig::default()
        };
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &config, |b, config| {
            b.iter(|| {
                let _ = generate_fingerprint(black_box(&samples), black_box(count), config);
            });
        });
    }
    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let samples = synthetic_audio(30);
    let config = FingerprintConfig::default();
    let analyzer = SpectralAnalyzer::new(&config);
    let extractor = PeakExtractor::new(&config);
    let buffer = condition_samples(&samples, samples.len() as i64, &config).unwrap();

    c.bench_function("spectral_frames_30s", |b| {
        b.iter(|| analyzer.frames(black_box(&buffer)).count());
    });

    let frames = analyzer.analyze_parallel(&buffer);
    c.bench_function("peak_extraction_30s", |b| {
        b.iter(|| {
            frames
                .iter()
                .map(|frame| extractor.extract(black_box(frame)).peaks.len())
                .sum::<usize>()
        });
    });
}

criterion_group!(benches, bench_generate_fingerprint, bench_stages);
criterion_main!(benches);
