use std::collections::HashSet;
use std::hash::Hasher;

use loglog_registers::{
    AnyEstimator, CardinalityEstimatorTrait, DenseRegisters, HyperLogLog, Uncorrected, Variant,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use wyhash::WyHash;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-";

/// Random string stream with lengths in [1..30] range, duplicates included
struct StreamGenerator {
    rng: StdRng,
}

impl StreamGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn generate_string(&mut self) -> String {
        let len: usize = self.rng.gen_range(1..=30);
        (0..len)
            .map(|_| CHARSET[self.rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }

    fn generate_stream(&mut self, size: usize) -> Vec<String> {
        (0..size).map(|_| self.generate_string()).collect()
    }
}

/// `WyHash` with a fixed non-default seed
struct SeededWyHash(WyHash);

impl Default for SeededWyHash {
    fn default() -> Self {
        Self(WyHash::with_seed(0x5eed))
    }
}

impl Hasher for SeededWyHash {
    fn finish(&self) -> u64 {
        self.0.finish()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes)
    }
}

/// Relative error of `estimate`, zero while nothing has been observed
fn relative_error(estimate: f64, true_count: usize) -> f64 {
    if true_count == 0 {
        return 0.0;
    }
    (estimate - true_count as f64).abs() / true_count as f64
}

/// Mean and population standard deviation
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[test]
fn test_distinct_strings_p10() {
    let mut generator = StreamGenerator::new(42);
    let mut distinct = HashSet::new();
    while distinct.len() < 100_000 {
        distinct.insert(generator.generate_string());
    }

    let mut estimator = HyperLogLog::<10, DenseRegisters, Uncorrected, SeededWyHash>::new();
    for item in &distinct {
        estimator.insert(item.as_str());
    }

    let error = relative_error(estimator.estimate(), distinct.len());
    assert!(
        error < 0.05,
        "estimate {:.0} has {:.2}% error (expected <5%)",
        estimator.estimate(),
        error * 100.0
    );
}

#[test]
fn test_relative_error_guard() {
    assert_eq!(relative_error(0.0, 0), 0.0);
    assert_eq!(relative_error(5.0, 0), 0.0);
    assert_eq!(relative_error(90.0, 100), 0.1);
}

#[derive(Tabled)]
struct StepRecord {
    step: usize,
    true_count: usize,
    variant: Variant,
    mean_estimate: String,
    std_estimate: String,
    relative_error: String,
}

/// Feed `trials` random streams into every variant, sampling estimates every `step_size` items.
/// Returns per step and variant: true count and estimates of all trials.
fn run_experiment<const P: usize>(
    trials: usize,
    stream_size: usize,
    step_size: usize,
) -> Vec<(usize, usize, Variant, Vec<f64>)> {
    let steps = stream_size.div_ceil(step_size);
    let mut samples: Vec<Vec<(usize, Vec<f64>)>> = vec![vec![(0, Vec::new()); Variant::ALL.len()]; steps];

    let mut generator = StreamGenerator::new(0x5eed);
    for _ in 0..trials {
        let stream = generator.generate_stream(stream_size);
        let mut estimators: Vec<AnyEstimator<P>> =
            Variant::ALL.iter().map(|&v| AnyEstimator::new(v)).collect();
        let mut unique = HashSet::new();

        for (i, item) in stream.iter().enumerate() {
            unique.insert(item.as_str());
            estimators.iter_mut().for_each(|e| e.insert(item.as_str()));

            if (i + 1) % step_size == 0 || i + 1 == stream_size {
                let step = i / step_size;
                for (slot, e) in samples[step].iter_mut().zip(&estimators) {
                    slot.0 = unique.len();
                    slot.1.push(e.estimate());
                }
            }
        }
    }

    samples
        .into_iter()
        .enumerate()
        .flat_map(|(step, per_variant)| {
            per_variant
                .into_iter()
                .zip(Variant::ALL)
                .map(move |((true_count, estimates), variant)| {
                    ((step + 1) * step_size, true_count, variant, estimates)
                })
        })
        .collect()
}

fn check_accuracy<const P: usize>(stream_size: usize) {
    let trials = 10;
    let results = run_experiment::<P>(trials, stream_size, stream_size / 5);
    let bound = 3.0 * 1.04 / ((1usize << P) as f64).sqrt();

    let mut records = Vec::new();
    for (step, true_count, variant, estimates) in results {
        assert_eq!(estimates.len(), trials);
        let (mean, std) = mean_std(&estimates);
        let avg_error =
            estimates.iter().map(|&e| relative_error(e, true_count)).sum::<f64>() / trials as f64;
        assert!(
            avg_error <= bound,
            "{variant} P={P} step={step}: average error {avg_error:.4} exceeds {bound:.4}"
        );
        records.push(StepRecord {
            step,
            true_count,
            variant,
            mean_estimate: format!("{:.2}", mean),
            std_estimate: format!("{:.2}", std),
            relative_error: format!("{:.4}", relative_error(mean, true_count)),
        });
    }

    let table_config = Settings::default().with(Style::markdown());
    println!("{}", Table::new(records).with(table_config));
}

#[test]
fn test_accuracy_p8() {
    check_accuracy::<8>(10_000);
}

#[test]
fn test_accuracy_p10() {
    check_accuracy::<10>(20_000);
}

#[test]
fn test_accuracy_p12() {
    check_accuracy::<12>(10_000);
}

#[test]
fn test_small_range_random_strings() {
    // n <= 0.1 * M keeps every variant in the linear counting regime
    let mut generator = StreamGenerator::new(7);
    for _ in 0..5 {
        let stream = generator.generate_stream(400);
        let true_count = stream.iter().collect::<HashSet<_>>().len();
        for variant in Variant::ALL {
            let mut e = AnyEstimator::<12>::new(variant);
            stream.iter().for_each(|item| e.insert(item.as_str()));
            let error = relative_error(e.estimate(), true_count);
            assert!(error < 0.1, "{variant}: error {error:.4} for {true_count} items");
        }
    }
}
