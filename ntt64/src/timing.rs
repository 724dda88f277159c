//! Statistical check of the constant-time property.
//!
//! Each operation is timed over several structured inputs, and every
//! pattern is compared against the all-zero baseline with Welch's t-test.
//! A timing-independent implementation keeps `|t|` below a small threshold.
//! Patterns are measured interleaved, in a freshly shuffled order every
//! round, so slow drift of the machine hits all of them alike.

use std::{hint::black_box, time::Instant};

use rand::seq::SliceRandom;
use sampling::Source;

use crate::{N, Poly, backend::NttBackend, layer::Layer};

/// Structured inputs the harness times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputPattern {
    Zeros,
    Ones,
    /// Every coefficient `q - 1`.
    MaxValue,
    /// `0, q-1, 0, q-1, ...`
    Alternating,
    Random1,
    Random2,
}

impl InputPattern {
    pub const ALL: [InputPattern; 6] = [
        InputPattern::Zeros,
        InputPattern::Ones,
        InputPattern::MaxValue,
        InputPattern::Alternating,
        InputPattern::Random1,
        InputPattern::Random2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InputPattern::Zeros => "zeros",
            InputPattern::Ones => "ones",
            InputPattern::MaxValue => "max",
            InputPattern::Alternating => "alternating",
            InputPattern::Random1 => "random1",
            InputPattern::Random2 => "random2",
        }
    }

    /// The pattern as a polynomial of `layer`. The two random patterns use
    /// fixed, distinct seeds.
    pub fn poly(self, layer: Layer) -> Poly {
        let q: u32 = layer.modulus();
        match self {
            InputPattern::Zeros => [0u32; N],
            InputPattern::Ones => [1u32; N],
            InputPattern::MaxValue => [q - 1; N],
            InputPattern::Alternating => std::array::from_fn(|i| if i & 1 == 1 { q - 1 } else { 0 }),
            InputPattern::Random1 | InputPattern::Random2 => {
                let seed: u64 = if self == InputPattern::Random1 { 12345 } else { 54321 };
                let mut poly: Poly = [0u32; N];
                Source::from_u64(seed).fill_uniform(&mut poly, q);
                poly
            }
        }
    }
}

/// Timed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Forward,
    /// Timed on the forward transform of each pattern.
    Inverse,
    /// The pattern multiplied by itself.
    PointwiseMul,
}

/// Summary statistics of one sample set, in nanoseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingStats {
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator).
    pub std_dev: f64,
    pub samples: usize,
}

impl TimingStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n: usize = samples.len();
        if n == 0 {
            return TimingStats {
                mean: 0.0,
                std_dev: 0.0,
                samples: 0,
            };
        }
        let mean: f64 = samples.iter().sum::<f64>() / n as f64;
        let var: f64 = if n > 1 {
            samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        TimingStats {
            mean,
            std_dev: var.sqrt(),
            samples: n,
        }
    }

    /// Standard deviation relative to the mean, in percent.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            100.0 * self.std_dev / self.mean
        }
    }
}

/// Welch's t-statistic for the difference of the two means. Returns 0 when
/// both sets have zero variance.
pub fn welch_t(a: &TimingStats, b: &TimingStats) -> f64 {
    if a.samples == 0 || b.samples == 0 {
        return 0.0;
    }
    let se: f64 = (a.std_dev * a.std_dev / a.samples as f64 + b.std_dev * b.std_dev / b.samples as f64).sqrt();
    if se == 0.0 { 0.0 } else { (a.mean - b.mean) / se }
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Untimed runs per pattern before measuring.
    pub warmup: usize,
    /// Timed samples per pattern.
    pub samples: usize,
    /// Operations per timed sample, to rise above timer resolution.
    pub repetitions: usize,
    /// Samples above this quantile of the pooled set are dropped as
    /// interrupts and preemptions.
    pub crop_quantile: f64,
    /// Largest acceptable `|t|`.
    pub threshold: f64,
    /// Seed of the interleaving order.
    pub seed: [u8; 32],
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            warmup: 100,
            samples: 1000,
            repetitions: 8,
            crop_quantile: 0.95,
            threshold: 3.0,
            seed: [0u8; 32],
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatternReport {
    pub pattern: InputPattern,
    pub stats: TimingStats,
    /// Welch t against the zero baseline.
    pub t: f64,
}

#[derive(Clone, Debug)]
pub struct TimingReport {
    pub backend: &'static str,
    pub operation: Operation,
    pub layer: Layer,
    pub baseline: TimingStats,
    /// Every non-zero pattern.
    pub patterns: Vec<PatternReport>,
    pub threshold: f64,
}

impl TimingReport {
    pub fn max_abs_t(&self) -> f64 {
        self.patterns.iter().map(|p| p.t.abs()).fold(0.0, f64::max)
    }

    pub fn passed(&self) -> bool {
        self.max_abs_t() < self.threshold
    }
}

/// Copies `staged` into `work` and applies `op` there. Every pattern is
/// run from the same two buffers, so addresses never differ between patterns.
fn run<B: NttBackend>(backend: &B, op: Operation, layer: Layer, staged: &Poly, work: &mut Poly) {
    *work = *black_box(staged);
    match op {
        Operation::Forward => backend.forward(work, layer),
        Operation::Inverse => backend.inverse(work, layer),
        Operation::PointwiseMul => backend.pointwise_mul_inplace(work, staged, layer),
    }
    black_box(work);
}

fn prepared_input<B: NttBackend>(backend: &B, op: Operation, pattern: InputPattern, layer: Layer) -> Poly {
    let mut input: Poly = pattern.poly(layer);
    if op == Operation::Inverse {
        backend.forward(&mut input, layer);
    }
    input
}

/// Times `op` on a single pattern, one call per sample, without cropping.
pub fn measure<B: NttBackend>(
    backend: &B,
    op: Operation,
    pattern: InputPattern,
    layer: Layer,
    warmup: usize,
    samples: usize,
) -> TimingStats {
    let staged: Box<Poly> = Box::new(prepared_input(backend, op, pattern, layer));
    let mut work: Box<Poly> = Box::new([0u32; N]);
    for _ in 0..warmup {
        run(backend, op, layer, &staged, &mut work);
    }
    let times: Vec<f64> = (0..samples)
        .map(|_| {
            let start: Instant = Instant::now();
            run(backend, op, layer, &staged, &mut work);
            start.elapsed().as_nanos() as f64
        })
        .collect();
    TimingStats::from_samples(&times)
}

/// Value at quantile `p` of `samples` (nearest rank).
fn quantile(samples: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank: usize = ((p * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

/// Times `op` on every [`InputPattern`] and compares each against
/// [`InputPattern::Zeros`].
pub fn analyze<B: NttBackend>(backend: &B, op: Operation, layer: Layer, config: &TimingConfig) -> TimingReport {
    let inputs: Vec<(InputPattern, Poly)> = InputPattern::ALL
        .iter()
        .map(|&p| (p, prepared_input(backend, op, p, layer)))
        .collect();

    let mut staged: Box<Poly> = Box::new([0u32; N]);
    let mut work: Box<Poly> = Box::new([0u32; N]);

    for (_, input) in inputs.iter() {
        *staged = *input;
        for _ in 0..config.warmup {
            run(backend, op, layer, &staged, &mut work);
        }
    }

    let mut source: Source = Source::new(config.seed);
    let mut order: Vec<usize> = (0..inputs.len()).collect();
    let mut times: Vec<Vec<f64>> = (0..inputs.len()).map(|_| Vec::with_capacity(config.samples)).collect();

    for _ in 0..config.samples {
        order.shuffle(&mut source);
        for &k in order.iter() {
            *staged = *black_box(&inputs[k].1);
            let start: Instant = Instant::now();
            for _ in 0..config.repetitions {
                run(backend, op, layer, &staged, &mut work);
            }
            times[k].push(start.elapsed().as_nanos() as f64 / config.repetitions.max(1) as f64);
        }
    }

    let pooled: Vec<f64> = times.iter().flatten().copied().collect();
    let cap: f64 = if pooled.is_empty() {
        f64::INFINITY
    } else {
        quantile(&pooled, config.crop_quantile)
    };
    let stats: Vec<TimingStats> = times
        .iter()
        .map(|t| {
            let kept: Vec<f64> = t.iter().copied().filter(|&x| x <= cap).collect();
            TimingStats::from_samples(&kept)
        })
        .collect();

    let baseline: TimingStats = stats[0];
    let patterns: Vec<PatternReport> = inputs
        .iter()
        .zip(stats.iter())
        .skip(1)
        .map(|((pattern, _), s)| PatternReport {
            pattern: *pattern,
            stats: *s,
            t: welch_t(s, &baseline),
        })
        .collect();

    TimingReport {
        backend: backend.name(),
        operation: op,
        layer,
        baseline,
        patterns,
        threshold: config.threshold,
    }
}
