//! Hit-or-miss Monte Carlo integration.
//!
//! Points are thrown uniformly into the box `[a, b] x [0, f(b)]`; the share
//! landing on or under the curve, times the box area, estimates the
//! integral. The box height is always `f(b)`, which only bounds the curve
//! when `f` is non-negative and non-decreasing on `[a, b]`. For other
//! integrands the estimate is biased; negative stretches of `f` are never
//! counted.

use tracing::{debug, warn};

use crate::error::IntegrateError;
use crate::integrand::{Integrand, Interval};
use crate::rng::SampleRng;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MonteCarloEstimate {
    pub num_samples: usize,
    /// Points with `y <= f(x)`
    pub hits: usize,
    /// Box height, `f(b)`
    pub max_y: f64,
    /// `(b - a) * max_y`
    pub box_area: f64,
    pub estimate: f64,
    /// Binomial standard error of the estimate
    pub std_error: f64,
}

impl MonteCarloEstimate {
    pub fn hit_ratio(&self) -> f64 {
        self.hits as f64 / self.num_samples as f64
    }
}

/// Estimate the integral of `f` over `interval` from `num_samples` random points
pub fn hit_or_miss<F: Integrand + ?Sized>(
    f: &F,
    interval: &Interval,
    num_samples: usize,
    rng: &mut SampleRng,
) -> Result<MonteCarloEstimate, IntegrateError> {
    if num_samples == 0 {
        return Err(IntegrateError::NoSamples);
    }

    let (a, b) = (interval.lower(), interval.upper());
    let max_y = f.eval(b);
    if max_y <= 0.0 {
        warn!(max_y, "degenerate Monte Carlo box; f(b) is not positive");
    }

    let mut hits = 0usize;
    for _ in 0..num_samples {
        let x = rng.gen_between(a, b);
        let y = rng.gen_between(0.0, max_y);
        if y <= f.eval(x) {
            hits += 1;
        }
    }

    let ratio = hits as f64 / num_samples as f64;
    let box_area = interval.width() * max_y;
    let estimate = box_area * ratio;
    let std_error = box_area.abs() * (ratio * (1.0 - ratio) / num_samples as f64).sqrt();

    debug!(num_samples, hits, estimate, seed = ?rng.seed(), "Monte Carlo run finished");

    Ok(MonteCarloEstimate {
        num_samples,
        hits,
        max_y,
        box_area,
        estimate,
        std_error,
    })
}

/// Sample counts to run, each with its own independent draw
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    counts: Vec<usize>,
    seed: Option<u64>,
}

impl Default for SampleSchedule {
    fn default() -> Self {
        Self {
            counts: vec![100, 1_000, 10_000, 100_000, 1_000_000],
            seed: None,
        }
    }
}

impl SampleSchedule {
    pub fn new(counts: Vec<usize>) -> Self {
        Self { counts, seed: None }
    }

    /// Derive every run's generator from `seed` instead of fresh entropy
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Generator for the `index`-th run
    pub fn rng_for(&self, index: usize) -> SampleRng {
        match self.seed {
            Some(master) => SampleRng::from_seed(SampleRng::stream_seed(master, index as u64)),
            None => SampleRng::from_entropy(),
        }
    }

    pub fn run<F: Integrand + ?Sized>(
        &self,
        f: &F,
        interval: &Interval,
    ) -> Result<Vec<MonteCarloEstimate>, IntegrateError> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &n)| hit_or_miss(f, interval, n, &mut self.rng_for(i)))
            .collect()
    }
}
