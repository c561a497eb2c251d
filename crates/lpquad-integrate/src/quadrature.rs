//! Adaptive Gauss–Kronrod quadrature.
//!
//! Each subinterval is integrated with the 15-point Kronrod rule and its
//! embedded 7-point Gauss rule; the difference between the two drives the
//! error estimate. The subinterval with the largest error is bisected until
//! the total error meets the tolerance or the subinterval limit is reached.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, warn};

use crate::integrand::{Integrand, Interval};

/// Kronrod abscissae on [-1, 1], descending; odd indices are the Gauss nodes
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for XGK[1], XGK[3], XGK[5] and the centre
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Result of an adaptive quadrature run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QuadratureEstimate {
    pub value: f64,
    /// Estimated absolute error bound
    pub abs_error: f64,
    /// Integrand evaluations
    pub evaluations: usize,
    pub intervals: usize,
    /// Whether the error met the requested tolerance
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct Quadrature {
    abs_tol: f64,
    rel_tol: f64,
    /// Maximum number of subintervals
    limit: usize,
}

impl Default for Quadrature {
    fn default() -> Self {
        Self {
            abs_tol: 1.49e-8,
            rel_tol: 1.49e-8,
            limit: 50,
        }
    }
}

impl Quadrature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abs_tol(mut self, tol: f64) -> Self {
        self.abs_tol = tol;
        self
    }

    pub fn with_rel_tol(mut self, tol: f64) -> Self {
        self.rel_tol = tol;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn integrate<F: Integrand + ?Sized>(&self, f: &F, interval: &Interval) -> QuadratureEstimate {
        let first = Segment::evaluate(f, interval.lower(), interval.upper());
        let mut value = first.value;
        let mut abs_error = first.error;
        let mut evaluations = 15;

        let mut heap = BinaryHeap::new();
        heap.push(first);

        while abs_error > self.tolerance(value) && heap.len() < self.limit {
            let Some(worst) = heap.pop() else { break };
            let mid = 0.5 * (worst.lower + worst.upper);
            // Stop splitting once the midpoint is no longer distinct
            if mid <= worst.lower || mid >= worst.upper {
                heap.push(worst);
                break;
            }

            let left = Segment::evaluate(f, worst.lower, mid);
            let right = Segment::evaluate(f, mid, worst.upper);
            evaluations += 30;

            value += left.value + right.value - worst.value;
            abs_error += left.error + right.error - worst.error;
            debug!(
                lower = worst.lower,
                upper = worst.upper,
                error = abs_error,
                "bisected quadrature subinterval"
            );

            heap.push(left);
            heap.push(right);
        }

        // Re-sum to shed the drift of incremental updates
        let value = heap.iter().map(|s| s.value).sum::<f64>();
        let abs_error = heap.iter().map(|s| s.error).sum::<f64>();
        let converged = abs_error <= self.tolerance(value);
        if !converged {
            warn!(
                abs_error,
                intervals = heap.len(),
                limit = self.limit,
                "quadrature did not reach the requested tolerance"
            );
        }

        QuadratureEstimate {
            value,
            abs_error,
            evaluations,
            intervals: heap.len(),
            converged,
        }
    }

    fn tolerance(&self, value: f64) -> f64 {
        self.abs_tol.max(self.rel_tol * value.abs())
    }
}

/// One subinterval with its 15-point estimate
#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

impl Segment {
    fn evaluate<F: Integrand + ?Sized>(f: &F, lower: f64, upper: f64) -> Self {
        let centre = 0.5 * (lower + upper);
        let half = 0.5 * (upper - lower);
        let abs_half = half.abs();

        let mut fv1 = [0.0; 7];
        let mut fv2 = [0.0; 7];

        let fc = f.eval(centre);
        let mut res_gauss = fc * WG[3];
        let mut res_kronrod = fc * WGK[7];
        let mut res_abs = res_kronrod.abs();

        // Nodes shared by both rules
        for j in 0..3 {
            let jtw = 2 * j + 1;
            let abscissa = half * XGK[jtw];
            let f1 = f.eval(centre - abscissa);
            let f2 = f.eval(centre + abscissa);
            fv1[jtw] = f1;
            fv2[jtw] = f2;
            res_gauss += WG[j] * (f1 + f2);
            res_kronrod += WGK[jtw] * (f1 + f2);
            res_abs += WGK[jtw] * (f1.abs() + f2.abs());
        }

        // Kronrod-only nodes
        for j in 0..4 {
            let jtwm1 = 2 * j;
            let abscissa = half * XGK[jtwm1];
            let f1 = f.eval(centre - abscissa);
            let f2 = f.eval(centre + abscissa);
            fv1[jtwm1] = f1;
            fv2[jtwm1] = f2;
            res_kronrod += WGK[jtwm1] * (f1 + f2);
            res_abs += WGK[jtwm1] * (f1.abs() + f2.abs());
        }

        let mean = res_kronrod * 0.5;
        let mut res_asc = WGK[7] * (fc - mean).abs();
        for j in 0..7 {
            res_asc += WGK[j] * ((fv1[j] - mean).abs() + (fv2[j] - mean).abs());
        }

        let value = res_kronrod * half;
        res_abs *= abs_half;
        res_asc *= abs_half;
        let mut error = ((res_kronrod - res_gauss) * half).abs();

        if res_asc != 0.0 && error != 0.0 {
            error = res_asc * (200.0 * error / res_asc).powf(1.5).min(1.0);
        }
        if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
            error = error.max(50.0 * f64::EPSILON * res_abs);
        }

        Self { lower, upper, value, error }
    }
}

// Max-heap by error so the worst subinterval is split first
impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}
