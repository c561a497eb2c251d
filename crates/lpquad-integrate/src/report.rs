use std::fmt;

use tracing::info;

use crate::error::IntegrateError;
use crate::integrand::{Interval, Polynomial};
use crate::monte_carlo::{MonteCarloEstimate, SampleSchedule};
use crate::quadrature::{Quadrature, QuadratureEstimate};

/// Quadrature reference plus one Monte Carlo row per scheduled sample count
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IntegrationReport {
    pub integrand: String,
    pub interval: Interval,
    /// Closed-form value from the antiderivative
    pub exact: f64,
    pub reference: QuadratureEstimate,
    pub monte_carlo: Vec<McRow>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct McRow {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub estimate: MonteCarloEstimate,
    /// `|estimate - reference|`
    pub deviation: f64,
}

pub fn run(
    f: &Polynomial,
    interval: &Interval,
    quadrature: &Quadrature,
    schedule: &SampleSchedule,
) -> Result<IntegrationReport, IntegrateError> {
    let reference = quadrature.integrate(f, interval);
    info!(
        value = reference.value,
        abs_error = reference.abs_error,
        "quadrature reference computed"
    );

    let monte_carlo = schedule
        .run(f, interval)?
        .into_iter()
        .map(|estimate| McRow {
            deviation: (estimate.estimate - reference.value).abs(),
            estimate,
        })
        .collect();

    Ok(IntegrationReport {
        integrand: f.to_string(),
        interval: *interval,
        exact: f.definite_integral(interval),
        reference,
        monte_carlo,
    })
}

impl fmt::Display for IntegrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Integral of f(x) = {} from {} to {}",
            self.integrand,
            self.interval.lower(),
            self.interval.upper()
        )?;
        writeln!(
            f,
            "Numerical integral (reference): {:.6} (error: {:.2e})",
            self.reference.value, self.reference.abs_error
        )?;
        writeln!(f, "Exact integral: {:.6}", self.exact)?;
        writeln!(f)?;
        writeln!(f, "Monte Carlo estimates:")?;
        for row in &self.monte_carlo {
            writeln!(
                f,
                "  MC integral ({:>9} samples): {:.6}  (+/- {:.4}, off by {:.4})",
                group_thousands(row.estimate.num_samples),
                row.estimate.estimate,
                row.estimate.std_error,
                row.deviation
            )?;
        }
        Ok(())
    }
}

/// `1000000` -> `1,000,000`
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
