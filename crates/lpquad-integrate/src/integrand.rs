use std::fmt;

use crate::error::IntegrateError;

/// A real function of one variable that can be integrated
pub trait Integrand {
    fn eval(&self, x: f64) -> f64;
}

impl<F> Integrand for F
where
    F: Fn(f64) -> f64,
{
    fn eval(&self, x: f64) -> f64 {
        self(x)
    }
}

/// Polynomial with coefficients in ascending powers: `c[0] + c[1] x + c[2] x^2 + ...`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// f(x) = x^2 + 4x - 3
    pub fn demo() -> Self {
        Self::new(vec![-3.0, 4.0, 1.0])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Antiderivative with zero constant term
    pub fn antiderivative(&self) -> Polynomial {
        let mut coefficients = Vec::with_capacity(self.coefficients.len() + 1);
        coefficients.push(0.0);
        for (power, c) in self.coefficients.iter().enumerate() {
            coefficients.push(c / (power + 1) as f64);
        }
        Polynomial::new(coefficients)
    }

    /// Exact integral over `interval` via the antiderivative
    pub fn definite_integral(&self, interval: &Interval) -> f64 {
        let anti = self.antiderivative();
        anti.eval(interval.upper()) - anti.eval(interval.lower())
    }
}

impl Integrand for Polynomial {
    fn eval(&self, x: f64) -> f64 {
        // Horner
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (power, &c) in self.coefficients.iter().enumerate().rev() {
            if c == 0.0 {
                continue;
            }
            let magnitude = c.abs();
            if first {
                if c < 0.0 {
                    f.write_str("-")?;
                }
            } else {
                f.write_str(if c < 0.0 { " - " } else { " + " })?;
            }
            first = false;

            if power == 0 || magnitude != 1.0 {
                write!(f, "{magnitude}")?;
            }
            match power {
                0 => {}
                1 => f.write_str("x")?,
                _ => write!(f, "x^{power}")?,
            }
        }
        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}

/// Integration bounds `[lower, upper]` with `lower < upper`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interval {
    lower: f64,
    upper: f64,
}

impl Interval {
    pub fn new(lower: f64, upper: f64) -> Result<Self, IntegrateError> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(IntegrateError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    /// `n` evenly spaced points from lower to upper inclusive
    pub fn linspace(&self, n: usize) -> Vec<f64> {
        linspace(self.lower, self.upper, n)
    }
}

pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_demo_values() {
        let f = Polynomial::demo();
        assert_eq!(f.eval(0.0), -3.0);
        assert_eq!(f.eval(1.0), 2.0);
        assert_eq!(f.eval(5.0), 42.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Polynomial::demo().to_string(), "x^2 + 4x - 3");
        assert_eq!(Polynomial::new(vec![0.0, -1.0, 0.0, 2.5]).to_string(), "2.5x^3 - x");
        assert_eq!(Polynomial::new(vec![]).to_string(), "0");
    }

    #[test]
    fn test_exact_integral() {
        let f = Polynomial::demo();
        let interval = Interval::new(0.0, 5.0).unwrap();
        // [x^3/3 + 2x^2 - 3x] from 0 to 5
        assert_relative_eq!(f.definite_integral(&interval), 230.0 / 3.0, max_relative = 1e-14);
    }

    #[test]
    fn test_closure_integrand() {
        let square = |x: f64| x * x;
        assert_eq!(square.eval(3.0), 9.0);
    }

    #[test]
    fn test_interval_validation() {
        assert!(Interval::new(0.0, 5.0).is_ok());
        assert_eq!(
            Interval::new(5.0, 0.0),
            Err(IntegrateError::InvalidBounds { lower: 5.0, upper: 0.0 })
        );
        assert!(Interval::new(1.0, 1.0).is_err());
        assert!(Interval::new(f64::NAN, 1.0).is_err());
        assert!(Interval::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_linspace_endpoints() {
        let xs = Interval::new(-0.5, 5.5).unwrap().linspace(400);
        assert_eq!(xs.len(), 400);
        assert_eq!(xs[0], -0.5);
        assert_eq!(xs[399], 5.5);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }
}
