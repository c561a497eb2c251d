use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrateError {
    #[error("Invalid bounds: lower {lower} must be finite and below upper {upper}")]
    InvalidBounds { lower: f64, upper: f64 },
    #[error("Monte Carlo estimate needs at least one sample")]
    NoSamples,
}
