mod error;
mod integrand;
pub mod monte_carlo;
pub mod plot;
pub mod quadrature;
pub mod report;
mod rng;

pub use error::IntegrateError;
pub use integrand::{Integrand, Interval, Polynomial};
pub use monte_carlo::{MonteCarloEstimate, SampleSchedule, hit_or_miss};
pub use plot::{PlotData, render_svg};
pub use quadrature::{Quadrature, QuadratureEstimate};
pub use report::{IntegrationReport, McRow};
pub use rng::SampleRng;
