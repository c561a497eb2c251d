//! Plot of an integrand and its integrated region.
//!
//! [`PlotData::compute`] samples everything the picture needs; [`render_svg`]
//! turns that data into an SVG document without touching the integrand.

use std::fmt::Write;

use crate::integrand::{Integrand, Interval, linspace};

const CURVE_POINTS: usize = 400;
const FILL_POINTS: usize = 50;
const MARGIN_X: f64 = 0.5;
const MARGIN_Y: f64 = 5.0;
const Y_FLOOR: f64 = -5.0;
const MAX_TICKS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlotData {
    pub title: String,
    /// Legend entry for the curve, e.g. `f(x) = x^2 + 4x - 3`
    pub curve_label: String,
    pub curve: Vec<(f64, f64)>,
    /// Curve samples over the integration bounds, shaded down to `y = 0`
    pub region: Vec<(f64, f64)>,
    pub lower: f64,
    pub upper: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl PlotData {
    pub fn compute<F: Integrand + ?Sized>(f: &F, expression: &str, interval: &Interval) -> Self {
        let (a, b) = (interval.lower(), interval.upper());
        let curve: Vec<(f64, f64)> = linspace(a - MARGIN_X, b + MARGIN_X, CURVE_POINTS)
            .into_iter()
            .map(|x| (x, f.eval(x)))
            .collect();
        let region = interval
            .linspace(FILL_POINTS)
            .into_iter()
            .map(|x| (x, f.eval(x)))
            .collect();

        let y_min = curve.iter().map(|&(_, y)| y).fold(f64::INFINITY, f64::min);
        let y_max = curve.iter().map(|&(_, y)| y).fold(f64::NEG_INFINITY, f64::max);

        Self {
            title: format!("Graphical Integration of f(x) = {expression} from x={a} to x={b}"),
            curve_label: format!("f(x) = {expression}"),
            curve,
            region,
            lower: a,
            upper: b,
            x_range: (a - MARGIN_X, b + MARGIN_X),
            // The floor drops with curves that stay below it
            y_range: (Y_FLOOR.min(y_min), y_max + MARGIN_Y),
        }
    }
}

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const PAD_LEFT: f64 = 70.0;
const PAD_RIGHT: f64 = 30.0;
const PAD_TOP: f64 = 50.0;
const PAD_BOTTOM: f64 = 60.0;

/// Maps data coordinates into the SVG plot area
struct Frame {
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Frame {
    fn x(&self, x: f64) -> f64 {
        let (lo, hi) = self.x_range;
        PAD_LEFT + (x - lo) / (hi - lo) * (WIDTH - PAD_LEFT - PAD_RIGHT)
    }

    fn y(&self, y: f64) -> f64 {
        let (lo, hi) = self.y_range;
        // max/min rather than clamp: a NaN-only curve leaves lo > hi
        let clamped = y.max(lo).min(hi);
        HEIGHT - PAD_BOTTOM - (clamped - lo) / (hi - lo) * (HEIGHT - PAD_TOP - PAD_BOTTOM)
    }

    fn points(&self, pts: &[(f64, f64)]) -> String {
        let mut out = String::new();
        for (i, &(x, y)) in pts.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{:.2},{:.2}", self.x(x), self.y(y));
        }
        out
    }
}

pub fn render_svg(plot: &PlotData) -> String {
    let frame = Frame {
        x_range: plot.x_range,
        y_range: plot.y_range,
    };
    let mut svg = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    write_grid(&mut svg, &frame);

    // Shaded region, closed along y = 0
    let mut region = Vec::with_capacity(plot.region.len() + 2);
    region.push((plot.lower, 0.0));
    region.extend_from_slice(&plot.region);
    region.push((plot.upper, 0.0));
    let _ = writeln!(
        svg,
        r#"<polygon points="{}" fill="gray" fill-opacity="0.4"/>"#,
        frame.points(&region)
    );

    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="red" stroke-width="2"/>"#,
        frame.points(&plot.curve)
    );

    for (x, colour) in [(plot.lower, "green"), (plot.upper, "blue")] {
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{top:.2}" x2="{x:.2}" y2="{bottom:.2}" stroke="{colour}" stroke-dasharray="6,4"/>"#,
            x = frame.x(x),
            top = PAD_TOP,
            bottom = HEIGHT - PAD_BOTTOM,
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="30" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        escape(&plot.title)
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">x</text>"#,
        WIDTH / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" text-anchor="middle" font-size="13" transform="rotate(-90 20 {:.1})">f(x)</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    );

    let legend = [
        ("red", escape(&plot.curve_label)),
        ("gray", "Integrated Area".to_string()),
        ("green", format!("Lower Bound (a={})", plot.lower)),
        ("blue", format!("Upper Bound (b={})", plot.upper)),
    ];
    for (i, (colour, label)) in legend.iter().enumerate() {
        let y = PAD_TOP + 20.0 + 20.0 * i as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="18" height="4" fill="{colour}"/><text x="{:.1}" y="{:.1}" font-size="12">{label}</text>"#,
            PAD_LEFT + 15.0,
            y - 4.0,
            PAD_LEFT + 40.0,
            y
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn write_grid(svg: &mut String, frame: &Frame) {
    let (x_lo, x_hi) = frame.x_range;
    let (y_lo, y_hi) = frame.y_range;

    for x in ticks(x_lo, x_hi) {
        let px = frame.x(x);
        let _ = writeln!(
            svg,
            r##"<line x1="{px:.2}" y1="{PAD_TOP}" x2="{px:.2}" y2="{:.2}" stroke="#ccc" stroke-dasharray="4,4"/><text x="{px:.2}" y="{:.2}" text-anchor="middle" font-size="11">{x}</text>"##,
            HEIGHT - PAD_BOTTOM,
            HEIGHT - PAD_BOTTOM + 16.0
        );
    }

    for y in ticks(y_lo, y_hi) {
        let py = frame.y(y);
        let _ = writeln!(
            svg,
            r##"<line x1="{PAD_LEFT}" y1="{py:.2}" x2="{:.2}" y2="{py:.2}" stroke="#ccc" stroke-dasharray="4,4"/><text x="{:.2}" y="{:.2}" text-anchor="end" font-size="11">{y}</text>"##,
            WIDTH - PAD_RIGHT,
            PAD_LEFT - 6.0,
            py + 4.0
        );
    }
}

/// Tick positions on multiples of [`nice_step`] within `[lo, hi]`, at most [`MAX_TICKS`]
fn ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = nice_step(hi - lo);
    if !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let first = (lo / step).ceil();
    (0..MAX_TICKS)
        .map(|k| (first + k as f64) * step + 0.0) // + 0.0: no "-0" tick
        .take_while(|&t| t <= hi)
        .collect()
}

/// Grid spacing of 1, 2 or 5 times a power of ten giving at most ten lines
fn nice_step(span: f64) -> f64 {
    let raw = span / 10.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
